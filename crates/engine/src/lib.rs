//! Domain core of Pocketbook.
//!
//! The engine validates use-case input, turns list parameters into store
//! queries, and projects stored documents into the DTOs defined in
//! `api_types`. Persistence is delegated to an injected [`DocumentStore`].

pub use auth::{AuthClaims, AuthProvider, IssuedToken, SqlAuthProvider, StaticAuthProvider};
pub use color::ColorTag;
pub use entity::EntityKind;
pub use error::{EngineError, ErrorKind, ValidationErrors};
pub use money::MoneyCents;
pub use normalize::Projection;
pub use ops::{Engine, EngineBuilder};
pub use pagination::{ListRequest, MAX_LIMIT_PER_PAGE, PageRequest};
pub use query::{Comparison, Predicate, QuerySpec, SortKey};
pub use realtime::{EntityChange, EntitySubscription};
pub use store::{
    ChangeEvent, ChangeKind, Document, DocumentStore, IncrementOutcome, MemoryStore, SqlStore,
    StoreError, Subscription,
};

mod auth;
mod color;
mod entity;
mod error;
mod money;
mod normalize;
mod ops;
mod pagination;
mod query;
mod realtime;
mod store;
mod users;
mod util;
mod validate;

type ResultEngine<T> = Result<T, EngineError>;
