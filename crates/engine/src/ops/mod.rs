use std::{fmt, sync::Arc};

use crate::{DocumentStore, EngineError, ResultEngine, StoreError};

mod budgets;
mod common;
mod incomes;
mod pots;
mod transactions;

/// Entry point of every use case.
///
/// Cloning is cheap and shares the injected store.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn DocumentStore>>,
}

impl EngineBuilder {
    /// Pass the required document store
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let store = self.store.ok_or_else(|| EngineError::Store {
            entity: "engine",
            operation: "build",
            source: StoreError::Unavailable("no document store configured".to_string()),
        })?;
        Ok(Engine { store })
    }
}
