//! Typed subscriptions over the store change feed.

use std::marker::PhantomData;

use uuid::Uuid;

use crate::{
    ResultEngine,
    error::StoreContext,
    normalize::Projection,
    store::{ChangeKind, Subscription},
};

/// A change to one entity, already projected into its DTO.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityChange<T> {
    pub kind: ChangeKind,
    pub id: Uuid,
    pub entity: T,
}

/// Live feed of a user's entities of one kind.
///
/// There is no ordering guarantee between a write returning and the matching
/// change reaching a listener. Cancel with [`EntitySubscription::close`] or by
/// dropping the handle.
#[derive(Debug)]
pub struct EntitySubscription<T> {
    inner: Subscription,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Projection> EntitySubscription<T> {
    pub(crate) fn new(inner: Subscription) -> Self {
        Self {
            inner,
            _entity: PhantomData,
        }
    }

    pub async fn recv(&mut self) -> ResultEngine<EntityChange<T>> {
        let event = self.inner.recv().await.context(T::KIND.label(), "listen")?;
        let kind = event.kind;
        let entity = T::project(event.document)?;
        Ok(EntityChange {
            kind,
            id: entity.id(),
            entity,
        })
    }

    pub fn close(self) {
        self.inner.close();
    }
}
