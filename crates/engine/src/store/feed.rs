use tokio::sync::broadcast::{self, error::RecvError};

use crate::query::Predicate;

use super::{Document, StoreError};

const FEED_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A write observed by the store. Deletes carry the last known document.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    pub collection: String,
    pub kind: ChangeKind,
    pub document: Document,
}

/// Broadcast channel every write is published to.
#[derive(Debug)]
pub(crate) struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }
}

impl ChangeFeed {
    pub(crate) fn publish(&self, collection: &str, kind: ChangeKind, document: Document) {
        // No receivers is not an error.
        let _ = self.sender.send(ChangeEvent {
            collection: collection.to_string(),
            kind,
            document,
        });
    }

    pub(crate) fn subscribe(&self, collection: &str, predicates: Vec<Predicate>) -> Subscription {
        Subscription {
            collection: collection.to_string(),
            predicates,
            receiver: self.sender.subscribe(),
        }
    }
}

/// Handle on a live subscription.
///
/// Events written before the subscription was created are not delivered.
/// Dropping the handle, or calling [`Subscription::close`], unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    predicates: Vec<Predicate>,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Waits for the next matching change.
    ///
    /// Returns [`StoreError::Lagged`] when the listener fell behind and events
    /// were dropped; the subscription stays usable afterwards.
    pub async fn recv(&mut self) -> Result<ChangeEvent, StoreError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.accepts(&event) => return Ok(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => return Err(StoreError::Lagged(skipped)),
                Err(RecvError::Closed) => return Err(StoreError::Closed),
            }
        }
    }

    pub fn close(self) {}

    fn accepts(&self, event: &ChangeEvent) -> bool {
        event.collection == self.collection
            && self.predicates.iter().all(|p| p.matches(&event.document))
    }
}
