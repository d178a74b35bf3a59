use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use api_types::pagination::SortOrder;
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    query::{Predicate, QuerySpec, compare_values},
    util::now,
};

use super::{
    ChangeKind, Document, DocumentStore, IncrementOutcome, StoreError, Subscription,
    UNIQUE_KEY_FIELD, feed::ChangeFeed,
};

type Collections = HashMap<String, Vec<Document>>;

/// In-process store.
///
/// Collections keep insertion order, which is the natural order ties are
/// returned in. Every operation holds one lock for its whole duration, so
/// increments are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn find_mut<'a>(
    collections: &'a mut Collections,
    collection: &str,
    id: &str,
) -> Option<&'a mut Document> {
    collections
        .get_mut(collection)
        .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
}

/// Fails if another document of the same owner already holds `doc`'s key.
fn check_unique_key(docs: &[Document], doc: &Document) -> Result<(), StoreError> {
    let Some(key) = doc.fields.get(UNIQUE_KEY_FIELD).filter(|key| !key.is_null()) else {
        return Ok(());
    };
    let taken = docs.iter().any(|other| {
        other.id != doc.id
            && other.user_id == doc.user_id
            && other.fields.get(UNIQUE_KEY_FIELD) == Some(key)
    });
    if taken {
        return Err(StoreError::Conflict(key.to_string()));
    }
    Ok(())
}

fn matches_all(doc: &Document, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| p.matches(doc))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(
        &self,
        collection: &str,
        user_id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let at = now();
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: at,
            updated_at: at,
            fields,
        };
        {
            let mut collections = self.lock()?;
            let docs = collections.entry(collection.to_string()).or_default();
            check_unique_key(docs, &doc)?;
            docs.push(doc.clone());
        }
        self.feed.publish(collection, ChangeKind::Created, doc.clone());
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn query(&self, collection: &str, spec: &QuerySpec) -> Result<Vec<Document>, StoreError> {
        let mut matched: Vec<Document> = {
            let collections = self.lock()?;
            collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|doc| matches_all(doc, &spec.predicates))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        if let Some(sort) = &spec.sort {
            // Stable sort: ties keep insertion order.
            matched.sort_by(|a, b| {
                let ordering =
                    compare_values(a.field(&sort.field).as_ref(), b.field(&sort.field).as_ref());
                match sort.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let offset = usize::try_from(spec.offset).unwrap_or(usize::MAX);
        let limit = spec
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, collection: &str, predicates: &[Predicate]) -> Result<u64, StoreError> {
        let collections = self.lock()?;
        let count = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| matches_all(doc, predicates)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let updated = {
            let mut collections = self.lock()?;
            let Some(docs) = collections.get_mut(collection) else {
                return Ok(None);
            };
            let Some(index) = docs.iter().position(|doc| doc.id == id) else {
                return Ok(None);
            };
            let mut merged = docs[index].clone();
            merged.fields.extend(changes);
            merged.updated_at = now();
            check_unique_key(docs, &merged)?;
            docs[index] = merged.clone();
            merged
        };
        self.feed
            .publish(collection, ChangeKind::Updated, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let removed = {
            let mut collections = self.lock()?;
            let Some(docs) = collections.get_mut(collection) else {
                return Ok(false);
            };
            match docs.iter().position(|doc| doc.id == id) {
                Some(index) => docs.remove(index),
                None => return Ok(false),
            }
        };
        self.feed.publish(collection, ChangeKind::Deleted, removed);
        Ok(true)
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> Result<IncrementOutcome, StoreError> {
        let updated = {
            let mut collections = self.lock()?;
            let Some(doc) = find_mut(&mut collections, collection, id) else {
                return Ok(IncrementOutcome::Missing);
            };
            let current = match doc.fields.get(field) {
                None | Some(Value::Null) => 0,
                Some(value) => value.as_i64().ok_or_else(|| StoreError::Corrupt {
                    id: doc.id.clone(),
                    reason: format!("field '{field}' is not an integer"),
                })?,
            };
            let Some(next) = current.checked_add(delta) else {
                return Ok(IncrementOutcome::Rejected(doc.clone()));
            };
            if floor.is_some_and(|floor| next < floor) {
                return Ok(IncrementOutcome::Rejected(doc.clone()));
            }
            doc.fields.insert(field.to_string(), Value::from(next));
            doc.updated_at = now();
            doc.clone()
        };
        self.feed
            .publish(collection, ChangeKind::Updated, updated.clone());
        Ok(IncrementOutcome::Applied(updated))
    }

    fn listen(&self, collection: &str, predicates: Vec<Predicate>) -> Subscription {
        self.feed.subscribe(collection, predicates)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::{Comparison, SortKey};

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn query_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        for (name, cap) in [("b", 300), ("a", 100), ("c", 200)] {
            store
                .create("budgets", "alice", fields(json!({"name": name, "maximumSpending": cap})))
                .await
                .unwrap();
        }
        store
            .create("budgets", "bob", fields(json!({"name": "z", "maximumSpending": 1})))
            .await
            .unwrap();

        let spec = QuerySpec {
            predicates: vec![Predicate::owned_by("alice")],
            sort: Some(SortKey {
                field: "maximumSpending".to_string(),
                order: SortOrder::Asc,
            }),
            offset: 1,
            limit: Some(1),
        };
        let docs = store.query("budgets", &spec).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["name"], json!("c"));
        assert_eq!(
            store
                .count("budgets", &[Predicate::owned_by("alice")])
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn increment_respects_floor() {
        let store = MemoryStore::new();
        let pot = store
            .create("pots", "alice", fields(json!({"totalSaved": 50})))
            .await
            .unwrap();

        let outcome = store
            .increment("pots", &pot.id, "totalSaved", -100, Some(0))
            .await
            .unwrap();
        assert!(matches!(outcome, IncrementOutcome::Rejected(doc) if doc.fields["totalSaved"] == json!(50)));

        let outcome = store
            .increment("pots", &pot.id, "totalSaved", -50, Some(0))
            .await
            .unwrap();
        assert!(matches!(outcome, IncrementOutcome::Applied(doc) if doc.fields["totalSaved"] == json!(0)));

        let outcome = store
            .increment("pots", "missing", "totalSaved", 1, None)
            .await
            .unwrap();
        assert_eq!(outcome, IncrementOutcome::Missing);
    }

    #[tokio::test]
    async fn unique_keys_are_per_owner() {
        let store = MemoryStore::new();
        let rent = store
            .create("budgets", "alice", fields(json!({"nameKey": "rent"})))
            .await
            .unwrap();
        store
            .create("budgets", "bob", fields(json!({"nameKey": "rent"})))
            .await
            .unwrap();
        let err = store
            .create("budgets", "alice", fields(json!({"nameKey": "rent"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let food = store
            .create("budgets", "alice", fields(json!({"nameKey": "food"})))
            .await
            .unwrap();
        let err = store
            .update("budgets", &food.id, fields(json!({"nameKey": "rent"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        let kept = store.get("budgets", &food.id).await.unwrap().unwrap();
        assert_eq!(kept.fields["nameKey"], json!("food"));

        // Rewriting its own key is not a clash.
        store
            .update("budgets", &rent.id, fields(json!({"nameKey": "rent"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn listeners_only_see_matching_changes() {
        let store = MemoryStore::new();
        let mut sub = store.listen(
            "budgets",
            vec![Predicate::Compare {
                field: "userId".to_string(),
                op: Comparison::Eq,
                value: json!("alice"),
            }],
        );

        store
            .create("budgets", "bob", fields(json!({"name": "bob's"})))
            .await
            .unwrap();
        store
            .create("incomes", "alice", fields(json!({"name": "salary"})))
            .await
            .unwrap();
        let created = store
            .create("budgets", "alice", fields(json!({"name": "mine"})))
            .await
            .unwrap();
        assert!(store.delete("budgets", &created.id).await.unwrap());

        let first = sub.recv().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Created);
        assert_eq!(first.document.id, created.id);
        let second = sub.recv().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Deleted);
        sub.close();
    }
}
