//! Collection-agnostic steps shared by the per-entity use cases.

use api_types::pagination::{PagedResponse, PaginationParams};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    EngineError, EntitySubscription, ResultEngine,
    entity::EntityKind,
    error::StoreContext,
    normalize::{self, Projection},
    pagination::ListRequest,
    query::{Predicate, translate},
    store::{Document, StoreError},
};

use super::Engine;

fn not_found(kind: EntityKind, id: Uuid) -> EngineError {
    EngineError::KeyNotFound(format!("{} {id}", kind.label()))
}

fn display_name(fields: &Map<String, Value>) -> String {
    fields
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// A write rejected for its unique key is a taken name; anything else is a
/// store failure.
fn write_failure(
    kind: EntityKind,
    operation: &'static str,
    name: &str,
    source: StoreError,
) -> EngineError {
    match source {
        StoreError::Conflict(_) => EngineError::ExistingKey(name.to_string()),
        source => EngineError::Store {
            entity: kind.label(),
            operation,
            source,
        },
    }
}

impl Engine {
    /// Fetches a document of `user_id`. Someone else's document is reported
    /// exactly like a missing one.
    pub(super) async fn owned_document(
        &self,
        kind: EntityKind,
        id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Document> {
        self.store
            .get(kind.collection(), &id.to_string())
            .await
            .context(kind.label(), "get")?
            .filter(|doc| doc.user_id == user_id)
            .ok_or_else(|| not_found(kind, id))
    }

    pub(super) async fn list_entities<T: Projection>(
        &self,
        params: PaginationParams,
        user_id: &str,
    ) -> ResultEngine<PagedResponse<T>> {
        let kind = T::KIND;
        let request = ListRequest::parse(kind, params)?;
        let spec = translate(user_id, kind, &request);

        let docs = self
            .store
            .query(kind.collection(), &spec)
            .await
            .context(kind.label(), "list")?;
        let total = self
            .store
            .count(kind.collection(), &spec.predicates)
            .await
            .context(kind.label(), "count")?;
        let data = docs
            .into_iter()
            .map(T::project)
            .collect::<ResultEngine<Vec<_>>>()?;

        tracing::debug!(
            collection = kind.collection(),
            page = request.page.page,
            returned = data.len(),
            total,
            "listed page"
        );
        Ok(normalize::page(&request.page, data, Some(total)))
    }

    pub(super) async fn get_entity<T: Projection>(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> ResultEngine<T> {
        T::project(self.owned_document(T::KIND, id, user_id).await?)
    }

    pub(super) async fn create_entity<T: Projection>(
        &self,
        fields: Map<String, Value>,
        user_id: &str,
    ) -> ResultEngine<T> {
        let kind = T::KIND;
        let name = display_name(&fields);
        let doc = self
            .store
            .create(kind.collection(), user_id, fields)
            .await
            .map_err(|source| write_failure(kind, "create", &name, source))?;
        tracing::debug!(collection = kind.collection(), id = %doc.id, "entity created");
        T::project(doc)
    }

    pub(super) async fn update_entity<T: Projection>(
        &self,
        id: Uuid,
        changes: Map<String, Value>,
        user_id: &str,
    ) -> ResultEngine<T> {
        let kind = T::KIND;
        self.owned_document(kind, id, user_id).await?;
        let name = display_name(&changes);
        let doc = self
            .store
            .update(kind.collection(), &id.to_string(), changes)
            .await
            .map_err(|source| write_failure(kind, "update", &name, source))?
            .ok_or_else(|| not_found(kind, id))?;
        T::project(doc)
    }

    /// Deletes and returns the last known state of the entity.
    pub(super) async fn delete_entity<T: Projection>(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> ResultEngine<T> {
        let kind = T::KIND;
        let doc = self.owned_document(kind, id, user_id).await?;
        let deleted = self
            .store
            .delete(kind.collection(), &id.to_string())
            .await
            .context(kind.label(), "delete")?;
        if !deleted {
            return Err(not_found(kind, id));
        }
        tracing::debug!(collection = kind.collection(), %id, "entity deleted");
        T::project(doc)
    }

    pub(super) fn watch_entities<T: Projection>(&self, user_id: &str) -> EntitySubscription<T> {
        let subscription = self
            .store
            .listen(T::KIND.collection(), vec![Predicate::owned_by(user_id)]);
        EntitySubscription::new(subscription)
    }
}
