use api_types::{
    pagination::{PagedResponse, PaginationParams},
    transaction::{TransactionNew, TransactionUpdate, TransactionView},
};
use uuid::Uuid;

use crate::{
    EntitySubscription, ResultEngine,
    entity::EntityKind,
    validate::{self, CategoryRef},
};

use super::Engine;

impl Engine {
    /// The budget or income a transaction is tagged to must belong to the
    /// same user.
    async fn require_category(&self, category: CategoryRef, user_id: &str) -> ResultEngine<()> {
        let (kind, id) = match category {
            CategoryRef::Budget(id) => (EntityKind::Budget, id),
            CategoryRef::Income(id) => (EntityKind::Income, id),
        };
        self.owned_document(kind, id, user_id).await?;
        Ok(())
    }

    /// Record a transaction against exactly one budget or income.
    pub async fn new_transaction(
        &self,
        input: &TransactionNew,
        user_id: &str,
    ) -> ResultEngine<TransactionView> {
        let (fields, category) = validate::transaction_new(input)?;
        self.require_category(category, user_id).await?;
        self.create_entity(fields, user_id).await
    }

    pub async fn transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<TransactionView> {
        self.get_entity(transaction_id, user_id).await
    }

    /// One page of the user's transactions. Defaults to 10 per page.
    pub async fn list_transactions(
        &self,
        params: PaginationParams,
        user_id: &str,
    ) -> ResultEngine<PagedResponse<TransactionView>> {
        self.list_entities(params, user_id).await
    }

    /// Partial update. Giving a new `budgetId` (or `incomeId`) retags the
    /// transaction and clears the other reference.
    pub async fn update_transaction(
        &self,
        transaction_id: Uuid,
        input: &TransactionUpdate,
        user_id: &str,
    ) -> ResultEngine<TransactionView> {
        let (changes, category) = validate::transaction_update(input)?;
        if let Some(category) = category {
            self.require_category(category, user_id).await?;
        }
        self.update_entity(transaction_id, changes, user_id).await
    }

    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<TransactionView> {
        self.delete_entity(transaction_id, user_id).await
    }

    pub fn watch_transactions(&self, user_id: &str) -> EntitySubscription<TransactionView> {
        self.watch_entities(user_id)
    }
}
