use api_types::{
    budget::{BudgetNew, BudgetUpdate, BudgetView},
    pagination::{PagedResponse, PaginationParams},
};
use uuid::Uuid;

use crate::{EntitySubscription, ResultEngine, validate};

use super::Engine;

impl Engine {
    /// Create a budget. Names are unique per user, ignoring case.
    pub async fn new_budget(&self, input: &BudgetNew, user_id: &str) -> ResultEngine<BudgetView> {
        let fields = validate::budget_new(input)?;
        self.create_entity(fields, user_id).await
    }

    /// Return a budget snapshot.
    pub async fn budget(&self, budget_id: Uuid, user_id: &str) -> ResultEngine<BudgetView> {
        self.get_entity(budget_id, user_id).await
    }

    /// One page of the user's budgets. Defaults to 6 per page, newest first.
    pub async fn list_budgets(
        &self,
        params: PaginationParams,
        user_id: &str,
    ) -> ResultEngine<PagedResponse<BudgetView>> {
        self.list_entities(params, user_id).await
    }

    pub async fn update_budget(
        &self,
        budget_id: Uuid,
        input: &BudgetUpdate,
        user_id: &str,
    ) -> ResultEngine<BudgetView> {
        let changes = validate::budget_update(input)?;
        self.update_entity(budget_id, changes, user_id).await
    }

    /// Delete a budget. Transactions tagged to it are left untouched.
    pub async fn delete_budget(&self, budget_id: Uuid, user_id: &str) -> ResultEngine<BudgetView> {
        self.delete_entity(budget_id, user_id).await
    }

    pub fn watch_budgets(&self, user_id: &str) -> EntitySubscription<BudgetView> {
        self.watch_entities(user_id)
    }
}
