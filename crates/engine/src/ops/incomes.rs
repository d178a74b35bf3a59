use api_types::{
    income::{IncomeNew, IncomeUpdate, IncomeView},
    pagination::{PagedResponse, PaginationParams},
};
use uuid::Uuid;

use crate::{EntitySubscription, ResultEngine, validate};

use super::Engine;

impl Engine {
    pub async fn new_income(&self, input: &IncomeNew, user_id: &str) -> ResultEngine<IncomeView> {
        let fields = validate::income_new(input)?;
        self.create_entity(fields, user_id).await
    }

    pub async fn income(&self, income_id: Uuid, user_id: &str) -> ResultEngine<IncomeView> {
        self.get_entity(income_id, user_id).await
    }

    pub async fn list_incomes(
        &self,
        params: PaginationParams,
        user_id: &str,
    ) -> ResultEngine<PagedResponse<IncomeView>> {
        self.list_entities(params, user_id).await
    }

    pub async fn update_income(
        &self,
        income_id: Uuid,
        input: &IncomeUpdate,
        user_id: &str,
    ) -> ResultEngine<IncomeView> {
        let changes = validate::income_update(input)?;
        self.update_entity(income_id, changes, user_id).await
    }

    pub async fn delete_income(&self, income_id: Uuid, user_id: &str) -> ResultEngine<IncomeView> {
        self.delete_entity(income_id, user_id).await
    }

    pub fn watch_incomes(&self, user_id: &str) -> EntitySubscription<IncomeView> {
        self.watch_entities(user_id)
    }
}
