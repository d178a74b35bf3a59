use api_types::{
    pagination::{PagedResponse, PaginationParams},
    pot::{PotAmount, PotNew, PotUpdate, PotView},
};
use uuid::Uuid;

use crate::{
    EngineError, EntitySubscription, MoneyCents, Projection, ResultEngine,
    entity::EntityKind,
    error::StoreContext,
    store::{Document, IncrementOutcome},
    validate,
};

use super::Engine;

const SAVED_FIELD: &str = "totalSaved";

fn saved(doc: &Document) -> MoneyCents {
    MoneyCents::new(doc.fields.get(SAVED_FIELD).and_then(|v| v.as_i64()).unwrap_or(0))
}

fn insufficient(doc: &Document, amount: MoneyCents) -> EngineError {
    EngineError::InsufficientFunds(format!(
        "cannot withdraw {amount} from a pot holding {}",
        saved(doc)
    ))
}

impl Engine {
    /// Create a pot. `totalSaved` starts at zero.
    pub async fn new_pot(&self, input: &PotNew, user_id: &str) -> ResultEngine<PotView> {
        let fields = validate::pot_new(input)?;
        self.create_entity(fields, user_id).await
    }

    pub async fn pot(&self, pot_id: Uuid, user_id: &str) -> ResultEngine<PotView> {
        self.get_entity(pot_id, user_id).await
    }

    pub async fn list_pots(
        &self,
        params: PaginationParams,
        user_id: &str,
    ) -> ResultEngine<PagedResponse<PotView>> {
        self.list_entities(params, user_id).await
    }

    /// Update name, target or color. The saved amount only moves through
    /// [`Engine::add_to_pot`] and [`Engine::withdraw_from_pot`].
    pub async fn update_pot(
        &self,
        pot_id: Uuid,
        input: &PotUpdate,
        user_id: &str,
    ) -> ResultEngine<PotView> {
        let changes = validate::pot_update(input)?;
        self.update_entity(pot_id, changes, user_id).await
    }

    pub async fn delete_pot(&self, pot_id: Uuid, user_id: &str) -> ResultEngine<PotView> {
        self.delete_entity(pot_id, user_id).await
    }

    /// Move money into a pot.
    pub async fn add_to_pot(
        &self,
        pot_id: Uuid,
        input: &PotAmount,
        user_id: &str,
    ) -> ResultEngine<PotView> {
        let amount = validate::pot_amount(input)?;
        let doc = self.owned_document(EntityKind::Pot, pot_id, user_id).await?;
        if saved(&doc).checked_add(amount).is_none() {
            return Err(EngineError::invalid("amount", "amount too large"));
        }
        match self.move_savings(pot_id, amount.cents()).await? {
            IncrementOutcome::Applied(doc) => PotView::project(doc),
            IncrementOutcome::Rejected(_) => Err(EngineError::invalid("amount", "amount too large")),
            IncrementOutcome::Missing => Err(EngineError::KeyNotFound(format!("pot {pot_id}"))),
        }
    }

    /// Take money out of a pot.
    ///
    /// The balance check and the decrement happen as one store operation, so
    /// concurrent withdrawals can never drive `totalSaved` below zero. A
    /// failed withdrawal leaves the pot unchanged.
    pub async fn withdraw_from_pot(
        &self,
        pot_id: Uuid,
        input: &PotAmount,
        user_id: &str,
    ) -> ResultEngine<PotView> {
        let amount = validate::pot_amount(input)?;
        let doc = self.owned_document(EntityKind::Pot, pot_id, user_id).await?;
        if amount > saved(&doc) {
            return Err(insufficient(&doc, amount));
        }
        match self.move_savings(pot_id, -amount.cents()).await? {
            IncrementOutcome::Applied(doc) => {
                tracing::debug!(%pot_id, %amount, "withdrawn from pot");
                PotView::project(doc)
            }
            IncrementOutcome::Rejected(doc) => Err(insufficient(&doc, amount)),
            IncrementOutcome::Missing => Err(EngineError::KeyNotFound(format!("pot {pot_id}"))),
        }
    }

    pub fn watch_pots(&self, user_id: &str) -> EntitySubscription<PotView> {
        self.watch_entities(user_id)
    }

    async fn move_savings(&self, pot_id: Uuid, delta: i64) -> ResultEngine<IncrementOutcome> {
        self.store
            .increment(
                EntityKind::Pot.collection(),
                &pot_id.to_string(),
                SAVED_FIELD,
                delta,
                Some(0),
            )
            .await
            .context(EntityKind::Pot.label(), "update")
    }
}
