//! Projection of stored documents into DTOs, and page envelopes.
//!
//! Each entity has a typed record mirroring its document body. Views are built
//! field by field from the record and the document metadata, so storage-only
//! fields (like `nameKey`) never leak out.

use api_types::{
    budget::BudgetView,
    income::IncomeView,
    pagination::{PageMeta, PagedResponse, PaginationMeta},
    pot::PotView,
    transaction::TransactionView,
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    EngineError, EntityKind, ResultEngine, pagination::PageRequest, store::Document,
    store::StoreError, util::parse_timestamp,
};

/// A DTO that can be built from a stored document.
pub trait Projection: Sized {
    const KIND: EntityKind;

    fn project(doc: Document) -> ResultEngine<Self>;

    fn id(&self) -> Uuid;
}

fn corrupt(kind: EntityKind, doc: &Document, reason: String) -> EngineError {
    EngineError::Store {
        entity: kind.label(),
        operation: "decode",
        source: StoreError::Corrupt {
            id: doc.id.clone(),
            reason,
        },
    }
}

fn decode<R: DeserializeOwned>(kind: EntityKind, doc: &Document) -> ResultEngine<R> {
    serde_json::from_value(Value::Object(doc.fields.clone()))
        .map_err(|err| corrupt(kind, doc, err.to_string()))
}

fn parse_id(kind: EntityKind, doc: &Document, value: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| corrupt(kind, doc, format!("invalid id '{value}'")))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BudgetRecord {
    name: String,
    color_tag: String,
    maximum_spending: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeRecord {
    name: String,
    color_tag: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PotRecord {
    name: String,
    color_tag: String,
    target: i64,
    #[serde(default)]
    total_saved: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRecord {
    name: String,
    color_tag: String,
    amount: i64,
    date: String,
    budget_id: Option<String>,
    income_id: Option<String>,
    #[serde(default)]
    recurring: bool,
}

impl Projection for BudgetView {
    const KIND: EntityKind = EntityKind::Budget;

    fn project(doc: Document) -> ResultEngine<Self> {
        let record: BudgetRecord = decode(Self::KIND, &doc)?;
        Ok(BudgetView {
            id: parse_id(Self::KIND, &doc, &doc.id)?,
            user_id: doc.user_id,
            name: record.name,
            color_tag: record.color_tag,
            maximum_spending: record.maximum_spending,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Projection for IncomeView {
    const KIND: EntityKind = EntityKind::Income;

    fn project(doc: Document) -> ResultEngine<Self> {
        let record: IncomeRecord = decode(Self::KIND, &doc)?;
        Ok(IncomeView {
            id: parse_id(Self::KIND, &doc, &doc.id)?,
            user_id: doc.user_id,
            name: record.name,
            color_tag: record.color_tag,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Projection for PotView {
    const KIND: EntityKind = EntityKind::Pot;

    fn project(doc: Document) -> ResultEngine<Self> {
        let record: PotRecord = decode(Self::KIND, &doc)?;
        Ok(PotView {
            id: parse_id(Self::KIND, &doc, &doc.id)?,
            user_id: doc.user_id,
            name: record.name,
            color_tag: record.color_tag,
            target: record.target,
            total_saved: record.total_saved,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Projection for TransactionView {
    const KIND: EntityKind = EntityKind::Transaction;

    fn project(doc: Document) -> ResultEngine<Self> {
        let record: TransactionRecord = decode(Self::KIND, &doc)?;
        let date = parse_timestamp(&record.date)
            .ok_or_else(|| corrupt(Self::KIND, &doc, format!("invalid date '{}'", record.date)))?;
        let budget_id = record
            .budget_id
            .as_deref()
            .map(|id| parse_id(Self::KIND, &doc, id))
            .transpose()?;
        let income_id = record
            .income_id
            .as_deref()
            .map(|id| parse_id(Self::KIND, &doc, id))
            .transpose()?;
        Ok(TransactionView {
            id: parse_id(Self::KIND, &doc, &doc.id)?,
            user_id: doc.user_id,
            name: record.name,
            color_tag: record.color_tag,
            amount: record.amount,
            date,
            budget_id,
            income_id,
            recurring: record.recurring,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Wraps one page of results.
///
/// `next_page` is `page + 1` whenever the page came back full. A full last
/// page therefore still advertises a next page that will be empty.
pub(crate) fn page<T>(
    request: &PageRequest,
    data: Vec<T>,
    total_items: Option<u64>,
) -> PagedResponse<T> {
    let next_page = (data.len() as u64 == request.limit_per_page).then(|| request.page + 1);
    PagedResponse {
        data,
        meta: PageMeta {
            pagination: PaginationMeta {
                page: request.page,
                limit_per_page: request.limit_per_page,
                total_items,
                next_page,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn doc(fields: Value) -> Document {
        let Value::Object(fields) = fields else {
            panic!("fields must be an object");
        };
        Document {
            id: Uuid::new_v4().to_string(),
            user_id: "alice".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            fields,
        }
    }

    #[test]
    fn budget_projection_drops_storage_fields() {
        let d = doc(json!({
            "name": "Groceries",
            "nameKey": "groceries",
            "colorTag": "green",
            "maximumSpending": 50_000
        }));
        let view = BudgetView::project(d.clone()).unwrap();
        assert_eq!(view.id.to_string(), d.id);
        assert_eq!(view.name, "Groceries");
        assert_eq!(view.maximum_spending, 50_000);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("nameKey").is_none());
    }

    #[test]
    fn corrupt_documents_are_reported() {
        let d = doc(json!({"name": "Holiday", "colorTag": "red"}));
        let err = PotView::project(d).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Store {
                entity: "pot",
                operation: "decode",
                ..
            }
        ));
    }

    #[test]
    fn transaction_projection_parses_references() {
        let budget = Uuid::new_v4();
        let d = doc(json!({
            "name": "Market",
            "colorTag": "gold",
            "amount": 1250,
            "date": "2026-03-01T10:00:00.000000Z",
            "budgetId": budget.to_string(),
            "incomeId": null
        }));
        let view = TransactionView::project(d).unwrap();
        assert_eq!(view.budget_id, Some(budget));
        assert_eq!(view.income_id, None);
        assert!(!view.recurring);
    }

    #[test]
    fn full_page_advertises_next_page() {
        let request = PageRequest {
            page: 1,
            limit_per_page: 2,
        };
        let full = page(&request, vec![1, 2], Some(2));
        assert_eq!(full.meta.pagination.next_page, Some(2));

        let partial = page(&request, vec![1], Some(1));
        assert_eq!(partial.meta.pagination.next_page, None);
    }
}
