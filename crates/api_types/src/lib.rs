//! Request and response bodies shared by the HTTP server and its clients.
//!
//! Payloads use `camelCase` on the wire. Monetary values are integer minor
//! units (cents). Create/update payloads keep every field optional so the
//! engine can report missing or malformed fields one by one instead of failing
//! at deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod pagination {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum SortOrder {
        Asc,
        #[default]
        Desc,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Sort {
        pub field: String,
        #[serde(default)]
        pub order: SortOrder,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum FilterOperator {
        Eq,
        Ne,
        Lt,
        Lte,
        Gt,
        Gte,
        In,
    }

    /// A single `{field, operator, value}` condition. Filters are ANDed in the
    /// order they are given.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Filter {
        pub field: String,
        pub operator: FilterOperator,
        pub value: serde_json::Value,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageInput {
        pub page: Option<i64>,
        pub limit_per_page: Option<i64>,
    }

    /// Raw list parameters, possibly partial. Defaults are applied by the
    /// engine per collection.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaginationParams {
        pub sort: Option<Sort>,
        #[serde(default)]
        pub filters: Vec<Filter>,
        pub search: Option<String>,
        pub pagination: Option<PageInput>,
    }

    /// Flat query-string form of [`PaginationParams`] (no filters).
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListQuery {
        pub page: Option<i64>,
        pub limit_per_page: Option<i64>,
        pub sort: Option<String>,
        pub order: Option<SortOrder>,
        pub search: Option<String>,
    }

    impl From<ListQuery> for PaginationParams {
        fn from(query: ListQuery) -> Self {
            Self {
                sort: query.sort.map(|field| Sort {
                    field,
                    order: query.order.unwrap_or_default(),
                }),
                filters: Vec::new(),
                search: query.search,
                pagination: Some(PageInput {
                    page: query.page,
                    limit_per_page: query.limit_per_page,
                }),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaginationMeta {
        pub page: u64,
        pub limit_per_page: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub total_items: Option<u64>,
        /// `None` when the returned page is assumed to be the last one.
        pub next_page: Option<u64>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PageMeta {
        pub pagination: PaginationMeta,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct PagedResponse<T> {
        pub data: Vec<T>,
        pub meta: PageMeta,
    }
}

pub mod envelope {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FieldError {
        pub field: String,
        pub message: String,
    }

    /// Uniform body returned by every endpoint.
    ///
    /// On success `data` is set and `error` is null; on failure `data` is null
    /// and `error` carries a human readable message.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ActionResponse<T> {
        pub data: Option<T>,
        pub error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub validation_errors: Option<Vec<FieldError>>,
    }

    impl<T> ActionResponse<T> {
        pub fn ok(data: T) -> Self {
            Self {
                data: Some(data),
                error: None,
                validation_errors: None,
            }
        }

        pub fn failure(error: String, validation_errors: Option<Vec<FieldError>>) -> Self {
            Self {
                data: None,
                error: Some(error),
                validation_errors,
            }
        }
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetNew {
        pub name: Option<String>,
        pub maximum_spending: Option<i64>,
        pub color_tag: Option<String>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetUpdate {
        pub name: Option<String>,
        pub maximum_spending: Option<i64>,
        pub color_tag: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetView {
        pub id: Uuid,
        pub user_id: String,
        pub name: String,
        pub color_tag: String,
        pub maximum_spending: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod income {
    use super::*;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct IncomeNew {
        pub name: Option<String>,
        pub color_tag: Option<String>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct IncomeUpdate {
        pub name: Option<String>,
        pub color_tag: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct IncomeView {
        pub id: Uuid,
        pub user_id: String,
        pub name: String,
        pub color_tag: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod pot {
    use super::*;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PotNew {
        pub name: Option<String>,
        pub target: Option<i64>,
        pub color_tag: Option<String>,
    }

    /// `totalSaved` is not updatable here; use add/withdraw.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PotUpdate {
        pub name: Option<String>,
        pub target: Option<i64>,
        pub color_tag: Option<String>,
    }

    /// Body of the add-money and withdraw endpoints.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct PotAmount {
        pub amount: Option<i64>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PotView {
        pub id: Uuid,
        pub user_id: String,
        pub name: String,
        pub color_tag: String,
        pub target: i64,
        pub total_saved: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;

    /// Exactly one of `budget_id` and `income_id` must be given.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionNew {
        pub name: Option<String>,
        pub color_tag: Option<String>,
        pub amount: Option<i64>,
        /// RFC3339 timestamp.
        pub date: Option<String>,
        pub budget_id: Option<String>,
        pub income_id: Option<String>,
        pub recurring: Option<bool>,
    }

    /// Setting `budget_id` moves the transaction to that budget and clears the
    /// income it was tagged to (and the other way round).
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionUpdate {
        pub name: Option<String>,
        pub color_tag: Option<String>,
        pub amount: Option<i64>,
        pub date: Option<String>,
        pub budget_id: Option<String>,
        pub income_id: Option<String>,
        pub recurring: Option<bool>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        pub id: Uuid,
        pub user_id: String,
        pub name: String,
        pub color_tag: String,
        pub amount: i64,
        pub date: DateTime<Utc>,
        pub budget_id: Option<Uuid>,
        pub income_id: Option<Uuid>,
        pub recurring: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod user {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Me {
        pub uid: String,
        pub email: String,
        pub claims: serde_json::Map<String, serde_json::Value>,
    }
}

#[cfg(test)]
mod tests {
    use super::envelope::ActionResponse;
    use super::pagination::{ListQuery, PaginationMeta, PaginationParams, SortOrder};

    #[test]
    fn next_page_serializes_as_null() {
        let meta = PaginationMeta {
            page: 1,
            limit_per_page: 6,
            total_items: None,
            next_page: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"page": 1, "limitPerPage": 6, "nextPage": null})
        );
    }

    #[test]
    fn failure_envelope_has_null_data() {
        let res: ActionResponse<u8> = ActionResponse::failure("nope".to_string(), None);
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json, serde_json::json!({"data": null, "error": "nope"}));
    }

    #[test]
    fn list_query_keeps_sort_order() {
        let params = PaginationParams::from(ListQuery {
            page: Some(2),
            limit_per_page: None,
            sort: Some("name".to_string()),
            order: Some(SortOrder::Asc),
            search: Some("gro".to_string()),
        });
        let sort = params.sort.unwrap();
        assert_eq!(sort.field, "name");
        assert_eq!(sort.order, SortOrder::Asc);
        assert_eq!(params.pagination.unwrap().page, Some(2));
    }

    #[test]
    fn params_accept_camel_case_body() {
        let params: PaginationParams = serde_json::from_value(serde_json::json!({
            "sort": {"field": "maximumSpending", "order": "asc"},
            "filters": [{"field": "colorTag", "operator": "eq", "value": "green"}],
            "pagination": {"page": 1, "limitPerPage": 2}
        }))
        .unwrap();
        assert_eq!(params.filters.len(), 1);
        assert_eq!(params.pagination.unwrap().limit_per_page, Some(2));
    }
}
