//! Query translation.
//!
//! List parameters become a [`QuerySpec`]: an ordered list of predicates that
//! are ANDed together, one sort key, and an offset/limit window. Backends
//! turn a `QuerySpec` into their own operations; [`Predicate::matches`] is the
//! in-process evaluation used by the memory store and by subscriptions.
//!
//! Comparison semantics:
//!
//! - a missing or `null` field never matches a comparison, except `eq null`
//!   (matches) and `ne null` (does not match);
//! - values of different JSON types never match each other;
//! - `Contains` is a case-insensitive substring match on a text field.

use std::cmp::Ordering;

use api_types::pagination::SortOrder;
use serde_json::Value;

use crate::{EntityKind, pagination::ListRequest, store::Document};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Compare {
        field: String,
        op: Comparison,
        value: Value,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    Contains {
        field: String,
        term: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySpec {
    pub predicates: Vec<Predicate>,
    pub sort: Option<SortKey>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl QuerySpec {
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}

/// Builds the store query for one page of a user's collection.
///
/// The owner predicate comes first, then the client filters in the order given,
/// then the search term. `offset = (page - 1) * limitPerPage`.
pub fn translate(user_id: &str, kind: EntityKind, request: &ListRequest) -> QuerySpec {
    let mut spec = QuerySpec::default().filter(Predicate::owned_by(user_id));
    for predicate in &request.filters {
        spec = spec.filter(predicate.clone());
    }
    if let Some(term) = &request.search {
        spec = spec.filter(Predicate::Contains {
            field: kind.search_field().to_string(),
            term: term.clone(),
        });
    }
    spec.sort = Some(request.sort.clone());
    spec.offset = request.page.offset();
    spec.limit = Some(request.page.limit_per_page);
    spec
}

impl Predicate {
    pub fn owned_by(user_id: &str) -> Self {
        Self::Compare {
            field: "userId".to_string(),
            op: Comparison::Eq,
            value: Value::String(user_id.to_string()),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Compare { field, .. } | Self::In { field, .. } | Self::Contains { field, .. } => {
                field
            }
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        let actual = doc.field(self.field()).filter(|v| !v.is_null());
        match self {
            Self::Compare { op, value, .. } if value.is_null() => match op {
                Comparison::Eq => actual.is_none(),
                Comparison::Ne => actual.is_some(),
                _ => false,
            },
            Self::Compare { op, value, .. } => {
                let Some(ordering) = actual.as_ref().and_then(|a| scalar_cmp(a, value)) else {
                    return false;
                };
                match op {
                    Comparison::Eq => ordering == Ordering::Equal,
                    Comparison::Ne => ordering != Ordering::Equal,
                    Comparison::Lt => ordering == Ordering::Less,
                    Comparison::Lte => ordering != Ordering::Greater,
                    Comparison::Gt => ordering == Ordering::Greater,
                    Comparison::Gte => ordering != Ordering::Less,
                }
            }
            Self::In { values, .. } => actual.is_some_and(|a| {
                values
                    .iter()
                    .any(|v| scalar_cmp(&a, v) == Some(Ordering::Equal))
            }),
            Self::Contains { term, .. } => match actual {
                Some(Value::String(text)) => text.to_lowercase().contains(&term.to_lowercase()),
                _ => false,
            },
        }
    }
}

fn scalar_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order used for sorting: missing/null, then numbers and booleans, then
/// strings, then anything else (the same type ranking SQLite uses).
pub(crate) fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_) | Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }
    fn numeric(value: &Value) -> Option<f64> {
        match value {
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    match rank(left).cmp(&rank(right)) {
        Ordering::Equal => {}
        other => return other,
    }
    match (left, right) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(a), Some(b)) => match (numeric(a), numeric(b)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::pagination::PageRequest;

    fn doc(fields: Value) -> Document {
        let Value::Object(fields) = fields else {
            panic!("fields must be an object");
        };
        Document {
            id: "doc-1".to_string(),
            user_id: "alice".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            fields,
        }
    }

    fn compare(field: &str, op: Comparison, value: Value) -> Predicate {
        Predicate::Compare {
            field: field.to_string(),
            op,
            value,
        }
    }

    #[test]
    fn comparisons_follow_json_types() {
        let d = doc(json!({"amount": 500, "name": "Groceries", "recurring": false}));
        assert!(compare("amount", Comparison::Gte, json!(500)).matches(&d));
        assert!(compare("amount", Comparison::Lt, json!(500.5)).matches(&d));
        assert!(!compare("amount", Comparison::Eq, json!("500")).matches(&d));
        assert!(compare("recurring", Comparison::Eq, json!(false)).matches(&d));
        assert!(compare("name", Comparison::Ne, json!("Rent")).matches(&d));
    }

    #[test]
    fn null_only_matches_eq_null() {
        let d = doc(json!({"budgetId": null}));
        assert!(compare("budgetId", Comparison::Eq, Value::Null).matches(&d));
        assert!(compare("incomeId", Comparison::Eq, Value::Null).matches(&d));
        assert!(!compare("budgetId", Comparison::Ne, json!("x")).matches(&d));
        assert!(!compare("budgetId", Comparison::Ne, Value::Null).matches(&d));
    }

    #[test]
    fn contains_is_case_insensitive() {
        let d = doc(json!({"name": "Groceries"}));
        let search = |term: &str| Predicate::Contains {
            field: "name".to_string(),
            term: term.to_string(),
        };
        assert!(search("gro").matches(&d));
        assert!(search("CER").matches(&d));
        assert!(!search("rent").matches(&d));
    }

    #[test]
    fn in_matches_any_value() {
        let d = doc(json!({"colorTag": "green"}));
        let p = Predicate::In {
            field: "colorTag".to_string(),
            values: vec![json!("red"), json!("green")],
        };
        assert!(p.matches(&d));
    }

    #[test]
    fn meta_fields_are_queryable() {
        let d = doc(json!({}));
        assert!(Predicate::owned_by("alice").matches(&d));
        assert!(!Predicate::owned_by("bob").matches(&d));
        assert!(compare("id", Comparison::Eq, json!("doc-1")).matches(&d));
    }

    #[test]
    fn translate_puts_owner_first_and_search_last() {
        let request = ListRequest {
            sort: SortKey {
                field: "name".to_string(),
                order: SortOrder::Asc,
            },
            filters: vec![compare("colorTag", Comparison::Eq, json!("red"))],
            search: Some("gro".to_string()),
            page: PageRequest {
                page: 3,
                limit_per_page: 6,
            },
        };
        let spec = translate("alice", EntityKind::Budget, &request);
        assert_eq!(spec.predicates.len(), 3);
        assert_eq!(spec.predicates[0], Predicate::owned_by("alice"));
        assert_eq!(spec.predicates[1].field(), "colorTag");
        assert!(matches!(&spec.predicates[2], Predicate::Contains { term, .. } if term == "gro"));
        assert_eq!(spec.offset, 12);
        assert_eq!(spec.limit, Some(6));
    }

    #[test]
    fn sort_order_ranks_nulls_first() {
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(
            compare_values(Some(&json!(2)), Some(&json!(10))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(Some(&json!(99)), Some(&json!("a"))),
            Ordering::Less
        );
    }
}
