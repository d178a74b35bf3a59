//! Validation of raw list parameters.
//!
//! [`ListRequest::parse`] fills defaults (`page = 1`, the collection's page
//! size, `createdAt desc`) and rejects anything it cannot translate, naming
//! the offending field.

use api_types::pagination::{FilterOperator, PaginationParams, SortOrder};
use serde_json::Value;

use uuid::Uuid;

use crate::{
    EntityKind, ResultEngine, ValidationErrors,
    entity::FieldType,
    query::{Comparison, Predicate, SortKey},
    util::{format_timestamp, parse_timestamp},
};

pub const MAX_LIMIT_PER_PAGE: u64 = 100;
const MAX_SEARCH_LEN: usize = 100;
const DEFAULT_SORT_FIELD: &str = "createdAt";

/// A validated page window. `page >= 1` and `limit_per_page >= 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit_per_page: u64,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit_per_page)
    }
}

/// Validated list parameters for one collection.
#[derive(Clone, Debug, PartialEq)]
pub struct ListRequest {
    pub sort: SortKey,
    pub filters: Vec<Predicate>,
    pub search: Option<String>,
    pub page: PageRequest,
}

impl ListRequest {
    pub fn parse(kind: EntityKind, params: PaginationParams) -> ResultEngine<Self> {
        let mut errors = ValidationErrors::new();

        let input = params.pagination.unwrap_or_default();
        let page = positive(&mut errors, "pagination.page", input.page, 1);
        let limit_per_page = positive(
            &mut errors,
            "pagination.limitPerPage",
            input.limit_per_page,
            kind.default_page_size(),
        );
        if limit_per_page > MAX_LIMIT_PER_PAGE {
            errors.push(
                "pagination.limitPerPage",
                format!("must be at most {MAX_LIMIT_PER_PAGE}"),
            );
        }
        // Stores bind the offset as a signed 64-bit integer.
        let offset = (page - 1).checked_mul(limit_per_page);
        if offset.is_none_or(|offset| i64::try_from(offset).is_err()) {
            errors.push("pagination.page", "is too large");
        }

        let sort = match params.sort {
            Some(sort) if !kind.sortable_fields().contains(&sort.field.as_str()) => {
                errors.push("sort.field", format!("unknown sort field '{}'", sort.field));
                None
            }
            Some(sort) => Some(SortKey {
                field: sort.field,
                order: sort.order,
            }),
            None => None,
        }
        .unwrap_or_else(|| SortKey {
            field: DEFAULT_SORT_FIELD.to_string(),
            order: SortOrder::Desc,
        });

        let mut filters = Vec::with_capacity(params.filters.len());
        for (i, filter) in params.filters.into_iter().enumerate() {
            if !kind.filterable_fields().contains(&filter.field.as_str()) {
                errors.push(
                    &format!("filters[{i}].field"),
                    format!("unknown filter field '{}'", filter.field),
                );
                continue;
            }
            match to_predicate(filter.field, filter.operator, filter.value) {
                Ok(predicate) => filters.push(predicate),
                Err(message) => errors.push(&format!("filters[{i}].value"), message),
            }
        }

        let search = params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if search
            .as_ref()
            .is_some_and(|s| s.chars().count() > MAX_SEARCH_LEN)
        {
            errors.push(
                "search",
                format!("must be at most {MAX_SEARCH_LEN} characters"),
            );
        }

        errors.into_result()?;
        Ok(Self {
            sort,
            filters,
            search,
            page: PageRequest {
                page,
                limit_per_page,
            },
        })
    }
}

fn positive(errors: &mut ValidationErrors, field: &str, value: Option<i64>, default: u64) -> u64 {
    match value {
        None => default,
        Some(v) if v >= 1 => v as u64,
        Some(_) => {
            errors.push(field, "must be a positive integer");
            default
        }
    }
}

/// Checks a filter value against the field's type and brings it into the
/// stored representation.
fn filter_value(field: &str, value: Value) -> Result<Value, String> {
    match (FieldType::of(field), value) {
        (FieldType::Text, value @ Value::String(_)) => Ok(value),
        (FieldType::Text, _) => Err("expected a string".to_string()),
        (FieldType::Money, Value::Number(n)) if n.is_i64() => Ok(Value::Number(n)),
        (FieldType::Money, _) => Err("expected an integer amount".to_string()),
        (FieldType::Timestamp, Value::String(raw)) => parse_timestamp(raw.trim())
            .map(|at| Value::from(format_timestamp(at)))
            .ok_or_else(|| "expected an RFC3339 timestamp".to_string()),
        (FieldType::Timestamp, _) => Err("expected an RFC3339 timestamp".to_string()),
        (FieldType::Reference, Value::String(raw)) => Uuid::parse_str(raw.trim())
            .map(|id| Value::from(id.to_string()))
            .map_err(|_| "expected a UUID".to_string()),
        (FieldType::Reference, _) => Err("expected a UUID".to_string()),
        (FieldType::Flag, value @ Value::Bool(_)) => Ok(value),
        (FieldType::Flag, _) => Err("expected a boolean".to_string()),
    }
}

fn to_predicate(field: String, operator: FilterOperator, value: Value) -> Result<Predicate, String> {
    let op = match operator {
        FilterOperator::In => {
            let Value::Array(values) = value else {
                return Err("'in' expects an array".to_string());
            };
            if values.is_empty() {
                return Err("'in' expects at least one value".to_string());
            }
            let values = values
                .into_iter()
                .map(|value| filter_value(&field, value))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Predicate::In { field, values });
        }
        FilterOperator::Eq => Comparison::Eq,
        FilterOperator::Ne => Comparison::Ne,
        FilterOperator::Lt => Comparison::Lt,
        FilterOperator::Lte => Comparison::Lte,
        FilterOperator::Gt => Comparison::Gt,
        FilterOperator::Gte => Comparison::Gte,
    };

    let value = match op {
        Comparison::Eq | Comparison::Ne if value.is_null() => value,
        Comparison::Eq | Comparison::Ne => filter_value(&field, value)?,
        _ if FieldType::of(&field).is_ordered() => filter_value(&field, value)?,
        _ => return Err("field cannot be compared with this operator".to_string()),
    };
    Ok(Predicate::Compare { field, op, value })
}
