//! Create and update schemas per entity.
//!
//! Validators collect every field error before failing, and run before any
//! store access. On success they return the document fields to write.

use api_types::{
    budget::{BudgetNew, BudgetUpdate},
    income::{IncomeNew, IncomeUpdate},
    pot::{PotAmount, PotNew, PotUpdate},
    transaction::{TransactionNew, TransactionUpdate},
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    ColorTag, EngineError, MoneyCents, ResultEngine, ValidationErrors,
    util::{format_timestamp, name_key, parse_timestamp},
};

const MAX_NAME_LEN: usize = 50;

/// Budget or income a transaction is tagged to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CategoryRef {
    Budget(Uuid),
    Income(Uuid),
}

/// Accumulates validated fields and errors.
#[derive(Default)]
struct Fields {
    errors: ValidationErrors,
    values: Map<String, Value>,
}

impl Fields {
    fn name(&mut self, value: Option<&str>, required: bool) -> &mut Self {
        match value.map(str::trim) {
            None if required => self.errors.push("name", "is required"),
            None => {}
            Some("") => self.errors.push("name", "must not be empty"),
            Some(name) if name.chars().count() > MAX_NAME_LEN => self
                .errors
                .push("name", format!("must be at most {MAX_NAME_LEN} characters")),
            Some(name) => {
                self.values.insert("name".into(), Value::from(name));
                self.values.insert("nameKey".into(), Value::from(name_key(name)));
            }
        }
        self
    }

    fn color(&mut self, value: Option<&str>, required: bool) -> &mut Self {
        match value {
            None if required => self.errors.push("colorTag", "is required"),
            None => {}
            Some(raw) => match ColorTag::try_from(raw) {
                Ok(tag) => {
                    self.values.insert("colorTag".into(), Value::from(tag.as_str()));
                }
                Err(message) => self.errors.push("colorTag", message),
            },
        }
        self
    }

    fn money(&mut self, field: &str, value: Option<i64>, required: bool) -> &mut Self {
        match value.map(MoneyCents::new) {
            None if required => self.errors.push(field, "is required"),
            None => {}
            Some(amount) if amount.is_negative() => self.errors.push(field, "must be >= 0"),
            Some(amount) => {
                self.values.insert(field.into(), Value::from(amount.cents()));
            }
        }
        self
    }

    fn date(&mut self, field: &str, value: Option<&str>, required: bool) -> &mut Self {
        match value {
            None if required => self.errors.push(field, "is required"),
            None => {}
            Some(raw) => match parse_timestamp(raw.trim()) {
                Some(date) => {
                    self.values
                        .insert(field.into(), Value::from(format_timestamp(date)));
                }
                None => self.errors.push(field, "must be an RFC3339 timestamp"),
            },
        }
        self
    }

    fn flag(&mut self, field: &str, value: Option<bool>) -> &mut Self {
        if let Some(flag) = value {
            self.values.insert(field.into(), Value::from(flag));
        }
        self
    }

    fn reference(&mut self, field: &str, value: Option<&str>) -> Option<Uuid> {
        let raw = value?;
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                self.errors.push(field, "must be a valid id");
                None
            }
        }
    }

    /// Writes the category reference, clearing the other one.
    fn category(&mut self, category: CategoryRef) {
        let (budget, income) = match category {
            CategoryRef::Budget(id) => (Value::from(id.to_string()), Value::Null),
            CategoryRef::Income(id) => (Value::Null, Value::from(id.to_string())),
        };
        self.values.insert("budgetId".into(), budget);
        self.values.insert("incomeId".into(), income);
    }

    fn finish(self) -> ResultEngine<Map<String, Value>> {
        self.errors.into_result()?;
        Ok(self.values)
    }

    fn finish_update(self) -> ResultEngine<Map<String, Value>> {
        if self.errors.is_empty() && self.values.is_empty() {
            return Err(EngineError::invalid(
                "body",
                "provide at least one field to update",
            ));
        }
        self.finish()
    }
}

pub(crate) fn budget_new(input: &BudgetNew) -> ResultEngine<Map<String, Value>> {
    let mut fields = Fields::default();
    fields
        .name(input.name.as_deref(), true)
        .color(input.color_tag.as_deref(), true)
        .money("maximumSpending", input.maximum_spending, true);
    fields.finish()
}

pub(crate) fn budget_update(input: &BudgetUpdate) -> ResultEngine<Map<String, Value>> {
    let mut fields = Fields::default();
    fields
        .name(input.name.as_deref(), false)
        .color(input.color_tag.as_deref(), false)
        .money("maximumSpending", input.maximum_spending, false);
    fields.finish_update()
}

pub(crate) fn income_new(input: &IncomeNew) -> ResultEngine<Map<String, Value>> {
    let mut fields = Fields::default();
    fields
        .name(input.name.as_deref(), true)
        .color(input.color_tag.as_deref(), true);
    fields.finish()
}

pub(crate) fn income_update(input: &IncomeUpdate) -> ResultEngine<Map<String, Value>> {
    let mut fields = Fields::default();
    fields
        .name(input.name.as_deref(), false)
        .color(input.color_tag.as_deref(), false);
    fields.finish_update()
}

/// New pots always start with nothing saved.
pub(crate) fn pot_new(input: &PotNew) -> ResultEngine<Map<String, Value>> {
    let mut fields = Fields::default();
    fields
        .name(input.name.as_deref(), true)
        .color(input.color_tag.as_deref(), true)
        .money("target", input.target, true);
    let mut values = fields.finish()?;
    values.insert("totalSaved".into(), Value::from(0));
    Ok(values)
}

pub(crate) fn pot_update(input: &PotUpdate) -> ResultEngine<Map<String, Value>> {
    let mut fields = Fields::default();
    fields
        .name(input.name.as_deref(), false)
        .color(input.color_tag.as_deref(), false)
        .money("target", input.target, false);
    fields.finish_update()
}

/// Amount moved into or out of a pot; must be strictly positive.
pub(crate) fn pot_amount(input: &PotAmount) -> ResultEngine<MoneyCents> {
    match input.amount.map(MoneyCents::new) {
        None => Err(EngineError::invalid("amount", "is required")),
        Some(amount) if !amount.is_positive() => {
            Err(EngineError::invalid("amount", "must be > 0"))
        }
        Some(amount) => Ok(amount),
    }
}

fn category_of(
    fields: &mut Fields,
    budget_id: Option<&str>,
    income_id: Option<&str>,
    required: bool,
) -> Option<CategoryRef> {
    let budget = fields.reference("budgetId", budget_id);
    let income = fields.reference("incomeId", income_id);
    match (budget_id.is_some(), income_id.is_some()) {
        (true, true) => {
            fields
                .errors
                .push("budgetId", "provide either budgetId or incomeId, not both");
            None
        }
        (false, false) => {
            if required {
                fields
                    .errors
                    .push("budgetId", "either budgetId or incomeId is required");
            }
            None
        }
        _ => budget
            .map(CategoryRef::Budget)
            .or(income.map(CategoryRef::Income)),
    }
}

pub(crate) fn transaction_new(
    input: &TransactionNew,
) -> ResultEngine<(Map<String, Value>, CategoryRef)> {
    let mut fields = Fields::default();
    fields
        .name(input.name.as_deref(), true)
        .color(input.color_tag.as_deref(), true)
        .money("amount", input.amount, true)
        .date("date", input.date.as_deref(), true)
        .flag("recurring", Some(input.recurring.unwrap_or(false)));
    let category = category_of(
        &mut fields,
        input.budget_id.as_deref(),
        input.income_id.as_deref(),
        true,
    );
    if let Some(category) = category {
        fields.category(category);
    }
    let mut values = fields.finish()?;
    // Names repeat freely across transactions; no lookup key needed.
    values.remove("nameKey");
    let category = category
        .ok_or_else(|| EngineError::invalid("budgetId", "either budgetId or incomeId is required"))?;
    Ok((values, category))
}

pub(crate) fn transaction_update(
    input: &TransactionUpdate,
) -> ResultEngine<(Map<String, Value>, Option<CategoryRef>)> {
    let mut fields = Fields::default();
    fields
        .name(input.name.as_deref(), false)
        .color(input.color_tag.as_deref(), false)
        .money("amount", input.amount, false)
        .date("date", input.date.as_deref(), false)
        .flag("recurring", input.recurring);
    let category = category_of(
        &mut fields,
        input.budget_id.as_deref(),
        input.income_id.as_deref(),
        false,
    );
    if let Some(category) = category {
        fields.category(category);
    }
    let mut values = fields.finish_update()?;
    values.remove("nameKey");
    Ok((values, category))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn error_fields(err: EngineError) -> Vec<String> {
        match err {
            EngineError::Validation(errors) => {
                errors.into_inner().into_iter().map(|e| e.field).collect()
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn budget_new_reports_every_missing_field() {
        let err = budget_new(&BudgetNew::default()).unwrap_err();
        assert_eq!(
            error_fields(err),
            vec!["name", "colorTag", "maximumSpending"]
        );
    }

    #[test]
    fn budget_new_normalizes_fields() {
        let values = budget_new(&BudgetNew {
            name: Some("  Groceries ".to_string()),
            maximum_spending: Some(50_000),
            color_tag: Some("Green".to_string()),
        })
        .unwrap();
        assert_eq!(values["name"], json!("Groceries"));
        assert_eq!(values["nameKey"], json!("groceries"));
        assert_eq!(values["colorTag"], json!("green"));
        assert_eq!(values["maximumSpending"], json!(50_000));
    }

    #[test]
    fn negative_money_is_rejected() {
        let err = pot_new(&PotNew {
            name: Some("Holiday".to_string()),
            target: Some(-1),
            color_tag: Some("red".to_string()),
        })
        .unwrap_err();
        assert_eq!(error_fields(err), vec!["target"]);
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = income_update(&IncomeUpdate::default()).unwrap_err();
        assert_eq!(error_fields(err), vec!["body"]);
    }

    #[test]
    fn pot_update_cannot_touch_savings() {
        let values = pot_update(&PotUpdate {
            target: Some(10_000),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(values.len(), 1);
        assert!(!values.contains_key("totalSaved"));
    }

    #[test]
    fn pot_amount_must_be_positive() {
        assert_eq!(
            pot_amount(&PotAmount { amount: Some(0) }),
            Err(EngineError::invalid("amount", "must be > 0"))
        );
        assert_eq!(
            pot_amount(&PotAmount { amount: Some(250) }),
            Ok(MoneyCents::new(250))
        );
    }

    #[test]
    fn transaction_needs_exactly_one_category() {
        let base = TransactionNew {
            name: Some("Market".to_string()),
            color_tag: Some("gold".to_string()),
            amount: Some(1_250),
            date: Some("2026-03-01T10:00:00Z".to_string()),
            ..Default::default()
        };
        let err = transaction_new(&base).unwrap_err();
        assert_eq!(error_fields(err), vec!["budgetId"]);

        let both = TransactionNew {
            budget_id: Some(Uuid::new_v4().to_string()),
            income_id: Some(Uuid::new_v4().to_string()),
            ..base.clone()
        };
        let err = transaction_new(&both).unwrap_err();
        assert_eq!(error_fields(err), vec!["budgetId"]);

        let budget = Uuid::new_v4();
        let ok = TransactionNew {
            budget_id: Some(budget.to_string()),
            ..base
        };
        let (values, category) = transaction_new(&ok).unwrap();
        assert_eq!(category, CategoryRef::Budget(budget));
        assert_eq!(values["incomeId"], Value::Null);
        assert_eq!(values["date"], json!("2026-03-01T10:00:00.000000Z"));
        assert_eq!(values["recurring"], json!(false));
        assert!(!values.contains_key("nameKey"));
    }

    #[test]
    fn transaction_update_switches_category() {
        let income = Uuid::new_v4();
        let (values, category) = transaction_update(&TransactionUpdate {
            income_id: Some(income.to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(category, Some(CategoryRef::Income(income)));
        assert_eq!(values["budgetId"], Value::Null);
        assert_eq!(values["incomeId"], json!(income.to_string()));
    }

    #[test]
    fn malformed_references_and_dates_are_field_errors() {
        let err = transaction_update(&TransactionUpdate {
            date: Some("yesterday".to_string()),
            budget_id: Some("not-an-id".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(error_fields(err), vec!["date", "budgetId"]);
    }
}
