//! Per-collection settings shared by pagination, querying and projection.

/// The four entity collections a user owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Budget,
    Income,
    Pot,
    Transaction,
}

/// Value type of a sortable or filterable field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FieldType {
    Text,
    /// Integer minor units.
    Money,
    /// Stored as fixed-width RFC3339 text.
    Timestamp,
    /// Id of another entity, nullable.
    Reference,
    Flag,
}

impl FieldType {
    pub(crate) fn of(field: &str) -> Self {
        match field {
            "maximumSpending" | "target" | "totalSaved" | "amount" => Self::Money,
            "date" | "createdAt" | "updatedAt" => Self::Timestamp,
            "budgetId" | "incomeId" => Self::Reference,
            "recurring" => Self::Flag,
            _ => Self::Text,
        }
    }

    /// Whether `lt`, `lte`, `gt` and `gte` make sense on the field.
    pub(crate) fn is_ordered(self) -> bool {
        matches!(self, Self::Text | Self::Money | Self::Timestamp)
    }
}

const BUDGET_SORT: &[&str] = &["name", "maximumSpending", "createdAt", "updatedAt"];
const INCOME_SORT: &[&str] = &["name", "createdAt", "updatedAt"];
const POT_SORT: &[&str] = &["name", "target", "totalSaved", "createdAt", "updatedAt"];
const TRANSACTION_SORT: &[&str] = &["name", "amount", "date", "createdAt", "updatedAt"];

const BUDGET_FILTER: &[&str] = &[
    "name",
    "colorTag",
    "maximumSpending",
    "createdAt",
    "updatedAt",
];
const INCOME_FILTER: &[&str] = &["name", "colorTag", "createdAt", "updatedAt"];
const POT_FILTER: &[&str] = &[
    "name",
    "colorTag",
    "target",
    "totalSaved",
    "createdAt",
    "updatedAt",
];
const TRANSACTION_FILTER: &[&str] = &[
    "name",
    "colorTag",
    "amount",
    "date",
    "budgetId",
    "incomeId",
    "recurring",
    "createdAt",
    "updatedAt",
];

impl EntityKind {
    /// Store collection holding this entity.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Budget => "budgets",
            Self::Income => "incomes",
            Self::Pot => "pots",
            Self::Transaction => "transactions",
        }
    }

    /// Singular name used in error messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Income => "income",
            Self::Pot => "pot",
            Self::Transaction => "transaction",
        }
    }

    pub const fn default_page_size(self) -> u64 {
        match self {
            Self::Budget | Self::Pot => 6,
            Self::Income | Self::Transaction => 10,
        }
    }

    pub const fn sortable_fields(self) -> &'static [&'static str] {
        match self {
            Self::Budget => BUDGET_SORT,
            Self::Income => INCOME_SORT,
            Self::Pot => POT_SORT,
            Self::Transaction => TRANSACTION_SORT,
        }
    }

    /// Fields clients may filter on. Owner and id are never exposed.
    pub const fn filterable_fields(self) -> &'static [&'static str] {
        match self {
            Self::Budget => BUDGET_FILTER,
            Self::Income => INCOME_FILTER,
            Self::Pot => POT_FILTER,
            Self::Transaction => TRANSACTION_FILTER,
        }
    }

    /// Text field matched by `search`.
    pub const fn search_field(self) -> &'static str {
        "name"
    }
}
