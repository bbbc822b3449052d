//! Domain models for Outlay

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A registered user (the owner of expenses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Opaque credential hash; hashing/verification lives in the server crate
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// An expense category (shared across users)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating or replacing a category
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// A single expense, always owned by exactly one user and assigned to
/// exactly one category. Category name/color come from an explicit join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub category_id: i64,
    pub category_name: String,
    pub category_color: Option<String>,
    pub user_id: i64,
    pub expense_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an expense. The owner is never part of this value;
/// it is supplied by the caller from the authenticated session.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub category_id: i64,
    /// Defaults to today when absent
    pub expense_date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Partial update for an expense: only supplied fields overwrite the
/// stored row. Id, owner and created_at are never client-writable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub category_id: Option<i64>,
    pub expense_date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.category_id.is_none()
            && self.expense_date.is_none()
            && self.note.is_none()
    }
}

/// Sort field for expense listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    ExpenseDate,
    Amount,
    Description,
}

impl SortField {
    /// Column name in the expenses table (safe for SQL interpolation;
    /// never derived from raw client input)
    pub fn column(&self) -> &'static str {
        match self {
            Self::ExpenseDate => "e.expense_date",
            Self::Amount => "e.amount_cents",
            Self::Description => "e.description",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense_date" | "date" => Ok(Self::ExpenseDate),
            "amount" => Ok(Self::Amount),
            "description" => Ok(Self::Description),
            _ => Err(format!("Unknown sort field: {}", s)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// One page of results plus the total row count for the query
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    /// Zero-based page index
    pub page: i64,
    pub page_size: i64,
}

/// Per-category aggregate for a reference month
#[derive(Debug, Clone, Serialize)]
pub struct CategorySpending {
    pub name: String,
    pub color: Option<String>,
    pub total: Decimal,
    pub count: i64,
    /// Share of the month's grand total, 2 fraction digits
    pub percent: Decimal,
}

/// Total spent on one calendar day
#[derive(Debug, Clone, Serialize)]
pub struct DailySpending {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Monthly dashboard aggregate
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub current_total: Decimal,
    pub prior_total: Decimal,
    /// Month-over-month variance in percent, 2 fraction digits.
    /// Saturates to 100 when the prior month is zero and the current
    /// month is not.
    pub percent_variance: Decimal,
    pub count: i64,
    pub average_ticket: Decimal,
    pub by_category: Vec<CategorySpending>,
    pub top_expenses: Vec<Expense>,
    /// Sparse, ascending by date; days without expenses are absent
    pub daily_totals: Vec<DailySpending>,
}
