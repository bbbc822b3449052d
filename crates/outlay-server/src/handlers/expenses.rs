//! Expense handlers
//!
//! All routes resolve the owner from the authenticated session and pass
//! it into the core explicitly; nothing in a request body or query string
//! can select another user's data.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, AuthUser, MAX_PAGE_SIZE};
use outlay_core::db::ExpenseFilter;
use outlay_core::models::{Expense, ExpenseUpdate, NewExpense, Page, SortField, SortOrder};
use outlay_core::money;

/// Query parameters for listing and filtering expenses
#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    /// Zero-based page index
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// Case-insensitive description substring
    pub description: Option<String>,
    pub category_id: Option<i64>,
    /// Inclusive start date (YYYY-MM-DD)
    pub date_from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    pub date_to: Option<NaiveDate>,
    /// Inclusive minimum amount
    pub amount_min: Option<Decimal>,
    /// Inclusive maximum amount
    pub amount_max: Option<Decimal>,
    /// Sort field (date, amount or description)
    pub sort: Option<String>,
    /// Sort direction (asc or desc)
    pub order: Option<String>,
}

fn default_page_size() -> i64 {
    20
}

impl ExpenseQuery {
    /// Clamped pagination values
    pub(crate) fn pagination(&self) -> (i64, i64) {
        let page = self.page.max(0);
        let page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }

    /// Translate the query string into a core filter
    pub(crate) fn to_filter(&self) -> Result<ExpenseFilter<'_>, AppError> {
        let sort_field = match self.sort.as_deref() {
            Some(s) => s
                .parse::<SortField>()
                .map_err(|e| AppError::bad_request(&e))?,
            None => SortField::default(),
        };
        let sort_order = match self.order.as_deref() {
            Some(s) => s
                .parse::<SortOrder>()
                .map_err(|e| AppError::bad_request(&e))?,
            None => SortOrder::default(),
        };

        let amount_min_cents = self
            .amount_min
            .map(|a| {
                money::try_to_cents(a)
                    .ok_or_else(|| AppError::bad_request("amount_min out of range"))
            })
            .transpose()?;
        let amount_max_cents = self
            .amount_max
            .map(|a| {
                money::try_to_cents(a)
                    .ok_or_else(|| AppError::bad_request("amount_max out of range"))
            })
            .transpose()?;

        Ok(ExpenseFilter::new()
            .description(self.description.as_deref())
            .category_id(self.category_id)
            .date_from(self.date_from)
            .date_to(self.date_to)
            .amount_min_cents(amount_min_cents)
            .amount_max_cents(amount_max_cents)
            .sort_field(sort_field)
            .sort_order(sort_order))
    }
}

/// Query parameters for the pure pagination routes
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl PageQuery {
    fn pagination(&self) -> (i64, i64) {
        (self.page.max(0), self.page_size.clamp(1, MAX_PAGE_SIZE))
    }
}

/// Query parameters for period routes (both dates required)
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

/// GET /api/expenses - List the owner's expenses, filtered and paged
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ExpenseQuery>,
) -> Result<Json<Page<Expense>>, AppError> {
    let (page, page_size) = params.pagination();
    let filter = params.to_filter()?;
    let result = state.db.search_expenses(user.id, filter, page, page_size)?;
    Ok(Json(result))
}

/// GET /api/expenses/:id - Fetch one expense
///
/// An expense owned by someone else is a 404, indistinguishable from a
/// missing id.
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    let expense = state.db.get_expense(user.id, id)?;
    Ok(Json(expense))
}

/// GET /api/expenses/category/:id - List the owner's expenses in one category
pub async fn list_expenses_by_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(category_id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Page<Expense>>, AppError> {
    let (page, page_size) = params.pagination();
    let result = state
        .db
        .list_expenses_by_category(user.id, category_id, page, page_size)?;
    Ok(Json(result))
}

/// GET /api/expenses/period?from=&to= - List the owner's expenses in a range
pub async fn list_expenses_by_period(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Page<Expense>>, AppError> {
    let page = params.page.max(0);
    let page_size = params.page_size.clamp(1, MAX_PAGE_SIZE);
    let result = state
        .db
        .list_expenses_by_period(user.id, params.from, params.to, page, page_size)?;
    Ok(Json(result))
}

/// Response for the period total route
#[derive(Debug, Serialize)]
pub struct PeriodTotal {
    pub total: Decimal,
}

/// GET /api/expenses/summary/total?from=&to= - Sum for a period (zero when empty)
pub async fn sum_for_period(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<PeriodTotal>, AppError> {
    let total = state.db.sum_for_period(user.id, params.from, params.to)?;
    Ok(Json(PeriodTotal { total }))
}

/// Response for the period count route
#[derive(Debug, Serialize)]
pub struct PeriodCount {
    pub count: i64,
}

/// GET /api/expenses/summary/count?from=&to= - Count for a period (zero when empty)
pub async fn count_for_period(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<PeriodCount>, AppError> {
    let count = state.db.count_for_period(user.id, params.from, params.to)?;
    Ok(Json(PeriodCount { count }))
}

/// POST /api/expenses - Create an expense for the owner
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewExpense>,
) -> Result<Json<Expense>, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::bad_request("Description is required"));
    }
    let expense = state.db.create_expense(user.id, &req)?;
    Ok(Json(expense))
}

/// PUT /api/expenses/:id - Partially update an expense
///
/// Only supplied fields change; id, owner and created_at are never
/// client-writable.
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<ExpenseUpdate>,
) -> Result<Json<Expense>, AppError> {
    let expense = state.db.update_expense(user.id, id, &req)?;
    Ok(Json(expense))
}

/// DELETE /api/expenses/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.delete_expense(user.id, id)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
