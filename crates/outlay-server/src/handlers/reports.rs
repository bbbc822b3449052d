//! Report export handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Extension,
};

use super::expenses::ExpenseQuery;
use crate::{AppError, AppState, AuthUser};

/// GET /api/reports/expenses.csv - Filtered expense report as CSV
///
/// Takes the same filter parameters as the expense listing; pagination
/// parameters are ignored, the report always covers the full filtered set.
pub async fn export_expenses_csv(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ExpenseQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.to_filter()?;
    let csv = state.db.export_expenses_csv(user.id, filter)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"expenses.csv\"",
            ),
        ],
        csv,
    ))
}
