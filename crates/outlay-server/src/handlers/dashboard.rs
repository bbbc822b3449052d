//! Dashboard handler

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, AuthUser};
use outlay_core::dashboard::YearMonth;
use outlay_core::models::Dashboard;

/// Query parameters for the dashboard
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Reference month as YYYY-MM; defaults to the current month
    pub month: Option<String>,
}

/// GET /api/dashboard - Monthly aggregates for the owner
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, AppError> {
    let reference = match params.month.as_deref() {
        Some(s) => YearMonth::parse(s)?,
        None => YearMonth::containing(chrono::Utc::now().date_naive()),
    };

    let dashboard = state.db.dashboard(user.id, reference)?;
    Ok(Json(dashboard))
}
