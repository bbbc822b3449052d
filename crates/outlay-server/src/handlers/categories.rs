//! Category handlers
//!
//! Categories are a shared catalog; these routes still require an
//! authenticated caller but are not owner-scoped.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{AppError, AppState};
use outlay_core::models::{Category, NewCategory};

/// GET /api/categories - List all categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.db.list_categories()?;
    Ok(Json(categories))
}

/// GET /api/categories/:id - Fetch one category
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    let category = state.db.get_category(id)?;
    Ok(Json(category))
}

/// POST /api/categories - Create a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewCategory>,
) -> Result<Json<Category>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::bad_request("Category name is required"));
    }
    let category = state.db.create_category(&req)?;
    Ok(Json(category))
}

/// PUT /api/categories/:id - Update a category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<NewCategory>,
) -> Result<Json<Category>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::bad_request("Category name is required"));
    }
    let category = state.db.update_category(id, &req)?;
    Ok(Json(category))
}

/// DELETE /api/categories/:id - Delete a category
///
/// Fails with 409 while any expense still references the category.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.delete_category(id)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
