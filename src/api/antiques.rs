//! Catalog endpoints: a public ordered listing plus the gated admin CRUD and
//! reordering operations.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::catalog::reorder::{assign_positions, is_permutation, move_item, MoveError, MoveTarget};
use crate::catalog::store;
use crate::db::{Antique, CreateAntiqueRequest, UpdateAntiqueRequest};
use crate::AppState;

use super::auth::AdminIdentity;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_description, validate_image_url, validate_price, validate_title,
};

/// GET /api/antiques: everything, ascending display order. Public.
pub async fn list_antiques(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Antique>>, ApiError> {
    Ok(Json(store::list(&state.db).await?))
}

/// GET /api/antiques/:id
pub async fn get_antique(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Antique>, ApiError> {
    store::get(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item not found"))
}

fn validate_create_request(req: &CreateAntiqueRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_title(&req.title) {
        errors.add("title", e);
    }
    if let Err(e) = validate_description(&req.description) {
        errors.add("description", e);
    }
    if let Err(e) = validate_price(req.price) {
        errors.add("price", e);
    }
    if let Err(e) = validate_image_url(&req.image_url) {
        errors.add("image_url", e);
    }

    errors.finish()
}

fn validate_update_request(req: &UpdateAntiqueRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(title) = &req.title {
        if let Err(e) = validate_title(title) {
            errors.add("title", e);
        }
    }
    if let Err(e) = validate_description(&req.description) {
        errors.add("description", e);
    }
    if let Some(price) = req.price {
        if let Err(e) = validate_price(price) {
            errors.add("price", e);
        }
    }
    if let Err(e) = validate_image_url(&req.image_url) {
        errors.add("image_url", e);
    }

    errors.finish()
}

/// POST /api/admin/antiques: new items land at the end of the display order.
pub async fn create_antique(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Json(req): Json<CreateAntiqueRequest>,
) -> Result<Json<Antique>, ApiError> {
    validate_create_request(&req)?;
    let item = store::create(&state.db, &req).await?;
    tracing::info!(id = %item.id, title = %item.title, by = %admin.email, "Catalog item created");
    Ok(Json(item))
}

/// PUT /api/admin/antiques/:id: partial update; last write wins.
pub async fn update_antique(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAntiqueRequest>,
) -> Result<Json<Antique>, ApiError> {
    validate_update_request(&req)?;
    store::update(&state.db, &id, &req)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item not found"))
}

/// DELETE /api/admin/antiques/:id
pub async fn delete_antique(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(admin): Extension<AdminIdentity>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !store::delete(&state.db, &id).await? {
        return Err(ApiError::not_found("Item not found"));
    }
    tracing::info!(id = %id, by = %admin.email, "Catalog item deleted");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Drop target for a single move. Exactly one of the two fields.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub before_id: Option<String>,
    pub to_index: Option<usize>,
}

/// POST /api/admin/antiques/:id/move: apply one drag-end move and persist the
/// re-derived dense order in a single transaction. A failed batch leaves the
/// last confirmed order in place.
pub async fn move_antique(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(admin): Extension<AdminIdentity>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Vec<Antique>>, ApiError> {
    let target = match (req.before_id, req.to_index) {
        (Some(before_id), None) => MoveTarget::Before(before_id),
        (None, Some(index)) => MoveTarget::ToIndex(index),
        _ => {
            return Err(ApiError::validation_field(
                "target",
                "Provide exactly one of before_id or to_index",
            ))
        }
    };

    let current = store::list(&state.db).await?;
    let order: Vec<String> = current.iter().map(|item| item.id.clone()).collect();

    match move_item(&order, &id, &target) {
        Ok(Some(next)) => {
            store::set_positions(&state.db, &assign_positions(&next)).await?;
            tracing::info!(id = %id, by = %admin.email, "Catalog order updated");
        }
        Ok(None) => {} // dropped onto itself
        Err(MoveError::UnknownItem(_)) => return Err(ApiError::not_found("Item not found")),
        Err(e) => return Err(ApiError::validation_field("target", e.to_string())),
    }

    Ok(Json(store::list(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<String>,
}

/// PUT /api/admin/antiques/reorder: full-order batch. The id list must be a
/// permutation of the current catalog, guarding against stale clients.
pub async fn reorder_antiques(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Vec<Antique>>, ApiError> {
    let current = store::list(&state.db).await?;
    let order: Vec<String> = current.iter().map(|item| item.id.clone()).collect();

    if !is_permutation(&order, &req.ids) {
        return Err(ApiError::validation_field(
            "ids",
            "Reorder must include every current item exactly once",
        ));
    }

    store::set_positions(&state.db, &assign_positions(&req.ids)).await?;
    tracing::info!(count = req.ids.len(), by = %admin.email, "Catalog order rewritten");

    Ok(Json(store::list(&state.db).await?))
}
