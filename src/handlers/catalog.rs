//! Catalog handlers: what the feedback form offers for selection

use crate::models::*;
use crate::workflow::FormPolicy;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::AppState;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::success("ok")))
}

/// List products with their variants
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.products().await {
        Ok(products) => (StatusCode::OK, Json(ApiResponse::success(products))),
        Err(e) => {
            tracing::error!("Failed to list products: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load products")),
            )
        }
    }
}

/// List the variants of one product
pub async fn list_variants(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> impl IntoResponse {
    match state.catalog.product(&product_id).await {
        Ok(Some(product)) => (StatusCode::OK, Json(ApiResponse::success(product.variants))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Vec<Variant>>::error("Product not found")),
        ),
        Err(e) => {
            tracing::error!("Failed to list variants for {}: {}", product_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load product variants")),
            )
        }
    }
}

pub async fn list_issues(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.issues().await {
        Ok(issues) => (StatusCode::OK, Json(ApiResponse::success(issues))),
        Err(e) => {
            tracing::error!("Failed to list issues: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load issues")),
            )
        }
    }
}

pub async fn list_locations(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.locations().await {
        Ok(locations) => (StatusCode::OK, Json(ApiResponse::success(locations))),
        Err(e) => {
            tracing::error!("Failed to list store locations: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load store locations")),
            )
        }
    }
}

/// The form policy this deployment enforces, so clients render the same form
pub async fn get_form_policy(State(state): State<AppState>) -> Json<ApiResponse<FormPolicy>> {
    Json(ApiResponse::success(state.form_policy.as_ref().clone()))
}
