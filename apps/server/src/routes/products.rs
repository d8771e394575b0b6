//! `/api/products` routes.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use stockroom_core::alerts::{InventoryAlerts, InventoryReport};
use stockroom_core::Product;

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::services::inventory::{NewProduct, ProductPatch};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/alerts", get(alerts))
        .route("/report", get(report))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn list_products(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.inventory().list(&caller).await?))
}

async fn create_product(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(input) = payload?;
    let product = state.inventory().create(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = path?;
    Ok(Json(state.inventory().get(&caller, &id).await?))
}

async fn update_product(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    Ok(Json(state.inventory().update(&caller, &id, patch).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = path?;
    state.inventory().delete(&caller, &id).await?;
    Ok(Json(json!({ "message": "Product removed" })))
}

async fn alerts(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<InventoryAlerts>> {
    Ok(Json(state.inventory().alerts(&caller).await?))
}

async fn report(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<InventoryReport>> {
    Ok(Json(state.inventory().report(&caller).await?))
}
