//! 商品目录处理器

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use super::model::{NewProduct, Product, ProductId};
use crate::app::AppState;
use crate::core::{error::CoreError, response::ApiResponse};

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Product>>>, CoreError> {
    let products = state.catalog.list_products().await?;
    Ok(Json(ApiResponse::success(products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<Product>>, CoreError> {
    let product = state
        .catalog
        .get_product(id)
        .await?
        .ok_or_else(|| CoreError::product_not_found(id))?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<NewProduct>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), CoreError> {
    let id = state.catalog.insert_product(payload).await?;
    let product = state
        .catalog
        .get_product(id)
        .await?
        .ok_or_else(|| CoreError::product_not_found(id))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, CoreError> {
    state.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
