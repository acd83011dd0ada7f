//! 购物车处理器

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};

use super::model::{CartUpdate, CartView};
use crate::app::catalog::model::ProductId;
use crate::app::session::model::SessionHandle;
use crate::app::AppState;
use crate::core::{error::CoreError, response::ApiResponse};

pub async fn view_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Json<ApiResponse<CartView>> {
    let session = session.lock().await;
    Json(ApiResponse::success(state.cart.view(&session)))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<CartUpdate>>, CoreError> {
    let mut session = session.lock().await;
    let outcome = state.cart.add(&mut session, id).await?;
    Ok(Json(ApiResponse::success(CartUpdate {
        outcome,
        cart: state.cart.view(&session),
    })))
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(id): Path<ProductId>,
) -> Json<ApiResponse<CartView>> {
    let mut session = session.lock().await;
    state.cart.remove(&mut session, id);
    Json(ApiResponse::success(state.cart.view(&session)))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Json<ApiResponse<CartView>> {
    let mut session = session.lock().await;
    state.cart.clear(&mut session);
    Json(ApiResponse::success(state.cart.view(&session)))
}
