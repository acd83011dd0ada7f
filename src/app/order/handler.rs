//! 订单处理器

use axum::{
    extract::{Path, State},
    response::{Json, Response},
    Extension,
};

use super::model::{Order, OrderId};
use crate::app::invoice::handler::pdf_response;
use crate::app::session::model::SessionHandle;
use crate::app::AppState;
use crate::core::{error::CoreError, response::ApiResponse};

/// 结算并直接返回发票
pub async fn checkout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response, CoreError> {
    let mut session = session.lock().await;
    let order = state.orders.place_order(&mut session).await?;
    let invoice = state.invoices.render_order(&order)?;
    Ok(pdf_response(invoice))
}

pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Order>>>, CoreError> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(ApiResponse::success(orders)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<Order>>, CoreError> {
    let order = state.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}
