//! 发票处理器

use axum::{
    extract::{Path, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
};

use super::service::RenderedInvoice;
use crate::app::order::model::OrderId;
use crate::app::AppState;
use crate::core::error::CoreError;

pub const ORDER_ID_HEADER: HeaderName = HeaderName::from_static("x-order-id");

/// 以附件形式返回 PDF
pub fn pdf_response(invoice: RenderedInvoice) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", invoice.filename),
            ),
            (ORDER_ID_HEADER, invoice.order_id.to_string()),
        ],
        invoice.bytes,
    )
        .into_response()
}

/// 根据已保存的订单重新生成发票
pub async fn download_invoice(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Response, CoreError> {
    let order = state.orders.get_order(id).await?;
    let invoice = state.invoices.render_order(&order)?;
    Ok(pdf_response(invoice))
}
