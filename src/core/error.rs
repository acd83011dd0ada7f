//! 核心错误处理模块

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::app::catalog::model::ProductId;

/// 核心错误类型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("购物车为空，无法结算")]
    EmptyCart,
    #[error("{0}")]
    NotFound(String),
    #[error("商品 {product_id} 库存不足: 需要 {requested}，剩余 {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },
    #[error("{0}")]
    BadRequest(String),
    #[error("存储错误: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("发票生成失败: {0}")]
    Render(String),
}

impl CoreError {
    pub fn product_not_found(id: ProductId) -> Self {
        CoreError::NotFound(format!("商品 {} 不存在", id))
    }

    pub fn order_not_found(id: i64) -> Self {
        CoreError::NotFound(format!("订单 {} 不存在", id))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::EmptyCart | CoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::InsufficientStock { .. } => StatusCode::CONFLICT,
            CoreError::Persistence(_) | CoreError::Serialization(_) | CoreError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            CoreError::EmptyCart => "EMPTY_CART",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::BadRequest(_) => "BAD_REQUEST",
            CoreError::Persistence(_) => "PERSISTENCE_ERROR",
            CoreError::Serialization(_) | CoreError::Render(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} 无效", field))
                })
            })
            .collect();

        CoreError::BadRequest(messages.join(", "))
    }
}

/// 错误响应结构
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
    pub timestamp: String,
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 内部错误不向用户暴露细节
        let user_message = if status.is_server_error() {
            error!("request failed: {}", self);
            "服务器内部错误".to_string()
        } else {
            self.to_string()
        };

        let error_response = ErrorResponse {
            error: self.code().to_string(),
            message: user_message,
            code: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, axum::Json(error_response)).into_response()
    }
}
