//! # storefront
//!
//! 一个最小的网店服务：
//! - 商品目录（SQLite 存储）
//! - 基于会话的购物车，使用加入时的价格快照计算合计
//! - 结算时扣减库存并记录订单
//! - 根据订单生成 PDF 发票

pub mod app;
pub mod core;
pub mod infrastructure;

pub use app::{router, AppState};
pub use crate::core::error::CoreError;
