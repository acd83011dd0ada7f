//! 订单数据模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::app::cart::model::CartLine;
use crate::app::money;
use crate::core::error::CoreError;

pub type OrderId = i64;

/// 结算后生成的订单，创建后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    pub lines: Vec<CartLine>,
}

impl Order {
    /// 按购物项重新计算的合计
    pub fn lines_total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
    pub lines: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = CoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            created_at: row.created_at,
            total: money::from_cents(row.total_cents),
            lines: serde_json::from_str(&row.lines)?,
        })
    }
}
