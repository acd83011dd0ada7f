//! 发票版面模型
//!
//! 版面在生成 PDF 之前先计算好，行、分页和合计都可以脱离 PDF 单独验证。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::ops::Range;

use crate::app::cart::model::CartLine;
use crate::app::order::model::OrderId;
use crate::core::error::CoreError;

pub const COLUMNS: [&str; 4] = ["Product", "Qty", "Price", "Line Total"];

/// 第一页可放的行数（页眉占去一部分）
pub const FIRST_PAGE_ROWS: usize = 30;
/// 后续页可放的行数
pub const NEXT_PAGE_ROWS: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRow {
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<&CartLine> for InvoiceRow {
    fn from(line: &CartLine) -> Self {
        Self {
            product: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceLayout {
    pub title: String,
    pub heading: String,
    pub date_line: String,
    pub currency: String,
    pub rows: Vec<InvoiceRow>,
    pub total: Decimal,
}

impl InvoiceLayout {
    /// 生成版面；各行小计之和必须等于订单记录的合计
    pub fn build(
        title: &str,
        currency: &str,
        order_id: OrderId,
        created_at: DateTime<Utc>,
        lines: &[CartLine],
        recorded_total: Decimal,
    ) -> Result<Self, CoreError> {
        let rows: Vec<InvoiceRow> = lines.iter().map(InvoiceRow::from).collect();
        let total: Decimal = rows.iter().map(|row| row.line_total).sum();

        if total != recorded_total {
            return Err(CoreError::Render(format!(
                "订单 {} 合计不一致: 记录 {}，明细 {}",
                order_id, recorded_total, total
            )));
        }

        Ok(Self {
            title: title.to_string(),
            heading: format!("Invoice #{}", order_id),
            date_line: format!("Date: {}", created_at.format("%Y-%m-%d %H:%M UTC")),
            currency: currency.to_string(),
            rows,
            total,
        })
    }

    pub fn amount(&self, value: Decimal) -> String {
        format!("{:.2} {}", value, self.currency)
    }

    pub fn total_line(&self) -> String {
        format!("Total: {}", self.amount(self.total))
    }

    /// 每一页对应的行区间，至少一页
    pub fn pages(&self) -> Vec<Range<usize>> {
        page_ranges(self.rows.len())
    }
}

pub fn page_ranges(row_count: usize) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let first_end = row_count.min(FIRST_PAGE_ROWS);
    pages.push(0..first_end);

    let mut start = first_end;
    while start < row_count {
        let end = (start + NEXT_PAGE_ROWS).min(row_count);
        pages.push(start..end);
        start = end;
    }

    pages
}
