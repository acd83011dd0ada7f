//! 发票渲染服务

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use rust_decimal::Decimal;
use tracing::debug;

use super::model::{InvoiceLayout, COLUMNS};
use crate::app::cart::model::CartLine;
use crate::app::order::model::{Order, OrderId};
use crate::core::error::CoreError;
use crate::infrastructure::config::InvoiceConfig;

// A4，单位毫米
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_RIGHT: f32 = 190.0;
const ROW_HEIGHT: f32 = 7.0;
const FIRST_PAGE_HEADER_Y: f32 = 248.0;
const NEXT_PAGE_HEADER_Y: f32 = 270.0;
const COLUMN_X: [f32; 4] = [20.0, 110.0, 130.0, 160.0];

/// 生成好的发票
#[derive(Debug, Clone)]
pub struct RenderedInvoice {
    pub order_id: OrderId,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub total: Decimal,
}

#[derive(Clone)]
pub struct InvoiceRenderer {
    title: String,
    currency: String,
}

impl InvoiceRenderer {
    pub fn new(config: &InvoiceConfig) -> Self {
        Self {
            title: config.title.clone(),
            currency: config.currency.clone(),
        }
    }

    pub fn filename(order_id: OrderId) -> String {
        format!("invoice_{}.pdf", order_id)
    }

    pub fn layout(
        &self,
        order_id: OrderId,
        created_at: DateTime<Utc>,
        lines: &[CartLine],
        total: Decimal,
    ) -> Result<InvoiceLayout, CoreError> {
        InvoiceLayout::build(
            &self.title,
            &self.currency,
            order_id,
            created_at,
            lines,
            total,
        )
    }

    pub fn render_order(&self, order: &Order) -> Result<RenderedInvoice, CoreError> {
        self.render(order.id, order.created_at, &order.lines, order.total)
    }

    pub fn render(
        &self,
        order_id: OrderId,
        created_at: DateTime<Utc>,
        lines: &[CartLine],
        total: Decimal,
    ) -> Result<RenderedInvoice, CoreError> {
        let layout = self.layout(order_id, created_at, lines, total)?;
        let pages = layout.pages();
        let page_count = pages.len();

        let (doc, first_page, first_layer) = PdfDocument::new(
            layout.heading.clone(),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "Layer 1",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?;

        let mut targets = vec![(first_page, first_layer)];
        for _ in 1..page_count {
            targets.push(doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1"));
        }

        for (index, ((page, layer), range)) in targets.into_iter().zip(&pages).enumerate() {
            let canvas = doc.get_page(page).get_layer(layer);

            let header_y = if index == 0 {
                canvas.use_text(layout.title.as_str(), 20.0, Mm(MARGIN_LEFT), Mm(277.0), &bold);
                canvas.use_text(layout.heading.as_str(), 13.0, Mm(MARGIN_LEFT), Mm(266.0), &regular);
                canvas.use_text(layout.date_line.as_str(), 11.0, Mm(MARGIN_LEFT), Mm(259.0), &regular);
                FIRST_PAGE_HEADER_Y
            } else {
                NEXT_PAGE_HEADER_Y
            };

            draw_columns(&canvas, header_y, &bold);
            draw_rule(&canvas, header_y - 2.0);

            let mut y = header_y - ROW_HEIGHT - 2.0;
            for row in &layout.rows[range.clone()] {
                let cells = [
                    row.product.clone(),
                    row.quantity.to_string(),
                    layout.amount(row.unit_price),
                    layout.amount(row.line_total),
                ];
                for (x, cell) in COLUMN_X.iter().zip(cells) {
                    canvas.use_text(cell, 10.0, Mm(*x), Mm(y), &regular);
                }
                y -= ROW_HEIGHT;
            }

            if index + 1 == page_count {
                draw_rule(&canvas, y + ROW_HEIGHT - 3.0);
                canvas.use_text(layout.total_line(), 12.0, Mm(COLUMN_X[2]), Mm(y - 3.0), &bold);
            }

            canvas.use_text(
                format!("Page {} / {}", index + 1, page_count),
                8.0,
                Mm(MARGIN_RIGHT - 20.0),
                Mm(10.0),
                &regular,
            );
        }

        let bytes = doc.save_to_bytes().map_err(render_error)?;
        debug!(order_id, pages = page_count, size = bytes.len(), "invoice rendered");

        Ok(RenderedInvoice {
            order_id,
            filename: Self::filename(order_id),
            bytes,
            pages: page_count,
            total: layout.total,
        })
    }
}

fn draw_columns(canvas: &PdfLayerReference, y: f32, font: &IndirectFontRef) {
    for (x, title) in COLUMN_X.iter().zip(COLUMNS) {
        canvas.use_text(title, 10.0, Mm(*x), Mm(y), font);
    }
}

fn draw_rule(canvas: &PdfLayerReference, y: f32) {
    canvas.set_outline_thickness(0.5);
    canvas.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN_LEFT), Mm(y)), false),
            (Point::new(Mm(MARGIN_RIGHT), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn render_error(e: impl std::fmt::Display) -> CoreError {
    CoreError::Render(e.to_string())
}
