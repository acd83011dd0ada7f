//! 购物车数据模型
//!
//! 购物车按商品 ID 有序保存购物项，每一项都带有加入时的名称和价格快照，
//! 合计金额只使用快照价格，不受目录后续改价影响。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::app::catalog::model::{Product, ProductId};
use crate::app::money;

/// 购物项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    fn snapshot(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// 加入购物车的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    Incremented,
    /// 数量已达到库存上限，未做修改
    AtStockLimit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: BTreeMap<ProductId, CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一件商品
    ///
    /// 已有购物项时数量加一；`cap_at_stock` 为真时数量达到当前库存后不再增加。
    /// 首次加入总是数量为 1。
    pub fn add(&mut self, product: &Product, cap_at_stock: bool) -> AddOutcome {
        match self.lines.get_mut(&product.id) {
            Some(line) => {
                if cap_at_stock && i64::from(line.quantity) >= product.stock {
                    AddOutcome::AtStockLimit
                } else {
                    line.quantity += 1;
                    AddOutcome::Incremented
                }
            }
            None => {
                self.lines.insert(product.id, CartLine::snapshot(product));
                AddOutcome::Added
            }
        }
    }

    /// 删除购物项，不存在时返回 `None`
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartLine> {
        self.lines.remove(&product_id)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total(&self) -> Decimal {
        self.lines.values().map(CartLine::line_total).sum()
    }

    pub fn get(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.get(&product_id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    pub fn to_lines(&self) -> Vec<CartLine> {
        self.lines.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn item_count(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity)).sum()
    }
}

/// 购物车视图中的一行
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Decimal,
}

/// `GET /cart` 的返回结构
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u64,
    pub total: Decimal,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .map(|line| CartLineView {
                    line: line.clone(),
                    line_total: money::round_to_cents(line.line_total()),
                })
                .collect(),
            item_count: cart.item_count(),
            total: money::round_to_cents(cart.total()),
        }
    }
}

/// `POST /cart/items/:id` 的返回结构
///
/// `outcome` 为 `null` 表示商品不存在，购物车没有变化。
#[derive(Debug, Clone, Serialize)]
pub struct CartUpdate {
    pub outcome: Option<AddOutcome>,
    #[serde(flatten)]
    pub cart: CartView,
}
