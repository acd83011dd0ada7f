//! 订单业务服务

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::info;

use super::model::{Order, OrderId, OrderRow};
use crate::app::catalog::{model::StockPolicy, service::decrement_stock_on};
use crate::app::money;
use crate::app::session::model::SessionContext;
use crate::core::error::CoreError;

#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    policy: StockPolicy,
}

impl OrderService {
    pub fn new(pool: SqlitePool, policy: StockPolicy) -> Self {
        Self { pool, policy }
    }

    /// 结算当前会话的购物车
    ///
    /// 扣库存和写订单在同一个事务中完成；任何一步失败都会回滚，购物车保持不变。
    /// 成功后清空购物车并返回订单。
    pub async fn place_order(&self, session: &mut SessionContext) -> Result<Order, CoreError> {
        let cart = session.cart();
        let total = cart.total();
        if cart.is_empty() || total <= Decimal::ZERO {
            return Err(CoreError::EmptyCart);
        }

        let lines = cart.to_lines();
        let total_cents = money::to_cents(total)?;
        let lines_json = serde_json::to_string(&lines)?;
        let created_at = chrono::Utc::now();

        let mut tx = self.pool.begin().await?;

        for line in &lines {
            decrement_stock_on(
                &mut *tx,
                line.product_id,
                i64::from(line.quantity),
                self.policy,
            )
            .await?;
        }

        let result =
            sqlx::query("INSERT INTO orders (created_at, total_cents, lines) VALUES (?, ?, ?)")
                .bind(created_at)
                .bind(total_cents)
                .bind(&lines_json)
                .execute(&mut *tx)
                .await?;

        tx.commit().await?;

        let id = result.last_insert_rowid();
        session.cart_mut().clear();

        info!(
            order_id = id,
            session_id = %session.id(),
            lines = lines.len(),
            %total,
            "order placed"
        );

        Ok(Order {
            id,
            created_at,
            total,
            lines,
        })
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order, CoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, created_at, total_cents, lines FROM orders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::order_not_found(id))?;

        Order::try_from(row)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, CoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, created_at, total_cents, lines FROM orders ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
