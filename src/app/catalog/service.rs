//! 商品目录业务服务

use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::model::{NewProduct, Product, ProductId, ProductRow, StockPolicy};
use crate::app::money;
use crate::core::error::CoreError;

#[derive(Clone)]
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, CoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price_cents, stock, image FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, CoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price_cents, stock, image FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    pub async fn insert_product(&self, product: NewProduct) -> Result<ProductId, CoreError> {
        product.check()?;
        let price_cents = money::to_cents(product.price)?;

        let result = sqlx::query(
            "INSERT INTO products (name, price_cents, stock, image) VALUES (?, ?, ?, ?)",
        )
        .bind(product.name.trim())
        .bind(price_cents)
        .bind(product.stock)
        .bind(product.image.as_deref())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(product_id = id, name = %product.name, "product created");
        Ok(id)
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::product_not_found(id));
        }

        info!(product_id = id, "product deleted");
        Ok(())
    }

    /// 扣减库存，返回扣减后的库存
    pub async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i64,
        policy: StockPolicy,
    ) -> Result<i64, CoreError> {
        let mut conn = self.pool.acquire().await?;
        decrement_stock_on(&mut conn, id, quantity, policy).await
    }

    /// 商品表为空时写入演示数据，返回写入的数量
    pub async fn seed_demo_products(&self) -> Result<usize, CoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        if count.0 > 0 {
            debug!("Catalog already contains products, skipping seed");
            return Ok(0);
        }

        let samples = [
            ("Laptop", "699.99", 20, Some("laptop.png")),
            ("Smartphone", "349.50", 35, Some("phone.jpg")),
            ("Headphones", "59.90", 50, None),
            ("USB-C Cable", "9.99", 200, None),
        ];

        for (name, price, stock, image) in samples {
            let price = Decimal::from_str(price)
                .map_err(|e| CoreError::BadRequest(format!("无效的演示价格: {}", e)))?;
            self.insert_product(NewProduct {
                name: name.to_string(),
                price,
                stock,
                image: image.map(str::to_string),
            })
            .await?;
        }

        info!("Catalog seeded with {} demo products", samples.len());
        Ok(samples.len())
    }
}

/// 在给定连接（通常是事务）上扣减库存
pub async fn decrement_stock_on(
    conn: &mut SqliteConnection,
    id: ProductId,
    quantity: i64,
    policy: StockPolicy,
) -> Result<i64, CoreError> {
    let result = match policy {
        StockPolicy::AllowNegative => {
            sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ?")
                .bind(quantity)
                .bind(id)
                .execute(&mut *conn)
                .await?
        }
        StockPolicy::Reject => {
            sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ?")
                .bind(quantity)
                .bind(id)
                .bind(quantity)
                .execute(&mut *conn)
                .await?
        }
    };

    let remaining: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match (result.rows_affected(), remaining) {
        (_, None) => Err(CoreError::product_not_found(id)),
        (0, Some(available)) => Err(CoreError::InsufficientStock {
            product_id: id,
            requested: quantity,
            available,
        }),
        (_, Some(stock)) => {
            if stock < 0 {
                warn!(product_id = id, stock, "stock went negative");
            }
            Ok(stock)
        }
    }
}
