//! 商品目录数据模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::money;
use crate::core::error::CoreError;

pub type ProductId = i64;

/// 允许的图片扩展名
const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
    pub image: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub image: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: money::from_cents(row.price_cents),
            stock: row.stock,
            image: row.image.filter(|image| !image.is_empty()),
        }
    }
}

/// 创建商品请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, max = 100, message = "商品名称长度必须在 1 到 100 之间"))]
    pub name: String,

    pub price: Decimal,

    #[validate(range(min = 0, message = "库存不能为负数"))]
    pub stock: i64,

    #[serde(default)]
    pub image: Option<String>,
}

impl NewProduct {
    /// 校验字段，`validator` 覆盖不到的金额和图片在这里检查
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;

        if self.name.trim().is_empty() {
            return Err(CoreError::BadRequest("商品名称不能为空".to_string()));
        }
        if self.price < Decimal::ZERO {
            return Err(CoreError::BadRequest("价格不能为负数".to_string()));
        }
        if self.price.normalize().scale() > 2 {
            return Err(CoreError::BadRequest(format!(
                "价格最多两位小数: {}",
                self.price
            )));
        }
        if let Some(image) = &self.image {
            if !is_allowed_image(image) {
                return Err(CoreError::BadRequest(format!(
                    "不支持的图片格式: {}，允许: {:?}",
                    image, ALLOWED_IMAGE_EXTENSIONS
                )));
            }
        }

        Ok(())
    }
}

pub fn is_allowed_image(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// 结算扣库存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// 总是扣减，库存可能变为负数
    #[default]
    AllowNegative,
    /// 库存不足时拒绝
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn new_product(name: &str, price: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: Decimal::from_str(price).unwrap(),
            stock,
            image: None,
        }
    }

    #[test]
    fn accepts_valid_product() {
        assert!(new_product("Laptop", "699.99", 20).check().is_ok());
        assert!(new_product("Free sticker", "0", 0).check().is_ok());
    }

    #[test]
    fn rejects_invalid_fields() {
        assert!(new_product("", "1", 1).check().is_err());
        assert!(new_product("   ", "1", 1).check().is_err());
        assert!(new_product("Phone", "-1", 1).check().is_err());
        assert!(new_product("Phone", "1", -1).check().is_err());
    }

    #[test]
    fn rejects_sub_cent_prices() {
        assert!(new_product("Gum", "0.005", 1).check().is_err());
        assert!(new_product("Gum", "1.999", 1).check().is_err());
        assert!(new_product("Gum", "1.50000", 1).check().is_ok());
    }

    #[test]
    fn image_extension_whitelist() {
        assert!(is_allowed_image("photo.PNG"));
        assert!(is_allowed_image("a.b.jpeg"));
        assert!(!is_allowed_image("script.exe"));
        assert!(!is_allowed_image("noextension"));

        let mut product = new_product("Camera", "10", 1);
        product.image = Some("camera.bmp".to_string());
        assert!(product.check().is_err());
    }

    #[test]
    fn row_conversion_drops_empty_image() {
        let product = Product::from(ProductRow {
            id: 1,
            name: "Laptop".to_string(),
            price_cents: 69999,
            stock: 20,
            image: Some(String::new()),
        });
        assert_eq!(product.price, Decimal::from_str("699.99").unwrap());
        assert_eq!(product.image, None);
    }

    #[test]
    fn stock_policy_serde_names() {
        let policy: StockPolicy = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(policy, StockPolicy::Reject);
        assert_eq!(
            serde_json::to_string(&StockPolicy::AllowNegative).unwrap(),
            "\"allow_negative\""
        );
    }
}
