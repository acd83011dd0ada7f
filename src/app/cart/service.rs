//! 购物车业务服务

use rust_decimal::Decimal;
use tracing::debug;

use super::model::{AddOutcome, CartLine, CartView};
use crate::app::catalog::{model::ProductId, service::CatalogService};
use crate::app::session::model::SessionContext;
use crate::core::error::CoreError;

#[derive(Clone)]
pub struct CartService {
    catalog: CatalogService,
    cap_at_stock: bool,
}

impl CartService {
    pub fn new(catalog: CatalogService, cap_at_stock: bool) -> Self {
        Self {
            catalog,
            cap_at_stock,
        }
    }

    /// 加入购物车；商品不存在时什么也不做，返回 `None`
    pub async fn add(
        &self,
        session: &mut SessionContext,
        product_id: ProductId,
    ) -> Result<Option<AddOutcome>, CoreError> {
        let Some(product) = self.catalog.get_product(product_id).await? else {
            debug!(product_id, "add to cart ignored: unknown product");
            return Ok(None);
        };

        let outcome = session.cart_mut().add(&product, self.cap_at_stock);
        debug!(product_id, session_id = %session.id(), ?outcome, "cart add");
        Ok(Some(outcome))
    }

    /// 移出购物项；购物车中没有该商品时不修改会话
    pub fn remove(&self, session: &mut SessionContext, product_id: ProductId) -> Option<CartLine> {
        session.cart().get(product_id)?;
        session.cart_mut().remove(product_id)
    }

    pub fn clear(&self, session: &mut SessionContext) {
        if !session.cart().is_empty() {
            session.cart_mut().clear();
        }
    }

    pub fn total(&self, session: &SessionContext) -> Decimal {
        session.cart().total()
    }

    pub fn view(&self, session: &SessionContext) -> CartView {
        CartView::from(session.cart())
    }
}
