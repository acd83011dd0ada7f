//! 应用层：商品目录、购物车、订单、发票与会话

pub mod cart;
pub mod catalog;
pub mod invoice;
pub mod money;
pub mod order;
pub mod session;

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;

use crate::core::error::CoreError;
use crate::infrastructure::{config::Config, database::DatabaseManager};
use cart::service::CartService;
use catalog::service::CatalogService;
use invoice::service::InvoiceRenderer;
use order::service::OrderService;
use session::{middleware::session_middleware, store::SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub catalog: CatalogService,
    pub cart: CartService,
    pub orders: OrderService,
    pub invoices: InvoiceRenderer,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        let catalog = CatalogService::new(pool.clone());
        Self {
            cart: CartService::new(catalog.clone(), config.shop.cap_cart_at_stock),
            orders: OrderService::new(pool.clone(), config.shop.stock_policy),
            invoices: InvoiceRenderer::new(&config.invoice),
            sessions: SessionStore::new(
                pool.clone(),
                config.session.cookie_name.clone(),
                chrono::Duration::days(i64::from(config.session.ttl_days)),
            ),
            catalog,
            pool,
        }
    }
}

/// 创建路由
pub fn router(state: AppState) -> Router {
    // 只有购物车和结算需要会话
    let session_routes = Router::new()
        .route("/cart", get(cart::handler::view_cart).delete(cart::handler::clear_cart))
        .route(
            "/cart/items/:id",
            post(cart::handler::add_to_cart).delete(cart::handler::remove_from_cart),
        )
        .route("/checkout", post(order::handler::checkout))
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/products",
            get(catalog::handler::list_products).post(catalog::handler::create_product),
        )
        .route(
            "/products/:id",
            get(catalog::handler::get_product).delete(catalog::handler::delete_product),
        )
        .route("/orders", get(order::handler::list_orders))
        .route("/orders/:id", get(order::handler::get_order))
        .route("/orders/:id/invoice", get(invoice::handler::download_invoice))
        .merge(session_routes)
        .with_state(state)
}

/// 健康检查
async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, CoreError> {
    DatabaseManager::ping(&state.pool).await?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "database": "connected",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
