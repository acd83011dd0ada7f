use anyhow::Context;
use axum::middleware;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use storefront::app::catalog::service::CatalogService;
use storefront::core::middleware::request_logging_middleware;
use storefront::infrastructure::{config, database::DatabaseManager, logger::Logger};
use storefront::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config().context("加载配置失败")?;
    let _log_guard = Logger::init(&config.logging).context("初始化日志失败")?;

    info!("Starting storefront server...");

    let db = DatabaseManager::new(&config.database).await.map_err(|e| {
        error!("Failed to initialize database: {}", e);
        e
    })?;
    let pool = db.into_pool();

    if config.shop.seed_demo_products {
        CatalogService::new(pool.clone()).seed_demo_products().await?;
    }

    let state = AppState::new(pool, &config);
    state.sessions.prune_expired().await?;
    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.http.timeout_seconds,
            )))
            .layer(middleware::from_fn(request_logging_middleware)),
    );

    let listener = TcpListener::bind(config.listen_address())
        .await
        .with_context(|| format!("无法绑定到 {}", config.listen_address()))?;
    let addr = listener.local_addr()?;

    info!("🚀 Storefront running on http://{}", addr);
    info!("📖 API 端点:");
    info!("   GET    /products              - 商品列表");
    info!("   POST   /products              - 新增商品");
    info!("   DELETE /products/:id          - 删除商品");
    info!("   GET    /cart                  - 查看购物车");
    info!("   POST   /cart/items/:id        - 加入购物车");
    info!("   DELETE /cart/items/:id        - 移出购物车");
    info!("   POST   /checkout              - 结算并下载发票");
    info!("   GET    /orders/:id/invoice    - 重新下载发票");
    info!(
        "   stock policy: {:?}, cap cart at stock: {}",
        config.shop.stock_policy, config.shop.cap_cart_at_stock
    );

    axum::serve(listener, app).await?;

    Ok(())
}
