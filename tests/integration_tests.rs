use axum::http::{
    header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    HeaderValue, StatusCode,
};
use axum_test::{TestResponse, TestServer};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

use storefront::app::catalog::model::{NewProduct, StockPolicy};
use storefront::app::session::model::SessionContext;
use storefront::infrastructure::{config::Config, database::DatabaseManager};
use storefront::{router, AppState, CoreError};

async fn create_state(config: Config) -> AppState {
    let db = DatabaseManager::in_memory()
        .await
        .expect("Failed to create test database");
    AppState::new(db.into_pool(), &config)
}

async fn create_test_server() -> (TestServer, AppState) {
    let state = create_state(Config::default()).await;
    let server = TestServer::new(router(state.clone())).unwrap();
    (server, state)
}

fn decimal(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

async fn insert(state: &AppState, name: &str, price: &str, stock: i64) -> i64 {
    state
        .catalog
        .insert_product(NewProduct {
            name: name.to_string(),
            price: decimal(price),
            stock,
            image: None,
        })
        .await
        .unwrap()
}

/// 取出响应中的会话 Cookie（只保留 name=value 部分）
fn session_cookie(response: &TestResponse) -> HeaderValue {
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .expect("session cookie should be issued")
        .to_str()
        .unwrap()
        .to_string();
    let pair = set_cookie.split(';').next().unwrap().to_string();
    HeaderValue::from_str(&pair).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server().await;

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_product_crud() {
    let (server, _) = create_test_server().await;

    let response = server
        .post("/products")
        .json(&json!({
            "name": "Laptop",
            "price": "699.99",
            "stock": 20,
            "image": "laptop.png"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["price"], "699.99");
    assert_eq!(body["data"]["image"], "laptop.png");

    let response = server.get("/products").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = server.delete(&format!("/products/{}", id)).await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server.get(&format!("/products/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server.delete(&format!("/products/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_product_is_rejected() {
    let (server, _) = create_test_server().await;

    let response = server
        .post("/products")
        .json(&json!({ "name": "", "price": "-3", "stock": -1 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/products")
        .json(&json!({ "name": "Virus", "price": "1", "stock": 1, "image": "virus.exe" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_twice_checkout_and_invoice() {
    let (server, state) = create_test_server().await;
    let id = insert(&state, "Laptop", "699.99", 20).await;

    let response = server.post(&format!("/cart/items/{}", id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["outcome"], "added");
    let cookie = session_cookie(&response);

    let response = server
        .post(&format!("/cart/items/{}", id))
        .add_header(COOKIE, cookie.clone())
        .await;
    response.assert_status_ok();
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body: Value = response.json();
    assert_eq!(body["data"]["outcome"], "incremented");
    let lines = body["data"]["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(body["data"]["total"], "1399.98");

    let response = server
        .post("/checkout")
        .add_header(COOKIE, cookie.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let disposition = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let order_id: i64 = response
        .headers()
        .get("x-order-id")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(
        disposition,
        format!("attachment; filename=invoice_{}.pdf", order_id)
    );
    assert!(response.as_bytes().starts_with(b"%PDF"));

    // 库存被扣减
    let product = state.catalog.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.stock, 18);

    // 订单合计与购物车一致
    let response = server.get(&format!("/orders/{}", order_id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], "1399.98");
    assert_eq!(body["data"]["lines"][0]["quantity"], 2);

    // 结算后购物车为空
    let response = server.get("/cart").add_header(COOKIE, cookie).await;
    let body: Value = response.json();
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["total"], "0.00");

    // 发票可以重新生成
    let response = server
        .get(&format!("/orders/{}/invoice", order_id))
        .await;
    response.assert_status_ok();
    assert!(response.as_bytes().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_empty_cart_checkout_fails() {
    let (server, state) = create_test_server().await;
    let id = insert(&state, "Laptop", "699.99", 20).await;

    let response = server.post("/checkout").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "EMPTY_CART");

    let product = state.catalog.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.stock, 20);

    let response = server.get("/orders").await;
    let body: Value = response.json();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_product_leaves_cart_unchanged() {
    let (server, _) = create_test_server().await;

    let response = server.post("/cart/items/999").await;
    response.assert_status_ok();
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body: Value = response.json();
    assert!(body["data"]["outcome"].is_null());
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_persists_across_requests() {
    let (server, state) = create_test_server().await;
    let lamp = insert(&state, "Lamp", "12.50", 5).await;
    let desk = insert(&state, "Desk", "120.00", 2).await;

    let response = server.post(&format!("/cart/items/{}", lamp)).await;
    let cookie = session_cookie(&response);

    server
        .post(&format!("/cart/items/{}", desk))
        .add_header(COOKIE, cookie.clone())
        .await
        .assert_status_ok();

    let response = server.get("/cart").add_header(COOKIE, cookie.clone()).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["lines"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total"], "132.50");

    let response = server
        .delete(&format!("/cart/items/{}", lamp))
        .add_header(COOKIE, cookie.clone())
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], "120.00");

    let response = server.delete("/cart").add_header(COOKIE, cookie.clone()).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["item_count"], 0);

    // 另一个会话看不到这个购物车
    let response = server.get("/cart").await;
    let body: Value = response.json();
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_add_is_capped_at_stock() {
    let (server, state) = create_test_server().await;
    let id = insert(&state, "Rare", "5.00", 2).await;

    let response = server.post(&format!("/cart/items/{}", id)).await;
    let cookie = session_cookie(&response);
    let mut last = Value::Null;
    for _ in 0..3 {
        let response = server
            .post(&format!("/cart/items/{}", id))
            .add_header(COOKIE, cookie.clone())
            .await;
        response.assert_status_ok();
        last = response.json();
    }
    assert_eq!(last["data"]["outcome"], "at_stock_limit");

    let response = server.get("/cart").add_header(COOKIE, cookie).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["lines"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_reject_policy_keeps_stock_and_cart() {
    let mut config = Config::default();
    config.shop.stock_policy = StockPolicy::Reject;
    config.shop.cap_cart_at_stock = false;
    let state = create_state(config).await;
    let id = insert(&state, "Scarce", "10.00", 1).await;

    let mut session = SessionContext::new();
    state.cart.add(&mut session, id).await.unwrap();
    state.cart.add(&mut session, id).await.unwrap();

    let result = state.orders.place_order(&mut session).await;
    match result {
        Err(CoreError::InsufficientStock {
            product_id,
            requested,
            available,
        }) => {
            assert_eq!(product_id, id);
            assert_eq!(requested, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    let product = state.catalog.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.stock, 1);
    assert_eq!(session.cart().get(id).unwrap().quantity, 2);
    assert!(state.orders.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_allow_negative_policy_oversells() {
    let mut config = Config::default();
    config.shop.cap_cart_at_stock = false;
    let state = create_state(config).await;
    let id = insert(&state, "Popular", "3.00", 1).await;

    let mut session = SessionContext::new();
    for _ in 0..3 {
        state.cart.add(&mut session, id).await.unwrap();
    }

    let order = state.orders.place_order(&mut session).await.unwrap();
    assert_eq!(order.total, decimal("9.00"));

    let product = state.catalog.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.stock, -2);
}

#[tokio::test]
async fn test_deleted_product_blocks_checkout() {
    let state = create_state(Config::default()).await;
    let keep = insert(&state, "Keep", "1.00", 10).await;
    let gone = insert(&state, "Gone", "2.00", 10).await;

    let mut session = SessionContext::new();
    state.cart.add(&mut session, keep).await.unwrap();
    state.cart.add(&mut session, gone).await.unwrap();
    state.catalog.delete_product(gone).await.unwrap();

    let result = state.orders.place_order(&mut session).await;
    assert!(matches!(result, Err(CoreError::NotFound(_))));

    // 事务回滚，第一行的扣减也不生效
    let product = state.catalog.get_product(keep).await.unwrap().unwrap();
    assert_eq!(product.stock, 10);
    assert_eq!(session.cart().len(), 2);
}

#[tokio::test]
async fn test_order_round_trip_through_invoice() {
    let state = create_state(Config::default()).await;
    let a = insert(&state, "Keyboard", "49.90", 10).await;
    let b = insert(&state, "Mouse", "19.95", 10).await;

    let mut session = SessionContext::new();
    state.cart.add(&mut session, a).await.unwrap();
    state.cart.add(&mut session, b).await.unwrap();
    state.cart.add(&mut session, b).await.unwrap();
    let expected = state.cart.total(&session);
    assert_eq!(expected, decimal("89.80"));

    let placed = state.orders.place_order(&mut session).await.unwrap();
    assert!(session.cart().is_empty());
    assert!(session.is_dirty());
    assert_eq!(placed.total, expected);
    assert_eq!(placed.lines_total(), expected);

    let stored = state.orders.get_order(placed.id).await.unwrap();
    assert_eq!(stored.total, expected);
    assert_eq!(stored.lines, placed.lines);

    let invoice = state.invoices.render_order(&stored).unwrap();
    assert_eq!(invoice.total, stored.total);
    assert_eq!(invoice.filename, format!("invoice_{}.pdf", stored.id));
}

#[tokio::test]
async fn test_order_ids_increase() {
    let state = create_state(Config::default()).await;
    let id = insert(&state, "Pen", "1.20", 100).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let mut session = SessionContext::new();
        state.cart.add(&mut session, id).await.unwrap();
        ids.push(state.orders.place_order(&mut session).await.unwrap().id);
    }

    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    let listed: Vec<i64> = state
        .orders
        .list_orders()
        .await
        .unwrap()
        .into_iter()
        .map(|order| order.id)
        .collect();
    assert_eq!(listed, ids.into_iter().rev().collect::<Vec<_>>());

    let product = state.catalog.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.stock, 97);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let (server, _) = create_test_server().await;

    server.get("/orders/42").await.assert_status(StatusCode::NOT_FOUND);
    server
        .get("/orders/42/invoice")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

async fn session_rows(state: &AppState) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&state.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_zero_total_cart_cannot_checkout() {
    let (server, state) = create_test_server().await;
    let id = insert(&state, "Sticker", "0.00", 5).await;

    let response = server.post(&format!("/cart/items/{}", id)).await;
    let cookie = session_cookie(&response);
    let body: Value = response.json();
    assert_eq!(body["data"]["item_count"], 1);
    assert_eq!(body["data"]["total"], "0.00");

    let response = server
        .post("/checkout")
        .add_header(COOKIE, cookie.clone())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "EMPTY_CART");

    let product = state.catalog.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.stock, 5);
    assert!(state.orders.list_orders().await.unwrap().is_empty());

    // 购物车保持原样
    let response = server.get("/cart").add_header(COOKIE, cookie).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["lines"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_no_op_cart_changes_do_not_create_sessions() {
    let (server, state) = create_test_server().await;

    for _ in 0..3 {
        let response = server.delete("/cart/items/77").await;
        response.assert_status_ok();
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    let response = server.delete("/cart").await;
    response.assert_status_ok();
    assert!(response.headers().get(SET_COOKIE).is_none());

    assert_eq!(session_rows(&state).await, 0);
}

#[tokio::test]
async fn test_unreadable_session_is_replaced() {
    let (server, state) = create_test_server().await;
    let id = insert(&state, "Lamp", "12.50", 5).await;

    let stale = uuid::Uuid::new_v4();
    sqlx::query("INSERT INTO sessions (id, cart, updated_at) VALUES (?, ?, ?)")
        .bind(stale.to_string())
        .bind(r#"{"lines":{"1":{"old":1}}}"#)
        .bind(chrono::Utc::now())
        .execute(&state.pool)
        .await
        .unwrap();
    let stale_cookie = HeaderValue::from_str(&format!("storefront_sid={}", stale)).unwrap();

    let response = server
        .get("/cart")
        .add_header(COOKIE, stale_cookie.clone())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());

    let response = server
        .post(&format!("/cart/items/{}", id))
        .add_header(COOKIE, stale_cookie)
        .await;
    response.assert_status_ok();
    let cookie = session_cookie(&response);
    assert_ne!(
        cookie.to_str().unwrap(),
        format!("storefront_sid={}", stale)
    );

    let response = server.get("/cart").add_header(COOKIE, cookie).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["lines"][0]["quantity"], 1);
}
