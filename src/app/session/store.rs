//! 会话存储
//!
//! 购物车以 JSON 形式整体存放在 `sessions` 表中，对存储来说是不透明的数据块。

use axum::http::{header::COOKIE, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::model::SessionContext;
use crate::app::cart::model::Cart;
use crate::core::error::CoreError;

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    cookie_name: Arc<str>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(pool: SqlitePool, cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            pool,
            cookie_name: Arc::from(cookie_name.into()),
            ttl,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn expires_before(&self) -> DateTime<Utc> {
        Utc::now() - self.ttl
    }

    /// 读取会话
    ///
    /// 没有 ID、找不到、已过期或购物车数据无法解析时都开启新会话，
    /// 下一次写回时会签发新的 Cookie。
    pub async fn load(&self, id: Option<Uuid>) -> Result<SessionContext, CoreError> {
        let Some(id) = id else {
            return Ok(SessionContext::new());
        };

        let blob: Option<String> =
            sqlx::query_scalar("SELECT cart FROM sessions WHERE id = ? AND updated_at >= ?")
                .bind(id.to_string())
                .bind(self.expires_before())
                .fetch_optional(&self.pool)
                .await?;

        let Some(blob) = blob else {
            debug!(session_id = %id, "unknown or expired session, starting a new one");
            return Ok(SessionContext::new());
        };

        match serde_json::from_str::<Cart>(&blob) {
            Ok(cart) => Ok(SessionContext::restore(id, cart)),
            Err(e) => {
                warn!(session_id = %id, error = %e, "unreadable session cart, starting a new one");
                Ok(SessionContext::new())
            }
        }
    }

    /// 删除闲置超过有效期的会话，返回删除的行数
    pub async fn prune_expired(&self) -> Result<u64, CoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE updated_at < ?")
            .bind(self.expires_before())
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!(removed, "expired sessions pruned");
        }
        Ok(removed)
    }

    pub async fn save(&self, context: &mut SessionContext) -> Result<(), CoreError> {
        let blob = serde_json::to_string(context.cart())?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, cart, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET cart = excluded.cart, updated_at = excluded.updated_at
            "#,
        )
        .bind(context.id().to_string())
        .bind(blob)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        context.mark_saved();
        debug!(session_id = %context.id(), "session saved");
        Ok(())
    }

    /// 从 Cookie 头中取出会话 ID，格式不对的值视为没有
    pub fn session_id_from_headers(&self, headers: &HeaderMap) -> Option<Uuid> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name())
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
    }

    pub fn set_cookie_value(&self, id: Uuid) -> String {
        format!(
            "{}={}; HttpOnly; Path=/; SameSite=Lax",
            self.cookie_name(),
            id
        )
    }
}
