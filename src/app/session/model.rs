//! 会话上下文

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::app::cart::model::Cart;

/// 单个会话的可变状态
///
/// 所有购物车操作都通过它进行；任何修改都会把会话标记为脏，
/// 请求结束时由会话中间件写回存储。
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: Uuid,
    cart: Cart,
    dirty: bool,
    is_new: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            cart: Cart::new(),
            dirty: false,
            is_new: true,
        }
    }

    pub fn restore(id: Uuid, cart: Cart) -> Self {
        Self {
            id,
            cart,
            dirty: false,
            is_new: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// 取得可变购物车并标记会话为脏
    pub fn cart_mut(&mut self) -> &mut Cart {
        self.dirty = true;
        &mut self.cart
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
        self.is_new = false;
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 请求扩展中共享的会话句柄
#[derive(Clone)]
pub struct SessionHandle(Arc<Mutex<SessionContext>>);

impl SessionHandle {
    pub fn new(context: SessionContext) -> Self {
        Self(Arc::new(Mutex::new(context)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionContext> {
        self.0.lock().await
    }
}
