//! 会话中间件：请求开始时读取会话，请求结束时按需写回

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::{model::SessionHandle, store::SessionStore};

pub async fn session_middleware(
    State(sessions): State<SessionStore>,
    mut req: Request,
    next: Next,
) -> Response {
    let session_id = sessions.session_id_from_headers(req.headers());
    let context = match sessions.load(session_id).await {
        Ok(context) => context,
        Err(e) => return e.into_response(),
    };

    let handle = SessionHandle::new(context);
    req.extensions_mut().insert(handle.clone());

    let mut response = next.run(req).await;

    let mut context = handle.lock().await;
    if !context.is_dirty() {
        return response;
    }

    let issue_cookie = context.is_new();
    if let Err(e) = sessions.save(&mut context).await {
        return e.into_response();
    }

    if issue_cookie {
        match HeaderValue::from_str(&sessions.set_cookie_value(context.id())) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("invalid session cookie: {}", e),
        }
    }

    response
}
