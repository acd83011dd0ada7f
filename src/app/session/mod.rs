//! 会话：会话上下文、存储与中间件

pub mod middleware;
pub mod model;
pub mod store;
