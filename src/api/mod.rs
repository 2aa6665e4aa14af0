//! HTTP 接口
//!
//! - `POST /api/analyze`: 解题 + 翻译
//! - `GET /health`: 存活检查
//! - 试卷图片静态目录

pub mod routes;

pub use routes::{router, AppState};
