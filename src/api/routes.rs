//! 路由与请求处理器
//!
//! 错误只在这里转换为 JSON 响应

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::clients::AnalyzeBackend;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{AnalyzeRequest, TutorResponse};
use crate::utils::truncate_text;

/// 处理器共享状态
pub struct AppState {
    pub backend: Arc<dyn AnalyzeBackend>,
    pub model_name: String,
}

impl AppState {
    pub fn new(backend: Arc<dyn AnalyzeBackend>, model_name: impl Into<String>) -> Self {
        Self {
            backend,
            model_name: model_name.into(),
        }
    }
}

type AppStateArc = Arc<AppState>;

/// 组装完整路由
///
/// # 参数
/// - `state`: 处理器共享状态
/// - `config`: 提供试卷图片的目录与挂载路径
pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .merge(analyze_routes())
        .merge(health_routes())
        .nest_service(
            &config.exam_assets_path,
            ServeDir::new(&config.exam_assets_dir),
        )
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

fn analyze_routes() -> Router<AppStateArc> {
    Router::new().route(
        "/api/analyze",
        post(analyze).fallback(method_not_allowed),
    )
}

fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health))
}

/// 请求体手动解析，格式错误统一返回 400
async fn analyze(
    State(state): State<AppStateArc>,
    body: Bytes,
) -> AppResult<Json<TutorResponse>> {
    let request: AnalyzeRequest = serde_json::from_slice(&body)?;
    info!(
        "📨 收到请求 mode={:?} {}",
        request.resolved_mode(),
        truncate_text(
            request
                .prompt
                .as_deref()
                .or(request.question.as_deref())
                .unwrap_or_default(),
            40
        )
    );

    let response = state.backend.analyze(request).await?;
    Ok(Json(response))
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn health(State(state): State<AppStateArc>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "model": state.model_name }))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("❌ 请求处理失败: {}", self);
        } else {
            warn!("⚠️ 请求被拒绝 ({}): {}", status.as_u16(), self);
        }
        (status, Json(self.to_body())).into_response()
    }
}
