//! `/api/analyze` 的调用方
//!
//! 浏览器端流程通过它把组装好的请求发给网关

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::{AppError, AppResult, ErrorBody};
use crate::models::{AnalyzeRequest, TutorResponse};

/// 解题后端
///
/// 远程实现是 [`GatewayClient`]，进程内实现是 `TutoringGateway`
#[async_trait]
pub trait AnalyzeBackend: Send + Sync {
    async fn analyze(&self, request: AnalyzeRequest) -> AppResult<TutorResponse>;
}

/// 通过 HTTP 调用网关
pub struct GatewayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GatewayClient {
    /// `base_url` 为站点根地址，例如 `http://127.0.0.1:3000`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/analyze", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl AnalyzeBackend for GatewayClient {
    async fn analyze(&self, request: AnalyzeRequest) -> AppResult<TutorResponse> {
        debug!("POST {}", self.endpoint);

        let res = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = res.status();

        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            error!("网关返回错误 {}: {}", status, text);
            // 尽量还原服务端的错误分类
            let body: Option<ErrorBody> = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .map(|v| ErrorBody {
                    error: v["error"].as_str().unwrap_or_default().to_string(),
                    detail: v["detail"].as_str().map(str::to_string),
                });
            let message = body
                .map(|b| b.detail.unwrap_or(b.error))
                .unwrap_or_else(|| format!("Server error: {}", text));
            return Err(match status.as_u16() {
                400 => AppError::validation(message),
                404 => AppError::asset_not_found(message),
                405 => AppError::MethodNotAllowed,
                _ => AppError::upstream(message),
            });
        }

        Ok(res.json::<TutorResponse>().await?)
    }
}
