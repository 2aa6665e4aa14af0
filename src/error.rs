//! 错误类型
//!
//! 所有错误只在最外层请求处理器转换为 JSON 响应，内部一律用 `?` 向上传播

use serde::Serialize;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求缺少必填字段
    #[error("{message}")]
    Validation { message: String },

    /// 非 POST 请求
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// 引用的试卷图片不存在
    #[error("Exam asset not found: {url}")]
    AssetNotFound { url: String },

    /// 模型调用失败（网络、额度、返回格式等）
    #[error("{message}")]
    Upstream { message: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 语音合成 / 识别错误
    #[error("语音错误: {0}")]
    Speech(String),
}

/// 返回给前端的错误体
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AppError {
    /// 创建校验错误
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
        }
    }

    /// 创建上游模型错误
    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::Upstream {
            message: message.into(),
        }
    }

    /// 创建资源不存在错误
    pub fn asset_not_found(url: impl Into<String>) -> Self {
        AppError::AssetNotFound { url: url.into() }
    }

    /// HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 400,
            AppError::MethodNotAllowed => 405,
            AppError::AssetNotFound { .. } => 404,
            AppError::Upstream { .. } | AppError::Config(_) | AppError::Speech(_) => 500,
        }
    }

    /// 转换为响应体；上游错误只带消息，不带任何调用栈
    pub fn to_body(&self) -> ErrorBody {
        match self {
            AppError::Upstream { message } => ErrorBody {
                error: "Internal server error".to_string(),
                detail: Some(if message.is_empty() {
                    "Unknown GPT error".to_string()
                } else {
                    message.clone()
                }),
            },
            AppError::Config(_) | AppError::Speech(_) => ErrorBody {
                error: "Internal server error".to_string(),
                detail: Some(self.to_string()),
            },
            other => ErrorBody {
                error: other.to_string(),
                detail: None,
            },
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::upstream(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::validation(format!("Invalid JSON body: {}", err))
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
