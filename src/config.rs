//! 程序配置
//!
//! 默认值 → TOML 文件（可选）→ 环境变量，后者覆盖前者

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// 图片探测配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// 最多探测的页数
    pub max_attempts: usize,
    /// 连续缺页达到该值即视为试卷结束
    pub max_consecutive_misses: usize,
    /// 同时在途的探测请求数（1 表示严格顺序）
    pub concurrency: usize,
    /// 单次 HEAD 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_consecutive_misses: 3,
            concurrency: 1,
            timeout_secs: 5,
        }
    }
}

/// 语音配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// 单段朗读的最大字符数
    pub max_chunk_chars: usize,
    /// 段与段之间的停顿（毫秒）
    pub inter_chunk_pause_ms: u64,
    /// 英文轮结束到中文轮开始的停顿（毫秒）
    pub inter_pass_pause_ms: u64,
    /// 语音识别语言
    pub recognition_language: String,
    /// 按住说话时识别引擎自行结束后的最大重启次数
    pub max_restarts: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 180,
            inter_chunk_pause_ms: 250,
            inter_pass_pause_ms: 500,
            recognition_language: "zh-CN".to_string(),
            max_restarts: 3,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 监听地址
    pub bind_addr: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 试卷资源 ---
    /// 对外可访问的站点根地址，服务端用它拼出图片的绝对 URL
    pub public_base_url: String,
    /// 试卷图片所在的本地目录
    pub exam_assets_dir: String,
    /// 试卷图片对应的 URL 路径
    pub exam_assets_path: String,
    // --- 辅导对象 ---
    pub grade_level: String,
    pub region: String,
    pub student_age: String,
    pub probe: ProbeConfig,
    pub speech: SpeechConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            public_base_url: "http://127.0.0.1:3000".to_string(),
            exam_assets_dir: "public/exam/math".to_string(),
            exam_assets_path: "/exam/math".to_string(),
            grade_level: "Form 2".to_string(),
            region: "Hong Kong".to_string(),
            student_age: "13–14".to_string(),
            probe: ProbeConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl Config {
    /// 只从环境变量读取（未设置的字段使用默认值）
    ///
    /// `EXAM_ASSETS_PATH` 不可用时退回默认路径
    pub fn from_env() -> Self {
        let config = Self::default().with_env_overrides();
        if let Err(e) = config.validate() {
            tracing::warn!("⚠️ {}，使用默认路径", e);
            return Self {
                exam_assets_path: Self::default().exam_assets_path,
                ..config
            };
        }
        config
    }

    /// 从 TOML 文件读取，文件不存在时退回默认值，最后应用环境变量
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let base = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("无法解析配置文件: {}", path.display()))?
        } else {
            Self::default()
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 检查挂载路径：必须以 `/` 开头且不能是根路径
    pub fn validate(&self) -> Result<()> {
        let path = self.exam_assets_path.as_str();
        ensure!(
            path.starts_with('/') && !path.trim_matches('/').is_empty(),
            "exam_assets_path 无效: {:?}（需要形如 /exam/math 的非根路径）",
            path
        );
        Ok(())
    }

    fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(default.bind_addr),
            llm_api_key: std::env::var("OPENAI_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            public_base_url: std::env::var("PUBLIC_BASE_URL").unwrap_or(default.public_base_url),
            exam_assets_dir: std::env::var("EXAM_ASSETS_DIR").unwrap_or(default.exam_assets_dir),
            exam_assets_path: std::env::var("EXAM_ASSETS_PATH").unwrap_or(default.exam_assets_path),
            grade_level: std::env::var("TUTOR_GRADE_LEVEL").unwrap_or(default.grade_level),
            region: std::env::var("TUTOR_REGION").unwrap_or(default.region),
            student_age: std::env::var("TUTOR_STUDENT_AGE").unwrap_or(default.student_age),
            probe: ProbeConfig {
                max_attempts: env_parse("PROBE_MAX_ATTEMPTS").unwrap_or(default.probe.max_attempts),
                max_consecutive_misses: env_parse("PROBE_MAX_CONSECUTIVE_MISSES")
                    .unwrap_or(default.probe.max_consecutive_misses),
                concurrency: env_parse("PROBE_CONCURRENCY").unwrap_or(default.probe.concurrency),
                timeout_secs: env_parse("PROBE_TIMEOUT_SECS").unwrap_or(default.probe.timeout_secs),
            },
            speech: default.speech,
        }
    }

    /// 服务端拼接图片 URL 用的前缀，例如 `http://host/exam/math`
    pub fn exam_assets_url(&self) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.exam_assets_path.trim_matches('/')
        )
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
