//! 试卷资源探测客户端
//!
//! 只发 HEAD 请求判断 URL 是否存在，不下载内容

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// 资源存在性检查
#[async_trait]
pub trait AssetProbe: Send + Sync {
    /// 存在返回 true；网络错误与非 2xx 状态都视为不存在
    async fn exists(&self, url: &str) -> bool;
}

/// 基于 reqwest 的 HEAD 探测
pub struct HttpAssetProbe {
    client: reqwest::Client,
}

impl HttpAssetProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetProbe for HttpAssetProbe {
    async fn exists(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(res) if res.status().is_success() => {
                debug!("✅ Found: {}", url);
                true
            }
            Ok(res) => {
                warn!("❌ Not found: {} ({})", url, res.status());
                false
            }
            Err(e) => {
                warn!("⚠️ 检查失败: {} - {}", url, e);
                false
            }
        }
    }
}
