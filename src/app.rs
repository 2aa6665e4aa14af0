//! 应用装配 - 编排层
//!
//! 创建模型客户端、图片探测器和解题网关，然后启动 HTTP 服务

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::{router, AppState};
use crate::clients::{HttpAssetProbe, OpenAiChatModel};
use crate::config::Config;
use crate::services::{ImageProber, TutoringGateway};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    gateway: Arc<TutoringGateway>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 OPENAI_API_KEY，模型调用将会失败");
        }

        let model = Arc::new(OpenAiChatModel::new(&config));
        let probe = Arc::new(
            HttpAssetProbe::new(Duration::from_secs(config.probe.timeout_secs))
                .context("无法创建图片探测客户端")?,
        );
        let prober = ImageProber::new(probe, config.exam_assets_url(), &config.probe);
        let gateway = Arc::new(TutoringGateway::new(model, prober, &config));

        Ok(Self { config, gateway })
    }

    /// 运行 HTTP 服务，直到进程退出
    pub async fn run(self) -> Result<()> {
        let state = AppState::new(self.gateway.clone(), self.config.llm_model_name.clone());
        let app = router(state, &self.config);

        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("无法监听 {}", self.config.bind_addr))?;

        logging::log_startup(
            &self.config.bind_addr,
            &self.config.llm_model_name,
            &self.config.exam_assets_url(),
        );
        info!(
            "📁 试卷目录: {} → {}",
            self.config.exam_assets_dir, self.config.exam_assets_path
        );

        axum::serve(listener, app).await?;
        Ok(())
    }
}
