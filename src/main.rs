use anyhow::Result;
use exam_tutor::utils::logging;
use exam_tutor::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::load("config.toml")?;

    // 初始化并运行应用
    App::initialize(config).await?.run().await
}
