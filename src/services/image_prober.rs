//! 试卷图片探测服务 - 业务能力层
//!
//! 只负责"这张试卷有哪几页"，不关心请求如何组装

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::AssetProbe;
use crate::config::ProbeConfig;
use crate::models::exam::page_image_url;
use crate::models::ContentPart;

/// 试卷图片探测
///
/// 从第 1 页开始按页号探测：
/// - 存在则加入结果并清零连续缺页计数
/// - 不存在（含网络错误）则计数加一，不重试
/// - 第 1 页缺失同样只计一次缺页，后面的页仍会被探测
/// - 连续缺页达到上限或探测次数用完即停止
pub struct ImageProber {
    probe: Arc<dyn AssetProbe>,
    assets_url: String,
    max_attempts: usize,
    max_consecutive_misses: usize,
    concurrency: usize,
}

impl ImageProber {
    /// `assets_url` 为图片 URL 前缀，例如 `http://host/exam/math`
    pub fn new(probe: Arc<dyn AssetProbe>, assets_url: impl Into<String>, config: &ProbeConfig) -> Self {
        Self {
            probe,
            assets_url: assets_url.into(),
            max_attempts: config.max_attempts,
            max_consecutive_misses: config.max_consecutive_misses.max(1),
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn assets_url(&self) -> &str {
        &self.assets_url
    }

    pub fn probe(&self) -> &Arc<dyn AssetProbe> {
        &self.probe
    }

    /// 探测试卷的所有页面图片
    ///
    /// # 返回
    /// 按页号升序的图片引用，没有页面时为空
    pub async fn probe_images(&self, exam_id: &str) -> Vec<ContentPart> {
        let probe = &self.probe;
        let base = self.assets_url.as_str();

        // buffered 保持页号顺序，连续缺页按逻辑页序计算，与完成先后无关
        let mut checks = stream::iter(1..=self.max_attempts)
            .map(|page| async move {
                let url = page_image_url(base, exam_id, page);
                let exists = probe.exists(&url).await;
                (page, url, exists)
            })
            .buffered(self.concurrency);

        let mut images = Vec::new();
        let mut misses = 0;

        while let Some((page, url, exists)) = checks.next().await {
            if exists {
                images.push(ContentPart::image(url));
                misses = 0;
                continue;
            }

            misses += 1;
            debug!("[试卷 {}] 第 {} 页缺失 (连续 {} 页)", exam_id, page, misses);
            if misses >= self.max_consecutive_misses {
                info!("[试卷 {}] 🛑 连续 {} 页缺失，停止探测", exam_id, misses);
                break;
            }
        }

        info!("[试卷 {}] 共找到 {} 页图片", exam_id, images.len());
        images
    }
}
