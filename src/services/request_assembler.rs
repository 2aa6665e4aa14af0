//! 请求组装 - 业务能力层
//!
//! 顺序固定：问题文字 → 按页号排列的题目图片 → 答案页（如有）

use tracing::debug;

use crate::models::exam::{answer_key_url, page_image_url};
use crate::models::ContentPart;
use crate::services::ImageProber;

/// 请求组装器
///
/// 不做缓存，同样的参数调用两次就探测两次
pub struct RequestAssembler<'a> {
    prober: &'a ImageProber,
}

impl<'a> RequestAssembler<'a> {
    pub fn new(prober: &'a ImageProber) -> Self {
        Self { prober }
    }

    /// 问题文字 + 探测到的全部页面
    pub async fn assemble(&self, prompt_text: &str, exam_id: &str) -> Vec<ContentPart> {
        let mut parts = vec![ContentPart::text(prompt_text)];
        parts.extend(self.prober.probe_images(exam_id).await);
        debug!("[试卷 {}] 组装完成，共 {} 个片段", exam_id, parts.len());
        parts
    }

    /// 问题文字 + 指定页 + 答案页
    ///
    /// 指定页不存在时返回 `Err(url)`；答案页不存在时直接省略
    pub async fn assemble_with_answer_key(
        &self,
        prompt_text: &str,
        exam_id: &str,
        page: usize,
    ) -> Result<Vec<ContentPart>, String> {
        let base = self.prober.assets_url();
        let page_url = page_image_url(base, exam_id, page);
        if !self.prober.probe().exists(&page_url).await {
            return Err(page_url);
        }

        let mut parts = vec![ContentPart::text(prompt_text), ContentPart::image(page_url)];

        let key_url = answer_key_url(base, exam_id);
        if self.prober.probe().exists(&key_url).await {
            parts.push(ContentPart::image(key_url));
        }
        Ok(parts)
    }
}
