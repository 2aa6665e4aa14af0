//! 答题会话 - 流程层
//!
//! 核心职责：持有页面状态，定义"问一道题"的完整流程
//!
//! 流程顺序：
//! 1. 校验（已选试卷 + 问题非空）
//! 2. 探测试卷图片 → 组装请求
//! 3. 调用解题后端
//! 4. 渲染 → 写入历史

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::clients::AnalyzeBackend;
use crate::error::AppResult;
use crate::models::{lookup_official_answer, AnalyzeRequest, DisplayPayload, ExamReference};
use crate::services::{render, History, ImageProber, RequestAssembler};
use crate::speech::{HoldToTalk, Speaker};
use crate::utils::truncate_text;

/// 未选试卷或问题为空时的提示
pub const MISSING_INPUT_NOTICE: &str = "⚠️ 請選擇試卷並輸入問題";
/// 请求失败时的提示
pub const FAILURE_NOTICE: &str = "❌ 發生錯誤，請稍後重試。";

/// 答题会话
///
/// - 当前试卷、历史记录、最近一次答案都在这里，不读任何全局状态
/// - 只依赖业务能力（services）和外部接口（clients / speech）
pub struct TutorSession {
    current_exam: Option<ExamReference>,
    history: History,
    last_display: Option<DisplayPayload>,
    prober: ImageProber,
    backend: Arc<dyn AnalyzeBackend>,
    speaker: Option<Speaker>,
    microphone: Option<HoldToTalk>,
}

impl TutorSession {
    pub fn new(prober: ImageProber, backend: Arc<dyn AnalyzeBackend>) -> Self {
        Self {
            current_exam: None,
            history: History::new(),
            last_display: None,
            prober,
            backend,
            speaker: None,
            microphone: None,
        }
    }

    /// 启用朗读
    pub fn with_speaker(mut self, speaker: Speaker) -> Self {
        self.speaker = Some(speaker);
        self
    }

    /// 启用按住说话
    pub fn with_microphone(mut self, microphone: HoldToTalk) -> Self {
        self.microphone = Some(microphone);
        self
    }

    /// 选择试卷，覆盖之前的选择
    ///
    /// # 返回
    /// 原卷 PDF 的 URL
    pub fn set_exam(&mut self, exam_id: &str) -> String {
        let exam = ExamReference::new(exam_id.trim());
        let pdf_url = exam.pdf_url(self.prober.assets_url());
        info!("📄 选择试卷 {}", exam);
        self.current_exam = Some(exam);
        pdf_url
    }

    pub fn current_exam(&self) -> Option<&ExamReference> {
        self.current_exam.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("🧹 已清空历史记录");
    }

    /// 最近一次显示的内容
    pub fn last_display(&self) -> Option<&DisplayPayload> {
        self.last_display.as_ref()
    }

    /// 提交问题
    ///
    /// 任何失败都只体现在返回的显示内容里，不向外抛错
    ///
    /// # 参数
    /// - `question`: 输入框里的问题
    ///
    /// # 返回
    /// 写到页面上的内容
    pub async fn submit_question(&mut self, question: &str) -> DisplayPayload {
        let question = question.trim();
        let selected = self.current_exam.as_ref().map(|e| e.exam_id.clone());
        let exam_id = match selected {
            Some(exam_id) if !question.is_empty() => exam_id,
            _ => {
                warn!("⚠️ 未选择试卷或问题为空");
                return self.show(DisplayPayload::notice(MISSING_INPUT_NOTICE));
            }
        };

        info!("[试卷 {}] ❓ 提交问题: {}", exam_id, truncate_text(question, 40));

        let payload = match self.ask(&exam_id, question).await {
            Ok(payload) => payload,
            Err(e) => {
                error!("[试卷 {}] ❌ 请求失败: {}", exam_id, e);
                return self.show(DisplayPayload::notice(FAILURE_NOTICE));
            }
        };

        self.history.record(question, &payload);
        info!("[试卷 {}] ✅ 已回答，历史记录 {} 条", exam_id, self.history.len());
        self.show(payload)
    }

    /// 朗读最近一次答案（英文 + 中文）
    pub fn speak_answer(&self) {
        let (Some(speaker), Some(display)) = (&self.speaker, &self.last_display) else {
            return;
        };
        let text = if display.translation_text.is_empty() {
            display.answer_html.clone()
        } else {
            format!("{}\n{}", display.answer_html, display.translated)
        };
        speaker.speak(&strip_tags(&text));
    }

    pub fn stop_speaking(&self) {
        if let Some(speaker) = &self.speaker {
            speaker.stop();
        }
    }

    /// 按住说话，松开后自动提交识别到的问题
    ///
    /// 没有识别到内容时返回 None，不提交
    pub async fn listen_and_submit(&mut self, held: watch::Receiver<bool>) -> Option<DisplayPayload> {
        let transcript = self.microphone.as_ref()?.listen(held).await?;
        Some(self.submit_question(&transcript).await)
    }

    async fn ask(&mut self, exam_id: &str, question: &str) -> AppResult<DisplayPayload> {
        let request = match lookup_official_answer(exam_id, question) {
            Some(answer) => {
                info!("[试卷 {}] 📘 命中官方答案: {}", exam_id, answer);
                AnalyzeRequest::official_answer(question, answer)
            }
            None => {
                let parts = RequestAssembler::new(&self.prober)
                    .assemble(question, exam_id)
                    .await;
                // 第一个片段是文字，其余都是图片
                let pages = parts.len().saturating_sub(1);
                if let Some(exam) = self.current_exam.as_mut() {
                    exam.page_count = Some(pages);
                }
                info!("[试卷 {}] 🖼️ 找到 {} 页", exam_id, pages);
                AnalyzeRequest::messages(question, parts)
            }
        };

        let response = self.backend.analyze(request).await?;
        Ok(render(&response))
    }

    fn show(&mut self, payload: DisplayPayload) -> DisplayPayload {
        self.last_display = Some(payload.clone());
        payload
    }
}

/// 去掉 HTML 标签并还原转义字符，得到可朗读的纯文本
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
