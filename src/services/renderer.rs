//! 答案渲染 - 业务能力层
//!
//! 清洗英文答案中的 Markdown / LaTeX 残留，生成页面显示内容并写入历史记录。
//! 中文翻译不做清洗。

use chrono::Local;
use regex::Regex;
use std::sync::LazyLock;

use crate::models::{DisplayPayload, HistoryEntry, TutorResponse};

/// 翻译行前缀
pub const TRANSLATION_LABEL: &str = "🇨🇳 中文翻譯：";

const MISSING_ENGLISH: &str = "❌ 無法獲取英文回答。";
const MISSING_TRANSLATION: &str = "❌ 無法翻譯為中文。";

static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Answer:\s*)([^\n]+)").expect("valid regex"));

/// 转义 HTML 特殊字符
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// 清洗模型返回的英文答案
///
/// - 去掉 `\(` `\)` 行内公式定界符
/// - `\times` → `×`，`\div` → `÷`
/// - 去掉 `**` 与 `#` 标记以及剩余的反斜杠
/// - `Answer: ...` 整行加粗
pub fn clean_latex_markdown(text: &str) -> String {
    let cleaned = escape_html(text)
        .replace(r"\(", "")
        .replace(r"\)", "")
        .replace(r"\times", "×")
        .replace(r"\div", "÷")
        .replace("**", "")
        .replace('#', "")
        .replace('\\', "");

    ANSWER_LINE
        .replace_all(cleaned.trim(), "<strong>$1$2</strong>")
        .into_owned()
}

/// 生成页面显示内容
pub fn render(response: &TutorResponse) -> DisplayPayload {
    let english = if response.english_text.is_empty() {
        MISSING_ENGLISH
    } else {
        response.english_text.as_str()
    };
    let translated = if response.chinese_text.is_empty() {
        MISSING_TRANSLATION.to_string()
    } else {
        response.chinese_text.clone()
    };

    DisplayPayload {
        answer_html: clean_latex_markdown(english),
        translation_text: format!("{}{}", TRANSLATION_LABEL, translated),
        translated,
    }
}

/// 问答历史
///
/// 只保存在内存中，新记录插在最前面，允许重复问题
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次问答
    pub fn record(&mut self, question: &str, payload: &DisplayPayload) {
        let answer_html = format!(
            "{}<br><em>{}</em>{}",
            payload.answer_html,
            TRANSLATION_LABEL,
            escape_html(&payload.translated)
        );
        self.entries.insert(
            0,
            HistoryEntry {
                question: question.to_string(),
                answer_html,
                asked_at: Local::now(),
            },
        );
    }

    /// 最新的在前
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 渲染成列表项
    pub fn to_html(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "<li><strong>問：</strong>{}<br/><strong>答：</strong>{}</li>",
                    escape_html(&e.question),
                    e.answer_html
                )
            })
            .collect()
    }
}
