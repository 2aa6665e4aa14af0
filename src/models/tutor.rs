use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 一道题的英文讲解及其中文翻译
///
/// 线上格式为 `{response, translated}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorResponse {
    #[serde(rename = "response", default)]
    pub english_text: String,
    #[serde(rename = "translated", default)]
    pub chinese_text: String,
}

/// 渲染后写到页面上的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPayload {
    /// 清洗后的英文答案（HTML）
    pub answer_html: String,
    /// 中文翻译原文（为空时已替换成提示语）
    pub translated: String,
    /// 带前缀的中文翻译，直接显示在答案下方
    pub translation_text: String,
}

impl DisplayPayload {
    /// 只有一行提示语（校验失败、请求出错）
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            answer_html: message.into(),
            translated: String::new(),
            translation_text: String::new(),
        }
    }
}

/// 历史记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub question: String,
    pub answer_html: String,
    pub asked_at: DateTime<Local>,
}
