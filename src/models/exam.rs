//! 试卷引用与资源 URL 约定
//!
//! - 题目页：`{base}/{examId}page{N}.png`（N 从 1 开始）
//! - 答案页：`{base}/{examId}answers.png`
//! - 原卷：`{base}/{examId}.pdf`

use std::fmt::Display;

/// 当前选中的试卷
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamReference {
    /// 试卷ID
    pub exam_id: String,
    /// 探测到的页数，探测前为 None
    pub page_count: Option<usize>,
}

impl ExamReference {
    pub fn new(exam_id: impl Into<String>) -> Self {
        Self {
            exam_id: exam_id.into(),
            page_count: None,
        }
    }

    pub fn page_url(&self, base: &str, page: usize) -> String {
        page_image_url(base, &self.exam_id, page)
    }

    pub fn answer_key_url(&self, base: &str) -> String {
        answer_key_url(base, &self.exam_id)
    }

    pub fn pdf_url(&self, base: &str) -> String {
        format!("{}/{}.pdf", base.trim_end_matches('/'), self.exam_id)
    }
}

impl Display for ExamReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.page_count {
            Some(n) => write!(f, "[试卷 {} 共{}页]", self.exam_id, n),
            None => write!(f, "[试卷 {}]", self.exam_id),
        }
    }
}

/// 题目页图片 URL
pub fn page_image_url(base: &str, exam_id: &str, page: usize) -> String {
    format!("{}/{}page{}.png", base.trim_end_matches('/'), exam_id, page)
}

/// 答案页图片 URL
pub fn answer_key_url(base: &str, exam_id: &str) -> String {
    format!("{}/{}answers.png", base.trim_end_matches('/'), exam_id)
}
