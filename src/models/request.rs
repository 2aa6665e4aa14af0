//! `/api/analyze` 请求体
//!
//! 四种请求形态统一成一个带 `mode` 标签的结构。
//! 旧客户端不带 `mode`，按字段推断一次，之后只按模式处理

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::content::ContentPart;

/// 请求模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// 前端已组装好的 content parts
    Messages,
    /// 文字题 + 官方答案
    OfficialAnswer,
    /// 指定试卷的某一页 + 官方答案
    ExamPage,
    /// 文字问题 + 试卷ID，服务端自行探测图片
    ExamPrompt,
}

/// 线上请求体，所有字段可选，由 [`AnalyzeRequest::validate`] 校验
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RequestMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ContentPart>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

/// 校验后的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeCommand {
    Messages {
        prompt: String,
        parts: Vec<ContentPart>,
    },
    OfficialAnswer {
        question: String,
        official_answer: String,
    },
    ExamPage {
        exam_id: String,
        page: usize,
        official_answer: String,
    },
    ExamPrompt {
        prompt: String,
        exam_id: String,
    },
}

impl AnalyzeRequest {
    pub fn messages(prompt: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            mode: Some(RequestMode::Messages),
            prompt: Some(prompt.into()),
            messages: Some(parts),
            ..Default::default()
        }
    }

    pub fn official_answer(question: impl Into<String>, official_answer: impl Into<String>) -> Self {
        Self {
            mode: Some(RequestMode::OfficialAnswer),
            question: Some(question.into()),
            official_answer: Some(official_answer.into()),
            ..Default::default()
        }
    }

    pub fn exam_page(
        exam_id: impl Into<String>,
        page: usize,
        official_answer: impl Into<String>,
    ) -> Self {
        Self {
            mode: Some(RequestMode::ExamPage),
            exam_id: Some(exam_id.into()),
            page: Some(page),
            official_answer: Some(official_answer.into()),
            ..Default::default()
        }
    }

    pub fn exam_prompt(prompt: impl Into<String>, exam_id: impl Into<String>) -> Self {
        Self {
            mode: Some(RequestMode::ExamPrompt),
            prompt: Some(prompt.into()),
            exam_id: Some(exam_id.into()),
            ..Default::default()
        }
    }

    /// 请求模式，没有 `mode` 时按字段推断
    ///
    /// 推断顺序：`messages` → `examId + page` → `officialAnswer / question`
    /// → `examId + prompt`，都不匹配时按 `messages` 处理
    pub fn resolved_mode(&self) -> RequestMode {
        if let Some(mode) = self.mode {
            return mode;
        }
        if self.messages.is_some() {
            RequestMode::Messages
        } else if self.exam_id.is_some() && self.page.is_some() {
            RequestMode::ExamPage
        } else if self.official_answer.is_some() || self.question.is_some() {
            RequestMode::OfficialAnswer
        } else if self.exam_id.is_some() && self.prompt.is_some() {
            RequestMode::ExamPrompt
        } else {
            RequestMode::Messages
        }
    }

    /// 按模式检查必填字段
    pub fn validate(self) -> AppResult<AnalyzeCommand> {
        let mode = self.resolved_mode();

        match mode {
            RequestMode::Messages => match (non_blank(self.prompt), self.messages) {
                (Some(prompt), Some(parts)) => Ok(AnalyzeCommand::Messages { prompt, parts }),
                _ => Err(AppError::validation("Missing or invalid prompt/messages.")),
            },
            RequestMode::OfficialAnswer => {
                match (non_blank(self.question), non_blank(self.official_answer)) {
                    (Some(question), Some(official_answer)) => Ok(AnalyzeCommand::OfficialAnswer {
                        question,
                        official_answer,
                    }),
                    _ => Err(AppError::validation("Missing question or official answer.")),
                }
            }
            RequestMode::ExamPage => match (
                non_blank(self.exam_id),
                self.page.filter(|p| *p >= 1),
                non_blank(self.official_answer),
            ) {
                (Some(exam_id), Some(page), Some(official_answer)) => Ok(AnalyzeCommand::ExamPage {
                    exam_id,
                    page,
                    official_answer,
                }),
                _ => Err(AppError::validation(
                    "Missing exam id, page or official answer.",
                )),
            },
            RequestMode::ExamPrompt => match (non_blank(self.prompt), non_blank(self.exam_id)) {
                (Some(prompt), Some(exam_id)) => Ok(AnalyzeCommand::ExamPrompt { prompt, exam_id }),
                _ => Err(AppError::validation("Missing prompt or exam id.")),
            },
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
