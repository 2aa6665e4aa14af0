//! 解题网关 - 业务能力层
//!
//! 两次顺序调用模型：先用英文解题，再把英文结果翻译成简体中文。
//! 第二次调用依赖第一次的完整输出，不能并行；任何一次失败都终止整个请求，不重试。

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use crate::clients::{AnalyzeBackend, ChatModel};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{AnalyzeCommand, AnalyzeRequest, ContentPart, TutorResponse};
use crate::services::{ImageProber, RequestAssembler};
use crate::utils::truncate_text;

/// 翻译指令：逐字翻译，不增不减
pub const TRANSLATION_PROMPT: &str =
    "你是一名英語數學翻譯員。請將下列英文數學內容完整翻譯為簡體中文，不要添加或省略。";

static MATH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?|[+\-−*/×÷=<>%²³]").expect("valid regex"));

/// 解题网关
pub struct TutoringGateway {
    model: Arc<dyn ChatModel>,
    prober: ImageProber,
    tutor_prompt: String,
}

impl TutoringGateway {
    pub fn new(model: Arc<dyn ChatModel>, prober: ImageProber, config: &Config) -> Self {
        Self {
            model,
            prober,
            tutor_prompt: tutor_system_prompt(config),
        }
    }

    /// 解题并翻译
    ///
    /// # 参数
    /// - `content`: 用户消息内容，至少包含一段非空文字
    ///
    /// # 返回
    /// 英文讲解与中文翻译
    pub async fn solve_and_translate(&self, content: &[ContentPart]) -> AppResult<TutorResponse> {
        let has_prompt = content
            .iter()
            .filter_map(ContentPart::as_text)
            .any(|t| !t.trim().is_empty());
        if !has_prompt {
            return Err(AppError::validation("Missing or invalid prompt/messages."));
        }

        info!(
            "🤖 开始解题，模型: {}，图片 {} 张",
            self.model.model_name(),
            content.iter().filter(|p| p.image_url().is_some()).count()
        );

        let english = self.model.complete(&self.tutor_prompt, content).await?;
        debug!("英文讲解: {}", truncate_text(&english, 80));

        let chinese = if english.is_empty() {
            warn!("⚠️ 英文讲解为空，跳过翻译");
            String::new()
        } else {
            self.translate(&english).await?
        };

        Ok(TutorResponse {
            english_text: english,
            chinese_text: chinese,
        })
    }

    /// 把英文讲解翻译成简体中文
    pub async fn translate(&self, english: &str) -> AppResult<String> {
        let translated = self
            .model
            .complete(TRANSLATION_PROMPT, &[ContentPart::text(english)])
            .await?;

        let missing = missing_math_tokens(english, &translated);
        if !missing.is_empty() {
            warn!("⚠️ 译文缺少原文中的数字或符号: {:?}", missing);
        }

        Ok(translated)
    }

    /// 按请求模式组装内容后解题
    pub async fn handle(&self, request: AnalyzeRequest) -> AppResult<TutorResponse> {
        let command = request.validate()?;
        let content = self.build_content(command).await?;
        self.solve_and_translate(&content).await
    }

    async fn build_content(&self, command: AnalyzeCommand) -> AppResult<Vec<ContentPart>> {
        let assembler = RequestAssembler::new(&self.prober);

        match command {
            AnalyzeCommand::Messages { prompt, mut parts } => {
                // 保证文字在最前
                if parts.first().and_then(ContentPart::as_text).is_none() {
                    parts.insert(0, ContentPart::text(prompt));
                }
                Ok(parts)
            }
            AnalyzeCommand::OfficialAnswer {
                question,
                official_answer,
            } => Ok(vec![ContentPart::text(official_answer_prompt(
                &question,
                &official_answer,
            ))]),
            AnalyzeCommand::ExamPage {
                exam_id,
                page,
                official_answer,
            } => {
                let prompt = format!(
                    "Solve the question shown on page {} of worksheet {}.\n\n{}",
                    page,
                    exam_id,
                    answer_instruction(&official_answer)
                );
                assembler
                    .assemble_with_answer_key(&prompt, &exam_id, page)
                    .await
                    .map_err(AppError::asset_not_found)
            }
            AnalyzeCommand::ExamPrompt { prompt, exam_id } => {
                Ok(assembler.assemble(&prompt, &exam_id).await)
            }
        }
    }
}

#[async_trait]
impl AnalyzeBackend for TutoringGateway {
    async fn analyze(&self, request: AnalyzeRequest) -> AppResult<TutorResponse> {
        self.handle(request).await
    }
}

/// 解题系统提示词
pub fn tutor_system_prompt(config: &Config) -> String {
    format!(
        r#"You are a {grade} Mathematics tutor in {region}.

You will be given:
1. A student's math question (text or image)
2. Your job is to solve it and explain your steps clearly.

Use simple English suitable for {age} year old students.
Respond with friendly, clear explanations step by step."#,
        grade = config.grade_level,
        region = config.region,
        age = config.student_age,
    )
}

fn answer_instruction(official_answer: &str) -> String {
    format!(
        "The official answer is: {answer}\nExplain step by step how to reach the official answer, then finish with the line \"Answer: {answer}\".",
        answer = official_answer
    )
}

fn official_answer_prompt(question: &str, official_answer: &str) -> String {
    format!(
        "Question: {}\n\n{}",
        question,
        answer_instruction(official_answer)
    )
}

/// 原文中出现、译文中却找不到的数字与运算符
pub fn missing_math_tokens(source: &str, translation: &str) -> Vec<String> {
    let present: HashSet<&str> = MATH_TOKEN
        .find_iter(translation)
        .map(|m| m.as_str())
        .collect();

    let mut seen = HashSet::new();
    MATH_TOKEN
        .find_iter(source)
        .map(|m| m.as_str())
        .filter(|t| !present.contains(t) && seen.insert(*t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::AssetProbe;
    use std::sync::Mutex;

    /// 按系统提示词区分解题 / 翻译的假模型
    struct ScriptedModel {
        english: Result<String, String>,
        translation_fails: bool,
        calls: Mutex<Vec<(String, Vec<ContentPart>)>>,
    }

    impl ScriptedModel {
        fn answering(english: &str) -> Arc<Self> {
            Arc::new(Self {
                english: Ok(english.to_string()),
                translation_fails: false,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Vec<ContentPart>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, system: &str, content: &[ContentPart]) -> AppResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), content.to_vec()));

            if system == TRANSLATION_PROMPT {
                if self.translation_fails {
                    return Err(AppError::upstream("translation quota exceeded"));
                }
                let english = content[0].as_text().unwrap_or_default();
                return Ok(format!("答案如下：{}", english));
            }
            self.english.clone().map_err(AppError::upstream)
        }
    }

    struct NoAssets;

    #[async_trait]
    impl AssetProbe for NoAssets {
        async fn exists(&self, url: &str) -> bool {
            url.ends_with("wapage1.png")
        }
    }

    fn gateway(model: Arc<ScriptedModel>) -> TutoringGateway {
        let config = Config::default();
        let prober = ImageProber::new(Arc::new(NoAssets), "http://h/exam/math", &config.probe);
        TutoringGateway::new(model, prober, &config)
    }

    #[tokio::test]
    async fn test_translation_receives_english_output() {
        let model = ScriptedModel::answering("2 + 3 = 5\nAnswer: 5");
        let response = gateway(model.clone())
            .solve_and_translate(&[ContentPart::text("2+3")])
            .await
            .unwrap();

        assert_eq!(response.english_text, "2 + 3 = 5\nAnswer: 5");
        assert!(response.chinese_text.contains('5'));

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].0.contains("Form 2 Mathematics tutor in Hong Kong"));
        assert_eq!(calls[1].0, TRANSLATION_PROMPT);
        assert_eq!(calls[1].1, vec![ContentPart::text("2 + 3 = 5\nAnswer: 5")]);
    }

    #[tokio::test]
    async fn test_empty_english_skips_translation_call() {
        let model = ScriptedModel::answering("");
        let response = gateway(model.clone())
            .solve_and_translate(&[ContentPart::text("2+3")])
            .await
            .unwrap();

        assert_eq!(response, TutorResponse::default());
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_first_call_failure_aborts() {
        let model = Arc::new(ScriptedModel {
            english: Err("invalid api key".to_string()),
            translation_fails: false,
            calls: Mutex::new(Vec::new()),
        });
        let err = gateway(model.clone())
            .solve_and_translate(&[ContentPart::text("2+3")])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream { ref message } if message == "invalid api key"));
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_translation_failure_fails_whole_request() {
        let model = Arc::new(ScriptedModel {
            english: Ok("Answer: 5".to_string()),
            translation_fails: true,
            calls: Mutex::new(Vec::new()),
        });
        let err = gateway(model)
            .solve_and_translate(&[ContentPart::text("2+3")])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_content_without_text_is_rejected() {
        let model = ScriptedModel::answering("5");
        let err = gateway(model.clone())
            .solve_and_translate(&[ContentPart::image("http://h/a.png")])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_translation_preserves_math_tokens_on_repeat() {
        let model = ScriptedModel::answering("unused");
        let gateway = gateway(model);
        let english = "Volume = 10 × 4 × 3 = 120 cm³, and 120 ÷ 2 = 60.";

        let first = gateway.translate(english).await.unwrap();
        let second = gateway.translate(english).await.unwrap();

        assert!(missing_math_tokens(english, &first).is_empty());
        assert!(missing_math_tokens(english, &second).is_empty());
    }

    #[tokio::test]
    async fn test_official_answer_prompt_mentions_answer() {
        let model = ScriptedModel::answering("Answer: 5");
        gateway(model.clone())
            .handle(AnalyzeRequest::official_answer("2+3", "5"))
            .await
            .unwrap();

        let text = model.calls()[0].1[0].as_text().unwrap().to_string();
        assert!(text.contains("Question: 2+3"));
        assert!(text.contains("Answer: 5"));
    }

    #[tokio::test]
    async fn test_exam_page_missing_image_is_not_found() {
        let model = ScriptedModel::answering("Answer: 45°");
        let err = gateway(model.clone())
            .handle(AnalyzeRequest::exam_page("wa", 2, "45°"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 404);
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exam_prompt_probes_server_side() {
        let model = ScriptedModel::answering("Answer: 120 cm³");
        gateway(model.clone())
            .handle(AnalyzeRequest::exam_prompt("Q1", "wa"))
            .await
            .unwrap();

        let content = &model.calls()[0].1;
        assert_eq!(content[0], ContentPart::text("Q1"));
        assert_eq!(content[1].image_url(), Some("http://h/exam/math/wapage1.png"));
        assert_eq!(content.len(), 2);
    }

    #[tokio::test]
    async fn test_messages_mode_puts_prompt_first() {
        let model = ScriptedModel::answering("Answer: 5");
        gateway(model.clone())
            .handle(AnalyzeRequest::messages(
                "Q1",
                vec![ContentPart::image("http://h/exam/math/wapage1.png")],
            ))
            .await
            .unwrap();

        let content = &model.calls()[0].1;
        assert_eq!(content[0], ContentPart::text("Q1"));
    }

    #[test]
    fn test_missing_math_tokens() {
        assert_eq!(missing_math_tokens("3 + 4 = 7", "三加四等于 7"), vec!["3", "+", "4", "="]);
        assert!(missing_math_tokens("no numbers", "没有数字").is_empty());
    }

    #[test]
    fn test_dropped_minus_and_powers_are_flagged() {
        assert_eq!(missing_math_tokens("7 - 2 = 5", "七减二 = 5"), vec!["7", "-", "2"]);
        assert_eq!(missing_math_tokens("x² − 4 = 0", "x 平方减 4 = 0"), vec!["²", "−"]);
        assert_eq!(missing_math_tokens("6 * 2 / 3", "6 乘 2 除以 3"), vec!["*", "/"]);
        assert_eq!(missing_math_tokens("2³ = 8", "2³ 等于 8"), vec!["="]);
    }
}
