/// LLM API 客户端
///
/// 封装所有与模型服务相关的调用逻辑，兼容 OpenAI 接口的服务均可使用
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::ContentPart;

/// 对话模型
///
/// 一次调用 = 一条系统消息 + 一条用户消息，返回去掉首尾空白的文本
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, system_message: &str, content: &[ContentPart]) -> AppResult<String>;
}

/// 基于 `async-openai` 的模型客户端
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiChatModel {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 构建用户消息内容
    ///
    /// 只有一段文字时直接发字符串，否则按顺序发多部分内容（Vision）
    fn build_user_content(content: &[ContentPart]) -> ChatCompletionRequestUserMessageContent {
        if let [ContentPart::Text { text }] = content {
            return ChatCompletionRequestUserMessageContent::Text(text.clone());
        }

        let parts = content
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText { text: text.clone() },
                ),
                ContentPart::ImageUrl { image_url } => {
                    ChatCompletionRequestUserMessageContentPart::ImageUrl(
                        ChatCompletionRequestMessageContentPartImage {
                            image_url: ImageUrl {
                                url: image_url.url.clone(),
                                detail: Some(ImageDetail::Auto),
                            },
                        },
                    )
                }
            })
            .collect();

        ChatCompletionRequestUserMessageContent::Array(parts)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, system_message: &str, content: &[ContentPart]) -> AppResult<String> {
        debug!(
            "调用 LLM API，模型: {}，内容片段: {}",
            self.model_name,
            content.len()
        );

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(|e| AppError::upstream(e.to_string()))?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(Self::build_user_content(content))
            .build()
            .map_err(|e| AppError::upstream(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.3)
            .build()
            .map_err(|e| AppError::upstream(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::upstream(e.to_string())
        })?;

        debug!("LLM API 调用成功");

        // 没有 choice 或 content 时按空字符串处理
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}
