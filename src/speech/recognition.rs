//! 按住说话
//!
//! 按下开始单句识别，松开停止。仍按住时识别引擎自行结束（短暂静音被切断）
//! 会自动重启，次数有上限；结束后返回最后一次识别到的非空文字。

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::SpeechConfig;
use crate::error::AppResult;

/// 语音识别引擎
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// 识别一句话
    ///
    /// `held` 变为 false（松开）时应尽快结束；引擎也可能自行结束。
    /// 返回本次识别到的文字，没有结果时为 None
    async fn capture(&self, language: &str, held: watch::Receiver<bool>) -> AppResult<Option<String>>;
}

/// 按住说话控制
pub struct HoldToTalk {
    recognizer: Arc<dyn SpeechRecognizer>,
    language: String,
    max_restarts: usize,
}

impl HoldToTalk {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, settings: &SpeechConfig) -> Self {
        Self {
            recognizer,
            language: settings.recognition_language.clone(),
            max_restarts: settings.max_restarts,
        }
    }

    /// 从按下到松开的一次完整录音
    ///
    /// # 参数
    /// - `held`: 麦克风按钮状态，按下为 true
    ///
    /// # 返回
    /// 最后一次识别到的非空文字
    pub async fn listen(&self, held: watch::Receiver<bool>) -> Option<String> {
        let mut transcript = String::new();
        let mut restarts = 0;

        info!("🎙️ 开始录音 ({})", self.language);
        loop {
            match self.recognizer.capture(&self.language, held.clone()).await {
                // 空白结果不覆盖之前识别到的内容
                Ok(Some(text)) if !text.trim().is_empty() => {
                    debug!("📥 识别结果: {}", text);
                    transcript = text;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("🎤 识别出错: {}", e);
                    break;
                }
            }

            if *held.borrow() && restarts < self.max_restarts {
                restarts += 1;
                debug!("🔁 仍在按住，重启识别 ({}/{})", restarts, self.max_restarts);
                continue;
            }
            break;
        }

        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            info!("⚠️ 没有检测到语音内容");
            None
        } else {
            Some(transcript)
        }
    }
}
