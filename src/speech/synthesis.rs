//! 朗读
//!
//! 英文片段先读，停顿后再读中文片段；每段读完后稍作停顿再读下一段。
//! 新的朗读请求会直接打断正在进行的朗读，不排队。

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SpeechConfig;
use crate::error::AppResult;
use crate::speech::{segment, select_voice, Chunk, Language, Voice};

/// 一次合成请求
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: &'static str,
    pub voice: Option<Voice>,
    pub rate: f32,
}

/// 语音合成引擎
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// 当前可用的发音人
    fn voices(&self) -> Vec<Voice>;

    /// 播放一段语音，播放结束时返回
    async fn speak(&self, utterance: Utterance) -> AppResult<()>;

    /// 立即停止播放
    fn cancel(&self);
}

/// 朗读控制器
///
/// 持有发音人缓存和当前的播放任务
pub struct Speaker {
    synth: Arc<dyn SpeechSynthesizer>,
    settings: SpeechConfig,
    voices: Mutex<Vec<Voice>>,
    playback: Mutex<Option<JoinHandle<()>>>,
}

impl Speaker {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>, settings: SpeechConfig) -> Self {
        Self {
            synth,
            settings,
            voices: Mutex::new(Vec::new()),
            playback: Mutex::new(None),
        }
    }

    /// 发音人列表变化时调用
    pub fn refresh_voices(&self) {
        let voices = self.synth.voices();
        debug!("发音人列表更新: {} 个", voices.len());
        if let Ok(mut cached) = self.voices.lock() {
            *cached = voices;
        }
    }

    /// 朗读文本（立即返回）
    ///
    /// 正在进行的朗读会被取消
    pub fn speak(&self, text: &str) {
        self.stop();

        let chunks = segment(text, self.settings.max_chunk_chars);
        if chunks.is_empty() {
            return;
        }

        let (english, chinese): (Vec<Chunk>, Vec<Chunk>) = chunks
            .into_iter()
            .partition(|c| c.language == Language::English);
        info!("🔊 开始朗读: 英文 {} 段, 中文 {} 段", english.len(), chinese.len());

        let voices = self.cached_voices();
        let synth = self.synth.clone();
        let chunk_pause = Duration::from_millis(self.settings.inter_chunk_pause_ms);
        let pass_pause = Duration::from_millis(self.settings.inter_pass_pause_ms);

        let handle = tokio::spawn(async move {
            let english_played = !english.is_empty();
            if !speak_pass(synth.as_ref(), &voices, english, chunk_pause).await {
                return;
            }
            if english_played && !chinese.is_empty() {
                tokio::time::sleep(pass_pause).await;
            }
            speak_pass(synth.as_ref(), &voices, chinese, chunk_pause).await;
        });

        if let Ok(mut playback) = self.playback.lock() {
            *playback = Some(handle);
        }
    }

    /// 停止朗读，丢弃所有未读片段
    pub fn stop(&self) {
        let previous = self.playback.lock().ok().and_then(|mut p| p.take());
        if let Some(handle) = previous {
            if !handle.is_finished() {
                debug!("🔇 打断当前朗读");
            }
            handle.abort();
        }
        self.synth.cancel();
    }

    pub fn is_speaking(&self) -> bool {
        self.playback
            .lock()
            .ok()
            .and_then(|p| p.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    fn cached_voices(&self) -> Vec<Voice> {
        let Ok(mut cached) = self.voices.lock() else {
            return self.synth.voices();
        };
        if cached.is_empty() {
            *cached = self.synth.voices();
        }
        cached.clone()
    }
}

/// 顺序朗读同一语言的片段；出错时返回 false 并结束整个朗读
async fn speak_pass(
    synth: &dyn SpeechSynthesizer,
    voices: &[Voice],
    chunks: Vec<Chunk>,
    pause: Duration,
) -> bool {
    for chunk in chunks {
        let utterance = Utterance {
            voice: select_voice(voices, chunk.language).cloned(),
            lang: chunk.language.tag(),
            text: chunk.text,
            rate: 1.0,
        };
        if let Err(e) = synth.speak(utterance).await {
            warn!("🔊 朗读失败: {}", e);
            return false;
        }
        tokio::time::sleep(pause).await;
    }
    true
}
