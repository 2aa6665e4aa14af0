//! 语音模块
//!
//! - `chunker`: 按句切分、按文字判断语言
//! - `voice`: 按语言挑选发音人
//! - `synthesis`: 朗读（可随时打断）
//! - `recognition`: 按住说话

pub mod chunker;
pub mod recognition;
pub mod synthesis;
pub mod voice;

pub use chunker::{chunk_text, detect_language, segment, Chunk, Language};
pub use recognition::{HoldToTalk, SpeechRecognizer};
pub use synthesis::{Speaker, SpeechSynthesizer, Utterance};
pub use voice::{select_voice, Voice};
