use phf::phf_map;

use crate::speech::Language;

/// 发音人名称关键字，语言标签匹配不到时使用
static VOICE_NAME_HINTS: phf::Map<&'static str, &'static str> = phf_map! {
    "zh-CN" => "普通话",
    "en-GB" => "English",
};

/// 合成引擎提供的发音人
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// 挑选发音人
///
/// 语言标签完全一致 → 名称包含关键字 → 第一个可用发音人
pub fn select_voice(voices: &[Voice], language: Language) -> Option<&Voice> {
    let tag = language.tag();
    voices
        .iter()
        .find(|v| v.lang == tag)
        .or_else(|| {
            VOICE_NAME_HINTS
                .get(tag)
                .and_then(|hint| voices.iter().find(|v| v.name.contains(*hint)))
        })
        .or_else(|| voices.first())
}
