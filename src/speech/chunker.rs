use regex::Regex;
use std::sync::LazyLock;

/// 一句话（含结尾的标点与换行）
static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^。！？.!?\n]+[。！？.!?\n]*").expect("valid regex"));

/// 朗读语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    /// BCP 47 语言标签
    pub fn tag(self) -> &'static str {
        match self {
            Language::English => "en-GB",
            Language::Chinese => "zh-CN",
        }
    }
}

/// 带语言标记的朗读片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub language: Language,
}

/// 含有任意汉字即为中文
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c)) {
        Language::Chinese
    } else {
        Language::English
    }
}

/// 把文本切成不超过 `max_chars` 个字符的片段
///
/// 优先在句末标点或换行处断开；单句超长时按长度硬切
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut sentences: Vec<&str> = SENTENCE.find_iter(text).map(|m| m.as_str()).collect();
    if sentences.is_empty() {
        sentences.push(text);
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences {
        for piece in split_by_chars(sentence, max_chars) {
            let len = piece.chars().count();
            if current_len + len > max_chars {
                push_trimmed(&mut chunks, &current);
                current.clear();
                current_len = 0;
            }
            current.push_str(piece);
            current_len += len;
        }
    }
    push_trimmed(&mut chunks, &current);

    chunks
}

/// 切分并标记语言
///
/// 相邻的同语言句子才会合并，语言切换处一定断开
pub fn segment(text: &str, max_chars: usize) -> Vec<Chunk> {
    let mut runs: Vec<(Language, String)> = Vec::new();
    for sentence in SENTENCE.find_iter(text).map(|m| m.as_str()) {
        if sentence.trim().is_empty() {
            continue;
        }
        let language = detect_language(sentence);
        match runs.last_mut() {
            Some((lang, run)) if *lang == language => run.push_str(sentence),
            _ => runs.push((language, sentence.to_string())),
        }
    }

    runs.into_iter()
        .flat_map(|(language, run)| {
            chunk_text(&run, max_chars)
                .into_iter()
                .map(move |text| Chunk { text, language })
        })
        .collect()
}

fn split_by_chars(text: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == max_chars {
            pieces.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
