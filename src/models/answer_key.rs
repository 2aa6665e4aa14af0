//! 练习卷官方答案表
//!
//! 键为 `{examId}_{题号}`，题号小写且去掉所有空白

use phf::phf_map;

static ANSWER_KEY: phf::Map<&'static str, &'static str> = phf_map! {
    "worksheet-a_q1" => "120 cm³",
    "worksheet-a_q2" => "3.14",
    "worksheet-b_q3" => "45°",
};

/// 查找官方答案
pub fn lookup_official_answer(exam_id: &str, question: &str) -> Option<&'static str> {
    let normalized: String = question
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    ANSWER_KEY
        .get(format!("{}_{}", exam_id, normalized).as_str())
        .copied()
}
