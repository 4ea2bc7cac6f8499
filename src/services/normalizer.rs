use crate::models::record::{NormalizedAnswer, SENTINEL};

/// 规范化作答串：去空白、转大写，不足补占位符，超出截断
pub fn normalize(raw: &str, length: usize) -> NormalizedAnswer {
    let mut chars: Vec<char> = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .take(length)
        .collect();
    chars.resize(length, SENTINEL);
    NormalizedAnswer::from_chars(chars)
}
