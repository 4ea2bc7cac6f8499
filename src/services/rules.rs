//! 识别规则
//!
//! 答案识别和学生记录识别用到的每条启发式规则都是一个独立的纯函数，
//! 由 `key_extractor` / `record_extractor` 按固定顺序调用。

use phf::phf_map;

use crate::models::{ExtractionRules, Variant};

/// 各语言的"答案"标记短语
static MARKER_PHRASES: phf::Map<&'static str, &'static str> = phf_map! {
    "en" => "answer key",
    "tr" => "cevap anahtarı",
    "de" => "lösungsschlüssel",
    "zh" => "答案",
};

/// 卷型标签两侧允许出现的标点
const LABEL_PUNCTUATION: &[char] = &[':', '(', ')', '[', ']', '-', '.', ','];

/// 比较前统一大小写并去掉空白；土耳其语的 ı/İ 视为 i
pub fn fold(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .filter(|c| *c != '\u{307}')
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect()
}

/// 答案标记匹配器
#[derive(Debug, Clone)]
pub struct MarkerMatcher {
    phrases: Vec<String>,
}

impl MarkerMatcher {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut folded: Vec<String> = phrases
            .into_iter()
            .map(|p| fold(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        folded.sort();
        folded.dedup();
        Self { phrases: folded }
    }

    /// 按 `locale` 选取标记短语（未指定或未知语言时使用全部），再加上额外短语
    pub fn from_rules(rules: &ExtractionRules) -> Self {
        let builtin: Vec<&str> = match rules
            .locale
            .as_deref()
            .and_then(|locale| MARKER_PHRASES.get(locale))
        {
            Some(phrase) => vec![*phrase],
            None => MARKER_PHRASES.values().copied().collect(),
        };
        Self::new(
            builtin
                .into_iter()
                .map(str::to_string)
                .chain(rules.extra_markers.iter().cloned()),
        )
    }

    pub fn matches(&self, text: &str) -> bool {
        let folded = fold(text);
        self.phrases.iter().any(|p| folded.contains(p.as_str()))
    }
}

// ========== 记录行规则 ==========

/// 非空单元格足够多
pub fn has_min_cells(cells: &[&str], min_cells: usize) -> bool {
    cells.len() >= min_cells
}

/// 纯数字（允许空白和 . , / - 分隔）
pub fn is_purely_numeric(cell: &str) -> bool {
    let mut has_digit = false;
    for c in cell.chars() {
        if c.is_ascii_digit() {
            has_digit = true;
        } else if !(c.is_whitespace() || matches!(c, '.' | ',' | '/' | '-')) {
            return false;
        }
    }
    has_digit
}

/// 单元格是否可能是作答串：足够长、不是纯数字、不含答案标记
pub fn is_answer_candidate(cell: &str, rules: &ExtractionRules, marker: &MarkerMatcher) -> bool {
    cell.trim().chars().count() > rules.answer_cell_min_len
        && !is_purely_numeric(cell)
        && !marker.matches(cell)
}

/// 选取作答单元格：最后一个候选
pub fn pick_answer_cell(cells: &[&str], rules: &ExtractionRules, marker: &MarkerMatcher) -> Option<usize> {
    cells
        .iter()
        .rposition(|cell| is_answer_candidate(cell, rules, marker))
}

/// 单元格是否可能是姓名：非空、不含数字、不含答案标记
pub fn is_name_candidate(cell: &str, marker: &MarkerMatcher) -> bool {
    !cell.trim().is_empty() && !cell.chars().any(|c| c.is_numeric()) && !marker.matches(cell)
}

/// 选取姓名：除作答单元格外最长的候选，换行替换为空格
pub fn pick_name(cells: &[&str], answer_index: usize, marker: &MarkerMatcher) -> Option<String> {
    cells
        .iter()
        .enumerate()
        .filter(|(i, cell)| *i != answer_index && is_name_candidate(cell, marker))
        .max_by_key(|(i, cell)| (cell.chars().count(), std::cmp::Reverse(*i)))
        .map(|(_, cell)| cell.replace(['\r', '\n'], " ").trim().to_string())
}

/// 从作答单元格末尾识别卷型：去掉空白后末尾 `window` 个字符中出现的卷型，按 A→D 优先级
pub fn detect_variant(raw_cell: &str, active: &[Variant], window: usize) -> Option<Variant> {
    let compact: Vec<char> = raw_cell
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();
    let tail = &compact[compact.len().saturating_sub(window)..];
    active.iter().copied().find(|v| tail.contains(&v.label()))
}

/// 只保留字母；比题目数量长且以卷型字母结尾时去掉这一个字母
pub fn clean_answers(raw_cell: &str, variant: Variant, question_count: usize) -> String {
    let mut letters: String = raw_cell
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect();
    if letters.chars().count() > question_count && letters.ends_with(variant.label()) {
        letters.pop();
    }
    letters
}

// ========== 答案行规则 ==========

/// token 是否可能是答案串：足够长且本身不含答案标记
pub fn is_key_token(token: &str, rules: &ExtractionRules, marker: &MarkerMatcher) -> bool {
    token.chars().count() > rules.key_token_min_len
        && !marker.matches(token)
        && token.chars().any(|c| c.is_alphabetic())
}

/// token 是否恰好是一个启用的卷型标签（忽略两侧标点）
pub fn variant_indicator(token: &str, active: &[Variant]) -> Option<Variant> {
    Variant::from_label(token.trim_matches(LABEL_PUNCTUATION)).filter(|v| active.contains(v))
}

/// 答案串只保留字母并转大写
pub fn key_letters(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect()
}
