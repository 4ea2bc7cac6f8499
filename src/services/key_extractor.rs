//! 答案识别
//!
//! 在文档前几页中查找"答案"行，例如：
//!
//! ```text
//! A KİTAPÇIĞI CEVAP ANAHTARI   CDBCBCBDCBBCCABEBBCABBCBC
//! Answer key (B): BBCBBDBABCBCCCCCAEBCDBBBC
//! ```
//!
//! 识别失败不会报错，只会返回空的 [`AnswerKey`]。

use tracing::{debug, info};

use crate::models::{AnswerKey, Document, ExamConfig, Variant};
use crate::services::rules::{self, MarkerMatcher};

/// 一行答案声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLine {
    pub key: String,
    pub variant: Option<Variant>,
}

/// 解析一行文本；不含答案标记或没有答案串时返回 None
pub fn parse_key_line(line: &str, exam: &ExamConfig, marker: &MarkerMatcher) -> Option<KeyLine> {
    if !marker.matches(line) {
        return None;
    }

    let active = exam.active_variants();
    let mut key = None;
    let mut variant = None;

    for token in line.split_whitespace() {
        if key.is_none() && rules::is_key_token(token, &exam.rules, marker) {
            key = Some(rules::key_letters(token));
        } else if variant.is_none() {
            variant = rules::variant_indicator(token, active);
        }
    }

    key.map(|key| KeyLine { key, variant })
}

/// 从文档中识别各卷型的答案
pub fn extract_keys(document: &Document, exam: &ExamConfig) -> AnswerKey {
    let marker = MarkerMatcher::from_rules(&exam.rules);
    let mut keys = AnswerKey::new();

    for page in document.pages.iter().take(exam.rules.key_scan_pages) {
        let units = page
            .lines
            .iter()
            .map(String::as_str)
            .chain(page.tables.iter().flat_map(|t| t.cells()));

        for unit in units {
            if let Some(line) = parse_key_line(unit, exam, &marker) {
                assign(&mut keys, line, exam);
            }
        }
    }

    if keys.is_empty() {
        info!("⚠️ 文档中未找到答案");
    } else {
        for (variant, key) in keys.iter() {
            info!("🔑 识别到 {} 卷答案: {} ({} 题)", variant, key, key.chars().count());
        }
    }

    keys
}

/// 写入一行答案：有卷型标签的直接写入，没有的按 A→D 填入第一个空位。
/// 没有标签的答案串如果已被某个卷型使用则跳过（同一行可能同时出现在文本和表格中）。
/// 已有答案的卷型保留先出现的那一份。
fn assign(keys: &mut AnswerKey, line: KeyLine, exam: &ExamConfig) {
    let slot = match line.variant {
        Some(variant) => Some(variant),
        None if keys.contains_key_string(&line.key) => {
            debug!("答案已识别过，忽略: {}", line.key);
            return;
        }
        None => exam
            .active_variants()
            .iter()
            .copied()
            .find(|v| !keys.contains(*v)),
    };

    match slot {
        Some(variant) if !keys.contains(variant) => {
            debug!("答案行 -> {} 卷 (标签: {:?})", variant, line.variant);
            keys.insert(variant, &line.key);
        }
        Some(variant) => debug!("{} 卷已有答案，忽略: {}", variant, line.key),
        None => debug!("所有卷型均已有答案，忽略: {}", line.key),
    }
}
