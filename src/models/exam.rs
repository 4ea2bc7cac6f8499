use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 允许的题目数量范围（操作员输入）
pub const MIN_QUESTION_COUNT: usize = 5;
pub const MAX_QUESTION_COUNT: usize = 100;

/// 卷型（A/B/C/D），声明顺序即优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variant {
    A,
    B,
    C,
    D,
}

impl Variant {
    /// 按优先级排列的全部卷型
    pub const ALL: [Variant; 4] = [Variant::A, Variant::B, Variant::C, Variant::D];

    pub fn label(self) -> char {
        match self {
            Variant::A => 'A',
            Variant::B => 'B',
            Variant::C => 'C',
            Variant::D => 'D',
        }
    }

    /// 从单个字符解析（不区分大小写）
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Variant::A),
            'B' => Some(Variant::B),
            'C' => Some(Variant::C),
            'D' => Some(Variant::D),
            _ => None,
        }
    }

    /// 从字符串解析，字符串必须恰好是一个卷型字母
    pub fn from_label(s: &str) -> Option<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ConfigError::UnknownVariant {
            label: s.to_string(),
        })
    }
}

/// 卷型模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BookletMode {
    /// 单一卷型（始终按 A 卷判分）
    Single,
    /// A-B
    #[default]
    Two,
    /// A-B-C
    Three,
    /// A-B-C-D
    Four,
}

impl BookletMode {
    /// 当前模式下启用的卷型，按优先级排列
    pub fn variants(self) -> &'static [Variant] {
        match self {
            BookletMode::Single => &Variant::ALL[..1],
            BookletMode::Two => &Variant::ALL[..2],
            BookletMode::Three => &Variant::ALL[..3],
            BookletMode::Four => &Variant::ALL[..],
        }
    }

    pub fn is_single(self) -> bool {
        self == BookletMode::Single
    }
}

impl fmt::Display for BookletMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookletMode::Single => "single",
            BookletMode::Two => "two",
            BookletMode::Three => "three",
            BookletMode::Four => "four",
        };
        write!(f, "{}", name)
    }
}

/// 每题分值
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsMode {
    /// 总分 100 平均分配到每题
    #[default]
    Proportional,
    /// 每题固定分值
    Fixed(f64),
}

impl PointsMode {
    pub fn points_per_question(self, question_count: usize) -> f64 {
        match self {
            PointsMode::Proportional if question_count == 0 => 0.0,
            PointsMode::Proportional => 100.0 / question_count as f64,
            PointsMode::Fixed(points) => points,
        }
    }
}

/// 答案：卷型 → 标准答案字符串（只含大写字母）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Variant, String>", into = "BTreeMap<Variant, String>")]
pub struct AnswerKey(BTreeMap<Variant, String>);

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入答案，只保留字母并转大写；空答案视为未提供
    pub fn insert(&mut self, variant: Variant, key: &str) {
        let cleaned = clean_key(key);
        if cleaned.is_empty() {
            self.0.remove(&variant);
        } else {
            self.0.insert(variant, cleaned);
        }
    }

    pub fn get(&self, variant: Variant) -> Option<&str> {
        self.0.get(&variant).map(String::as_str)
    }

    pub fn contains(&self, variant: Variant) -> bool {
        self.0.contains_key(&variant)
    }

    /// 是否已有某个卷型使用了这串答案
    pub fn contains_key_string(&self, key: &str) -> bool {
        self.0.values().any(|k| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variant, &str)> {
        self.0.iter().map(|(v, k)| (*v, k.as_str()))
    }

    /// 用另一份答案覆盖（逐卷型），用于手动修正自动识别的结果
    pub fn overridden_by(mut self, overrides: &AnswerKey) -> Self {
        for (variant, key) in overrides.iter() {
            self.0.insert(variant, key.to_string());
        }
        self
    }

    /// 当前模式下缺少答案的卷型
    pub fn missing_for(&self, mode: BookletMode) -> Vec<Variant> {
        mode.variants()
            .iter()
            .copied()
            .filter(|v| !self.contains(*v))
            .collect()
    }
}

impl FromIterator<(Variant, String)> for AnswerKey {
    fn from_iter<I: IntoIterator<Item = (Variant, String)>>(iter: I) -> Self {
        let mut key = AnswerKey::new();
        for (variant, value) in iter {
            key.insert(variant, &value);
        }
        key
    }
}

impl From<BTreeMap<Variant, String>> for AnswerKey {
    fn from(map: BTreeMap<Variant, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<AnswerKey> for BTreeMap<Variant, String> {
    fn from(key: AnswerKey) -> Self {
        key.0
    }
}

/// 只保留字母，占位符等其他字符一律去掉
fn clean_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect()
}

/// 识别规则的阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// 一行至少需要的非空单元格数
    pub min_row_cells: usize,
    /// 作答单元格长度必须大于此值
    pub answer_cell_min_len: usize,
    /// 清洗后的作答串至少需要的长度
    pub min_answer_len: usize,
    /// 答案串长度必须大于此值
    pub key_token_min_len: usize,
    /// 检查卷型标记时查看的末尾字符数
    pub variant_tail_window: usize,
    /// 只在前几页中查找答案
    pub key_scan_pages: usize,
    /// 答案标记语言（en/tr/de/zh），为空时匹配所有语言
    pub locale: Option<String>,
    /// 额外的答案标记短语
    pub extra_markers: Vec<String>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            min_row_cells: 3,
            answer_cell_min_len: 10,
            min_answer_len: 10,
            key_token_min_len: 15,
            variant_tail_window: 3,
            key_scan_pages: 3,
            locale: None,
            extra_markers: Vec::new(),
        }
    }
}

/// 考试配置，一次批处理中保持不变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamConfig {
    pub question_count: usize,
    #[serde(default)]
    pub booklet_mode: BookletMode,
    #[serde(default)]
    pub keys: AnswerKey,
    #[serde(default)]
    pub points: PointsMode,
    #[serde(default = "default_fallback_variant")]
    pub fallback_variant: Variant,
    #[serde(default)]
    pub rules: ExtractionRules,
}

fn default_fallback_variant() -> Variant {
    Variant::A
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            question_count: 25,
            booklet_mode: BookletMode::default(),
            keys: AnswerKey::new(),
            points: PointsMode::default(),
            fallback_variant: default_fallback_variant(),
            rules: ExtractionRules::default(),
        }
    }
}

impl ExamConfig {
    pub fn new(question_count: usize, booklet_mode: BookletMode) -> Self {
        Self {
            question_count,
            booklet_mode,
            ..Self::default()
        }
    }

    pub fn with_keys(mut self, keys: AnswerKey) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_points(mut self, points: PointsMode) -> Self {
        self.points = points;
        self
    }

    pub fn points_per_question(&self) -> f64 {
        self.points.points_per_question(self.question_count)
    }

    pub fn active_variants(&self) -> &'static [Variant] {
        self.booklet_mode.variants()
    }

    pub fn is_active(&self, variant: Variant) -> bool {
        self.active_variants().contains(&variant)
    }

    /// 校验操作员输入的设置（不检查答案是否齐全）
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&self.question_count) {
            return Err(ConfigError::QuestionCountOutOfRange {
                count: self.question_count,
                min: MIN_QUESTION_COUNT,
                max: MAX_QUESTION_COUNT,
            });
        }
        if !self.is_active(self.fallback_variant) {
            return Err(ConfigError::FallbackNotActive {
                variant: self.fallback_variant.label(),
                mode: self.booklet_mode.to_string(),
            });
        }
        if let PointsMode::Fixed(points) = self.points {
            if !(points.is_finite() && points > 0.0) {
                return Err(ConfigError::InvalidPoints { points });
            }
        }
        Ok(())
    }

    /// 手动输入答案时，当前模式下每个卷型都必须有答案
    pub fn require_complete_keys(&self) -> Result<(), ConfigError> {
        let missing = self.keys.missing_for(self.booklet_mode);
        if missing.is_empty() {
            return Ok(());
        }
        Err(ConfigError::MissingKeys {
            mode: self.booklet_mode.to_string(),
            missing: missing
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booklet_mode_variants() {
        assert_eq!(BookletMode::Single.variants(), &[Variant::A]);
        assert_eq!(BookletMode::Three.variants(), &[Variant::A, Variant::B, Variant::C]);
        assert_eq!(BookletMode::Four.variants().len(), 4);
    }

    #[test]
    fn test_points_per_question() {
        assert_eq!(PointsMode::Proportional.points_per_question(25), 4.0);
        assert_eq!(PointsMode::Proportional.points_per_question(40), 2.5);
        assert_eq!(PointsMode::Fixed(4.0).points_per_question(30), 4.0);
    }

    #[test]
    fn test_answer_key_cleans_input() {
        let mut keys = AnswerKey::new();
        keys.insert(Variant::A, " cdb cb ");
        keys.insert(Variant::B, "   ");
        keys.insert(Variant::C, "ab-c_d 1e");
        assert_eq!(keys.get(Variant::A), Some("CDBCB"));
        assert!(!keys.contains(Variant::B));
        assert_eq!(keys.get(Variant::C), Some("ABCDE"));
    }

    #[test]
    fn test_override_replaces_per_variant() {
        let detected: AnswerKey = [(Variant::A, "AAAA".to_string()), (Variant::B, "BBBB".to_string())]
            .into_iter()
            .collect();
        let manual: AnswerKey = [(Variant::B, "CCCC".to_string())].into_iter().collect();
        let merged = detected.overridden_by(&manual);
        assert_eq!(merged.get(Variant::A), Some("AAAA"));
        assert_eq!(merged.get(Variant::B), Some("CCCC"));
    }

    #[test]
    fn test_validate_question_count() {
        assert!(ExamConfig::new(25, BookletMode::Two).validate().is_ok());
        assert!(matches!(
            ExamConfig::new(4, BookletMode::Two).validate(),
            Err(ConfigError::QuestionCountOutOfRange { .. })
        ));
        assert!(ExamConfig::new(101, BookletMode::Two).validate().is_err());
    }

    #[test]
    fn test_validate_fallback_variant() {
        let mut exam = ExamConfig::new(25, BookletMode::Single);
        exam.fallback_variant = Variant::B;
        assert!(matches!(
            exam.validate(),
            Err(ConfigError::FallbackNotActive { variant: 'B', .. })
        ));
    }

    #[test]
    fn test_require_complete_keys() {
        let mut keys = AnswerKey::new();
        keys.insert(Variant::A, "ABCDE");
        let exam = ExamConfig::new(5, BookletMode::Two).with_keys(keys);
        match exam.require_complete_keys() {
            Err(ConfigError::MissingKeys { missing, .. }) => assert_eq!(missing, "B"),
            other => panic!("expected missing keys, got {:?}", other),
        }
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!(Variant::from_label("b"), Some(Variant::B));
        assert_eq!(Variant::from_label("AB"), None);
        assert!("E".parse::<Variant>().is_err());
    }
}
