//! 判分
//!
//! 把学生作答与对应卷型的答案逐题比较。没有对应答案时返回全 0，
//! 不会让整批处理失败。

use crate::models::{ExamConfig, ScoreList, StudentRecord, Variant};
use crate::services::normalizer::normalize;

/// 判分结果（附带卷型的解析过程，用于向操作员提示）
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub scores: ScoreList,
    /// 实际用于判分的卷型
    pub variant: Option<Variant>,
    /// 学生卷型没有答案，改用了默认卷型
    pub used_fallback: bool,
    /// 最终卷型也没有答案，得分全为 0
    pub missing_key: bool,
}

/// 确定判分用的卷型
pub fn resolve_variant(record: &StudentRecord, exam: &ExamConfig) -> (Variant, bool) {
    if exam.booklet_mode.is_single() {
        return (exam.active_variants()[0], false);
    }
    match record.booklet_variant {
        Some(variant) if exam.keys.contains(variant) => (variant, false),
        _ => (exam.fallback_variant, true),
    }
}

/// 判分，并返回卷型解析信息
pub fn score_detailed(record: &StudentRecord, exam: &ExamConfig) -> ScoreOutcome {
    let (variant, used_fallback) = resolve_variant(record, exam);

    let Some(key) = exam.keys.get(variant) else {
        return ScoreOutcome {
            scores: ScoreList::zeros(exam.question_count),
            variant: None,
            used_fallback,
            missing_key: true,
        };
    };

    let answers = normalize(&record.raw_answers, exam.question_count);
    let key: Vec<char> = key.chars().collect();
    let points = exam.points_per_question();

    let scores = (0..exam.question_count)
        .map(|i| match (answers.get(i), key.get(i)) {
            (Some(given), Some(expected)) if given == *expected => points,
            _ => 0.0,
        })
        .collect();

    ScoreOutcome {
        scores: ScoreList::new(scores),
        variant: Some(variant),
        used_fallback,
        missing_key: false,
    }
}

/// 判分
pub fn score(record: &StudentRecord, exam: &ExamConfig) -> ScoreList {
    score_detailed(record, exam).scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerKey, BookletMode, PointsMode};

    const KEY_A: &str = "CDBCBCBDCBBCCABEBBCABBCBC";
    const KEY_B: &str = "BBCBBDBABCBCCCCCAEBCDBBBC";

    fn two_booklets() -> ExamConfig {
        let keys: AnswerKey = [
            (Variant::A, KEY_A.to_string()),
            (Variant::B, KEY_B.to_string()),
        ]
        .into_iter()
        .collect();
        ExamConfig::new(25, BookletMode::Two).with_keys(keys)
    }

    #[test]
    fn test_perfect_score_single_booklet() {
        let mut keys = AnswerKey::new();
        keys.insert(Variant::A, KEY_A);
        let exam = ExamConfig::new(25, BookletMode::Single)
            .with_keys(keys)
            .with_points(PointsMode::Fixed(4.0));
        let record = StudentRecord::new("Ayse", Some(Variant::B), KEY_A);
        let scores = score(&record, &exam);
        assert_eq!(scores.len(), 25);
        assert_eq!(scores.total(), 100.0);
    }

    #[test]
    fn test_short_answer_is_padded() {
        let exam = two_booklets();
        // 前 10 题中有 7 题正确
        let record = StudentRecord::new("Ali", Some(Variant::A), "CDBCBCBAAA");
        let scores = score(&record, &exam);
        assert_eq!(scores.len(), 25);
        assert_eq!(scores.total(), 7.0 * 4.0);
        assert!(scores.as_slice()[10..].iter().all(|p| *p == 0.0));
    }

    #[test]
    fn test_padded_positions_never_score() {
        let mut keys = AnswerKey::new();
        keys.insert(Variant::A, "ABCDE_____");
        let exam = ExamConfig::new(10, BookletMode::Single).with_keys(keys);
        let record = StudentRecord::new("Ali", Some(Variant::A), "ABCDE");
        let scores = score(&record, &exam);
        assert_eq!(scores.total(), 50.0);
        assert!(scores.as_slice()[5..].iter().all(|p| *p == 0.0));
    }

    #[test]
    fn test_scored_against_own_variant() {
        let exam = two_booklets();
        let record = StudentRecord::new("Veli", Some(Variant::B), KEY_B);
        let outcome = score_detailed(&record, &exam);
        assert_eq!(outcome.variant, Some(Variant::B));
        assert_eq!(outcome.scores.total(), 100.0);
        assert!(!outcome.used_fallback);
    }

    #[test]
    fn test_sum_equals_matches_times_points() {
        let exam = two_booklets().with_points(PointsMode::Fixed(3.0));
        let answers = "CDBCAAAAAABCCABEBBCAAAAAA";
        let matches = answers
            .chars()
            .zip(KEY_A.chars())
            .filter(|(a, k)| a == k)
            .count();
        let record = StudentRecord::new("Can", Some(Variant::A), answers);
        assert_eq!(score(&record, &exam).total(), matches as f64 * 3.0);
    }

    #[test]
    fn test_missing_key_scores_zero() {
        let exam = ExamConfig::new(25, BookletMode::Two);
        let record = StudentRecord::new("Deniz", Some(Variant::A), KEY_A);
        let outcome = score_detailed(&record, &exam);
        assert!(outcome.missing_key);
        assert_eq!(outcome.scores, ScoreList::zeros(25));
    }

    #[test]
    fn test_variant_without_key_uses_fallback() {
        let mut keys = AnswerKey::new();
        keys.insert(Variant::A, KEY_A);
        let exam = ExamConfig::new(25, BookletMode::Two).with_keys(keys);
        let record = StudentRecord::new("Ece", Some(Variant::B), KEY_A);
        let outcome = score_detailed(&record, &exam);
        assert!(outcome.used_fallback);
        assert_eq!(outcome.variant, Some(Variant::A));
        assert_eq!(outcome.scores.total(), 100.0);
    }

    #[test]
    fn test_short_key_never_matches_missing_positions() {
        let mut keys = AnswerKey::new();
        keys.insert(Variant::A, "CDBCB");
        let exam = ExamConfig::new(10, BookletMode::Single).with_keys(keys);
        let record = StudentRecord::new("Ece", None, "CDBCBCDBCB");
        let scores = score(&record, &exam);
        assert_eq!(scores.correct_count(), 5);
        assert_eq!(scores.total(), 50.0);
    }

    #[test]
    fn test_proportional_points_are_fractional() {
        let mut keys = AnswerKey::new();
        keys.insert(Variant::A, "ABCDABCDAB");
        let mut exam = ExamConfig::new(40, BookletMode::Single).with_keys(keys);
        exam.points = PointsMode::Proportional;
        let record = StudentRecord::new("Ece", None, "ABCD");
        assert_eq!(score(&record, &exam).total(), 10.0);
    }
}
