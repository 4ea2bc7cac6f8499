use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::exam::Variant;

/// 未能识别姓名时使用的占位名
pub const UNKNOWN_NAME: &str = "Unknown";

/// 补齐作答串时使用的占位字符，不会与任何答案字母相同
pub const SENTINEL: char = '_';

/// 一名学生的作答记录，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    /// 卷型；None 表示未识别
    pub booklet_variant: Option<Variant>,
    pub raw_answers: String,
}

impl StudentRecord {
    pub fn new(
        name: impl Into<String>,
        booklet_variant: Option<Variant>,
        raw_answers: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            booklet_variant,
            raw_answers: raw_answers.into(),
        }
    }
}

impl fmt::Display for StudentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = self
            .booklet_variant
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        write!(f, "{} [卷型 {}] {}", self.name, variant, self.raw_answers)
    }
}

/// 规范化后的作答串，长度等于题目数量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAnswer(Vec<char>);

impl NormalizedAnswer {
    pub(crate) fn from_chars(chars: Vec<char>) -> Self {
        Self(chars)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.0.get(index).copied()
    }
}

impl fmt::Display for NormalizedAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0 {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// 每题得分，按题号排列
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreList(Vec<f64>);

impl ScoreList {
    pub fn new(scores: Vec<f64>) -> Self {
        Self(scores)
    }

    /// 全部为 0 的得分列表
    pub fn zeros(question_count: usize) -> Self {
        Self(vec![0.0; question_count])
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 得分大于 0 的题目数
    pub fn correct_count(&self) -> usize {
        self.0.iter().filter(|p| **p > 0.0).count()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// 一行表格未能识别为学生记录的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ExtractionMiss {
    /// 非空单元格太少
    TooFewCells,
    /// 没有像作答串的单元格
    NoAnswerCell,
    /// 清洗后的作答串太短
    AnswerTooShort,
}

impl fmt::Display for ExtractionMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMiss::TooFewCells => write!(f, "单元格数量不足"),
            ExtractionMiss::NoAnswerCell => write!(f, "没有作答单元格"),
            ExtractionMiss::AnswerTooShort => write!(f, "作答串过短"),
        }
    }
}

/// 记录识别结果：成功的记录 + 按原因统计的跳过行数
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    pub records: Vec<StudentRecord>,
    pub misses: BTreeMap<ExtractionMiss, usize>,
}

impl RecordBatch {
    pub fn push(&mut self, outcome: Result<StudentRecord, ExtractionMiss>) {
        match outcome {
            Ok(record) => self.records.push(record),
            Err(miss) => *self.misses.entry(miss).or_insert(0) += 1,
        }
    }

    pub fn miss_count(&self) -> usize {
        self.misses.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<StudentRecord>> for RecordBatch {
    fn from(records: Vec<StudentRecord>) -> Self {
        Self {
            records,
            misses: BTreeMap::new(),
        }
    }
}

/// 单个学生的判分结果，写入 summary.json
#[derive(Debug, Clone, Serialize)]
pub struct StudentResult {
    pub name: String,
    pub file_name: String,
    pub variant: Option<Variant>,
    pub total: f64,
    pub correct: usize,
    pub scores: ScoreList,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_list_total() {
        let scores = ScoreList::new(vec![4.0, 0.0, 4.0, 2.5]);
        assert_eq!(scores.total(), 10.5);
        assert_eq!(scores.correct_count(), 3);
        assert_eq!(ScoreList::zeros(5).total(), 0.0);
    }

    #[test]
    fn test_record_batch_counts_misses() {
        let mut batch = RecordBatch::default();
        batch.push(Err(ExtractionMiss::TooFewCells));
        batch.push(Err(ExtractionMiss::TooFewCells));
        batch.push(Err(ExtractionMiss::AnswerTooShort));
        batch.push(Ok(StudentRecord::new("Ayse Yilmaz", Some(Variant::A), "ABCDABCDAB")));
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.miss_count(), 3);
        assert_eq!(batch.misses[&ExtractionMiss::TooFewCells], 2);
    }
}
