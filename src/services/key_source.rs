//! 答案来源与学生记录来源
//!
//! 判分只关心"答案"和"学生记录"，不关心它们来自哪里：
//! - 答案：考试配置（手动）、文档识别（自动）、LLM 辅助识别
//! - 学生记录：文档识别、LLM 辅助识别

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::models::{AnswerKey, Document, ExamConfig, RecordBatch};
use crate::services::key_extractor::extract_keys;
use crate::services::llm_service::AssistedExtraction;
use crate::services::record_extractor::extract_records;

/// 答案来源
pub trait KeySource {
    fn name(&self) -> &'static str;

    /// 给出各卷型的答案；找不到时返回空的 [`AnswerKey`]
    fn resolve(&self, document: &Document, exam: &ExamConfig) -> AnswerKey;
}

/// 学生记录来源
pub trait RecordSource {
    fn name(&self) -> &'static str;

    fn records(&self, document: &Document, exam: &ExamConfig) -> RecordBatch;
}

/// 使用考试配置中填写的答案
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualKeys;

impl KeySource for ManualKeys {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn resolve(&self, _document: &Document, exam: &ExamConfig) -> AnswerKey {
        exam.keys.clone()
    }
}

/// 在文档中查找答案行
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicKeys;

impl KeySource for HeuristicKeys {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn resolve(&self, document: &Document, exam: &ExamConfig) -> AnswerKey {
        extract_keys(document, exam)
    }
}

/// 逐行识别文档表格
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicRecords;

impl RecordSource for HeuristicRecords {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn records(&self, document: &Document, exam: &ExamConfig) -> RecordBatch {
        extract_records(document, exam)
    }
}

impl KeySource for AssistedExtraction {
    fn name(&self) -> &'static str {
        "assisted"
    }

    fn resolve(&self, _document: &Document, _exam: &ExamConfig) -> AnswerKey {
        self.keys.clone()
    }
}

impl RecordSource for AssistedExtraction {
    fn name(&self) -> &'static str {
        "assisted"
    }

    fn records(&self, _document: &Document, _exam: &ExamConfig) -> RecordBatch {
        RecordBatch::from(self.records.clone())
    }
}

/// 命令行 / 配置中选择的数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// 答案来自考试配置，学生记录来自文档识别
    Manual,
    /// 答案和学生记录都来自文档识别
    #[default]
    Auto,
    /// 答案和学生记录都来自 LLM
    Assisted,
}

impl SourceKind {
    pub fn needs_llm(self) -> bool {
        matches!(self, SourceKind::Assisted)
    }

    /// 手动模式要求考试配置中答案齐全
    pub fn requires_complete_keys(self) -> bool {
        matches!(self, SourceKind::Manual)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceKind::Manual => "manual",
            SourceKind::Auto => "auto",
            SourceKind::Assisted => "assisted",
        };
        write!(f, "{}", name)
    }
}

/// 解析最终答案：来源给出的答案，再用考试配置中手动填写的答案逐卷覆盖
pub fn resolve_keys(source: &dyn KeySource, document: &Document, exam: &ExamConfig) -> AnswerKey {
    source.resolve(document, exam).overridden_by(&exam.keys)
}
