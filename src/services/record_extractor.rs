//! 学生记录识别
//!
//! 遍历文档中所有表格的每一行，按 [`rules`] 中的规则找出姓名、卷型和
//! 作答串。每一行的结果是 `Result<StudentRecord, ExtractionMiss>`，
//! 识别失败的行只计数，不会中断整个扫描。

use tracing::{debug, info};

use crate::models::record::UNKNOWN_NAME;
use crate::models::{Document, ExamConfig, ExtractionMiss, RecordBatch, Row, StudentRecord};
use crate::services::rules::{self, MarkerMatcher};

/// 识别一行表格
pub fn extract_row(
    row: &Row,
    exam: &ExamConfig,
    marker: &MarkerMatcher,
) -> Result<StudentRecord, ExtractionMiss> {
    let cells: Vec<&str> = row.iter().flatten().map(String::as_str).collect();

    if !rules::has_min_cells(&cells, exam.rules.min_row_cells) {
        return Err(ExtractionMiss::TooFewCells);
    }

    let answer_index =
        rules::pick_answer_cell(&cells, &exam.rules, marker).ok_or(ExtractionMiss::NoAnswerCell)?;
    let answer_cell = cells[answer_index];

    let name = rules::pick_name(&cells, answer_index, marker)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());

    let variant = rules::detect_variant(
        answer_cell,
        exam.active_variants(),
        exam.rules.variant_tail_window,
    )
    .unwrap_or(exam.fallback_variant);

    let answers = rules::clean_answers(answer_cell, variant, exam.question_count);
    if answers.chars().count() < exam.rules.min_answer_len {
        return Err(ExtractionMiss::AnswerTooShort);
    }

    Ok(StudentRecord::new(name, Some(variant), answers))
}

/// 识别文档中的全部学生记录（不去重）
pub fn extract_records(document: &Document, exam: &ExamConfig) -> RecordBatch {
    let marker = MarkerMatcher::from_rules(&exam.rules);
    let mut batch = RecordBatch::default();

    for row in document.rows() {
        let outcome = extract_row(row, exam, &marker);
        if let Err(miss) = &outcome {
            debug!("跳过一行 ({}): {:?}", miss, row);
        }
        batch.push(outcome);
    }

    info!(
        "👥 识别到 {} 名学生, 跳过 {} 行",
        batch.records.len(),
        batch.miss_count()
    );

    batch
}
