//! 判分流程 - 流程层
//!
//! 核心职责：定义"一名学生"的完整处理流程
//!
//! 流程顺序：
//! 1. 确定卷型 → 判分
//! 2. 渲染成绩图
//! 3. 汇总警告（缺少答案、使用默认卷型）

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::RenderError;
use crate::models::{ExamConfig, StudentRecord, StudentResult};
use crate::services::report_renderer::ReportRenderer;
use crate::services::scorer::{score_detailed, ScoreOutcome};
use crate::workflow::student_ctx::StudentCtx;

/// 一名学生的处理结果
#[derive(Debug, Clone)]
pub struct GradedStudent {
    pub result: StudentResult,
    /// SVG 成绩图
    pub svg: String,
}

/// 判分流程
///
/// - 只处理单个学生，不关心并发和打包
/// - 不做 IO，可以放在 `spawn_blocking` 中执行
#[derive(Debug, Clone)]
pub struct GradingFlow {
    exam: Arc<ExamConfig>,
    renderer: ReportRenderer,
}

impl GradingFlow {
    pub fn new(exam: Arc<ExamConfig>) -> Self {
        Self {
            exam,
            renderer: ReportRenderer::new(),
        }
    }

    pub fn run(&self, record: &StudentRecord, ctx: &StudentCtx) -> Result<GradedStudent, RenderError> {
        let outcome = score_detailed(record, &self.exam);
        let warnings = self.collect_warnings(record, &outcome);
        for message in &warnings {
            warn!("{} ⚠️ {}", ctx, message);
        }

        let svg = self.renderer.render(&record.name, &outcome.scores)?;
        debug!(
            "{} ✓ 总分 {} (正确 {} 题)",
            ctx,
            outcome.scores.total(),
            outcome.scores.correct_count()
        );

        Ok(GradedStudent {
            result: StudentResult {
                name: record.name.clone(),
                file_name: ctx.file_name.clone(),
                variant: outcome.variant,
                total: outcome.scores.total(),
                correct: outcome.scores.correct_count(),
                scores: outcome.scores,
                warnings,
            },
            svg,
        })
    }

    fn collect_warnings(&self, record: &StudentRecord, outcome: &ScoreOutcome) -> Vec<String> {
        let mut warnings = Vec::new();
        let fallback = self.exam.fallback_variant;

        if outcome.used_fallback {
            match record.booklet_variant {
                Some(variant) if variant == fallback => {}
                Some(variant) => warnings.push(format!(
                    "{} 卷没有答案，改用默认卷型 {} 判分",
                    variant, fallback
                )),
                None => warnings.push(format!("未识别到卷型，使用默认卷型 {} 判分", fallback)),
            }
        }
        if outcome.missing_key {
            warnings.push(format!(
                "{} 卷没有答案，得分全部为 0",
                outcome.variant.unwrap_or(fallback)
            ));
        }

        warnings
    }
}
