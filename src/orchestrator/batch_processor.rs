//! 批量判分处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次判分任务的调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **配置校验**：题目数量、卷型、默认卷型、答案是否齐全
//! 2. **读取文档**：PDF / 文本 → `Document`
//! 3. **答案与学生记录**：按所选来源识别，手动答案逐卷覆盖
//! 4. **并发判分**：使用 Semaphore 限制并发数量，结果保持文档顺序
//! 5. **打包输出**：SVG 成绩图 + summary.json
//! 6. **全局统计**：汇总结果并写入警告文件

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, ConfigError, DocumentError};
use crate::infrastructure::DocumentReader;
use crate::models::{ExamConfig, RecordBatch, StudentResult};
use crate::orchestrator::archive::{self, EntryNamer};
use crate::services::key_source::{
    resolve_keys, HeuristicKeys, HeuristicRecords, ManualKeys, RecordSource, SourceKind,
};
use crate::services::{LlmService, WarnWriter};
use crate::utils::logging;
use crate::workflow::{GradedStudent, GradingFlow, StudentCtx};

/// 警告文件中文档级警告的标识
const DOCUMENT_SUBJECT: &str = "文档";

/// 一次判分任务
#[derive(Debug, Clone)]
pub struct GradeRequest {
    pub document: PathBuf,
    pub exam: ExamConfig,
    pub source: SourceKind,
}

/// 判分前准备好的数据：答案已确定，学生记录已识别
#[derive(Debug, Clone)]
pub struct PreparedExam {
    /// 使用最终答案的考试配置
    pub exam: ExamConfig,
    pub batch: RecordBatch,
    /// 文档级警告（缺少答案、跳过的行）
    pub warnings: Vec<String>,
}

/// 判分结果汇总
#[derive(Debug, Clone)]
pub struct GradeSummary {
    pub archive: PathBuf,
    pub results: Vec<StudentResult>,
    pub failed: usize,
    pub warnings: usize,
}

/// 应用主结构
pub struct App {
    config: Config,
    reader: DocumentReader,
    warn_writer: WarnWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(config.max_concurrent_students);

        Ok(Self {
            reader: DocumentReader::new()?,
            warn_writer: WarnWriter::with_path(&config.warn_file),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行完整的判分流程
    pub async fn run(&self, request: GradeRequest) -> Result<GradeSummary> {
        let prepared = self.prepare(&request).await?;
        let PreparedExam {
            exam,
            batch,
            warnings: document_warnings,
        } = prepared;

        logging::log_students_loaded(
            batch.records.len(),
            batch.miss_count(),
            self.config.max_concurrent_students,
        );

        let graded = self.grade_all(Arc::new(exam), batch).await?;
        let failed = graded.iter().filter(|g| g.is_none()).count();
        let graded: Vec<GradedStudent> = graded.into_iter().flatten().collect();
        logging::log_batch_complete(graded.len(), graded.len() + failed);

        let archive_path = archive::archive_path(&self.config.output_dir, &request.document);
        archive::write_archive(&archive_path, &graded)?;

        let warnings = self.write_warnings(&document_warnings, &graded).await;

        logging::print_final_stats(
            graded.len(),
            failed,
            warnings,
            &archive_path.display().to_string(),
            &self.config.output_log_file,
        );

        Ok(GradeSummary {
            archive: archive_path,
            results: graded.into_iter().map(|g| g.result).collect(),
            failed,
            warnings,
        })
    }

    /// 校验配置、读取文档、确定答案并识别学生记录；没有学生记录时返回错误
    pub async fn prepare(&self, request: &GradeRequest) -> Result<PreparedExam> {
        let prepared = self.extract(request).await?;

        if prepared.batch.is_empty() {
            return Err(DocumentError::NoRecords {
                misses: prepared.batch.miss_count(),
            }
            .into());
        }

        for message in &prepared.warnings {
            warn!("⚠️ {}", message);
        }

        Ok(prepared)
    }

    /// 校验配置、读取文档、确定答案并识别学生记录
    pub async fn extract(&self, request: &GradeRequest) -> Result<PreparedExam> {
        let mut exam = request.exam.clone();
        self.check_config(&exam, request.source)?;

        let document = self
            .reader
            .read(&request.document)
            .with_context(|| format!("处理文档失败: {}", request.document.display()))?;

        let (keys, batch) = match request.source {
            SourceKind::Manual => (
                resolve_keys(&ManualKeys, &document, &exam),
                HeuristicRecords.records(&document, &exam),
            ),
            SourceKind::Auto => (
                resolve_keys(&HeuristicKeys, &document, &exam),
                HeuristicRecords.records(&document, &exam),
            ),
            SourceKind::Assisted => {
                let extraction = LlmService::new(&self.config)
                    .extract_exam_data(&document.full_text(), &exam)
                    .await?;
                (
                    resolve_keys(&extraction, &document, &exam),
                    extraction.records(&document, &exam),
                )
            }
        };
        exam.keys = keys;

        let warnings = document_warnings(&exam, &batch);
        Ok(PreparedExam {
            exam,
            batch,
            warnings,
        })
    }

    /// 配置错误在读取文档之前返回，调用方可用 [`crate::AppError::is_configuration`] 区分
    fn check_config(&self, exam: &ExamConfig, source: SourceKind) -> AppResult<()> {
        exam.validate()?;
        if source.requires_complete_keys() {
            exam.require_complete_keys()?;
        }
        if source.needs_llm() && !self.config.has_llm_credentials() {
            return Err(ConfigError::MissingApiKey {
                var_name: "LLM_API_KEY".to_string(),
            }
            .into());
        }
        info!(
            "📝 {} 题, 卷型模式 {}, 每题 {} 分, 数据来源 {}",
            exam.question_count,
            exam.booklet_mode,
            exam.points_per_question(),
            source
        );
        Ok(())
    }

    /// 并发判分，返回值与学生记录一一对应（失败的为 None）
    async fn grade_all(
        &self,
        exam: Arc<ExamConfig>,
        batch: RecordBatch,
    ) -> Result<Vec<Option<GradedStudent>>> {
        // 并发数为 0 时 acquire 永远等待
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_students.max(1)));
        let flow = GradingFlow::new(exam);
        let mut namer = EntryNamer::new()?;
        let mut handles = Vec::with_capacity(batch.records.len());

        for (idx, record) in batch.records.into_iter().enumerate() {
            let ctx = StudentCtx::new(idx + 1, namer.assign(&record.name));
            let permit = semaphore.clone().acquire_owned().await?;
            let flow = flow.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let outcome = flow.run(&record, &ctx);
                (ctx, outcome)
            });
            handles.push(handle);
        }

        // join_all 保持提交顺序
        let mut graded = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            match joined {
                Ok((_, Ok(student))) => graded.push(Some(student)),
                Ok((ctx, Err(e))) => {
                    error!("{} ❌ {}", ctx, e);
                    graded.push(None);
                }
                Err(e) => {
                    error!("❌ 判分任务执行失败: {}", e);
                    graded.push(None);
                }
            }
        }

        Ok(graded)
    }

    /// 写入警告文件，返回警告总数。写入失败只记录日志。
    async fn write_warnings(&self, document_warnings: &[String], graded: &[GradedStudent]) -> usize {
        let entries = std::iter::once((DOCUMENT_SUBJECT, document_warnings)).chain(
            graded
                .iter()
                .map(|g| (g.result.name.as_str(), g.result.warnings.as_slice())),
        );

        let mut total = 0;
        for (subject, messages) in entries {
            total += messages.len();
            if let Err(e) = self.warn_writer.write_all(subject, messages).await {
                error!("❌ 无法写入警告文件 {}: {}", self.warn_writer.path(), e);
            }
        }

        total
    }
}

/// 文档级警告：缺少答案的卷型、跳过的行
fn document_warnings(exam: &ExamConfig, batch: &RecordBatch) -> Vec<String> {
    let mut warnings = Vec::new();

    let missing = exam.keys.missing_for(exam.booklet_mode);
    if !missing.is_empty() {
        let labels: Vec<String> = missing.iter().map(|v| v.to_string()).collect();
        warnings.push(format!(
            "未找到 {} 卷答案，使用这些卷型的学生得分为 0",
            labels.join(", ")
        ));
    }

    if batch.miss_count() > 0 {
        let details: Vec<String> = batch
            .misses
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect();
        warnings.push(format!(
            "跳过 {} 行无法识别的表格行 ({})",
            batch.miss_count(),
            details.join(", ")
        ));
    }

    warnings
}
