//! # Exam Grader
//!
//! 从考试结果文档中识别学生作答、按卷型判分并生成成绩图的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 把文件变成文档模型，只暴露能力
//! - `DocumentReader` - PDF / 文本读取，按页识别表格
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，都是纯函数或单一能力
//! - `rules` - 命名的识别规则（作答单元格、姓名、卷型标记）
//! - `key_extractor` / `record_extractor` - 答案与学生记录识别
//! - `key_source` - 答案来源（手动 / 自动 / LLM）
//! - `scorer` / `normalizer` - 判分
//! - `report_renderer` - SVG 成绩图
//! - `LlmService` - LLM 辅助识别能力
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一名学生"的完整处理流程
//! - `StudentCtx` - 上下文封装（序号 + 文件名）
//! - `GradingFlow` - 流程编排（判分 → 渲染 → 警告）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量判分处理器，管理配置校验和并发
//! - `orchestrator/archive` - 压缩包输出
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::DocumentReader;
pub use models::{AnswerKey, BookletMode, Document, ExamConfig, PointsMode, StudentRecord, Variant};
pub use orchestrator::{App, GradeRequest, GradeSummary, PreparedExam};
pub use workflow::{GradedStudent, GradingFlow, StudentCtx};
