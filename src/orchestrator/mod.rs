//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次判分任务的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量判分处理器
//! - 管理应用生命周期（初始化、运行）
//! - 校验考试配置、读取文档、选择答案与学生记录来源
//! - 控制并发数量（Semaphore + spawn_blocking）
//! - 输出全局统计信息，写入警告文件
//!
//! ### `archive` - 压缩包输出
//! - 为每名学生生成唯一的文件名
//! - 写入 SVG 成绩图和 summary.json
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<StudentRecord>)
//!     ↓
//! workflow::GradingFlow (处理单个学生)
//!     ↓
//! services (能力层：识别 / 判分 / 渲染 / llm / warn)
//!     ↓
//! infrastructure (基础设施：DocumentReader)
//! ```

pub mod archive;
pub mod batch_processor;

// 重新导出主要类型
pub use archive::{write_archive, EntryNamer};
pub use batch_processor::{App, GradeRequest, GradeSummary, PreparedExam};
