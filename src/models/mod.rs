pub mod document;
pub mod exam;
pub mod loaders;
pub mod record;

pub use document::{Document, Page, Row, Table};
pub use exam::{AnswerKey, BookletMode, ExamConfig, ExtractionRules, PointsMode, Variant};
pub use loaders::{load_exam_config, parse_exam_config};
pub use record::{
    ExtractionMiss, NormalizedAnswer, RecordBatch, ScoreList, StudentRecord, StudentResult,
};
