pub mod key_extractor;
pub mod key_source;
pub mod llm_service;
pub mod normalizer;
pub mod record_extractor;
pub mod report_renderer;
pub mod rules;
pub mod scorer;
pub mod warn_writer;

pub use key_extractor::extract_keys;
pub use key_source::{
    resolve_keys, HeuristicKeys, HeuristicRecords, KeySource, ManualKeys, RecordSource, SourceKind,
};
pub use llm_service::{AssistedExtraction, LlmService};
pub use normalizer::normalize;
pub use record_extractor::extract_records;
pub use report_renderer::{format_points, render_report, ReportRenderer};
pub use scorer::{score, score_detailed, ScoreOutcome};
pub use warn_writer::WarnWriter;
