pub mod grading_flow;
pub mod student_ctx;

pub use grading_flow::{GradedStudent, GradingFlow};
pub use student_ctx::StudentCtx;
