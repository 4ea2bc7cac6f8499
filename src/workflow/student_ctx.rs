//! 学生处理上下文
//!
//! 封装"我正在处理第几名学生、结果写到哪个文件"这一信息

use std::fmt::Display;

/// 学生处理上下文
#[derive(Debug, Clone)]
pub struct StudentCtx {
    /// 学生在文档中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 压缩包中的文件名（已去重）
    pub file_name: String,
}

impl StudentCtx {
    pub fn new(index: usize, file_name: impl Into<String>) -> Self {
        Self {
            index,
            file_name: file_name.into(),
        }
    }
}

impl Display for StudentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[学生 #{} {}]", self.index, self.file_name)
    }
}
