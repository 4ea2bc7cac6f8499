//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

/// 警告写入服务
///
/// 职责：
/// - 把需要操作员处理的问题（缺少答案、使用默认卷型、跳过的行）追加到 warn.txt
/// - 每条警告一行，带上所属对象（学生姓名或"文档"）
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用指定的文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 写入同一对象的多条警告
    pub async fn write_all(&self, subject: &str, messages: &[String]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        debug!("写入 {} 条警告: {}", messages.len(), subject);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .with_context(|| format!("无法打开警告文件: {}", self.warn_file_path))?;

        let mut buf = String::new();
        for message in messages {
            buf.push_str(&format!("{} | {}\n", subject, message));
        }
        file.write_all(buf.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_appends_lines() {
        let path = std::env::temp_dir().join(format!("exam_grader_warn_{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let writer = WarnWriter::with_path(path.to_string_lossy());

        writer
            .write_all("Ayse Yilmaz", &["B 卷没有答案，使用 A 卷判分".to_string()])
            .await
            .unwrap();
        writer
            .write_all("文档", &["跳过 3 行".to_string(), "没有答案".to_string()])
            .await
            .unwrap();
        writer.write_all("nobody", &[]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Ayse Yilmaz | B 卷没有答案，使用 A 卷判分");
        assert_eq!(lines[2], "文档 | 没有答案");
        let _ = std::fs::remove_file(&path);
    }
}
