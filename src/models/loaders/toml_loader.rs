use crate::error::FileError;
use crate::models::exam::ExamConfig;
use anyhow::Result;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载考试配置
///
/// ```toml
/// question_count = 25
/// booklet_mode = "two"
/// points = "proportional"      # 或 points = { fixed = 4.0 }
/// fallback_variant = "A"
///
/// [keys]
/// A = "CDBCBCBDCBBCCABEBBCABBCBC"
/// B = "BBCBBDBABCBCCCCCAEBCDBBBC"
///
/// [rules]
/// key_scan_pages = 3
/// ```
pub async fn load_exam_config(toml_file_path: &Path) -> Result<ExamConfig> {
    let path = toml_file_path.display().to_string();

    if !fs::try_exists(toml_file_path).await.unwrap_or(false) {
        return Err(FileError::NotFound { path }.into());
    }

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: path.clone(),
            source,
        })?;

    let exam = parse_exam_config(&content).map_err(|source| FileError::TomlParseFailed {
        path: path.clone(),
        source,
    })?;

    tracing::info!(
        "已加载考试配置: {} 题, 卷型模式 {}, {} 份答案",
        exam.question_count,
        exam.booklet_mode,
        exam.keys.len()
    );

    Ok(exam)
}

/// 解析 TOML 文本（不做业务校验）
pub fn parse_exam_config(content: &str) -> std::result::Result<ExamConfig, toml::de::Error> {
    toml::from_str(content)
}
