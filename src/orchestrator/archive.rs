//! 压缩包输出
//!
//! 每名学生一个 SVG 成绩图，外加 `summary.json`。文件名由学生姓名生成，
//! 不安全的字符替换为 `_`，重名时追加 `_2`、`_3`…

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::FileError;
use crate::models::StudentResult;
use crate::workflow::GradedStudent;

pub const SUMMARY_FILE: &str = "summary.json";
const REPORT_EXTENSION: &str = "svg";

/// 生成压缩包内唯一的文件名
pub struct EntryNamer {
    unsafe_chars: Regex,
    used: HashSet<String>,
}

impl EntryNamer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            unsafe_chars: Regex::new(r"[^\w\-]+")?,
            used: HashSet::new(),
        })
    }

    /// 只保留字母、数字、`_` 和 `-`
    pub fn sanitize(&self, name: &str) -> String {
        let cleaned = self.unsafe_chars.replace_all(name.trim(), "_");
        let cleaned = cleaned.trim_matches('_');
        if cleaned.is_empty() {
            "student".to_string()
        } else {
            cleaned.to_string()
        }
    }

    /// 为学生分配文件名（带扩展名），与已分配的名字不重复
    pub fn assign(&mut self, student: &str) -> String {
        let stem = self.sanitize(student);
        let mut candidate = format!("{}.{}", stem, REPORT_EXTENSION);
        let mut n = 2;
        while self.used.contains(&candidate.to_lowercase()) {
            candidate = format!("{}_{}.{}", stem, n, REPORT_EXTENSION);
            n += 1;
        }
        self.used.insert(candidate.to_lowercase());
        candidate
    }
}

/// 压缩包路径：`<output_dir>/<文档名>_results.zip`
pub fn archive_path(output_dir: &str, document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("exam");
    Path::new(output_dir).join(format!("{}_results.zip", stem))
}

/// 写入压缩包
pub fn write_archive(path: &Path, students: &[GradedStudent]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("无法创建输出目录: {}", parent.display()))?;
    }

    let file = File::create(path).map_err(|source| FileError::WriteFailed {
        path: path.display().to_string(),
        source,
    })?;

    write_entries(file, students)?;

    info!("📦 已写入压缩包: {} ({} 名学生)", path.display(), students.len());
    Ok(())
}

/// 写入任意 writer（测试中写入内存）
pub fn write_entries<W: Write + std::io::Seek>(writer: W, students: &[GradedStudent]) -> Result<W> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    for student in students {
        zip.start_file(student.result.file_name.as_str(), options)
            .map_err(|source| FileError::ArchiveFailed { source })?;
        zip.write_all(student.svg.as_bytes())?;
    }

    let summary: Vec<&StudentResult> = students.iter().map(|s| &s.result).collect();
    zip.start_file(SUMMARY_FILE, options)
        .map_err(|source| FileError::ArchiveFailed { source })?;
    zip.write_all(&serde_json::to_vec_pretty(&summary)?)?;

    let writer = zip
        .finish()
        .map_err(|source| FileError::ArchiveFailed { source })?;
    Ok(writer)
}
