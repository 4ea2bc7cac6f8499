//! 文档读取器 - 基础设施层
//!
//! 只负责"把文件变成 [`Document`]"，不认识学生或答案。
//!
//! - PDF 通过 [`pdf_extract`] 按页提取文本。`pdf_extract` 遇到损坏的文件
//!   可能直接 panic，所以调用包在 [`std::panic::catch_unwind`] 中。
//! - `.txt` 文本按换页符 (`\x0c`) 分页。
//!
//! 表格识别基于文本列：以制表符、两个以上空格或 `|` 分隔出两个及以上
//! 单元格的连续行组成一张表格。

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::error::DocumentError;
use crate::models::{Document, Page, Row, Table};

const FORM_FEED: char = '\x0c';

/// 文档读取器
pub struct DocumentReader {
    column_gap: Regex,
}

impl DocumentReader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            column_gap: Regex::new(r"\t+|\s{2,}")?,
        })
    }

    /// 按扩展名读取 PDF 或文本文件
    pub fn read(&self, path: &Path) -> Result<Document> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);

        let document = match extension.as_deref() {
            Some("pdf") => {
                let data = std::fs::read(path)
                    .with_context(|| format!("无法读取PDF文件: {}", path.display()))?;
                self.from_pdf_bytes(&data)?
            }
            Some("txt") => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("无法读取文本文件: {}", path.display()))?;
                self.from_text(&text)
            }
            _ => {
                return Err(DocumentError::UnsupportedFormat {
                    path: path.display().to_string(),
                }
                .into())
            }
        };

        if document.is_empty() {
            return Err(DocumentError::Empty {
                path: path.display().to_string(),
            }
            .into());
        }

        info!(
            "📄 已读取文档: {} 页, {} 个表格",
            document.page_count(),
            document.table_count()
        );

        Ok(document)
    }

    pub fn from_pdf_bytes(&self, data: &[u8]) -> Result<Document> {
        let pages = extract_pdf_pages(data)?;
        Ok(Document::new(
            pages
                .iter()
                .enumerate()
                .map(|(index, text)| self.build_page(index, text))
                .collect(),
        ))
    }

    pub fn from_text(&self, text: &str) -> Document {
        Document::new(
            text.split(FORM_FEED)
                .enumerate()
                .map(|(index, page)| self.build_page(index, page))
                .collect(),
        )
    }

    fn build_page(&self, index: usize, raw: &str) -> Page {
        let lines: Vec<String> = raw
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();

        let tables = self.detect_tables(&lines);
        debug!("第 {} 页: {} 行文本, {} 个表格", index + 1, lines.len(), tables.len());

        Page {
            index,
            lines,
            tables,
        }
    }

    /// 连续的多列行组成一张表格
    fn detect_tables(&self, lines: &[String]) -> Vec<Table> {
        let mut tables = Vec::new();
        let mut current: Vec<Row> = Vec::new();

        for line in lines {
            match self.split_cells(line) {
                Some(row) => current.push(row),
                None if !current.is_empty() => tables.push(Table::new(std::mem::take(&mut current))),
                None => {}
            }
        }
        if !current.is_empty() {
            tables.push(Table::new(current));
        }

        tables
    }

    /// 把一行拆成单元格；不足两列时返回 None
    pub fn split_cells(&self, line: &str) -> Option<Row> {
        let raw_cells: Vec<&str> = if line.contains('|') {
            let trimmed = line.trim();
            let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
            let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
            trimmed.split('|').collect()
        } else {
            self.column_gap.split(line.trim()).collect()
        };

        if raw_cells.len() < 2 {
            return None;
        }

        Some(
            raw_cells
                .into_iter()
                .map(|cell| {
                    let cell = cell.trim();
                    (!cell.is_empty()).then(|| cell.to_string())
                })
                .collect(),
        )
    }
}

/// 按页提取 PDF 文本，底层库的 panic 转换为错误
fn extract_pdf_pages(data: &[u8]) -> Result<Vec<String>> {
    let data = data.to_vec();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&data)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(DocumentError::ExtractionFailed {
            message: e.to_string(),
        }
        .into()),
        Err(_) => Err(DocumentError::ExtractionFailed {
            message: "PDF解析过程中发生 panic (文件可能已损坏)".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> DocumentReader {
        DocumentReader::new().unwrap()
    }

    #[test]
    fn test_split_cells_by_spaces() {
        let row = reader()
            .split_cells("1   1024   Ayse Yilmaz   CDBCBCBDCBBCCABEBBCABBCBC A")
            .unwrap();
        assert_eq!(row.len(), 4);
        assert_eq!(row[2].as_deref(), Some("Ayse Yilmaz"));
        assert_eq!(row[3].as_deref(), Some("CDBCBCBDCBBCCABEBBCABBCBC A"));
    }

    #[test]
    fn test_split_cells_by_pipes_keeps_empty_cells() {
        let row = reader().split_cells("| 1 |  | Ali Veli | ABCD |").unwrap();
        assert_eq!(
            row,
            vec![
                Some("1".to_string()),
                None,
                Some("Ali Veli".to_string()),
                Some("ABCD".to_string())
            ]
        );
    }

    #[test]
    fn test_single_column_line_is_not_a_row() {
        assert!(reader().split_cells("Sinav Sonuclari").is_none());
    }

    #[test]
    fn test_from_text_detects_tables_per_page() {
        let text = "Title line\n1  Ali  ABCDABCDABCD\n2  Veli  DCBADCBADCBA\nfooter\n\x0cSecond page\n3\tAyse\tAAAABBBBCCCC\n";
        let doc = reader().from_text(text);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0].tables.len(), 1);
        assert_eq!(doc.pages[0].tables[0].rows.len(), 2);
        assert_eq!(doc.pages[1].tables[0].rows[0].len(), 3);
        assert_eq!(doc.rows().count(), 3);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = reader().read(Path::new("results.docx")).unwrap_err();
        assert!(err.to_string().contains("不支持的文件类型"));
    }

    #[test]
    fn test_garbage_pdf_is_an_error() {
        assert!(reader().from_pdf_bytes(b"not a pdf at all").is_err());
    }
}
