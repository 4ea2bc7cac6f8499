//! 文档模型
//!
//! 读取后的文档：按页保存文本行和识别出的表格。单元格为 `None`
//! 表示表格中该位置为空。

use serde::{Deserialize, Serialize};

/// 表格的一行
pub type Row = Vec<Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// 所有非空单元格
    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flat_map(|row| row.iter().flatten().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Page {
    /// 页码（从 0 开始）
    pub index: usize,
    pub lines: Vec<String>,
    pub tables: Vec<Table>,
}

impl Page {
    pub fn has_content(&self) -> bool {
        self.lines.iter().any(|l| !l.trim().is_empty()) || self.tables.iter().any(|t| !t.rows.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn table_count(&self) -> usize {
        self.pages.iter().map(|p| p.tables.len()).sum()
    }

    /// 文档中没有任何文本或表格
    pub fn is_empty(&self) -> bool {
        !self.pages.iter().any(Page::has_content)
    }

    /// 全部文本，页之间以空行分隔（用于 LLM 辅助识别）
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// 所有表格的所有行
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.pages
            .iter()
            .flat_map(|p| p.tables.iter())
            .flat_map(|t| t.rows.iter())
    }
}
