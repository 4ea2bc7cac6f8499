//! 成绩图渲染
//!
//! 把一名学生的得分画成 SVG 表格：每 20 题一段，每段两行（题号 / 得分），
//! 顶部是姓名和总分。

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, TextStyle};

use crate::error::RenderError;
use crate::models::ScoreList;

/// 每段显示的题目数
pub const COLUMNS_PER_CHUNK: usize = 20;

const CELL_W: u32 = 46;
const CELL_H: u32 = 28;
const MARGIN: u32 = 20;
const HEADER_H: u32 = 76;
const CHUNK_GAP: u32 = 12;

/// 分值格式：保留两位小数并去掉末尾的 0（4.00 → 4，2.50 → 2.5）
pub fn format_points(points: f64) -> String {
    let formatted = format!("{:.2}", points);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// 成绩图渲染器
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    columns: usize,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self {
            columns: COLUMNS_PER_CHUNK,
        }
    }

    /// 自定义每段题目数
    pub fn with_columns(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
        }
    }

    /// 渲染为 SVG 文本
    pub fn render(&self, name: &str, scores: &ScoreList) -> Result<String, RenderError> {
        let fail = |e: &dyn std::fmt::Display| RenderError {
            student: name.to_string(),
            message: e.to_string(),
        };

        let chunks = scores.len().div_ceil(self.columns).max(1);
        let width = MARGIN * 2 + self.columns as u32 * CELL_W;
        let height = HEADER_H + chunks as u32 * (2 * CELL_H + CHUNK_GAP) + MARGIN;

        let title_style = ("sans-serif", 20)
            .into_font()
            .style(FontStyle::Bold)
            .color(&BLUE)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let number_style = ("sans-serif", 13)
            .into_font()
            .style(FontStyle::Bold)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let points_style = number_style.color(&RED);

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(|e| fail(&e))?;

            let center = (width / 2) as i32;
            root.draw(&Text::new(name.to_string(), (center, 24), title_style.clone()))
                .map_err(|e| fail(&e))?;
            root.draw(&Text::new(
                format!("TOTAL: {}", format_points(scores.total())),
                (center, 52),
                title_style,
            ))
            .map_err(|e| fail(&e))?;

            let values = scores.as_slice();
            for chunk in 0..chunks {
                let top = HEADER_H + chunk as u32 * (2 * CELL_H + CHUNK_GAP);
                for column in 0..self.columns {
                    let question = chunk * self.columns + column;
                    let Some(points) = values.get(question) else {
                        // 最后一段不足的位置留空，不画边框
                        break;
                    };
                    let left = MARGIN + column as u32 * CELL_W;
                    draw_cell(&root, left, top, &(question + 1).to_string(), &number_style)
                        .map_err(|e| fail(&e))?;
                    draw_cell(&root, left, top + CELL_H, &format_points(*points), &points_style)
                        .map_err(|e| fail(&e))?;
                }
            }

            root.present().map_err(|e| fail(&e))?;
        }

        Ok(svg)
    }
}

/// 使用默认布局渲染
pub fn render_report(name: &str, scores: &ScoreList) -> Result<String, RenderError> {
    ReportRenderer::new().render(name, scores)
}

fn draw_cell(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    left: u32,
    top: u32,
    text: &str,
    style: &TextStyle<'_>,
) -> Result<(), DrawingAreaErrorKind<std::io::Error>> {
    let (x0, y0) = (left as i32, top as i32);
    let (x1, y1) = (x0 + CELL_W as i32, y0 + CELL_H as i32);
    root.draw(&Rectangle::new([(x0, y0), (x1, y1)], BLACK.stroke_width(1)))?;
    root.draw(&Text::new(
        text.to_string(),
        ((x0 + x1) / 2, (y0 + y1) / 2),
        style.clone(),
    ))?;
    Ok(())
}
