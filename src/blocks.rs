//! Layout blocks – the render-ready units a record is turned into before
//! the document is laid out.

use crate::style::{Color, FontWeight, ParagraphStyle, TableStyle};

/// A piece of paragraph text with optional overrides of the paragraph style.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub weight: Option<FontWeight>,
    pub font_size: Option<f32>,
    pub color: Option<Color>,
}

impl TextRun {
    /// Text in the paragraph's own style.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: None,
            font_size: None,
            color: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            weight: Some(FontWeight::Bold),
            ..Self::plain(text)
        }
    }

    pub fn size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Styled rich text.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    pub style: ParagraphStyle,
}

impl Paragraph {
    pub fn new(runs: Vec<TextRun>, style: &ParagraphStyle) -> Self {
        Self {
            runs,
            style: style.clone(),
        }
    }

    pub fn text(text: impl Into<String>, style: &ParagraphStyle) -> Self {
        Self::new(vec![TextRun::plain(text)], style)
    }

    /// A bold label followed by a regular value, e.g. "**Titular:** Ana".
    pub fn labelled(label: &str, value: &str, style: &ParagraphStyle) -> Self {
        Self::new(
            vec![TextRun::bold(label), TextRun::plain(format!(" {value}"))],
            style,
        )
    }

    /// Concatenated text of all runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A table with fixed column widths (points); every cell holds a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub column_widths: Vec<f32>,
    pub rows: Vec<Vec<Paragraph>>,
    pub style: TableStyle,
}

impl Table {
    pub fn new(column_widths: Vec<f32>, rows: Vec<Vec<Paragraph>>, style: TableStyle) -> Self {
        Self {
            column_widths,
            rows,
            style,
        }
    }

    pub fn width(&self) -> f32 {
        self.column_widths.iter().sum()
    }

    /// Rows after the header row (all rows when the table has no header).
    pub fn body_rows(&self) -> &[Vec<Paragraph>] {
        if self.style.header_row && !self.rows.is_empty() {
            &self.rows[1..]
        } else {
            &self.rows
        }
    }
}

/// A horizontal line across a fraction of the frame width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalRule {
    pub thickness: f32,
    pub color: Color,
    /// 1.0 spans the whole frame.
    pub width_fraction: f32,
}

/// One unit of the document flow.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutBlock {
    Spacer { height: f32 },
    Rule(HorizontalRule),
    Paragraph(Paragraph),
    Table(Table),
    PageBreak,
}

impl LayoutBlock {
    pub fn spacer(height: f32) -> Self {
        LayoutBlock::Spacer { height }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            LayoutBlock::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            LayoutBlock::Paragraph(p) => Some(p),
            _ => None,
        }
    }
}

/// Which part of a record a group of blocks belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    DateBanner,
    Title,
    Separator,
    InfoBar,
    Summary,
    Participants,
    FinancialData,
    Actions,
    Balance,
    PageBreak,
}

/// The blocks one section of a record produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSection {
    pub kind: SectionKind,
    pub blocks: Vec<LayoutBlock>,
}

impl RenderedSection {
    pub fn new(kind: SectionKind, blocks: Vec<LayoutBlock>) -> Self {
        Self { kind, blocks }
    }

    /// All tables of the section, in order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(LayoutBlock::as_table)
    }
}
