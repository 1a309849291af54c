//! Style sheet – the fixed paragraph and table styles shared by every
//! record and every section of the report.
//!
//! Styles are built once from the registered font family
//! ([`StyleSheet::new`]) and then only read.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One inch in PDF points.
pub const INCH: f32 = 72.0;

/// Width every full-width table is sized against (7.5").
pub const CONTENT_WIDTH_PT: f32 = 7.5 * INCH;

/// Main title colour (magenta-red).
pub const TITLE_COLOR: Color = Color::rgb8(0xD5, 0x00, 0x57);
/// Table header text, header rules and highlighted figures.
pub const NAVY: Color = Color::rgb8(0x00, 0x19, 0x78);
/// Section headings and balance labels.
pub const HEADING_GRAY: Color = Color::rgb8(0x26, 0x26, 0x26);
/// Thin rules between body rows and around the balance strip.
pub const GRID_GRAY: Color = Color::rgb8(0xDD, 0xDC, 0xDC);
/// Background tint of the summary panel.
pub const PANEL_TINT: Color = Color::rgb8(0xF7, 0xF7, 0xF7);

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Bottom,
}

/// Horizontal placement of a table narrower than the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAlign {
    Left,
    Center,
}

/// Cell padding in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const ZERO: Self = Self::uniform(0.0);

    pub const fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub const fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

impl Default for Padding {
    /// Six points left/right, three top/bottom.
    fn default() -> Self {
        Self::symmetric(3.0, 6.0)
    }
}

/// A stroked line: thickness in points plus colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleStyle {
    pub width: f32,
    pub color: Color,
}

impl RuleStyle {
    pub const fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

// ---------------------------------------------------------------------------
// Paragraph styles
// ---------------------------------------------------------------------------

/// Fully resolved style for a paragraph of text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    pub name: &'static str,
    pub font_family: String,
    pub font_weight: FontWeight,
    pub font_size: f32,
    pub color: Color,
    pub text_align: TextAlign,
    /// Distance between consecutive baselines, in points.
    pub leading: f32,
    pub space_before: f32,
    pub space_after: f32,
}

impl ParagraphStyle {
    fn new(name: &'static str, family: &str, weight: FontWeight, size: f32) -> Self {
        Self {
            name,
            font_family: family.to_string(),
            font_weight: weight,
            font_size: size,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            leading: size * 1.2,
            space_before: 0.0,
            space_after: 0.0,
        }
    }

    fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    fn align(mut self, align: TextAlign) -> Self {
        self.text_align = align;
        self
    }

    fn leading(mut self, leading: f32) -> Self {
        self.leading = leading;
        self
    }

    fn spacing(mut self, before: f32, after: f32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    fn validate(&self) -> Result<()> {
        if !(self.font_size > 0.0) || !(self.leading > 0.0) {
            return Err(Error::Render(format!(
                "style '{}' has non-positive font size or leading ({} / {})",
                self.name, self.font_size, self.leading
            )));
        }
        if self.space_before < 0.0 || self.space_after < 0.0 {
            return Err(Error::Render(format!(
                "style '{}' has negative paragraph spacing",
                self.name
            )));
        }
        Ok(())
    }
}

/// The named styles used by the report.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    pub title: ParagraphStyle,
    pub info: ParagraphStyle,
    pub section_heading: ParagraphStyle,
    pub summary: ParagraphStyle,
    pub normal: ParagraphStyle,
    pub normal_centered: ParagraphStyle,
    pub header_cell: ParagraphStyle,
}

impl StyleSheet {
    /// Build the style sheet for a font family with a regular and a bold face.
    pub fn new(family: &str) -> Self {
        use FontWeight::{Bold, Regular};

        Self {
            title: ParagraphStyle::new("title", family, Bold, 12.0)
                .color(TITLE_COLOR)
                .leading(14.0)
                .spacing(6.0, 6.0),
            info: ParagraphStyle::new("info", family, Regular, 8.0).align(TextAlign::Right),
            section_heading: ParagraphStyle::new("section_heading", family, Bold, 10.0)
                .color(HEADING_GRAY),
            summary: ParagraphStyle::new("summary", family, Regular, 10.0),
            normal: ParagraphStyle::new("normal", family, Regular, 8.0).leading(12.0),
            normal_centered: ParagraphStyle::new("normal_centered", family, Bold, 8.0)
                .align(TextAlign::Center)
                .leading(12.0),
            header_cell: ParagraphStyle::new("header_cell", family, Regular, 8.0)
                .color(NAVY)
                .leading(9.6),
        }
    }

    pub fn all(&self) -> [&ParagraphStyle; 7] {
        [
            &self.title,
            &self.info,
            &self.section_heading,
            &self.summary,
            &self.normal,
            &self.normal_centered,
            &self.header_cell,
        ]
    }

    /// Reject styles the layout engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        self.all().iter().try_for_each(|s| s.validate())
    }
}

// ---------------------------------------------------------------------------
// Table styles
// ---------------------------------------------------------------------------

/// Visual rules for a table. Row 0 is the header when `header_row` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub padding: Padding,
    /// Overrides `padding` for the header row.
    pub header_padding: Option<Padding>,
    pub header_row: bool,
    pub vertical_align: VerticalAlign,
    /// Per-column alignment override; paragraph alignment applies when unset.
    pub column_align: Vec<TextAlign>,
    pub background: Option<Color>,
    /// Line under the header row.
    pub header_rule: Option<RuleStyle>,
    /// Line under every body row.
    pub row_rule: Option<RuleStyle>,
    /// Outline around the whole table.
    pub outline: Option<RuleStyle>,
    /// Lines between all cells.
    pub inner_grid: Option<RuleStyle>,
    pub align: TableAlign,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            padding: Padding::default(),
            header_padding: None,
            header_row: false,
            vertical_align: VerticalAlign::Bottom,
            column_align: Vec::new(),
            background: None,
            header_rule: None,
            row_rule: None,
            outline: None,
            inner_grid: None,
            align: TableAlign::Center,
        }
    }
}

impl TableStyle {
    /// Layout-only table: no padding, no rules.
    pub fn plain() -> Self {
        Self {
            padding: Padding::ZERO,
            ..Self::default()
        }
    }

    /// The data-table look: navy header text over a navy rule, thin gray
    /// rules between body rows, top-aligned cells.
    pub fn data_table() -> Self {
        Self {
            padding: Padding::symmetric(3.0, 10.0),
            header_padding: Some(Padding::symmetric(2.0, 10.0)),
            header_row: true,
            vertical_align: VerticalAlign::Top,
            header_rule: Some(RuleStyle::new(1.0, NAVY)),
            row_rule: Some(RuleStyle::new(0.5, GRID_GRAY)),
            ..Self::default()
        }
    }

    pub fn padding_for_row(&self, row: usize) -> Padding {
        match self.header_padding {
            Some(p) if self.header_row && row == 0 => p,
            _ => self.padding,
        }
    }
}
