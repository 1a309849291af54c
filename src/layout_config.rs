//! Layout config – the intermediate representation between layout computation
//! and PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// US Letter width in points.
pub const LETTER_WIDTH_PT: f32 = 612.0;
/// US Letter height in points.
pub const LETTER_HEIGHT_PT: f32 = 792.0;

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl PageMargins {
    /// 0.1in top, 0.5in bottom, 0.4in at the sides.
    pub const REPORT: Self = Self {
        top: 7.2,
        bottom: 36.0,
        left: 28.8,
        right: 28.8,
    };

    /// Width of the frame left between the side margins.
    pub fn frame_width(&self, page_width: f32) -> f32 {
        page_width - self.left - self.right
    }

    /// Height of the frame left between the top and bottom margins.
    pub fn frame_height(&self, page_height: f32) -> f32 {
        page_height - self.top - self.bottom
    }
}

impl Default for PageMargins {
    fn default() -> Self {
        Self::REPORT
    }
}

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    /// Lines stroked along the box edges.
    #[serde(default)]
    pub rules: Vec<EdgeRule>,

    pub text: Option<TextContent>,

    /// Children (nested boxes), also in page coordinates.
    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRule {
    pub edge: Edge,
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_family: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// X offset of the line within the box (alignment).
    pub x_offset: f32,
    /// Baseline offset from the top of the box.
    pub baseline: f32,
    pub spans: Vec<TextSpan>,
}

/// A run of identically styled text on one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// X offset from the start of the line.
    pub x_offset: f32,
    pub bold: bool,
    pub font_size: f32,
    pub color: [f32; 4],
}

impl LayoutConfig {
    /// Create an empty US Letter layout config.
    pub fn letter() -> Self {
        Self {
            title: Self::default_title(),
            page_width_pt: LETTER_WIDTH_PT,
            page_height_pt: LETTER_HEIGHT_PT,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Expedientes".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }

    /// Visible text of every page, one entry per text line, in layout order.
    pub fn page_texts(&self) -> Vec<Vec<String>> {
        self.pages
            .iter()
            .map(|page| {
                let mut lines = Vec::new();
                for lbox in &page.boxes {
                    lbox.visit(&mut |b| {
                        if let Some(text) = &b.text {
                            lines.extend(text.lines.iter().map(TextLine::text));
                        }
                    });
                }
                lines
            })
            .collect()
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            rules: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Depth-first walk over this box and its descendants.
    pub fn visit(&self, f: &mut dyn FnMut(&LayoutBox)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

impl TextLine {
    /// The line's spans joined with single spaces.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let mut config = LayoutConfig::letter();
        let mut lbox = LayoutBox::new(28.8, 7.2, 540.0, 12.0);
        lbox.rules.push(EdgeRule {
            edge: Edge::Bottom,
            width: 0.5,
            color: [0.8, 0.8, 0.8, 1.0],
        });
        lbox.text = Some(TextContent {
            font_family: "Helvetica".to_string(),
            lines: vec![TextLine {
                x_offset: 0.0,
                baseline: 9.0,
                spans: vec![TextSpan {
                    text: "Tipo".to_string(),
                    x_offset: 0.0,
                    bold: false,
                    font_size: 8.0,
                    color: [0.0, 0.1, 0.47, 1.0],
                }],
            }],
        });
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![lbox],
        });

        let parsed = LayoutConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.page_texts(), vec![vec!["Tipo".to_string()]]);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(matches!(LayoutConfig::from_json("{"), Err(Error::Json(_))));
    }
}
