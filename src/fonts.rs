//! Font loading and text measurement using `ttf-parser`.
//!
//! The report uses one family in two weights. Real TTF faces are loaded
//! once at startup; when none are available the PDF base-14 Helvetica pair
//! is registered with heuristic metrics instead.

use std::collections::HashMap;
use std::path::Path;

use crate::blocks::TextRun;
use crate::error::{Error, Result};
use crate::style::{Color, FontWeight, ParagraphStyle};

/// Family name used for the base-14 fallback faces.
pub const BUILTIN_FAMILY: &str = "Helvetica";

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for builtin faces.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
        }
    }
}

/// Manages the registered faces.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    family: String,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            family: BUILTIN_FAMILY.to_string(),
        }
    }

    /// Base-14 Helvetica regular and bold with Helvetica-like metrics.
    pub fn builtin() -> Self {
        let mut mgr = Self::new();
        for bold in [false, true] {
            mgr.fonts.insert(
                FontKey::new(BUILTIN_FAMILY, bold),
                FontData {
                    bytes: Vec::new(),
                    units_per_em: 1000.0,
                    ascender: 750.0,
                    descender: -250.0,
                },
            );
        }
        mgr
    }

    /// Load the regular and bold faces of `family` from two font files.
    pub fn from_files(family: &str, regular: &Path, bold: &Path) -> Result<Self> {
        let mut mgr = Self::new();
        for (path, is_bold) in [(regular, false), (bold, true)] {
            let bytes = std::fs::read(path)
                .map_err(|e| Error::Font(format!("cannot read '{}': {e}", path.display())))?;
            mgr.load_font(family, is_bold, bytes)
                .map_err(|e| Error::Font(format!("'{}': {e}", path.display())))?;
            log::debug!("Registered font {family} (bold={is_bold}) from {}", path.display());
        }
        Ok(mgr)
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(&mut self, family: &str, bold: bool, bytes: Vec<u8>) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| Error::Font(format!("failed to parse font: {e}")))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            bytes,
        };

        if self.fonts.is_empty() {
            self.family = family.to_string();
        }
        self.fonts.insert(FontKey::new(family, bold), data);
        Ok(())
    }

    /// The family every style of the report refers to.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Font data for a key, falling back to the family's regular face.
    pub fn get(&self, key: &FontKey) -> Option<&FontData> {
        self.fonts
            .get(key)
            .or_else(|| self.fonts.get(&FontKey::new(&self.family, false)))
    }

    /// Measure the width of a string at a given font size (in pt).
    /// With real font bytes we sum glyph advances; otherwise an average
    /// character width heuristic is used (0.5 × font_size, bold 0.55).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool, family: &str) -> f32 {
        let heuristic = |avg: f32| text.chars().count() as f32 * font_size * avg;
        let avg = if bold { 0.55 } else { 0.5 };

        let data = match self.get(&FontKey::new(family, bold)) {
            Some(d) if !d.bytes.is_empty() => d,
            _ => return heuristic(avg),
        };

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            Err(_) => heuristic(avg),
        }
    }

    /// Ascender in pt for the given face.
    pub fn ascender_px(&self, font_size: f32, bold: bool, family: &str) -> f32 {
        match self.get(&FontKey::new(family, bold)) {
            Some(data) => data.ascender * font_size / data.units_per_em,
            None => font_size * 0.75,
        }
    }

    /// True when real font bytes are loaded (not the base-14 fallback).
    pub fn has_real_fonts(&self) -> bool {
        self.fonts.values().any(|d| !d.bytes.is_empty())
    }

    /// All registered keys, sorted for a stable registration order.
    pub fn keys(&self) -> Vec<FontKey> {
        let mut keys: Vec<FontKey> = self.fonts.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Font bytes for embedding in the PDF.
    pub fn font_bytes(&self, key: &FontKey) -> Option<&[u8]> {
        self.fonts.get(key).and_then(|d| {
            if d.bytes.is_empty() {
                None
            } else {
                Some(d.bytes.as_slice())
            }
        })
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Rich-text wrapping
// ---------------------------------------------------------------------------

/// A run of text on one wrapped line, with its resolved styling.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedSpan {
    pub text: String,
    /// Horizontal offset from the start of the line.
    pub x: f32,
    pub bold: bool,
    pub font_size: f32,
    pub color: Color,
}

/// One line produced by [`wrap_runs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrappedLine {
    pub spans: Vec<WrappedSpan>,
    pub width: f32,
    /// Largest font size used on the line.
    pub max_font_size: f32,
}

impl WrappedLine {
    fn push_word(&mut self, word: &str, space_w: f32, word_w: f32, bold: bool, size: f32, color: Color) {
        let same_look = self
            .spans
            .last()
            .map(|s| s.bold == bold && s.font_size == size && s.color == color)
            .unwrap_or(false);

        if same_look {
            if let Some(last) = self.spans.last_mut() {
                if space_w > 0.0 {
                    last.text.push(' ');
                }
                last.text.push_str(word);
            }
        } else {
            self.spans.push(WrappedSpan {
                text: word.to_string(),
                x: self.width + space_w,
                bold,
                font_size: size,
                color,
            });
        }
        self.width += space_w + word_w;
        self.max_font_size = self.max_font_size.max(size);
    }

    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Word-wrap styled runs to fit within `max_width` points.
///
/// Runs of whitespace collapse to a single space and `\n` forces a line
/// break. A paragraph without any words produces no lines.
pub fn wrap_runs(
    runs: &[TextRun],
    style: &ParagraphStyle,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<WrappedLine> {
    let family = style.font_family.as_str();
    let mut lines: Vec<WrappedLine> = Vec::new();
    let mut line = WrappedLine::default();
    let mut pending_space = false;

    for run in runs {
        let bold = match run.weight {
            Some(w) => w == FontWeight::Bold,
            None => style.is_bold(),
        };
        let size = run.font_size.unwrap_or(style.font_size);
        let color = run.color.unwrap_or(style.color);

        for (i, segment) in run.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(std::mem::take(&mut line));
                pending_space = false;
            }
            if segment.starts_with(char::is_whitespace) {
                pending_space = true;
            }

            let mut words = segment.split_whitespace().peekable();
            while let Some(word) = words.next() {
                let word_w = fonts.measure_text_width(word, size, bold, family);
                let mut space_w = if pending_space && !line.spans.is_empty() {
                    fonts.measure_text_width(" ", size, bold, family)
                } else {
                    0.0
                };

                if !line.spans.is_empty() && line.width + space_w + word_w > max_width {
                    lines.push(std::mem::take(&mut line));
                    space_w = 0.0;
                }
                line.push_word(word, space_w, word_w, bold, size, color);
                pending_space = words.peek().is_some() || segment.ends_with(char::is_whitespace);
            }
        }
    }

    if !line.spans.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleSheet;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::builtin();
        let w = mgr.measure_text_width("Hello", 16.0, false, BUILTIN_FAMILY);
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
    }

    #[test]
    fn builtin_has_no_embeddable_bytes() {
        let mgr = FontManager::builtin();
        assert!(!mgr.has_real_fonts());
        assert_eq!(mgr.keys().len(), 2);
        assert!(mgr.font_bytes(&FontKey::new(BUILTIN_FAMILY, true)).is_none());
    }

    #[test]
    fn missing_font_file_is_a_font_error() {
        let result = FontManager::from_files(
            "Inter",
            Path::new("/nonexistent/Inter.ttf"),
            Path::new("/nonexistent/Inter-Bold.ttf"),
        );
        assert!(matches!(result, Err(Error::Font(_))));
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let mut mgr = FontManager::new();
        let result = mgr.load_font("Inter", false, b"not a font".to_vec());
        assert!(matches!(result, Err(Error::Font(_))));
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::builtin();
        let style = StyleSheet::new(BUILTIN_FAMILY).normal;
        let runs = [TextRun::plain("Hello world foo bar")];
        let lines = wrap_runs(&runs, &style, 30.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }

    #[test]
    fn mixed_runs_share_a_line() {
        let mgr = FontManager::builtin();
        let style = StyleSheet::new(BUILTIN_FAMILY).normal;
        let runs = [TextRun::bold("Titular:"), TextRun::plain(" Ana  López")];
        let lines = wrap_runs(&runs, &style, 500.0, &mgr);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.spans.len(), 2);
        assert!(line.spans[0].bold);
        assert_eq!(line.spans[1].text, "Ana López");
        assert!(line.spans[1].x > mgr.measure_text_width("Titular:", 8.0, true, BUILTIN_FAMILY));
    }

    #[test]
    fn newline_forces_break() {
        let mgr = FontManager::builtin();
        let style = StyleSheet::new(BUILTIN_FAMILY).normal_centered;
        let runs = [TextRun::plain("Cuantía"), TextRun::plain("\n1500.00").size(10.0)];
        let lines = wrap_runs(&runs, &style, 500.0, &mgr);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text(), "1500.00");
        assert_eq!(lines[1].max_font_size, 10.0);
    }

    #[test]
    fn blank_text_has_no_lines() {
        let mgr = FontManager::builtin();
        let style = StyleSheet::new(BUILTIN_FAMILY).normal;
        assert!(wrap_runs(&[TextRun::plain("   ")], &style, 100.0, &mgr).is_empty());
        assert!(wrap_runs(&[], &style, 100.0, &mgr).is_empty());
    }
}
