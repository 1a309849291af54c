//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::HashMap;

use printpdf::font::ParsedFont;
use printpdf::*;

use crate::error::{Error, Result};
use crate::fonts::{FontKey, FontManager};
use crate::layout_config::*;

/// Points to millimetres.
const PT_TO_MM: f32 = 0.352778;

/// How a span's face is written: an embedded font or a base-14 one.
#[derive(Clone)]
enum FaceRef {
    Embedded(FontId),
    Builtin(BuiltinFont),
}

struct FaceTable {
    embedded: HashMap<FontKey, FontId>,
}

impl FaceTable {
    /// Register every face that carries real bytes with the document.
    fn register(doc: &mut PdfDocument, fonts: &FontManager) -> Result<Self> {
        let mut embedded = HashMap::new();
        let mut warnings = Vec::new();
        for key in fonts.keys() {
            let Some(bytes) = fonts.font_bytes(&key) else {
                continue;
            };
            let parsed = ParsedFont::from_bytes(bytes, 0, &mut warnings).ok_or_else(|| {
                Error::Render(format!(
                    "failed to embed font {} (bold={})",
                    key.family, key.bold
                ))
            })?;
            embedded.insert(key, doc.add_font(&parsed));
        }
        Ok(Self { embedded })
    }

    fn face(&self, family: &str, bold: bool) -> FaceRef {
        let exact = FontKey::new(family, bold);
        let regular = FontKey::new(family, false);
        match self.embedded.get(&exact).or_else(|| self.embedded.get(&regular)) {
            Some(id) => FaceRef::Embedded(id.clone()),
            None if bold => FaceRef::Builtin(BuiltinFont::HelveticaBold),
            None => FaceRef::Builtin(BuiltinFont::Helvetica),
        }
    }
}

/// Render a LayoutConfig into PDF bytes.
///
/// Text whose family has embedded font bytes in `fonts` is written with
/// that font; everything else falls back to base-14 Helvetica.
pub fn render_pdf(config: &LayoutConfig, fonts: &FontManager) -> Result<Vec<u8>> {
    if !(config.page_width_pt > 0.0) || !(config.page_height_pt > 0.0) {
        return Err(Error::Render(format!(
            "invalid page size {}x{}",
            config.page_width_pt, config.page_height_pt
        )));
    }
    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&config.title);
    let faces = FaceTable::register(&mut doc, fonts)?;
    if !fonts.has_real_fonts() {
        log::debug!("No embeddable faces registered; writing base-14 Helvetica");
    }

    let mut pages = Vec::new();

    for page_layout in &config.pages {
        let mut ops = Vec::new();

        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &faces);
        }

        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    log::debug!("Rendering {} page(s)", pages.len());
    doc.with_pages(pages);
    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        log::debug!("printpdf reported {} warning(s)", warnings.len());
    }

    Ok(bytes)
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for the 0x80-0xFF range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

fn rgb(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(ops: &mut Vec<Op>, lbox: &LayoutBox, page_height: f32, faces: &FaceTable) {
    // PDF coordinate system: origin at bottom-left.
    // Our layout uses origin at top-left. Convert:
    let top = page_height - lbox.y;
    let bottom = top - lbox.height;
    let left = lbox.x;
    let right = lbox.x + lbox.width;

    if let Some(bg) = lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: vec![
                        point(left, bottom),
                        point(right, bottom),
                        point(right, top),
                        point(left, top),
                    ],
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(text) = &lbox.text {
        for tline in &text.lines {
            let baseline = top - tline.baseline;
            for span in &tline.spans {
                if span.text.is_empty() {
                    continue;
                }
                let x = left + tline.x_offset + span.x_offset;
                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor {
                    pos: Point {
                        x: Pt(x),
                        y: Pt(baseline),
                    },
                });
                ops.push(Op::SetFillColor {
                    col: rgb(span.color),
                });
                match faces.face(&text.font_family, span.bold) {
                    FaceRef::Embedded(font) => {
                        ops.push(Op::SetFontSize {
                            size: Pt(span.font_size),
                            font: font.clone(),
                        });
                        ops.push(Op::WriteText {
                            items: vec![TextItem::Text(span.text.clone())],
                            font,
                        });
                    }
                    FaceRef::Builtin(font) => {
                        ops.push(Op::SetFontSizeBuiltinFont {
                            size: Pt(span.font_size),
                            font,
                        });
                        ops.push(Op::WriteTextBuiltinFont {
                            items: vec![TextItem::Text(to_winlatin(&span.text))],
                            font,
                        });
                    }
                }
                ops.push(Op::EndTextSection);
            }
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, faces);
    }

    // Rules are stroked over the box content.
    for rule in &lbox.rules {
        let (a, b) = match rule.edge {
            Edge::Top => (point(left, top), point(right, top)),
            Edge::Bottom => (point(left, bottom), point(right, bottom)),
            Edge::Left => (point(left, top), point(left, bottom)),
            Edge::Right => (point(right, top), point(right, bottom)),
        };
        ops.push(Op::SetOutlineColor {
            col: rgb(rule.color),
        });
        ops.push(Op::SetOutlineThickness { pt: Pt(rule.width) });
        ops.push(Op::DrawLine {
            line: Line {
                points: vec![a, b],
                is_closed: false,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_box() -> LayoutBox {
        let mut lbox = LayoutBox::new(36.0, 7.2, 540.0, 18.0);
        lbox.background_color = Some([0.97, 0.97, 0.97, 1.0]);
        lbox.rules.push(EdgeRule {
            edge: Edge::Bottom,
            width: 1.0,
            color: [0.0, 0.1, 0.47, 1.0],
        });
        lbox.text = Some(TextContent {
            font_family: "Helvetica".to_string(),
            lines: vec![TextLine {
                x_offset: 0.0,
                baseline: 12.0,
                spans: vec![
                    TextSpan {
                        text: "Órgano:".to_string(),
                        x_offset: 0.0,
                        bold: true,
                        font_size: 10.0,
                        color: [0.0, 0.0, 0.0, 1.0],
                    },
                    TextSpan {
                        text: "Juzgado nº 3 – Madrid".to_string(),
                        x_offset: 45.0,
                        bold: false,
                        font_size: 10.0,
                        color: [0.0, 0.0, 0.0, 1.0],
                    },
                ],
            }],
        });
        lbox
    }

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::letter();
        let bytes = render_pdf(&config, &FontManager::builtin()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn render_text_rules_and_background() {
        let mut config = LayoutConfig::letter();
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![sample_box()],
        });
        let bytes = render_pdf(&config, &FontManager::builtin()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn bad_page_size_is_a_render_error() {
        let mut config = LayoutConfig::letter();
        config.page_width_pt = 0.0;
        let err = render_pdf(&config, &FontManager::builtin()).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn builtin_faces_follow_weight() {
        let mut doc = PdfDocument::new("t");
        let faces = FaceTable::register(&mut doc, &FontManager::builtin()).unwrap();
        assert!(faces.embedded.is_empty());
        assert!(matches!(
            faces.face("Helvetica", true),
            FaceRef::Builtin(BuiltinFont::HelveticaBold)
        ));
    }

    #[test]
    fn ttf_faces_are_embedded() {
        let mut fonts = FontManager::new();
        let regular = include_bytes!("../tests/fixtures/fonts/DejaVuSans.ttf").to_vec();
        let bold = include_bytes!("../tests/fixtures/fonts/DejaVuSans-Bold.ttf").to_vec();
        fonts.load_font("DejaVu Sans", false, regular).unwrap();
        fonts.load_font("DejaVu Sans", true, bold).unwrap();

        let mut doc = PdfDocument::new("t");
        let faces = FaceTable::register(&mut doc, &fonts).unwrap();
        assert_eq!(faces.embedded.len(), 2);
        assert!(matches!(faces.face("DejaVu Sans", true), FaceRef::Embedded(_)));

        let mut config = LayoutConfig::letter();
        let mut lbox = sample_box();
        if let Some(text) = lbox.text.as_mut() {
            text.font_family = "DejaVu Sans".to_string();
        }
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![lbox],
        });
        let bytes = render_pdf(&config, &fonts).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert!(bytes.windows(8).any(|w| w == b"FontFile"));
    }

    #[test]
    fn winlatin_maps_spanish_letters() {
        assert_eq!(to_winlatin("ñ").as_bytes(), &[0xF1]);
        assert_eq!(to_winlatin("–").as_bytes(), &[0x96]);
    }
}
