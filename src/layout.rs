//! Layout engine – uses Taffy to stack the block flow in a single column,
//! then converts the result into a flat list of positioned boxes in
//! document coordinates (before page splitting).

use std::collections::HashMap;
use taffy::prelude::*;

use crate::blocks::{HorizontalRule, LayoutBlock, Paragraph, Table};
use crate::error::{Error, Result};
use crate::fonts::{wrap_runs, FontManager};
use crate::layout_config::{Edge, EdgeRule, TextContent, TextLine, TextSpan};
use crate::style::{Color, RuleStyle, TableAlign, TextAlign, VerticalAlign};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub background: Option<Color>,
    pub rules: Vec<EdgeRule>,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
    /// Forced page break: everything after starts on a new page.
    pub page_break_after: bool,
    /// Tables may be split between their rows.
    pub splittable: bool,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text(TextContent),
}

/// Non-geometric properties attached to a Taffy node.
#[derive(Debug, Clone, Default)]
struct Decor {
    background: Option<Color>,
    rules: Vec<EdgeRule>,
    page_break_after: bool,
    splittable: bool,
}

fn edge_rule(edge: Edge, rule: RuleStyle) -> EdgeRule {
    EdgeRule {
        edge,
        width: rule.width,
        color: rule.color.to_array(),
    }
}

// ---------------------------------------------------------------------------
// Build Taffy tree from blocks
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_content: HashMap<NodeId, BoxContent>,
    node_decor: HashMap<NodeId, Decor>,
    frame_width: f32,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager, frame_width: f32) -> Self {
        let mut taffy = TaffyTree::new();
        // Column widths are fractional points; keep them exact.
        taffy.disable_rounding();
        Self {
            taffy,
            fonts,
            node_content: HashMap::new(),
            node_decor: HashMap::new(),
            frame_width,
        }
    }

    fn fixed_leaf(&mut self, width: f32, height: f32) -> Result<NodeId> {
        let node = self.taffy.new_leaf(Style {
            size: Size {
                width: Dimension::Length(width),
                height: Dimension::Length(height),
            },
            flex_shrink: 0.0,
            ..Default::default()
        })?;
        Ok(node)
    }

    fn build_block(&mut self, block: &LayoutBlock) -> Result<NodeId> {
        match block {
            LayoutBlock::Spacer { height } => {
                if !height.is_finite() || *height < 0.0 {
                    return Err(Error::Render(format!("invalid spacer height {height}")));
                }
                self.fixed_leaf(self.frame_width, *height)
            }
            LayoutBlock::Rule(rule) => self.build_rule(rule),
            LayoutBlock::Paragraph(p) => {
                let node = self.build_text_leaf(p, self.frame_width, None)?;
                let mut style = self.taffy.style(node)?.clone();
                style.margin = Rect {
                    top: LengthPercentageAuto::Length(p.style.space_before),
                    right: LengthPercentageAuto::Length(0.0),
                    bottom: LengthPercentageAuto::Length(p.style.space_after),
                    left: LengthPercentageAuto::Length(0.0),
                };
                self.taffy.set_style(node, style)?;
                Ok(node)
            }
            LayoutBlock::Table(table) => self.build_table(table),
            LayoutBlock::PageBreak => {
                let node = self.fixed_leaf(self.frame_width, 0.0)?;
                self.node_decor.insert(
                    node,
                    Decor {
                        page_break_after: true,
                        ..Decor::default()
                    },
                );
                Ok(node)
            }
        }
    }

    fn build_rule(&mut self, rule: &HorizontalRule) -> Result<NodeId> {
        if !(rule.thickness > 0.0) || !(rule.width_fraction > 0.0) {
            return Err(Error::Render(format!(
                "invalid horizontal rule (thickness {}, width {})",
                rule.thickness, rule.width_fraction
            )));
        }
        let node = self.taffy.new_leaf(Style {
            size: Size {
                width: Dimension::Length(self.frame_width * rule.width_fraction.min(1.0)),
                height: Dimension::Length(rule.thickness),
            },
            margin: Rect {
                top: LengthPercentageAuto::Length(1.0),
                right: LengthPercentageAuto::Auto,
                bottom: LengthPercentageAuto::Length(1.0),
                left: LengthPercentageAuto::Auto,
            },
            flex_shrink: 0.0,
            ..Default::default()
        })?;
        self.node_decor.insert(
            node,
            Decor {
                rules: vec![edge_rule(
                    Edge::Top,
                    RuleStyle::new(rule.thickness, rule.color),
                )],
                ..Decor::default()
            },
        );
        Ok(node)
    }

    /// Wrap a paragraph to `width` and create a fixed-size leaf for it.
    fn build_text_leaf(
        &mut self,
        paragraph: &Paragraph,
        width: f32,
        align: Option<TextAlign>,
    ) -> Result<NodeId> {
        let style = &paragraph.style;
        let align = align.unwrap_or(style.text_align);
        let wrapped = wrap_runs(&paragraph.runs, style, width, self.fonts);

        let lines: Vec<TextLine> = wrapped
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let x_offset = match align {
                    TextAlign::Left => 0.0,
                    TextAlign::Center => ((width - line.width) / 2.0).max(0.0),
                    TextAlign::Right => (width - line.width).max(0.0),
                };
                let size = if line.max_font_size > 0.0 {
                    line.max_font_size
                } else {
                    style.font_size
                };
                let ascent = self
                    .fonts
                    .ascender_px(size, style.is_bold(), &style.font_family);
                TextLine {
                    x_offset,
                    baseline: i as f32 * style.leading + (style.leading - size) / 2.0 + ascent,
                    spans: line
                        .spans
                        .iter()
                        .map(|s| TextSpan {
                            text: s.text.clone(),
                            x_offset: s.x,
                            bold: s.bold,
                            font_size: s.font_size,
                            color: s.color.to_array(),
                        })
                        .collect(),
                }
            })
            .collect();

        let height = lines.len() as f32 * style.leading;
        let node = self.fixed_leaf(width, height)?;
        self.node_content.insert(
            node,
            BoxContent::Text(TextContent {
                lines,
                font_family: style.font_family.clone(),
            }),
        );
        Ok(node)
    }

    fn validate_table(table: &Table) -> Result<()> {
        let cols = table.column_widths.len();
        if cols == 0 || table.column_widths.iter().any(|w| !(*w > 0.0) || !w.is_finite()) {
            return Err(Error::Render(format!(
                "table column widths must be positive, got {:?}",
                table.column_widths
            )));
        }
        for (i, row) in table.rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::Render(format!(
                    "table row {i} has {} cells, expected {cols}",
                    row.len()
                )));
            }
            let p = table.style.padding_for_row(i);
            if [p.top, p.right, p.bottom, p.left].iter().any(|v| *v < 0.0) {
                return Err(Error::Render("table padding must not be negative".to_string()));
            }
            if let Some(w) = table.column_widths.iter().find(|w| **w <= p.left + p.right) {
                return Err(Error::Render(format!(
                    "table column of {w}pt leaves no room inside {}pt of padding",
                    p.left + p.right
                )));
            }
        }
        Ok(())
    }

    fn cell_rules(table: &Table, row: usize, col: usize) -> Vec<EdgeRule> {
        let style = &table.style;
        let last_row = table.rows.len() - 1;
        let last_col = table.column_widths.len() - 1;
        let is_header = style.header_row && row == 0;
        let mut rules = Vec::new();

        if let (true, Some(r)) = (is_header, style.header_rule) {
            rules.push(edge_rule(Edge::Bottom, r));
        }
        if let (false, Some(r)) = (is_header, style.row_rule) {
            rules.push(edge_rule(Edge::Bottom, r));
        }
        if let Some(r) = style.inner_grid {
            if row < last_row {
                rules.push(edge_rule(Edge::Bottom, r));
            }
            if col < last_col {
                rules.push(edge_rule(Edge::Right, r));
            }
        }
        if let Some(r) = style.outline {
            if row == 0 {
                rules.push(edge_rule(Edge::Top, r));
            }
            if row == last_row {
                rules.push(edge_rule(Edge::Bottom, r));
            }
            if col == 0 {
                rules.push(edge_rule(Edge::Left, r));
            }
            if col == last_col {
                rules.push(edge_rule(Edge::Right, r));
            }
        }
        rules
    }

    fn build_table(&mut self, table: &Table) -> Result<NodeId> {
        Self::validate_table(table)?;
        let style = &table.style;
        let table_width = table.width();

        let justify = match style.vertical_align {
            VerticalAlign::Top => JustifyContent::Start,
            VerticalAlign::Bottom => JustifyContent::End,
        };

        let mut row_nodes = Vec::with_capacity(table.rows.len());
        for (r, row) in table.rows.iter().enumerate() {
            let padding = style.padding_for_row(r);
            let mut cell_nodes = Vec::with_capacity(row.len());

            for (c, (paragraph, width)) in row.iter().zip(&table.column_widths).enumerate() {
                let inner = width - padding.left - padding.right;
                let text = self.build_text_leaf(paragraph, inner, style.column_align.get(c).copied())?;
                let cell = self.taffy.new_with_children(
                    Style {
                        display: taffy::Display::Flex,
                        flex_direction: taffy::FlexDirection::Column,
                        justify_content: Some(justify),
                        size: Size {
                            width: Dimension::Length(*width),
                            height: Dimension::Auto,
                        },
                        padding: Rect {
                            top: LengthPercentage::Length(padding.top),
                            right: LengthPercentage::Length(padding.right),
                            bottom: LengthPercentage::Length(padding.bottom),
                            left: LengthPercentage::Length(padding.left),
                        },
                        flex_shrink: 0.0,
                        ..Default::default()
                    },
                    &[text],
                )?;
                self.node_decor.insert(
                    cell,
                    Decor {
                        background: style.background,
                        rules: Self::cell_rules(table, r, c),
                        ..Decor::default()
                    },
                );
                cell_nodes.push(cell);
            }

            let row_node = self.taffy.new_with_children(
                Style {
                    display: taffy::Display::Flex,
                    flex_direction: taffy::FlexDirection::Row,
                    align_items: Some(taffy::AlignItems::Stretch),
                    size: Size {
                        width: Dimension::Length(table_width),
                        height: Dimension::Auto,
                    },
                    flex_shrink: 0.0,
                    ..Default::default()
                },
                &cell_nodes,
            )?;
            row_nodes.push(row_node);
        }

        let side = match style.align {
            TableAlign::Left => LengthPercentageAuto::Length(0.0),
            TableAlign::Center => LengthPercentageAuto::Auto,
        };
        let node = self.taffy.new_with_children(
            Style {
                display: taffy::Display::Flex,
                flex_direction: taffy::FlexDirection::Column,
                size: Size {
                    width: Dimension::Length(table_width),
                    height: Dimension::Auto,
                },
                margin: Rect {
                    top: LengthPercentageAuto::Length(0.0),
                    right: side,
                    bottom: LengthPercentageAuto::Length(0.0),
                    left: side,
                },
                flex_shrink: 0.0,
                ..Default::default()
            },
            &row_nodes,
        )?;
        self.node_decor.insert(
            node,
            Decor {
                splittable: true,
                ..Decor::default()
            },
        );
        Ok(node)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox> {
        let layout = self.taffy.layout(node)?;
        let decor = self.node_decor.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            background: decor.background,
            rules: decor.rules,
            content,
            children,
            page_break_after: decor.page_break_after,
            splittable: decor.splittable,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out the block flow in a frame `frame_width` points wide whose left
/// edge sits `left_margin` points from the page edge. Returns one top-level
/// positioned box per block, in document coordinates.
pub fn compute_layout(
    blocks: &[LayoutBlock],
    frame_width: f32,
    left_margin: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>> {
    if !(frame_width > 0.0) || !frame_width.is_finite() {
        return Err(Error::Render(format!(
            "frame width must be positive, got {frame_width}"
        )));
    }
    let mut builder = LayoutBuilder::new(fonts, frame_width);

    let child_ids = blocks
        .iter()
        .map(|b| builder.build_block(b))
        .collect::<Result<Vec<_>>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: Dimension::Length(frame_width),
            height: Dimension::Auto,
        },
        ..Default::default()
    };

    let root = builder.taffy.new_with_children(root_style, &child_ids)?;

    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(frame_width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    let root_box = builder.extract(root, left_margin, 0.0)?;
    Ok(root_box.children)
}
