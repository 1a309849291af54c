//! Pagination – splits a flat list of positioned boxes into pages.
//!
//! Handles:
//! - frame overflow (the next block starts a new page)
//! - forced page breaks, including a trailing one
//! - table row splitting across pages

use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;

/// Convert positioned boxes into a paginated LayoutConfig.
pub fn paginate(
    boxes: &[PositionedBox],
    page_width: f32,
    page_height: f32,
    margins: &PageMargins,
) -> LayoutConfig {
    let mut config = LayoutConfig {
        page_width_pt: page_width,
        page_height_pt: page_height,
        ..LayoutConfig::letter()
    };

    let content_height = margins.frame_height(page_height);

    let mut current_page = PageLayout {
        page_index: 0,
        boxes: Vec::new(),
    };

    // Document-space y at which the current page begins.  All PositionedBox.y
    // values are absolute document coordinates produced by the layout extractor,
    // so `pbox.y - page_start_doc_y` gives the y-on-page for any box.
    let mut page_start_doc_y = 0.0f32;
    // The current page was opened by a forced break and must be emitted
    // even if nothing lands on it.
    let mut opened_by_break = false;

    for pbox in boxes {
        if pbox.page_break_after {
            config.pages.push(std::mem::replace(
                &mut current_page,
                PageLayout {
                    page_index: config.pages.len() + 1,
                    boxes: Vec::new(),
                },
            ));
            page_start_doc_y = pbox.y + pbox.height;
            opened_by_break = true;
            continue;
        }

        let y_on_page = (pbox.y - page_start_doc_y).max(0.0);
        let box_bottom = y_on_page + pbox.height;

        // Does this box overflow the current page?
        if box_bottom > content_height && !current_page.boxes.is_empty() {
            if pbox.splittable && !pbox.children.is_empty() {
                split_table_box(
                    pbox,
                    &mut config,
                    &mut current_page,
                    &mut page_start_doc_y,
                    content_height,
                    margins.top,
                );
                continue;
            }
            config.pages.push(std::mem::replace(
                &mut current_page,
                PageLayout {
                    page_index: config.pages.len() + 1,
                    boxes: Vec::new(),
                },
            ));
            page_start_doc_y = pbox.y;
        } else if box_bottom > content_height && pbox.splittable && !pbox.children.is_empty() {
            // A table longer than a whole page, starting on a fresh page.
            split_table_box(
                pbox,
                &mut config,
                &mut current_page,
                &mut page_start_doc_y,
                content_height,
                margins.top,
            );
            continue;
        }

        let y_on_page = (pbox.y - page_start_doc_y).max(0.0);
        if y_on_page + pbox.height > content_height {
            log::warn!(
                "Block of {:.1}pt does not fit the {:.1}pt frame; placing it anyway",
                pbox.height,
                content_height
            );
        }
        current_page
            .boxes
            .push(positioned_to_layout_box(pbox, margins.top, y_on_page));
    }

    if !current_page.boxes.is_empty() || opened_by_break || config.pages.is_empty() {
        current_page.page_index = config.pages.len();
        config.pages.push(current_page);
    }
    config
}

fn split_table_box(
    pbox: &PositionedBox,
    config: &mut LayoutConfig,
    current_page: &mut PageLayout,
    page_start_doc_y: &mut f32,
    content_height: f32,
    margin_top: f32,
) {
    for row in &pbox.children {
        let y_on_page = (row.y - *page_start_doc_y).max(0.0);
        if y_on_page + row.height > content_height && !current_page.boxes.is_empty() {
            config.pages.push(std::mem::replace(
                current_page,
                PageLayout {
                    page_index: config.pages.len() + 1,
                    boxes: Vec::new(),
                },
            ));
            *page_start_doc_y = row.y;
        }
        let y = (row.y - *page_start_doc_y).max(0.0);
        if y + row.height > content_height {
            log::warn!(
                "Table row of {:.1}pt does not fit the {:.1}pt frame; placing it anyway",
                row.height,
                content_height
            );
        }
        current_page
            .boxes
            .push(positioned_to_layout_box(row, margin_top, y));
    }
}

/// Convert a PositionedBox to a LayoutBox with page-absolute coordinates.
/// `y_on_page` = `pbox.y - page_start_doc_y`; Taffy's layout already encodes
/// margin spacing into `pbox.y`, so only the top margin is added.
fn positioned_to_layout_box(pbox: &PositionedBox, margin_top: f32, y_on_page: f32) -> LayoutBox {
    build_layout_box(pbox, margin_top + y_on_page)
}

/// Recursively build a LayoutBox tree where every box carries *page-absolute*
/// x/y coordinates (origin = top-left of the physical page).
///
/// x is already page-absolute (the extractor starts at the left margin). For
/// y, `child_abs_y = parent_abs_y + (child.y − parent.y)`.
fn build_layout_box(pbox: &PositionedBox, abs_y: f32) -> LayoutBox {
    let mut lb = LayoutBox::new(pbox.x, abs_y, pbox.width, pbox.height);
    lb.background_color = pbox.background.map(|c| c.to_array());
    lb.rules = pbox.rules.clone();

    if let BoxContent::Text(text) = &pbox.content {
        lb.text = Some(text.clone());
    }

    lb.children = pbox
        .children
        .iter()
        .map(|child| build_layout_box(child, abs_y + (child.y - pbox.y)))
        .collect();
    lb
}
