//! Record renderer – turns each record into its ordered list of sections.

use chrono::NaiveDate;

use crate::blocks::{LayoutBlock, RenderedSection, SectionKind, TextRun};
use crate::date::DateFormatter;
use crate::record::ExpedienteRecord;
use crate::sections;
use crate::style::StyleSheet;

/// Renders records against one style sheet and one banner date.
///
/// The banner runs are computed once, so every record of a batch shows the
/// same "generated on" date.
pub struct RecordRenderer<'a> {
    styles: &'a StyleSheet,
    banner: Vec<TextRun>,
}

impl<'a> RecordRenderer<'a> {
    pub fn new(styles: &'a StyleSheet, today: NaiveDate, dates: &DateFormatter) -> Self {
        Self {
            styles,
            banner: dates.banner_runs(today),
        }
    }

    /// Sections of one record, in document order, ending with a page break.
    pub fn render(&self, record: &ExpedienteRecord) -> Vec<RenderedSection> {
        let styles = self.styles;
        let mut out = vec![
            sections::date_banner(&self.banner, styles),
            sections::title(record, styles),
            sections::separator(),
            sections::info_bar(record, styles),
            sections::summary(record, styles),
        ];
        out.extend(sections::participants(record, styles));
        out.extend(sections::financial_data(record, styles));
        out.extend(sections::actions(record, styles));
        out.extend(sections::balance(record, styles));
        out.push(sections::page_break());
        out
    }

    /// Sections of every record, in input order.
    ///
    /// With `trailing_page_break` off, the final record's page break is
    /// dropped so the document does not end on a blank page.
    pub fn render_all(
        &self,
        records: &[ExpedienteRecord],
        trailing_page_break: bool,
    ) -> Vec<RenderedSection> {
        let mut out: Vec<RenderedSection> = records.iter().flat_map(|r| self.render(r)).collect();
        if !trailing_page_break && out.last().map(|s| s.kind) == Some(SectionKind::PageBreak) {
            out.pop();
        }
        out
    }
}

/// Flatten sections into the single block flow handed to layout.
pub fn flatten(sections: Vec<RenderedSection>) -> Vec<LayoutBlock> {
    sections.into_iter().flat_map(|s| s.blocks).collect()
}
