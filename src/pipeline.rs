//! Pipeline – ties together validation, section rendering, layout,
//! pagination, and PDF rendering into a single function call.

use std::io::Cursor;

use chrono::NaiveDate;
use serde_json::Value;

use crate::date::DateFormatter;
use crate::error::{Error, Result};
use crate::layout::compute_layout;
use crate::layout_config::{LayoutConfig, PageMargins, LETTER_HEIGHT_PT, LETTER_WIDTH_PT};
use crate::pagination::paginate;
use crate::record::validate_payload;
use crate::render::render_pdf;
use crate::report::{flatten, RecordRenderer};
use crate::resources::ReportResources;

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata (default: "Expedientes").
    pub title: String,
    /// Page width in points (default: US Letter = 612).
    pub page_width: f32,
    /// Page height in points (default: US Letter = 792).
    pub page_height: f32,
    pub margins: PageMargins,
    /// Emit the page break after the last record too, which leaves a blank
    /// final page (default: true).
    pub trailing_page_break: bool,
    /// Twelve month names for the date banner; Spanish when unset.
    pub month_names: Option<Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Expedientes".to_string(),
            page_width: LETTER_WIDTH_PT,
            page_height: LETTER_HEIGHT_PT,
            margins: PageMargins::REPORT,
            trailing_page_break: true,
            month_names: None,
        }
    }
}

impl PipelineConfig {
    fn date_formatter(&self) -> DateFormatter {
        match &self.month_names {
            Some(names) => DateFormatter::with_month_names(names),
            None => DateFormatter::spanish(),
        }
    }

    /// Reject page geometry that leaves no frame to lay content into.
    pub fn validate(&self) -> Result<()> {
        let m = &self.margins;
        if [m.top, m.bottom, m.left, m.right]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(Error::Render(format!("invalid page margins {m:?}")));
        }
        let frame_w = m.frame_width(self.page_width);
        let frame_h = m.frame_height(self.page_height);
        if !(frame_w > 0.0) || !(frame_h > 0.0) {
            return Err(Error::Render(format!(
                "margins leave no content area on a {}x{} page",
                self.page_width, self.page_height
            )));
        }
        Ok(())
    }
}

/// Validate, render, lay out and paginate. No PDF bytes are produced.
pub fn compute_layout_config_on(
    payload: &Value,
    today: NaiveDate,
    resources: &ReportResources,
    config: &PipelineConfig,
) -> Result<LayoutConfig> {
    // 1. Validate input
    let records = validate_payload(payload)?;
    log::debug!("Validated {} record(s)", records.len());

    config.validate()?;
    resources.styles.validate()?;

    // 2. Render record sections
    let dates = config.date_formatter();
    let renderer = RecordRenderer::new(&resources.styles, today, &dates);
    let blocks = flatten(renderer.render_all(&records, config.trailing_page_break));
    log::debug!("Rendered {} block(s)", blocks.len());

    // 3. Compute layout
    let m = &config.margins;
    let boxes = compute_layout(
        &blocks,
        m.frame_width(config.page_width),
        m.left,
        &resources.fonts,
    )?;

    // 4. Paginate
    let mut layout_config = paginate(&boxes, config.page_width, config.page_height, m);
    layout_config.title = config.title.clone();
    log::debug!("Paginated into {} page(s)", layout_config.pages.len());

    Ok(layout_config)
}

/// Layout only, dated today.
pub fn compute_layout_config(
    payload: &Value,
    resources: &ReportResources,
    config: &PipelineConfig,
) -> Result<LayoutConfig> {
    compute_layout_config_on(payload, today(), resources, config)
}

/// Full pipeline with an explicit banner date.
///
/// Returns `(pdf_bytes, layout_config)`.
pub fn generate_pdf_on(
    payload: &Value,
    today: NaiveDate,
    resources: &ReportResources,
    config: &PipelineConfig,
) -> Result<(Vec<u8>, LayoutConfig)> {
    let layout_config = compute_layout_config_on(payload, today, resources, config)?;

    // 5. Render PDF
    let pdf_bytes = render_pdf(&layout_config, &resources.fonts)?;
    log::debug!("Rendered PDF of {} bytes", pdf_bytes.len());

    Ok((pdf_bytes, layout_config))
}

/// Full pipeline: record batch → PDF bytes, dated with the local date read
/// once for the whole batch.
pub fn generate_pdf(
    payload: &Value,
    resources: &ReportResources,
    config: &PipelineConfig,
) -> Result<(Vec<u8>, LayoutConfig)> {
    generate_pdf_on(payload, today(), resources, config)
}

/// Convert a record batch into an in-memory PDF positioned at its start.
pub fn convert(
    payload: &Value,
    resources: &ReportResources,
    config: &PipelineConfig,
) -> Result<Cursor<Vec<u8>>> {
    let (bytes, _) = generate_pdf(payload, resources, config)?;
    Ok(Cursor::new(bytes))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
