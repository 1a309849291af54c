//! # expediente-pdf – case-file batches → paginated PDF reports
//!
//! This crate turns a JSON list of legal case-file records ("expedientes")
//! into one PDF document, one report per record. The pipeline stages are:
//!
//! 1. **Validate** – JSON payload → typed records ([`record`])
//! 2. **Render** – records → report sections of blocks ([`report`], [`sections`])
//! 3. **Layout** – stack the blocks in a single column with Taffy ([`layout`])
//! 4. **Paginate** – split into US Letter pages ([`pagination`])
//! 5. **Render PDF** – emit PDF bytes via printpdf ([`render`])
//!
//! Fonts and styles are loaded once into [`ReportResources`] and shared by
//! every call. A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod blocks;
pub mod date;
pub mod error;
pub mod ffi;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod pagination;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod report;
pub mod resources;
pub mod samples;
pub mod sections;
pub mod style;

// Re-exports for convenience
pub use error::{Error, Result};
pub use pipeline::{convert, generate_pdf, generate_pdf_on, PipelineConfig};
pub use resources::ReportResources;
