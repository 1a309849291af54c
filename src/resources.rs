//! One-time report resources: registered fonts and the style sheet built
//! on top of them. Created once before the first conversion and then
//! shared read-only by every call.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fonts::FontManager;
use crate::style::StyleSheet;

/// Where the report fonts live unless told otherwise.
pub const DEFAULT_FONT_DIR: &str = "/app/assets/fonts";
/// Family name the report styles refer to.
pub const REPORT_FAMILY: &str = "Inter";
pub const REGULAR_FONT_FILE: &str = "Inter.ttf";
pub const BOLD_FONT_FILE: &str = "Inter-Bold.ttf";

/// Immutable fonts + styles.
pub struct ReportResources {
    pub fonts: FontManager,
    pub styles: StyleSheet,
}

impl ReportResources {
    fn with_fonts(fonts: FontManager) -> Result<Self> {
        let styles = StyleSheet::new(fonts.family());
        styles.validate()?;
        Ok(Self { fonts, styles })
    }

    /// Load `Inter.ttf` and `Inter-Bold.ttf` from `dir`.
    ///
    /// Missing or unreadable files are an [`crate::Error::Font`]; callers
    /// treat that as fatal at startup.
    pub fn from_font_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let regular: PathBuf = dir.join(REGULAR_FONT_FILE);
        let bold: PathBuf = dir.join(BOLD_FONT_FILE);
        let res = Self::from_font_files(REPORT_FAMILY, &regular, &bold)?;
        log::info!("Loaded report fonts from {}", dir.display());
        Ok(res)
    }

    /// Register `family` from an explicit regular/bold file pair.
    pub fn from_font_files(family: &str, regular: &Path, bold: &Path) -> Result<Self> {
        Self::with_fonts(FontManager::from_files(family, regular, bold)?)
    }

    /// Fonts from [`DEFAULT_FONT_DIR`].
    pub fn from_default_fonts() -> Result<Self> {
        Self::from_font_dir(DEFAULT_FONT_DIR)
    }

    /// Base-14 Helvetica in place of the report fonts.
    pub fn builtin() -> Self {
        let fonts = FontManager::builtin();
        let styles = StyleSheet::new(fonts.family());
        Self { fonts, styles }
    }
}
