//! "Generated on" date banner text.
//!
//! Month names come from a table handed to the formatter, never from the
//! process locale. The built-in table is Spanish.

use chrono::{Datelike, NaiveDate};

use crate::blocks::TextRun;

/// Spanish month names, January first.
pub const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Formats the banner date with a fixed month-name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormatter {
    months: Vec<String>,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::spanish()
    }
}

impl DateFormatter {
    pub fn spanish() -> Self {
        Self {
            months: SPANISH_MONTHS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Use a custom month table. A table that does not hold exactly twelve
    /// non-empty names is not applied: a warning is logged and the Spanish
    /// names are used instead.
    pub fn with_month_names(names: &[String]) -> Self {
        if names.len() == 12 && names.iter().all(|n| !n.trim().is_empty()) {
            Self {
                months: names.to_vec(),
            }
        } else {
            log::warn!(
                "Could not apply month-name table ({} entries); using Spanish month names",
                names.len()
            );
            Self::spanish()
        }
    }

    pub fn month_name(&self, date: NaiveDate) -> &str {
        &self.months[date.month0() as usize]
    }

    /// "Día **D** de **Month** de **YYYY**" as styled runs.
    pub fn banner_runs(&self, date: NaiveDate) -> Vec<TextRun> {
        vec![
            TextRun::plain("Día "),
            TextRun::bold(date.day().to_string()),
            TextRun::plain(" de "),
            TextRun::bold(self.month_name(date)),
            TextRun::plain(" de "),
            TextRun::bold(date.year().to_string()),
        ]
    }
}
