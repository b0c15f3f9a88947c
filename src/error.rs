//! Error handling for statement enrichment
//!
//! The enrichment core reports typed `EnrichError`s so callers can tell a
//! skippable sheet from a file that must be abandoned. The outer layers
//! (reading, writing, the CLI) use anyhow for context chaining.

use chrono::NaiveDate;
use thiserror::Error;

/// Conditions raised by the enrichment core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrichError {
    #[error("missing column in sheet '{sheet}': none of {candidates:?} found")]
    MissingColumn {
        sheet: String,
        candidates: Vec<String>,
    },

    #[error("no exchange rate available for {0}")]
    NoRateAvailable(NaiveDate),

    #[error("column index {0} exceeds the last addressable column (XFD)")]
    ColumnOverflow(u32),

    #[error("rate fetch failed: {0}")]
    RateFetchFailed(String),

    #[error("header index of sheet '{0}' is stale; refresh it after mutating the sheet")]
    StaleIndex(String),

    #[error("cell {address} lies outside the declared bound {bound}")]
    OutOfBounds { address: String, bound: String },

    #[error("invalid cell address: {0}")]
    InvalidAddress(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid amount in cell {0}")]
    InvalidAmount(String),
}

impl EnrichError {
    /// Whether the condition only invalidates one sheet rather than the file
    pub fn is_sheet_local(&self) -> bool {
        matches!(self, EnrichError::MissingColumn { .. })
    }
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = EnrichError::MissingColumn {
            sheet: "Closed Positions".to_string(),
            candidates: vec!["Profit".to_string(), "Profit(USD)".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing column in sheet 'Closed Positions': none of [\"Profit\", \"Profit(USD)\"] found"
        );
    }

    #[test]
    fn test_only_missing_column_is_sheet_local() {
        let missing = EnrichError::MissingColumn {
            sheet: "Dividends".to_string(),
            candidates: vec!["Date of Payment".to_string()],
        };
        assert!(missing.is_sheet_local());

        let date = NaiveDate::from_ymd_opt(2022, 1, 2).unwrap();
        assert!(!EnrichError::NoRateAvailable(date).is_sheet_local());
        assert!(!EnrichError::ColumnOverflow(16384).is_sheet_local());
        assert!(!EnrichError::RateFetchFailed("timeout".to_string()).is_sheet_local());
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> = Err(EnrichError::RateFetchFailed("http 503".to_string()))
            .context("failed to process statement.xlsx");
        match result {
            Err(e) => {
                assert!(e.to_string().contains("failed to process statement.xlsx"));
                let debug_msg = format!("{:?}", e);
                assert!(debug_msg.contains("http 503"));
                assert!(e.downcast_ref::<EnrichError>().is_some());
            }
            Ok(_) => panic!("expected error"),
        }
    }
}
