//! Fxstatement - broker statement currency enrichment
//!
//! Reads broker statement workbooks, appends the exchange rate in effect on
//! each transaction date together with formula-based conversions, and adds
//! a summary sheet whose totals are formulas over the enriched sheets.

pub mod config;
pub mod enrich;
pub mod error;
pub mod pipeline;
pub mod rates;
pub mod sheet;
pub mod summary;
pub mod workbook;
