//! Header names read from broker statements and the names of appended columns.
//!
//! Each logical field lists every header label it is known under, most
//! common first. Lookups try them in order and take the first hit.

pub const ACTIVITY_SHEET: &str = "Account Activity";
pub const CLOSED_POSITIONS_SHEET: &str = "Closed Positions";
pub const DIVIDENDS_SHEET: &str = "Dividends";

pub const ACTIVITY_DATE: &[&str] = &["Date"];
pub const ACTIVITY_AMOUNT: &[&str] = &["Amount"];
pub const ACTIVITY_TYPE: &[&str] = &["Type"];

pub const POSITION_AMOUNT: &[&str] = &["Amount"];
pub const POSITION_OPEN_DATE: &[&str] = &["Open Date"];
pub const POSITION_CLOSE_DATE: &[&str] = &["Close Date"];
pub const POSITION_PROFIT: &[&str] = &["Profit", "Profit(USD)"];
pub const POSITION_TYPE: &[&str] = &["Type"];

pub const DIVIDEND_DATE: &[&str] = &["Date of Payment", "Date"];
pub const DIVIDEND_RECEIVED: &[&str] = &["Net Dividend Received (USD)", "Net Dividend Received"];
pub const DIVIDEND_WITHHELD: &[&str] = &["Withholding Tax Amount (USD)", "Withholding Tax Amount"];

/// Labels of the columns this crate appends, parameterised by currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLabels {
    source: String,
    target: String,
}

impl ColumnLabels {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_uppercase(),
            target: target.to_uppercase(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn exchange_rate(&self) -> String {
        "Exchange Rate".to_string()
    }

    pub fn converted_amount(&self) -> String {
        format!("Amount ({})", self.target)
    }

    pub fn open_rate(&self) -> String {
        "Open Exchange Rate".to_string()
    }

    pub fn converted_at_open(&self) -> String {
        format!("Amount at Open ({})", self.target)
    }

    pub fn close_rate(&self) -> String {
        "Close Exchange Rate".to_string()
    }

    pub fn converted_at_close(&self) -> String {
        format!("Amount at Close ({})", self.target)
    }

    pub fn converted_profit(&self) -> String {
        format!("Profit ({})", self.target)
    }

    pub fn converted_dividend(&self) -> String {
        format!("Net Dividend Received ({})", self.target)
    }

    pub fn converted_withholding(&self) -> String {
        format!("Withholding Tax Amount ({})", self.target)
    }
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self::new("USD", "HUF")
    }
}
