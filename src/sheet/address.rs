//! A1-style cell addresses and declared sheet bounds.
//!
//! Indices are zero-based everywhere in the crate; only the textual form is
//! one-based (`A1` is column 0, row 0).

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::EnrichError;

/// Last addressable column (`XFD`)
pub const MAX_COLUMN: u32 = 16_383;
/// Last addressable row (`1048576` in A1 notation)
pub const MAX_ROW: u32 = 1_048_575;

static CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]{1,7})$").expect("cell address regex is valid")
});

/// Encode a column index as letters, rejecting indices past `XFD`
pub fn column_letters(index: u32) -> Result<String, EnrichError> {
    if index > MAX_COLUMN {
        return Err(EnrichError::ColumnOverflow(index));
    }
    Ok(encode_column(index))
}

/// Decode column letters (case-insensitive) into a zero-based index
pub fn column_index(letters: &str) -> Result<u32, EnrichError> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(EnrichError::InvalidAddress(letters.to_string()));
    }

    let mut index: u32 = 0;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        index = index
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| EnrichError::InvalidAddress(letters.to_string()))?;
    }

    let index = index - 1;
    if index > MAX_COLUMN {
        return Err(EnrichError::ColumnOverflow(index));
    }
    Ok(index)
}

// Bijective base-26: there is no zero digit, so shift by one before each division.
fn encode_column(index: u32) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Zero-based cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    // Field order gives row-major ordering.
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub fn new(col: u32, row: u32) -> Self {
        Self { row, col }
    }

    /// A1 text, failing when the address is outside the addressable space
    pub fn to_a1(&self) -> Result<String, EnrichError> {
        if self.row > MAX_ROW {
            return Err(EnrichError::InvalidAddress(format!(
                "row {} past the last addressable row",
                self.row + 1
            )));
        }
        Ok(format!("{}{}", column_letters(self.col)?, self.row + 1))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", encode_column(self.col), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CELL_RE
            .captures(s.trim())
            .ok_or_else(|| EnrichError::InvalidAddress(s.to_string()))?;
        let col = column_index(&caps[1])?;
        let row: u32 = caps[2]
            .parse()
            .map_err(|_| EnrichError::InvalidAddress(s.to_string()))?;
        if row == 0 || row - 1 > MAX_ROW {
            return Err(EnrichError::InvalidAddress(s.to_string()));
        }
        Ok(CellAddress::new(col, row - 1))
    }
}

/// Rectangular extent a sheet claims to occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl Bound {
    pub fn new(start: CellAddress, end: CellAddress) -> Result<Self, EnrichError> {
        if start.col > end.col || start.row > end.row {
            return Err(EnrichError::InvalidAddress(format!("{}:{}", start, end)));
        }
        Ok(Self { start, end })
    }

    /// Bound covering a single cell
    pub fn single(address: CellAddress) -> Self {
        Self {
            start: address,
            end: address,
        }
    }

    pub fn contains(&self, address: CellAddress) -> bool {
        (self.start.col..=self.end.col).contains(&address.col)
            && (self.start.row..=self.end.row).contains(&address.row)
    }

    /// Row holding the column headers
    pub fn header_row(&self) -> u32 {
        self.start.row
    }

    pub fn columns(&self) -> RangeInclusive<u32> {
        self.start.col..=self.end.col
    }

    /// Rows below the header row; empty when the sheet has only a header
    pub fn data_rows(&self) -> RangeInclusive<u32> {
        (self.start.row + 1)..=self.end.row
    }

    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Grow the bound so that it includes `address`
    pub fn extend_to(&mut self, address: CellAddress) {
        self.start.col = self.start.col.min(address.col);
        self.start.row = self.start.row.min(address.row);
        self.end.col = self.end.col.max(address.col);
        self.end.row = self.end.row.max(address.row);
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for Bound {
    type Err = EnrichError;

    /// Parse a dimension string such as `A1:F20` (or a lone `B3`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((start, end)) => Bound::new(start.parse()?, end.parse()?),
            None => Ok(Bound::single(s.parse()?)),
        }
    }
}
