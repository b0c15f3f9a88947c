//! Structural writes: appending derived columns and filling their cells.
//!
//! None of these functions refresh the header index. Callers append every
//! column they need, write the rows, then call `Sheet::refresh_index` once.

use tracing::debug;

use super::address::{CellAddress, MAX_COLUMN};
use super::cell::{Cell, CellValue, Formula};
use super::Sheet;
use crate::error::EnrichError;

/// Append header labels after the last declared column
///
/// Returns the index of the first appended column. The bound grows to cover
/// the new columns and the header index becomes stale. Nothing is written if
/// the new columns would not fit in the addressable space.
pub fn append_columns<S: AsRef<str>>(sheet: &mut Sheet, labels: &[S]) -> Result<u32, EnrichError> {
    let bound = *sheet.bound();
    let first = bound.end.col + 1;
    let count = labels.len() as u32;
    let last = first + count.saturating_sub(1);

    if first > MAX_COLUMN || last > MAX_COLUMN {
        return Err(EnrichError::ColumnOverflow(last.max(first)));
    }
    if count == 0 {
        return Ok(first);
    }

    let header_row = bound.header_row();
    sheet.extend_bound(CellAddress::new(last, header_row));
    for (offset, label) in labels.iter().enumerate() {
        let address = CellAddress::new(first + offset as u32, header_row);
        sheet.set_cell(address, Cell::text(label.as_ref()))?;
    }

    debug!(
        "Appended {} column(s) to '{}' starting at {}",
        count,
        sheet.name(),
        CellAddress::new(first, header_row)
    );
    Ok(first)
}

pub fn write_literal(
    sheet: &mut Sheet,
    address: CellAddress,
    value: CellValue,
) -> Result<(), EnrichError> {
    sheet.set_cell(address, Cell::Literal(value))
}

pub fn write_formula(
    sheet: &mut Sheet,
    address: CellAddress,
    formula: Formula,
) -> Result<(), EnrichError> {
    sheet.set_cell(address, Cell::Formula(formula))
}
