//! In-memory workbook model: sheets, cells, addresses and header indexes.

pub mod address;
pub mod cell;
pub mod grid;
pub mod header;
pub mod mutator;

pub use address::{column_index, column_letters, Bound, CellAddress, MAX_COLUMN};
pub use cell::{Cell, CellValue, Formula, Reference};
pub use grid::Grid;
pub use header::HeaderIndex;

use crate::error::EnrichError;

/// Freshness of a sheet's header index
#[derive(Debug, Clone, PartialEq)]
enum IndexState {
    Indexed(HeaderIndex),
    Dirty,
}

/// One worksheet: its grid plus the derived header index
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    grid: Grid,
    index: IndexState,
}

impl Sheet {
    /// Wrap a grid and index its header row
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        let index = IndexState::Indexed(HeaderIndex::build(&grid));
        Self {
            name: name.into(),
            grid,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn bound(&self) -> &Bound {
        self.grid.bound()
    }

    pub fn cell(&self, address: CellAddress) -> Option<&Cell> {
        self.grid.get(address)
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.index, IndexState::Indexed(_))
    }

    /// Header index, or `StaleIndex` if the sheet changed since the last refresh
    pub fn headers(&self) -> Result<&HeaderIndex, EnrichError> {
        match &self.index {
            IndexState::Indexed(index) => Ok(index),
            IndexState::Dirty => Err(EnrichError::StaleIndex(self.name.clone())),
        }
    }

    /// Rebuild the header index from the current grid
    pub fn refresh_index(&mut self) {
        self.index = IndexState::Indexed(HeaderIndex::build(&self.grid));
    }

    /// Column of the first alias present in the header row
    pub fn column(&self, aliases: &[&str]) -> Result<u32, EnrichError> {
        self.headers()?
            .resolve(aliases)
            .map(|(_, col)| col)
            .ok_or_else(|| EnrichError::MissingColumn {
                sheet: self.name.clone(),
                candidates: aliases.iter().map(|a| a.to_string()).collect(),
            })
    }

    /// Like `column`, but a missing header is `Ok(None)`
    pub fn optional_column(&self, aliases: &[&str]) -> Result<Option<u32>, EnrichError> {
        Ok(self.headers()?.resolve(aliases).map(|(_, col)| col))
    }

    /// Write a cell inside the declared bound
    ///
    /// Writing into the header row invalidates the header index.
    pub fn set_cell(&mut self, address: CellAddress, cell: Cell) -> Result<(), EnrichError> {
        self.grid.set(address, cell)?;
        if address.row == self.grid.bound().header_row() {
            self.index = IndexState::Dirty;
        }
        Ok(())
    }

    pub(crate) fn extend_bound(&mut self, address: CellAddress) {
        self.grid.extend_bound(address);
        self.index = IndexState::Dirty;
    }
}

/// All sheets read from one input workbook
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    name: String,
    sheets: Vec<Sheet>,
}

impl Statement {
    /// `name` is the base name used for the output file
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sheets: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a sheet, replacing any existing sheet with the same name in place
    pub fn push_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
