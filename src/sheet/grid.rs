use std::collections::BTreeMap;

use super::address::{Bound, CellAddress};
use super::cell::Cell;
use crate::error::EnrichError;

/// Sparse cell storage with a declared rectangular bound
///
/// Every populated address lies inside the bound; `set` refuses anything
/// else, so the bound can be trusted for iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    bound: Bound,
    cells: BTreeMap<CellAddress, Cell>,
}

impl Grid {
    pub fn new(bound: Bound) -> Self {
        Self {
            bound,
            cells: BTreeMap::new(),
        }
    }

    pub fn bound(&self) -> &Bound {
        &self.bound
    }

    pub fn get(&self, address: CellAddress) -> Option<&Cell> {
        self.cells.get(&address)
    }

    /// Write a cell, replacing whatever was there
    pub fn set(&mut self, address: CellAddress, cell: Cell) -> Result<(), EnrichError> {
        if !self.bound.contains(address) {
            return Err(EnrichError::OutOfBounds {
                address: address.to_string(),
                bound: self.bound.to_string(),
            });
        }
        self.cells.insert(address, cell);
        Ok(())
    }

    /// Widen the declared bound; cells are never dropped by this
    pub(crate) fn extend_bound(&mut self, address: CellAddress) {
        self.bound.extend_to(address);
    }

    /// Populated cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (&CellAddress, &Cell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
