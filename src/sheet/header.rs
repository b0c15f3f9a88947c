use std::collections::HashMap;
use tracing::warn;

use super::address::CellAddress;
use super::cell::Cell;
use super::grid::Grid;

/// Header label → column mapping for one sheet
///
/// Built from the header row of the grid's declared bound. Empty and absent
/// header cells are left out. When a label repeats, the leftmost column is
/// kept and the later ones are recorded in `duplicates`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderIndex {
    columns: HashMap<String, u32>,
    duplicates: Vec<(String, u32)>,
}

impl HeaderIndex {
    pub fn build(grid: &Grid) -> Self {
        let bound = grid.bound();
        let mut index = HeaderIndex::default();

        for col in bound.columns() {
            let address = CellAddress::new(col, bound.header_row());
            // Formula headers are indexed by their last computed value
            let value = match grid.get(address) {
                Some(Cell::Literal(value)) => value,
                Some(Cell::Formula(formula)) => match formula.cached() {
                    Some(value) => value,
                    None => continue,
                },
                None => continue,
            };
            let label = value.as_text().trim().to_string();
            if label.is_empty() {
                continue;
            }

            if let Some(&first) = index.columns.get(&label) {
                warn!(
                    "Duplicate header '{}' at {} (keeping {})",
                    label,
                    address,
                    CellAddress::new(first, bound.header_row())
                );
                index.duplicates.push((label, col));
            } else {
                index.columns.insert(label, col);
            }
        }

        index
    }

    pub fn get(&self, label: &str) -> Option<u32> {
        self.columns.get(label.trim()).copied()
    }

    /// First alias present in the header row, with its column
    pub fn resolve<'a>(&self, aliases: &[&'a str]) -> Option<(&'a str, u32)> {
        aliases
            .iter()
            .find_map(|alias| self.get(alias).map(|col| (*alias, col)))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Labels sorted by column
    pub fn labels(&self) -> Vec<(&str, u32)> {
        let mut labels: Vec<(&str, u32)> = self
            .columns
            .iter()
            .map(|(label, col)| (label.as_str(), *col))
            .collect();
        labels.sort_by_key(|(_, col)| *col);
        labels
    }

    pub fn duplicates(&self) -> &[(String, u32)] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
