//! Copyright © 2025-2026 The Arca Project. All Rights Reserved.
//!
//! This file is part of Arca.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Arca Tables
//!
//! An in-memory tabular value: named columns over rows of optional string
//! cells. A `None` cell is a null, distinct from an empty string, which
//! mirrors the difference between a missing CSV field and a present but
//! empty one.
//!
//! Tables are deliberately simple. All typed interpretation is left to the
//! caller; the merge and validation machinery in this crate only ever needs
//! positional access, column lookup by name, and row append/remove.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell value. `None` is a null.
pub type Cell = Option<String>;

/// A named-column table of optional string cells.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// An empty table with the given columns.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Name-to-position lookup for repeated access.
    pub fn column_map(&self) -> HashMap<&str, usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect()
    }

    /// Cell at a row and column name, flattened so a missing column reads
    /// as a null.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Appends a column, padding existing rows with the given fill value.
    pub fn add_column(&mut self, name: &str, fill: Cell) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(fill.clone());
        }
    }

    /// Inserts a column at the front of the table, one value per row.
    ///
    /// `values` must hold exactly one cell per existing row.
    pub fn insert_column_front(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.insert(0, name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(0, value);
        }
    }

    /// Removes a column by name, dropping its cell from every row.
    /// Returns whether the column existed.
    pub fn remove_column(&mut self, name: &str) -> bool {
        let Some(col) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(col);
        for row in &mut self.rows {
            if col < row.len() {
                row.remove(col);
            }
        }
        true
    }

    /// Keeps only the rows at the given positions, in order.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.rows.len());
        let mut it = keep.iter();
        self.rows.retain(|_| *it.next().unwrap_or(&false));
    }

    /// True when every cell of the row is null or an empty string.
    pub fn row_is_empty(row: &[Cell]) -> bool {
        row.iter()
            .all(|cell| cell.as_deref().map_or(true, |v| v.is_empty()))
    }
}

/// Record-count bookkeeping for one table as operations run over it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub start_record_count: usize,
    pub current_record_count: usize,
    pub updated_record_count: usize,
}

impl Stat {
    pub fn new(records: usize) -> Self {
        Stat {
            start_record_count: records,
            current_record_count: records,
            updated_record_count: 0,
        }
    }

    pub fn set_count(&mut self, count: usize) {
        self.current_record_count = count;
    }

    pub fn add_update_count(&mut self, count: usize) {
        self.updated_record_count += count;
    }

    /// Absolute difference between the start and current record counts.
    pub fn diff(&self) -> usize {
        self.current_record_count.abs_diff(self.start_record_count)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Start: {}, New: {}, Diff: {}, Updates: {}",
            self.start_record_count,
            self.current_record_count,
            self.diff(),
            self.updated_record_count
        )
    }
}
