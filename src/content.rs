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

//! # Arca Archive Content
//!
//! A [`TableContent`] ties a [`Table`] to its schema entry, its declared
//! key columns and the key tuples materialized from them. Key tuples are
//! the identity used by merging and deletion: for the core they are the
//! values of its key columns, for an extension they are the linked core
//! key values followed by any extension-local keys. They are rebuilt by
//! `Archive::build_indexes` whenever linkage is about to be used.
//!
//! [`ContentData`] is the caller-facing description of a table to be put
//! into an archive: the data itself, inline or as CSV files on disk, plus
//! the row type and optional keys and associated media files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{ArcaError, Result};
use crate::meta::{CsvEncoding, MetaElementInfo};
use crate::table::{Cell, Stat, Table};
use crate::terms::RowType;

/// The identity of one row, a tuple of key cell values.
pub type KeyTuple = Vec<Cell>;

/// One table of an archive with its schema entry and key bookkeeping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableContent {
    pub info: MetaElementInfo,
    pub table: Table,
    pub keys: Vec<String>,
    pub row_keys: Vec<KeyTuple>,
    pub stat: Stat,
}

impl TableContent {
    pub fn new(info: MetaElementInfo, table: Table) -> Self {
        let stat = Stat::new(table.row_count());
        TableContent {
            info,
            table,
            keys: Vec::new(),
            row_keys: Vec::new(),
            stat,
        }
    }

    /// Rebuilds the key tuples from this table's own key columns.
    pub fn rebuild_row_keys(&mut self) -> Result<()> {
        let mut key_cols = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let col = self.table.column_index(key).ok_or_else(|| {
                ArcaError::link(format!(
                    "key column {key:?} does not exist in {}",
                    self.info.file_name
                ))
            })?;
            key_cols.push(col);
        }
        self.row_keys = self
            .table
            .rows
            .iter()
            .map(|row| key_cols.iter().map(|&c| row[c].clone()).collect())
            .collect();
        Ok(())
    }

    /// Key tuple to row position lookup. Rows sharing a tuple keep their
    /// positions in insertion order.
    pub fn key_index(&self) -> std::collections::HashMap<&KeyTuple, Vec<usize>> {
        let mut index: std::collections::HashMap<&KeyTuple, Vec<usize>> =
            std::collections::HashMap::new();
        for (i, key) in self.row_keys.iter().enumerate() {
            index.entry(key).or_default().push(i);
        }
        index
    }

    /// Drops the rows not marked for keeping and their key tuples.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        self.table.retain_rows(keep);
        if self.row_keys.len() == keep.len() {
            let mut it = keep.iter();
            self.row_keys.retain(|_| *it.next().unwrap_or(&false));
        }
        self.stat.set_count(self.table.row_count());
    }
}

/// Where the rows of a [`ContentData`] come from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum DataSource {
    /// An in-memory table. The column names are taken as-is.
    Table(Table),
    /// CSV files on disk, each with a header line. Files are concatenated
    /// and fully duplicated rows are dropped.
    Files(Vec<PathBuf>),
}

/// A caller-supplied table destined for an archive, or used to drive a
/// deletion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentData {
    pub data: DataSource,
    pub row_type: RowType,
    /// Key columns. For a core this defaults to the row type's default
    /// keys; for an extension these are its own record-level keys.
    pub keys: Vec<String>,
    /// Media files to embed in the written archive alongside the tables.
    pub associated_files: Vec<PathBuf>,
    pub encoding: CsvEncoding,
}

impl ContentData {
    pub fn new(data: DataSource, row_type: RowType) -> Self {
        ContentData {
            data,
            row_type,
            keys: Vec::new(),
            associated_files: Vec::new(),
            encoding: CsvEncoding::default(),
        }
    }

    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }
}
