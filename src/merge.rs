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

//! # Arca Reconciliation
//!
//! Merging applies a delta archive onto a base archive. Rows are matched
//! by key tuple: a base row whose tuple also appears in the delta has its
//! non-key cells overwritten, and delta rows with unseen tuples are
//! appended. Columns the delta adds are appended to the base table and
//! recorded in the schema.
//!
//! Extensions are reconciled before the core, matched by row type and
//! optionally by file name. A delta extension with no counterpart in the
//! base is adopted wholesale. With extension sync enabled, base extension
//! rows belonging to core records present in both archives are dropped
//! first so the delta's extension rows replace them instead of piling up.

use std::collections::HashSet;

use log::{debug, info};

use crate::archive::Archive;
use crate::content::{KeyTuple, TableContent};
use crate::errors::{ArcaError, Result};
use crate::meta::{CoreOrExt, CORE_ID_FIELD, ID_FIELD};
use crate::table::Cell;

impl Archive {
    /// Merges a delta archive into this one.
    ///
    /// Both archives must be keyed on the same core key columns; when no
    /// keys have been declared the core row type's defaults are used.
    /// `match_by_filename` narrows extension matching to same-named files,
    /// for archives carrying several extensions of one row type.
    pub fn merge_contents(
        &mut self,
        delta: &mut Archive,
        extension_sync: bool,
        match_by_filename: bool,
    ) -> Result<()> {
        self.ensure_core_keys()?;
        let core_keys = self.core()?.keys.clone();
        if delta.core()?.keys.is_empty() {
            delta.core_mut()?.keys = core_keys.clone();
        }

        self.build_indexes()?;
        delta.build_indexes()?;

        // Core records present in both archives, used for extension sync.
        let shared_core_keys: HashSet<KeyTuple> = if extension_sync {
            let delta_keys: HashSet<&KeyTuple> = delta.core()?.row_keys.iter().collect();
            self.core()?
                .row_keys
                .iter()
                .filter(|k| delta_keys.contains(k))
                .cloned()
                .collect()
        } else {
            HashSet::new()
        };

        for delta_ext in &delta.extensions {
            let file_name = match_by_filename.then_some(delta_ext.info.file_name.as_str());
            // A match on the core alone is no extension match; a delta
            // extension sharing the core's row type is still adopted.
            let locators: Vec<_> = self
                .find_content(&delta_ext.info.row_type, file_name)
                .into_iter()
                .filter(|locator| locator.0 == CoreOrExt::Extension)
                .collect();
            if locators.is_empty() {
                self.adopt_extension(delta_ext);
                continue;
            }
            for locator in locators {
                if extension_sync {
                    let ext = &mut self.extensions[locator.1];
                    drop_synced_rows(ext, &shared_core_keys, core_keys.len());
                }
                let ext = &mut self.extensions[locator.1];
                let new_columns = merge_table(ext, delta_ext, &core_keys, true)?;
                debug!(
                    "merged extension {}, stats show {}",
                    ext.info.file_name, ext.stat
                );
                if !new_columns.is_empty() {
                    info!("new columns added: {}", new_columns.join(","));
                    let info = ext.info.clone();
                    let headers = ext.table.columns.clone();
                    self.meta.update_element(info, &headers, None);
                }
            }
        }

        let delta_core = delta.core()?;
        let core = self
            .core
            .as_mut()
            .ok_or_else(|| ArcaError::internal("archive has no core content"))?;
        let new_columns = merge_table(core, delta_core, &core_keys, true)?;
        debug!("merged core content, stats show {}", core.stat);
        if !new_columns.is_empty() {
            info!("new columns added: {}", new_columns.join(","));
            let info = core.info.clone();
            let headers = core.table.columns.clone();
            self.meta.update_element(info, &headers, None);
        }
        Ok(())
    }

    fn ensure_core_keys(&mut self) -> Result<()> {
        if self.core()?.keys.is_empty() {
            let defaults = self.core()?.info.row_type.default_keys();
            if defaults.is_empty() {
                return Err(ArcaError::validation(
                    "no key columns declared for the core content and its row type has no default",
                ));
            }
            self.core_mut()?.keys = defaults;
        }
        Ok(())
    }

    /// Brings a delta extension with no base counterpart into this archive.
    fn adopt_extension(&mut self, delta_ext: &TableContent) {
        info!(
            "adopting extension {} from the delta archive",
            delta_ext.info.file_name
        );
        let adopted = delta_ext.clone();
        let index_field = adopted
            .table
            .has_column(CORE_ID_FIELD)
            .then_some(CORE_ID_FIELD);
        self.meta
            .update_element(adopted.info.clone(), &adopted.table.columns, index_field);
        self.extensions.push(adopted);
    }
}

/// Removes extension rows whose core record exists in both archives, so
/// the delta's rows for that record fully replace them.
fn drop_synced_rows(
    ext: &mut TableContent,
    shared_core_keys: &HashSet<KeyTuple>,
    core_key_len: usize,
) {
    let keep: Vec<bool> = ext
        .row_keys
        .iter()
        .map(|key| {
            let core_part = key.get(..core_key_len).unwrap_or(key);
            !shared_core_keys.contains(core_part)
        })
        .collect();
    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped > 0 {
        info!(
            "{} rows dropped from extension {} by extension sync",
            dropped, ext.info.file_name
        );
        ext.retain_rows(&keep);
    }
}

/// Applies a delta table onto a base table, matching rows on key tuple.
///
/// Columns the delta adds (other than key columns) are appended to the
/// base, initialized empty, and returned. With `update` set, matched base
/// rows take the delta's values in every column except the keys and the
/// record identifiers. Delta rows with unmatched tuples are appended.
pub(crate) fn merge_table(
    content: &mut TableContent,
    delta: &TableContent,
    keys: &[String],
    update: bool,
) -> Result<Vec<String>> {
    let new_columns: Vec<String> = delta
        .table
        .columns
        .iter()
        .filter(|c| !content.table.has_column(c) && !keys.contains(c))
        .cloned()
        .collect();
    for col in &new_columns {
        content.table.add_column(col, Some(String::new()));
    }

    if update {
        let delta_index = delta.key_index();
        let excluded: Vec<&str> = keys
            .iter()
            .map(String::as_str)
            .chain([ID_FIELD, CORE_ID_FIELD])
            .collect();
        let update_cols: Vec<(usize, usize)> = delta
            .table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !excluded.contains(&c.as_str()))
            .filter_map(|(d, c)| content.table.column_index(c).map(|b| (b, d)))
            .collect();

        let mut updated = 0usize;
        for (i, key) in content.row_keys.iter().enumerate() {
            let Some(delta_rows) = delta_index.get(key) else {
                continue;
            };
            let delta_row = &delta.table.rows[delta_rows[0]];
            for &(b, d) in &update_cols {
                content.table.rows[i][b] = delta_row[d].clone();
            }
            updated += 1;
        }
        content.stat.add_update_count(updated);
    }

    let base_keys: HashSet<KeyTuple> = content.row_keys.iter().cloned().collect();
    let column_sources: Vec<Option<usize>> = content
        .table
        .columns
        .iter()
        .map(|c| delta.table.column_index(c))
        .collect();
    for (j, key) in delta.row_keys.iter().enumerate() {
        if base_keys.contains(key) {
            continue;
        }
        let delta_row = &delta.table.rows[j];
        let new_row: Vec<Cell> = column_sources
            .iter()
            .map(|src| src.and_then(|d| delta_row.get(d).cloned().flatten()))
            .collect();
        content.table.rows.push(new_row);
        content.row_keys.push(key.clone());
    }
    content.stat.set_count(content.table.row_count());
    Ok(new_columns)
}
