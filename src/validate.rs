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

//! # Arca Content Validation
//!
//! Checks run before an archive is created or merged: every declared key
//! cell must be populated, key tuples must be unique (compared without
//! case), and every column must carry a usable name. Failures are
//! collected in a [`ValidationReport`] so a caller can write them out or
//! inspect them, and are logged as they are found.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use log::{error, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::archive::Archive;
use crate::content::TableContent;
use crate::errors::{ArcaError, Result};
use crate::table::Cell;
use crate::terms::RowType;

/// The kind of a validation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationKind {
    /// A declared key cell is null.
    EmptyKeys,
    /// The same key tuple appears on more than one row.
    DuplicateKeys,
    /// A column name is blank or a placeholder.
    UnnamedColumns,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValidationKind::EmptyKeys => "EMPTY_KEYS",
            ValidationKind::DuplicateKeys => "DUPLICATE_KEYS",
            ValidationKind::UnnamedColumns => "UNNAMED_COLUMNS",
        };
        f.write_str(label)
    }
}

/// One recorded validation failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Row type URI of the content the failure was found in.
    pub content: String,
    pub kind: ValidationKind,
    /// The offending values, where the failure has any.
    pub values: Vec<String>,
    /// Zero-based positions of the offending rows.
    pub rows: Vec<usize>,
}

/// The collected failures of a validation pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, content: &str, kind: ValidationKind, values: Vec<String>, rows: Vec<usize>) {
        self.issues.push(ValidationIssue {
            content: content.to_string(),
            kind,
            values,
            rows,
        });
    }

    /// Writes the report as a CSV file with one line per failure.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())
            .map_err(|e| ArcaError::Csv(e.to_string()))?;
        writer.write_record(["Content", "Message", "Error", "Row"])?;
        for issue in &self.issues {
            writer.write_record([
                issue.content.as_str(),
                &issue.kind.to_string(),
                &issue.values.join("|"),
                &issue
                    .rows
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join("|"),
            ])?;
        }
        writer.flush().map_err(|e| ArcaError::Csv(e.to_string()))?;
        Ok(())
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ArcaError::internal(e.to_string()))
    }
}

/// Checks one table for empty and duplicated key values.
///
/// Key tuples are compared case-insensitively and the first occurrence of
/// a duplicated tuple is considered the valid one. Returns whether the
/// table passed.
pub fn check_duplicates(
    content: &TableContent,
    report: &mut ValidationReport,
) -> Result<bool> {
    if content.keys.is_empty() {
        return Ok(true);
    }
    let content_name = content.info.row_type.uri();
    let mut key_idxs = Vec::with_capacity(content.keys.len());
    for key in &content.keys {
        key_idxs.push(content.table.column_index(key).ok_or_else(|| {
            ArcaError::validation(format!(
                "key column {key:?} does not exist in {}",
                content.info.file_name
            ))
        })?);
    }

    let mut ok = true;

    let empty_rows: Vec<usize> = content
        .table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| key_idxs.iter().any(|&c| row[c].is_none()))
        .map(|(i, _)| i)
        .collect();
    if !empty_rows.is_empty() {
        error!(
            "empty values found in {:?}, rows affected: {:?}",
            content.keys, empty_rows
        );
        report.push(&content_name, ValidationKind::EmptyKeys, Vec::new(), empty_rows);
        ok = false;
    }

    let mut seen: HashSet<Vec<Cell>> = HashSet::new();
    let mut duplicate_rows = Vec::new();
    let mut duplicate_values = Vec::new();
    for (i, row) in content.table.rows.iter().enumerate() {
        let lowered: Vec<Cell> = key_idxs
            .iter()
            .map(|&c| row[c].as_ref().map(|v| v.to_lowercase()))
            .collect();
        if !seen.insert(lowered) {
            duplicate_rows.push(i);
            for &c in &key_idxs {
                if let Some(value) = row[c].as_deref() {
                    if !duplicate_values.iter().any(|v: &String| v == value) {
                        duplicate_values.push(value.to_string());
                    }
                }
            }
        }
    }
    if !duplicate_rows.is_empty() {
        error!(
            "duplicate {:?} found, rows affected: {:?}, values: {:?}",
            content.keys, duplicate_rows, duplicate_values
        );
        report.push(
            &content_name,
            ValidationKind::DuplicateKeys,
            duplicate_values,
            duplicate_rows,
        );
        ok = false;
    }

    Ok(ok)
}

/// Checks that every column of a table has a usable name.
///
/// Blank names and `unnamed:` placeholders, as produced by readers that
/// auto-name headerless columns, both fail the check.
pub fn check_columns(content: &TableContent, report: &mut ValidationReport) -> Result<bool> {
    let content_name = content.info.row_type.uri();
    if content
        .table
        .columns
        .iter()
        .any(|c| c.trim().is_empty())
    {
        error!("some column headers of {} are blank", content.info.file_name);
        report.push(
            &content_name,
            ValidationKind::UnnamedColumns,
            Vec::new(),
            Vec::new(),
        );
        return Ok(false);
    }

    let placeholder =
        Regex::new("(?i)^unnamed:").map_err(|e| ArcaError::internal(e.to_string()))?;
    if content
        .table
        .columns
        .iter()
        .any(|c| placeholder.is_match(c))
    {
        error!(
            "one or more column of {} is unnamed, this usually happens when the csv has an empty column",
            content.info.file_name
        );
        report.push(
            &content_name,
            ValidationKind::UnnamedColumns,
            vec!["^unnamed".to_string()],
            Vec::new(),
        );
        return Ok(false);
    }

    Ok(true)
}

impl Archive {
    /// Validates the archive contents, always including the core.
    ///
    /// `extra_types` widens the pass to further row types, validated with
    /// their already-declared keys; an entry that restates the core's row
    /// type and key set is not validated twice. Returns whether every
    /// checked table passed, with failures collected in `report`.
    pub fn validate_content(
        &self,
        extra_types: Option<&HashMap<RowType, Vec<String>>>,
        report: &mut ValidationReport,
    ) -> Result<bool> {
        let core = self.core()?;
        let mut to_validate: Vec<RowType> = vec![core.info.row_type.clone()];
        if let Some(extra) = extra_types {
            let core_keys: HashSet<&String> = core.keys.iter().collect();
            for (row_type, keys) in extra {
                let same_as_core = *row_type == core.info.row_type
                    && keys.iter().collect::<HashSet<_>>() == core_keys;
                if !same_as_core && !to_validate.contains(row_type) {
                    to_validate.push(row_type.clone());
                }
            }
        }

        let mut all_passed = true;
        for row_type in &to_validate {
            for locator in self.find_content(row_type, None) {
                let content = match locator.0 {
                    crate::meta::CoreOrExt::Core => self.core()?,
                    crate::meta::CoreOrExt::Extension => &self.extensions()[locator.1],
                };
                let keys_ok = check_duplicates(content, report)?;
                let columns_ok = check_columns(content, report)?;
                if keys_ok && columns_ok {
                    info!(
                        "validation successful for {} content {} with keys {:?}",
                        content.info.core_or_ext.tag(),
                        content.info.file_name,
                        content.keys
                    );
                } else {
                    error!(
                        "validation failed for {} content {} with keys {:?}",
                        content.info.core_or_ext.tag(),
                        content.info.file_name,
                        content.keys
                    );
                    all_passed = false;
                }
            }
        }
        Ok(all_passed)
    }
}
