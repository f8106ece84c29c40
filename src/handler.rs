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

//! # Arca Operations
//!
//! [`DwcaHandler`] bundles the end-to-end archive operations: create an
//! archive from caller tables, merge a delta archive into a base one,
//! delete records, strip extension files and validate contents. Each
//! operation reads its inputs, runs the engine and writes the resulting
//! archive out, so a caller never has to sequence the underlying steps.

use std::collections::HashMap;
use std::path::Path;

use log::error;

use crate::archive::Archive;
use crate::content::ContentData;
use crate::eml::EmlContent;
use crate::errors::{ArcaError, Result};
use crate::meta::CoreOrExt;
use crate::terms::{list_row_types, list_terms, RowType, RowTypeEntry, TermEntry};
use crate::validate::ValidationReport;

/// Entry points for whole-archive operations.
pub struct DwcaHandler;

impl DwcaHandler {
    /// The embedded vocabulary term table.
    pub fn terms() -> &'static [TermEntry] {
        list_terms()
    }

    /// The embedded class row-type table.
    pub fn row_types() -> &'static [RowTypeEntry] {
        list_row_types()
    }

    /// Assembles an archive from a core table and extension tables.
    ///
    /// The core is validated first and, unless a multimedia extension is
    /// supplied, any embedded associated-media column is split out into
    /// one. Multimedia extensions get their missing format and type
    /// backfilled from the media URL.
    pub fn build_archive(
        core: &ContentData,
        extensions: &[ContentData],
        validate_content: bool,
        eml: &EmlContent,
    ) -> Result<Archive> {
        let mut archive = Archive::new();
        archive.extract_content(core, CoreOrExt::Core)?;

        let mut ext_list: Vec<ContentData> = extensions.to_vec();
        if !ext_list.iter().any(|e| e.row_type == RowType::Multimedia) {
            if let Some(media) = archive.convert_associated_media_to_extension()? {
                ext_list.push(media);
            }
        }
        for ext in &ext_list {
            archive.extract_content(ext, CoreOrExt::Extension)?;
            if ext.row_type == RowType::Multimedia {
                let index = archive.extensions().len() - 1;
                archive.fill_multimedia_info(index)?;
            }
        }

        if validate_content {
            // Occurrence and event extensions with declared keys join the
            // core in the pass; other extensions have no uniqueness
            // contract to check.
            let extra: HashMap<RowType, Vec<String>> = archive
                .extensions()
                .iter()
                .filter(|ext| {
                    matches!(
                        ext.info.row_type,
                        RowType::Occurrence | RowType::Event
                    ) && !ext.keys.is_empty()
                })
                .map(|ext| (ext.info.row_type.clone(), ext.keys.clone()))
                .collect();
            let mut report = ValidationReport::new();
            if !archive.validate_content(Some(&extra), &mut report)? {
                error!("validation errors found, archive is not created");
                return Err(ArcaError::validation(
                    "validation errors found, archive is not created",
                ));
            }
        }

        archive.eml = eml.text();
        Ok(archive)
    }

    /// Creates an archive zip file from a core table and extensions.
    pub fn create_dwca(
        core: &ContentData,
        extensions: &[ContentData],
        output_dwca: impl AsRef<Path>,
        validate_content: bool,
        eml: &EmlContent,
    ) -> Result<()> {
        let archive = Self::build_archive(core, extensions, validate_content, eml)?;
        archive.write(output_dwca)
    }

    /// Merges a delta archive into a base archive and writes the result.
    ///
    /// `keys_lookup` declares the key columns per row type for matching
    /// records across the two archives. The delta is validated before use
    /// unless `validate_delta` is cleared. With `extension_sync`, base
    /// extension rows of core records present in both archives are
    /// replaced by the delta's rows instead of merged row by row.
    pub fn merge_dwca(
        dwca_file: impl AsRef<Path>,
        delta_dwca_file: impl AsRef<Path>,
        output_dwca: impl AsRef<Path>,
        keys_lookup: &HashMap<RowType, Vec<String>>,
        extension_sync: bool,
        validate_delta: bool,
    ) -> Result<()> {
        let mut archive = Archive::read(dwca_file)?;
        let mut delta = Archive::read(delta_dwca_file)?;
        archive.set_keys(keys_lookup, true)?;
        delta.set_keys(keys_lookup, true)?;

        if validate_delta {
            let mut report = ValidationReport::new();
            if !delta.validate_content(None, &mut report)? {
                error!("validation errors found in the delta archive, archives are not merged");
                return Err(ArcaError::validation(
                    "validation errors found in the delta archive, archives are not merged",
                ));
            }
        }

        archive.merge_contents(&mut delta, extension_sync, false)?;
        archive.write(output_dwca)
    }

    /// Deletes records from an archive and writes the result.
    pub fn delete_records(
        dwca_file: impl AsRef<Path>,
        records_to_delete: &ContentData,
        output_dwca: impl AsRef<Path>,
    ) -> Result<()> {
        let mut archive = Archive::read(dwca_file)?;
        archive.delete_records(records_to_delete)?;
        archive.write(output_dwca)
    }

    /// Strips the named extension files from an archive and writes the
    /// remainder.
    pub fn remove_extension_files(
        dwca_file: impl AsRef<Path>,
        ext_files: &[String],
        output_dwca: impl AsRef<Path>,
    ) -> Result<()> {
        let archive = Archive::read_excluding(dwca_file, ext_files)?;
        archive.write(output_dwca)
    }

    /// Validates an archive, optionally writing the failures to a CSV
    /// report file. Returns whether every checked table passed.
    pub fn validate_dwca(
        dwca_file: impl AsRef<Path>,
        keys_lookup: &HashMap<RowType, Vec<String>>,
        error_file: Option<&Path>,
    ) -> Result<bool> {
        let mut archive = Archive::read(dwca_file)?;
        let applied = archive.set_keys(keys_lookup, false)?;
        let mut report = ValidationReport::new();
        let passed = archive.validate_content(Some(&applied), &mut report)?;
        if let Some(path) = error_file {
            report.write_csv(path)?;
        }
        Ok(passed)
    }

    /// Validates a loose table as if it were an archive core, optionally
    /// writing the failures to a CSV report file.
    pub fn validate_file(csv: &ContentData, error_file: Option<&Path>) -> Result<bool> {
        let mut archive = Archive::new();
        archive.extract_content(csv, CoreOrExt::Core)?;
        let mut report = ValidationReport::new();
        let passed = archive.validate_content(None, &mut report)?;
        if let Some(path) = error_file {
            report.write_csv(path)?;
        }
        Ok(passed)
    }
}
