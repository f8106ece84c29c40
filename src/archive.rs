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

//! # Arca Archives
//!
//! [`Archive`] is the in-memory form of a Darwin Core Archive: one core
//! table, any number of extension tables, the schema that binds them and
//! the optional dataset metadata document. It can be read from a zip file,
//! assembled table by table from caller-supplied content, reconciled
//! against another archive and written back out.
//!
//! ## Record linkage
//!
//! Extensions reference their core record through an id column declared in
//! the schema. When a table is keyed by more than one column no single
//! column can carry that reference, so synthetic UUID identifiers are
//! generated for the core and joined onto the extensions. `build_indexes`
//! materializes, for every table, the key tuple of each row; extension
//! tuples carry the linked core key values so that rows stay comparable
//! across archives whose synthetic identifiers differ.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use regex::Regex;
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::content::{ContentData, DataSource, KeyTuple, TableContent};
use crate::csvio::{read_table, write_table};
use crate::errors::{ArcaError, Result};
use crate::meta::{
    CoreOrExt, CsvEncoding, Meta, MetaElementInfo, CORE_ID_FIELD, ID_FIELD, META_XML,
};
use crate::table::{Cell, Table};
use crate::terms::{extract_term, RowType};

/// An in-memory Darwin Core Archive.
#[derive(Clone, Debug, Default)]
pub struct Archive {
    pub meta: Meta,
    pub eml: Option<String>,
    pub(crate) core: Option<TableContent>,
    pub(crate) extensions: Vec<TableContent>,
    pub(crate) embedded_files: Vec<PathBuf>,
}

impl Archive {
    /// An empty archive, to be filled through [`Archive::extract_content`].
    pub fn new() -> Self {
        Archive {
            meta: Meta::new(),
            eml: None,
            core: None,
            extensions: Vec::new(),
            embedded_files: Vec::new(),
        }
    }

    /// The core table content.
    pub fn core(&self) -> Result<&TableContent> {
        self.core
            .as_ref()
            .ok_or_else(|| ArcaError::internal("archive has no core content"))
    }

    pub fn core_mut(&mut self) -> Result<&mut TableContent> {
        self.core
            .as_mut()
            .ok_or_else(|| ArcaError::internal("archive has no core content"))
    }

    pub fn extensions(&self) -> &[TableContent] {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Vec<TableContent> {
        &mut self.extensions
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Reads an archive zip file from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Archive> {
        Self::read_excluding(path, &[])
    }

    /// Reads an archive zip file, leaving out the named extension files.
    pub fn read_excluding(path: impl AsRef<Path>, exclude_files: &[String]) -> Result<Archive> {
        let file = File::open(path.as_ref())?;
        let mut zip = ZipArchive::new(file)?;
        Self::from_zip(&mut zip, exclude_files)
    }

    /// Reads an archive held in memory as zip bytes.
    pub fn read_bytes(bytes: &[u8], exclude_files: &[String]) -> Result<Archive> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        Self::from_zip(&mut zip, exclude_files)
    }

    fn zip_entry_string<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<String> {
        let mut entry = zip.by_name(name)?;
        let mut buffer = String::new();
        entry.read_to_string(&mut buffer)?;
        Ok(buffer)
    }

    fn from_zip<R: Read + Seek>(zip: &mut ZipArchive<R>, exclude_files: &[String]) -> Result<Archive> {
        let names: Vec<String> = zip.file_names().map(str::to_string).collect();
        info!("reading archive containing: {}", names.join(","));

        let meta_xml = Self::zip_entry_string(zip, META_XML)
            .map_err(|_| ArcaError::meta("archive does not contain a meta.xml file"))?;
        let mut meta = Meta::parse(&meta_xml)?;

        let eml = if names.iter().any(|n| n == &meta.eml_file_name) {
            Some(Self::zip_entry_string(zip, &meta.eml_file_name.clone())?)
        } else {
            None
        };

        if !exclude_files.is_empty() {
            meta.remove_elements(exclude_files);
        }

        let mut core = None;
        let mut extensions = Vec::new();
        for element in meta.elements.clone() {
            let columns = element.declared_columns()?;
            let data = Self::zip_entry_string(zip, &element.info.file_name)?;
            let table = read_table(
                data.as_bytes(),
                &element.info.encoding,
                Some(&columns),
                element.info.ignore_header_lines,
            )?;
            let content = TableContent::new(element.info.clone(), table);
            match element.info.core_or_ext {
                CoreOrExt::Core => core = Some(content),
                CoreOrExt::Extension => extensions.push(content),
            }
        }

        Ok(Archive {
            meta,
            eml,
            core,
            extensions,
            embedded_files: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Content lookup and keys
    // ------------------------------------------------------------------

    /// Locates the contents matching a row type and, when given, a file
    /// name. The core is listed before any extension.
    pub fn find_content(
        &self,
        row_type: &RowType,
        file_name: Option<&str>,
    ) -> Vec<(CoreOrExt, usize)> {
        let matches = |content: &TableContent| {
            if let Some(name) = file_name {
                if content.info.file_name != name {
                    return false;
                }
            }
            content.info.row_type == *row_type
        };
        let mut found = Vec::new();
        if let Some(core) = &self.core {
            if matches(core) {
                found.push((CoreOrExt::Core, 0));
            }
        }
        for (i, ext) in self.extensions.iter().enumerate() {
            if matches(ext) {
                found.push((CoreOrExt::Extension, i));
            }
        }
        found
    }

    fn content_mut(&mut self, locator: (CoreOrExt, usize)) -> Result<&mut TableContent> {
        match locator {
            (CoreOrExt::Core, _) => self.core_mut(),
            (CoreOrExt::Extension, i) => self
                .extensions
                .get_mut(i)
                .ok_or_else(|| ArcaError::internal("extension content index out of range")),
        }
    }

    /// Declares the key columns of the contents named by row type.
    ///
    /// A key given in URI form is reduced to its local term name when the
    /// table has no column under the full URI. With `strict` set, any
    /// extension still without keys falls back to its row type's defaults,
    /// which extension reconciliation relies on.
    pub fn set_keys(
        &mut self,
        keys: &HashMap<RowType, Vec<String>>,
        strict: bool,
    ) -> Result<HashMap<RowType, Vec<String>>> {
        let mut applied = HashMap::new();
        for (row_type, key_list) in keys {
            for locator in self.find_content(row_type, None) {
                let content = self.content_mut(locator)?;
                let mut resolved = Vec::with_capacity(key_list.len());
                for key in key_list {
                    if content.table.has_column(key) {
                        resolved.push(key.clone());
                    } else {
                        resolved.push(extract_term(key)?);
                    }
                }
                content.keys = resolved.clone();
                applied.insert(row_type.clone(), resolved);
            }
        }
        if strict {
            for content in &mut self.extensions {
                if content.keys.is_empty() {
                    let defaults = content.info.row_type.default_keys();
                    if !defaults.is_empty() {
                        applied.insert(content.info.row_type.clone(), defaults.clone());
                        content.keys = defaults;
                    }
                }
            }
        }
        Ok(applied)
    }

    // ------------------------------------------------------------------
    // Linkage
    // ------------------------------------------------------------------

    /// The column carrying the record identifier of a table, resolved from
    /// its schema entry: the field mapped at the declared id index, or the
    /// synthetic `id`/`coreid` column when no field occupies that index.
    fn id_column_for(&self, content: &TableContent) -> Option<String> {
        let element = self
            .meta
            .elements
            .iter()
            .find(|e| e.info.file_name == content.info.file_name)?;
        let id_index = element.core_id.as_ref()?.index?;
        for field in &element.fields {
            if field.index == Some(id_index) {
                return Some(field.field_name.clone());
            }
        }
        Some(match content.info.core_or_ext {
            CoreOrExt::Core => ID_FIELD.to_string(),
            CoreOrExt::Extension => CORE_ID_FIELD.to_string(),
        })
    }

    /// Materializes the key tuples of every table.
    ///
    /// Core tuples are the values of its key columns. Extension rows are
    /// first filtered down to those with a non-empty identifier that
    /// resolves to a core record; their tuples are the linked core key
    /// values followed by any extension-local key values.
    pub fn build_indexes(&mut self) -> Result<()> {
        if !self.extensions.is_empty() {
            let core = self.core()?;
            let id_column = self.id_column_for(core).ok_or_else(|| {
                ArcaError::link("core content has no record identifier binding")
            })?;
            let id_idx = core.table.column_index(&id_column).ok_or_else(|| {
                ArcaError::link(format!(
                    "identifier column {id_column:?} does not exist in core content"
                ))
            })?;
            let mut key_idxs = Vec::with_capacity(core.keys.len());
            for key in &core.keys {
                key_idxs.push(core.table.column_index(key).ok_or_else(|| {
                    ArcaError::link(format!("key column {key:?} does not exist in core content"))
                })?);
            }
            let mut core_key_by_id: HashMap<String, KeyTuple> = HashMap::new();
            for row in &core.table.rows {
                if let Some(id) = row[id_idx].as_ref() {
                    let tuple = key_idxs.iter().map(|&c| row[c].clone()).collect();
                    core_key_by_id.insert(id.clone(), tuple);
                }
            }
            let core_keys = core.keys.clone();

            let ext_id_columns: Vec<Option<String>> = self
                .extensions
                .iter()
                .map(|ext| self.id_column_for(ext))
                .collect();
            for (ext, id_column) in self.extensions.iter_mut().zip(ext_id_columns) {
                // Without a schema binding the canonical coreid column is
                // still honored, so adopted or hand-built extensions link.
                let id_column = id_column.unwrap_or_else(|| CORE_ID_FIELD.to_string());
                let col = match ext
                    .table
                    .column_index(&id_column)
                    .or_else(|| ext.table.column_index(CORE_ID_FIELD))
                {
                    Some(col) => col,
                    None => {
                        warn!(
                            "extension {} has no identifier column, its records cannot be linked",
                            ext.info.file_name
                        );
                        ext.row_keys.clear();
                        continue;
                    }
                };
                info!(
                    "content {} contains {} records before filtering empty identifiers",
                    ext.info.file_name,
                    ext.table.row_count()
                );
                let keep: Vec<bool> = ext
                    .table
                    .rows
                    .iter()
                    .map(|row| {
                        row[col]
                            .as_ref()
                            .is_some_and(|id| core_key_by_id.contains_key(id))
                    })
                    .collect();
                ext.row_keys.clear();
                ext.retain_rows(&keep);
                info!(
                    "content {} contains {} records after filtering unlinked identifiers",
                    ext.info.file_name,
                    ext.table.row_count()
                );

                let mut local_key_idxs = Vec::new();
                for key in &ext.keys {
                    if !core_keys.contains(key) {
                        local_key_idxs.push(ext.table.column_index(key).ok_or_else(|| {
                            ArcaError::link(format!(
                                "key column {key:?} does not exist in {}",
                                ext.info.file_name
                            ))
                        })?);
                    }
                }
                ext.row_keys = ext
                    .table
                    .rows
                    .iter()
                    .map(|row| {
                        let id = row[col].as_ref().expect("filtered above");
                        let mut tuple = core_key_by_id[id].clone();
                        tuple.extend(local_key_idxs.iter().map(|&c| row[c].clone()));
                        tuple
                    })
                    .collect();
            }
        }

        self.core_mut()?.rebuild_row_keys()
    }

    /// Inserts a generated UUID identifier column at the front of a core
    /// table. The table must not already carry one.
    pub(crate) fn assign_core_ids(table: &mut Table) -> Result<String> {
        if table.has_column(ID_FIELD) {
            return Err(ArcaError::identity(
                "core content already contains an id column",
            ));
        }
        let ids = (0..table.row_count())
            .map(|_| Some(Uuid::new_v4().to_string()))
            .collect();
        table.insert_column_front(ID_FIELD, ids);
        Ok(ID_FIELD.to_string())
    }

    /// Joins an extension onto the core over the given link columns,
    /// prepending the matched core identifiers as a `coreid` column.
    ///
    /// Rows without a matching core record are logged and dropped; a link
    /// value matched by several core records duplicates the row.
    pub(crate) fn link_extension(
        mut ext_table: Table,
        core_table: &Table,
        link_cols: &[String],
    ) -> Result<Table> {
        ext_table.remove_column(CORE_ID_FIELD);

        let core_id_idx = core_table.column_index(ID_FIELD).ok_or_else(|| {
            ArcaError::link("core content has no id column to link the extension to")
        })?;
        let mut core_link_idxs = Vec::with_capacity(link_cols.len());
        let mut ext_link_idxs = Vec::with_capacity(link_cols.len());
        for col in link_cols {
            core_link_idxs.push(core_table.column_index(col).ok_or_else(|| {
                ArcaError::link(format!("link column {col:?} does not exist in core content"))
            })?);
            ext_link_idxs.push(ext_table.column_index(col).ok_or_else(|| {
                ArcaError::link(format!(
                    "link column {col:?} does not exist in extension content"
                ))
            })?);
        }

        let mut ids_by_link: HashMap<KeyTuple, Vec<Cell>> = HashMap::new();
        for row in &core_table.rows {
            let tuple: KeyTuple = core_link_idxs.iter().map(|&c| row[c].clone()).collect();
            ids_by_link
                .entry(tuple)
                .or_default()
                .push(row[core_id_idx].clone());
        }

        let mut linked_rows = Vec::with_capacity(ext_table.rows.len());
        let mut unmatched = 0usize;
        for row in &ext_table.rows {
            let tuple: KeyTuple = ext_link_idxs.iter().map(|&c| row[c].clone()).collect();
            match ids_by_link.get(&tuple) {
                Some(ids) => {
                    for id in ids {
                        let mut linked = Vec::with_capacity(row.len() + 1);
                        linked.push(id.clone());
                        linked.extend(row.iter().cloned());
                        linked_rows.push(linked);
                    }
                }
                None => unmatched += 1,
            }
        }
        if unmatched > 0 {
            info!("{unmatched} extension rows have no matching core record and were dropped");
        }

        let mut columns = Vec::with_capacity(ext_table.columns.len() + 1);
        columns.push(CORE_ID_FIELD.to_string());
        columns.extend(ext_table.columns);
        Ok(Table {
            columns,
            rows: linked_rows,
        })
    }

    // ------------------------------------------------------------------
    // Building from caller content
    // ------------------------------------------------------------------

    /// Loads a content source into a table. Files are concatenated,
    /// aligning columns by name, and fully duplicated rows dropped.
    pub(crate) fn load_source(data: &ContentData) -> Result<Table> {
        match &data.data {
            DataSource::Table(table) => Ok(table.clone()),
            DataSource::Files(files) => {
                if files.is_empty() {
                    return Err(ArcaError::validation("no content files supplied"));
                }
                let mut combined: Option<Table> = None;
                for path in files {
                    let file = File::open(path)?;
                    let table = read_table(file, &data.encoding, None, 0)?;
                    combined = Some(match combined {
                        None => table,
                        Some(base) => append_aligned(base, table),
                    });
                }
                let mut combined = combined.unwrap_or_default();
                dedup_rows(&mut combined);
                debug!(
                    "extracted {} unique rows from {} file(s)",
                    combined.row_count(),
                    files.len()
                );
                Ok(combined)
            }
        }
    }

    /// Brings a caller-supplied table into the archive as its core or as
    /// an extension, updating the schema along the way.
    ///
    /// A core keyed by a single column uses that column as the record
    /// identifier. A composite core key forces generated UUID identifiers;
    /// extensions are then joined onto the core over the key columns.
    pub fn extract_content(&mut self, data: &ContentData, core_or_ext: CoreOrExt) -> Result<()> {
        let mut table = Self::load_source(data)?;

        let keys = match core_or_ext {
            CoreOrExt::Core => {
                if data.keys.is_empty() {
                    data.row_type.default_keys()
                } else {
                    data.keys.clone()
                }
            }
            CoreOrExt::Extension => self.core()?.keys.clone(),
        };

        let mut id_field: Option<String> = None;
        if keys.len() > 1 {
            match core_or_ext {
                CoreOrExt::Core => {
                    id_field = Some(Self::assign_core_ids(&mut table)?);
                }
                CoreOrExt::Extension => {
                    table = Self::link_extension(table, &self.core()?.table, &keys)?;
                    id_field = Some(CORE_ID_FIELD.to_string());
                }
            }
        } else if let Some(key) = keys.first() {
            id_field = Some(key.clone());
        }

        self.embedded_files
            .extend(data.associated_files.iter().cloned());

        let info = MetaElementInfo::new(
            core_or_ext,
            data.row_type.clone(),
            CsvEncoding::default(),
            None,
        );
        self.meta
            .update_element(info.clone(), &table.columns, id_field.as_deref());

        let mut content = TableContent::new(info, table);
        match core_or_ext {
            CoreOrExt::Core => {
                content.keys = keys;
                self.core = Some(content);
            }
            CoreOrExt::Extension => {
                content.keys = data.keys.clone();
                self.extensions.push(content);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Associated media
    // ------------------------------------------------------------------

    /// Splits an embedded associated-media column of the core out into a
    /// simple multimedia extension description.
    ///
    /// Media URLs separated by a vertical bar or semicolon become one
    /// extension row each, keyed by the core keys with the URL as the
    /// `identifier`. The source column is removed from the core. Returns
    /// `None` when the core has no such column or no media values.
    pub fn convert_associated_media_to_extension(&mut self) -> Result<Option<ContentData>> {
        let pattern = Regex::new("^.*associatedMedia$")
            .map_err(|e| ArcaError::internal(e.to_string()))?;
        let core = self.core_mut()?;
        let Some(media_col) = core
            .table
            .columns
            .iter()
            .find(|c| pattern.is_match(c))
            .cloned()
        else {
            return Ok(None);
        };
        info!("extracting associated media links");

        let media_idx = core.table.column_index(&media_col).unwrap_or_default();
        let mut key_idxs = Vec::with_capacity(core.keys.len());
        for key in &core.keys {
            key_idxs.push(core.table.column_index(key).ok_or_else(|| {
                ArcaError::link(format!("key column {key:?} does not exist in core content"))
            })?);
        }

        let mut media_columns: Vec<String> = core.keys.clone();
        media_columns.push("identifier".to_string());
        let mut media_table = Table::with_columns(media_columns);
        for row in &core.table.rows {
            let Some(value) = row[media_idx].as_ref() else {
                continue;
            };
            for url in value.split(['|', ';']) {
                if url.is_empty() {
                    continue;
                }
                let mut media_row: Vec<Cell> = key_idxs.iter().map(|&c| row[c].clone()).collect();
                media_row.push(Some(url.to_string()));
                media_table.rows.push(media_row);
            }
        }
        dedup_rows(&mut media_table);

        if media_table.row_count() == 0 {
            info!("nothing to extract from associated media");
            return Ok(None);
        }
        info!("{} associated media extracted", media_table.row_count());

        core.table.remove_column(&media_col);
        let core_key = core.keys.first().cloned();
        let info = core.info.clone();
        let headers = core.table.columns.clone();
        self.meta.update_element(info, &headers, core_key.as_deref());

        let mut media_keys = self.core()?.keys.clone();
        media_keys.push("identifier".to_string());
        Ok(Some(
            ContentData::new(DataSource::Table(media_table), RowType::Multimedia)
                .with_keys(media_keys),
        ))
    }

    /// Backfills `format` and `type` in a multimedia extension from the
    /// media URL where they are missing. Explicitly provided values are
    /// left alone.
    pub fn fill_multimedia_info(&mut self, ext_index: usize) -> Result<()> {
        let content = self
            .extensions
            .get_mut(ext_index)
            .ok_or_else(|| ArcaError::internal("extension content index out of range"))?;
        if content.table.row_count() == 0 {
            return Ok(());
        }
        let Some(identifier_idx) = content.table.column_index("identifier") else {
            return Ok(());
        };

        let had_format = content.table.has_column("format");
        let had_type = content.table.has_column("type");
        if !had_format {
            content.table.add_column("format", None);
        }
        if !had_type {
            content.table.add_column("type", None);
        }
        let format_idx = content.table.column_index("format").unwrap_or_default();
        let type_idx = content.table.column_index("type").unwrap_or_default();

        for row in &mut content.table.rows {
            if row[format_idx].is_none() {
                if let Some(url) = row[identifier_idx].as_deref() {
                    row[format_idx] = guess_media_format(url).map(str::to_string);
                }
            }
            if row[type_idx].is_none() {
                if let Some(format) = row[format_idx].as_deref() {
                    row[type_idx] = media_type_for(format).map(str::to_string);
                }
            }
        }

        if !had_format || !had_type {
            let info = content.info.clone();
            let headers = content.table.columns.clone();
            self.meta.update_element(info, &headers, None);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Removes the records whose key values appear in the given content.
    ///
    /// Deleting from the core cascades: extension rows linked to a removed
    /// core record are removed as well. Deleting from an extension touches
    /// only that extension, matched on its own columns.
    pub fn delete_records(&mut self, records_to_delete: &ContentData) -> Result<()> {
        let delete_table = Self::load_source(records_to_delete)?;
        let keys = &records_to_delete.keys;
        if delete_table.row_count() == 0
            || keys.is_empty()
            || !keys.iter().all(|k| delete_table.has_column(k))
        {
            info!(
                "no records removed, the delete content has no rows or lacks the columns: {}",
                keys.join(",")
            );
            return Ok(());
        }

        let key_idxs: Vec<usize> = keys
            .iter()
            .filter_map(|k| delete_table.column_index(k))
            .collect();
        let delete_keys: HashSet<KeyTuple> = delete_table
            .rows
            .iter()
            .map(|row| key_idxs.iter().map(|&c| row[c].clone()).collect())
            .collect();

        for locator in self.find_content(&records_to_delete.row_type, None) {
            info!("removing records from {:?}", locator.0);
            match locator.0 {
                CoreOrExt::Core => {
                    self.core_mut()?.keys = keys.clone();
                    for ext in &mut self.extensions {
                        ext.keys = keys.clone();
                    }
                    self.build_indexes()?;

                    let core = self.core_mut()?;
                    let keep: Vec<bool> = core
                        .row_keys
                        .iter()
                        .map(|k| !delete_keys.contains(k))
                        .collect();
                    core.retain_rows(&keep);
                    info!("core content now holds {} records", core.table.row_count());

                    for ext in &mut self.extensions {
                        let keep: Vec<bool> = ext
                            .row_keys
                            .iter()
                            .map(|k| !delete_keys.contains(k))
                            .collect();
                        ext.retain_rows(&keep);
                        info!(
                            "extension {} now holds {} records",
                            ext.info.file_name,
                            ext.table.row_count()
                        );
                    }
                }
                CoreOrExt::Extension => {
                    let content = self.content_mut(locator)?;
                    let mut ext_key_idxs = Vec::with_capacity(keys.len());
                    for key in keys {
                        ext_key_idxs.push(content.table.column_index(key).ok_or_else(|| {
                            ArcaError::link(format!(
                                "key column {key:?} does not exist in {}",
                                content.info.file_name
                            ))
                        })?);
                    }
                    let keep: Vec<bool> = content
                        .table
                        .rows
                        .iter()
                        .map(|row| {
                            let tuple: KeyTuple =
                                ext_key_idxs.iter().map(|&c| row[c].clone()).collect();
                            !delete_keys.contains(&tuple)
                        })
                        .collect();
                    content.retain_rows(&keep);
                    info!(
                        "extension {} now holds {} records",
                        content.info.file_name,
                        content.table.row_count()
                    );
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Writes the archive as a zip file at the given path, creating any
    /// missing parent directories.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        self.write_to(file)?;
        info!("archive written to {}", path.display());
        Ok(())
    }

    /// Writes the archive zip to any seekable sink.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let core = self.core()?;
        for content in std::iter::once(core).chain(self.extensions.iter()) {
            let csv = write_table(
                &content.table,
                &content.info.encoding,
                content.info.ignore_header_lines > 0,
            )?;
            zip.start_file(content.info.file_name.as_str(), options)?;
            zip.write_all(csv.as_bytes())?;
        }

        zip.start_file(META_XML, options)?;
        zip.write_all(self.meta.to_xml().as_bytes())?;

        if let Some(eml) = &self.eml {
            zip.start_file(self.meta.eml_file_name.as_str(), options)?;
            zip.write_all(eml.as_bytes())?;
        }

        for path in &self.embedded_files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                error!("skipping associated file with no usable name: {}", path.display());
                continue;
            };
            zip.start_file(name, options)?;
            zip.write_all(&std::fs::read(path)?)?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// Appends `extra` onto `base`, aligning columns by name and widening the
/// result to the union of both column sets.
fn append_aligned(mut base: Table, extra: Table) -> Table {
    for col in &extra.columns {
        if !base.has_column(col) {
            base.add_column(col, None);
        }
    }
    let mapping: Vec<Option<usize>> = base
        .columns
        .iter()
        .map(|c| extra.column_index(c))
        .collect();
    for row in &extra.rows {
        base.rows.push(
            mapping
                .iter()
                .map(|idx| idx.and_then(|i| row.get(i).cloned().flatten()))
                .collect(),
        );
    }
    base
}

/// Drops fully duplicated rows, keeping first occurrences in order.
fn dedup_rows(table: &mut Table) {
    let mut seen = HashSet::new();
    table.rows.retain(|row| seen.insert(row.clone()));
}

/// Guesses a MIME type from the file extension of a media URL.
fn guess_media_format(url: &str) -> Option<&'static str> {
    let name = url.rsplit('/').next().unwrap_or(url);
    let name = name.split(['?', '#']).next().unwrap_or(name);
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    let format = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/x-wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mpg" | "mpeg" => "video/mpeg",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(format)
}

/// The Darwin Core media type for a MIME format.
fn media_type_for(format: &str) -> Option<&'static str> {
    match format.split('/').next() {
        Some("image") => Some("StillImage"),
        Some("audio") => Some("Sound"),
        Some("video") => Some("MovingImage"),
        _ => {
            warn!("unknown media type for format {format}");
            None
        }
    }
}
