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

use std::path::Path;

use arca::{
    Archive, Cell, ContentData, DataSource, DwcaHandler, EmlContent, RowType, Table,
};

fn cell(value: &str) -> Cell {
    Some(value.to_string())
}

/// An occurrence archive with three records, where the first two carry
/// one media row each.
fn write_sample_dwca(path: &Path) {
    let mut core_table = Table::with_columns(vec![
        "occurrenceID".to_string(),
        "scientificName".to_string(),
    ]);
    core_table.rows = vec![
        vec![cell("occ-1"), cell("Acacia dealbata")],
        vec![cell("occ-2"), cell("Banksia serrata")],
        vec![cell("occ-3"), cell("Eucalyptus regnans")],
    ];
    let mut media_table = Table::with_columns(vec![
        "occurrenceID".to_string(),
        "identifier".to_string(),
    ]);
    media_table.rows = vec![
        vec![cell("occ-1"), cell("https://img.example.org/a.jpg")],
        vec![cell("occ-2"), cell("https://img.example.org/b.jpg")],
    ];
    let core = ContentData::new(DataSource::Table(core_table), RowType::Occurrence);
    let media = ContentData::new(DataSource::Table(media_table), RowType::Multimedia);
    DwcaHandler::create_dwca(&core, &[media], path, true, &EmlContent::default())
        .expect("create archive");
}

fn occurrence_delete(ids: &[&str]) -> ContentData {
    let mut table = Table::with_columns(vec!["occurrenceID".to_string()]);
    table.rows = ids.iter().map(|id| vec![cell(id)]).collect();
    ContentData::new(DataSource::Table(table), RowType::Occurrence)
        .with_keys(vec!["occurrenceID".to_string()])
}

#[test]
fn deleting_core_records_cascades_to_extensions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dwca = dir.path().join("occurrence.zip");
    let out = dir.path().join("trimmed.zip");
    write_sample_dwca(&dwca);

    DwcaHandler::delete_records(&dwca, &occurrence_delete(&["occ-1"]), &out)
        .expect("delete");

    let archive = Archive::read(&out).expect("read back");
    let core = archive.core().expect("core content");
    assert_eq!(core.table.row_count(), 2);
    assert_eq!(core.table.cell(0, "occurrenceID"), Some("occ-2"));
    assert_eq!(core.table.cell(1, "occurrenceID"), Some("occ-3"));

    let ext = &archive.extensions()[0];
    assert_eq!(ext.table.row_count(), 1);
    assert_eq!(ext.table.cell(0, "occurrenceID"), Some("occ-2"));
}

#[test]
fn deleting_from_extension_leaves_core_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dwca = dir.path().join("occurrence.zip");
    let out = dir.path().join("trimmed.zip");
    write_sample_dwca(&dwca);

    let mut table = Table::with_columns(vec!["identifier".to_string()]);
    table.rows = vec![vec![cell("https://img.example.org/b.jpg")]];
    let to_delete = ContentData::new(DataSource::Table(table), RowType::Multimedia)
        .with_keys(vec!["identifier".to_string()]);
    DwcaHandler::delete_records(&dwca, &to_delete, &out).expect("delete");

    let archive = Archive::read(&out).expect("read back");
    assert_eq!(archive.core().expect("core content").table.row_count(), 3);

    let ext = &archive.extensions()[0];
    assert_eq!(ext.table.row_count(), 1);
    assert_eq!(
        ext.table.cell(0, "identifier"),
        Some("https://img.example.org/a.jpg")
    );
}

#[test]
fn delete_without_key_columns_is_a_no_op() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dwca = dir.path().join("occurrence.zip");
    let out = dir.path().join("unchanged.zip");
    write_sample_dwca(&dwca);

    let mut table = Table::with_columns(vec!["catalogNumber".to_string()]);
    table.rows = vec![vec![cell("C100")]];
    let to_delete = ContentData::new(DataSource::Table(table), RowType::Occurrence)
        .with_keys(vec!["occurrenceID".to_string()]);
    DwcaHandler::delete_records(&dwca, &to_delete, &out).expect("delete");

    let archive = Archive::read(&out).expect("read back");
    assert_eq!(archive.core().expect("core content").table.row_count(), 3);
    assert_eq!(archive.extensions()[0].table.row_count(), 2);
}

#[test]
fn deleting_unknown_keys_changes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dwca = dir.path().join("occurrence.zip");
    let out = dir.path().join("unchanged.zip");
    write_sample_dwca(&dwca);

    DwcaHandler::delete_records(&dwca, &occurrence_delete(&["occ-99"]), &out)
        .expect("delete");

    let archive = Archive::read(&out).expect("read back");
    assert_eq!(archive.core().expect("core content").table.row_count(), 3);
    assert_eq!(archive.extensions()[0].table.row_count(), 2);
}

#[test]
fn remove_extension_files_strips_table_and_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dwca = dir.path().join("occurrence.zip");
    let out = dir.path().join("core_only.zip");
    write_sample_dwca(&dwca);

    DwcaHandler::remove_extension_files(&dwca, &["multimedia.txt".to_string()], &out)
        .expect("remove extension");

    let archive = Archive::read(&out).expect("read back");
    assert!(archive.extensions().is_empty());
    assert_eq!(archive.meta.elements.len(), 1);
    assert_eq!(archive.core().expect("core content").table.row_count(), 3);
}
