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

use std::collections::HashMap;
use std::path::Path;

use arca::{
    Archive, Cell, ContentData, DataSource, DwcaHandler, EmlContent, RowType, Table,
};

fn occurrence_table(columns: &[&str], rows: Vec<Vec<Cell>>) -> Table {
    let mut table = Table::with_columns(columns.iter().map(|c| c.to_string()).collect());
    table.rows = rows;
    table
}

fn cell(value: &str) -> Cell {
    Some(value.to_string())
}

fn write_occurrence_dwca(path: &Path, table: Table) {
    let core = ContentData::new(DataSource::Table(table), RowType::Occurrence);
    DwcaHandler::create_dwca(&core, &[], path, true, &EmlContent::default())
        .expect("create archive");
}

fn occurrence_keys() -> HashMap<RowType, Vec<String>> {
    HashMap::from([(RowType::Occurrence, vec!["occurrenceID".to_string()])])
}

#[test]
fn merge_updates_matches_and_appends_new_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_path = dir.path().join("base.zip");
    let delta_path = dir.path().join("delta.zip");
    let out_path = dir.path().join("merged.zip");

    write_occurrence_dwca(
        &base_path,
        occurrence_table(
            &["occurrenceID", "scientificName"],
            vec![
                vec![cell("occ-1"), cell("Acacia dealbata")],
                vec![cell("occ-2"), cell("Banksia serrata")],
            ],
        ),
    );
    write_occurrence_dwca(
        &delta_path,
        occurrence_table(
            &["occurrenceID", "scientificName"],
            vec![
                vec![cell("occ-2"), cell("Banksia serrata var. serrata")],
                vec![cell("occ-3"), cell("Eucalyptus regnans")],
            ],
        ),
    );

    DwcaHandler::merge_dwca(
        &base_path,
        &delta_path,
        &out_path,
        &occurrence_keys(),
        false,
        true,
    )
    .expect("merge");

    let merged = Archive::read(&out_path).expect("read merged");
    let core = merged.core().expect("core content");
    assert_eq!(core.table.row_count(), 3);
    assert_eq!(core.table.cell(0, "scientificName"), Some("Acacia dealbata"));
    assert_eq!(
        core.table.cell(1, "scientificName"),
        Some("Banksia serrata var. serrata")
    );
    assert_eq!(core.table.cell(2, "occurrenceID"), Some("occ-3"));
}

#[test]
fn merge_widens_core_with_delta_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_path = dir.path().join("base.zip");
    let delta_path = dir.path().join("delta.zip");
    let out_path = dir.path().join("merged.zip");

    write_occurrence_dwca(
        &base_path,
        occurrence_table(
            &["occurrenceID", "scientificName"],
            vec![
                vec![cell("occ-1"), cell("Acacia dealbata")],
                vec![cell("occ-2"), cell("Banksia serrata")],
            ],
        ),
    );
    write_occurrence_dwca(
        &delta_path,
        occurrence_table(
            &["occurrenceID", "locality"],
            vec![vec![cell("occ-2"), cell("Cradle Mountain")]],
        ),
    );

    DwcaHandler::merge_dwca(
        &base_path,
        &delta_path,
        &out_path,
        &occurrence_keys(),
        false,
        true,
    )
    .expect("merge");

    let merged = Archive::read(&out_path).expect("read merged");
    let core = merged.core().expect("core content");
    assert!(core.table.has_column("locality"));
    assert_eq!(core.table.cell(0, "locality"), None);
    assert_eq!(core.table.cell(1, "locality"), Some("Cradle Mountain"));
    // The untouched column survives on both sides of the match.
    assert_eq!(core.table.cell(1, "scientificName"), Some("Banksia serrata"));

    let element = merged.meta.core().expect("core schema entry");
    assert!(element
        .fields
        .iter()
        .any(|f| f.field_name == "locality"));
}

#[test]
fn extension_sync_replaces_rows_of_shared_core_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_path = dir.path().join("base.zip");
    let delta_path = dir.path().join("delta.zip");
    let out_path = dir.path().join("merged.zip");

    let base_core = occurrence_table(
        &["occurrenceID", "scientificName"],
        vec![
            vec![cell("occ-1"), cell("Acacia dealbata")],
            vec![cell("occ-2"), cell("Banksia serrata")],
        ],
    );
    let mut base_media = Table::with_columns(vec![
        "occurrenceID".to_string(),
        "identifier".to_string(),
    ]);
    base_media.rows = vec![
        vec![cell("occ-1"), cell("https://img.example.org/a.jpg")],
        vec![cell("occ-1"), cell("https://img.example.org/b.jpg")],
        vec![cell("occ-2"), cell("https://img.example.org/c.jpg")],
    ];
    let core = ContentData::new(DataSource::Table(base_core), RowType::Occurrence);
    let media = ContentData::new(DataSource::Table(base_media), RowType::Multimedia);
    DwcaHandler::create_dwca(&core, &[media], &base_path, true, &EmlContent::default())
        .expect("create base");

    let delta_core = occurrence_table(
        &["occurrenceID", "scientificName"],
        vec![vec![cell("occ-1"), cell("Acacia dealbata")]],
    );
    let mut delta_media = Table::with_columns(vec![
        "occurrenceID".to_string(),
        "identifier".to_string(),
    ]);
    delta_media.rows = vec![vec![cell("occ-1"), cell("https://img.example.org/d.jpg")]];
    let core = ContentData::new(DataSource::Table(delta_core), RowType::Occurrence);
    let media = ContentData::new(DataSource::Table(delta_media), RowType::Multimedia);
    DwcaHandler::create_dwca(&core, &[media], &delta_path, true, &EmlContent::default())
        .expect("create delta");

    let keys = HashMap::from([
        (RowType::Occurrence, vec!["occurrenceID".to_string()]),
        (
            RowType::Multimedia,
            vec!["occurrenceID".to_string(), "identifier".to_string()],
        ),
    ]);
    DwcaHandler::merge_dwca(&base_path, &delta_path, &out_path, &keys, true, true)
        .expect("merge");

    let merged = Archive::read(&out_path).expect("read merged");
    let ext = &merged.extensions()[0];
    let identifiers: Vec<&str> = (0..ext.table.row_count())
        .filter_map(|row| ext.table.cell(row, "identifier"))
        .collect();
    // occ-1 media is replaced wholesale, occ-2 media is untouched.
    assert_eq!(ext.table.row_count(), 2);
    assert!(identifiers.contains(&"https://img.example.org/c.jpg"));
    assert!(identifiers.contains(&"https://img.example.org/d.jpg"));
    assert!(!identifiers.contains(&"https://img.example.org/a.jpg"));
}

#[test]
fn unmatched_delta_extension_is_adopted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_path = dir.path().join("base.zip");
    let delta_path = dir.path().join("delta.zip");
    let out_path = dir.path().join("merged.zip");

    write_occurrence_dwca(
        &base_path,
        occurrence_table(
            &["occurrenceID", "scientificName"],
            vec![vec![cell("occ-1"), cell("Acacia dealbata")]],
        ),
    );

    let delta_core = occurrence_table(
        &["occurrenceID", "scientificName"],
        vec![vec![cell("occ-1"), cell("Acacia dealbata")]],
    );
    let mut delta_media = Table::with_columns(vec![
        "occurrenceID".to_string(),
        "identifier".to_string(),
    ]);
    delta_media.rows = vec![vec![cell("occ-1"), cell("https://img.example.org/a.jpg")]];
    let core = ContentData::new(DataSource::Table(delta_core), RowType::Occurrence);
    let media = ContentData::new(DataSource::Table(delta_media), RowType::Multimedia);
    DwcaHandler::create_dwca(&core, &[media], &delta_path, true, &EmlContent::default())
        .expect("create delta");

    DwcaHandler::merge_dwca(
        &base_path,
        &delta_path,
        &out_path,
        &occurrence_keys(),
        false,
        true,
    )
    .expect("merge");

    let merged = Archive::read(&out_path).expect("read merged");
    assert_eq!(merged.extensions().len(), 1);
    let ext = &merged.extensions()[0];
    assert_eq!(ext.info.row_type, RowType::Multimedia);
    assert_eq!(ext.table.row_count(), 1);
    assert_eq!(
        ext.table.cell(0, "identifier"),
        Some("https://img.example.org/a.jpg")
    );
}

#[test]
fn merging_identical_archives_changes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_path = dir.path().join("base.zip");
    let delta_path = dir.path().join("delta.zip");
    let out_path = dir.path().join("merged.zip");

    let rows = vec![
        vec![cell("occ-1"), cell("Acacia dealbata")],
        vec![cell("occ-2"), cell("Banksia serrata")],
    ];
    write_occurrence_dwca(
        &base_path,
        occurrence_table(&["occurrenceID", "scientificName"], rows.clone()),
    );
    write_occurrence_dwca(
        &delta_path,
        occurrence_table(&["occurrenceID", "scientificName"], rows),
    );

    DwcaHandler::merge_dwca(
        &base_path,
        &delta_path,
        &out_path,
        &occurrence_keys(),
        false,
        true,
    )
    .expect("merge");

    let merged = Archive::read(&out_path).expect("read merged");
    let core = merged.core().expect("core content");
    assert_eq!(core.table.row_count(), 2);
    assert_eq!(core.table.cell(0, "scientificName"), Some("Acacia dealbata"));
    assert_eq!(core.table.cell(1, "scientificName"), Some("Banksia serrata"));
}
