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
    Archive, ContentData, DataSource, DwcaHandler, Eml, EmlContent, RowType, Table,
};

fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write csv");
    path
}

#[test]
fn creates_archive_from_csv_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv = write_csv(
        dir.path(),
        "occurrence.csv",
        "occurrenceID,scientificName,basisOfRecord\n\
         occ-1,Acacia dealbata,HumanObservation\n\
         occ-2,Banksia serrata,PreservedSpecimen\n",
    );
    let dwca = dir.path().join("occurrence.zip");

    let core = ContentData::new(DataSource::Files(vec![csv]), RowType::Occurrence);
    let eml = EmlContent::Fields(Eml::new("Herbarium observations"));
    DwcaHandler::create_dwca(&core, &[], &dwca, true, &eml).expect("create");

    let archive = Archive::read(&dwca).expect("read back");
    let core = archive.core().expect("core content");
    assert_eq!(core.table.row_count(), 2);
    assert_eq!(
        core.table.columns,
        vec!["occurrenceID", "scientificName", "basisOfRecord"]
    );
    assert_eq!(core.table.cell(0, "basisOfRecord"), Some("HumanObservation"));

    let eml = archive.eml.as_deref().expect("eml document");
    assert!(eml.contains("Herbarium observations"));

    let element = archive.meta.core().expect("core schema entry");
    assert_eq!(element.info.row_type, RowType::Occurrence);
    assert_eq!(element.core_id.as_ref().and_then(|f| f.index), Some(0));
}

#[test]
fn concatenates_multiple_source_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = write_csv(
        dir.path(),
        "part1.csv",
        "occurrenceID,scientificName\nocc-1,Acacia dealbata\n",
    );
    let second = write_csv(
        dir.path(),
        "part2.csv",
        "occurrenceID,locality\nocc-2,Cradle Mountain\n",
    );
    let dwca = dir.path().join("occurrence.zip");

    let core = ContentData::new(DataSource::Files(vec![first, second]), RowType::Occurrence);
    DwcaHandler::create_dwca(&core, &[], &dwca, true, &EmlContent::default())
        .expect("create");

    let archive = Archive::read(&dwca).expect("read back");
    let core = archive.core().expect("core content");
    assert_eq!(core.table.row_count(), 2);
    assert_eq!(
        core.table.columns,
        vec!["occurrenceID", "scientificName", "locality"]
    );
    assert_eq!(core.table.cell(0, "locality"), None);
    assert_eq!(core.table.cell(1, "locality"), Some("Cradle Mountain"));
}

#[test]
fn associated_media_becomes_multimedia_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv = write_csv(
        dir.path(),
        "occurrence.csv",
        "occurrenceID,scientificName,associatedMedia\n\
         occ-1,Acacia dealbata,https://img.example.org/a.jpg|https://img.example.org/b.png\n\
         occ-2,Banksia serrata,\n",
    );
    let dwca = dir.path().join("occurrence.zip");

    let core = ContentData::new(DataSource::Files(vec![csv]), RowType::Occurrence);
    DwcaHandler::create_dwca(&core, &[], &dwca, true, &EmlContent::default())
        .expect("create");

    let archive = Archive::read(&dwca).expect("read back");
    let core = archive.core().expect("core content");
    assert!(!core.table.has_column("associatedMedia"));

    let ext = &archive.extensions()[0];
    assert_eq!(ext.info.row_type, RowType::Multimedia);
    assert_eq!(ext.table.row_count(), 2);
    assert_eq!(ext.table.cell(0, "occurrenceID"), Some("occ-1"));
    assert_eq!(
        ext.table.cell(0, "identifier"),
        Some("https://img.example.org/a.jpg")
    );
    // Missing media descriptors are backfilled from the URL.
    assert_eq!(ext.table.cell(0, "format"), Some("image/jpeg"));
    assert_eq!(ext.table.cell(0, "type"), Some("StillImage"));
    assert_eq!(ext.table.cell(1, "format"), Some("image/png"));
}

#[test]
fn composite_keys_generate_record_identifiers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dwca = dir.path().join("occurrence.zip");

    let mut core_table = Table::with_columns(vec![
        "catalogNumber".to_string(),
        "collectionCode".to_string(),
        "scientificName".to_string(),
    ]);
    core_table.rows.push(vec![
        Some("C100".to_string()),
        Some("Herb".to_string()),
        Some("Acacia dealbata".to_string()),
    ]);
    core_table.rows.push(vec![
        Some("C101".to_string()),
        Some("Herb".to_string()),
        Some("Banksia serrata".to_string()),
    ]);
    let core = ContentData::new(DataSource::Table(core_table), RowType::Occurrence)
        .with_keys(vec!["catalogNumber".to_string(), "collectionCode".to_string()]);

    let mut media_table = Table::with_columns(vec![
        "catalogNumber".to_string(),
        "collectionCode".to_string(),
        "identifier".to_string(),
    ]);
    media_table.rows.push(vec![
        Some("C100".to_string()),
        Some("Herb".to_string()),
        Some("https://img.example.org/a.jpg".to_string()),
    ]);
    let media = ContentData::new(DataSource::Table(media_table), RowType::Multimedia);

    DwcaHandler::create_dwca(&core, &[media], &dwca, true, &EmlContent::default())
        .expect("create");

    let archive = Archive::read(&dwca).expect("read back");
    let core = archive.core().expect("core content");
    assert_eq!(core.table.columns[0], "id");
    let first_id = core.table.cell(0, "id").expect("generated id").to_string();
    let second_id = core.table.cell(1, "id").expect("generated id").to_string();
    assert_ne!(first_id, second_id);

    let ext = &archive.extensions()[0];
    assert_eq!(ext.table.columns[0], "coreid");
    assert_eq!(ext.table.row_count(), 1);
    assert_eq!(ext.table.cell(0, "coreid"), Some(first_id.as_str()));
}

#[test]
fn validation_failure_blocks_creation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv = write_csv(
        dir.path(),
        "occurrence.csv",
        "occurrenceID,scientificName\nocc-1,Acacia dealbata\nocc-1,Banksia serrata\n",
    );
    let dwca = dir.path().join("occurrence.zip");

    let core = ContentData::new(DataSource::Files(vec![csv]), RowType::Occurrence);
    let result = DwcaHandler::create_dwca(&core, &[], &dwca, true, &EmlContent::default());
    assert!(result.is_err());
    assert!(!dwca.exists());
}

#[test]
fn empty_source_list_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dwca = dir.path().join("occurrence.zip");
    let core = ContentData::new(DataSource::Files(Vec::new()), RowType::Occurrence);
    let result = DwcaHandler::create_dwca(&core, &[], &dwca, true, &EmlContent::default());
    assert!(result.is_err());
}
