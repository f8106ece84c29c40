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

use arca::{
    Archive, ContentData, CoreOrExt, DataSource, Meta, RowType, Table,
};

const OCCURRENCE_META: &str = r#"<?xml version="1.0" ?>
<archive xmlns="http://rs.tdwg.org/dwc/text/" metadata="eml.xml">
  <core encoding="UTF-8" rowType="http://rs.tdwg.org/dwc/terms/Occurrence" fieldsTerminatedBy="," linesTerminatedBy="\r\n" fieldsEnclosedBy="&quot;" ignoreHeaderLines="1">
    <files>
      <location>occurrence.txt</location>
    </files>
    <id index="0"/>
    <field index="0" term="http://rs.tdwg.org/dwc/terms/occurrenceID"/>
    <field index="1" term="http://rs.tdwg.org/dwc/terms/scientificName"/>
  </core>
  <extension encoding="UTF-8" rowType="http://rs.gbif.org/terms/1.0/Multimedia" fieldsTerminatedBy="\t" linesTerminatedBy="\r\n" fieldsEnclosedBy="&quot;" ignoreHeaderLines="1">
    <files>
      <location>multimedia.txt</location>
    </files>
    <coreid index="0"/>
    <field index="1" term="http://purl.org/dc/terms/identifier"/>
    <field index="2" term="http://purl.org/dc/terms/format"/>
  </extension>
</archive>
"#;

fn sample_core() -> ContentData {
    let mut table = Table::with_columns(vec![
        "occurrenceID".to_string(),
        "scientificName".to_string(),
    ]);
    table.rows.push(vec![
        Some("occ-1".to_string()),
        Some("Acacia dealbata".to_string()),
    ]);
    table.rows.push(vec![
        Some("occ-2".to_string()),
        Some("Eucalyptus regnans".to_string()),
    ]);
    ContentData::new(DataSource::Table(table), RowType::Occurrence)
}

#[test]
fn parse_reads_core_and_extension() {
    let meta = Meta::parse(OCCURRENCE_META).expect("parse");
    assert_eq!(meta.eml_file_name, "eml.xml");
    assert_eq!(meta.elements.len(), 2);

    let core = meta.core().expect("core element");
    assert_eq!(core.info.core_or_ext, CoreOrExt::Core);
    assert_eq!(core.info.row_type, RowType::Occurrence);
    assert_eq!(core.info.file_name, "occurrence.txt");
    assert_eq!(core.info.encoding.delimiter, ",");
    assert_eq!(core.info.encoding.eol, "\r\n");
    assert_eq!(core.info.ignore_header_lines, 1);
    assert_eq!(core.core_id.as_ref().and_then(|f| f.index), Some(0));

    let ext = meta.extensions().next().expect("extension element");
    assert_eq!(ext.info.row_type, RowType::Multimedia);
    assert_eq!(ext.info.encoding.delimiter, "\t");
}

#[test]
fn declared_columns_follow_field_order() {
    let meta = Meta::parse(OCCURRENCE_META).expect("parse");
    let core = meta.core().expect("core element");
    let columns = core.declared_columns().expect("columns");
    assert_eq!(columns, vec!["occurrenceID", "scientificName"]);
}

#[test]
fn declared_columns_inject_identifier_when_unmapped() {
    // The extension maps no field at the coreid's index, so the schema
    // implies a bare identifier column at the front of the file.
    let meta = Meta::parse(OCCURRENCE_META).expect("parse");
    let ext = meta.extensions().next().expect("extension element");
    let columns = ext.declared_columns().expect("columns");
    assert_eq!(columns, vec!["coreid", "identifier", "format"]);
}

#[test]
fn xml_round_trip_preserves_schema() {
    let meta = Meta::parse(OCCURRENCE_META).expect("parse");
    let rendered = meta.to_xml();
    let reparsed = Meta::parse(&rendered).expect("reparse");
    assert_eq!(meta.elements, reparsed.elements);
    assert_eq!(meta.eml_file_name, reparsed.eml_file_name);
}

#[test]
fn rendered_xml_escapes_control_attributes() {
    let meta = Meta::parse(OCCURRENCE_META).expect("parse");
    let rendered = meta.to_xml();
    assert!(rendered.contains(r#"fieldsTerminatedBy="\t""#));
    assert!(rendered.contains(r#"linesTerminatedBy="\r\n""#));
    assert!(rendered.contains(r#"metadata="eml.xml""#));
}

#[test]
fn written_archive_reads_back_with_same_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("occurrence.zip");

    let mut archive = Archive::new();
    archive
        .extract_content(&sample_core(), CoreOrExt::Core)
        .expect("extract core");
    archive.write(&path).expect("write archive");

    let read = Archive::read(&path).expect("read archive");
    let core_element = read.meta.core().expect("core element");
    assert_eq!(core_element.info.row_type, RowType::Occurrence);
    assert_eq!(core_element.info.file_name, "occurrence.txt");

    let core = read.core().expect("core content");
    assert_eq!(
        core.table.columns,
        vec!["occurrenceID", "scientificName"]
    );
    assert_eq!(core.table.row_count(), 2);
    assert_eq!(core.table.cell(0, "occurrenceID"), Some("occ-1"));
    assert_eq!(core.table.cell(1, "scientificName"), Some("Eucalyptus regnans"));
}
