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

//! # Arca CSV Transport
//!
//! Reading and writing of [`Table`] values as delimited text in an
//! arbitrary [`CsvEncoding`] dialect.
//!
//! Reads come in two shapes. When the schema already names the columns (the
//! archive case) the caller passes them in and every line is data, minus
//! any declared header lines to skip. When no columns are given (a loose
//! CSV supplied by a caller) the first line is the header.
//!
//! An empty CSV field reads as a null cell and a null cell writes back as
//! an empty field. Rows whose cells are all null are dropped on read.

use std::io::Read;

use log::{debug, error, warn};

use crate::errors::{ArcaError, Result};
use crate::meta::CsvEncoding;
use crate::table::{Cell, Table};

fn single_byte(value: &str, what: &str) -> Result<u8> {
    let bytes = value.as_bytes();
    if bytes.len() == 1 {
        Ok(bytes[0])
    } else {
        Err(ArcaError::Csv(format!(
            "unsupported multi-byte {what} {value:?}"
        )))
    }
}

fn reader_builder(encoding: &CsvEncoding) -> Result<csv::ReaderBuilder> {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(single_byte(&encoding.delimiter, "delimiter")?)
        .quote(single_byte(&encoding.quote, "quote character")?)
        .has_headers(false)
        .flexible(true);
    // The default terminator already covers both \n and \r\n.
    if encoding.eol != "\n" && encoding.eol != "\r\n" {
        builder.terminator(csv::Terminator::Any(single_byte(&encoding.eol, "eol")?));
    }
    Ok(builder)
}

fn to_cells(record: &csv::StringRecord, width: usize) -> Vec<Cell> {
    if record.len() > width {
        warn!(
            "row at line {} carries {} fields, the {} beyond the declared columns are dropped",
            record.position().map_or(0, |p| p.line()),
            record.len(),
            record.len() - width
        );
    }
    let mut cells: Vec<Cell> = record
        .iter()
        .take(width)
        .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
        .collect();
    cells.resize(width, None);
    cells
}

/// Reads delimited text into a table.
///
/// `columns` carries the schema-declared column names; when absent the
/// first line of the input is read as the header instead and
/// `ignore_header_lines` is not applied. Rows with no non-null cell are
/// dropped. An empty input yields an empty table when the columns are
/// known and an error otherwise.
pub fn read_table<R: Read>(
    input: R,
    encoding: &CsvEncoding,
    columns: Option<&[String]>,
    ignore_header_lines: usize,
) -> Result<Table> {
    let mut reader = reader_builder(encoding)?.from_reader(input);
    let mut records = reader.records();

    let (column_names, skip) = match columns {
        Some(cols) => (cols.to_vec(), ignore_header_lines),
        None => {
            let Some(header) = records.next() else {
                error!("no header line found, the file may be empty");
                return Err(ArcaError::Csv(
                    "cannot determine columns of an empty file".to_string(),
                ));
            };
            let header = header?;
            let names = header.iter().map(|c| c.trim().to_string()).collect();
            (names, 0)
        }
    };

    let width = column_names.len();
    let mut table = Table::with_columns(column_names);
    for (i, record) in records.enumerate() {
        let record = record?;
        if i < skip {
            continue;
        }
        let cells = to_cells(&record, width);
        if !Table::row_is_empty(&cells) {
            table.rows.push(cells);
        }
    }
    debug!("extracted {} rows from csv input", table.row_count());
    Ok(table)
}

/// Serializes a table in the given dialect, quoting only where needed.
/// Null cells become empty fields.
pub fn write_table(table: &Table, encoding: &CsvEncoding, write_header: bool) -> Result<String> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(single_byte(&encoding.delimiter, "delimiter")?)
        .quote(single_byte(&encoding.quote, "quote character")?)
        .quote_style(csv::QuoteStyle::Necessary)
        .double_quote(true)
        .flexible(true);
    match encoding.eol.as_str() {
        "\r\n" => {
            builder.terminator(csv::Terminator::CRLF);
        }
        other => {
            builder.terminator(csv::Terminator::Any(single_byte(other, "eol")?));
        }
    }

    let mut writer = builder.from_writer(Vec::new());
    if write_header {
        writer.write_record(&table.columns)?;
    }
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ArcaError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ArcaError::Csv(e.to_string()))
}
