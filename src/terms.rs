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

//! # Arca Term Resolver
//!
//! This module manages the vocabulary terms and class row types used in a
//! Darwin Core Archive.
//!
//! Column names in a DwCA table are mapped onto vocabulary term URIs
//! (usually Darwin Core or Dublin Core terms) through a static reference
//! table embedded in the crate. Each core or extension table also carries a
//! row type, a class URI that describes what one row of the table
//! represents (an occurrence, an event, a multimedia item, ...).
//!
//! The reference tables are parsed once into process-wide immutable state;
//! the rest of the crate only ever reads them through the accessors exposed
//! here.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::errors::{ArcaError, Result};

/// One row of the embedded vocabulary table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TermEntry {
    pub prefix: String,
    pub term: String,
    pub uri: String,
}

/// One row of the embedded class row-type table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RowTypeEntry {
    #[serde(rename = "class")]
    pub name: String,
    #[serde(rename = "class_uri")]
    pub uri: String,
    pub prefix: String,
}

struct Registry {
    terms: Vec<TermEntry>,
    row_types: Vec<RowTypeEntry>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let terms = parse_embedded::<TermEntry>(include_str!("terms/terms.csv"));
        let row_types = parse_embedded::<RowTypeEntry>(include_str!("terms/class-rowtype.csv"));
        Registry { terms, row_types }
    })
}

fn parse_embedded<T: for<'de> Deserialize<'de>>(data: &str) -> Vec<T> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .expect("embedded reference table is well-formed")
}

/// Read accessor for the embedded vocabulary table.
pub fn list_terms() -> &'static [TermEntry] {
    &registry().terms
}

/// Read accessor for the embedded class row-type table.
pub fn list_row_types() -> &'static [RowTypeEntry] {
    &registry().row_types
}

/// Column-name prefixes that are stripped before term resolution.
const NAME_PREFIXES: [&str; 5] = ["dcterms:", "dcterms_", "dc:", "ggbn:", "ggbn_"];

/// Removes common namespace prefixes from a column name.
pub fn strip_prefix(col_name: &str) -> &str {
    for prefix in NAME_PREFIXES {
        if let Some(stripped) = col_name.strip_prefix(prefix) {
            return stripped;
        }
    }
    col_name
}

/// Finds a term local name from a term name or URI.
///
/// For a URI the last path segment is taken, with any fragment appended
/// after an underscore. A bare name is returned unchanged. An empty term
/// string is a schema error since it indicates a broken `meta.xml`.
pub fn extract_term(term_string: &str) -> Result<String> {
    if term_string.trim().is_empty() {
        return Err(ArcaError::meta(
            "empty term encountered while reading the meta file",
        ));
    }
    let (path, fragment) = match term_string.split_once('#') {
        Some((p, f)) => (p, Some(f)),
        None => (term_string, None),
    };
    let local = match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    };
    Ok(match fragment {
        Some(f) if !f.is_empty() => format!("{local}_{f}"),
        _ => local.to_string(),
    })
}

/// Upper-snake-cases a camel-cased term, keeping runs of capitals together.
fn upper_snake(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 4);
    let mut prev_upper = true;
    for ch in term.chars() {
        if ch.is_ascii_uppercase() && !prev_upper && !out.is_empty() {
            out.push('_');
        }
        prev_upper = ch.is_ascii_uppercase();
        out.push(ch.to_ascii_uppercase());
    }
    out
}

/// Resolves a column name to its vocabulary term URI.
///
/// The lookup is case-insensitive on the term local name. Unknown columns
/// resolve to themselves, which lets caller-specific columns travel through
/// the schema untouched.
pub fn resolve_term(col_name: &str) -> String {
    let name = strip_prefix(col_name);
    registry()
        .terms
        .iter()
        .find(|entry| entry.term.eq_ignore_ascii_case(name))
        .map(|entry| entry.uri.clone())
        .unwrap_or_else(|| name.to_string())
}

/// The semantic type of a core or extension table, bound to a class URI.
///
/// Known row types form a closed set loaded from the embedded class table;
/// an unrecognized URI is accepted as a [`RowType::Custom`] derived from its
/// last path segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowType {
    Occurrence,
    Event,
    Taxon,
    Identification,
    MeasurementOrFact,
    ResourceRelationship,
    ChronometricAge,
    Multimedia,
    ExtendedMeasurementOrFact,
    Custom { name: String, uri: String },
}

impl RowType {
    /// Looks a row type up by its class URI.
    pub fn from_uri(uri: &str) -> RowType {
        for entry in list_row_types() {
            if entry.uri == uri {
                if let Some(row_type) = Self::from_name(&entry.name) {
                    return row_type;
                }
            }
        }
        let name = extract_term(uri)
            .map(|term| upper_snake(&term))
            .unwrap_or_else(|_| "UNKNOWN".to_string());
        RowType::Custom {
            name,
            uri: uri.to_string(),
        }
    }

    /// Looks a builtin row type up by its registry name, case-insensitively.
    pub fn from_name(name: &str) -> Option<RowType> {
        match name.to_ascii_uppercase().as_str() {
            "OCCURRENCE" => Some(RowType::Occurrence),
            "EVENT" => Some(RowType::Event),
            "TAXON" => Some(RowType::Taxon),
            "IDENTIFICATION" => Some(RowType::Identification),
            "MEASUREMENT_OR_FACT" => Some(RowType::MeasurementOrFact),
            "RESOURCE_RELATIONSHIP" => Some(RowType::ResourceRelationship),
            "CHRONOMETRIC_AGE" => Some(RowType::ChronometricAge),
            "MULTIMEDIA" => Some(RowType::Multimedia),
            "EXTENDED_MEASUREMENT_OR_FACT" => Some(RowType::ExtendedMeasurementOrFact),
            _ => None,
        }
    }

    /// The registry name of the row type.
    pub fn name(&self) -> String {
        match self {
            RowType::Occurrence => "OCCURRENCE".to_string(),
            RowType::Event => "EVENT".to_string(),
            RowType::Taxon => "TAXON".to_string(),
            RowType::Identification => "IDENTIFICATION".to_string(),
            RowType::MeasurementOrFact => "MEASUREMENT_OR_FACT".to_string(),
            RowType::ResourceRelationship => "RESOURCE_RELATIONSHIP".to_string(),
            RowType::ChronometricAge => "CHRONOMETRIC_AGE".to_string(),
            RowType::Multimedia => "MULTIMEDIA".to_string(),
            RowType::ExtendedMeasurementOrFact => "EXTENDED_MEASUREMENT_OR_FACT".to_string(),
            RowType::Custom { name, .. } => name.clone(),
        }
    }

    /// The class URI of the row type.
    pub fn uri(&self) -> String {
        if let RowType::Custom { uri, .. } = self {
            return uri.clone();
        }
        let name = self.name();
        list_row_types()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.uri.clone())
            .unwrap_or_default()
    }

    /// Default file name for a table of this row type.
    pub fn default_file_name(&self) -> String {
        format!("{}.txt", self.name().to_ascii_lowercase())
    }

    /// Default key column(s) used for linking and uniqueness checks.
    pub fn default_keys(&self) -> Vec<String> {
        let keys: &[&str] = match self {
            RowType::Occurrence => &["occurrenceID"],
            RowType::Event => &["eventID"],
            RowType::Taxon => &["taxonID"],
            RowType::Multimedia => &["identifier"],
            _ => &[],
        };
        keys.iter().map(|k| k.to_string()).collect()
    }
}
