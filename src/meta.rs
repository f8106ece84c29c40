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

//! # Arca Archive Schema
//!
//! A Darwin Core Archive carries a `meta.xml` file that describes every
//! table in the archive: whether it is the core or an extension, its row
//! type, its CSV dialect, the data file it lives in, and the mapping of
//! column positions onto vocabulary terms.
//!
//! [`Meta`] is the in-memory form of that file. It is parsed from the XML
//! found in an existing archive and serialized back when an archive is
//! written. Parsing is namespace-tolerant; serialization always emits the
//! Darwin Core text namespace.
//!
//! ## Escaped dialect characters
//!
//! `meta.xml` stores control characters in escaped form, for example the
//! two-character sequence `\t` for a tab delimiter and `\r\n` for the line
//! terminator. [`CsvEncoding`] normalizes those escapes into the actual
//! characters on the way in and restores them on the way out, so the rest
//! of the crate only ever sees real characters.

use serde::{Deserialize, Serialize};

use crate::errors::{ArcaError, Result};
use crate::terms::{extract_term, resolve_term, strip_prefix, RowType};

/// Injected column name for the core record identifier.
pub const ID_FIELD: &str = "id";
/// Injected column name for an extension's reference to its core record.
pub const CORE_ID_FIELD: &str = "coreid";
/// Schema file name inside an archive.
pub const META_XML: &str = "meta.xml";
/// Default dataset metadata file name inside an archive.
pub const EML_XML: &str = "eml.xml";
/// Namespace of the Darwin Core text schema.
pub const DWC_TEXT_NAMESPACE: &str = "http://rs.tdwg.org/dwc/text/";

/// Whether a table is the archive core or an extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoreOrExt {
    Core,
    Extension,
}

impl CoreOrExt {
    /// The element tag used for this table kind in `meta.xml`.
    pub fn tag(&self) -> &'static str {
        match self {
            CoreOrExt::Core => "core",
            CoreOrExt::Extension => "extension",
        }
    }
}

/// The CSV dialect of one table file.
///
/// Defaults follow the common DwCA conventions of comma-delimited rows
/// terminated by a newline, with double quotes enclosing text and a doubled
/// quote escaping an embedded quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvEncoding {
    pub delimiter: String,
    pub eol: String,
    pub quote: String,
    pub escape: String,
}

impl Default for CsvEncoding {
    fn default() -> Self {
        CsvEncoding {
            delimiter: ",".to_string(),
            eol: "\n".to_string(),
            quote: "\"".to_string(),
            escape: "\"".to_string(),
        }
    }
}

impl CsvEncoding {
    /// Builds an encoding from possibly escaped `meta.xml` attribute values.
    pub fn new(delimiter: &str, eol: &str, quote: &str) -> Self {
        let quote = if quote.is_empty() { "\"" } else { quote };
        CsvEncoding {
            delimiter: Self::unescape(delimiter),
            eol: if eol.is_empty() {
                "\n".to_string()
            } else {
                Self::unescape(eol)
            },
            quote: Self::unescape(quote),
            escape: "\"".to_string(),
        }
    }

    /// Translates an escaped character specification into the actual
    /// character, for example the literal `\t` into a tab.
    fn unescape(value: &str) -> String {
        match value {
            "LF" => "\r\n".to_string(),
            "\\r\\n" => "\r\n".to_string(),
            "\\t" => "\t".to_string(),
            "\\n" => "\n".to_string(),
            "&quot;" => "\"".to_string(),
            other => other.to_string(),
        }
    }

    /// The `fieldsTerminatedBy` attribute value for this dialect.
    fn delimiter_attr(&self) -> String {
        match self.delimiter.as_str() {
            "\t" => "\\t".to_string(),
            other => other.to_string(),
        }
    }

    /// The `linesTerminatedBy` attribute value for this dialect.
    fn eol_attr(&self) -> String {
        match self.eol.as_str() {
            "\r\n" | "\n" => "\\r\\n".to_string(),
            other => other.to_string(),
        }
    }
}

/// Description of one table file: kind, row type, dialect and location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaElementInfo {
    pub core_or_ext: CoreOrExt,
    pub row_type: RowType,
    pub encoding: CsvEncoding,
    pub ignore_header_lines: usize,
    pub charset: String,
    pub file_name: String,
}

impl MetaElementInfo {
    /// A description with the usual defaults: one header line, UTF-8, and
    /// the row type's default file name unless one is given.
    pub fn new(
        core_or_ext: CoreOrExt,
        row_type: RowType,
        encoding: CsvEncoding,
        file_name: Option<String>,
    ) -> Self {
        let file_name = match file_name {
            Some(name) if !name.is_empty() => name,
            _ => row_type.default_file_name(),
        };
        MetaElementInfo {
            core_or_ext,
            row_type,
            encoding,
            ignore_header_lines: 1,
            charset: "UTF-8".to_string(),
            file_name,
        }
    }
}

/// The binding of one CSV column onto a vocabulary term.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub index: Option<usize>,
    pub field_name: String,
    pub term: Option<String>,
    pub default: Option<String>,
    pub vocabulary: Option<String>,
}

/// Schema entry for one table: its description, its record identifier
/// binding and its column-to-term mappings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaElement {
    pub info: MetaElementInfo,
    pub core_id: Option<FieldSpec>,
    pub fields: Vec<FieldSpec>,
}

impl MetaElement {
    /// Column names of the table file in positional order.
    ///
    /// When the record identifier occupies its own column, that is when an
    /// `id`/`coreid` index is declared and no field is mapped at index 0, a
    /// synthetic `id` or `coreid` column is injected at the front. Columns
    /// that appear more than once indicate a broken schema.
    pub fn declared_columns(&self) -> Result<Vec<String>> {
        let zero_index_mapped = self.fields.iter().any(|f| f.index == Some(0));
        let mut columns: Vec<String> = Vec::with_capacity(self.fields.len() + 1);
        if let Some(core_id) = &self.core_id {
            if core_id.index.is_some() && !zero_index_mapped {
                let injected = match self.info.core_or_ext {
                    CoreOrExt::Core => ID_FIELD,
                    CoreOrExt::Extension => CORE_ID_FIELD,
                };
                columns.push(injected.to_string());
            }
        }
        // Field elements can appear in any document order; the index
        // attribute alone fixes each column's position in the file.
        let mut indexed: Vec<(usize, &str)> = self
            .fields
            .iter()
            .filter_map(|f| f.index.map(|i| (i, f.field_name.as_str())))
            .collect();
        indexed.sort_by_key(|(i, _)| *i);
        columns.extend(indexed.into_iter().map(|(_, name)| name.to_string()));
        let mut seen = std::collections::HashSet::new();
        let duplicates: Vec<&String> = columns.iter().filter(|c| !seen.insert(c.as_str())).collect();
        if !duplicates.is_empty() {
            return Err(ArcaError::meta(format!(
                "duplicate columns {duplicates:?} declared for {}",
                self.info.file_name
            )));
        }
        Ok(columns)
    }
}

/// The complete schema of an archive.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Meta {
    pub eml_file_name: String,
    pub elements: Vec<MetaElement>,
}

impl Meta {
    pub fn new() -> Self {
        Meta {
            eml_file_name: EML_XML.to_string(),
            elements: Vec::new(),
        }
    }

    /// The core schema entry, if one has been recorded.
    pub fn core(&self) -> Option<&MetaElement> {
        self.elements
            .iter()
            .find(|e| e.info.core_or_ext == CoreOrExt::Core)
    }

    /// Iterator over the extension schema entries.
    pub fn extensions(&self) -> impl Iterator<Item = &MetaElement> {
        self.elements
            .iter()
            .filter(|e| e.info.core_or_ext == CoreOrExt::Extension)
    }

    /// Parses the content of a `meta.xml` file.
    ///
    /// The core element is mandatory and is ordered first, followed by the
    /// extensions in document order.
    pub fn parse(xml: &str) -> Result<Meta> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| ArcaError::meta(format!("invalid meta file: {e}")))?;
        let root = doc.root_element();
        let eml_file_name = root
            .attribute("metadata")
            .filter(|v| !v.is_empty())
            .unwrap_or(EML_XML)
            .to_string();

        let core_node = root
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == CoreOrExt::Core.tag())
            .ok_or_else(|| ArcaError::meta("meta file declares no core element"))?;
        let mut elements = vec![Self::parse_element(core_node, CoreOrExt::Core)?];
        for node in root
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == CoreOrExt::Extension.tag())
        {
            elements.push(Self::parse_element(node, CoreOrExt::Extension)?);
        }
        Ok(Meta {
            eml_file_name,
            elements,
        })
    }

    fn parse_element(node: roxmltree::Node, core_or_ext: CoreOrExt) -> Result<MetaElement> {
        fn required<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Result<&'a str> {
            node.attribute(name).ok_or_else(|| {
                ArcaError::meta(format!(
                    "meta file element <{}> is missing the {name} attribute",
                    node.tag_name().name()
                ))
            })
        }
        fn optional(node: roxmltree::Node, name: &str) -> Option<String> {
            node.attribute(name)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }
        fn parse_index(value: &str, context: &str) -> Result<usize> {
            value.trim().parse::<usize>().map_err(|_| {
                ArcaError::meta(format!("invalid {context} index {value:?} in meta file"))
            })
        }

        let row_type = RowType::from_uri(required(node, "rowType")?);
        let encoding = CsvEncoding::new(
            required(node, "fieldsTerminatedBy")?,
            required(node, "linesTerminatedBy")?,
            node.attribute("fieldsEnclosedBy").unwrap_or("\""),
        );
        let ignore_header_lines = node
            .attribute("ignoreHeaderLines")
            .unwrap_or("1")
            .trim()
            .parse::<usize>()
            .map_err(|_| ArcaError::meta("invalid ignoreHeaderLines value in meta file"))?;
        let charset = node.attribute("encoding").unwrap_or("UTF-8").to_string();

        let file_name = node
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == "files")
            .and_then(|files| {
                files
                    .children()
                    .find(|n| n.is_element() && n.tag_name().name() == "location")
            })
            .and_then(|loc| loc.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ArcaError::meta(format!(
                    "meta file element <{}> declares no file location",
                    core_or_ext.tag()
                ))
            })?;

        let id_tag = match core_or_ext {
            CoreOrExt::Core => ID_FIELD,
            CoreOrExt::Extension => CORE_ID_FIELD,
        };
        let core_id = match node
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == id_tag)
            .and_then(|n| n.attribute("index"))
            .filter(|v| !v.is_empty())
        {
            Some(index) => Some(FieldSpec {
                index: Some(parse_index(index, id_tag)?),
                ..FieldSpec::default()
            }),
            None => None,
        };

        let mut fields = Vec::new();
        for field_node in node
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "field")
        {
            let term = required(field_node, "term")?;
            let index = match field_node.attribute("index").filter(|v| !v.is_empty()) {
                Some(value) => Some(parse_index(value, "field")?),
                None => None,
            };
            fields.push(FieldSpec {
                index,
                field_name: extract_term(term)?,
                term: Some(term.to_string()),
                default: optional(field_node, "default"),
                vocabulary: optional(field_node, "vocabulary"),
            });
        }

        let info = MetaElementInfo {
            core_or_ext,
            row_type,
            encoding,
            ignore_header_lines,
            charset,
            file_name,
        };
        Ok(MetaElement {
            info,
            core_id,
            fields,
        })
    }

    /// Drops the schema entries whose file names appear in `files`.
    pub fn remove_elements(&mut self, files: &[String]) {
        self.elements
            .retain(|e| !files.contains(&e.info.file_name));
    }

    /// Maps header column names onto positional field specs.
    ///
    /// Returns the field list and, when `index_field` names one of the
    /// headers, the spec of the column that doubles as the record
    /// identifier.
    pub fn map_headers(
        headers: &[String],
        index_field: Option<&str>,
    ) -> (Vec<FieldSpec>, Option<FieldSpec>) {
        let mut fields = Vec::with_capacity(headers.len());
        let mut id_field = None;
        for (i, col) in headers.iter().enumerate() {
            let name = strip_prefix(col).to_string();
            let spec = FieldSpec {
                index: Some(i),
                field_name: name.clone(),
                term: Some(resolve_term(&name)),
                default: None,
                vocabulary: None,
            };
            if let Some(index_field) = index_field {
                if strip_prefix(index_field) == name {
                    id_field = Some(spec.clone());
                }
            }
            fields.push(spec);
        }
        (fields, id_field)
    }

    /// Replaces or appends the schema entry for a table, matched on file
    /// name, rebuilding its field list from the given headers.
    pub fn update_element(
        &mut self,
        info: MetaElementInfo,
        headers: &[String],
        index_field: Option<&str>,
    ) {
        let (fields, new_core_id) = Self::map_headers(headers, index_field);
        if let Some(existing) = self
            .elements
            .iter_mut()
            .find(|e| e.info.file_name == info.file_name)
        {
            let core_id = new_core_id.or_else(|| existing.core_id.clone());
            *existing = MetaElement {
                info,
                core_id,
                fields,
            };
        } else {
            self.elements.push(MetaElement {
                info,
                core_id: new_core_id,
                fields,
            });
        }
    }

    /// Serializes the schema as a `meta.xml` document.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" ?>\n");
        out.push_str(&format!(
            "<archive xmlns=\"{}\" metadata=\"{}\">\n",
            DWC_TEXT_NAMESPACE,
            escape_xml(&self.eml_file_name)
        ));
        for element in &self.elements {
            Self::write_element(&mut out, element);
        }
        out.push_str("</archive>\n");
        out
    }

    fn write_element(out: &mut String, element: &MetaElement) {
        let info = &element.info;
        let tag = info.core_or_ext.tag();
        out.push_str(&format!(
            "  <{tag} encoding=\"{}\" rowType=\"{}\" fieldsTerminatedBy=\"{}\" \
             linesTerminatedBy=\"{}\" fieldsEnclosedBy=\"{}\" ignoreHeaderLines=\"{}\">\n",
            escape_xml(&info.charset),
            escape_xml(&info.row_type.uri()),
            escape_xml(&info.encoding.delimiter_attr()),
            escape_xml(&info.encoding.eol_attr()),
            escape_xml(&info.encoding.quote),
            info.ignore_header_lines
        ));
        out.push_str("    <files>\n");
        out.push_str(&format!(
            "      <location>{}</location>\n",
            escape_xml(&info.file_name)
        ));
        out.push_str("    </files>\n");
        if let Some(core_id) = &element.core_id {
            if let Some(index) = core_id.index {
                let id_tag = match info.core_or_ext {
                    CoreOrExt::Core => ID_FIELD,
                    CoreOrExt::Extension => CORE_ID_FIELD,
                };
                out.push_str(&format!("    <{id_tag} index=\"{index}\"/>\n"));
            }
        }
        for field in &element.fields {
            if field.field_name == ID_FIELD || field.field_name == CORE_ID_FIELD {
                continue;
            }
            out.push_str("    <field");
            if let Some(index) = field.index {
                out.push_str(&format!(" index=\"{index}\""));
            }
            if let Some(term) = &field.term {
                out.push_str(&format!(" term=\"{}\"", escape_xml(term)));
            }
            if let Some(vocabulary) = &field.vocabulary {
                out.push_str(&format!(" vocabulary=\"{}\"", escape_xml(vocabulary)));
            }
            if let Some(default) = &field.default {
                out.push_str(&format!(" default=\"{}\"", escape_xml(default)));
            }
            out.push_str("/>\n");
        }
        out.push_str(&format!("  </{tag}>\n"));
    }
}

/// Escapes a string for use in XML text or attribute content.
pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
