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

//! # Arca Dataset Metadata
//!
//! A small builder for the Ecological Metadata Language document shipped
//! in an archive as `eml.xml`. Only the handful of dataset fields this
//! crate needs are modelled; a caller with a richer document simply
//! supplies it as a ready-made string instead.
//!
//! See <https://eml.ecoinformatics.org/>.

use serde::{Deserialize, Serialize};

use crate::meta::escape_xml;

/// Dataset metadata for an archive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Eml {
    pub package_id: String,
    pub system: String,
    pub dataset_name: String,
    pub description: String,
    pub citation: String,
    pub license: String,
    pub rights: String,
}

impl Default for Eml {
    fn default() -> Self {
        Eml {
            package_id: "arca".to_string(),
            system: "arca".to_string(),
            dataset_name: String::new(),
            description: String::new(),
            citation: String::new(),
            license: String::new(),
            rights: String::new(),
        }
    }
}

impl Eml {
    pub fn new(dataset_name: impl Into<String>) -> Self {
        Eml {
            dataset_name: dataset_name.into(),
            ..Eml::default()
        }
    }

    /// Serializes the metadata as an `eml.xml` document.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<eml:eml xmlns:eml=\"https://eml.ecoinformatics.org/eml-2.2.0\" \
             packageId=\"{}\" system=\"{}\">\n",
            escape_xml(&self.package_id),
            escape_xml(&self.system)
        ));
        out.push_str("  <dataset>\n");
        out.push_str(&format!(
            "    <title>{}</title>\n",
            escape_xml(&self.dataset_name)
        ));
        if !self.description.is_empty() {
            out.push_str(&format!(
                "    <abstract>\n      <para>{}</para>\n    </abstract>\n",
                escape_xml(&self.description)
            ));
        }
        if !self.license.is_empty() {
            out.push_str(&format!(
                "    <licensed>\n      <licenseName>{}</licenseName>\n    </licensed>\n",
                escape_xml(&self.license)
            ));
        }
        if !self.rights.is_empty() || !self.citation.is_empty() {
            out.push_str("    <intellectualRights>\n");
            if !self.rights.is_empty() {
                out.push_str(&format!(
                    "      <para>{}</para>\n",
                    escape_xml(&self.rights)
                ));
            }
            if !self.citation.is_empty() {
                out.push_str(&format!(
                    "      <para>{}</para>\n",
                    escape_xml(&self.citation)
                ));
            }
            out.push_str("    </intellectualRights>\n");
        }
        out.push_str("  </dataset>\n");
        out.push_str("</eml:eml>\n");
        out
    }
}

/// Dataset metadata given either as a prebuilt document or as fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EmlContent {
    /// A complete `eml.xml` document, used verbatim.
    Document(String),
    /// Structured fields serialized by this crate.
    Fields(Eml),
}

impl EmlContent {
    /// The document text, or `None` for an empty document.
    pub fn text(&self) -> Option<String> {
        match self {
            EmlContent::Document(text) if text.is_empty() => None,
            EmlContent::Document(text) => Some(text.clone()),
            EmlContent::Fields(eml) => Some(eml.to_xml()),
        }
    }
}

impl Default for EmlContent {
    fn default() -> Self {
        EmlContent::Document(String::new())
    }
}
