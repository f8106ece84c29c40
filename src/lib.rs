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

//! # Arca Core Library
//!
//! Arca reads, creates and reconciles Darwin Core Archives, the zip-based
//! packaging format used to exchange biodiversity data: a core CSV table,
//! any number of extension tables linked to it, a `meta.xml` schema and an
//! optional `eml.xml` dataset metadata document.
//!
//! ## Module Overview
//!
//! - **terms**: vocabulary term and class row-type registries
//! - **meta**: the `meta.xml` schema model, its parsing and serialization
//! - **table**: the in-memory tabular value and record statistics
//! - **csvio**: CSV reading and writing in arbitrary dialects
//! - **content**: tables bound to their schema entries and key tuples
//! - **archive**: the archive itself: extraction, linkage, deletion, writing
//! - **merge**: reconciliation of a delta archive into a base archive
//! - **validate**: key and column checks with a collectable report
//! - **eml**: a small builder for dataset metadata documents
//! - **handler**: one-call operations over whole archives
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arca::{ContentData, DataSource, DwcaHandler, EmlContent, RowType};
//!
//! let core = ContentData::new(
//!     DataSource::Files(vec!["occurrence.csv".into()]),
//!     RowType::Occurrence,
//! );
//! DwcaHandler::create_dwca(&core, &[], "occurrence.zip", true, &EmlContent::default())
//!     .expect("archive created");
//! ```
//!
//! ## Record linkage
//!
//! Extension rows reference their core record through an id column bound
//! in the schema. Tables keyed by a single column use that column
//! directly; composite keys force generated UUID identifiers, with
//! extensions joined onto the core over the key columns. Reconciliation
//! always compares rows by their key values, never by the synthetic
//! identifiers, so archives produced independently can still be merged.
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, ArcaError>`. Variants carry
//! the failing concern: schema, linkage, identity, validation, CSV, zip
//! or plain I/O.

pub mod archive;
pub mod content;
pub mod csvio;
pub mod eml;
pub mod errors;
pub mod handler;
pub mod merge;
pub mod meta;
pub mod table;
pub mod terms;
pub mod validate;

pub use archive::Archive;
pub use content::{ContentData, DataSource, KeyTuple, TableContent};
pub use eml::{Eml, EmlContent};
pub use errors::{ArcaError, Result};
pub use handler::DwcaHandler;
pub use meta::{
    CoreOrExt, CsvEncoding, FieldSpec, Meta, MetaElement, MetaElementInfo, CORE_ID_FIELD,
    EML_XML, ID_FIELD, META_XML,
};
pub use table::{Cell, Stat, Table};
pub use terms::{RowType, RowTypeEntry, TermEntry};
pub use validate::{ValidationIssue, ValidationKind, ValidationReport};
