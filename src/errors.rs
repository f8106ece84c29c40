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

//! # Arca Error Module
//!
//! This module defines the error types and utilities used throughout Arca
//! for consistent error handling and reporting.
//!
//! ## Error Handling Philosophy
//!
//! Arca distinguishes two failure families:
//!
//! - **Structural/configuration errors**: a malformed or incomplete
//!   `meta.xml`, duplicate field names in one table, an identifier column
//!   where one is about to be synthesized, or a join that lost its
//!   identifier column. These abort the whole read/merge/write pipeline.
//! - **Carrier errors**: IO, ZIP and CSV failures surfaced from the
//!   underlying libraries.
//!
//! Data-quality problems (duplicate keys, empty keys, unnamed columns) are
//! *not* errors: they are collected in a validation report and only promoted
//! to [`ArcaError::Validation`] at call sites that are configured to be
//! fatal, such as archive creation.
//!
//! ## Error Categories
//!
//! - **Io**: Filesystem errors
//! - **Meta**: Schema (`meta.xml`) structure and parsing failures
//! - **Identity**: Identifier synthesis conflicts
//! - **Link**: Core/extension join configuration failures
//! - **Validation**: Fatal data-quality failures at configured call sites
//! - **Csv**: Table file parse/write errors
//! - **Zip**: ZIP archive operation errors
//! - **Internal**: Unexpected internal failures

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::result::ZipError;

/// Convenience result type used throughout Arca.
pub type Result<T> = std::result::Result<T, ArcaError>;

/// Canonical error enumeration for Arca.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ArcaError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Errors caused by a malformed or incomplete archive schema.
    #[error("meta error: {message}")]
    Meta { message: String },

    /// An identifier column was about to be synthesized where one exists.
    #[error("identity error: {message}")]
    Identity { message: String },

    /// The core/extension join lost or never produced an identifier column.
    #[error("link error: {message}")]
    Link { message: String },

    /// Validation failures promoted to hard errors at the call site.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Errors raised while parsing or writing a table file.
    #[error("csv error: {0}")]
    Csv(String),

    /// Errors originating from ZIP file operations.
    #[error("zip error: {0}")]
    Zip(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for ArcaError {
    fn from(err: io::Error) -> Self {
        ArcaError::Io(err.to_string())
    }
}

impl From<ZipError> for ArcaError {
    fn from(err: ZipError) -> Self {
        ArcaError::Zip(err.to_string())
    }
}

impl From<csv::Error> for ArcaError {
    fn from(err: csv::Error) -> Self {
        ArcaError::Csv(err.to_string())
    }
}

impl ArcaError {
    /// Helper to construct schema errors.
    pub fn meta<T: Into<String>>(message: T) -> Self {
        ArcaError::Meta {
            message: message.into(),
        }
    }

    /// Helper to construct identity errors.
    pub fn identity<T: Into<String>>(message: T) -> Self {
        ArcaError::Identity {
            message: message.into(),
        }
    }

    /// Helper to construct link errors.
    pub fn link<T: Into<String>>(message: T) -> Self {
        ArcaError::Link {
            message: message.into(),
        }
    }

    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        ArcaError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        ArcaError::Internal(message.into())
    }
}
