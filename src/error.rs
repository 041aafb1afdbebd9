//  Copyright 2026 Robert Zavalczki
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The four error kinds a training run can fail with. Every variant names
/// the offending file where one is involved, so a crash always points at a
/// concrete artifact on disk.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {file}: {detail}")]
    Format { file: PathBuf, detail: String },

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl TrainerError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        TrainerError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn format(file: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        TrainerError::Format {
            file: file.as_ref().to_path_buf(),
            detail: detail.into(),
        }
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        TrainerError::Invariant(detail.into())
    }

    pub fn config(detail: impl Into<String>) -> Self {
        TrainerError::Config(detail.into())
    }
}

pub type Result<T> = std::result::Result<T, TrainerError>;
