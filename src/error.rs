// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

/// Errors raised while reading, comparing or replacing the settings record.
///
/// Diffing and rendering never fail; every variant here comes from parsing,
/// the store or the file system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is not valid JSON.
    #[error("value is not valid JSON (raw value length: {len}): {source}")]
    MalformedJson {
        len: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The store has no record, or an empty one, for the key.
    #[error("key not found or empty value: {0}")]
    KeyNotFound(String),

    /// The store file does not exist.
    #[error("SQLite DB not found: {}", .0.display())]
    StoreNotFound(PathBuf),

    /// The store could not be opened or queried.
    #[error("failed to read SQLite DB, is the path correct? details: {0}")]
    StoreUnreadable(String),

    /// The store could not be locked for writing.
    #[error("DB may be locked or not writable, close Cursor and try again: {0}")]
    StoreUnwritable(String),

    /// The value read back after a write differs from the value written.
    #[error(
        "verification failed: DB content does not match the provided JSON; the original value was backed up to {}",
        backup.display()
    )]
    VerificationFailed { backup: PathBuf },

    /// A required command option was not supplied.
    #[error("missing {0}")]
    MissingRequiredOption(&'static str),

    /// A path rule could not be parsed.
    #[error("invalid path {0:?}")]
    InvalidPath(String),

    /// The `sqlite3` shell is not installed.
    #[error("sqlite3 CLI not found, please install it or ensure it is on PATH")]
    SqliteUnavailable,

    /// A file system or process operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Error {
        let context = context.into();
        move |source| Error::Io { context, source }
    }
}

/// Convenience alias for results of this crate.
pub type Result<T> = std::result::Result<T, Error>;
