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

//! The `extract`, `compare` and `replace` commands.
//!
//! Each command prints its user-facing result to stdout and reports
//! failures through [`crate::Error`]; diagnostics go through `tracing`.

pub mod compare;
pub mod extract;
pub mod replace;

use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::backup::write_ensuring_dir;
use crate::error::{Error, Result};
use crate::store::{ensure_sqlite_available, Store};

/// The database and record a command operates on.
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub db: PathBuf,
    pub key: String,
}

impl Target {
    /// Checks that `sqlite3` is installed and that the database answers
    /// queries before handing out a [`Store`].
    pub async fn open(&self) -> Result<Store> {
        let version = ensure_sqlite_available().await?;
        debug!(%version, "found sqlite3");

        let store = Store::new(&self.db);
        store.validate_readable().await?;
        Ok(store)
    }
}

/// Reads a whole input file, where `-` and `/dev/stdin` mean standard input.
pub async fn read_input(file: &str) -> Result<String> {
    if file == "-" || file == "/dev/stdin" {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .map_err(Error::io("reading standard input"))?;
        return Ok(input);
    }

    tokio::fs::read_to_string(file)
        .await
        .map_err(Error::io(format!("reading {}", file)))
}

/// Writes `content` to `path`, making sure it ends with a newline.
pub async fn write_output(path: &Path, content: &str) -> Result<()> {
    write_ensuring_dir(path, &with_newline(content)).await
}

pub(crate) fn with_newline(content: &str) -> String {
    if content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{}\n", content)
    }
}

pub(crate) fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingRequiredOption(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_newline() {
        assert_eq!(with_newline("a"), "a\n");
        assert_eq!(with_newline("a\n"), "a\n");
        assert_eq!(with_newline(""), "\n");
    }

    #[test]
    fn test_required() {
        assert_eq!(required(&Some("x".to_string()), "--file").unwrap(), "x");
        assert!(matches!(
            required(&None, "--file"),
            Err(Error::MissingRequiredOption("--file"))
        ));
        assert!(required(&Some(String::new()), "--file").is_err());
    }

    #[tokio::test]
    async fn test_read_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.json");
        std::fs::write(&path, "{\"a\": 1}").unwrap();

        assert_eq!(read_input(path.to_str().unwrap()).await.unwrap(), "{\"a\": 1}");
        assert!(matches!(
            read_input(dir.path().join("nope.json").to_str().unwrap()).await,
            Err(Error::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target {
            db: dir.path().join("missing.vscdb"),
            key: crate::TARGET_KEY.to_string(),
        };

        // either sqlite3 is missing or the file is
        assert!(matches!(
            target.open().await,
            Err(Error::SqliteUnavailable) | Err(Error::StoreNotFound(_))
        ));
    }
}
