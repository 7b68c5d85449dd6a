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

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Key of the record holding Cursor's application user settings.
pub const TARGET_KEY: &str =
    "src.vs.platform.reactivestorage.browser.reactiveStorageServiceImpl.persistentStorage.applicationUser";

const SQLITE: &str = "sqlite3";

/// Checks that the `sqlite3` shell can be run and returns its version line.
pub async fn ensure_sqlite_available() -> Result<String> {
    let output = Command::new(SQLITE)
        .arg("-version")
        .output()
        .await
        .map_err(|_| Error::SqliteUnavailable)?;

    if !output.status.success() {
        return Err(Error::SqliteUnavailable);
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Accessor for the `ItemTable` key/value table of a state database.
///
/// Every query is a separate `sqlite3` process, run to completion before the
/// next one starts.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails with [`Error::StoreNotFound`] or [`Error::StoreUnreadable`]
    /// unless the file exists and answers a schema query.
    pub async fn validate_readable(&self) -> Result<()> {
        if !self.path.exists() {
            return Err(Error::StoreNotFound(self.path.clone()));
        }

        self.run("PRAGMA schema_version;").await.map(|_| ())
    }

    /// Tries to take the write lock and releases it straight away.
    pub async fn probe_writable(&self) -> Result<()> {
        self.run("BEGIN IMMEDIATE; ROLLBACK;")
            .await
            .map(|_| ())
            .map_err(|err| Error::StoreUnwritable(err.to_string()))
    }

    /// Returns the stored text for `key`, or `None` when the key is absent
    /// or its value is empty.
    pub async fn fetch_value(&self, key: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT value FROM ItemTable WHERE key = {} LIMIT 1;",
            quote(key)
        );
        let value = self.run(&sql).await?.trim().to_string();

        Ok(if value.is_empty() { None } else { Some(value) })
    }

    /// Like [`Store::fetch_value`] but a missing record is an error.
    pub async fn fetch_required(&self, key: &str) -> Result<String> {
        self.fetch_value(key)
            .await?
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Replaces the value of `key` inside a transaction.
    ///
    /// The text travels through a temporary file read by `readfile()`, so
    /// its size is not bounded by the command line.
    pub async fn write_value(&self, key: &str, value: &str) -> Result<()> {
        let dir = tempfile::Builder::new()
            .prefix("cursor-state-")
            .tempdir()
            .map_err(Error::io("creating payload directory"))?;
        let payload = dir.path().join("payload.json");
        tokio::fs::write(&payload, value)
            .await
            .map_err(Error::io(format!("writing {}", payload.display())))?;

        let sql = format!(
            "BEGIN; UPDATE ItemTable SET value = CAST(readfile({}) AS TEXT) WHERE key = {}; COMMIT;",
            quote(&payload.to_string_lossy()),
            quote(key)
        );
        self.run(&sql).await?;
        info!(key, bytes = value.len(), "value written");

        Ok(())
    }

    pub(crate) async fn run(&self, sql: &str) -> Result<String> {
        debug!(db = %self.path.display(), sql, "running sqlite3");

        let output = Command::new(SQLITE)
            .arg("-batch")
            .arg("-noheader")
            .arg(&self.path)
            .arg(sql)
            .output()
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => Error::SqliteUnavailable,
                _ => Error::Io {
                    context: format!("running {}", SQLITE),
                    source: err,
                },
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let details = if stderr.is_empty() {
                format!("sqlite3 exited with {}", output.status)
            } else {
                format!("sqlite3 error: {}", stderr)
            };
            return Err(Error::StoreUnreadable(details));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Quotes `value` as an SQL string literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Creates a database holding a single record, or returns `None` when the
/// `sqlite3` shell is not installed.
#[cfg(test)]
pub(crate) async fn seeded_store(dir: &Path, key: &str, value: &str) -> Option<Store> {
    if ensure_sqlite_available().await.is_err() {
        eprintln!("sqlite3 not installed, skipping");
        return None;
    }

    let store = Store::new(dir.join("state.vscdb"));
    store
        .run("CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB);")
        .await
        .unwrap();
    store
        .run(&format!(
            "INSERT INTO ItemTable VALUES ({}, {});",
            quote(key),
            quote(value)
        ))
        .await
        .unwrap();
    Some(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUE: &str = r#"{"a":1,"name":"it's"}"#;

    #[test]
    fn test_quote() {
        assert_eq!(quote("abc"), "'abc'");
        assert_eq!(quote("it's"), "'it''s'");
        assert_eq!(quote("''"), "''''''");
    }

    #[tokio::test]
    async fn test_fetch_value() {
        let dir = tempfile::tempdir().unwrap();
        let Some(store) = seeded_store(dir.path(), TARGET_KEY, VALUE).await else {
            return;
        };

        store.validate_readable().await.unwrap();
        assert_eq!(
            store.fetch_value(TARGET_KEY).await.unwrap(),
            Some(VALUE.to_string())
        );
        assert_eq!(store.fetch_value("missing").await.unwrap(), None);
        assert!(matches!(
            store.fetch_required("it's missing").await,
            Err(Error::KeyNotFound(key)) if key == "it's missing"
        ));
    }

    #[tokio::test]
    async fn test_write_value() {
        let dir = tempfile::tempdir().unwrap();
        let Some(store) = seeded_store(dir.path(), TARGET_KEY, VALUE).await else {
            return;
        };

        store.probe_writable().await.unwrap();
        let value = r#"{"a":2,"quote":"'","nested":{"list":[1,2,3]}}"#;
        store.write_value(TARGET_KEY, value).await.unwrap();

        assert_eq!(
            store.fetch_value(TARGET_KEY).await.unwrap().as_deref(),
            Some(value)
        );
    }

    #[tokio::test]
    async fn test_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("absent.vscdb"));

        assert!(matches!(
            store.validate_readable().await,
            Err(Error::StoreNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_store() {
        let dir = tempfile::tempdir().unwrap();
        if ensure_sqlite_available().await.is_err() {
            return;
        }

        let path = dir.path().join("garbage.vscdb");
        std::fs::write(&path, "this is not a database\n".repeat(64)).unwrap();
        let store = Store::new(path);

        assert!(matches!(
            store.validate_readable().await,
            Err(Error::StoreUnreadable(_))
        ));
    }
}
