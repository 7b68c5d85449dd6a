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

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use crate::error::{Error, Result};

lazy_static! {
    static ref UNSAFE_CHAR_RE: Regex = Regex::new(r"[^a-zA-Z0-9_.-]").unwrap();
}

/// Default backup directory, relative to the working directory.
pub const DEFAULT_BACKUP_DIR: &str = "cursor_state_backups";

/// Timestamped backups written before the store is modified.
///
/// All files written through one `Backups` share the same timestamp, so the
/// JSON backup and the database copy of a single run sort together.
#[derive(Debug, Clone)]
pub struct Backups {
    dir: PathBuf,
    stamp: String,
}

impl Backups {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_stamp(dir, timestamp())
    }

    pub fn with_stamp(dir: impl Into<PathBuf>, stamp: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stamp: stamp.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the raw record text to `<dir>/<key>.backup_<stamp>.json`.
    pub async fn save_value(&self, key: &str, raw: &str) -> Result<PathBuf> {
        let path = self
            .dir
            .join(format!("{}.backup_{}.json", sanitize_key(key), self.stamp));
        write_ensuring_dir(&path, raw).await?;
        info!(path = %path.display(), "JSON backup written");

        Ok(path)
    }

    /// Copies the whole database file to `<dir>/db/<name>.<stamp>`.
    pub async fn save_store(&self, db: &Path) -> Result<PathBuf> {
        let dir = self.dir.join("db");
        ensure_dir(&dir).await?;

        let name = db
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state.vscdb".to_string());
        let path = dir.join(format!("{}.{}", name, self.stamp));
        tokio::fs::copy(db, &path)
            .await
            .map_err(Error::io(format!("copying {}", db.display())))?;
        info!(path = %path.display(), "DB backup written");

        Ok(path)
    }
}

/// Local time as `YYYYMMDD_HHMMSS`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Replaces every character unsafe in a file name with `_`.
pub fn sanitize_key(key: &str) -> String {
    UNSAFE_CHAR_RE.replace_all(key, "_").into_owned()
}

pub(crate) async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(Error::io(format!("creating {}", dir.display())))
}

/// Writes `content` to `path`, creating missing parent directories.
pub(crate) async fn write_ensuring_dir(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }

    tokio::fs::write(path, content)
        .await
        .map_err(Error::io(format!("writing {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("a.b-c_d"), "a.b-c_d");
        assert_eq!(sanitize_key("a/b c:d"), "a_b_c_d");
        assert_eq!(sanitize_key("ké y"), "k__y");
        assert_eq!(
            sanitize_key(crate::TARGET_KEY),
            crate::TARGET_KEY,
            "the default key is already file-name safe"
        );
    }

    #[test]
    fn test_timestamp_shape() {
        let stamp = timestamp();
        let re = Regex::new(r"^\d{8}_\d{6}$").unwrap();
        assert!(re.is_match(&stamp), "unexpected timestamp {}", stamp);
    }

    #[tokio::test]
    async fn test_save_value() {
        let dir = tempfile::tempdir().unwrap();
        let backups = Backups::with_stamp(dir.path().join("nested/bk"), "20240101_120000");

        let path = backups.save_value("my/key", "{\"a\":1}").await.unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("nested/bk")
                .join("my_key.backup_20240101_120000.json")
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_save_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("state.vscdb");
        std::fs::write(&db, b"db bytes").unwrap();
        let backups = Backups::with_stamp(dir.path().join("bk"), "20240101_120000");

        let path = backups.save_store(&db).await.unwrap();

        assert_eq!(
            path,
            dir.path().join("bk/db/state.vscdb.20240101_120000")
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"db bytes");
    }

    #[tokio::test]
    async fn test_write_ensuring_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/report.md");

        write_ensuring_dir(&path, "hello\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
