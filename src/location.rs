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

//! Discovery of Cursor's state database.

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Environment variable overriding the database location.
pub const DB_ENV: &str = "CURSOR_STATE_DB";

const DB_FILE: &str = "state.vscdb";

/// Resolves the database path from an explicit argument, falling back to
/// the platform default. Relative paths are made absolute.
pub fn resolve_db_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => absolute(path),
        None => default_db_path(),
    }
}

/// First existing default location for this platform, or the preferred one
/// when none exists yet.
pub fn default_db_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_default();
    let app_data = env::var_os("APPDATA").map(PathBuf::from);
    let candidates = candidates(env::consts::OS, &home, app_data.as_deref());

    let found = candidates.iter().find(|c| c.exists()).cloned();
    debug!(?candidates, ?found, "looked up default DB locations");

    found
        .or_else(|| candidates.into_iter().next())
        .unwrap_or_else(|| PathBuf::from(DB_FILE))
}

fn candidates(os: &str, home: &Path, app_data: Option<&Path>) -> Vec<PathBuf> {
    let base = match os {
        "linux" => home.join(".config"),
        "windows" => app_data
            .map(Path::to_path_buf)
            .unwrap_or_else(|| home.join("AppData").join("Roaming")),
        _ => home.join("Library").join("Application Support"),
    };

    ["User", "user"]
        .iter()
        .map(|user| {
            base.join("Cursor")
                .join(user)
                .join("globalStorage")
                .join(DB_FILE)
        })
        .collect()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
