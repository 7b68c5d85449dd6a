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

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

use serde_json::Value;

mod backup;
pub mod commands;
mod error;
mod json_diff;
pub mod location;
mod report;
mod store;

pub use backup::Backups;
pub use error::{Error, Result};
pub use json_diff::path::{Key, ParsePath, Path};
pub use json_diff::{diff, Config, Difference};
pub use report::{render, Format, ReportContext};
pub use store::{ensure_sqlite_available, Store, TARGET_KEY};

/// Parses `text` as JSON, reporting the input length on failure.
///
/// # Examples
///
/// ```
/// use cursor_settings::{parse_json_strict, Error};
///
/// assert!(parse_json_strict(r#"{"a": 1}"#).is_ok());
/// assert!(matches!(
///     parse_json_strict("{oops"),
///     Err(Error::MalformedJson { len: 5, .. })
/// ));
/// ```
pub fn parse_json_strict(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|source| Error::MalformedJson {
        len: text.len(),
        source,
    })
}

/// Serializes `value` the way reports and `extract --pretty` print it.
pub fn to_pretty_json(value: &Value) -> String {
    json_diff::pretty(value)
}
