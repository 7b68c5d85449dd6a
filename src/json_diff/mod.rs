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

mod misc;
pub mod path;

pub(crate) use misc::pretty;
use misc::{canonical, kind_name, Indent};
use path::{Key, Path};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Configuration for how JSON values should be compared.
///
/// Both rule lists hold paths that may contain wildcards. An ignored path
/// excludes itself and everything below it. An unordered path makes the
/// array found exactly at that path compare as a multiset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config<'a> {
    pub(crate) ignore_paths: Vec<Path<'a>>,
    pub(crate) unordered_paths: Vec<Path<'a>>,
}

impl<'a> Config<'a> {
    /// Create a new [`Config`] with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path to the list of paths to ignore.
    pub fn ignore_path(mut self, path: Path<'a>) -> Self {
        self.ignore_paths.push(path);
        self
    }

    /// Add a path whose array is compared regardless of element order.
    pub fn unordered_path(mut self, path: Path<'a>) -> Self {
        self.unordered_paths.push(path);
        self
    }

    /// Checks if the given path should be ignored.
    pub fn to_ignore(&self, path: &Path) -> bool {
        self.ignore_paths.iter().any(|p| p.prefixes(path))
    }

    /// Checks if the array at the given path is unordered.
    pub fn is_unordered(&self, path: &Path) -> bool {
        self.unordered_paths.iter().any(|p| p.matches(path))
    }
}

/// Compares `lhs` (the stored value) with `rhs` (the reference value).
///
/// Records come out in depth-first discovery order: object keys of `lhs`
/// in document order, then keys found only in `rhs`, then array indexes in
/// ascending order. Neither input is modified.
///
/// # Examples
///
/// ```
/// use cursor_settings::{diff, Config, Difference};
/// use serde_json::json;
///
/// let db = json!({ "a": 1, "b": 2 });
/// let file = json!({ "a": 1, "b": 3 });
/// let diffs = diff(&db, &file, &Config::new());
///
/// assert_eq!(diffs.len(), 1);
/// assert!(matches!(diffs[0], Difference::ValueDiff { .. }));
/// assert_eq!(diffs[0].path().to_string(), "b");
/// ```
pub fn diff<'a>(lhs: &'a Value, rhs: &'a Value, config: &Config) -> Vec<Difference<'a>> {
    let mut acc = vec![];
    diff_with(lhs, rhs, config, Path::Root, &mut acc);
    acc
}

fn diff_with<'a>(
    lhs: &'a Value,
    rhs: &'a Value,
    config: &Config,
    path: Path<'a>,
    acc: &mut Vec<Difference<'a>>,
) {
    if config.to_ignore(&path) {
        return;
    }

    let mut folder = DiffFolder {
        rhs,
        path,
        acc,
        config,
    };

    fold_json(lhs, &mut folder);
}

#[derive(Debug)]
struct DiffFolder<'a, 'b> {
    rhs: &'a Value,
    path: Path<'a>,
    acc: &'b mut Vec<Difference<'a>>,
    config: &'b Config<'b>,
}

macro_rules! direct_compare {
    ($name:ident) => {
        fn $name(&mut self, lhs: &'a Value) {
            if self.rhs != lhs {
                self.on_mismatch(lhs);
            }
        }
    };
}

impl<'a, 'b> DiffFolder<'a, 'b> {
    direct_compare!(on_null);
    direct_compare!(on_bool);
    direct_compare!(on_string);

    fn on_number(&mut self, lhs: &'a Value) {
        if !self.rhs.is_number() || canonical(self.rhs) != canonical(lhs) {
            self.on_mismatch(lhs);
        }
    }

    fn on_array(&mut self, lhs: &'a Value, items: &'a [Value]) {
        let Some(rhs) = self.rhs.as_array() else {
            return self.on_mismatch(lhs);
        };

        let (lhs, rhs) = if self.config.is_unordered(&self.path) {
            (sorted(items), sorted(rhs))
        } else {
            (items.iter().collect(), rhs.iter().collect())
        };

        for idx in 0..lhs.len().max(rhs.len()) {
            let path = self.path.append(Key::Idx(idx));

            match (lhs.get(idx).copied(), rhs.get(idx).copied()) {
                (Some(lhs), Some(rhs)) => diff_with(lhs, rhs, self.config, path, self.acc),
                (Some(lhs), None) => self.on_only_in_lhs(path, lhs),
                (None, Some(rhs)) => self.on_only_in_rhs(path, rhs),
                (None, None) => unreachable!("index is below the longer length"),
            }
        }
    }

    fn on_object(&mut self, lhs: &'a Value, fields: &'a Map<String, Value>) {
        let Some(rhs) = self.rhs.as_object() else {
            return self.on_mismatch(lhs);
        };

        for (key, lhs) in fields {
            let path = self.path.append(Key::Field(key));

            match rhs.get(key) {
                Some(rhs) => diff_with(lhs, rhs, self.config, path, self.acc),
                None => self.on_only_in_lhs(path, lhs),
            }
        }

        for (key, rhs) in rhs {
            if !fields.contains_key(key) {
                let path = self.path.append(Key::Field(key));
                self.on_only_in_rhs(path, rhs);
            }
        }
    }

    fn on_mismatch(&mut self, lhs: &'a Value) {
        let (lhs_kind, rhs_kind) = (kind_name(lhs), kind_name(self.rhs));

        let difference = if lhs_kind != rhs_kind {
            Difference::TypeMismatch {
                path: self.path.clone(),
                left: lhs,
                right: self.rhs,
                left_kind: lhs_kind,
                right_kind: rhs_kind,
            }
        } else {
            Difference::ValueDiff {
                path: self.path.clone(),
                left: lhs,
                right: self.rhs,
            }
        };

        self.acc.push(difference);
    }

    fn on_only_in_lhs(&mut self, path: Path<'a>, value: &'a Value) {
        if !self.config.to_ignore(&path) {
            self.acc.push(Difference::OnlyInLeft { path, value });
        }
    }

    fn on_only_in_rhs(&mut self, path: Path<'a>, value: &'a Value) {
        if !self.config.to_ignore(&path) {
            self.acc.push(Difference::OnlyInRight { path, value });
        }
    }
}

fn sorted(items: &[Value]) -> Vec<&Value> {
    let mut items = items.iter().collect::<Vec<_>>();
    items.sort_by_cached_key(|item| canonical(item));
    items
}

/// A single difference between the stored value (left, "db") and the
/// reference value (right, "file").
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Difference<'a> {
    /// Both sides hold values of different kinds.
    TypeMismatch {
        path: Path<'a>,
        #[serde(rename = "db")]
        left: &'a Value,
        #[serde(rename = "file")]
        right: &'a Value,
        #[serde(rename = "dbType")]
        left_kind: &'static str,
        #[serde(rename = "fileType")]
        right_kind: &'static str,
    },
    /// Both sides hold different values of the same kind.
    ValueDiff {
        path: Path<'a>,
        #[serde(rename = "db")]
        left: &'a Value,
        #[serde(rename = "file")]
        right: &'a Value,
    },
    /// The path exists only in the stored value.
    OnlyInLeft {
        path: Path<'a>,
        value: &'a Value,
    },
    /// The path exists only in the reference value.
    OnlyInRight {
        path: Path<'a>,
        value: &'a Value,
    },
}

impl<'a> Difference<'a> {
    pub fn path(&self) -> &Path<'a> {
        match self {
            Difference::TypeMismatch { path, .. }
            | Difference::ValueDiff { path, .. }
            | Difference::OnlyInLeft { path, .. }
            | Difference::OnlyInRight { path, .. } => path,
        }
    }
}

impl<'a> fmt::Display for Difference<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let path = self.path().label();

        match self {
            Difference::TypeMismatch {
                left,
                right,
                left_kind,
                right_kind,
                ..
            } => {
                writeln!(
                    f,
                    "json atoms at path \"{}\" have different types ({} vs {}):",
                    path, left_kind, right_kind
                )?;
                writeln!(f, "    db:")?;
                writeln!(f, "{}", pretty(left).indent(8))?;
                writeln!(f, "    file:")?;
                write!(f, "{}", pretty(right).indent(8))?;
            }
            Difference::ValueDiff { left, right, .. } => {
                writeln!(f, "json atoms at path \"{}\" are not equal:", path)?;
                writeln!(f, "    db:")?;
                writeln!(f, "{}", pretty(left).indent(8))?;
                writeln!(f, "    file:")?;
                write!(f, "{}", pretty(right).indent(8))?;
            }
            Difference::OnlyInLeft { .. } => {
                write!(f, "json atom at path \"{}\" is missing from file", path)?;
            }
            Difference::OnlyInRight { .. } => {
                write!(f, "json atom at path \"{}\" is missing from db", path)?;
            }
        }

        Ok(())
    }
}

fn fold_json<'a>(json: &'a Value, folder: &mut DiffFolder<'a, '_>) {
    match json {
        Value::Null => folder.on_null(json),
        Value::Bool(_) => folder.on_bool(json),
        Value::Number(_) => folder.on_number(json),
        Value::String(_) => folder.on_string(json),
        Value::Array(items) => folder.on_array(json, items),
        Value::Object(fields) => folder.on_object(json, fields),
    }
}
