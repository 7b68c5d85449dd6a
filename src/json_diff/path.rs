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

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{Error, Result};

/// Location inside a JSON document, e.g. `a.b[2].c`.
///
/// Paths found by the differ only contain [`Key::Field`] and [`Key::Idx`];
/// paths parsed from rules may also contain wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path<'a> {
    Root,
    Keys(Vec<Key<'a>>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key<'a> {
    Idx(usize),
    /// `*`, any object key
    Wildcard,
    /// `[*]`, any array index
    WildcardArray,
    Field(&'a str),
}

lazy_static! {
    static ref RULE_RE: Regex =
        Regex::new(r"^(?:[^.\[\]]+|\[(?:\d+|\*)\])(?:\.[^.\[\]]+|\[(?:\d+|\*)\])*$").unwrap();
}

// FromStr can't hand out a path borrowing from the input, hence the trait.
pub trait ParsePath {
    fn parse_path(&self) -> Result<Path>;
}

impl ParsePath for str {
    fn parse_path(&self) -> Result<Path> {
        Path::parse(self)
    }
}

impl<'a> Path<'a> {
    pub(crate) fn append(&self, next: Key<'a>) -> Path<'a> {
        match self {
            Path::Root => Path::Keys(vec![next]),
            Path::Keys(list) => {
                let mut copy = list.clone();
                copy.push(next);
                Path::Keys(copy)
            }
        }
    }

    pub fn is_root(&self) -> bool {
        match self {
            Path::Root => true,
            Path::Keys(keys) => keys.is_empty(),
        }
    }

    /// Display form for reports, where the empty root path needs a marker.
    pub fn label(&self) -> String {
        if self.is_root() {
            "(root)".to_string()
        } else {
            self.to_string()
        }
    }

    fn keys(&self) -> &[Key<'a>] {
        match self {
            Path::Root => &[],
            Path::Keys(keys) => keys,
        }
    }

    /// Checks whether `self` equals `other` or is one of its ancestors.
    pub(crate) fn prefixes(&self, other: &Path) -> bool {
        let (rule, concrete) = (self.keys(), other.keys());
        if rule.len() > concrete.len() {
            return false;
        }

        rule.iter()
            .zip(concrete.iter())
            .all(|(rule, concrete)| rule.covers(concrete))
    }

    /// Checks whether `self` designates exactly `other`.
    pub(crate) fn matches(&self, other: &Path) -> bool {
        self.keys().len() == other.keys().len() && self.prefixes(other)
    }

    /// Parses a rule such as `a.b[2].c`, `servers[*].name` or `$.a.*`.
    ///
    /// A leading `$` is accepted and a bare `$` is the root.
    pub fn parse(rule: &'a str) -> Result<Self> {
        let invalid = || Error::InvalidPath(rule.to_string());

        let body = match rule.strip_prefix('$') {
            Some("") => return Ok(Path::Root),
            Some(rest) if rest.starts_with('[') => rest,
            Some(rest) if rest.starts_with('.') => &rest[1..],
            _ => rule,
        };

        if !RULE_RE.is_match(body) {
            return Err(invalid());
        }

        let mut keys = Vec::new();
        for (i, token) in body.split(|c: char| c == '.' || c == '[').enumerate() {
            // a leading `[` leaves an empty first token
            if i == 0 && token.is_empty() {
                continue;
            }
            keys.push(Self::parse_token(token).ok_or_else(invalid)?);
        }

        Ok(Path::Keys(keys))
    }

    fn parse_token(token: &'a str) -> Option<Key<'a>> {
        match token.strip_suffix(']') {
            Some("*") => Some(Key::WildcardArray),
            Some(idx) => idx.parse().ok().map(Key::Idx),
            None if token == "*" => Some(Key::Wildcard),
            None => Some(Key::Field(token)),
        }
    }
}

impl<'a> Key<'a> {
    fn covers(&self, other: &Key) -> bool {
        match (self, other) {
            (Key::Wildcard, Key::Field(_)) => true,
            (Key::WildcardArray, Key::Idx(_)) => true,
            (Key::Field(a), Key::Field(b)) => a == b,
            (Key::Idx(a), Key::Idx(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> fmt::Display for Path<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, key) in self.keys().iter().enumerate() {
            let dot = if i == 0 { "" } else { "." };
            match key {
                Key::Idx(idx) => write!(f, "[{}]", idx)?,
                Key::WildcardArray => write!(f, "[*]")?,
                Key::Field(field) => write!(f, "{}{}", dot, field)?,
                Key::Wildcard => write!(f, "{}*", dot)?,
            }
        }
        Ok(())
    }
}

impl<'a> Serialize for Path<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
