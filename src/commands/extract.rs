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

use std::fmt::Display;
use std::path::PathBuf;

use super::{with_newline, write_output, Target};
use crate::error::Result;
use crate::{parse_json_strict, to_pretty_json};

/// How `extract` prints the stored value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// The stored text as-is, without parsing it.
    Raw,
    /// Single-line JSON.
    Compact,
    /// Two-space indented JSON.
    #[default]
    Pretty,
}

impl Display for JsonStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonStyle::Raw => write!(f, "raw"),
            JsonStyle::Compact => write!(f, "compact"),
            JsonStyle::Pretty => write!(f, "pretty"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub target: Target,
    /// Output file; `None` or `-` prints to stdout.
    pub out: Option<PathBuf>,
    pub style: JsonStyle,
}

pub async fn run(opts: &ExtractOptions) -> Result<()> {
    let store = opts.target.open().await?;
    let raw = store.fetch_required(&opts.target.key).await?;
    let printable = format_value(&raw, opts.style)?;

    match opts.out.as_ref().filter(|out| out.as_os_str() != "-") {
        Some(out) => {
            write_output(out, &printable).await?;
            println!("Wrote {} JSON to: {}", opts.style, out.display());
        }
        None => print!("{}", with_newline(&printable)),
    }

    Ok(())
}

/// Renders the stored text in `style`; anything but [`JsonStyle::Raw`]
/// requires valid JSON.
pub fn format_value(raw: &str, style: JsonStyle) -> Result<String> {
    match style {
        JsonStyle::Raw => Ok(raw.to_string()),
        JsonStyle::Compact => Ok(parse_json_strict(raw)?.to_string()),
        JsonStyle::Pretty => Ok(to_pretty_json(&parse_json_strict(raw)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_format_value() {
        let raw = r#"{ "b": 1,  "a": [true, null] }"#;

        assert_eq!(format_value(raw, JsonStyle::Raw).unwrap(), raw);
        assert_eq!(
            format_value(raw, JsonStyle::Compact).unwrap(),
            r#"{"b":1,"a":[true,null]}"#
        );
        assert_eq!(
            format_value(raw, JsonStyle::Pretty).unwrap(),
            "{\n  \"b\": 1,\n  \"a\": [\n    true,\n    null\n  ]\n}"
        );
    }

    #[test]
    fn test_format_value_malformed() {
        assert_eq!(format_value("not json", JsonStyle::Raw).unwrap(), "not json");
        assert!(matches!(
            format_value("not json", JsonStyle::Pretty),
            Err(Error::MalformedJson { len: 8, .. })
        ));
    }
}
