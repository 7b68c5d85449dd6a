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
use std::str::FromStr;

use serde_json::json;

use crate::json_diff::{pretty, Difference};

/// Output format of a comparison report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable Markdown grouped by difference kind.
    #[default]
    Markdown,
    /// Lossless JSON document for programmatic post-processing.
    Json,
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Markdown => write!(f, "md"),
            Format::Json => write!(f, "json"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Ok(Format::Markdown),
            "json" => Ok(Format::Json),
            _ => Err(format!("{} is not a valid report format (md, json)", s)),
        }
    }
}

/// Names the two compared sources in the report header.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub db_path: &'a str,
    pub key: &'a str,
    pub file: &'a str,
}

/// Renders `diffs` in the requested format.
///
/// The output only depends on its inputs, so rendering the same list twice
/// yields identical text.
pub fn render(diffs: &[Difference], format: Format, context: &ReportContext) -> String {
    match format {
        Format::Markdown => render_markdown(diffs, context),
        Format::Json => render_json(diffs, context),
    }
}

fn render_json(diffs: &[Difference], context: &ReportContext) -> String {
    let report = json!({
        "dbPath": context.db_path,
        "key": context.key,
        "file": context.file,
        "diffCount": diffs.len(),
        "diffs": diffs,
    });

    pretty(&report)
}

fn render_markdown(diffs: &[Difference], context: &ReportContext) -> String {
    let mut lines = vec![
        "# Cursor state comparison for key".to_string(),
        String::new(),
        format!("`{}`", context.key),
        String::new(),
        format!("- DB: `{}`", context.db_path),
        format!("- File: `{}`", context.file),
        String::new(),
    ];

    if diffs.is_empty() {
        lines.push("**No differences found.**".to_string());
        return lines.join("\n");
    }

    let groups: [(&str, fn(&Difference) -> bool); 4] = [
        ("## Type mismatches", |d| {
            matches!(d, Difference::TypeMismatch { .. })
        }),
        ("## Value differences", |d| {
            matches!(d, Difference::ValueDiff { .. })
        }),
        ("## Present only in DB", |d| {
            matches!(d, Difference::OnlyInLeft { .. })
        }),
        ("## Present only in file", |d| {
            matches!(d, Difference::OnlyInRight { .. })
        }),
    ];

    for (title, member) in groups {
        let group = diffs.iter().filter(|d| member(d)).collect::<Vec<_>>();
        if group.is_empty() {
            continue;
        }

        lines.push(title.to_string());
        for d in group {
            lines.extend(render_entry(d));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn render_entry(d: &Difference) -> Vec<String> {
    let (heading, payload) = match d {
        Difference::TypeMismatch {
            path,
            left,
            right,
            left_kind,
            right_kind,
        } => (
            format!(
                "- **{}**: DB type `{}` vs File type `{}`",
                path.label(),
                left_kind,
                right_kind
            ),
            json!({ "db": left, "file": right }),
        ),
        Difference::ValueDiff { path, left, right } => (
            format!("- **{}**", path.label()),
            json!({ "db": left, "file": right }),
        ),
        Difference::OnlyInLeft { path, value } | Difference::OnlyInRight { path, value } => {
            (format!("- **{}**", path.label()), (*value).clone())
        }
    };

    vec![
        heading,
        String::new(),
        "```json".to_string(),
        pretty(&payload),
        "```".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::json_diff::{diff, Config};

    const CONTEXT: ReportContext<'static> = ReportContext {
        db_path: "/tmp/state.vscdb",
        key: "some.key",
        file: "reference.json",
    };

    #[test]
    fn test_format_from_str() {
        assert_eq!("md".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("MD".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("markdown".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn test_markdown_no_differences() {
        let value = json!({ "a": [1, 2] });
        let diffs = diff(&value, &value, &Config::new());
        let report = render(&diffs, Format::Markdown, &CONTEXT);

        assert_eq!(
            report,
            "# Cursor state comparison for key\n\n`some.key`\n\n- DB: `/tmp/state.vscdb`\n- File: `reference.json`\n\n**No differences found.**"
        );
        assert!(!report.contains("##"));
    }

    #[test]
    fn test_markdown_groups() {
        let lhs = json!({ "only_db": true, "v": 1, "t": 1 });
        let rhs = json!({ "v": 2, "t": "1", "only_file": [1] });
        let diffs = diff(&lhs, &rhs, &Config::new());
        let report = render(&diffs, Format::Markdown, &CONTEXT);

        let positions = [
            "## Type mismatches",
            "## Value differences",
            "## Present only in DB",
            "## Present only in file",
        ]
        .iter()
        .map(|title| report.find(title).unwrap())
        .collect::<Vec<_>>();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(report.contains("- **t**: DB type `number` vs File type `string`"));
        assert!(report.contains("- **v**\n\n```json\n{\n  \"db\": 1,\n  \"file\": 2\n}\n```"));
        assert!(report.contains("- **only_db**\n\n```json\ntrue\n```"));
        assert!(report.contains("- **only_file**\n\n```json\n[\n  1\n]\n```"));
        assert!(!report.contains("No differences found"));
    }

    #[test]
    fn test_markdown_omits_empty_groups() {
        let lhs = json!({ "a": 1 });
        let rhs = json!({ "a": 2 });
        let diffs = diff(&lhs, &rhs, &Config::new());
        let report = render(&diffs, Format::Markdown, &CONTEXT);

        assert!(report.contains("## Value differences"));
        assert!(!report.contains("## Type mismatches"));
        assert!(!report.contains("## Present only in DB"));
        assert!(!report.contains("## Present only in file"));
    }

    #[test]
    fn test_markdown_root_marker() {
        let lhs = json!([1]);
        let rhs = json!({});
        let diffs = diff(&lhs, &rhs, &Config::new());
        let report = render(&diffs, Format::Markdown, &CONTEXT);

        assert!(report.contains("- **(root)**: DB type `array` vs File type `object`"));
    }

    #[test]
    fn test_json_report() {
        let lhs = json!({ "a": 1, "b": 2, "gone": null });
        let rhs = json!({ "a": 1, "b": 3, "c": "x" });
        let diffs = diff(&lhs, &rhs, &Config::new());
        let report = render(&diffs, Format::Json, &CONTEXT);

        let parsed: Value = serde_json::from_str(&report).unwrap();
        assert_eq!(
            parsed,
            json!({
                "dbPath": "/tmp/state.vscdb",
                "key": "some.key",
                "file": "reference.json",
                "diffCount": 3,
                "diffs": [
                    { "type": "valueDiff", "path": "b", "db": 2, "file": 3 },
                    { "type": "onlyInLeft", "path": "gone", "value": null },
                    { "type": "onlyInRight", "path": "c", "value": "x" },
                ],
            })
        );
    }

    #[test]
    fn test_json_report_type_mismatch() {
        let (lhs, rhs) = (json!(1), json!("1"));
        let diffs = diff(&lhs, &rhs, &Config::new());
        let report = render(&diffs, Format::Json, &CONTEXT);

        let parsed: Value = serde_json::from_str(&report).unwrap();
        assert_eq!(
            parsed["diffs"][0],
            json!({
                "type": "typeMismatch",
                "path": "",
                "db": 1,
                "file": "1",
                "dbType": "number",
                "fileType": "string",
            })
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let lhs: Value = serde_json::from_str(include_str!("../tests/data/db.json")).unwrap();
        let rhs: Value = serde_json::from_str(include_str!("../tests/data/file.json")).unwrap();
        let diffs = diff(&lhs, &rhs, &Config::new());

        for format in [Format::Markdown, Format::Json] {
            assert_eq!(
                render(&diffs, format, &CONTEXT),
                render(&diffs, format, &CONTEXT)
            );
        }
    }
}
