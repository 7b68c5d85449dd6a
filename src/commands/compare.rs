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

use tracing::info;

use super::{read_input, required, with_newline, write_output, Target};
use crate::error::Result;
use crate::json_diff::path::Path;
use crate::json_diff::{diff, Config};
use crate::parse_json_strict;
use crate::report::{render, Format, ReportContext};

#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub target: Target,
    /// Reference JSON file, `-` for standard input.
    pub file: Option<String>,
    pub out: Option<PathBuf>,
    pub format: Format,
    pub ignore: Vec<String>,
    pub unordered: Vec<String>,
}

/// Result of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub report: String,
    pub diff_count: usize,
}

/// Diffs the stored value against the reference file and prints or writes
/// the report.
pub async fn run(opts: &CompareOptions) -> Result<Comparison> {
    let file = required(&opts.file, "--file <path|->")?;
    let config = build_config(&opts.ignore, &opts.unordered)?;

    let store = opts.target.open().await?;
    let db_raw = store.fetch_required(&opts.target.key).await?;
    let file_raw = read_input(file).await?;

    let db_path = opts.target.db.display().to_string();
    let context = ReportContext {
        db_path: &db_path,
        key: &opts.target.key,
        file,
    };
    let comparison = compare_values(&db_raw, &file_raw, &config, opts.format, &context)?;
    info!(diffs = comparison.diff_count, "comparison finished");

    match &opts.out {
        Some(out) => {
            write_output(out, &comparison.report).await?;
            println!("Wrote report to {}", out.display());
        }
        None => print!("{}", with_newline(&comparison.report)),
    }

    Ok(comparison)
}

/// Parses both documents, diffs them and renders the report.
pub fn compare_values(
    db_raw: &str,
    file_raw: &str,
    config: &Config,
    format: Format,
    context: &ReportContext,
) -> Result<Comparison> {
    let db = parse_json_strict(db_raw)?;
    let file = parse_json_strict(file_raw)?;

    let diffs = diff(&db, &file, config);

    Ok(Comparison {
        report: render(&diffs, format, context),
        diff_count: diffs.len(),
    })
}

/// Builds a [`Config`] from rule strings, skipping empty ones.
pub fn build_config<'a>(ignore: &'a [String], unordered: &'a [String]) -> Result<Config<'a>> {
    let mut config = Config::new();

    for rule in ignore.iter().filter(|rule| !rule.is_empty()) {
        config = config.ignore_path(Path::parse(rule)?);
    }
    for rule in unordered.iter().filter(|rule| !rule.is_empty()) {
        config = config.unordered_path(Path::parse(rule)?);
    }

    Ok(config)
}
