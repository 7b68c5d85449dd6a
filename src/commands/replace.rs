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
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use super::{read_input, required, Target};
use crate::backup::{Backups, DEFAULT_BACKUP_DIR};
use crate::error::{Error, Result};
use crate::json_diff::{diff, Config};
use crate::{parse_json_strict, to_pretty_json};

const GRACE_PERIOD: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Default)]
pub struct ReplaceOptions {
    pub target: Target,
    /// New JSON value, `-` for standard input.
    pub file: Option<String>,
    pub backup_dir: Option<PathBuf>,
    /// Also copy the whole database file before writing.
    pub backup_db: bool,
    pub dry_run: bool,
    /// Skip the grace period before writing.
    pub yes: bool,
}

/// What `replace` did, with the backup of the previous value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    DryRun { backup: PathBuf },
    Verified { backup: PathBuf },
}

/// Backs up the current value, writes the new one and reads it back.
///
/// Nothing is written unless the new value parses and the current record
/// exists and has been backed up.
pub async fn run(opts: &ReplaceOptions) -> Result<Replacement> {
    let file = required(&opts.file, "--file <path|->")?;
    let key = opts.target.key.as_str();
    let store = opts.target.open().await?;

    if let Err(err) = store.probe_writable().await {
        warn!("{}", err);
    }

    let new_value = parse_json_strict(&read_input(file).await?)?;
    let current_raw = store.fetch_required(key).await?;

    let backups = Backups::new(
        opts.backup_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR)),
    );
    let backup = backups.save_value(key, &current_raw).await?;
    println!("JSON backup written: {}", backup.display());

    if opts.backup_db {
        let copied = backups.save_store(store.path()).await?;
        println!("DB backup written: {}", copied.display());
    }

    log_changes(&current_raw, &new_value);

    if opts.dry_run {
        println!("Dry run: would replace value for key: {}", key);
        println!("New JSON preview:");
        println!("{}", to_pretty_json(&new_value));
        return Ok(Replacement::DryRun { backup });
    }

    if !opts.yes {
        println!(
            "About to write new JSON into the DB. If Cursor is open, close it now. Proceeding in {} seconds...",
            GRACE_PERIOD.as_secs()
        );
        tokio::time::sleep(GRACE_PERIOD).await;
    }

    store.write_value(key, &new_value.to_string()).await?;

    let after = store.fetch_value(key).await?;
    if !verify(after.as_deref(), &new_value) {
        return Err(Error::VerificationFailed { backup });
    }

    println!("Replacement successful and verified.");
    Ok(Replacement::Verified { backup })
}

/// Checks that the read-back text holds exactly `expected`.
pub fn verify(after: Option<&str>, expected: &Value) -> bool {
    match after.map(parse_json_strict) {
        Some(Ok(actual)) => actual.to_string() == expected.to_string(),
        _ => false,
    }
}

fn log_changes(current_raw: &str, new_value: &Value) {
    let current = match parse_json_strict(current_raw) {
        Ok(current) => current,
        Err(err) => {
            warn!("current value can't be compared: {}", err);
            return;
        }
    };

    let diffs = diff(&current, new_value, &Config::new());
    println!("{} difference(s) against the current value", diffs.len());
    for d in diffs.iter() {
        info!("{}", d);
    }
}
