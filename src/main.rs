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

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cursor_settings::commands::compare::{self, CompareOptions};
use cursor_settings::commands::extract::{self, ExtractOptions, JsonStyle};
use cursor_settings::commands::replace::{self, ReplaceOptions};
use cursor_settings::commands::Target;
use cursor_settings::location::{resolve_db_path, DB_ENV};
use cursor_settings::{Error, Format, TARGET_KEY};

#[doc(hidden)]
#[macro_export]
macro_rules! handle_error {
    ($code:expr, $msg:expr, $($arg:tt)*) => {
        eprintln!($msg, $($arg)*);
        std::process::exit($code);
    };

    ($code:expr, $msg:expr) => {
        eprintln!($msg);
        std::process::exit($code);
    };
}

#[doc(hidden)]
struct Code;

impl Code {
    const SUCCESS: i32 = 0;
    const INTERNAL_ERROR: i32 = 1;
    const DIFFERENCES_FOUND: i32 = 2;
    const INVALID_ARGUMENT: i32 = 3;
    const MALFORMED_JSON: i32 = 4;
    const VERIFICATION_FAILED: i32 = 5;

    fn of(err: &Error) -> i32 {
        match err {
            Error::MissingRequiredOption(_) | Error::InvalidPath(_) => Code::INVALID_ARGUMENT,
            Error::MalformedJson { .. } => Code::MALFORMED_JSON,
            Error::VerificationFailed { .. } => Code::VERIFICATION_FAILED,
            _ => Code::INTERNAL_ERROR,
        }
    }
}

#[doc(hidden)]
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to Cursor's state.vscdb, defaults to the platform location
    #[clap(long, global = true, env = DB_ENV)]
    db: Option<PathBuf>,

    /// Key of the record to operate on
    #[clap(long, global = true, default_value = TARGET_KEY)]
    key: String,

    /// Log more details to stderr (-v info, -vv debug)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[doc(hidden)]
#[derive(Debug, Subcommand)]
enum Command {
    /// Print or save the stored JSON value
    Extract(ExtractArgs),
    /// Diff the stored JSON value against a reference file
    Compare(CompareArgs),
    /// Back up the stored JSON value and replace it with a file's content
    Replace(ReplaceArgs),
}

#[doc(hidden)]
#[derive(Debug, Args)]
struct ExtractArgs {
    /// Output file, `-` for stdout
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Print the stored text without parsing it
    #[clap(long, conflicts_with_all = ["compact", "pretty"])]
    raw: bool,

    /// Print single-line JSON
    #[clap(long, conflicts_with = "pretty")]
    compact: bool,

    /// Print indented JSON (default)
    #[clap(long)]
    pretty: bool,
}

impl ExtractArgs {
    fn style(&self) -> JsonStyle {
        if self.raw {
            JsonStyle::Raw
        } else if self.compact {
            JsonStyle::Compact
        } else {
            JsonStyle::Pretty
        }
    }
}

#[doc(hidden)]
#[derive(Debug, Args)]
struct CompareArgs {
    /// Reference JSON file, `-` for stdin
    #[clap(short, long)]
    file: Option<String>,

    /// Write the report to this file instead of stdout
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Report format: md or json
    #[clap(long, default_value_t = Format::Markdown)]
    format: Format,

    /// Path to leave out of the comparison, e.g. `composer.lastOpened` (repeatable)
    #[clap(long)]
    ignore: Vec<String>,

    /// Array path compared without regard to order, e.g. `items[*].tags` (repeatable)
    #[clap(long)]
    unordered: Vec<String>,

    /// Exit with code 2 when differences are found
    #[clap(long, alias = "fail")]
    fail_on_diff: bool,
}

#[doc(hidden)]
#[derive(Debug, Args)]
struct ReplaceArgs {
    /// JSON file holding the new value, `-` for stdin
    #[clap(short, long)]
    file: Option<String>,

    /// Directory for backups
    #[clap(long)]
    backup_dir: Option<PathBuf>,

    /// Also copy the whole database file before writing
    #[clap(long)]
    backup_db: bool,

    /// Show what would change without writing
    #[clap(long)]
    dry_run: bool,

    /// Write without the grace period
    #[clap(short, long)]
    yes: bool,
}

#[doc(hidden)]
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[doc(hidden)]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let target = Target {
        db: resolve_db_path(cli.db.as_deref()),
        key: cli.key,
    };

    let result = match cli.command {
        Command::Extract(args) => {
            let opts = ExtractOptions {
                target,
                out: args.out.clone(),
                style: args.style(),
            };
            extract::run(&opts).await.map(|_| Code::SUCCESS)
        }
        Command::Compare(args) => {
            let opts = CompareOptions {
                target,
                file: args.file,
                out: args.out,
                format: args.format,
                ignore: args.ignore,
                unordered: args.unordered,
            };
            compare::run(&opts).await.map(|comparison| {
                if args.fail_on_diff && comparison.diff_count > 0 {
                    Code::DIFFERENCES_FOUND
                } else {
                    Code::SUCCESS
                }
            })
        }
        Command::Replace(args) => {
            let opts = ReplaceOptions {
                target,
                file: args.file,
                backup_dir: args.backup_dir,
                backup_db: args.backup_db,
                dry_run: args.dry_run,
                yes: args.yes,
            };
            replace::run(&opts).await.map(|_| Code::SUCCESS)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            handle_error!(Code::of(&err), "Error: {}", err);
        }
    }
}
