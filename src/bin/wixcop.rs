//! Command-line front end: inspects installer sources and optionally fixes
//! them in place.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use wixcop::batch::Runner;
use wixcop::format::DEFAULT_INDENT;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// wixcop -- migrate installer sources to the current schema and enforce
/// canonical formatting.
#[derive(Parser, Debug)]
#[command(name = "wixcop", version, about, long_about = None)]
struct Cli {
    /// Files, directories or globs (e.g. `*.wxs`) to inspect.
    #[arg(required = true)]
    patterns: Vec<String>,

    /// Write fixes back to the files.
    #[arg(short, long)]
    fix: bool,

    /// Search directories recursively.
    #[arg(short, long)]
    recurse: bool,

    /// Spaces per nesting level.
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_INDENT)]
    indent: usize,

    /// Settings file; may be given twice, later files add to earlier ones.
    #[arg(short, long = "settings", value_name = "FILE")]
    settings: Vec<PathBuf>,

    /// Log progress (`RUST_LOG` overrides).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let runner = Runner {
        fix_errors: cli.fix,
        indentation_amount: cli.indent,
        recurse: cli.recurse,
        settings_files: cli.settings,
        patterns: cli.patterns,
        ..Runner::default()
    };
    let result = runner.execute();

    for file in &result.files {
        for diagnostic in &file.diagnostics {
            eprintln!("{diagnostic}");
        }
    }
    for error in &result.errors {
        eprintln!("error: {error}");
    }

    let written = result.files.iter().filter(|f| f.written).count();
    log::info!(
        "{} file(s), {} diagnostic(s), {} error(s), {written} rewritten",
        result.files.len(),
        result.diagnostic_count(),
        result.errors.len()
    );

    ExitCode::from(u8::try_from(result.exit_code).unwrap_or(1))
}
