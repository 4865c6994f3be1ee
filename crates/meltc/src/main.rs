//! The Melt compiler CLI.
//!
//! Provides the `meltc` command with the following subcommands:
//!
//! - `meltc check <file>` - Parse and type-check a Melt source file
//! - `meltc build <file>` - Check, monomorphize and write the typed module
//!   as JSON for code generation
//!
//! Options:
//! - `--output` - Output path for the typed module (default `<file>.out`)
//! - `--json` - Output diagnostics as JSON (one object per line)
//! - `--no-color` - Disable colorized output
//!
//! Logging is controlled by `MELT_LOG` (an `EnvFilter` directive, default
//! `warn`) and goes to stderr.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use melt_typeck::diagnostics::DiagnosticOptions;

#[derive(Parser)]
#[command(name = "meltc", version, about = "The Melt compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and type-check a Melt source file
    Check {
        /// Path to the source file
        file: PathBuf,

        /// Output diagnostics as JSON (one object per line) instead of human-readable format
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,
    },
    /// Check a Melt source file and write the monomorphized module as JSON
    Build {
        /// Path to the source file
        file: PathBuf,

        /// Output path for the typed module
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output diagnostics as JSON (one object per line) instead of human-readable format
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let (result, json) = match cli.command {
        Commands::Check {
            file,
            json,
            no_color,
        } => (check(&file, &diagnostic_options(json, no_color)).map(|_| ()), json),
        Commands::Build {
            file,
            output,
            json,
            no_color,
        } => (
            build(&file, output.as_deref(), &diagnostic_options(json, no_color)),
            json,
        ),
    };

    if let Err(e) = result {
        if json {
            // In JSON mode, emit the final error as JSON too.
            let msg = serde_json::json!({
                "code": "C0001",
                "severity": "error",
                "message": e,
                "file": "",
                "spans": [],
            });
            eprintln!("{}", msg);
        } else {
            eprintln!("error: {}", e);
        }
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MELT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn diagnostic_options(json: bool, no_color: bool) -> DiagnosticOptions {
    DiagnosticOptions {
        color: !no_color && !json,
        json,
    }
}

/// Parse and type-check one file, reporting every diagnostic.
fn check(file: &Path, diag_opts: &DiagnosticOptions) -> Result<melt_typeck::hir::Module, String> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
    info!(file = %file.display(), bytes = source.len(), "checking");

    let parse = melt_parser::parse(&source);
    let typeck = melt_typeck::check(&parse);

    let has_errors = report_diagnostics(&source, file, &parse, &typeck, diag_opts);
    if has_errors {
        return Err("Compilation failed due to errors above.".to_string());
    }
    typeck
        .module
        .ok_or_else(|| "Type checking produced no module.".to_string())
}

/// Execute the build pipeline: read -> parse -> typecheck -> monomorphize -> write.
fn build(
    file: &Path,
    output: Option<&Path>,
    diag_opts: &DiagnosticOptions,
) -> Result<(), String> {
    let module = check(file, diag_opts)?;
    debug!(
        functions = module.functions.len(),
        records = module.record_instances.len(),
        "monomorphized module"
    );

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => default_output(file),
    };
    let json = serde_json::to_string_pretty(&module)
        .map_err(|e| format!("Failed to serialize the typed module: {}", e))?;
    std::fs::write(&output_path, json)
        .map_err(|e| format!("Failed to write '{}': {}", output_path.display(), e))?;

    eprintln!("  Compiled: {}", output_path.display());
    Ok(())
}

/// `<file>.out` next to the source.
fn default_output(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".out");
    PathBuf::from(name)
}

/// Report parse and type-check diagnostics.
///
/// When `diag_opts.json` is true, outputs one JSON object per line to stderr.
/// Otherwise, outputs colorized (or colorless) human-readable diagnostics.
/// Returns true if there are any errors.
fn report_diagnostics(
    source: &str,
    path: &Path,
    parse: &melt_parser::Parse,
    typeck: &melt_typeck::TypeckResult,
    diag_opts: &DiagnosticOptions,
) -> bool {
    let file_name = path.display().to_string();
    let mut has_errors = false;

    for error in parse.errors() {
        has_errors = true;
        let start = error.span.start as usize;
        let end = (error.span.end as usize).max(start + 1);
        if diag_opts.json {
            let json_diag = serde_json::json!({
                "code": "P0001",
                "severity": "error",
                "message": format!("Parse error: {}", error.message),
                "file": file_name,
                "spans": [{
                    "start": start,
                    "end": end,
                    "label": error.message
                }],
            });
            eprintln!("{}", json_diag);
        } else {
            use ariadne::{Config, Label, Report, ReportKind, Source};
            let config = Config::default().with_color(diag_opts.color);
            let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, start..end)
                .with_code("P0001")
                .with_message("Parse error")
                .with_config(config)
                .with_label(Label::new(start..end).with_message(&error.message))
                .finish()
                .eprint(Source::from(source));
        }
    }

    for rendered in typeck.render_errors(source, &file_name, diag_opts) {
        has_errors = true;
        if diag_opts.json {
            eprintln!("{}", rendered);
        } else {
            eprint!("{}", rendered);
        }
    }

    has_errors
}
