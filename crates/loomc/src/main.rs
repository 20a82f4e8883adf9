//! The Loom compiler CLI.
//!
//! Subcommands:
//!
//! - `loomc build <dir>` - compile every `.loom` file under a project
//!   directory into a generated Python package
//! - `loomc check <dir>` - validate and print the emission order without
//!   writing anything (`--json` for the machine-readable manifest)
//!
//! Exit codes follow the compiler's status contract: 0 success, 1 domain
//! error (syntax, duplicate, undefined, circular), 2 internal error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use loom_common::error::Error;

#[derive(Parser)]
#[command(name = "loomc", version, about = "The Loom compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Loom project into a generated Python package
    Build {
        /// Path to the project directory (searched recursively for .loom files)
        dir: PathBuf,

        /// Output directory for the generated package
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Validate a project and print the emission order
    Check {
        /// Path to the project directory
        dir: PathBuf,

        /// Print the order and transitive dependencies as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Build { dir, out } => build(&dir, out.as_deref()),
        Commands::Check { dir, json } => check(&dir, json),
    };
    process::exit(code);
}

fn build(dir: &Path, out: Option<&Path>) -> i32 {
    let sources = match loomc::discovery::load_sources(dir) {
        Ok(sources) => sources,
        Err(message) => {
            eprintln!("error: {message}");
            return 2;
        }
    };
    let out_dir = match out {
        Some(path) => path.to_path_buf(),
        None => dir.join("generated"),
    };

    match loomc::compile(&out_dir, &sources) {
        Ok(()) => {
            eprintln!("  Generated: {}", out_dir.display());
            0
        }
        Err(loomc::CompileError::Domain(e)) => {
            report_error(&e, &sources);
            1
        }
        Err(loomc::CompileError::Io(e)) => {
            eprintln!("error: {e}");
            2
        }
    }
}

fn check(dir: &Path, json: bool) -> i32 {
    let sources = match loomc::discovery::load_sources(dir) {
        Ok(sources) => sources,
        Err(message) => {
            eprintln!("error: {message}");
            return 2;
        }
    };

    match loomc::analyze(&sources) {
        Ok((unit, resolution)) => {
            let manifest = loomc::manifest(&unit, &resolution);
            if json {
                match serde_json::to_string_pretty(&manifest) {
                    Ok(rendered) => println!("{rendered}"),
                    Err(e) => {
                        eprintln!("error: {e}");
                        return 2;
                    }
                }
            } else {
                for entry in &manifest {
                    println!("{} {}", entry.kind, entry.name);
                }
            }
            0
        }
        Err(e) => {
            report_error(&e, &sources);
            1
        }
    }
}

/// Print the plain editor-parseable error line, then an ariadne report
/// when the offending source is available.
fn report_error(error: &Error, sources: &BTreeMap<String, String>) {
    eprintln!("{error}");

    let loc = error.loc();
    let Some(source) = sources.get(loc.file.as_ref()) else {
        return;
    };
    let offset = byte_offset(source, loc.line, loc.column).min(source.len());
    let end = (offset + 1).min(source.len()).max(offset);

    use ariadne::{Label, Report, ReportKind, Source};
    let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, offset..end)
        .with_message(format!("{} error", error.kind_name()))
        .with_label(Label::new(offset..end).with_message(error.message()))
        .finish()
        .eprint(Source::from(source.as_str()));
}

/// Convert a 1-based line/column pair to a byte offset.
fn byte_offset(source: &str, line: u32, column: u32) -> usize {
    let mut offset = 0usize;
    for (idx, text) in source.lines().enumerate() {
        if idx as u32 + 1 == line {
            return offset + (column as usize - 1).min(text.len());
        }
        offset += text.len() + 1;
    }
    source.len()
}
