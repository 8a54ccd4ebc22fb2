//! Parse lines against a schema and print the typed records.
//!
//! Usage:
//!   parse_lines --schema feed.schema [FILE ...]
//!   parse_lines --schema feed.json < input.txt
//!
//! Each line is parsed independently. Records go to stdout; rejected lines are reported
//! on stderr as `path:line: error`. Exit code 1 if any line was rejected.
//! Set `RUST_LOG=lineschema=debug` for per-line diagnostics.

use anyhow::Context;
use clap::Parser;
use lineschema::dump::record_to_dump;
use lineschema::Schema;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "parse_lines", about = "Parse tagged, delimited lines against a schema")]
struct Cli {
    /// Schema file (`.json` for the JSON descriptor format, the schema DSL otherwise).
    #[arg(short, long)]
    schema: PathBuf,

    /// Stop at the first rejected line.
    #[arg(long)]
    fail_fast: bool,

    /// Print one `name = value` row per field instead of a compact tuple.
    #[arg(long)]
    dump: bool,

    /// Input files; stdin when none are given.
    inputs: Vec<PathBuf>,
}

#[derive(Default)]
struct Totals {
    parsed: usize,
    rejected: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let schema = Schema::from_path(&cli.schema)
        .with_context(|| format!("loading schema {}", cli.schema.display()))?;
    info!(lines = schema.lines().len(), "schema loaded");

    let mut totals = Totals::default();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.inputs.is_empty() {
        let stdin = io::stdin();
        run(&schema, &cli, "<stdin>", stdin.lock(), &mut out, &mut totals)?;
    } else {
        for path in &cli.inputs {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            let display = path.display().to_string();
            let keep_going = run(&schema, &cli, &display, BufReader::new(file), &mut out, &mut totals)?;
            if !keep_going {
                break;
            }
        }
    }

    info!(parsed = totals.parsed, rejected = totals.rejected, "done");
    if totals.rejected > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Parse every line of `input`. Returns `false` when `--fail-fast` stopped early.
fn run(
    schema: &Schema,
    cli: &Cli,
    name: &str,
    input: impl BufRead,
    out: &mut impl Write,
    totals: &mut Totals,
) -> anyhow::Result<bool> {
    for (i, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", name))?;
        match schema.parse_line(&line) {
            Ok(record) => {
                totals.parsed += 1;
                if cli.dump {
                    // The tag came from a configured line, so the lookup always succeeds.
                    if let Some(shape) = schema.line(&record.tag) {
                        writeln!(out, "{}", record_to_dump(shape, &record))?;
                    }
                } else {
                    writeln!(out, "{}", record)?;
                }
            }
            Err(e) => {
                totals.rejected += 1;
                eprintln!("{}:{}: {}", name, i + 1, e);
                if cli.fail_fast {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}
