use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pdbx_ingest::app::{App, IngestOptions};
use pdbx_ingest::db::AtomSiteStore;
use pdbx_ingest::domain::StructureId;
use pdbx_ingest::error::IngestError;
use pdbx_ingest::files::FileStore;
use pdbx_ingest::output::JsonOutput;
use pdbx_ingest::rcsb::RcsbHttpClient;

const DEFAULT_STRUCTURE: &str = "5e2v";

#[derive(Parser)]
#[command(name = "pdbx-ingest")]
#[command(about = "Ingest RCSB PDBx/XML atom_site records into a local SQLite store")]
#[command(version, author)]
struct Cli {
    /// Structure id to ingest (e.g. 5e2v); prompted for when omitted
    structure: Option<String>,

    /// Path to the SQLite database
    #[arg(long, default_value = "atomsites.db")]
    db: Utf8PathBuf,

    /// Override the structure cache directory
    #[arg(long)]
    cache_dir: Option<Utf8PathBuf>,

    /// Re-download even when a cached structure file exists
    #[arg(long)]
    force: bool,

    /// Fail instead of prompting when no structure id is given
    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<IngestError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &IngestError) -> u8 {
    match error {
        IngestError::InvalidStructureId(_) => 2,
        IngestError::Http(_) | IngestError::Fetch { .. } | IngestError::FetchStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let id = resolve_structure_id(cli.structure.as_deref(), cli.non_interactive)?;

    let files = match cli.cache_dir {
        Some(root) => FileStore::new_with_root(root),
        None => FileStore::new()?,
    };
    let rcsb = RcsbHttpClient::new()?;
    let app = App::new(files, rcsb);
    let mut store = AtomSiteStore::open(&cli.db)?;

    let options = IngestOptions { force: cli.force };
    let report = app.ingest(&id, &mut store, &options)?;
    JsonOutput::print_report(&report).into_diagnostic()?;
    Ok(())
}

/// Resolves the structure id from the argument, an interactive prompt, or
/// the default. Only this adapter ever touches stdin.
fn resolve_structure_id(arg: Option<&str>, non_interactive: bool) -> miette::Result<StructureId> {
    let raw = match arg {
        Some(value) => value.to_string(),
        None if non_interactive => {
            return Err(miette::Report::msg(
                "structure id required with --non-interactive",
            ));
        }
        None => prompt_structure_id().into_diagnostic()?,
    };
    let raw = if raw.trim().is_empty() {
        DEFAULT_STRUCTURE.to_string()
    } else {
        raw
    };
    Ok(raw.parse::<StructureId>()?)
}

fn prompt_structure_id() -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "Structure name (ex: 5E2V): ")?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
