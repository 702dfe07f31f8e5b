//! hierpcb CLI
//!
//! Usage:
//!   hierpcb [OPTIONS] <BOARD>
//!
//! Options:
//!   -c, --config <FILE>    Engine configuration (TOML format)
//!   -o, --output <FILE>    Write the result here instead of over BOARD
//!   --state <FILE>         State file (default: BOARD.hierpcb.json)
//!   --defaults             Select the default sheets, ignoring saved choices
//!   --toggle <SHEET>       Flip the selection of a sheet (repeatable)
//!   --anchor <ROOM=REF>    Choose the anchor footprint of a sub-PCB (repeatable)
//!   --list                 Print the sheet hierarchy and exit
//!   -n, --dry-run          Do everything but write nothing
//!   -v, --verbose          Debug logging
//!   -h, --help             Print help

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use hierpcb::{parse_anchor_override, replicate, Config, ReplicateOptions, Severity};

#[derive(Parser, Debug)]
#[command(name = "hierpcb")]
#[command(about = "Replicate sub-PCB layouts across a hierarchical board")]
struct Cli {
    /// Board file (JSON board document)
    board: PathBuf,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output board file (defaults to overwriting BOARD)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// State file holding selection and anchor choices
    #[arg(long)]
    state: Option<PathBuf>,

    /// Select the default sheets, ignoring saved choices
    #[arg(long)]
    defaults: bool,

    /// Flip the selection of a sheet, by identifier or sheet-name path
    #[arg(long, value_name = "SHEET")]
    toggle: Vec<String>,

    /// Choose the anchor footprint of a sub-PCB
    #[arg(long, value_name = "ROOM=REF", value_parser = parse_anchor)]
    anchor: Vec<(String, String)>,

    /// Print the sheet hierarchy and exit
    #[arg(long)]
    list: bool,

    /// Do everything but write nothing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_anchor(value: &str) -> Result<(String, String), String> {
    parse_anchor_override(value).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    debug!(?cli, "parsed arguments");

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let mut options = ReplicateOptions::new()
        .with_config(config)
        .with_defaults(cli.defaults)
        .with_dry_run(cli.dry_run || cli.list)
        .with_skip_synthesis(cli.list);
    options.state_path = cli.state;
    options.output_path = cli.output;
    options.toggles = cli.toggle;
    options.anchors = cli.anchor;

    let report = match replicate(&cli.board, &options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if cli.list {
        println!("{}", report.tree);
        for (_, room) in report.tree.rooms() {
            println!(
                "{}: anchor {}",
                room.path().display(),
                room.anchor_reference().unwrap_or("<none>")
            );
        }
        return;
    }

    for diagnostic in &report.diagnostics {
        println!("{}", diagnostic);
    }
    if let Some(path) = &report.written {
        println!("Wrote {}", path.display());
    }
    if report.diagnostics.worst() == Some(Severity::Error) {
        process::exit(1);
    }
}
