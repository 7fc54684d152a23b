use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use dwarf_query::config::{load_config, validate_config, Config};
use dwarf_query::{Address, AnalysisSession, SnapshotMemory};

#[derive(Parser, Debug)]
#[command(name = "dwarf-query")]
#[command(about = "Inspect DWARF-derived type layouts and decode guest memory with them")]
#[command(version)]
struct Args {
    /// Type metadata JSON (overrides [metadata].path in dwarf-query.toml)
    #[arg(short, long)]
    types: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Print every loaded struct, or one struct by name
    Dump { name: Option<String> },
    /// Decode each member of a struct from hex bytes captured at an address
    Read {
        type_name: String,
        address: Address,
        bytes: String,
    },
    /// Name the function containing an address
    Symbol { address: Address },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));

    let file = config
        .logging
        .file
        .as_ref()
        .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok());
    let writer = match file {
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config()?;
    if let Some(path) = args.types {
        config.metadata.path = path;
    }
    validate_config(&config)?;
    init_logging(&config);

    info!("Starting dwarf-query v{}", env!("CARGO_PKG_VERSION"));

    let (session, report) = AnalysisSession::from_config(&config)
        .with_context(|| format!("failed to load {}", config.metadata.path))?;
    if !report.is_clean() {
        warn!(skipped = report.skipped.len(), "metadata loaded with skipped records");
    }

    match args.command.unwrap_or(Commands::Dump { name: None }) {
        Commands::Dump { name: None } => {
            let registry = session.registry();
            for name in registry.type_names() {
                if let Some(st) = registry.lookup_type(name) {
                    print!("{}", st);
                }
            }
            println!(
                "{} types, {} functions, {} invalid members, {} skipped records",
                report.structs_loaded,
                report.functions_loaded,
                report.invalid_members,
                report.skipped.len()
            );
        }
        Commands::Dump { name: Some(name) } => {
            print!("{}", session.structure(&name)?);
        }
        Commands::Read {
            type_name,
            address,
            bytes,
        } => {
            let mut memory = SnapshotMemory::new(config.reader.architecture);
            memory.map_hex(address, &bytes)?;
            for (member, result) in session.read_struct(&memory, address, &type_name)? {
                match result {
                    Ok(value) => println!("{} = {}", member, value),
                    Err(err) => println!("{}: {}", member, err),
                }
            }
        }
        Commands::Symbol { address } => match session.symbolicate(address) {
            Some(name) => println!("{} {}", address, name),
            None => println!("{} ?", address),
        },
    }

    info!("Shutting down dwarf-query");
    Ok(())
}
