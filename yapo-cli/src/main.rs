//! Yapo CLI: symbol lookup and value series commands.
//!
//! Commands:
//! - `info`: resolve comma-separated identifiers and print their metadata as JSON
//! - `values`: load the value series of one identifier, optionally windowed
//! - `list`: list registered identifiers, optionally for one namespace

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yapo_core::{Library, MonthPeriod, Resolution, Settings, SymbolId, ValueWindow};

#[derive(Parser)]
#[command(name = "yapo", about = "Yapo CLI, financial symbol registry")]
struct Cli {
    /// Path to a TOML settings file. Defaults to the built-in catalogue.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print metadata for one or more identifiers (e.g. "micex/SBER, cbr/USD").
    Info {
        ids: String,
    },
    /// Print the value series of one identifier.
    Values {
        id: String,

        /// First month to include (YYYY-MM). Requires --end.
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Last month to include (YYYY-MM). Requires --start.
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
    /// List registered identifiers.
    List {
        /// Only this namespace.
        #[arg(long)]
        namespace: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config)?;
    let library = Library::connect(&settings).context("failed to connect sources")?;

    match cli.command {
        Commands::Info { ids } => run_info(&library, &ids),
        Commands::Values { id, start, end } => run_values(&library, &id, start, end),
        Commands::List { namespace } => run_list(&library, namespace.as_deref()),
    }
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::from_file(&path)?,
        None => Settings::default(),
    };
    Ok(settings.with_env())
}

fn run_info(library: &Library, ids: &str) -> Result<()> {
    let json = match library.info(ids)? {
        Resolution::Single(symbol) => serde_json::to_string_pretty(&symbol)?,
        Resolution::Many(symbols) => serde_json::to_string_pretty(&symbols)?,
    };
    println!("{json}");
    Ok(())
}

fn run_values(
    library: &Library,
    id: &str,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let id: SymbolId = id.parse()?;
    let window = match (start, end) {
        (Some(start), Some(end)) => {
            Some(ValueWindow::new(parse_month(&start)?, parse_month(&end)?))
        }
        _ => None,
    };

    let frame = library
        .values(&id, window)
        .with_context(|| format!("failed to load values for {id}"))?;
    println!("{frame}");
    Ok(())
}

fn parse_month(s: &str) -> Result<MonthPeriod> {
    Ok(s.parse::<MonthPeriod>()?)
}

fn run_list(library: &Library, namespace: Option<&str>) -> Result<()> {
    let registry = library.registry();
    let symbols: Vec<_> = match namespace {
        Some(ns) => registry.namespace_symbols(ns).collect(),
        None => registry.symbols().iter().collect(),
    };

    for symbol in &symbols {
        let name = symbol.info.short_name.as_deref().unwrap_or("");
        println!("{:<24} {name}", symbol.id.to_string());
    }
    println!("{} symbols", symbols.len());

    let computed = registry.computed_namespaces();
    if namespace.is_none() && !computed.is_empty() {
        println!("computed namespaces: {}", computed.join(", "));
    }
    Ok(())
}
