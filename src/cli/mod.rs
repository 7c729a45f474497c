//! CLI surface (C13): `scan`, `watch`, `list`, `show`, and `config show`.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Catalog;
use crate::error::CatalogEngineError;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "live-catalog", about = "Index Ableton Live Sets into a queryable local catalog")]
pub struct Cli {
    /// Path to a config.toml, overriding the default search order.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile every `.als` file under the given roots once, then exit.
    /// With no roots given, scans every directory configured in
    /// `directories.paths` instead.
    Scan {
        paths: Vec<PathBuf>,
        /// Re-extract every matched file even if its content hash is
        /// already catalogued unchanged.
        #[arg(long)]
        force: bool,
    },
    /// Startup scan of the configured roots, then keep watching them for
    /// changes until Ctrl-C.
    Watch,
    /// List every catalogued project.
    List {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show one project's full detail.
    Show {
        identifier: i64,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Configuration subcommands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration.
    Show,
}

pub async fn run(cli: Cli) -> Result<(), CatalogEngineError> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { paths, force } => {
            let roots = if paths.is_empty() { config.directories.paths.clone() } else { paths };
            let catalog = Arc::new(Mutex::new(open_catalog(&config)?));
            let reconciled = commands::scan::run(catalog, roots, force).await?;
            println!("reconciled {reconciled} project(s)");
        }
        Commands::Watch => {
            let catalog = Arc::new(Mutex::new(open_catalog(&config)?));
            commands::watch::run(catalog, config.directories.paths.clone()).await?;
        }
        Commands::List { format } => {
            let catalog = open_catalog(&config)?;
            println!("{}", commands::list::run(&catalog, format)?);
        }
        Commands::Show { identifier, format } => {
            let catalog = open_catalog(&config)?;
            println!("{}", commands::show::run(&catalog, identifier, format)?);
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                println!("{}", commands::config::show(&config)?);
            }
        },
    }

    Ok(())
}

fn open_catalog(config: &Config) -> Result<Catalog, CatalogEngineError> {
    Ok(Catalog::open(&config.database_path.path, config.live_database_dir.dir.clone())?)
}
