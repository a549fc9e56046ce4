#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod commands;
mod logging;

use clap::Parser;
use commands::RegistryArgs;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "regfetch")]
#[command(author, version, about = "Resolve and fetch npm package manifests", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory (where .npmrc lookup starts)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Fetch a package manifest (e.g. `foo@1.2.3`, `@scope/foo@latest`)
    Manifest {
        /// Package specifier
        spec: String,

        /// Retry transport errors and 5xx responses this many times
        #[arg(long, default_value_t = 0)]
        retries: u32,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Show which URL and auth a specifier resolves to, without fetching
    Resolve {
        /// Package specifier
        spec: String,

        #[command(flatten)]
        registry: RegistryArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Manifest {
            spec,
            retries,
            registry,
        }) => {
            let config = registry.load(&cwd)?;
            let span = tracing::info_span!("manifest", cmd = "manifest", spec = %spec);
            let _guard = span.enter();
            commands::manifest::run(&spec, &config, retries, cli.json)
        }
        Some(Commands::Resolve { spec, registry }) => {
            let config = registry.load(&cwd)?;
            commands::resolve::run(&spec, &config, cli.json)
        }
    }
}
