#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "unbundle")]
#[command(author, version, about = "On-demand native ES module dev server", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted logs
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory (project root)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Start the development server
    Dev {
        /// Port to listen on
        #[arg(long, short = 'p', env = "UNBUNDLE_PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "UNBUNDLE_HOST")]
        host: Option<String>,

        /// Path to config file (overrides auto-discovery)
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,

        /// Entry HTML file, relative to the project root
        #[arg(long, value_name = "FILE")]
        index: Option<PathBuf>,

        /// Directory holding installed packages, relative to the project root
        #[arg(long, value_name = "DIR")]
        modules_dir: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Parse components on both the script and template request
        #[arg(long)]
        no_component_cache: bool,
    },

    /// Run a single request and print the response body
    Transform {
        /// Request target, e.g. `/src/main.js` or `/App.vue?type=template`
        url: String,

        /// Path to config file (overrides auto-discovery)
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Dev {
            port,
            host,
            config,
            index,
            modules_dir,
            timeout,
            no_component_cache,
        }) => {
            logging::init(cli.verbose, cli.json);
            let action = commands::dev::DevAction {
                cwd,
                config,
                port,
                host,
                index,
                modules_dir,
                timeout,
                no_component_cache,
            };

            let rt = tokio::runtime::Runtime::new().into_diagnostic()?;
            rt.block_on(commands::dev::run(action))
        }
        Some(Commands::Transform { url, config }) => {
            logging::init(cli.verbose, cli.json);
            let span = tracing::info_span!("transform", cmd = "transform", cwd = %cwd.display());
            let _guard = span.enter();

            let rt = tokio::runtime::Runtime::new().into_diagnostic()?;
            rt.block_on(commands::transform::run(&cwd, config.as_deref(), &url))
        }
    }
}
