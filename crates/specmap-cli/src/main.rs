#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "specmap")]
#[command(author, version, about = "A module specifier rewriting engine", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve a specifier as written in a source file
    Resolve {
        /// The specifier to resolve (e.g., "components/Button", "lodash")
        specifier: String,

        /// The file the specifier appears in
        #[arg(long, default_value = "unknown")]
        from: String,

        #[command(flatten)]
        args: commands::ResolveArgs,
    },

    /// Show the normalized resolution context for a file
    Context {
        /// The file whose context to show
        #[arg(long, default_value = "unknown")]
        from: String,

        #[command(flatten)]
        args: commands::ResolveArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json);

    match &cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Resolve {
            specifier,
            from,
            args,
        }) => {
            let opts = commands::build_options(args, cli.cwd.as_deref())?;
            commands::resolve::run(specifier, from, &opts, cli.json)
        }
        Some(Commands::Context { from, args }) => {
            let opts = commands::build_options(args, cli.cwd.as_deref())?;
            commands::context::run(from, &opts, cli.json)
        }
    }
}
