pub mod context;
pub mod resolve;
pub mod version;

use miette::{miette, IntoDiagnostic, Result};
use specmap_core::{AliasValue, CwdSource, Options, RawConfig};
use std::path::{Path, PathBuf};

/// Flag-level resolver configuration shared by the resolution commands.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ResolveArgs {
    /// Path to a JSON configuration file
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Search root (repeatable; may be a glob like "./packages/*/src")
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<String>,

    /// Alias rule as KEY=VALUE (repeatable; tried in the given order)
    #[arg(long = "alias", value_name = "KEY=VALUE")]
    pub aliases: Vec<String>,

    /// Extensions probed during resolution, comma separated
    #[arg(long, value_delimiter = ',', value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Canonicalize duplicate package installations to a single copy
    #[arg(long)]
    pub dedupe: bool,
}

/// Merge a config file (if any) with command-line flags. Flags append to
/// roots and aliases and override scalar settings.
pub fn build_options(args: &ResolveArgs, cwd: Option<&Path>) -> Result<Options> {
    let mut opts = match &args.config {
        Some(path) => RawConfig::load(path)
            .into_diagnostic()?
            .into_options()
            .into_diagnostic()?,
        None => Options::default(),
    };

    if let Some(cwd) = cwd {
        opts.cwd = Some(CwdSource::Literal(cwd.to_path_buf()));
    }

    opts.root.extend(args.roots.iter().cloned());
    for pair in &args.aliases {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| miette!("invalid alias {pair:?}, expected KEY=VALUE"))?;
        opts.alias
            .push((key.to_string(), AliasValue::Template(value.to_string())));
    }
    if !args.extensions.is_empty() {
        opts.extensions = args.extensions.clone();
    }
    if args.dedupe {
        opts.dedupe = true;
    }

    Ok(opts)
}
