use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use specmap_core::{build_context, DedupeCache, Options};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct ContextReport {
    cwd: PathBuf,
    roots: Vec<PathBuf>,
    alias_rules: usize,
    alias_fields: Vec<String>,
    extensions: Vec<String>,
    strip_extensions: Vec<String>,
    transform_functions: Vec<String>,
    skip_paths: Vec<String>,
    dedupe: bool,
}

/// Show the normalized resolution context for a file, the way the resolver
/// would see it. Useful for debugging root globs and cwd discovery.
pub fn run(from: &str, opts: &Options, json: bool) -> Result<()> {
    let ctx = build_context(from, opts, &DedupeCache::new()).into_diagnostic()?;

    let report = ContextReport {
        cwd: ctx.cwd.clone(),
        roots: ctx.roots.clone(),
        alias_rules: ctx.alias.len(),
        alias_fields: ctx.alias_fields.clone(),
        extensions: ctx.extensions.clone(),
        strip_extensions: ctx.strip_extensions.clone(),
        transform_functions: ctx.transform_functions.clone(),
        skip_paths: ctx.skip_paths.clone(),
        dedupe: ctx.dedupe.is_some(),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).into_diagnostic()?
        );
        return Ok(());
    }

    let mut out = io::stdout().lock();
    writeln!(out, "cwd:        {}", report.cwd.display()).into_diagnostic()?;
    for root in &report.roots {
        writeln!(out, "root:       {}", root.display()).into_diagnostic()?;
    }
    writeln!(out, "aliases:    {}", report.alias_rules).into_diagnostic()?;
    writeln!(out, "extensions: {}", report.extensions.join(", ")).into_diagnostic()?;
    writeln!(
        out,
        "dedupe:     {}",
        if report.dedupe { "on" } else { "off" }
    )
    .into_diagnostic()?;

    Ok(())
}
