use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use specmap_core::{Options, Resolver};

#[derive(Debug, Serialize)]
struct ResolveReport<'a> {
    specifier: &'a str,
    from: &'a str,
    resolved: Option<String>,
}

/// Resolve one specifier and print the outcome.
///
/// When `json` is true, outputs a single JSON object to stdout. A specifier
/// no strategy claims prints unchanged, matching what a rewriter would emit.
pub fn run(specifier: &str, from: &str, opts: &Options, json: bool) -> Result<()> {
    let resolver = Resolver::new();
    let resolved = resolver.resolve(specifier, from, opts).into_diagnostic()?;

    if json {
        let report = ResolveReport {
            specifier,
            from,
            resolved: resolved.clone(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).into_diagnostic()?
        );
    } else {
        println!("{}", resolved.as_deref().unwrap_or(specifier));
    }

    Ok(())
}
