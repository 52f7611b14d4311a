//! Root directory search.

use crate::node::node_resolve;
use crate::options::ResolutionContext;
use crate::paths;
use std::path::{Path, PathBuf};

/// Look up `specifier` inside each configured root, in order, and express
/// the first hit relative to `current_file`.
#[must_use]
pub fn resolve_from_roots(
    specifier: &str,
    current_file: &Path,
    ctx: &ResolutionContext,
) -> Option<String> {
    let found = find_in_roots(specifier, ctx)?;
    Some(relative_specifier(specifier, current_file, &found, ctx))
}

/// Probe each root with a rooted lookup; first root wins.
pub(crate) fn find_in_roots(specifier: &str, ctx: &ResolutionContext) -> Option<PathBuf> {
    for root in &ctx.roots {
        let rooted = format!("./{specifier}");
        if let Some(found) = node_resolve(&rooted, root, &ctx.extensions, &ctx.alias_fields) {
            return Some(found);
        }
    }
    None
}

/// Format a root hit as a local specifier, rewriting the extension when the
/// file's real extension differs from the one written in the specifier.
fn relative_specifier(
    specifier: &str,
    current_file: &Path,
    found: &Path,
    ctx: &ResolutionContext,
) -> String {
    let real_ext = extension_of(&found.to_string_lossy());
    let given_ext = extension_of(specifier);

    let mut relative = paths::relative_from(&ctx.cwd, current_file, found);
    if real_ext != given_ext {
        relative = paths::replace_extension(&relative, &ctx.strip_extensions);
    }

    paths::to_local_specifier(&paths::to_posix(&relative))
}

/// Extension including the dot, or empty when there is none.
fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map_or_else(String::new, |ext| format!(".{}", ext.to_string_lossy()))
}
