//! Resolution orchestrator.
//!
//! Strategies run in a fixed order (dedupe, alias, root search) and the
//! first one with an opinion wins. Normalized contexts are memoized per
//! (containing directory, options) pair for the resolver's lifetime.

use crate::dedupe::DedupeCache;
use crate::error::Error;
use crate::options::{build_context, Options, ResolutionContext};
use crate::{alias, dedupe, paths, roots};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One resolver per build run.
///
/// Owns the two process-lifetime caches: the normalization memo and the
/// dedupe cache. Construct it once and drive it over every file in the
/// build; tests construct a fresh one per case.
#[derive(Debug, Default)]
pub struct Resolver {
    memo: Mutex<HashMap<(String, Options), Arc<ResolutionContext>>>,
    dedupe_cache: DedupeCache,
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The dedupe cache shared by every resolution made through this
    /// resolver.
    #[must_use]
    pub fn dedupe_cache(&self) -> &DedupeCache {
        &self.dedupe_cache
    }

    /// Resolve `specifier` as written in `current_file` to a new specifier,
    /// or `None` when no strategy has an opinion (caller leaves the
    /// original untouched).
    ///
    /// # Errors
    /// Only configuration bugs error (bad alias pattern, root glob matching
    /// nothing); per-file misses are `Ok(None)`.
    pub fn resolve(
        &self,
        specifier: &str,
        current_file: &str,
        opts: &Options,
    ) -> Result<Option<String>, Error> {
        if let Some(hook) = &opts.resolve_path {
            return Ok(hook(specifier, Path::new(current_file), opts));
        }

        if opts.skip_paths.iter().any(|p| current_file.contains(p.as_str())) {
            return Ok(None);
        }

        if paths::is_relative_specifier(specifier) {
            return Ok(Some(specifier.to_string()));
        }

        let ctx = self.context(current_file, opts)?;

        // current_file is relative to the process cwd, not the config cwd
        let absolute_current =
            paths::resolve_lexically(&std::env::current_dir()?, Path::new(current_file));

        if let Some(found) = dedupe::resolve_deduped(specifier, &absolute_current, &ctx) {
            return Ok(Some(finish(found, &absolute_current, &ctx)));
        }
        if let Some(found) = alias::resolve_alias(specifier, &absolute_current, &ctx) {
            return Ok(Some(finish(found, &absolute_current, &ctx)));
        }
        if let Some(found) = roots::resolve_from_roots(specifier, &absolute_current, &ctx) {
            return Ok(Some(found));
        }

        Ok(None)
    }

    /// Normalized context for `(current_file, opts)`, memoized.
    ///
    /// The memo key is the containing directory when `current_file` looks
    /// like a file, or the token itself otherwise, so normalization work
    /// (glob expansion, cwd discovery) runs once per directory.
    pub fn context(
        &self,
        current_file: &str,
        opts: &Options,
    ) -> Result<Arc<ResolutionContext>, Error> {
        let key = (memo_token(current_file), opts.clone());

        {
            let memo = self.memo.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(ctx) = memo.get(&key) {
                return Ok(Arc::clone(ctx));
            }
        }

        let ctx = Arc::new(build_context(current_file, opts, &self.dedupe_cache)?);
        self.memo
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key, Arc::clone(&ctx));
        Ok(ctx)
    }
}

/// A candidate that is still a bare specifier gets one pass through the
/// root search, so an alias may rewrite into a root-relative path.
fn finish(candidate: String, current_file: &Path, ctx: &ResolutionContext) -> String {
    if !paths::is_relative_specifier(&candidate) {
        if let Some(via_root) = roots::resolve_from_roots(&candidate, current_file, ctx) {
            return via_root;
        }
    }
    candidate
}

/// Memo token: containing directory for file-looking paths, the raw token
/// (e.g. "unknown") otherwise.
fn memo_token(current_file: &str) -> String {
    if current_file.contains('.') {
        Path::new(current_file)
            .parent()
            .map_or_else(|| current_file.to_string(), |d| d.to_string_lossy().into_owned())
    } else {
        current_file.to_string()
    }
}
