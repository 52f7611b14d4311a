//! Package deduplication.
//!
//! A package manager may install the same package version at several depths
//! of the `node_modules` tree. When deduplication is on, the first physical
//! copy resolved for a given (name, version, in-package path) becomes the
//! canonical one for the rest of the build, and every later resolution of
//! that identity is rewritten to point at it.

use crate::alias::resolve_alias;
use crate::node::node_resolve;
use crate::options::ResolutionContext;
use crate::paths;
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Build-wide canonical-copy cache.
///
/// Owned by the [`Resolver`](crate::Resolver) for its lifetime: one per
/// build run, shared across every resolution call, never evicted. Cloning
/// shares the underlying maps.
#[derive(Debug, Clone, Default)]
pub struct DedupeCache {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// `"<name>@<version>/<path-within-package>"` -> canonical file.
    canonical: Mutex<HashMap<String, PathBuf>>,
    /// Parsed manifest identities, memoized per package directory.
    manifests: Mutex<HashMap<PathBuf, Option<PackageIdentity>>>,
}

#[derive(Debug, Clone, Deserialize)]
struct PackageIdentity {
    name: String,
    version: String,
}

impl DedupeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of canonical entries recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.canonical().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn canonical(&self) -> std::sync::MutexGuard<'_, HashMap<String, PathBuf>> {
        self.inner.canonical.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Look up the identity of the package rooted at `module_dir`, reading
    /// and memoizing its manifest.
    fn identity(&self, module_dir: &Path) -> Option<PackageIdentity> {
        let mut manifests = self
            .inner
            .manifests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        manifests
            .entry(module_dir.to_path_buf())
            .or_insert_with(|| read_identity(module_dir))
            .clone()
    }

    /// Claim `resolved` as the canonical file for `key` unless another file
    /// already did, and return whichever path is now canonical.
    ///
    /// Read-then-write happens under one lock acquisition so first writer
    /// wins even when resolution runs in parallel.
    fn claim(&self, key: String, resolved: &Path) -> Option<PathBuf> {
        let mut canonical = self.canonical();
        match canonical.entry(key) {
            Entry::Occupied(entry) => Some(entry.get().clone()),
            Entry::Vacant(entry) => {
                if !resolved.exists() {
                    return None;
                }
                Some(entry.insert(resolved.to_path_buf()).clone())
            }
        }
    }
}

fn read_identity(module_dir: &Path) -> Option<PackageIdentity> {
    let content = std::fs::read_to_string(module_dir.join("package.json")).ok()?;
    serde_json::from_str(&content).ok()
}

/// Resolve through the dedupe cache. `None` when deduplication is disabled
/// or the specifier does not land inside an installed package; any failure
/// along the way falls back to the plain alias result.
#[must_use]
pub fn resolve_deduped(
    specifier: &str,
    current_file: &Path,
    ctx: &ResolutionContext,
) -> Option<String> {
    let cache = ctx.dedupe.as_ref()?;

    // Dealias first; it also serves as the fallback result below, so a
    // failed dedupe never costs a second trip through the alias rules.
    let dealiased = resolve_alias(specifier, current_file, ctx);

    let basedir = current_file.parent()?;
    let candidate = dealiased.as_deref().unwrap_or(specifier);
    let Some(resolved) = node_resolve(candidate, basedir, &ctx.extensions, &ctx.alias_fields)
    else {
        return dealiased;
    };

    let Some(module_dir) = module_container_dir(&resolved) else {
        return dealiased;
    };
    let Some(identity) = cache.identity(&module_dir) else {
        return dealiased;
    };

    let within = resolved
        .strip_prefix(&module_dir)
        .map(|p| paths::to_posix(&p.to_string_lossy()))
        .unwrap_or_default();
    let key = format!("{}@{}/{}", identity.name, identity.version, within);

    let Some(canonical) = cache.claim(key, &resolved) else {
        return dealiased;
    };

    Some(paths::local_specifier_from(&ctx.cwd, current_file, &canonical))
}

/// The nearest enclosing installed-package directory: everything up to and
/// including the first name segment (two segments for `@scope/` names)
/// after the last `node_modules` component.
#[must_use]
pub fn module_container_dir(file: &Path) -> Option<PathBuf> {
    let components: Vec<Component<'_>> = file.components().collect();
    let nm = components
        .iter()
        .rposition(|c| c.as_os_str() == "node_modules")?;

    let name = components.get(nm + 1)?;
    let end = if name.as_os_str().to_string_lossy().starts_with('@') {
        components.get(nm + 2)?;
        nm + 3
    } else {
        nm + 2
    };

    Some(components[..end].iter().collect())
}
