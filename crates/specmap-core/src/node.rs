//! Generic Node-style module resolution.
//!
//! This is the lookup primitive the resolution strategies delegate to:
//! relative and absolute paths with extension probing, directory resolution
//! (`package.json` `main`, then `index.*`), and bare specifiers via a
//! `node_modules` walk-up. Alias fields (`browser`-style manifest maps) are
//! consulted when configured.
//!
//! Every failure degrades to `None`; this layer never errors.

use crate::paths;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Resolve `specifier` from `basedir`, probing `extensions` in order.
///
/// With `alias_fields` configured, each field is tried in order against the
/// nearest enclosing manifest; the first field whose answer differs from the
/// plain lookup wins. Without alias fields this is a plain lookup.
#[must_use]
pub fn node_resolve(
    specifier: &str,
    basedir: &Path,
    extensions: &[String],
    alias_fields: &[String],
) -> Option<PathBuf> {
    let default = resolve_plain(specifier, basedir, extensions);

    if alias_fields.is_empty() {
        return default;
    }

    let mut dealiased = None;
    for field in alias_fields {
        let candidate = resolve_with_field(specifier, basedir, extensions, field);
        if candidate.is_none() {
            continue;
        }
        dealiased = candidate;
        if dealiased != default {
            break;
        }
    }
    dealiased
}

/// Plain resolution without alias-field remapping.
fn resolve_plain(specifier: &str, basedir: &Path, extensions: &[String]) -> Option<PathBuf> {
    if paths::is_relative_specifier(specifier) {
        return load_path(&basedir.join(specifier), extensions);
    }

    if Path::new(specifier).is_absolute() {
        return load_path(Path::new(specifier), extensions);
    }

    // Bare specifier: walk up looking for node_modules/<specifier>.
    let mut current = Some(basedir);
    while let Some(dir) = current {
        let candidate = dir.join("node_modules").join(specifier);
        if let Some(found) = load_path(&candidate, extensions) {
            return Some(found);
        }
        current = dir.parent();
    }
    None
}

/// Resolution with a single alias field applied.
///
/// A manifest map can remap the bare specifier directly, or remap the file
/// the plain lookup lands on (keyed as `./<path-within-package>`). A `false`
/// value marks the module as ignored.
fn resolve_with_field(
    specifier: &str,
    basedir: &Path,
    extensions: &[String],
    field: &str,
) -> Option<PathBuf> {
    let map = alias_field_map(basedir, field);

    if let Some((pkg_dir, map)) = &map {
        if let Some(target) = map.get(specifier) {
            return apply_field_target(target, pkg_dir, basedir, extensions);
        }
    }

    let resolved = resolve_plain(specifier, basedir, extensions)?;

    if let Some((pkg_dir, map)) = &map {
        if let Ok(within) = resolved.strip_prefix(pkg_dir) {
            let key = format!("./{}", paths::to_posix(&within.to_string_lossy()));
            if let Some(target) = map.get(&key) {
                return apply_field_target(target, pkg_dir, basedir, extensions);
            }
        }
    }

    Some(resolved)
}

fn apply_field_target(
    target: &Value,
    pkg_dir: &Path,
    basedir: &Path,
    extensions: &[String],
) -> Option<PathBuf> {
    match target {
        Value::String(replacement) => {
            if paths::is_relative_specifier(replacement) {
                load_path(&pkg_dir.join(replacement), extensions)
            } else {
                resolve_plain(replacement, basedir, extensions)
            }
        }
        // `false` means the module is stubbed out for this environment
        _ => None,
    }
}

/// Read the alias-field object from the nearest enclosing manifest.
fn alias_field_map(
    basedir: &Path,
    field: &str,
) -> Option<(PathBuf, serde_json::Map<String, Value>)> {
    let manifest_path = paths::find_package_manifest(basedir)?;
    let content = std::fs::read_to_string(&manifest_path).ok()?;
    let manifest: Value = serde_json::from_str(&content).ok()?;
    let map = manifest.get(field)?.as_object()?.clone();
    let pkg_dir = manifest_path.parent()?.to_path_buf();
    Some((pkg_dir, map))
}

/// Load a path: exact file, then extension probing, then directory.
fn load_path(base: &Path, extensions: &[String]) -> Option<PathBuf> {
    if base.is_file() {
        return Some(canonical(base));
    }

    for ext in extensions {
        let with_ext = PathBuf::from(format!("{}{ext}", base.display()));
        if with_ext.is_file() {
            return Some(canonical(&with_ext));
        }
    }

    if base.is_dir() {
        return load_directory(base, extensions);
    }

    None
}

/// Load a directory: `package.json` `main` first, then `index.*`.
fn load_directory(dir: &Path, extensions: &[String]) -> Option<PathBuf> {
    let manifest_path = dir.join("package.json");
    if manifest_path.is_file() {
        if let Some(main) = read_main_field(&manifest_path) {
            let main_path = paths::normalize_lexically(&dir.join(main));

            if main_path.is_file() {
                return Some(canonical(&main_path));
            }
            for ext in extensions {
                let with_ext = PathBuf::from(format!("{}{ext}", main_path.display()));
                if with_ext.is_file() {
                    return Some(canonical(&with_ext));
                }
            }
            if main_path.is_dir() {
                if let Some(found) = load_index(&main_path, extensions) {
                    return Some(found);
                }
            }
            // main points nowhere: fall through to index probing
        }
    }

    load_index(dir, extensions)
}

fn load_index(dir: &Path, extensions: &[String]) -> Option<PathBuf> {
    for ext in extensions {
        let index = dir.join(format!("index{ext}"));
        if index.is_file() {
            return Some(canonical(&index));
        }
    }
    None
}

fn read_main_field(manifest_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(manifest_path).ok()?;
    let manifest: Value = serde_json::from_str(&content).ok()?;
    manifest
        .get("main")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
