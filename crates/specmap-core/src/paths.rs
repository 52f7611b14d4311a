//! Path and specifier string helpers.
//!
//! Everything here is lexical: no filesystem access, so the helpers behave
//! the same regardless of what is actually on disk.

use std::path::{Component, Path, PathBuf};

/// Replace platform directory separators with forward slashes. Idempotent.
#[must_use]
pub fn to_posix(path: &str) -> String {
    path.replace('\\', "/")
}

/// True iff the specifier starts with `./` or `../`.
#[must_use]
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Turn a posix path into a local specifier: drop a trailing `/index`
/// segment and make sure the result starts with `./` or `../`.
#[must_use]
pub fn to_local_specifier(path: &str) -> String {
    let local = path.strip_suffix("/index").unwrap_or(path);
    if is_relative_specifier(local) {
        local.to_string()
    } else {
        format!("./{local}")
    }
}

/// Return the basename of `path` with the first matching suffix from
/// `candidates` removed. Order matters: the first candidate that matches
/// wins, so order candidate lists longest-first when suffixes overlap.
#[must_use]
pub fn strip_known_extension(path: &str, candidates: &[String]) -> String {
    let name = Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |n| n.to_string_lossy().into_owned());

    for ext in candidates {
        if let Some(stripped) = name.strip_suffix(ext.as_str()) {
            return stripped.to_string();
        }
    }
    name
}

/// Rejoin the directory of `path` with its extension-stripped basename.
#[must_use]
pub fn replace_extension(path: &str, strip_candidates: &[String]) -> String {
    let name = strip_known_extension(path, strip_candidates);
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            dir.join(name).to_string_lossy().into_owned()
        }
        _ => name,
    }
}

/// Escape regex metacharacters so a literal string can be embedded inside
/// a constructed pattern.
#[must_use]
pub fn escape_regex(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if ".*+?^${}()|[]\\".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the root is dropped; a relative path keeps leading `..`
/// components it cannot collapse.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    Some(Component::RootDir | Component::Prefix(_)) => true,
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Join `path` onto an absolute `base` (unless it is already absolute) and
/// normalize the result lexically.
#[must_use]
pub fn resolve_lexically(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base.join(path))
    }
}

/// Relative path from the directory containing `current_file` to `target`,
/// with both ends anchored at `cwd` first. Uses the platform separator;
/// callers convert with [`to_posix`].
#[must_use]
pub fn relative_from(cwd: &Path, current_file: &Path, target: &Path) -> String {
    let from_dir = current_file.parent().unwrap_or_else(|| Path::new("."));
    let from = resolve_lexically(cwd, from_dir);
    let to = resolve_lexically(cwd, target);
    path_relative(&from, &to)
}

/// Component-wise relative path between two absolute paths.
fn path_relative(from: &Path, to: &Path) -> String {
    let from: Vec<_> = from.components().collect();
    let to: Vec<_> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for comp in &to[common..] {
        parts.push(comp.as_os_str().to_string_lossy().into_owned());
    }

    parts.join(std::path::MAIN_SEPARATOR_STR)
}

/// Express `target` as a posix local specifier relative to `current_file`.
///
/// This is the final formatting step shared by every strategy: relative-path
/// computation anchored at `cwd`, separator normalization, then `./` / `../`
/// prefixing with a trailing `/index` dropped.
#[must_use]
pub fn local_specifier_from(cwd: &Path, current_file: &Path, target: &Path) -> String {
    to_local_specifier(&to_posix(&relative_from(cwd, current_file, target)))
}

/// Walk upward from `start` looking for a `package.json`, returning its path.
#[must_use]
pub fn find_package_manifest(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let manifest = dir.join("package.json");
        if manifest.is_file() {
            return Some(manifest);
        }
        current = dir.parent();
    }
    None
}

/// Walk upward from `start` looking for a Babel configuration file:
/// `.babelrc`, `.babelrc.js`, `babel.config.js`, or a `package.json` with a
/// `"babel"` key.
#[must_use]
pub fn find_babel_config(start: &Path) -> Option<PathBuf> {
    const FILES: &[&str] = &[".babelrc", ".babelrc.js", "babel.config.js"];

    let mut current = Some(start);
    while let Some(dir) = current {
        for name in FILES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        let manifest = dir.join("package.json");
        if manifest.is_file() {
            if let Ok(content) = std::fs::read_to_string(&manifest) {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(&content) {
                    if value.get("babel").is_some() {
                        return Some(manifest);
                    }
                }
            }
        }

        current = dir.parent();
    }
    None
}
