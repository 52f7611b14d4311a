//! Raw options and their normalization into a resolution context.
//!
//! Normalization does real filesystem work (cwd discovery, root glob
//! expansion) and compiles alias rules, so the orchestrator memoizes it per
//! (containing directory, options) pair. Everything that can only be a
//! configuration bug fails fast here instead of being absorbed per file.

use crate::dedupe::DedupeCache;
use crate::error::Error;
use crate::paths;
use regex_lite::{Captures, Regex};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default extensions probed during resolution, in matching order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".es", ".es6", ".mjs"];

/// Call expressions the traversal layer rewrites by default. Caller-supplied
/// names are appended to this set, never replace it.
pub const DEFAULT_TRANSFORM_FUNCTIONS: &[&str] = &[
    "require",
    "require.resolve",
    "import",
    "System.import",
    // Jest mock helpers
    "jest.genMockFromModule",
    "jest.mock",
    "jest.unmock",
    "jest.doMock",
    "jest.dontMock",
    "jest.setMock",
    "require.requireActual",
    "require.requireMock",
];

/// Files under these path substrings are never rewritten; their module-name
/// conventions cannot be resolved safely.
pub const DEFAULT_SKIP_PATHS: &[&str] = &["/react-native/Libraries/"];

/// Callable substituter: produces a replacement from a regex match.
pub type SubstituteFn = dyn Fn(&Captures<'_>) -> String + Send + Sync;

/// Escape hatch replacing the entire orchestrator.
pub type ResolvePathFn =
    dyn Fn(&str, &Path, &Options) -> Option<String> + Send + Sync;

/// Where the configuration cwd comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CwdSource {
    /// A literal directory, resolved against the process cwd.
    Literal(PathBuf),
    /// The directory of the nearest Babel config file.
    Babelrc,
    /// The directory of the nearest `package.json`.
    PackageJson,
}

/// An alias target: a template string or a caller-supplied function.
///
/// The variant is chosen once at construction so the matching loop never
/// inspects types at resolution time.
#[derive(Clone)]
pub enum AliasValue {
    Template(String),
    Func(Arc<SubstituteFn>),
}

impl AliasValue {
    /// Wrap a substituter function.
    pub fn func(f: impl Fn(&Captures<'_>) -> String + Send + Sync + 'static) -> Self {
        Self::Func(Arc::new(f))
    }
}

impl std::fmt::Debug for AliasValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template(s) => f.debug_tuple("Template").field(s).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl PartialEq for AliasValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Template(a), Self::Template(b)) => a == b,
            (Self::Func(a), Self::Func(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for AliasValue {}

impl Hash for AliasValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Template(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            Self::Func(f) => {
                1u8.hash(state);
                (Arc::as_ptr(f).cast::<()>() as usize).hash(state);
            }
        }
    }
}

/// Raw resolver configuration, as handed over by the traversal layer.
///
/// `Options` is hashable so it can key the normalization memo; function
/// values participate by pointer identity.
#[derive(Clone)]
pub struct Options {
    pub cwd: Option<CwdSource>,
    /// Search roots, possibly glob patterns, resolved relative to cwd.
    pub root: Vec<String>,
    /// Alias rules in declaration order; first match wins.
    pub alias: Vec<(String, AliasValue)>,
    /// Manifest alias fields (e.g. `browser`) for the generic lookup.
    pub alias_fields: Vec<String>,
    /// Extensions probed during resolution; empty means the default set.
    pub extensions: Vec<String>,
    /// Extensions stripped from rewritten specifiers; `None` means `extensions`.
    pub strip_extensions: Option<Vec<String>>,
    /// Extra call expressions for the traversal layer, appended to defaults.
    pub transform_functions: Vec<String>,
    /// Canonicalize duplicate package installations to a single copy.
    pub dedupe: bool,
    /// Files whose path contains any of these substrings are never rewritten.
    pub skip_paths: Vec<String>,
    /// Full custom resolution hook; bypasses the orchestrator entirely.
    pub resolve_path: Option<Arc<ResolvePathFn>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cwd: None,
            root: Vec::new(),
            alias: Vec::new(),
            alias_fields: Vec::new(),
            extensions: Vec::new(),
            strip_extensions: None,
            transform_functions: Vec::new(),
            dedupe: false,
            skip_paths: DEFAULT_SKIP_PATHS.iter().map(ToString::to_string).collect(),
            resolve_path: None,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("cwd", &self.cwd)
            .field("root", &self.root)
            .field("alias", &self.alias)
            .field("alias_fields", &self.alias_fields)
            .field("extensions", &self.extensions)
            .field("strip_extensions", &self.strip_extensions)
            .field("transform_functions", &self.transform_functions)
            .field("dedupe", &self.dedupe)
            .field("skip_paths", &self.skip_paths)
            .field("resolve_path", &self.resolve_path.as_ref().map(|_| ".."))
            .finish()
    }
}

impl PartialEq for Options {
    fn eq(&self, other: &Self) -> bool {
        let hook_eq = match (&self.resolve_path, &other.resolve_path) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        hook_eq
            && self.cwd == other.cwd
            && self.root == other.root
            && self.alias == other.alias
            && self.alias_fields == other.alias_fields
            && self.extensions == other.extensions
            && self.strip_extensions == other.strip_extensions
            && self.transform_functions == other.transform_functions
            && self.dedupe == other.dedupe
            && self.skip_paths == other.skip_paths
    }
}

impl Eq for Options {}

impl Hash for Options {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cwd.hash(state);
        self.root.hash(state);
        self.alias.hash(state);
        self.alias_fields.hash(state);
        self.extensions.hash(state);
        self.strip_extensions.hash(state);
        self.transform_functions.hash(state);
        self.dedupe.hash(state);
        self.skip_paths.hash(state);
        if let Some(hook) = &self.resolve_path {
            (Arc::as_ptr(hook).cast::<()>() as usize).hash(state);
        }
    }
}

/// A compiled alias substituter.
pub enum Substitute {
    /// Literal-key rule: append the captured remainder to the value.
    Suffix(String),
    /// Regex-key rule: backreference template parts joined with `\`.
    Parts(Vec<String>),
    /// Caller-supplied function, used verbatim.
    Func(Arc<SubstituteFn>),
}

impl std::fmt::Debug for Substitute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suffix(s) => f.debug_tuple("Suffix").field(s).finish(),
            Self::Parts(p) => f.debug_tuple("Parts").field(p).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// A compiled alias rule: anchored matcher plus substituter.
#[derive(Debug)]
pub struct AliasRule {
    pub matcher: Regex,
    pub substitute: Substitute,
}

impl AliasRule {
    /// Apply the substituter to a successful match.
    #[must_use]
    pub fn apply(&self, caps: &Captures<'_>) -> String {
        match &self.substitute {
            Substitute::Suffix(value) => {
                let remainder = caps.get(1).map_or("", |m| m.as_str());
                format!("{value}{remainder}")
            }
            Substitute::Parts(parts) => parts
                .iter()
                .map(|part| substitute_backrefs(part, caps))
                .collect::<Vec<_>>()
                .join("\\"),
            Substitute::Func(f) => f(caps),
        }
    }
}

/// Replace `\N` backreferences in a template part with captured groups.
fn substitute_backrefs(part: &str, caps: &Captures<'_>) -> String {
    let mut out = String::with_capacity(part.len());
    let mut chars = part.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(d) = chars.peek().copied() {
            if d.is_ascii_digit() {
                digits.push(d);
                chars.next();
            } else {
                break;
            }
        }

        if digits.is_empty() {
            out.push(c);
        } else if let Some(m) = digits.parse::<usize>().ok().and_then(|n| caps.get(n)) {
            out.push_str(m.as_str());
        }
    }

    out
}

/// Derived, memoized resolution context. Immutable once built.
#[derive(Debug)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
    /// Absolute search roots in configuration order, globs expanded.
    pub roots: Vec<PathBuf>,
    /// Compiled alias rules in declaration order.
    pub alias: Vec<AliasRule>,
    pub alias_fields: Vec<String>,
    pub extensions: Vec<String>,
    pub strip_extensions: Vec<String>,
    /// For the traversal layer; the engine itself never reads this.
    pub transform_functions: Vec<String>,
    pub skip_paths: Vec<String>,
    /// Present iff deduplication is enabled.
    pub dedupe: Option<DedupeCache>,
}

/// Build a [`ResolutionContext`] from raw options.
///
/// `current_file` seeds the cwd discovery strategies; `dedupe_cache` is the
/// build-wide cache the context binds to when `dedupe` is set.
pub fn build_context(
    current_file: &str,
    opts: &Options,
    dedupe_cache: &DedupeCache,
) -> Result<ResolutionContext, Error> {
    let cwd = normalize_cwd(opts.cwd.as_ref(), current_file)?;
    let roots = normalize_roots(&opts.root, &cwd)?;
    let alias = compile_alias(&opts.alias)?;

    let extensions = if opts.extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
    } else {
        opts.extensions.clone()
    };
    let strip_extensions = opts
        .strip_extensions
        .clone()
        .unwrap_or_else(|| extensions.clone());

    let mut transform_functions: Vec<String> = DEFAULT_TRANSFORM_FUNCTIONS
        .iter()
        .map(ToString::to_string)
        .collect();
    transform_functions.extend(opts.transform_functions.iter().cloned());

    Ok(ResolutionContext {
        cwd,
        roots,
        alias,
        alias_fields: opts.alias_fields.clone(),
        extensions,
        strip_extensions,
        transform_functions,
        skip_paths: opts.skip_paths.clone(),
        dedupe: opts.dedupe.then(|| dedupe_cache.clone()),
    })
}

/// Resolve the configuration cwd.
fn normalize_cwd(source: Option<&CwdSource>, current_file: &str) -> Result<PathBuf, Error> {
    let process_cwd = std::env::current_dir()?;

    let start = || {
        // A file-looking start walks from its directory; an opaque token
        // (e.g. "unknown") walks from the process cwd.
        let start_path = if current_file.contains('.') {
            Path::new(current_file)
                .parent()
                .unwrap_or_else(|| Path::new("."))
        } else {
            Path::new(current_file)
        };
        paths::resolve_lexically(&process_cwd, start_path)
    };

    let cwd = match source {
        Some(CwdSource::Literal(dir)) => Some(paths::resolve_lexically(&process_cwd, dir)),
        Some(CwdSource::Babelrc) => paths::find_babel_config(&start())
            .and_then(|config| config.parent().map(Path::to_path_buf)),
        Some(CwdSource::PackageJson) => paths::find_package_manifest(&start())
            .and_then(|manifest| manifest.parent().map(Path::to_path_buf)),
        None => None,
    };

    Ok(cwd.unwrap_or(process_cwd))
}

fn has_glob_magic(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', ']'])
}

/// Resolve each root against cwd, expanding glob patterns to existing
/// directories in match order at the original entry's position.
fn normalize_roots(root: &[String], cwd: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut roots = Vec::new();

    for entry in root {
        let absolute = paths::resolve_lexically(cwd, Path::new(entry));

        if !has_glob_magic(entry) {
            roots.push(absolute);
            continue;
        }

        let pattern = absolute.to_string_lossy();
        let matches = glob::glob(&pattern).map_err(|source| Error::BadRootPattern {
            pattern: entry.clone(),
            source,
        })?;

        let before = roots.len();
        for matched in matches.flatten() {
            if matched.is_dir() {
                roots.push(matched);
            }
        }
        if roots.len() == before {
            return Err(Error::RootNotFound {
                pattern: entry.clone(),
            });
        }
    }

    Ok(roots)
}

/// A key is a regex key iff it is anchored at either end.
fn is_regex_key(key: &str) -> bool {
    key.starts_with('^') || key.ends_with('$')
}

/// Compile alias rules, preserving declaration order.
fn compile_alias(alias: &[(String, AliasValue)]) -> Result<Vec<AliasRule>, Error> {
    alias
        .iter()
        .map(|(key, value)| {
            let regex_key = is_regex_key(key);
            let pattern = if regex_key {
                key.clone()
            } else {
                format!("^{}(/.*|)$", paths::escape_regex(key))
            };
            let matcher = Regex::new(&pattern).map_err(|source| Error::BadAliasPattern {
                key: key.clone(),
                source,
            })?;

            let substitute = match value {
                AliasValue::Func(f) => Substitute::Func(Arc::clone(f)),
                AliasValue::Template(template) if regex_key => Substitute::Parts(
                    template.split("\\\\").map(ToString::to_string).collect(),
                ),
                AliasValue::Template(template) => Substitute::Suffix(template.clone()),
            };

            Ok(AliasRule { matcher, substitute })
        })
        .collect()
}
