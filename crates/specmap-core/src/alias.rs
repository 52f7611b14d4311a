//! Alias rule application.
//!
//! Rules are tried in declaration order and the first matcher that hits
//! wins, even if a later rule is more specific.

use crate::node::node_resolve;
use crate::options::ResolutionContext;
use crate::paths;
use std::path::Path;

/// Apply the first matching alias rule to `specifier`.
///
/// A relative-looking candidate is re-expressed relative to `current_file`
/// (anchored at the configuration cwd). A bare candidate is returned
/// unchanged; if it cannot be found by the generic lookup either, a
/// non-fatal warning is emitted (suppressed under `NODE_ENV=production`).
///
/// With no matching rule but `alias_fields` configured, falls back to a
/// generic lookup so manifest alias fields still apply.
#[must_use]
pub fn resolve_alias(
    specifier: &str,
    current_file: &Path,
    ctx: &ResolutionContext,
) -> Option<String> {
    let mut aliased = None;
    for rule in &ctx.alias {
        if let Some(caps) = rule.matcher.captures(specifier) {
            aliased = Some(rule.apply(&caps));
            break;
        }
    }

    let Some(aliased) = aliased else {
        if ctx.alias_fields.is_empty() {
            return None;
        }
        let basedir = current_file.parent()?;
        let resolved = node_resolve(specifier, basedir, &ctx.extensions, &ctx.alias_fields)?;
        return Some(paths::local_specifier_from(&ctx.cwd, current_file, &resolved));
    };

    if paths::is_relative_specifier(&aliased) {
        return Some(paths::local_specifier_from(
            &ctx.cwd,
            current_file,
            Path::new(&aliased),
        ));
    }

    if !production_build() {
        check_candidate_exists(&aliased, current_file, ctx);
    }

    Some(aliased)
}

fn production_build() -> bool {
    std::env::var("NODE_ENV").as_deref() == Ok("production")
}

/// Warn when a bare alias target cannot be found anywhere. Diagnostic only;
/// the substitution still proceeds.
fn check_candidate_exists(candidate: &str, current_file: &Path, ctx: &ResolutionContext) {
    let basedir = current_file.parent().unwrap_or_else(|| Path::new("."));
    if node_resolve(candidate, basedir, &ctx.extensions, &ctx.alias_fields).is_some() {
        return;
    }
    if crate::roots::find_in_roots(candidate, ctx).is_some() {
        return;
    }
    tracing::warn!(
        "Could not resolve {:?} in file {}.",
        candidate,
        current_file.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedupe::DedupeCache;
    use crate::options::{build_context, AliasValue, CwdSource, Options};
    use std::fs;
    use tempfile::tempdir;

    fn ctx_for(dir: &Path, opts: &Options) -> ResolutionContext {
        let mut opts = opts.clone();
        opts.cwd = Some(CwdSource::Literal(dir.to_path_buf()));
        build_context("unknown", &opts, &DedupeCache::default()).unwrap()
    }

    #[test]
    fn test_no_rules_no_fields_is_no_opinion() {
        let dir = tempdir().unwrap();
        let ctx = ctx_for(dir.path(), &Options::default());
        assert_eq!(
            resolve_alias("anything", &dir.path().join("app.js"), &ctx),
            None
        );
    }

    #[test]
    fn test_relative_candidate_rebased_on_current_file() {
        let tmp = tempdir().unwrap();
        let dir = dunce::canonicalize(tmp.path()).unwrap();
        fs::create_dir_all(dir.join("app")).unwrap();

        let opts = Options {
            alias: vec![("utils".to_string(), AliasValue::Template("./lib/utils".to_string()))],
            ..Default::default()
        };
        let ctx = ctx_for(&dir, &opts);

        let current = dir.join("app").join("index.js");
        assert_eq!(
            resolve_alias("utils/fmt", &current, &ctx),
            Some("../lib/utils/fmt".to_string())
        );
    }

    #[test]
    fn test_declaration_order_beats_specificity() {
        let tmp = tempdir().unwrap();
        let dir = dunce::canonicalize(tmp.path()).unwrap();
        let opts = Options {
            alias: vec![
                ("foo".to_string(), AliasValue::Template("./bar".to_string())),
                ("foo/baz".to_string(), AliasValue::Template("./qux".to_string())),
            ],
            ..Default::default()
        };
        let ctx = ctx_for(&dir, &opts);

        let current = dir.join("app.js");
        assert_eq!(
            resolve_alias("foo/baz", &current, &ctx),
            Some("./bar/baz".to_string())
        );
    }

    #[test]
    fn test_bare_candidate_returned_unchanged() {
        let tmp = tempdir().unwrap();
        let dir = dunce::canonicalize(tmp.path()).unwrap();
        let nm = dir.join("node_modules").join("other-pkg");
        fs::create_dir_all(&nm).unwrap();
        fs::write(nm.join("index.js"), "").unwrap();

        let opts = Options {
            alias: vec![(
                "old-pkg".to_string(),
                AliasValue::Template("other-pkg".to_string()),
            )],
            ..Default::default()
        };
        let ctx = ctx_for(&dir, &opts);

        let current = dir.join("app.js");
        assert_eq!(
            resolve_alias("old-pkg", &current, &ctx),
            Some("other-pkg".to_string())
        );
    }

    /// Collects log output so tests can assert on emitted warnings.
    #[derive(Clone, Default)]
    struct LogSink(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl LogSink {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogSink {
        type Writer = LogSink;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_unresolvable_bare_candidate_warns() {
        let tmp = tempdir().unwrap();
        let dir = dunce::canonicalize(tmp.path()).unwrap();
        let opts = Options {
            alias: vec![(
                "gone".to_string(),
                AliasValue::Template("missing-pkg".to_string()),
            )],
            ..Default::default()
        };
        let ctx = ctx_for(&dir, &opts);

        std::env::remove_var("NODE_ENV");

        let sink = LogSink::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, || {
            resolve_alias("gone", &dir.join("app.js"), &ctx)
        });

        // substitution proceeds despite the warning
        assert_eq!(result, Some("missing-pkg".to_string()));
        let logs = sink.contents();
        assert!(logs.contains("Could not resolve"));
        assert!(logs.contains("missing-pkg"));
    }

    #[test]
    #[serial_test::serial]
    fn test_resolvable_bare_candidate_does_not_warn() {
        let tmp = tempdir().unwrap();
        let dir = dunce::canonicalize(tmp.path()).unwrap();
        let nm = dir.join("node_modules").join("other-pkg");
        fs::create_dir_all(&nm).unwrap();
        fs::write(nm.join("index.js"), "").unwrap();

        let opts = Options {
            alias: vec![(
                "old-pkg".to_string(),
                AliasValue::Template("other-pkg".to_string()),
            )],
            ..Default::default()
        };
        let ctx = ctx_for(&dir, &opts);

        std::env::remove_var("NODE_ENV");

        let sink = LogSink::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, || {
            resolve_alias("old-pkg", &dir.join("app.js"), &ctx)
        });

        assert_eq!(result, Some("other-pkg".to_string()));
        assert!(!sink.contents().contains("Could not resolve"));
    }

    #[test]
    #[serial_test::serial]
    fn test_production_build_skips_existence_check() {
        let tmp = tempdir().unwrap();
        let dir = dunce::canonicalize(tmp.path()).unwrap();
        let opts = Options {
            alias: vec![(
                "gone".to_string(),
                AliasValue::Template("missing-pkg".to_string()),
            )],
            ..Default::default()
        };
        let ctx = ctx_for(&dir, &opts);

        std::env::set_var("NODE_ENV", "production");
        let result = resolve_alias("gone", &dir.join("app.js"), &ctx);
        std::env::remove_var("NODE_ENV");

        // substitution still happens; only the diagnostic lookup is skipped
        assert_eq!(result, Some("missing-pkg".to_string()));
    }

    #[test]
    fn test_alias_fields_fallback() {
        let tmp = tempdir().unwrap();
        let dir = dunce::canonicalize(tmp.path()).unwrap();
        fs::write(
            dir.join("package.json"),
            r#"{"browser": {"net": "./shims/net.js"}}"#,
        )
        .unwrap();
        fs::create_dir_all(dir.join("shims")).unwrap();
        fs::write(dir.join("shims").join("net.js"), "").unwrap();

        let opts = Options {
            alias_fields: vec!["browser".to_string()],
            ..Default::default()
        };
        let ctx = ctx_for(&dir, &opts);

        let current = dir.join("app.js");
        assert_eq!(
            resolve_alias("net", &current, &ctx),
            Some("./shims/net.js".to_string())
        );
    }
}
