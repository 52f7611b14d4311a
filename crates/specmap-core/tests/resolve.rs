//! End-to-end resolution through the public `Resolver` API.

use specmap_core::{AliasValue, CwdSource, Options, Resolver};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn project(layout: &[&str]) -> (tempfile::TempDir, PathBuf) {
    let tmp = tempdir().unwrap();
    let dir = dunce::canonicalize(tmp.path()).unwrap();
    for file in layout {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
    }
    (tmp, dir)
}

fn opts(dir: &Path) -> Options {
    Options {
        cwd: Some(CwdSource::Literal(dir.to_path_buf())),
        ..Default::default()
    }
}

#[test]
fn relative_specifiers_pass_through_unchanged() {
    let resolver = Resolver::new();
    let result = resolver
        .resolve("./sibling", "/project/src/app.js", &Options::default())
        .unwrap();
    assert_eq!(result, Some("./sibling".to_string()));
}

#[test]
fn files_under_skipped_paths_are_never_rewritten() {
    let (_tmp, dir) = project(&["src/thing.js"]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.root = vec!["./src".to_string()];

    let skipped = format!(
        "{}/node_modules/react-native/Libraries/Core/View.js",
        dir.display()
    );
    assert_eq!(resolver.resolve("thing", &skipped, &o).unwrap(), None);
}

#[test]
fn root_search_produces_a_relative_specifier() {
    let (_tmp, dir) = project(&["src/components/Button.js", "app/index.js"]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.root = vec!["./src".to_string()];

    let current = dir.join("app").join("index.js");
    let result = resolver
        .resolve("components/Button", &current.to_string_lossy(), &o)
        .unwrap();
    assert_eq!(result, Some("../src/components/Button".to_string()));
}

#[test]
fn earlier_root_shadows_later_root() {
    let (_tmp, dir) = project(&["first/shared.js", "second/shared.js", "app.js"]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.root = vec!["./first".to_string(), "./second".to_string()];

    let current = dir.join("app.js");
    let result = resolver
        .resolve("shared", &current.to_string_lossy(), &o)
        .unwrap();
    assert_eq!(result, Some("./first/shared".to_string()));
}

#[test]
fn alias_declaration_order_beats_specificity() {
    let (_tmp, dir) = project(&["app.js"]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.alias = vec![
        ("pkg".to_string(), AliasValue::Template("./general".to_string())),
        (
            "pkg/special".to_string(),
            AliasValue::Template("./specific".to_string()),
        ),
    ];

    let current = dir.join("app.js");
    let result = resolver
        .resolve("pkg/special", &current.to_string_lossy(), &o)
        .unwrap();
    assert_eq!(result, Some("./general/special".to_string()));
}

#[test]
fn regex_alias_chains_into_root_search() {
    let (_tmp, dir) = project(&["src/components/Button.js", "app/index.js"]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.root = vec!["./src".to_string()];
    o.alias = vec![(
        "^ui/(.*)".to_string(),
        AliasValue::Template("components/\\1".to_string()),
    )];

    let current = dir.join("app").join("index.js");
    let result = resolver
        .resolve("ui/Button", &current.to_string_lossy(), &o)
        .unwrap();
    assert_eq!(result, Some("../src/components/Button".to_string()));
}

#[test]
fn function_alias_decides_the_candidate() {
    let (_tmp, dir) = project(&["lib/helpers/fmt.js", "app.js"]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.alias = vec![(
        "^helpers/(.*)".to_string(),
        AliasValue::func(|caps| format!("./lib/helpers/{}", &caps[1])),
    )];

    let current = dir.join("app.js");
    let result = resolver
        .resolve("helpers/fmt", &current.to_string_lossy(), &o)
        .unwrap();
    assert_eq!(result, Some("./lib/helpers/fmt".to_string()));
}

#[test]
fn dedupe_pins_every_resolution_to_the_first_copy() {
    let (_tmp, dir) = project(&[
        "node_modules/left-pad/index.js",
        "packages/app/node_modules/left-pad/index.js",
        "packages/app/src/main.js",
        "top.js",
    ]);
    for pkg in [
        dir.join("node_modules").join("left-pad"),
        dir.join("packages")
            .join("app")
            .join("node_modules")
            .join("left-pad"),
    ] {
        fs::write(
            pkg.join("package.json"),
            r#"{"name": "left-pad", "version": "1.2.0", "main": "index.js"}"#,
        )
        .unwrap();
    }

    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.dedupe = true;

    let deep = dir
        .join("packages")
        .join("app")
        .join("src")
        .join("main.js");
    let first = resolver
        .resolve("left-pad", &deep.to_string_lossy(), &o)
        .unwrap();
    assert_eq!(
        first,
        Some("../node_modules/left-pad/index.js".to_string())
    );

    // the top-level file would normally find its own copy, but the cache
    // redirects it to the one claimed above
    let top = dir.join("top.js");
    let second = resolver.resolve("left-pad", &top.to_string_lossy(), &o).unwrap();
    assert_eq!(
        second,
        Some("./packages/app/node_modules/left-pad/index.js".to_string())
    );
    assert_eq!(resolver.dedupe_cache().len(), 1);

    // resolving again is idempotent
    let again = resolver.resolve("left-pad", &top.to_string_lossy(), &o).unwrap();
    assert_eq!(again, second);
    assert_eq!(resolver.dedupe_cache().len(), 1);
}

#[test]
fn specifier_extension_is_preserved_when_it_matches_the_file() {
    let (_tmp, dir) = project(&["src/util.js", "app.js"]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.root = vec!["./src".to_string()];

    let current = dir.join("app.js");
    assert_eq!(
        resolver.resolve("util.js", &current.to_string_lossy(), &o).unwrap(),
        Some("./src/util.js".to_string())
    );
    assert_eq!(
        resolver.resolve("util", &current.to_string_lossy(), &o).unwrap(),
        Some("./src/util".to_string())
    );
}

#[test]
fn index_files_collapse_to_the_directory() {
    let (_tmp, dir) = project(&["src/store/index.js", "app.js"]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.root = vec!["./src".to_string()];

    let current = dir.join("app.js");
    let result = resolver
        .resolve("store", &current.to_string_lossy(), &o)
        .unwrap();
    assert_eq!(result, Some("./src/store".to_string()));
}

#[test]
fn glob_roots_search_every_matched_package() {
    let (_tmp, dir) = project(&[
        "packages/alpha/src/entry.js",
        "packages/beta/src/other.js",
        "app.js",
    ]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.root = vec!["./packages/*/src".to_string()];

    let current = dir.join("app.js");
    assert_eq!(
        resolver.resolve("entry", &current.to_string_lossy(), &o).unwrap(),
        Some("./packages/alpha/src/entry".to_string())
    );
    assert_eq!(
        resolver.resolve("other", &current.to_string_lossy(), &o).unwrap(),
        Some("./packages/beta/src/other".to_string())
    );
}

#[test]
fn unmatched_specifier_is_left_to_the_platform() {
    let (_tmp, dir) = project(&["src/a.js"]);
    let resolver = Resolver::new();
    let mut o = opts(&dir);
    o.root = vec!["./src".to_string()];

    let current = dir.join("app.js");
    assert_eq!(
        resolver
            .resolve("react-dom", &current.to_string_lossy(), &o)
            .unwrap(),
        None
    );
}
