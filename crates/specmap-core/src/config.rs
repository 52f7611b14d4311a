//! On-disk configuration for specmap.
//!
//! A JSON mirror of [`Options`] for callers that configure the resolver
//! from a file: alias values can only be template strings here, and the
//! `resolvePath` escape hatch is unavailable.

use crate::error::Error;
use crate::options::{AliasValue, CwdSource, Options};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One value or a list of values; both spellings are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Raw configuration as read from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RawConfig {
    /// Literal path, or the strategy names `"babelrc"` / `"packagejson"`.
    pub cwd: Option<String>,
    pub root: Option<OneOrMany<String>>,
    /// Alias maps; key order within a map is declaration order.
    pub alias: Option<OneOrMany<serde_json::Map<String, Value>>>,
    pub alias_fields: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
    pub strip_extensions: Option<Vec<String>>,
    pub transform_functions: Option<Vec<String>>,
    pub dedupe: Option<bool>,
    pub skip_paths: Option<Vec<String>>,
}

impl RawConfig {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Convert into resolver [`Options`], validating alias values.
    pub fn into_options(self) -> Result<Options, Error> {
        let defaults = Options::default();

        let cwd = self.cwd.map(|cwd| match cwd.as_str() {
            "babelrc" => CwdSource::Babelrc,
            "packagejson" => CwdSource::PackageJson,
            literal => CwdSource::Literal(PathBuf::from(literal)),
        });

        let mut alias = Vec::new();
        for map in self.alias.map(OneOrMany::into_vec).unwrap_or_default() {
            for (key, value) in map {
                let Value::String(template) = value else {
                    return Err(Error::other(format!(
                        "alias value for {key:?} must be a string"
                    )));
                };
                alias.push((key, AliasValue::Template(template)));
            }
        }

        Ok(Options {
            cwd,
            root: self.root.map(OneOrMany::into_vec).unwrap_or_default(),
            alias,
            alias_fields: self.alias_fields.unwrap_or_default(),
            extensions: self.extensions.unwrap_or_default(),
            strip_extensions: self.strip_extensions,
            transform_functions: self.transform_functions.unwrap_or_default(),
            dedupe: self.dedupe.unwrap_or(false),
            skip_paths: self.skip_paths.unwrap_or(defaults.skip_paths),
            resolve_path: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_and_convert() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("specmap.json");
        fs::write(
            &path,
            r#"{
                "cwd": "packagejson",
                "root": "./src",
                "alias": {"ui": "./src/ui", "^lib/(.*)": "./lib/\\1"},
                "extensions": [".js", ".jsx"],
                "dedupe": true
            }"#,
        )
        .unwrap();

        let opts = RawConfig::load(&path).unwrap().into_options().unwrap();
        assert_eq!(opts.cwd, Some(CwdSource::PackageJson));
        assert_eq!(opts.root, vec!["./src".to_string()]);
        assert_eq!(opts.alias.len(), 2);
        assert_eq!(opts.alias[0].0, "ui");
        assert!(opts.dedupe);
        assert_eq!(opts.extensions, vec![".js".to_string(), ".jsx".to_string()]);
    }

    #[test]
    fn test_literal_cwd() {
        let raw = RawConfig {
            cwd: Some("/somewhere".to_string()),
            ..Default::default()
        };
        let opts = raw.into_options().unwrap();
        assert_eq!(opts.cwd, Some(CwdSource::Literal(PathBuf::from("/somewhere"))));
    }

    #[test]
    fn test_non_string_alias_value_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("specmap.json");
        fs::write(&path, r#"{"alias": {"ui": 42}}"#).unwrap();

        let result = RawConfig::load(&path).unwrap().into_options();
        assert!(matches!(result, Err(Error::Other(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("specmap.json");
        fs::write(&path, r#"{"rooot": "./src"}"#).unwrap();

        assert!(matches!(
            RawConfig::load(&path),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RawConfig::load(Path::new("/no/such/specmap.json")),
            Err(Error::ConfigRead { .. })
        ));
    }
}
