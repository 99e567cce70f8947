//! JSON and TOML data files as modules.

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};

use super::Loader;
use crate::module::{Export, Value};

/// Loads `.json` and `.toml` files as a plain [`Export::Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DataLoader;

impl Loader for DataLoader {
    fn load(&self, path: &Path) -> anyhow::Result<Export> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;

        let value: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in `{}`", path.display()))?,
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("invalid TOML in `{}`", path.display()))?,
            Some(other) => bail!("unsupported module type `.{other}`"),
            None => bail!("module `{}` has no extension", path.display()),
        };

        Ok(Export::Value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("answer.json");
        fs::write(&path, r#"{ "answer": 42 }"#).unwrap();

        let export = DataLoader.load(&path).unwrap();
        assert_eq!(export.as_value(), Some(&json!({ "answer": 42 })));
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site.toml");
        fs::write(&path, "title = \"blog\"\n[serve]\nport = 5277\n").unwrap();

        let export = DataLoader.load(&path).unwrap();
        assert_eq!(export.get("title").unwrap().as_value(), Some(&json!("blog")));
        assert_eq!(
            export.get("serve").unwrap().as_value(),
            Some(&json!({ "port": 5277 }))
        );
    }

    #[test]
    fn test_syntax_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"{ "answer": "#).unwrap();

        let err = DataLoader.load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = DataLoader.load(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("module.ts");
        fs::write(&path, "export const answer = 42").unwrap();

        let err = DataLoader.load(&path).unwrap_err();
        assert!(err.to_string().contains(".ts"));
    }
}
