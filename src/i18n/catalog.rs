//! Locale catalog backed by JSON message files.
//!
//! One `<locale>.json` file per locale in the catalog directory, each a flat
//! map from message key to translated string. The loaded state is an
//! immutable snapshot behind an `ArcSwap`: `reload` builds a fresh snapshot
//! and swaps it in atomically, so any number of in-flight requests can read
//! (and concurrently reload) without locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

/// Messages for a single locale.
pub type Messages = Arc<HashMap<String, String>>;

type Snapshot = HashMap<String, Messages>;

/// Error type for catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed locale file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Reloadable collection of per-locale message maps.
pub struct Catalog {
    dir: PathBuf,
    default_locale: String,
    snapshot: ArcSwap<Snapshot>,
}

impl Catalog {
    /// Create an empty catalog over a directory. Call [`Catalog::reload`] to
    /// populate it.
    pub fn new(dir: impl Into<PathBuf>, default_locale: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_locale: default_locale.into(),
            snapshot: ArcSwap::from_pointee(Snapshot::new()),
        }
    }

    /// Re-read every locale file and atomically swap in the new snapshot.
    /// On error the previous snapshot stays in place.
    pub fn reload(&self) -> Result<(), CatalogError> {
        let mut snapshot = Snapshot::new();

        let entries = std::fs::read_dir(&self.dir).map_err(|source| CatalogError::Io {
            path: self.dir.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let messages = load_locale_file(&path)?;
            snapshot.insert(locale.to_string(), Arc::new(messages));
        }

        self.snapshot.store(Arc::new(snapshot));
        Ok(())
    }

    /// All messages for a locale, falling back to the default locale, then
    /// to an empty map. Returns a snapshot reference; later reloads do not
    /// affect it.
    pub fn messages(&self, locale: &str) -> Messages {
        let snapshot = self.snapshot.load();
        snapshot
            .get(locale)
            .or_else(|| snapshot.get(&self.default_locale))
            .cloned()
            .unwrap_or_default()
    }

}

fn load_locale_file(path: &Path) -> Result<HashMap<String, String>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn catalog_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let catalog = Catalog::new(dir.path(), "en_US");
        catalog.reload().unwrap();
        (dir, catalog)
    }

    #[test]
    fn loads_and_looks_up() {
        let (_dir, catalog) = catalog_with(&[
            ("en_US.json", r#"{"greeting": "Hello"}"#),
            ("zh_CN.json", r#"{"greeting": "你好"}"#),
        ]);
        assert_eq!(catalog.messages("zh_CN").get("greeting").unwrap(), "你好");
        assert_eq!(catalog.messages("en_US").get("greeting").unwrap(), "Hello");
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let (_dir, catalog) = catalog_with(&[("en_US.json", r#"{"greeting": "Hello"}"#)]);
        assert_eq!(catalog.messages("fr_FR").get("greeting").unwrap(), "Hello");
    }

    #[test]
    fn reload_picks_up_changes() {
        let (dir, catalog) = catalog_with(&[("en_US.json", r#"{"greeting": "Hello"}"#)]);

        // Old snapshot handles survive the swap untouched.
        let before = catalog.messages("en_US");

        fs::write(dir.path().join("en_US.json"), r#"{"greeting": "Howdy"}"#).unwrap();
        catalog.reload().unwrap();

        assert_eq!(before.get("greeting").unwrap(), "Hello");
        assert_eq!(catalog.messages("en_US").get("greeting").unwrap(), "Howdy");
    }

    #[test]
    fn malformed_file_keeps_previous_snapshot() {
        let (dir, catalog) = catalog_with(&[("en_US.json", r#"{"greeting": "Hello"}"#)]);

        fs::write(dir.path().join("en_US.json"), "not json").unwrap();
        assert!(catalog.reload().is_err());
        assert_eq!(catalog.messages("en_US").get("greeting").unwrap(), "Hello");
    }
}
