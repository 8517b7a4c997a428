//! File-backed catalog store

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::errors::CatalogError;

/// Selector catalog backed by a JSON file on disk.
///
/// The in-memory map is the source of truth between mutations; every
/// `promote` rewrites the full file before returning, so a crash immediately
/// after a discovery does not lose the learned selector. The file is
/// single-writer state: callers must not promote concurrently from multiple
/// processes.
#[derive(Debug)]
pub struct SelectorCatalog {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Vec<String>>>,
}

impl SelectorCatalog {
    /// Load the catalog from its durable store.
    ///
    /// A missing or malformed file is a hard error; there is no safe default
    /// to fall back to.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: path.clone(),
            source,
        })?;

        let entries: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Malformed {
                path: path.clone(),
                source,
            })?;

        info!(
            "Loaded selector catalog from {} ({} keys)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the durable store backing this catalog.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Selector list for `key`, in priority order, or `None` when the key is
    /// unknown. An empty list means "key present, nothing learned yet" and is
    /// distinct from absence.
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        self.entries.read().get(key).cloned()
    }

    /// Whether the catalog knows `key` at all.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// All known keys, in stable order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Full snapshot of the catalog, for inspection tooling.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.entries.read().clone()
    }

    /// Move `selector` to the front of `key`'s list and flush the catalog to
    /// disk before returning.
    ///
    /// A selector already present elsewhere in the list is deduplicated
    /// rather than duplicated at the front, so repeated discovery runs keep
    /// the list bounded; promoting the current front selector leaves the
    /// persisted content unchanged.
    pub fn promote(&self, key: &str, selector: &str) -> Result<(), CatalogError> {
        let mut entries = self.entries.write();
        let list = entries.entry(key.to_string()).or_default();
        list.retain(|existing| existing != selector);
        list.insert(0, selector.to_string());

        debug!(
            "Promoted selector for {}: {} ({} entries)",
            key,
            selector,
            list.len()
        );

        Self::persist(&self.path, &entries)
    }

    fn persist(
        path: &Path,
        entries: &BTreeMap<String, Vec<String>>,
    ) -> Result<(), CatalogError> {
        let content = serde_json::to_string_pretty(entries).map_err(CatalogError::Encode)?;
        std::fs::write(path, content).map_err(|source| CatalogError::Persist {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn seed_catalog(json: &str) -> (NamedTempFile, SelectorCatalog) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let catalog = SelectorCatalog::load(file.path()).unwrap();
        (file, catalog)
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = SelectorCatalog::load("/nonexistent/locators.json");
        assert!(matches!(result, Err(CatalogError::Read { .. })));
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let result = SelectorCatalog::load(file.path());
        assert!(matches!(result, Err(CatalogError::Malformed { .. })));
    }

    #[test]
    fn test_get_distinguishes_absence_from_empty() {
        let (_file, catalog) = seed_catalog(r#"{"searchBar": []}"#);
        assert_eq!(catalog.get("searchBar"), Some(Vec::new()));
        assert_eq!(catalog.get("searchButton"), None);
    }

    #[test]
    fn test_promote_front_inserts_and_persists() {
        let (file, catalog) = seed_catalog(
            r##"{"searchBar": ["#twotabsearchtextbox", "input[name=field-keywords]"]}"##,
        );

        catalog.promote("searchBar", "input[type=\"search\"]").unwrap();

        // Reloading from disk must reproduce the promoted order exactly.
        let reloaded = SelectorCatalog::load(file.path()).unwrap();
        assert_eq!(
            reloaded.get("searchBar").unwrap(),
            vec![
                "input[type=\"search\"]",
                "#twotabsearchtextbox",
                "input[name=field-keywords]",
            ]
        );
    }

    #[test]
    fn test_promote_existing_selector_deduplicates() {
        let (file, catalog) =
            seed_catalog(r##"{"searchBar": ["#a", "#b", "#c"]}"##);

        catalog.promote("searchBar", "#c").unwrap();

        let reloaded = SelectorCatalog::load(file.path()).unwrap();
        assert_eq!(reloaded.get("searchBar").unwrap(), vec!["#c", "#a", "#b"]);
    }

    #[test]
    fn test_promote_front_selector_is_idempotent() {
        let (file, catalog) = seed_catalog(r##"{"searchBar": ["#a", "#b"]}"##);

        catalog.promote("searchBar", "#a").unwrap();
        catalog.promote("searchBar", "#a").unwrap();

        let reloaded = SelectorCatalog::load(file.path()).unwrap();
        assert_eq!(reloaded.get("searchBar").unwrap(), vec!["#a", "#b"]);
    }

    #[test]
    fn test_promote_unknown_key_creates_entry() {
        let (file, catalog) = seed_catalog(r#"{}"#);

        catalog.promote("productTitle", ".s-result-item h2").unwrap();

        let reloaded = SelectorCatalog::load(file.path()).unwrap();
        assert_eq!(
            reloaded.get("productTitle").unwrap(),
            vec![".s-result-item h2"]
        );
    }
}
