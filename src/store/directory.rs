//! Directory-backed store
//!
//! Layout under the store location:
//!
//! ```text
//! <location>/<database>/<resource>.json
//! ```
//!
//! Each resource file holds the full revision history:
//!
//! ```json
//! {"revisions": [{"timestamp": "2024-05-01T10:00:00Z",
//!                 "nodes": [{"id": 1, "name": "a", "children": [{"id": 2, "text": "x"}]}]}]}
//! ```
//!
//! Files are read when a resource is opened; nothing is cached between
//! requests.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use super::errors::{StoreError, StoreResult};
use super::lease::{HandleKind, HandleRegistry, Lease};
use super::resource::{Resource, ResourceManager, RevisionSpec};
use super::{Database, Store};

/// Extension of resource files
pub const RESOURCE_EXTENSION: &str = "json";

#[derive(Debug, Deserialize)]
struct ResourceFile {
    revisions: Vec<RevisionSpec>,
}

/// Store rooted at a directory
#[derive(Debug)]
pub struct DirectoryStore {
    location: PathBuf,
    registry: Arc<HandleRegistry>,
}

impl DirectoryStore {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            registry: HandleRegistry::new(),
        }
    }
}

/// Database and resource names map straight onto path components, so
/// anything that could escape the store location is treated as unknown.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\')
        && !name.starts_with('.')
}

impl Store for DirectoryStore {
    fn list_databases(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.location)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if is_plain_name(name) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        Ok(names)
    }

    fn open_database(&self, name: &str) -> StoreResult<Box<dyn Database>> {
        let path = self.location.join(name);
        if !is_plain_name(name) || !path.is_dir() {
            return Err(StoreError::DatabaseNotFound(name.to_string()));
        }

        Ok(Box::new(DirectoryDatabase {
            name: name.to_string(),
            path,
            lease: Lease::acquire(&self.registry, HandleKind::Database),
        }))
    }

    fn handles(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }
}

struct DirectoryDatabase {
    name: String,
    path: PathBuf,
    lease: Lease,
}

impl DirectoryDatabase {
    fn resource_path(&self, resource: &str) -> PathBuf {
        self.path.join(format!("{}.{}", resource, RESOURCE_EXTENSION))
    }
}

impl Database for DirectoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_resources(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(RESOURCE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if is_plain_name(stem) {
                    names.push(stem.to_string());
                }
            }
        }
        Ok(names)
    }

    fn open_resource(&self, name: &str) -> StoreResult<ResourceManager> {
        let path = self.resource_path(name);
        if !is_plain_name(name) || !path.is_file() {
            return Err(StoreError::ResourceNotFound {
                database: self.name.clone(),
                resource: name.to_string(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let file: ResourceFile = serde_json::from_str(&content)?;
        let resource = Resource::from_specs(name, &file.revisions)?;

        Ok(ResourceManager::open(
            self.lease.registry(),
            self.name.clone(),
            Arc::new(resource),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKS: &str = r#"{"revisions": [
        {"timestamp": "2024-05-01T10:00:00Z", "nodes": [{"id": 1, "name": "books"}]},
        {"timestamp": "2024-05-02T10:00:00Z",
         "nodes": [{"id": 1, "name": "books", "children": [{"id": 2, "name": "book"}]}]}
    ]}"#;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("library")).unwrap();
        fs::create_dir(dir.path().join("archive")).unwrap();
        fs::write(dir.path().join("library").join("books.json"), BOOKS).unwrap();
        fs::write(dir.path().join("library").join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("stray.json"), "{}").unwrap();
        dir
    }

    #[test]
    fn test_list_databases_only_directories() {
        let dir = fixture();
        let store = DirectoryStore::new(dir.path());
        let mut names = store.list_databases().unwrap();
        names.sort();
        assert_eq!(names, vec!["archive", "library"]);
    }

    #[test]
    fn test_open_resource_reads_history() {
        let dir = fixture();
        let store = DirectoryStore::new(dir.path());
        let db = store.open_database("library").unwrap();
        assert_eq!(db.list_resources().unwrap(), vec!["books"]);

        let manager = db.open_resource("books").unwrap();
        assert_eq!(manager.most_recent_revision_number(), 2);
        let trx = manager.begin_read(2).unwrap();
        assert!(trx.revision().contains(2));
    }

    #[test]
    fn test_unknown_names_are_usage_errors() {
        let dir = fixture();
        let store = DirectoryStore::new(dir.path());
        assert!(store.open_database("missing").err().unwrap().is_usage_error());
        assert!(store.open_database("..").err().unwrap().is_usage_error());

        let db = store.open_database("library").unwrap();
        assert!(db.open_resource("notes").unwrap_err().is_usage_error());
        assert!(db.open_resource("../stray").unwrap_err().is_usage_error());
    }

    #[test]
    fn test_malformed_resource_is_invalid_data() {
        let dir = fixture();
        fs::write(dir.path().join("archive").join("broken.json"), "{\"revisions\": 3}").unwrap();
        let store = DirectoryStore::new(dir.path());
        let db = store.open_database("archive").unwrap();
        let err = db.open_resource("broken").unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        drop(db);
        assert!(store.handles().snapshot().is_empty());
    }
}
