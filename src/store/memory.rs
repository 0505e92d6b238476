//! In-memory store
//!
//! Databases and resources are registered up front and never change
//! afterwards, which matches the read-only access the gateway needs.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::errors::{StoreError, StoreResult};
use super::lease::{HandleKind, HandleRegistry, Lease};
use super::resource::{Resource, ResourceManager};
use super::{Database, Store};

type ResourceMap = BTreeMap<String, Arc<Resource>>;

/// Store holding every resource in memory
#[derive(Debug)]
pub struct MemoryStore {
    databases: RwLock<BTreeMap<String, Arc<ResourceMap>>>,
    registry: Arc<HandleRegistry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            databases: RwLock::new(BTreeMap::new()),
            registry: HandleRegistry::new(),
        }
    }

    /// Register an empty database (no-op if it exists)
    pub fn create_database(&self, name: impl Into<String>) -> StoreResult<()> {
        let mut databases = self
            .databases
            .write()
            .map_err(|_| StoreError::InvalidData("store lock poisoned".to_string()))?;
        databases
            .entry(name.into())
            .or_insert_with(|| Arc::new(BTreeMap::new()));
        Ok(())
    }

    /// Add or replace a resource, creating the database when needed
    pub fn insert_resource(&self, database: &str, resource: Resource) -> StoreResult<()> {
        let mut databases = self
            .databases
            .write()
            .map_err(|_| StoreError::InvalidData("store lock poisoned".to_string()))?;
        let entry = databases
            .entry(database.to_string())
            .or_insert_with(|| Arc::new(BTreeMap::new()));
        Arc::make_mut(entry).insert(resource.name().to_string(), Arc::new(resource));
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn list_databases(&self) -> StoreResult<Vec<String>> {
        let databases = self
            .databases
            .read()
            .map_err(|_| StoreError::InvalidData("store lock poisoned".to_string()))?;
        Ok(databases.keys().cloned().collect())
    }

    fn open_database(&self, name: &str) -> StoreResult<Box<dyn Database>> {
        let databases = self
            .databases
            .read()
            .map_err(|_| StoreError::InvalidData("store lock poisoned".to_string()))?;
        let resources = databases
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::DatabaseNotFound(name.to_string()))?;

        Ok(Box::new(MemoryDatabase {
            name: name.to_string(),
            resources,
            lease: Lease::acquire(&self.registry, HandleKind::Database),
        }))
    }

    fn handles(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }
}

/// Database handle over a snapshot of the resource map
struct MemoryDatabase {
    name: String,
    resources: Arc<ResourceMap>,
    lease: Lease,
}

impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_resources(&self) -> StoreResult<Vec<String>> {
        Ok(self.resources.keys().cloned().collect())
    }

    fn open_resource(&self, name: &str) -> StoreResult<ResourceManager> {
        let resource = self
            .resources
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::ResourceNotFound {
                database: self.name.clone(),
                resource: name.to_string(),
            })?;
        Ok(ResourceManager::open(
            self.lease.registry(),
            self.name.clone(),
            resource,
        ))
    }
}
