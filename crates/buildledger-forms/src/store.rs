//! Record store collaborator
//!
//! The boundary to whatever persists users, materials, budgets and orders.
//! Forms never call it directly; it is reached through submit handlers and
//! async rules such as [`UniqueValueRule`](crate::validation::UniqueValueRule).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{FormError, Result};
use crate::value::{FieldValue, FormData};

/// Entity collections managed by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Materials,
    Budgets,
    Orders,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Users => write!(f, "users"),
            Collection::Materials => write!(f, "materials"),
            Collection::Budgets => write!(f, "budgets"),
            Collection::Orders => write!(f, "orders"),
        }
    }
}

/// A persisted record with its store-assigned id and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    pub collection: Collection,
    pub data: FormData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// CRUD contract of the persistence collaborator
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(&self, collection: Collection, data: FormData) -> Result<StoredRecord>;

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<StoredRecord>>;

    /// Replace a record's data; fails with `NotFound` for unknown ids
    async fn update(&self, collection: Collection, id: Uuid, data: FormData) -> Result<StoredRecord>;

    /// Returns whether a record was removed
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool>;

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &FieldValue,
    ) -> Result<Vec<StoredRecord>>;
}

/// Process-local store, used by tests and the CLI
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<Collection, BTreeMap<Uuid, StoredRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection
    pub async fn count(&self, collection: Collection) -> usize {
        self.records
            .read()
            .await
            .get(&collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create(&self, collection: Collection, data: FormData) -> Result<StoredRecord> {
        let now = Utc::now();
        let record = StoredRecord {
            id: Uuid::new_v4(),
            collection,
            data,
            created_at: now,
            updated_at: now,
        };

        self.records
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(record.id, record.clone());

        debug!(%collection, id = %record.id, "record created");
        Ok(record)
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<StoredRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&collection)
            .and_then(|records| records.get(&id))
            .cloned())
    }

    async fn update(&self, collection: Collection, id: Uuid, data: FormData) -> Result<StoredRecord> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&collection)
            .and_then(|records| records.get_mut(&id))
            .ok_or_else(|| FormError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        record.data = data;
        record.updated_at = Utc::now();
        debug!(%collection, %id, "record updated");
        Ok(record.clone())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool> {
        let removed = self
            .records
            .write()
            .await
            .get_mut(&collection)
            .and_then(|records| records.remove(&id))
            .is_some();
        Ok(removed)
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &FieldValue,
    ) -> Result<Vec<StoredRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&collection)
            .map(|records| {
                records
                    .values()
                    .filter(|r| r.data.get(field) == value)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
