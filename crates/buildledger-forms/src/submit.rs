//! On-submit collaborators

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{FormError, Result};
use crate::store::{Collection, RecordStore, StoredRecord};
use crate::value::{ErrorMap, FormData};

/// Receives validated form data on submit
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// Returns the stored record when the handler persists one
    async fn submit(&self, data: FormData) -> Result<Option<StoredRecord>>;
}

/// Result of [`FormHandle::submit`](crate::FormHandle::submit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Data was valid and handed to the submit handler
    Submitted { record: Option<StoredRecord> },
    /// Validation failed; nothing was submitted
    Blocked { errors: ErrorMap },
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted { .. })
    }
}

/// Writes submitted data into a store collection
///
/// Creates a record, or replaces an existing one when editing.
pub struct StoreSubmitHandler {
    store: Arc<dyn RecordStore>,
    collection: Collection,
    record_id: Option<Uuid>,
}

impl StoreSubmitHandler {
    pub fn create(store: Arc<dyn RecordStore>, collection: Collection) -> Self {
        Self {
            store,
            collection,
            record_id: None,
        }
    }

    pub fn update(store: Arc<dyn RecordStore>, collection: Collection, id: Uuid) -> Self {
        Self {
            store,
            collection,
            record_id: Some(id),
        }
    }
}

#[async_trait]
impl SubmitHandler for StoreSubmitHandler {
    async fn submit(&self, data: FormData) -> Result<Option<StoredRecord>> {
        let stored = match self.record_id {
            Some(id) => self.store.update(self.collection, id, data).await,
            None => self.store.create(self.collection, data).await,
        };
        let record = stored.map_err(|e| {
            FormError::submission(format!("{} record was not stored: {}", self.collection, e))
        })?;
        info!(collection = %self.collection, id = %record.id, "form data stored");
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_store_handler_creates_then_updates() {
        let store = Arc::new(InMemoryStore::new());

        let create = StoreSubmitHandler::create(store.clone(), Collection::Budgets);
        let record = create
            .submit(FormData::new().with("name", "Tower A"))
            .await
            .unwrap()
            .unwrap();

        let update = StoreSubmitHandler::update(store.clone(), Collection::Budgets, record.id);
        let updated = update
            .submit(FormData::new().with("name", "Tower A (rev 2)"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, record.id);
        assert_eq!(store.count(Collection::Budgets).await, 1);
    }

    #[tokio::test]
    async fn test_update_of_missing_record_is_submission_error() {
        let store = Arc::new(InMemoryStore::new());
        let handler = StoreSubmitHandler::update(store, Collection::Materials, Uuid::new_v4());

        let err = handler
            .submit(FormData::new().with("name", "Rebar"))
            .await
            .unwrap_err();
        assert!(matches!(err, FormError::Submission(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = SubmitOutcome::Blocked {
            errors: [("name".to_string(), "validation.required".to_string())].into_iter().collect(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "blocked");
        assert_eq!(json["errors"]["name"], "validation.required");
        assert!(!outcome.is_submitted());
    }
}
