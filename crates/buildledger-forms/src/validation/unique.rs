//! Uniqueness check against the record store

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::schema::AsyncRule;
use crate::store::{Collection, RecordStore};
use crate::value::{FieldValue, FormData};

/// Passes when no other record in `collection` holds the same value
pub struct UniqueValueRule {
    store: Arc<dyn RecordStore>,
    collection: Collection,
    /// Field name in the stored records, when it differs from the form's
    stored_field: Option<String>,
    /// Record being edited; it never conflicts with itself
    exclude_id: Option<Uuid>,
}

impl UniqueValueRule {
    pub fn new(store: Arc<dyn RecordStore>, collection: Collection) -> Self {
        Self {
            store,
            collection,
            stored_field: None,
            exclude_id: None,
        }
    }

    pub fn stored_as(mut self, field: impl Into<String>) -> Self {
        self.stored_field = Some(field.into());
        self
    }

    pub fn excluding(mut self, id: Uuid) -> Self {
        self.exclude_id = Some(id);
        self
    }
}

#[async_trait]
impl AsyncRule for UniqueValueRule {
    fn name(&self) -> &str {
        "unique"
    }

    async fn check(&self, field: &str, value: &FieldValue, _data: &FormData) -> Result<bool> {
        let lookup = self.stored_field.as_deref().unwrap_or(field);
        let matches = self.store.find_by_field(self.collection, lookup, value).await?;
        Ok(matches.iter().all(|r| Some(r.id) == self.exclude_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldRule, FormSchema};
    use crate::store::InMemoryStore;
    use crate::validation::validate_field;

    #[tokio::test]
    async fn test_unique_value() {
        let store = Arc::new(InMemoryStore::new());
        let existing = store
            .create(Collection::Users, FormData::new().with("email", "ana@obra.com"))
            .await
            .unwrap();

        let rule = UniqueValueRule::new(store.clone(), Collection::Users);
        let taken = FieldValue::from("ana@obra.com");
        let free = FieldValue::from("luis@obra.com");
        assert!(!rule.check("email", &taken, &FormData::new()).await.unwrap());
        assert!(rule.check("email", &free, &FormData::new()).await.unwrap());

        let editing = UniqueValueRule::new(store.clone(), Collection::Users).excluding(existing.id);
        assert!(editing.check("email", &taken, &FormData::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_unique_in_schema_with_stored_name() {
        let store = Arc::new(InMemoryStore::new());
        store
            .create(Collection::Materials, FormData::new().with("code", "MAT-001"))
            .await
            .unwrap();

        let schema = FormSchema::new().field(
            "materialCode",
            vec![
                FieldRule::required(),
                FieldRule::custom(UniqueValueRule::new(store, Collection::Materials).stored_as("code"))
                    .with_message("materials.code.taken"),
            ],
        );

        let data = FormData::new().with("materialCode", "MAT-001");
        let message = validate_field(&data, &schema, "materialCode").await.unwrap();
        assert_eq!(message.as_deref(), Some("materials.code.taken"));
    }
}
