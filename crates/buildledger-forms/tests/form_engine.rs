//! Integration tests for the form engine
//!
//! Covers:
//! - Stale async results being discarded
//! - Uniqueness checks and store-backed submission
//! - Idempotent full validation

use async_trait::async_trait;
use buildledger_forms::{
    AsyncRule, Collection, FieldChange, FieldRule, FieldValue, FormConfig, FormData, FormHandle,
    FormMetrics, FormSchema, InMemoryStore, RecordStore, Result, StoreSubmitHandler,
    SubmitOutcome, UniqueValueRule,
};
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::Notify;

/// Async rule that blocks until released, then returns a fixed verdict
struct GatedRule {
    started: Arc<Notify>,
    release: Arc<Notify>,
    verdict: bool,
}

#[async_trait]
impl AsyncRule for GatedRule {
    fn name(&self) -> &str {
        "gated"
    }

    async fn check(&self, _: &str, _: &FieldValue, _: &FormData) -> Result<bool> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.verdict)
    }
}

#[tokio::test]
async fn test_stale_async_result_is_discarded() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let schema = FormSchema::new().field(
        "email",
        vec![FieldRule::custom(GatedRule {
            started: started.clone(),
            release: release.clone(),
            verdict: false,
        })
        .with_message("users.email.taken")],
    );

    let registry = prometheus::Registry::new();
    let metrics = Arc::new(FormMetrics::new(&registry).unwrap());
    let form = FormHandle::builder(schema).metrics(metrics.clone()).build();

    form.update_field("email", "ana@obra.com").await;
    let task = tokio::spawn({
        let form = form.clone();
        async move { form.process_next_batch().await }
    });

    started.notified().await;
    assert!(form.is_pending("email").await);

    // user keeps typing while the check for the old value is in flight
    form.update_field("email", "luis@obra.com").await;
    release.notify_one();

    // the old value's result is dropped and the new value is not yet checked
    let outcome = task.await.unwrap().unwrap().unwrap();
    assert!(!outcome.is_valid);
    assert!(outcome.errors.is_empty());
    assert!(form.error("email").await.is_none());
    assert!(!form.is_pending("email").await);
    assert_eq!(metrics.stale_results(), 1);

    // the newer batch is still queued and its result does apply
    assert_eq!(form.pending_batches().await, 1);
    release.notify_one();
    let outcome = form.process_next_batch().await.unwrap().unwrap();
    assert!(!outcome.is_valid);
    assert_eq!(form.error("email").await.as_deref(), Some("users.email.taken"));
}

fn gated_email_form(
    store: Arc<InMemoryStore>,
    started: &Arc<Notify>,
    release: &Arc<Notify>,
) -> FormHandle {
    let schema = FormSchema::new().field(
        "email",
        vec![
            FieldRule::email(),
            FieldRule::custom(GatedRule {
                started: started.clone(),
                release: release.clone(),
                verdict: true,
            }),
        ],
    );

    FormHandle::builder(schema)
        .initial_data(FormData::new().with("email", "ana@obra.com"))
        .on_submit(StoreSubmitHandler::create(store, Collection::Users))
        .build()
}

#[tokio::test]
async fn test_submit_does_not_store_value_changed_during_validation() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let store = Arc::new(InMemoryStore::new());
    let form = gated_email_form(store.clone(), &started, &release);

    let task = tokio::spawn({
        let form = form.clone();
        async move { form.submit().await }
    });

    started.notified().await;
    form.update_field("email", "not-an-email").await;
    release.notify_one();

    match task.await.unwrap().unwrap() {
        SubmitOutcome::Blocked { errors } => {
            assert_eq!(errors.get("email").map(String::as_str), Some("validation.email"))
        }
        other => panic!("expected blocked submit, got {:?}", other),
    }
    assert_eq!(store.count(Collection::Users).await, 0);
}

#[tokio::test]
async fn test_submit_stores_the_value_it_validated() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let store = Arc::new(InMemoryStore::new());
    let form = gated_email_form(store.clone(), &started, &release);

    let task = tokio::spawn({
        let form = form.clone();
        async move { form.submit().await }
    });

    started.notified().await;
    form.update_field("email", "luis@obra.com").await;
    release.notify_one();

    // the re-run checks the new value
    started.notified().await;
    release.notify_one();

    let record = match task.await.unwrap().unwrap() {
        SubmitOutcome::Submitted { record } => record.unwrap(),
        other => panic!("expected submission, got {:?}", other),
    };
    assert_eq!(record.data.get("email"), &FieldValue::from("luis@obra.com"));
    assert_eq!(store.count(Collection::Users).await, 1);
}

#[tokio::test]
async fn test_two_batches_validated_in_call_order() {
    let schema = FormSchema::new()
        .field("name", vec![FieldRule::required()])
        .field("unit", vec![FieldRule::required()]);
    let form = FormHandle::new(schema, FormConfig::default());

    form.update_field("name", "").await;
    form.update_field("unit", "").await;
    assert_eq!(form.pending_batches().await, 2);

    form.process_next_batch().await.unwrap();
    let errors = form.errors().await;
    assert!(errors.contains_key("name"));
    assert!(!errors.contains_key("unit"));

    form.process_next_batch().await.unwrap();
    let errors = form.errors().await;
    assert!(errors.contains_key("name"));
    assert!(errors.contains_key("unit"));
}

#[tokio::test]
async fn test_unique_email_and_store_submission() {
    let store = Arc::new(InMemoryStore::new());
    store
        .create(Collection::Users, FormData::new().with("email", "ana@obra.com"))
        .await
        .unwrap();

    let schema = FormSchema::new()
        .field(
            "email",
            vec![
                FieldRule::required(),
                FieldRule::email(),
                FieldRule::custom(UniqueValueRule::new(store.clone(), Collection::Users))
                    .with_message("users.email.taken"),
            ],
        )
        .field("name", vec![FieldRule::required()]);

    let form = FormHandle::builder(schema)
        .on_submit(StoreSubmitHandler::create(store.clone(), Collection::Users))
        .build();

    form.update_fields([
        FieldChange::new("email", "ana@obra.com"),
        FieldChange::new("name", "Ana"),
    ])
    .await;
    form.flush().await.unwrap();
    assert_eq!(form.error("email").await.as_deref(), Some("users.email.taken"));

    match form.submit().await.unwrap() {
        SubmitOutcome::Blocked { errors } => assert!(errors.contains_key("email")),
        other => panic!("expected blocked submit, got {:?}", other),
    }
    assert_eq!(store.count(Collection::Users).await, 1);

    form.update_field("email", "luis@obra.com").await;
    form.flush().await.unwrap();
    assert!(form.errors().await.is_empty());

    let record = match form.submit().await.unwrap() {
        SubmitOutcome::Submitted { record } => record.unwrap(),
        other => panic!("expected submission, got {:?}", other),
    };
    assert_eq!(record.data.get("email"), &FieldValue::from("luis@obra.com"));
    assert_eq!(store.count(Collection::Users).await, 2);

    let stored = store.get(Collection::Users, record.id).await.unwrap().unwrap();
    assert_eq!(stored.data.get("name"), &FieldValue::from("Ana"));
}

fn material_schema() -> FormSchema {
    FormSchema::new()
        .field("name", vec![FieldRule::required(), FieldRule::max_length(12)])
        .field("unit", vec![FieldRule::one_of(["kg", "m3", "u"])])
        .field("cost", vec![FieldRule::when(
            "hasSubMaterials",
            false,
            vec![FieldRule::required(), FieldRule::positive()],
            vec![],
        )])
}

proptest! {
    #[test]
    fn prop_validate_all_is_idempotent(
        name in proptest::option::of("[a-z ]{0,20}"),
        unit in proptest::option::of(prop_oneof![Just("kg"), Just("m3"), Just("t")]),
        cost in proptest::option::of(-100.0f64..100.0),
        has_sub in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let data = FormData::new()
                .with("name", name)
                .with("unit", unit)
                .with("cost", cost)
                .with("hasSubMaterials", has_sub);
            let form = FormHandle::builder(material_schema()).initial_data(data).build();

            let first = form.validate_all(None).await.unwrap();
            let second = form.validate_all(None).await.unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.is_valid, first.errors.is_empty());
            Ok(())
        })?;
    }
}
