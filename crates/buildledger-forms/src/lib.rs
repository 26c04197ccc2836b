//! BuildLedger form engine
//!
//! Form state and schema validation shared by every BuildLedger admin screen
//! (users, materials, budgets, orders).
//!
//! ## Architecture
//!
//! 1. **Values** (`value`): the open data bag of a form and its error map.
//!
//! 2. **Schema** (`schema`): declarative per-field rules, loadable from
//!    YAML/JSON/TOML, plus code-only async rules.
//!
//! 3. **Validation** (`validation`): whole-schema and per-field evaluation.
//!
//! 4. **Engine** (`engine`): the [`FormHandle`] that owns data, errors and the
//!    queue of touched batches awaiting validation.
//!
//! 5. **Config** (`config`): validate-on-change / on-blur triggers and field
//!    groups.
//!
//! 6. **Store** (`store`) and **Submit** (`submit`): the boundary to the
//!    persistence collaborator.
//!
//! ## Example
//!
//! ```rust,no_run
//! use buildledger_forms::{FieldRule, FormConfig, FormHandle, FormSchema};
//!
//! #[tokio::main]
//! async fn main() {
//!     let schema = FormSchema::new()
//!         .field("id", vec![FieldRule::group_required(["id", "email"])])
//!         .field("email", vec![FieldRule::group_required(["id", "email"]), FieldRule::email()]);
//!     let config = FormConfig::builder()
//!         .field_group("email", ["id"])
//!         .field_group("id", ["email"])
//!         .build();
//!
//!     let form = FormHandle::new(schema, config);
//!     form.update_field("email", "ana@obra.com").await;
//!     form.process_next_batch().await.unwrap();
//!
//!     let outcome = form.submit().await.unwrap();
//!     assert!(outcome.is_submitted());
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod schema;
pub mod store;
pub mod submit;
pub mod validation;
pub mod value;

pub use config::{FormConfig, FormConfigBuilder, ValidationTrigger};
pub use engine::{ChangeCallback, FormBuilder, FormHandle};
pub use error::{FormError, Result};
pub use metrics::{FormMetrics, PassScope};
pub use schema::{AsyncRule, CustomRule, FieldRule, FieldSpec, FormSchema};
pub use store::{Collection, InMemoryStore, RecordStore, StoredRecord};
pub use submit::{StoreSubmitHandler, SubmitHandler, SubmitOutcome};
pub use validation::{validate, validate_field, UniqueValueRule, ValidationOutcome};
pub use value::{ErrorMap, FieldChange, FieldValue, FormData, ValueKind};
