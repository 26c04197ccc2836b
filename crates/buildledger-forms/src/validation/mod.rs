//! Schema validation of a form data bag
//!
//! [`validate`] checks every declared field and collects all failures;
//! [`validate_field`] checks a single field. Within a field the first failing
//! rule (declaration order, after `when` expansion) decides the message.
//! Rule failures are data, never `Err`: an `Err` here means the schema could
//! not be evaluated.

pub mod rules;
pub mod unique;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::schema::{FieldRule, FormSchema};
use crate::value::{ErrorMap, FormData};
use rules::{active_rules, check_sync, RuleContext};

pub use unique::UniqueValueRule;

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether every checked field passed
    pub is_valid: bool,
    /// Field errors (for engine passes: the form's error map after the pass)
    pub errors: ErrorMap,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: ErrorMap::new(),
        }
    }

    pub fn from_errors(errors: ErrorMap) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate every field declared by `schema` against `data`
pub async fn validate(data: &FormData, schema: &FormSchema) -> Result<ValidationOutcome> {
    let mut errors = ErrorMap::new();

    for name in schema.field_names() {
        if let Some(message) = validate_field(data, schema, name).await? {
            errors.insert(name.clone(), message);
        }
    }

    debug!(
        fields = schema.fields.len(),
        failed = errors.len(),
        "schema validation finished"
    );
    Ok(ValidationOutcome::from_errors(errors))
}

/// Validate a single field
///
/// Returns `Some(message)` for the first failing rule, `None` when the field
/// passes. A name the schema does not declare is trivially valid.
pub async fn validate_field(data: &FormData, schema: &FormSchema, field: &str) -> Result<Option<String>> {
    let Some(spec) = schema.spec(field) else {
        return Ok(None);
    };

    let mut applicable = Vec::new();
    active_rules(&spec.rules, data, &mut applicable);

    let ctx = RuleContext::new(field, data);
    for rule in applicable {
        let passed = match rule {
            FieldRule::Custom(custom) => {
                if ctx.value.is_empty() {
                    true
                } else {
                    custom.rule.check(field, ctx.value, data).await.map_err(|e| {
                        warn!(field, rule = rule.id(), error = %e, "custom rule failed to evaluate");
                        e
                    })?
                }
            }
            other => check_sync(other, &ctx)?,
        };

        if !passed {
            return Ok(Some(rule.failure_message()));
        }
    }

    Ok(None)
}
