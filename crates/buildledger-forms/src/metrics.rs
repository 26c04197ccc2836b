//! Prometheus metrics for form validation
//!
//! - `buildledger_forms_validation_passes_total` (counter) - passes by scope and result
//! - `buildledger_forms_field_errors_total` (counter) - reported field errors
//! - `buildledger_forms_stale_results_total` (counter) - discarded stale results
//! - `buildledger_forms_submissions_total` (counter) - submissions by outcome

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

use crate::error::Result;

/// Scope label of a validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassScope {
    All,
    Fields,
}

impl PassScope {
    fn as_str(&self) -> &'static str {
        match self {
            PassScope::All => "all",
            PassScope::Fields => "fields",
        }
    }
}

/// Form engine metrics
pub struct FormMetrics {
    passes_total: IntCounterVec,
    field_errors_total: IntCounterVec,
    stale_results_total: IntCounter,
    submissions_total: IntCounterVec,
}

impl FormMetrics {
    /// Create metrics and register them with the provided registry
    pub fn new(registry: &Registry) -> Result<Self> {
        let passes_total = IntCounterVec::new(
            Opts::new("validation_passes_total", "Total number of form validation passes")
                .namespace("buildledger_forms"),
            &["scope", "result"],
        )?;

        let field_errors_total = IntCounterVec::new(
            Opts::new("field_errors_total", "Total number of field errors reported")
                .namespace("buildledger_forms"),
            &["field"],
        )?;

        let stale_results_total = IntCounter::with_opts(
            Opts::new(
                "stale_results_total",
                "Validation results discarded because the field changed meanwhile",
            )
            .namespace("buildledger_forms"),
        )?;

        let submissions_total = IntCounterVec::new(
            Opts::new("submissions_total", "Total number of form submissions")
                .namespace("buildledger_forms"),
            &["outcome"],
        )?;

        registry.register(Box::new(passes_total.clone()))?;
        registry.register(Box::new(field_errors_total.clone()))?;
        registry.register(Box::new(stale_results_total.clone()))?;
        registry.register(Box::new(submissions_total.clone()))?;

        Ok(Self {
            passes_total,
            field_errors_total,
            stale_results_total,
            submissions_total,
        })
    }

    /// Record a finished validation pass
    pub fn record_pass(&self, scope: PassScope, valid: bool) {
        let result = if valid { "valid" } else { "invalid" };
        self.passes_total
            .with_label_values(&[scope.as_str(), result])
            .inc();
    }

    pub fn record_field_error(&self, field: &str) {
        self.field_errors_total.with_label_values(&[field]).inc();
    }

    pub fn record_stale(&self) {
        self.stale_results_total.inc();
    }

    /// `outcome` is `submitted`, `blocked` or `failed`
    pub fn record_submission(&self, outcome: &str) {
        self.submissions_total.with_label_values(&[outcome]).inc();
    }

    pub fn passes(&self, scope: PassScope, valid: bool) -> u64 {
        let result = if valid { "valid" } else { "invalid" };
        self.passes_total
            .with_label_values(&[scope.as_str(), result])
            .get()
    }

    pub fn stale_results(&self) -> u64 {
        self.stale_results_total.get()
    }

    pub fn submissions(&self, outcome: &str) -> u64 {
        self.submissions_total.with_label_values(&[outcome]).get()
    }
}
