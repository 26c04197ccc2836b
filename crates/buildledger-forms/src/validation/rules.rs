//! Evaluation of individual field rules
//!
//! Rules are pure with respect to the data snapshot they are handed. Only
//! `custom` rules await anything.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use tracing::trace;

use crate::error::{FormError, Result};
use crate::schema::FieldRule;
use crate::value::{FieldValue, FormData};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
}

fn pattern_cache() -> &'static Mutex<HashMap<String, Regex>> {
    static PATTERNS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();
    PATTERNS.get_or_init(Default::default)
}

/// Compiled regex of a `pattern` rule; each source is compiled once
pub(crate) fn compiled_pattern(source: &str) -> std::result::Result<Regex, regex::Error> {
    if let Some(re) = pattern_cache().lock().ok().and_then(|cache| cache.get(source).cloned()) {
        return Ok(re);
    }

    let re = Regex::new(source)?;
    if let Ok(mut cache) = pattern_cache().lock() {
        cache.insert(source.to_string(), re.clone());
    }
    Ok(re)
}

/// What a rule is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Field under evaluation
    pub field: &'a str,
    /// Its current value
    pub value: &'a FieldValue,
    /// Full data snapshot, for cross-field rules
    pub data: &'a FormData,
}

impl<'a> RuleContext<'a> {
    pub fn new(field: &'a str, data: &'a FormData) -> Self {
        Self {
            field,
            value: data.get(field),
            data,
        }
    }
}

/// Expand `when` rules against the snapshot into the flat list of rules that
/// apply, preserving declaration order.
pub fn active_rules<'r>(rules: &'r [FieldRule], data: &FormData, out: &mut Vec<&'r FieldRule>) {
    for rule in rules {
        match rule {
            FieldRule::When {
                field,
                is,
                then,
                otherwise,
            } => {
                if data.get(field) == is {
                    active_rules(then, data, out);
                } else {
                    active_rules(otherwise, data, out);
                }
            }
            other => out.push(other),
        }
    }
}

/// Evaluate one synchronous rule. Returns `Ok(true)` when the value passes.
///
/// Every rule except `required` and `group_required` passes on an empty value.
pub fn check_sync(rule: &FieldRule, ctx: &RuleContext<'_>) -> Result<bool> {
    let value = ctx.value;

    let passed = match rule {
        FieldRule::Required { .. } => !value.is_empty(),
        FieldRule::GroupRequired { fields, .. } => {
            if fields.is_empty() {
                return Err(FormError::evaluator(ctx.field, "group_required has no fields"));
            }
            fields.iter().any(|f| !ctx.data.get(f).is_empty())
        }
        _ if value.is_empty() => true,
        FieldRule::Type { kind, .. } => kind.matches(value),
        FieldRule::Email { .. } => value.as_str().map(|s| email_regex().is_match(s.trim())).unwrap_or(false),
        FieldRule::Pattern { regex, .. } => {
            let re = compiled_pattern(regex)
                .map_err(|e| FormError::evaluator(ctx.field, format!("invalid pattern: {}", e)))?;
            value.as_str().map(|s| re.is_match(s)).unwrap_or(false)
        }
        FieldRule::Min { value: min, .. } => value.as_number().map(|n| n >= *min).unwrap_or(false),
        FieldRule::Max { value: max, .. } => value.as_number().map(|n| n <= *max).unwrap_or(false),
        FieldRule::Positive { .. } => value.as_number().map(|n| n > 0.0).unwrap_or(false),
        FieldRule::MinLength { len, .. } => value.length().map(|l| l >= *len).unwrap_or(false),
        FieldRule::MaxLength { len, .. } => value.length().map(|l| l <= *len).unwrap_or(false),
        FieldRule::EqualsField { field, .. } => value == ctx.data.get(field),
        FieldRule::OneOf { values, .. } => values.contains(value),
        FieldRule::When { .. } | FieldRule::Custom(_) => {
            return Err(FormError::evaluator(
                ctx.field,
                format!("rule '{}' cannot be evaluated synchronously", rule.id()),
            ));
        }
    };

    trace!(field = ctx.field, rule = rule.id(), passed, "rule evaluated");
    Ok(passed)
}
