//! Declarative validation schemas
//!
//! A [`FormSchema`] maps field names to an ordered list of [`FieldRule`]s.
//! Every rule kind except [`FieldRule::Custom`] can be loaded from YAML, JSON
//! or TOML:
//!
//! ```yaml
//! fields:
//!   email:
//!     rules:
//!       - rule: group_required
//!         fields: [id, email]
//!       - rule: email
//!   cost:
//!     rules:
//!       - rule: when
//!         field: hasSubMaterials
//!         is: false
//!         then:
//!           - rule: required
//!           - rule: positive
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{FormError, Result};
use crate::value::{FieldValue, FormData, ValueKind};

/// Async predicate attached to a field (e.g. uniqueness against the store)
///
/// Returns `Ok(true)` when the value passes. An `Err` is an evaluator
/// failure and propagates to the caller instead of landing in the error map.
#[async_trait]
pub trait AsyncRule: Send + Sync {
    /// Short identifier, used for the default message key
    fn name(&self) -> &str;

    async fn check(&self, field: &str, value: &FieldValue, data: &FormData) -> Result<bool>;
}

/// A custom async rule together with its failure message
#[derive(Clone)]
pub struct CustomRule {
    pub message: String,
    pub rule: Arc<dyn AsyncRule>,
}

impl CustomRule {
    pub fn new(rule: impl AsyncRule + 'static) -> Self {
        let message = format!("validation.{}", rule.name());
        Self {
            message,
            rule: Arc::new(rule),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("name", &self.rule.name())
            .field("message", &self.message)
            .finish()
    }
}

/// One declarative rule on a field
///
/// `message` is an opaque string handed through to the presentation layer;
/// when absent a `validation.<rule>` key is reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Value must be non-empty
    Required {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Value must be of the given kind
    Type {
        kind: ValueKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Text must look like an email address
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Text must match a regular expression
    Pattern {
        regex: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Number must be >= value
    Min {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Number must be <= value
    Max {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Number must be > 0
    Positive {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Text/list length must be >= len
    MinLength {
        len: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Text/list length must be <= len
    MaxLength {
        len: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Value must equal another field's value (password confirmation)
    EqualsField {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Value must be one of an allowed set
    OneOf {
        values: Vec<FieldValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// At least one of the named fields must be non-empty
    GroupRequired {
        fields: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Apply `then` when `field` currently equals `is`, otherwise `otherwise`
    When {
        field: String,
        is: FieldValue,
        #[serde(default)]
        then: Vec<FieldRule>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        otherwise: Vec<FieldRule>,
    },
    /// Async predicate; code-only
    #[serde(skip)]
    Custom(CustomRule),
}

impl FieldRule {
    pub fn required() -> Self {
        FieldRule::Required { message: None }
    }

    pub fn kind(kind: ValueKind) -> Self {
        FieldRule::Type { kind, message: None }
    }

    pub fn email() -> Self {
        FieldRule::Email { message: None }
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        FieldRule::Pattern {
            regex: regex.into(),
            message: None,
        }
    }

    pub fn min(value: f64) -> Self {
        FieldRule::Min { value, message: None }
    }

    pub fn max(value: f64) -> Self {
        FieldRule::Max { value, message: None }
    }

    pub fn positive() -> Self {
        FieldRule::Positive { message: None }
    }

    pub fn min_length(len: usize) -> Self {
        FieldRule::MinLength { len, message: None }
    }

    pub fn max_length(len: usize) -> Self {
        FieldRule::MaxLength { len, message: None }
    }

    pub fn equals_field(field: impl Into<String>) -> Self {
        FieldRule::EqualsField {
            field: field.into(),
            message: None,
        }
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        FieldRule::OneOf {
            values: values.into_iter().map(Into::into).collect(),
            message: None,
        }
    }

    pub fn group_required<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldRule::GroupRequired {
            fields: fields.into_iter().map(Into::into).collect(),
            message: None,
        }
    }

    pub fn when(
        field: impl Into<String>,
        is: impl Into<FieldValue>,
        then: Vec<FieldRule>,
        otherwise: Vec<FieldRule>,
    ) -> Self {
        FieldRule::When {
            field: field.into(),
            is: is.into(),
            then,
            otherwise,
        }
    }

    pub fn custom(rule: impl AsyncRule + 'static) -> Self {
        FieldRule::Custom(CustomRule::new(rule))
    }

    /// Override the failure message. No-op on `when`, whose nested rules
    /// carry their own messages.
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match &mut self {
            FieldRule::Required { message }
            | FieldRule::Type { message, .. }
            | FieldRule::Email { message }
            | FieldRule::Pattern { message, .. }
            | FieldRule::Min { message, .. }
            | FieldRule::Max { message, .. }
            | FieldRule::Positive { message }
            | FieldRule::MinLength { message, .. }
            | FieldRule::MaxLength { message, .. }
            | FieldRule::EqualsField { message, .. }
            | FieldRule::OneOf { message, .. }
            | FieldRule::GroupRequired { message, .. } => *message = Some(msg),
            FieldRule::Custom(custom) => custom.message = msg,
            FieldRule::When { .. } => {}
        }
        self
    }

    /// Rule identifier as used in default message keys and logs
    pub fn id(&self) -> &str {
        match self {
            FieldRule::Required { .. } => "required",
            FieldRule::Type { .. } => "type",
            FieldRule::Email { .. } => "email",
            FieldRule::Pattern { .. } => "pattern",
            FieldRule::Min { .. } => "min",
            FieldRule::Max { .. } => "max",
            FieldRule::Positive { .. } => "positive",
            FieldRule::MinLength { .. } => "min_length",
            FieldRule::MaxLength { .. } => "max_length",
            FieldRule::EqualsField { .. } => "equals_field",
            FieldRule::OneOf { .. } => "one_of",
            FieldRule::GroupRequired { .. } => "group_required",
            FieldRule::When { .. } => "when",
            FieldRule::Custom(custom) => custom.rule.name(),
        }
    }

    /// Message reported when this rule fails
    pub fn failure_message(&self) -> String {
        let explicit = match self {
            FieldRule::Required { message }
            | FieldRule::Type { message, .. }
            | FieldRule::Email { message }
            | FieldRule::Pattern { message, .. }
            | FieldRule::Min { message, .. }
            | FieldRule::Max { message, .. }
            | FieldRule::Positive { message }
            | FieldRule::MinLength { message, .. }
            | FieldRule::MaxLength { message, .. }
            | FieldRule::EqualsField { message, .. }
            | FieldRule::OneOf { message, .. }
            | FieldRule::GroupRequired { message, .. } => message.clone(),
            FieldRule::Custom(custom) => Some(custom.message.clone()),
            FieldRule::When { .. } => None,
        };
        explicit.unwrap_or_else(|| format!("validation.{}", self.id()))
    }

    /// Whether this rule (or any nested rule) runs an async predicate
    pub fn is_async(&self) -> bool {
        match self {
            FieldRule::Custom(_) => true,
            FieldRule::When { then, otherwise, .. } => {
                then.iter().chain(otherwise.iter()).any(FieldRule::is_async)
            }
            _ => false,
        }
    }

    fn check_structure(&self, field: &str) -> Result<()> {
        match self {
            FieldRule::Pattern { regex, .. } => {
                crate::validation::rules::compiled_pattern(regex).map_err(|e| {
                    FormError::invalid_schema(format!("field '{}': invalid pattern: {}", field, e))
                })?;
            }
            FieldRule::EqualsField { field: other, .. } if other.is_empty() => {
                return Err(FormError::invalid_schema(format!(
                    "field '{}': equals_field needs a field name",
                    field
                )));
            }
            FieldRule::GroupRequired { fields, .. } if fields.iter().all(|f| f.is_empty()) => {
                return Err(FormError::invalid_schema(format!(
                    "field '{}': group_required needs at least one field",
                    field
                )));
            }
            FieldRule::When {
                field: other,
                then,
                otherwise,
                ..
            } => {
                if other.is_empty() {
                    return Err(FormError::invalid_schema(format!(
                        "field '{}': when needs a field name",
                        field
                    )));
                }
                for rule in then.iter().chain(otherwise.iter()) {
                    rule.check_structure(field)?;
                }
            }
            FieldRule::Min { value, .. } | FieldRule::Max { value, .. } if !value.is_finite() => {
                return Err(FormError::invalid_schema(format!(
                    "field '{}': bound must be finite",
                    field
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Rules declared for one field, in evaluation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub rules: Vec<FieldRule>,
}

impl FieldSpec {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn is_async(&self) -> bool {
        self.rules.iter().any(FieldRule::is_async)
    }
}

/// Validation schema for one form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with its rules (replaces an earlier declaration)
    pub fn field(mut self, name: impl Into<String>, rules: Vec<FieldRule>) -> Self {
        self.fields.insert(name.into(), FieldSpec::new(rules));
        self
    }

    pub fn declares(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Whether the named field has an async rule
    pub fn is_async_field(&self, name: &str) -> bool {
        self.spec(name).map(FieldSpec::is_async).unwrap_or(false)
    }

    /// Check the schema for structural problems (bad regex, dangling names)
    pub fn check(&self) -> Result<()> {
        for (name, spec) in &self.fields {
            for rule in &spec.rules {
                rule.check_structure(name)?;
            }
        }
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let schema: Self = serde_yaml::from_str(content)?;
        schema.check()?;
        Ok(schema)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let schema: Self = serde_json::from_str(content)?;
        schema.check()?;
        Ok(schema)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let schema: Self = toml::from_str(content)?;
        schema.check()?;
        Ok(schema)
    }

    /// Load a schema, picking the format from the file extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FormError::file(path, e))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(FormError::Parse(format!(
                "Unsupported schema format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}
