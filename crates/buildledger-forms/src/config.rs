//! Form configuration
//!
//! Controls when validation runs on change / blur and which fields are
//! re-validated together.
//!
//! ```toml
//! validate_on_change = true
//! validate_on_blur = ["email", "id"]
//!
//! [field_groups]
//! email = ["id"]
//! id = ["email"]
//! ```

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::{FormError, Result};

/// When a change or blur event triggers validation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationTrigger {
    /// Never validate (`false`)
    Never,
    /// Validate exactly the touched field(s) (`true`)
    #[default]
    Touched,
    /// Validate touched fields that appear in the list
    Fields(Vec<String>),
    /// Validate the whole schema (`"ALL"`)
    All,
}

impl ValidationTrigger {
    /// Touched fields this trigger selects; `None` means the whole schema
    pub fn select(&self, touched: &[String]) -> Option<Vec<String>> {
        match self {
            ValidationTrigger::Never => Some(Vec::new()),
            ValidationTrigger::Touched => Some(touched.to_vec()),
            ValidationTrigger::Fields(list) => Some(
                touched
                    .iter()
                    .filter(|name| list.contains(name))
                    .cloned()
                    .collect(),
            ),
            ValidationTrigger::All => None,
        }
    }
}

impl FromStr for ValidationTrigger {
    type Err = FormError;

    /// `false`, `true`, `ALL` or a comma-separated field list
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "false" => Ok(ValidationTrigger::Never),
            "true" => Ok(ValidationTrigger::Touched),
            "ALL" => Ok(ValidationTrigger::All),
            "" => Err(FormError::config("empty validation trigger")),
            list => Ok(ValidationTrigger::Fields(
                list.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect(),
            )),
        }
    }
}

impl Serialize for ValidationTrigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ValidationTrigger::Never => serializer.serialize_bool(false),
            ValidationTrigger::Touched => serializer.serialize_bool(true),
            ValidationTrigger::Fields(list) => list.serialize(serializer),
            ValidationTrigger::All => serializer.serialize_str("ALL"),
        }
    }
}

impl<'de> Deserialize<'de> for ValidationTrigger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            List(Vec<String>),
            Keyword(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(ValidationTrigger::Never),
            Raw::Flag(true) => Ok(ValidationTrigger::Touched),
            Raw::List(list) => Ok(ValidationTrigger::Fields(list)),
            Raw::Keyword(k) if k == "ALL" => Ok(ValidationTrigger::All),
            Raw::Keyword(k) => Err(de::Error::custom(format!(
                "unknown validation trigger '{}', expected true, false, a list or \"ALL\"",
                k
            ))),
        }
    }
}

/// Per-form validation configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub validate_on_change: ValidationTrigger,
    pub validate_on_blur: ValidationTrigger,
    /// Field -> related fields re-validated whenever it is validated
    pub field_groups: BTreeMap<String, Vec<String>>,
}

impl FormConfig {
    /// Create a new config builder
    pub fn builder() -> FormConfigBuilder {
        FormConfigBuilder::new()
    }

    /// Related fields of `name` (empty when none are configured)
    pub fn related_fields(&self, name: &str) -> &[String] {
        self.field_groups.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FormError::file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Apply `BUILDLEDGER_VALIDATE_ON_CHANGE` / `BUILDLEDGER_VALIDATE_ON_BLUR`
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var("BUILDLEDGER_VALIDATE_ON_CHANGE") {
            self.validate_on_change = v.parse()?;
        }
        if let Ok(v) = std::env::var("BUILDLEDGER_VALIDATE_ON_BLUR") {
            self.validate_on_blur = v.parse()?;
        }
        Ok(self)
    }
}

/// Builder for FormConfig
pub struct FormConfigBuilder {
    config: FormConfig,
}

impl FormConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            config: FormConfig::default(),
        }
    }

    pub fn validate_on_change(mut self, trigger: ValidationTrigger) -> Self {
        self.config.validate_on_change = trigger;
        self
    }

    pub fn validate_on_blur(mut self, trigger: ValidationTrigger) -> Self {
        self.config.validate_on_blur = trigger;
        self
    }

    /// Re-validate `related` whenever `field` is validated
    pub fn field_group<I, S>(mut self, field: impl Into<String>, related: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .field_groups
            .insert(field.into(), related.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration
    pub fn build(self) -> FormConfig {
        self.config
    }
}

impl Default for FormConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
