//! Resource data model
//!
//! A [`ResourceQuery`] identifies at most one remote resource, a
//! [`ResourceDescriptor`] is the existing or desired state of that resource,
//! and [`DesiredFields`] is the sparse set of attributes a caller wants
//! applied on top of whatever already exists.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// A configuration entry as supplied by a caller or stored remotely
///
/// The remote side always expects sequences; scalars are accepted on input
/// and widened by [`ConfigValue::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Sequence(Vec<Scalar>),
    Scalar(Scalar),
}

impl ConfigValue {
    /// Widen to an ordered sequence. Text stays a single element.
    pub fn normalize(&self) -> Vec<Scalar> {
        match self {
            ConfigValue::Sequence(values) => values.clone(),
            ConfigValue::Scalar(value) => vec![value.clone()],
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, ConfigValue::Sequence(_))
    }
}

impl From<Scalar> for ConfigValue {
    fn from(value: Scalar) -> Self {
        ConfigValue::Scalar(value)
    }
}

macro_rules! config_value_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ConfigValue {
                fn from(value: $ty) -> Self {
                    ConfigValue::Scalar(value.into())
                }
            }
        )*
    };
}

config_value_from_scalar!(bool, i64, u64, &str, String);

impl<T: Into<Scalar>> FromIterator<T> for ConfigValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ConfigValue::Sequence(iter.into_iter().map(Into::into).collect())
    }
}

/// Nested configuration mapping, ordered by key
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// Key/value filters identifying zero or one remote resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    filters: Vec<(String, String)>,
}

impl ResourceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter, replacing any previous value for the same key
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.filters.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.filters.push((key, value)),
        }
        self
    }

    /// Add a filter only when a value is given
    pub fn with_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Filters in insertion order, ready for query-string encoding
    pub fn pairs(&self) -> &[(String, String)] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Display for ResourceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .filters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{{{}}}", rendered.join(", "))
    }
}

/// Existing or desired state of a remote resource
///
/// Serialized flat, so that a descriptor decoded from a remote object
/// encodes back to the same object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Remote identifier, present only once created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Nested configuration mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigMap>,

    /// Remaining typed attributes
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ResourceDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = Some(config);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn config_value(&self, key: &str) -> Option<&ConfigValue> {
        self.config.as_ref().and_then(|c| c.get(key))
    }

    /// Same descriptor with the identifier stripped, for request bodies
    /// that carry the id in the URL instead
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Caller-supplied partial attribute set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredFields {
    pub attributes: Map<String, Value>,
    pub config: ConfigMap,
}

impl DesiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn set_opt(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    pub fn config_entry(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config.extend(config);
        self
    }
}
