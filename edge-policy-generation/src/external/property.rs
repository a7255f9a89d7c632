//! Node and service properties carried by business policies.

use std::fmt;
use std::sync::LazyLock;

use derive_new::new;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PropertyError;

pub const VERSION_TYPE: &str = "version";
pub const STRING_TYPE: &str = "string";
pub const LIST_TYPE: &str = "list of strings";
pub const INTEGER_TYPE: &str = "int";
pub const BOOLEAN_TYPE: &str = "boolean";
pub const FLOAT_TYPE: &str = "float";

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+){0,2}$").expect("version pattern is a valid regex")
});

/// A single named property, e.g. `{"name": "gpu", "value": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, new)]
pub struct Property {
    pub name: String,
    pub value: Value,
    /// Declared type of the value; empty means the type is inferred from the value
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    #[new(default)]
    pub property_type: String,
}

impl Property {
    /// Create a property with an explicit declared type
    pub fn with_type(name: impl Into<String>, value: Value, property_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            property_type: property_type.into(),
        }
    }

    /// Check that the property has a name and a scalar value that matches its declared type.
    pub fn validate(&self) -> Result<(), PropertyError> {
        if self.name.is_empty() {
            return Err(PropertyError::EmptyName);
        }

        match &self.value {
            Value::Null => {
                return Err(PropertyError::MissingValue {
                    name: self.name.clone(),
                })
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(PropertyError::UnsupportedValue {
                    name: self.name.clone(),
                    value: self.value.to_string(),
                })
            }
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }

        if self.property_type.is_empty() {
            return Ok(());
        }

        let compatible = match self.property_type.as_str() {
            VERSION_TYPE => self
                .value
                .as_str()
                .is_some_and(|v| VERSION_PATTERN.is_match(v)),
            STRING_TYPE | LIST_TYPE => self.value.is_string(),
            INTEGER_TYPE => {
                self.value.is_i64()
                    || self.value.is_u64()
                    || self.value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            BOOLEAN_TYPE => self.value.is_boolean(),
            FLOAT_TYPE => self.value.is_number(),
            other => {
                return Err(PropertyError::UnknownType {
                    name: self.name.clone(),
                    declared: other.to_string(),
                })
            }
        };

        if compatible {
            Ok(())
        } else {
            Err(PropertyError::TypeMismatch {
                name: self.name.clone(),
                declared: self.property_type.clone(),
                value: self.value.to_string(),
            })
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name: {}, Value: {}", self.name, self.value)?;
        if !self.property_type.is_empty() {
            write!(f, ", Type: {}", self.property_type)?;
        }
        Ok(())
    }
}

/// An ordered list of properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PropertyList(Vec<Property>);

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.0.iter()
    }

    pub fn push(&mut self, property: Property) {
        self.0.push(property);
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.0.iter().any(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.0.iter().find(|p| p.name == name)
    }

    /// Validate every property in order, stopping at the first invalid one.
    pub fn validate(&self) -> Result<(), PropertyError> {
        self.0.iter().try_for_each(Property::validate)
    }
}

impl From<Vec<Property>> for PropertyList {
    fn from(properties: Vec<Property>) -> Self {
        Self(properties)
    }
}

impl FromIterator<Property> for PropertyList {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PropertyList {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PropertyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, property) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", property)?;
        }
        write!(f, "]")
    }
}
