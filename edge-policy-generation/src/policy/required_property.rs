//! Counter-party property requirements.
//!
//! A requirement is a tree of `and` / `or` nodes whose leaves compare a named
//! property against a value. The JSON form matches what the agreement engine
//! reads: `{"and": [{"or": [{"name": "gpu", "value": true, "op": "=="}]}]}`.

use std::fmt;

use derive_new::new;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single comparison of a property against a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct PropertyExpression {
    pub name: String,
    pub value: Value,
    pub op: String,
}

impl fmt::Display for PropertyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.op, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequiredProperty {
    And { and: Vec<RequiredProperty> },
    Or { or: Vec<RequiredProperty> },
    Property(PropertyExpression),
}

impl RequiredProperty {
    pub fn and(children: Vec<RequiredProperty>) -> Self {
        Self::And { and: children }
    }

    pub fn or(children: Vec<RequiredProperty>) -> Self {
        Self::Or { or: children }
    }

    /// All leaf expressions in depth-first order
    pub fn expressions(&self) -> Vec<&PropertyExpression> {
        match self {
            Self::And { and: children } | Self::Or { or: children } => {
                children.iter().flat_map(RequiredProperty::expressions).collect()
            }
            Self::Property(expression) => vec![expression],
        }
    }
}

impl From<PropertyExpression> for RequiredProperty {
    fn from(expression: PropertyExpression) -> Self {
        Self::Property(expression)
    }
}

impl fmt::Display for RequiredProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (children, joiner) = match self {
            Self::And { and } => (and, " && "),
            Self::Or { or } => (or, " || "),
            Self::Property(expression) => return write!(f, "{}", expression),
        };
        write!(f, "(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(joiner)?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RequiredProperty {
        RequiredProperty::and(vec![RequiredProperty::or(vec![
            RequiredProperty::and(vec![
                PropertyExpression::new("gpu".to_string(), json!(true), "==".to_string()).into(),
                PropertyExpression::new("cores".to_string(), json!(4), ">=".to_string()).into(),
            ]),
            RequiredProperty::and(vec![PropertyExpression::new(
                "zone".to_string(),
                json!("east"),
                "=".to_string(),
            )
            .into()]),
        ])])
    }

    #[test]
    fn test_required_property_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            json!({"and": [{"or": [
                {"and": [
                    {"name": "gpu", "value": true, "op": "=="},
                    {"name": "cores", "value": 4, "op": ">="}
                ]},
                {"and": [{"name": "zone", "value": "east", "op": "="}]}
            ]}]})
        );

        let parsed: RequiredProperty = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_required_property_expressions_depth_first() {
        let requirement = sample();
        let names: Vec<&str> = requirement
            .expressions()
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["gpu", "cores", "zone"]);
    }

    #[test]
    fn test_required_property_display() {
        assert_eq!(
            sample().to_string(),
            "(((gpu == true && cores >= 4) || (zone = \"east\")))"
        );
    }
}
