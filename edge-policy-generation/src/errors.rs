//! Error types for business policy validation and policy generation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BusinessPolicyError>;

/// Errors raised while validating or converting a business policy.
#[derive(Debug, Error)]
pub enum BusinessPolicyError {
    /// A required identity field is empty or the version list is empty.
    #[error("Invalid business policy: {0}")]
    InvalidPolicy(String),

    /// The property list contains a malformed property.
    #[error("properties contains an invalid property: {0}")]
    InvalidProperty(PropertyError),

    /// The constraint expression was rejected by every registered language.
    #[error("constraints contain an invalid expression: {0}")]
    InvalidConstraint(ConstraintError),

    /// A service version choice has no version string.
    #[error(
        "The version for service {service} arch {arch} is empty in the business policy for {policy_name}"
    )]
    MissingVersion {
        service: String,
        arch: String,
        policy_name: String,
    },

    /// A property could not be added to the generated policy.
    #[error("error trying add external policy property {property} to policy")]
    PropertyConversionFailed {
        property: String,
        #[source]
        source: PolicyError,
    },

    /// The constraint expression could not be turned into a counter-party requirement.
    #[error("error trying to convert external policy constraints to a counter-party requirement")]
    ConstraintConversionFailed(#[source] ConstraintError),

    /// Validation failed at the start of policy generation.
    #[error("Failed to validate the business policy")]
    ValidationFailed(#[source] Box<BusinessPolicyError>),

    /// The document is not valid JSON for a business policy.
    #[error("Failed to parse business policy document")]
    Json(#[from] serde_json::Error),
}

impl BusinessPolicyError {
    pub(crate) fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicy(message.into())
    }
}

/// Errors raised by property validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropertyError {
    #[error("property name is empty")]
    EmptyName,

    #[error("property {name} has no value")]
    MissingValue { name: String },

    #[error("property {name} has unsupported value {value}, expected a string, number or boolean")]
    UnsupportedValue { name: String, value: String },

    #[error("property {name} has unknown type {declared}")]
    UnknownType { name: String, declared: String },

    #[error("property {name} with type {declared} has incompatible value {value}")]
    TypeMismatch {
        name: String,
        declared: String,
        value: String,
    },
}

/// Errors raised by constraint languages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("constraint expression {expression:?} is invalid: {reason}")]
    Syntax { expression: String, reason: String },

    #[error("no constraint language handler is registered")]
    NoLanguage,
}

impl ConstraintError {
    pub(crate) fn syntax(expression: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while building the internal policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Property {0} already added")]
    DuplicateProperty(String),
}
