//! JSON provider for business policy documents and generated policies.

use serde::Serialize;

use crate::business::BusinessPolicy;
use crate::errors::{BusinessPolicyError, Result};

/// JSON provider backed by `serde_json`.
///
/// All operations are stateless.
#[derive(Debug, Clone)]
pub struct NativeJsonProvider;

impl NativeJsonProvider {
    /// Parse a business policy document.
    ///
    /// A `null` document parses to `None`; every other field that is missing
    /// takes its default value.
    pub fn parse_business_policy(json_str: &str) -> Result<Option<BusinessPolicy>> {
        serde_json::from_str(json_str).map_err(BusinessPolicyError::from)
    }

    /// Serialize a value to compact JSON.
    pub fn stringify<T>(value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        serde_json::to_string(value).map_err(BusinessPolicyError::from)
    }

    /// Serialize a value to indented JSON.
    pub fn stringify_pretty<T>(value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        serde_json::to_string_pretty(value).map_err(BusinessPolicyError::from)
    }
}
