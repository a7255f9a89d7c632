//! Business policy documents.
//!
//! A business policy names one service (by name, org and arch), the versions of
//! that service a node may run in rollback order, the node health thresholds
//! that apply to agreements for it, and the properties and constraints used to
//! match nodes. Every field is optional at the serialization boundary: a missing
//! or `null` field takes its zero value, and [`PolicyTranslator::validate`]
//! decides which of them are actually required.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::Result;
use crate::external::{ConstraintExpression, PropertyList};
use crate::policy::Policy;

mod translator;

pub use translator::{
    convert_choice, convert_constraints, convert_node_health, convert_properties,
    PolicyTranslator, DEFAULT_MAX_AGREEMENTS,
};

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Deserialize a field that may be `null`, which reads as the zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The business policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "A business policy selecting the service versions a matching node should run.")]
pub struct BusinessPolicy {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub owner: String,
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<ServiceRef>")]
    pub service: ServiceRef,
    #[serde(skip_serializing_if = "PropertyList::is_empty", deserialize_with = "null_as_default")]
    #[schemars(
        with = "Option<PropertyList>",
        description = "Properties advertised to nodes that form agreements under this policy"
    )]
    pub properties: PropertyList,
    #[serde(
        skip_serializing_if = "ConstraintExpression::is_empty",
        deserialize_with = "null_as_default"
    )]
    #[schemars(
        with = "Option<ConstraintExpression>",
        description = "Constraint expressions a node's properties must satisfy"
    )]
    pub constraints: ConstraintExpression,
}

impl BusinessPolicy {
    /// Validate with the default constraint languages
    pub fn validate(&self) -> Result<()> {
        PolicyTranslator::default().validate(self)
    }

    /// Generate the internal policy with the default constraint languages
    pub fn gen_policy(&self, policy_name: &str) -> Result<Policy> {
        PolicyTranslator::default().generate_policy(self, policy_name)
    }
}

impl fmt::Display for BusinessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Owner: {}, Label: {}, Description: {}, Service: {}, Properties: {}, Constraints: {}",
            self.owner, self.label, self.description, self.service, self.properties, self.constraints
        )
    }
}

/// The service a business policy deploys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ServiceRef {
    /// Name of the service definition in the exchange
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub name: String,
    /// Org holding the service definition
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub org: String,
    /// Hardware architecture of the service definition
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub arch: String,
    /// Candidate versions, tried in list order for rollback
    #[serde(
        rename = "serviceVersions",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    #[schemars(with = "Option<Vec<WorkloadChoice>>")]
    pub service_versions: Vec<WorkloadChoice>,
    #[serde(rename = "nodeHealth", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<NodeHealth>")]
    pub node_health: NodeHealth,
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, Org: {}, Arch: {}, ServiceVersions: [",
            self.name, self.org, self.arch
        )?;
        for (i, choice) in self.service_versions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{{{}}}", choice)?;
        }
        write!(f, "], NodeH: {{{}}}", self.node_health)
    }
}

/// Retry and rollback tuning for one service version.
///
/// Zero means unset for every field; none of them are range checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WorkloadPriority {
    /// Priority 1 is the highest, priority 2 is next, and so on
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<i64>")]
    pub priority_value: i64,
    /// Retries before giving up and moving to the next version
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<i64>")]
    pub retries: i64,
    /// Seconds in which the retries must occur for the next version to be attempted
    #[serde(
        rename = "retry_durations",
        skip_serializing_if = "is_zero",
        deserialize_with = "null_as_default"
    )]
    #[schemars(with = "Option<i64>")]
    pub retry_duration_s: i64,
    /// Seconds verified data must exist before rollback retries are turned off
    #[serde(
        rename = "verified_durations",
        skip_serializing_if = "is_zero",
        deserialize_with = "null_as_default"
    )]
    #[schemars(with = "Option<i64>")]
    pub verified_duration_s: i64,
}

impl fmt::Display for WorkloadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PriorityValue: {}, Retries: {}, RetryDurationS: {}, VerifiedDurationS: {}",
            self.priority_value, self.retries, self.retry_duration_s, self.verified_duration_s
        )
    }
}

/// When an upgrade to a version may happen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct UpgradePolicy {
    /// immediate, never or agreement
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub lifecycle: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub time: String,
}

impl fmt::Display for UpgradePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lifecycle: {}, Time: {}", self.lifecycle, self.time)
    }
}

/// One selectable version of the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WorkloadChoice {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<WorkloadPriority>")]
    pub priority: WorkloadPriority,
    #[serde(rename = "upgradePolicy", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<UpgradePolicy>")]
    pub upgrade: UpgradePolicy,
}

impl WorkloadChoice {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for WorkloadChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version: {}, Priority: {{{}}}, Upgrade: {{{}}}",
            self.version, self.priority, self.upgrade
        )
    }
}

/// Thresholds for deciding that a node is violating its agreements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NodeHealth {
    /// Seconds a heartbeat can be missing before it is considered missing
    #[serde(
        rename = "missing_heartbeat_interval",
        skip_serializing_if = "is_zero",
        deserialize_with = "null_as_default"
    )]
    #[schemars(with = "Option<i64>")]
    pub missing_hb_interval: i64,
    /// How often, in seconds, to check that the node's agreement still exists
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<i64>")]
    pub check_agreement_status: i64,
}

impl fmt::Display for NodeHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MissingHBInterval: {}, CheckAgreementStatus: {}",
            self.missing_hb_interval, self.check_agreement_status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_document() {
        let policy: BusinessPolicy = serde_json::from_value(json!({
            "owner": "admin",
            "label": "weather",
            "description": "weather station rollout",
            "service": {
                "name": "weather",
                "org": "acme",
                "arch": "arm64",
                "serviceVersions": [{
                    "version": "2.1.0",
                    "priority": {
                        "priority_value": 1,
                        "retries": 2,
                        "retry_durations": 3600,
                        "verified_durations": 52
                    },
                    "upgradePolicy": {"lifecycle": "immediate", "time": "01:00AM"}
                }],
                "nodeHealth": {"missing_heartbeat_interval": 600, "check_agreement_status": 120}
            },
            "properties": [{"name": "iame2edev", "value": "true"}],
            "constraints": ["purpose == weather"]
        }))
        .unwrap();

        assert_eq!(policy.owner, "admin");
        assert_eq!(policy.service.arch, "arm64");
        let choice = &policy.service.service_versions[0];
        assert_eq!(choice.version, "2.1.0");
        assert_eq!(choice.priority.retry_duration_s, 3600);
        assert_eq!(choice.priority.verified_duration_s, 52);
        assert_eq!(choice.upgrade.lifecycle, "immediate");
        assert_eq!(policy.service.node_health.missing_hb_interval, 600);
        assert_eq!(policy.properties.len(), 1);
        assert_eq!(policy.constraints.expressions(), ["purpose == weather"]);
    }

    #[test]
    fn test_omitted_fields_default_to_zero_values() {
        let policy: BusinessPolicy =
            serde_json::from_value(json!({"service": {"name": "svc"}})).unwrap();

        assert_eq!(policy.label, "");
        assert_eq!(policy.service.org, "");
        assert!(policy.service.service_versions.is_empty());
        assert_eq!(policy.service.node_health, NodeHealth::default());
        assert!(policy.properties.is_empty());
        assert!(policy.constraints.is_empty());
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let policy = BusinessPolicy {
            service: ServiceRef {
                name: "svc1".to_string(),
                service_versions: vec![WorkloadChoice::new("1.0")],
                ..ServiceRef::default()
            },
            ..BusinessPolicy::default()
        };

        assert_eq!(
            serde_json::to_value(&policy).unwrap(),
            json!({
                "label": "",
                "description": "",
                "service": {
                    "name": "svc1",
                    "serviceVersions": [{
                        "version": "1.0",
                        "priority": {},
                        "upgradePolicy": {}
                    }],
                    "nodeHealth": {}
                }
            })
        );
    }

    #[test]
    fn test_display() {
        let mut service = ServiceRef {
            name: "svc1".to_string(),
            org: "orgA".to_string(),
            arch: "amd64".to_string(),
            ..ServiceRef::default()
        };
        service.service_versions.push(WorkloadChoice::new("1.0"));
        service.node_health = NodeHealth {
            missing_hb_interval: 60,
            check_agreement_status: 30,
        };

        assert_eq!(
            service.to_string(),
            "Name: svc1, Org: orgA, Arch: amd64, ServiceVersions: [{Version: 1.0, \
             Priority: {PriorityValue: 0, Retries: 0, RetryDurationS: 0, VerifiedDurationS: 0}, \
             Upgrade: {Lifecycle: , Time: }}], \
             NodeH: {MissingHBInterval: 60, CheckAgreementStatus: 30}"
        );
    }
}
