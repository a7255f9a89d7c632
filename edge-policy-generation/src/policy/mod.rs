//! The internal policy consumed by agreement negotiation.
//!
//! A [`Policy`] is built up incrementally: it is created with a name, workloads
//! are appended in rollback order, properties are added one at a time, and the
//! counter-party requirement and node health are set last.

use std::fmt;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::errors::PolicyError;
use crate::external::{Property, PropertyList};

mod required_property;

pub use required_property::{PropertyExpression, RequiredProperty};

/// Version written into every policy header
pub const POLICY_HEADER_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyHeader {
    pub name: String,
    pub version: String,
}

/// Rollback tuning for one workload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct WorkloadPriority {
    pub priority_value: i64,
    pub retries: i64,
    #[serde(rename = "retry_durations")]
    pub retry_duration_s: i64,
    #[serde(rename = "verified_durations")]
    pub verified_duration_s: i64,
}

/// One workload the policy allows, identified by service name, org, version and arch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub workload_url: String,
    #[serde(rename = "organization")]
    pub org: String,
    pub version: String,
    pub arch: String,
    #[new(default)]
    pub priority: WorkloadPriority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct NodeHealth {
    #[serde(rename = "missing_heartbeat_interval")]
    pub missing_hb_interval: i64,
    pub check_agreement_status: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub header: PolicyHeader,
    pub workloads: Vec<Workload>,
    pub properties: PropertyList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_party_properties: Option<RequiredProperty>,
    pub max_agreements: u32,
    pub node_health: NodeHealth,
}

impl Policy {
    /// Create an empty policy with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            header: PolicyHeader {
                name: name.into(),
                version: POLICY_HEADER_VERSION.to_string(),
            },
            workloads: Vec::new(),
            properties: PropertyList::new(),
            counter_party_properties: None,
            max_agreements: 0,
            node_health: NodeHealth::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Append a workload. Workload order is rollback order.
    pub fn add_workload(&mut self, workload: Workload) {
        self.workloads.push(workload);
    }

    pub fn set_node_health(&mut self, node_health: NodeHealth) {
        self.node_health = node_health;
    }

    /// Add a property, rejecting a second property with the same name.
    pub fn add_property(&mut self, property: &Property) -> Result<(), PolicyError> {
        if self.properties.has_property(&property.name) {
            return Err(PolicyError::DuplicateProperty(property.name.clone()));
        }
        self.properties.push(property.clone());
        Ok(())
    }

    pub fn set_counter_party_properties(&mut self, requirement: RequiredProperty) {
        self.counter_party_properties = Some(requirement);
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, Version: {}, Workloads: [",
            self.header.name, self.header.version
        )?;
        for (i, workload) in self.workloads.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{}/{} {} {} (priority {})",
                workload.org,
                workload.workload_url,
                workload.version,
                workload.arch,
                workload.priority.priority_value
            )?;
        }
        write!(f, "], Properties: {}", self.properties)?;
        match &self.counter_party_properties {
            Some(requirement) => write!(f, ", CounterPartyProperties: {}", requirement)?,
            None => write!(f, ", CounterPartyProperties: none")?,
        }
        write!(
            f,
            ", MaxAgreements: {}, NodeHealth: {}/{}",
            self.max_agreements,
            self.node_health.missing_hb_interval,
            self.node_health.check_agreement_status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_policy_is_empty() {
        let policy = Policy::new("p1");
        assert_eq!(policy.name(), "p1");
        assert_eq!(policy.header.version, POLICY_HEADER_VERSION);
        assert!(policy.workloads.is_empty());
        assert!(policy.properties.is_empty());
        assert_eq!(policy.counter_party_properties, None);
        assert_eq!(policy.node_health, NodeHealth::default());
    }

    #[test]
    fn test_add_property_rejects_duplicates() {
        let mut policy = Policy::new("p1");
        let first = Property::new("zone".to_string(), json!("east"));
        let second = Property::new("zone".to_string(), json!("west"));

        policy.add_property(&first).unwrap();
        assert_eq!(
            policy.add_property(&second),
            Err(PolicyError::DuplicateProperty("zone".to_string()))
        );
        assert_eq!(policy.properties.len(), 1);
        assert_eq!(policy.properties.get("zone"), Some(&first));
    }

    #[test]
    fn test_workloads_keep_insertion_order() {
        let mut policy = Policy::new("p1");
        for version in ["2.0", "1.0", "3.0"] {
            policy.add_workload(Workload::new(
                "svc".to_string(),
                "org".to_string(),
                version.to_string(),
                "amd64".to_string(),
            ));
        }
        let versions: Vec<&str> = policy.workloads.iter().map(|w| w.version.as_str()).collect();
        assert_eq!(versions, vec!["2.0", "1.0", "3.0"]);
    }

    #[test]
    fn test_policy_json_field_names() {
        let mut policy = Policy::new("p1");
        let mut workload = Workload::new(
            "svc1".to_string(),
            "orgA".to_string(),
            "1.0".to_string(),
            "amd64".to_string(),
        );
        workload.priority = WorkloadPriority::new(1, 3, 600, 120);
        policy.add_workload(workload);
        policy.set_node_health(NodeHealth::new(60, 30));
        policy.max_agreements = 5;

        assert_eq!(
            serde_json::to_value(&policy).unwrap(),
            json!({
                "header": {"name": "p1", "version": "2.0"},
                "workloads": [{
                    "workloadUrl": "svc1",
                    "organization": "orgA",
                    "version": "1.0",
                    "arch": "amd64",
                    "priority": {
                        "priority_value": 1,
                        "retries": 3,
                        "retry_durations": 600,
                        "verified_durations": 120
                    }
                }],
                "properties": [],
                "maxAgreements": 5,
                "nodeHealth": {"missing_heartbeat_interval": 60, "check_agreement_status": 30}
            })
        );
    }

    #[test]
    fn test_policy_display() {
        let mut policy = Policy::new("p1");
        policy.add_workload(Workload::new(
            "svc1".to_string(),
            "orgA".to_string(),
            "1.0".to_string(),
            "amd64".to_string(),
        ));
        policy.max_agreements = 5;
        assert_eq!(
            policy.to_string(),
            "Name: p1, Version: 2.0, Workloads: [orgA/svc1 1.0 amd64 (priority 0)], \
             Properties: [], CounterPartyProperties: none, MaxAgreements: 5, NodeHealth: 0/0"
        );
    }
}
