//! Business policy to internal policy translation.
//!
//! The translator checks that a business policy is structurally complete and
//! converts it field by field into a [`Policy`]. Property and constraint
//! semantics are delegated: properties validate themselves, and constraint
//! expressions are handed to the translator's [`ConstraintLanguages`].

use log::{debug, trace};

use super::{BusinessPolicy, NodeHealth, WorkloadChoice};
use crate::errors::{BusinessPolicyError, Result};
use crate::external::{ConstraintExpression, ConstraintLanguages, PropertyList};
use crate::policy::{self, Policy, Workload};

/// Maximum concurrent agreements written into every generated policy
pub const DEFAULT_MAX_AGREEMENTS: u32 = 5;

/// Validates business policies and converts them into internal policies.
#[derive(Debug, Default)]
pub struct PolicyTranslator {
    languages: ConstraintLanguages,
}

impl PolicyTranslator {
    /// Create a translator using the built-in constraint languages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a translator that interprets constraints with the given languages
    pub fn with_languages(languages: ConstraintLanguages) -> Self {
        Self { languages }
    }

    /// Validate a document that may be absent. An absent document is valid.
    pub fn validate_document(&self, business_policy: Option<&BusinessPolicy>) -> Result<()> {
        business_policy.map_or(Ok(()), |bp| self.validate(bp))
    }

    /// Check that the policy is complete enough to convert.
    ///
    /// The service name, org and arch must be set and at least one service
    /// version must be listed. A non-empty property list must validate, and a
    /// non-empty constraint expression must be accepted by one of the
    /// constraint languages. The constraint check is the last one performed.
    pub fn validate(&self, business_policy: &BusinessPolicy) -> Result<()> {
        let service = &business_policy.service;
        if service.name.is_empty() || service.org.is_empty() || service.arch.is_empty() {
            return Err(BusinessPolicyError::invalid_policy(
                "Name, Org or Arch is empty string.",
            ));
        } else if service.service_versions.is_empty() {
            return Err(BusinessPolicyError::invalid_policy(
                "The serviceVersions array is empty.",
            ));
        }

        if !business_policy.properties.is_empty() {
            business_policy
                .properties
                .validate()
                .map_err(BusinessPolicyError::InvalidProperty)?;
        }

        if !business_policy.constraints.is_empty() {
            return self
                .languages
                .validate(&business_policy.constraints)
                .map(|_| ())
                .map_err(BusinessPolicyError::InvalidConstraint);
        }

        Ok(())
    }

    /// Convert a business policy into an internal policy named `policy_name`.
    ///
    /// Workloads are added in the order the service versions are listed, which
    /// is the rollback order; the priority value is carried along but does not
    /// affect ordering.
    pub fn generate_policy(
        &self,
        business_policy: &BusinessPolicy,
        policy_name: &str,
    ) -> Result<Policy> {
        self.validate(business_policy)
            .map_err(|e| BusinessPolicyError::ValidationFailed(Box::new(e)))?;

        let service = &business_policy.service;
        let mut policy = Policy::new(policy_name);

        for choice in &service.service_versions {
            if choice.version.is_empty() {
                return Err(BusinessPolicyError::MissingVersion {
                    service: service.name.clone(),
                    arch: service.arch.clone(),
                    policy_name: policy_name.to_string(),
                });
            }
            convert_choice(choice, &service.name, &service.org, &service.arch, &mut policy);
        }

        convert_properties(&business_policy.properties, &mut policy)?;
        convert_constraints(&business_policy.constraints, &self.languages, &mut policy)?;

        convert_node_health(&service.node_health, &mut policy);

        policy.max_agreements = DEFAULT_MAX_AGREEMENTS;

        debug!("converted {} into {}", service, policy);

        Ok(policy)
    }
}

/// Append the workload for one service version to the policy.
pub fn convert_choice(
    choice: &WorkloadChoice,
    name: &str,
    org: &str,
    arch: &str,
    policy: &mut Policy,
) {
    let mut workload = Workload::new(
        name.to_string(),
        org.to_string(),
        choice.version.clone(),
        arch.to_string(),
    );
    workload.priority = policy::WorkloadPriority::new(
        choice.priority.priority_value,
        choice.priority.retries,
        choice.priority.retry_duration_s,
        choice.priority.verified_duration_s,
    );
    trace!("adding workload {}/{} {} {}", org, name, choice.version, arch);
    policy.add_workload(workload);
}

/// Copy the node health thresholds into the policy.
pub fn convert_node_health(node_health: &NodeHealth, policy: &mut Policy) {
    policy.set_node_health(policy::NodeHealth::new(
        node_health.missing_hb_interval,
        node_health.check_agreement_status,
    ));
}

/// Add every property to the policy, stopping at the first one it rejects.
/// Properties added before the failure stay in the policy.
pub fn convert_properties(properties: &PropertyList, policy: &mut Policy) -> Result<()> {
    for property in properties {
        policy
            .add_property(property)
            .map_err(|source| BusinessPolicyError::PropertyConversionFailed {
                property: property.to_string(),
                source,
            })?;
    }
    Ok(())
}

/// Translate the constraints into the policy's counter-party requirement.
/// Constraints that impose no requirement leave the policy untouched.
pub fn convert_constraints(
    constraints: &ConstraintExpression,
    languages: &ConstraintLanguages,
    policy: &mut Policy,
) -> Result<()> {
    let requirement = languages
        .to_required_property(constraints)
        .map_err(BusinessPolicyError::ConstraintConversionFailed)?;
    if let Some(requirement) = requirement {
        policy.set_counter_party_properties(requirement);
    }
    Ok(())
}
