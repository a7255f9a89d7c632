//! Business policy validation and internal policy generation.
//!
//! A [`BusinessPolicy`] describes which service versions a node should run and
//! how nodes are matched. [`PolicyTranslator`] checks that such a document is
//! complete and converts it into the internal [`Policy`] used for agreement
//! negotiation:
//!
//! ```
//! use edge_policy_generation::{BusinessPolicy, JsonProvider, PolicyTranslator};
//!
//! let document = r#"{
//!     "label": "weather",
//!     "description": "",
//!     "service": {
//!         "name": "weather", "org": "acme", "arch": "amd64",
//!         "serviceVersions": [{"version": "1.0.0"}],
//!         "nodeHealth": {"missing_heartbeat_interval": 60, "check_agreement_status": 30}
//!     },
//!     "constraints": ["purpose == weather"]
//! }"#;
//!
//! let business_policy: BusinessPolicy = JsonProvider::parse_business_policy(document)
//!     .unwrap()
//!     .unwrap();
//! let policy = PolicyTranslator::new()
//!     .generate_policy(&business_policy, "weather-policy")
//!     .unwrap();
//! assert_eq!(policy.workloads.len(), 1);
//! assert_eq!(policy.max_agreements, 5);
//! ```

pub mod business;
pub mod errors;
pub mod external;
pub mod policy;
pub mod providers;

pub use business::{
    BusinessPolicy, NodeHealth, PolicyTranslator, ServiceRef, UpgradePolicy, WorkloadChoice,
    WorkloadPriority, DEFAULT_MAX_AGREEMENTS,
};
pub use errors::{BusinessPolicyError, ConstraintError, PolicyError, PropertyError, Result};
pub use external::{ConstraintExpression, ConstraintLanguage, ConstraintLanguages, Property, PropertyList};
pub use policy::{Policy, RequiredProperty};
pub use providers::JsonProvider;
