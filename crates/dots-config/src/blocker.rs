//! Per-customer blocker registry configuration (spec §4.9 "Selection
//! Service"): the mitigation engine asks the registry for the blockers
//! configured for a customer and a `target_type`; the actual blocker
//! drivers are an external collaborator (spec §1) and are not configured
//! here beyond an opaque `endpoint` string.

use dots_model::ProtectionTargetType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which family of blocker a [`BlockerConfig`] entry drives (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockerKind {
    /// Remote-triggered blackhole via BGP.
    Rtbh,
    /// BGP FlowSpec.
    FlowSpec,
    /// A stateful ACL appliance.
    AclAppliance,
}

impl BlockerKind {
    /// `true` for blocker families the engine invokes synchronously
    /// (spec §5 "Parallelism": "BGP-family blockers are invoked
    /// synchronously because their libraries are fast and
    /// ordering-sensitive").
    #[must_use]
    pub const fn is_synchronous(self) -> bool {
        matches!(self, Self::Rtbh | Self::FlowSpec)
    }
}

/// One configured blocker instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerConfig {
    /// Operator-facing name, also used as `Protection::session_name`.
    pub name: String,
    /// Blocker family, determining sync/async invocation (spec §4.9, §5).
    pub kind: BlockerKind,
    /// The target type this blocker is eligible to realize.
    pub target_type: ProtectionTargetType,
    /// Opaque vendor endpoint/address; the concrete driver interprets it.
    pub endpoint: String,
}

/// Per-customer blocker registry: which [`BlockerConfig`]s a customer may
/// use, keyed by customer id, plus a registry-wide default used when a
/// customer has no specific entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockerRegistryConfig {
    /// Customer-specific blocker lists.
    #[serde(default)]
    pub per_customer: HashMap<i64, Vec<BlockerConfig>>,
    /// Fallback list used for customers with no specific entry.
    #[serde(default)]
    pub default: Vec<BlockerConfig>,
}

impl BlockerRegistryConfig {
    /// Returns the blockers eligible for `customer_id` and `target_type`,
    /// customer-specific entries first, falling back to `default`.
    #[must_use]
    pub fn eligible(&self, customer_id: i64, target_type: ProtectionTargetType) -> Vec<&BlockerConfig> {
        let pool = self
            .per_customer
            .get(&customer_id)
            .map_or(self.default.as_slice(), Vec::as_slice);
        pool.iter().filter(|b| b.target_type == target_type).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocker(name: &str, kind: BlockerKind) -> BlockerConfig {
        BlockerConfig {
            name: name.into(),
            kind,
            target_type: ProtectionTargetType::MitigationAcl,
            endpoint: "10.0.0.1:179".into(),
        }
    }

    #[test]
    fn falls_back_to_default_for_unknown_customer() {
        let mut registry = BlockerRegistryConfig::default();
        registry.default.push(blocker("edge-rtbh", BlockerKind::Rtbh));
        let found = registry.eligible(999, ProtectionTargetType::MitigationAcl);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "edge-rtbh");
    }

    #[test]
    fn customer_specific_entries_shadow_default() {
        let mut registry = BlockerRegistryConfig::default();
        registry.default.push(blocker("edge-rtbh", BlockerKind::Rtbh));
        registry
            .per_customer
            .insert(7, vec![blocker("acme-acl", BlockerKind::AclAppliance)]);
        let found = registry.eligible(7, ProtectionTargetType::MitigationAcl);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "acme-acl");
    }
}
