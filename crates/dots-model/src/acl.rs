use serde::{Deserialize, Serialize};

/// When a data-channel ACL activates, mirroring the Arista-ACL vendor
/// extension carried by the original implementation
/// (`dots_common/messages/data/arista_acl.go`). The mitigation engine (spec
/// §4.5 step 8) engages `ActivateWhenMitigating` ACLs once a scope reaches
/// `SuccessfullyMitigated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AclActivationType {
    /// Activate only while the owning mitigation is actively mitigating.
    ActivateWhenMitigating,
    /// Activate immediately, independent of mitigation status.
    Immediate,
    /// Explicitly deactivated.
    Deactivate,
}

/// One data-channel ACL activation override attached to a mitigation scope's
/// `acl_list` (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclActivation {
    /// Name of the data-channel ACL resource.
    pub acl_name: String,
    /// How this ACL should activate relative to the owning mitigation.
    pub activation_type: AclActivationType,
}
