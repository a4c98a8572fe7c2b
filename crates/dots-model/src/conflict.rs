use serde::{Deserialize, Serialize};

/// Why a mitigation or telemetry-setup request was rejected as conflicting
/// (spec §3 "ConflictInformation").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictCause {
    /// Two active scopes target overlapping resources.
    OverlapTargets,
    /// The same `cuid` was presented by two different customers.
    CuidCollision,
    /// Two telemetry pipe-capacity rows share the same link/unit scope.
    OverlapPipeScope,
}

/// Identifies the scope/alias a conflicting request collided with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictScope {
    /// The `mid` of the scope already holding the resource, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_mid: Option<u32>,
    /// The alias name already holding the resource, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_alias: Option<String>,
    /// The `tsid` of the telemetry-setup row already holding the resource,
    /// if applicable (spec §4.6 pipe/baseline overlap).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_tsid: Option<u32>,
}

/// The body of a `4.09 Conflict` response (spec §3, §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictInformation {
    /// Classification of the conflict.
    pub cause: ConflictCause,
    /// The specific scope/alias in conflict, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ConflictScope>,
}

impl ConflictInformation {
    /// Builds conflict information with no scope detail attached.
    #[must_use]
    pub const fn new(cause: ConflictCause) -> Self {
        Self { cause, scope: None }
    }

    /// Attaches the conflicting `mid`.
    #[must_use]
    pub fn with_mid(mut self, mid: u32) -> Self {
        self.scope.get_or_insert_with(ConflictScope::default).conflicting_mid = Some(mid);
        self
    }

    /// Attaches the conflicting alias name.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.scope
            .get_or_insert_with(ConflictScope::default)
            .conflicting_alias = Some(alias.into());
        self
    }

    /// Attaches the conflicting telemetry-setup `tsid`.
    #[must_use]
    pub fn with_tsid(mut self, tsid: u32) -> Self {
        self.scope.get_or_insert_with(ConflictScope::default).conflicting_tsid = Some(tsid);
        self
    }
}
