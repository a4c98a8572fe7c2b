//! Blocker-specific semantic validation (spec §4.9 `validate_scope`):
//! "ACL-appliance forbids several IP-header fields; TCP protocol only with
//! TCP matches; UDP similarly; ICMP restricted to protocol 1/58."
//!
//! The concrete vendor ACL/FlowSpec/RTBH drivers are out of scope (spec
//! §1); this module carries the protocol/port/target consistency rules a
//! driver would otherwise have to duplicate, so every [`crate::Blocker`]
//! implementation can call a shared, tested function from its own
//! `validate_scope`.

use crate::error::BlockerError;
use dots_config::BlockerKind;
use dots_model::{MitigationScope, Target};

/// TCP.
const PROTO_TCP: u8 = 6;
/// UDP.
const PROTO_UDP: u8 = 17;
/// ICMPv4.
const PROTO_ICMP: u8 = 1;
/// ICMPv6.
const PROTO_ICMPV6: u8 = 58;

/// Validates `scope`'s target against the semantic rules for `kind`
/// (spec §4.9). `aliases` are the expanded alias targets already folded
/// into `scope.target` by the mitigation engine (spec §4.5 step 5); kept
/// as a parameter so a future per-alias exemption can be added without
/// changing the call signature.
pub fn validate_scope(kind: BlockerKind, scope: &MitigationScope, _aliases: &[Target]) -> Result<(), BlockerError> {
    validate_icmp_has_no_ports(&scope.target)?;
    validate_ports_require_tcp_or_udp(&scope.target)?;
    if kind == BlockerKind::AclAppliance {
        validate_acl_appliance_requires_ip_target(&scope.target)?;
    }
    Ok(())
}

fn validate_icmp_has_no_ports(target: &Target) -> Result<(), BlockerError> {
    let icmp_only = !target.protocols.is_empty()
        && target
            .protocols
            .iter()
            .all(|p| *p == PROTO_ICMP || *p == PROTO_ICMPV6);
    if icmp_only && !target.port_ranges.is_empty() {
        return Err(BlockerError::validation(
            "ICMP (protocol 1/58) targets must not carry port ranges",
        ));
    }
    Ok(())
}

fn validate_ports_require_tcp_or_udp(target: &Target) -> Result<(), BlockerError> {
    if target.port_ranges.is_empty() {
        return Ok(());
    }
    if target.protocols.is_empty() {
        return Ok(());
    }
    let all_tcp_udp = target
        .protocols
        .iter()
        .all(|p| *p == PROTO_TCP || *p == PROTO_UDP);
    if !all_tcp_udp {
        return Err(BlockerError::validation(
            "port-range targets require protocol 6 (TCP) or 17 (UDP)",
        ));
    }
    Ok(())
}

fn validate_acl_appliance_requires_ip_target(target: &Target) -> Result<(), BlockerError> {
    if target.prefixes.is_empty() {
        return Err(BlockerError::validation(
            "ACL-appliance blockers filter on IP headers and require at least one target prefix",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dots_model::scope::{AttackStatus, MitigationStatus};
    use dots_model::PortRange;

    fn scope(target: Target) -> MitigationScope {
        MitigationScope {
            customer_id: 1,
            cuid: "c1".into(),
            mid: 1,
            scope_id: 1,
            target,
            lifetime: 3600,
            trigger_mitigation: true,
            status: MitigationStatus::InProgress,
            attack_status: Some(AttackStatus::UnderAttack),
            acl_list: None,
            last_modified: chrono::Utc::now(),
        }
    }

    #[test]
    fn icmp_with_ports_is_rejected() {
        let target = Target {
            protocols: vec![PROTO_ICMP],
            port_ranges: vec![PortRange::new(80, None)],
            ..Default::default()
        };
        let err = validate_scope(BlockerKind::FlowSpec, &scope(target), &[]).unwrap_err();
        assert_eq!(err.kind, crate::error::BlockerErrorKind::Validation);
    }

    #[test]
    fn ports_with_icmp_and_tcp_mixed_is_rejected() {
        let target = Target {
            protocols: vec![PROTO_ICMP, PROTO_TCP],
            port_ranges: vec![PortRange::new(443, None)],
            ..Default::default()
        };
        assert!(validate_scope(BlockerKind::Rtbh, &scope(target), &[]).is_err());
    }

    #[test]
    fn tcp_ports_are_accepted() {
        let target = Target {
            prefixes: vec!["192.0.2.0/24".parse().unwrap()],
            protocols: vec![PROTO_TCP],
            port_ranges: vec![PortRange::new(443, None)],
            ..Default::default()
        };
        assert!(validate_scope(BlockerKind::AclAppliance, &scope(target), &[]).is_ok());
    }

    #[test]
    fn acl_appliance_requires_a_prefix() {
        let target = Target {
            fqdns: vec!["attack.example".into()],
            ..Default::default()
        };
        let err = validate_scope(BlockerKind::AclAppliance, &scope(target), &[]).unwrap_err();
        assert_eq!(err.kind, crate::error::BlockerErrorKind::Validation);
    }
}
