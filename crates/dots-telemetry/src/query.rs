//! URI-filtering query semantics for telemetry pre-mitigation GETs (spec
//! §4.6): a GET may narrow the returned reports by `target-prefix`,
//! `target-port`, `target-protocol`, `target-fqdn`, `alias-name`,
//! `source-prefix`, `source-port`, `source-icmp-type` and `content`
//! (`c`/`n`/`a`). Resolved per SPEC_FULL.md §D: `source-*` queries are
//! validated (known key, well-formed value) but do not filter anything —
//! pre-mitigation reports carry no per-source index — and a query naming
//! only `source-*` attributes is rejected as bad-request rather than
//! silently returning everything.

use crate::error::TelemetryError;
use dots_model::{PortRange, Target, TelemetryPreMitigation};

/// One parsed filter query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterQuery {
    /// `target-prefix=<cidr>`.
    TargetPrefix(ipnet::IpNet),
    /// `target-port=<n>` or `<lower>-<upper>`.
    TargetPort(PortRange),
    /// `target-protocol=<n>`.
    TargetProtocol(u8),
    /// `target-fqdn=<name>`, optionally wildcarded with a single leading
    /// `*` (spec §4.6: "no range or wildcard markers are supported except
    /// a single leading `*` on `target-fqdn`").
    TargetFqdn(String),
    /// `alias-name=<name>`.
    AliasName(String),
    /// `source-prefix=<cidr>`: validated, not indexed.
    SourcePrefix(ipnet::IpNet),
    /// `source-port=<n>`: validated, not indexed.
    SourcePort(PortRange),
    /// `source-icmp-type=<n>`: validated, not indexed.
    SourceIcmpType(u8),
    /// `content=c|n|a` (current/next/accumulated aggregation window).
    Content(ContentSelector),
}

/// The `content` query's three legal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSelector {
    /// `c`: current measurement interval.
    Current,
    /// `n`: next-scheduled measurement interval.
    Next,
    /// `a`: accumulated since the telemetry setup was installed.
    Accumulated,
}

impl ContentSelector {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "c" => Some(Self::Current),
            "n" => Some(Self::Next),
            "a" => Some(Self::Accumulated),
            _ => None,
        }
    }
}

fn is_source_key(key: &str) -> bool {
    key.starts_with("source-")
}

/// Parses and validates the `Uri-Query` tokens of a pre-mitigation GET.
/// Rejects an unknown key, a malformed value, `target-uri` (unsupported,
/// spec §4.6), and a query set containing only `source-*` keys.
pub fn parse_queries(tokens: &[(String, String)]) -> Result<Vec<FilterQuery>, TelemetryError> {
    let mut queries = Vec::with_capacity(tokens.len());
    for (key, value) in tokens {
        let parsed = match key.as_str() {
            "target-prefix" => FilterQuery::TargetPrefix(
                value
                    .parse()
                    .map_err(|_| TelemetryError::validation(format!("malformed target-prefix '{value}'")))?,
            ),
            "target-port" => FilterQuery::TargetPort(parse_port_range(value)?),
            "target-protocol" => FilterQuery::TargetProtocol(
                value
                    .parse()
                    .map_err(|_| TelemetryError::validation(format!("malformed target-protocol '{value}'")))?,
            ),
            "target-fqdn" => FilterQuery::TargetFqdn(validate_target_fqdn(value)?),
            "alias-name" => FilterQuery::AliasName(validate_no_range_or_wildcard("alias-name", value)?),
            "target-uri" => {
                return Err(TelemetryError::validation("target-uri is not a supported filter key"))
            }
            "source-prefix" => FilterQuery::SourcePrefix(
                value
                    .parse()
                    .map_err(|_| TelemetryError::validation(format!("malformed source-prefix '{value}'")))?,
            ),
            "source-port" => FilterQuery::SourcePort(parse_port_range(value)?),
            "source-icmp-type" => FilterQuery::SourceIcmpType(
                value
                    .parse()
                    .map_err(|_| TelemetryError::validation(format!("malformed source-icmp-type '{value}'")))?,
            ),
            "content" => FilterQuery::Content(
                ContentSelector::parse(value)
                    .ok_or_else(|| TelemetryError::validation(format!("content must be c, n or a, got '{value}'")))?,
            ),
            other => return Err(TelemetryError::validation(format!("unrecognized query key '{other}'"))),
        };
        queries.push(parsed);
    }

    if !queries.is_empty() && queries.iter().all(|q| matches!(q, FilterQuery::SourcePrefix(_) | FilterQuery::SourcePort(_) | FilterQuery::SourceIcmpType(_))) {
        return Err(TelemetryError::validation(
            "a query naming only source-* attributes is not supported (no per-source index exists)",
        ));
    }

    Ok(queries)
}

/// Rejects a range (`-`) or wildcard (`*`) marker in a query value that
/// spec §4.6 requires to be a plain literal (`alias-name`, `source-prefix`).
fn validate_no_range_or_wildcard(key: &str, value: &str) -> Result<String, TelemetryError> {
    if value.contains('-') || value.contains('*') {
        return Err(TelemetryError::validation(format!(
            "{key} must not contain a range ('-') or wildcard ('*') marker, got '{value}'"
        )));
    }
    Ok(value.to_string())
}

/// `target-fqdn` permits a single leading `*` (spec §4.6) but no other
/// wildcard or range marker.
fn validate_target_fqdn(value: &str) -> Result<String, TelemetryError> {
    let rest = value.strip_prefix('*').unwrap_or(value);
    if rest.contains('*') || rest.contains('-') {
        return Err(TelemetryError::validation(format!(
            "target-fqdn must not contain a range ('-') or wildcard ('*') marker except a single leading '*', got '{value}'"
        )));
    }
    Ok(value.to_string())
}

fn parse_port_range(value: &str) -> Result<PortRange, TelemetryError> {
    if let Some((lo, hi)) = value.split_once('-') {
        let lower: u16 = lo.parse().map_err(|_| TelemetryError::validation(format!("malformed port range '{value}'")))?;
        let upper: u16 = hi.parse().map_err(|_| TelemetryError::validation(format!("malformed port range '{value}'")))?;
        Ok(PortRange::new(lower, Some(upper)))
    } else {
        let port: u16 = value.parse().map_err(|_| TelemetryError::validation(format!("malformed port '{value}'")))?;
        Ok(PortRange::new(port, None))
    }
}

/// `true` if `report` matches every `target-*`/`alias-name` filter in
/// `queries` (an empty filter set, or a set with only validated-but-
/// unindexed `source-*`/`content` queries, matches everything).
#[must_use]
pub fn matches(report: &TelemetryPreMitigation, queries: &[FilterQuery]) -> bool {
    queries.iter().all(|q| match q {
        FilterQuery::TargetPrefix(prefix) => target_prefix_matches(&report.targets, *prefix),
        FilterQuery::TargetPort(range) => report.targets.port_ranges.iter().any(|p| p.overlaps(range)) || report.targets.port_ranges.is_empty(),
        FilterQuery::TargetProtocol(proto) => report.targets.protocols.contains(proto) || report.targets.protocols.is_empty(),
        FilterQuery::TargetFqdn(pattern) => target_fqdn_matches(&report.targets, pattern),
        FilterQuery::AliasName(name) => report.targets.aliases.iter().any(|a| a == name),
        // source-*/content are validated but do not filter (no per-source
        // index exists on a pre-mitigation report, SPEC_FULL.md §D).
        FilterQuery::SourcePrefix(_)
        | FilterQuery::SourcePort(_)
        | FilterQuery::SourceIcmpType(_)
        | FilterQuery::Content(_) => true,
    })
}

fn target_prefix_matches(target: &Target, prefix: ipnet::IpNet) -> bool {
    target.prefixes.iter().any(|p| p.contains(&prefix) || prefix.contains(p))
}

fn target_fqdn_matches(target: &Target, pattern: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        target.fqdns.iter().any(|f| f.ends_with(suffix))
    } else {
        target.fqdns.iter().any(|f| f == pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dots_model::Target;

    fn report_with_prefix(cidr: &str) -> TelemetryPreMitigation {
        TelemetryPreMitigation {
            customer_id: 1,
            cuid: "c1".into(),
            tmid: 1,
            targets: Target {
                prefixes: vec![cidr.parse().unwrap()],
                ..Target::default()
            },
            total_traffic_bps: 0,
            attack_traffic_bps: 0,
            total_connections: 0,
            attack_detail: Vec::new(),
        }
    }

    fn tok(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn source_only_query_is_rejected() {
        let err = parse_queries(&[tok("source-prefix", "198.51.100.0/24")]).unwrap_err();
        assert_eq!(err.kind, crate::error::TelemetryErrorKind::Validation);
    }

    #[test]
    fn target_uri_is_rejected() {
        let err = parse_queries(&[tok("target-uri", "https://example.com")]).unwrap_err();
        assert_eq!(err.kind, crate::error::TelemetryErrorKind::Validation);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse_queries(&[tok("bogus", "1")]).unwrap_err();
        assert_eq!(err.kind, crate::error::TelemetryErrorKind::Validation);
    }

    #[test]
    fn target_prefix_mixed_with_source_prefix_is_accepted() {
        let queries = parse_queries(&[tok("target-prefix", "192.0.2.0/24"), tok("source-prefix", "198.51.100.0/24")]).unwrap();
        assert_eq!(queries.len(), 2);
    }

    #[test]
    fn matches_filters_by_target_prefix_containment() {
        let report = report_with_prefix("192.0.2.0/24");
        let queries = parse_queries(&[tok("target-prefix", "192.0.2.128/25")]).unwrap();
        assert!(matches(&report, &queries));
        let queries2 = parse_queries(&[tok("target-prefix", "203.0.113.0/24")]).unwrap();
        assert!(!matches(&report, &queries2));
    }

    #[test]
    fn target_fqdn_wildcard_matches_suffix() {
        let mut report = report_with_prefix("192.0.2.0/24");
        report.targets.fqdns.push("api.example.com".into());
        let queries = parse_queries(&[tok("target-fqdn", "*.example.com")]).unwrap();
        assert!(matches(&report, &queries));
    }

    #[test]
    fn target_fqdn_with_non_leading_wildcard_is_rejected() {
        let err = parse_queries(&[tok("target-fqdn", "a*b.example.com")]).unwrap_err();
        assert_eq!(err.kind, crate::error::TelemetryErrorKind::Validation);
    }

    #[test]
    fn target_fqdn_with_range_marker_is_rejected() {
        let err = parse_queries(&[tok("target-fqdn", "a-b.example.com")]).unwrap_err();
        assert_eq!(err.kind, crate::error::TelemetryErrorKind::Validation);
    }

    #[test]
    fn alias_name_with_wildcard_is_rejected() {
        let err = parse_queries(&[tok("alias-name", "web*")]).unwrap_err();
        assert_eq!(err.kind, crate::error::TelemetryErrorKind::Validation);
    }

    #[test]
    fn alias_name_with_range_marker_is_rejected() {
        let err = parse_queries(&[tok("alias-name", "web-1")]).unwrap_err();
        assert_eq!(err.kind, crate::error::TelemetryErrorKind::Validation);
    }

    #[test]
    fn plain_alias_name_is_accepted() {
        let queries = parse_queries(&[tok("alias-name", "web1")]).unwrap();
        assert_eq!(queries.len(), 1);
    }
}
