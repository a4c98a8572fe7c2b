use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// An inclusive port range. `upper` defaults to `lower` when not given on
/// the wire (spec §3 "MitigationScope").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRange {
    /// Lower bound, inclusive.
    pub lower: u16,
    /// Upper bound, inclusive. Equal to `lower` for a single port.
    pub upper: u16,
}

impl PortRange {
    /// Builds a port range, defaulting `upper` to `lower` if `None`.
    #[must_use]
    pub fn new(lower: u16, upper: Option<u16>) -> Self {
        Self {
            lower,
            upper: upper.unwrap_or(lower),
        }
    }

    /// Returns `true` if `self` and `other` share at least one port.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }
}

/// The target of a mitigation scope, telemetry baseline, or pre-mitigation
/// record: an ordered set of prefixes, port ranges, IP protocols, FQDNs,
/// URIs and alias names (spec §3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// IP prefixes, normalized: no entry here is contained by another.
    #[serde(default)]
    pub prefixes: Vec<IpNet>,
    /// Port ranges.
    #[serde(default)]
    pub port_ranges: Vec<PortRange>,
    /// IP protocol numbers (e.g. 6=TCP, 17=UDP, 1=ICMP).
    #[serde(default)]
    pub protocols: Vec<u8>,
    /// Fully-qualified domain names.
    #[serde(default)]
    pub fqdns: Vec<String>,
    /// URIs.
    #[serde(default)]
    pub uris: Vec<String>,
    /// Data-channel alias names whose expansion has been merged in.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Target {
    /// Removes any prefix in `prefixes` that is contained by another prefix
    /// in the same set, as required by spec §3: "Target prefixes are always
    /// normalized by removing ones contained by another."
    pub fn normalize_prefixes(&mut self) {
        let originals = self.prefixes.clone();
        self.prefixes.retain(|candidate| {
            !originals
                .iter()
                .any(|other| other != candidate && other.contains(candidate))
        });
        self.prefixes.sort_by_key(|p| (p.addr(), p.prefix_len()));
        self.prefixes.dedup();
    }

    /// Returns `true` if any prefix of `self` overlaps (contains, is
    /// contained by, or is equal to) any prefix of `other`. This is the
    /// "target-prefix containment" rule used by both mitigation overlap
    /// detection (spec §4.5) and telemetry baseline overlap (spec §4.6).
    #[must_use]
    pub fn prefixes_overlap(&self, other: &Self) -> bool {
        self.prefixes.iter().any(|a| {
            other
                .prefixes
                .iter()
                .any(|b| a.contains(b) || b.contains(a))
        })
    }

    /// Returns `true` if `self` and `other` share a port in any of their
    /// port ranges. An empty port-range set is treated as "all ports" for
    /// overlap purposes, matching the original's any-port default.
    #[must_use]
    pub fn ports_overlap(&self, other: &Self) -> bool {
        if self.port_ranges.is_empty() || other.port_ranges.is_empty() {
            return true;
        }
        self.port_ranges
            .iter()
            .any(|a| other.port_ranges.iter().any(|b| a.overlaps(b)))
    }

    /// Returns `true` if `self` and `other` share an IP protocol. An empty
    /// protocol set is treated as "all protocols".
    #[must_use]
    pub fn protocols_overlap(&self, other: &Self) -> bool {
        if self.protocols.is_empty() || other.protocols.is_empty() {
            return true;
        }
        self.protocols.iter().any(|p| other.protocols.contains(p))
    }

    /// Full overlap test used by the mitigation engine's overlap check
    /// (spec §4.5 step 6): prefixes, ports and protocols must all overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.prefixes_overlap(other) && self.ports_overlap(other) && self.protocols_overlap(other)
    }

    /// Merges in another target's fields (used to fold an alias expansion
    /// into a scope's native targets, spec §4.5 step 5), then re-normalizes
    /// prefixes.
    pub fn merge(&mut self, other: &Self) {
        self.prefixes.extend(other.prefixes.iter().copied());
        self.port_ranges.extend(other.port_ranges.iter().copied());
        for p in &other.protocols {
            if !self.protocols.contains(p) {
                self.protocols.push(*p);
            }
        }
        for f in &other.fqdns {
            if !self.fqdns.contains(f) {
                self.fqdns.push(f.clone());
            }
        }
        for u in &other.uris {
            if !self.uris.contains(u) {
                self.uris.push(u.clone());
            }
        }
        self.normalize_prefixes();
    }
}
