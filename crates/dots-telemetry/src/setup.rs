//! Telemetry-setup store (C6, spec §4.6): the three disjoint body shapes
//! (`configuration`/`pipe`/`baseline`) share one PUT endpoint, each kind
//! with its own overlap rule. Grounded on the teacher's overlap-resolution
//! style in `dots-mitigation`'s `put_create_or_update` (same shape: walk
//! every existing row, classify same-owner vs. cross-owner collisions,
//! reject or supersede), generalized to the pipe/baseline matrix spec §4.6
//! defines.

use crate::error::{TelemetryError, TelemetryErrorKind};
use dots_model::conflict::{ConflictCause, ConflictInformation};
use dots_model::{Target, TelemetrySetup, TelemetrySetupBody, TelemetrySetupType};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Key identifying one telemetry-setup row: a client may hold several rows
/// of the same [`TelemetrySetupType`] under different `tsid`s (spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SetupKey {
    customer_id: i64,
    cuid: String,
    tsid: u32,
}

/// In-memory store for telemetry-setup rows, applying the per-shape
/// overlap rule on every PUT.
#[derive(Default)]
pub struct TelemetrySetupStore {
    rows: RwLock<HashMap<SetupKey, TelemetrySetup>>,
}

impl TelemetrySetupStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row a client currently holds.
    #[must_use]
    pub fn list_for_client(&self, customer_id: i64, cuid: &str) -> Vec<TelemetrySetup> {
        self.rows
            .read()
            .values()
            .filter(|r| r.customer_id == customer_id && r.cuid == cuid)
            .cloned()
            .collect()
    }

    /// Whether a row already exists for this exact `(customer, cuid,
    /// tsid)`, used by the dispatcher to report `2.01 Created` vs `2.04
    /// Changed` (spec §6).
    #[must_use]
    pub fn contains(&self, customer_id: i64, cuid: &str, tsid: u32) -> bool {
        let key = SetupKey { customer_id, cuid: cuid.to_string(), tsid };
        self.rows.read().contains_key(&key)
    }

    /// Removes every row a client holds (peace-time housekeeping on
    /// `tsid=0`, mirroring the mitigation engine's `mid=0` convention).
    pub fn clear_for_client(&self, customer_id: i64, cuid: &str) {
        self.rows
            .write()
            .retain(|k, _| !(k.customer_id == customer_id && k.cuid == cuid));
    }

    /// Handles a telemetry-setup PUT: dispatches on the body's
    /// [`TelemetrySetupType`] to the matching overlap rule, then stores (or
    /// deletes, for a zero-capacity pipe) the row.
    pub fn put(
        &self,
        customer_id: i64,
        cuid: &str,
        tsid: u32,
        body: TelemetrySetupBody,
    ) -> Result<Option<TelemetrySetup>, TelemetryError> {
        match &body {
            TelemetrySetupBody::Configuration { .. } => {
                let row = TelemetrySetup { customer_id, cuid: cuid.to_string(), tsid, body };
                self.rows.write().insert(
                    SetupKey { customer_id, cuid: cuid.to_string(), tsid },
                    row.clone(),
                );
                Ok(Some(row))
            }
            TelemetrySetupBody::Pipe(pipe) => self.put_pipe(customer_id, cuid, tsid, pipe.clone()),
            TelemetrySetupBody::Baseline(baseline) => {
                self.put_baseline(customer_id, cuid, tsid, baseline.clone())
            }
        }
    }

    /// Pipe overlap rule (spec §4.6): rows are compared by `(link_id,
    /// unit)`. Same owner with a lower `tsid` already present -> delete the
    /// old row and install the new one. Same owner with an equal `tsid` ->
    /// replace in place. A different owner declaring the same link/unit ->
    /// `4.09 Conflict` (`overlap-pipe-scope`). A `capacity` of zero deletes
    /// the link outright rather than storing a zero-capacity row.
    fn put_pipe(
        &self,
        customer_id: i64,
        cuid: &str,
        tsid: u32,
        pipe: dots_model::PipeEntry,
    ) -> Result<Option<TelemetrySetup>, TelemetryError> {
        let mut rows = self.rows.write();
        let colliding: Vec<SetupKey> = rows
            .iter()
            .filter(|(k, _)| k.tsid != tsid || k.cuid != cuid || k.customer_id != customer_id)
            .filter_map(|(k, v)| match &v.body {
                TelemetrySetupBody::Pipe(other) if other.link_id == pipe.link_id && other.unit == pipe.unit => {
                    Some(k.clone())
                }
                _ => None,
            })
            .collect();

        for key in &colliding {
            if key.customer_id == customer_id && key.cuid == cuid {
                // Same owner, any other tsid: whether the existing row's
                // tsid is lower (stale declaration) or equal (re-PUT under
                // the same tsid), the new PUT replaces it in place.
                rows.remove(key);
            } else {
                return Err(TelemetryError::conflict(
                    ConflictInformation::new(ConflictCause::OverlapPipeScope).with_tsid(key.tsid),
                    "pipe capacity for this link is already declared by another client",
                ));
            }
        }

        let key = SetupKey { customer_id, cuid: cuid.to_string(), tsid };
        if pipe.capacity == 0 {
            rows.remove(&key);
            return Ok(None);
        }
        let row = TelemetrySetup {
            customer_id,
            cuid: cuid.to_string(),
            tsid,
            body: TelemetrySetupBody::Pipe(pipe),
        };
        rows.insert(key, row.clone());
        Ok(Some(row))
    }

    /// Baseline overlap rule (spec §4.6): rows are compared by
    /// target-prefix containment (the same matrix `Target::prefixes_overlap`
    /// already implements for mitigation scopes). Same owner -> the new
    /// PUT supersedes the old baseline for the overlapping target; a
    /// different owner -> `4.09 Conflict` (`overlap-targets`).
    fn put_baseline(
        &self,
        customer_id: i64,
        cuid: &str,
        tsid: u32,
        baseline: dots_model::BaselineEntry,
    ) -> Result<Option<TelemetrySetup>, TelemetryError> {
        let mut rows = self.rows.write();
        let colliding: Vec<SetupKey> = rows
            .iter()
            .filter(|(k, _)| !(k.tsid == tsid && k.cuid == cuid && k.customer_id == customer_id))
            .filter_map(|(k, v)| match &v.body {
                TelemetrySetupBody::Baseline(other) if targets_overlap(&other.target, &baseline.target) => {
                    Some(k.clone())
                }
                _ => None,
            })
            .collect();

        for key in &colliding {
            if key.customer_id == customer_id && key.cuid == cuid {
                rows.remove(key);
            } else {
                return Err(TelemetryError::conflict(
                    ConflictInformation::new(ConflictCause::OverlapTargets).with_tsid(key.tsid),
                    "baseline target overlaps one owned by another client",
                ));
            }
        }

        let key = SetupKey { customer_id, cuid: cuid.to_string(), tsid };
        let row = TelemetrySetup {
            customer_id,
            cuid: cuid.to_string(),
            tsid,
            body: TelemetrySetupBody::Baseline(baseline),
        };
        rows.insert(key, row.clone());
        Ok(Some(row))
    }
}

fn targets_overlap(a: &Target, b: &Target) -> bool {
    a.prefixes_overlap(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dots_model::{BaselineEntry, PipeEntry};

    fn prefix_target(cidr: &str) -> Target {
        Target {
            prefixes: vec![cidr.parse().unwrap()],
            ..Target::default()
        }
    }

    #[test]
    fn pipe_zero_capacity_deletes_the_link() {
        let store = TelemetrySetupStore::new();
        store
            .put(
                7,
                "c1",
                1,
                TelemetrySetupBody::Pipe(PipeEntry {
                    link_id: "wan0".into(),
                    capacity: 1_000_000,
                    unit: "mbps".into(),
                }),
            )
            .unwrap();
        let result = store
            .put(
                7,
                "c1",
                1,
                TelemetrySetupBody::Pipe(PipeEntry {
                    link_id: "wan0".into(),
                    capacity: 0,
                    unit: "mbps".into(),
                }),
            )
            .unwrap();
        assert!(result.is_none());
        assert!(store.list_for_client(7, "c1").is_empty());
    }

    #[test]
    fn pipe_same_owner_lower_tsid_is_superseded() {
        let store = TelemetrySetupStore::new();
        store
            .put(
                7,
                "c1",
                1,
                TelemetrySetupBody::Pipe(PipeEntry { link_id: "wan0".into(), capacity: 100, unit: "mbps".into() }),
            )
            .unwrap();
        store
            .put(
                7,
                "c1",
                2,
                TelemetrySetupBody::Pipe(PipeEntry { link_id: "wan0".into(), capacity: 200, unit: "mbps".into() }),
            )
            .unwrap();
        let rows = store.list_for_client(7, "c1");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tsid, 2);
    }

    #[test]
    fn pipe_cross_owner_collision_is_conflict() {
        let store = TelemetrySetupStore::new();
        store
            .put(
                7,
                "c1",
                1,
                TelemetrySetupBody::Pipe(PipeEntry { link_id: "wan0".into(), capacity: 100, unit: "mbps".into() }),
            )
            .unwrap();
        let err = store
            .put(
                8,
                "c2",
                1,
                TelemetrySetupBody::Pipe(PipeEntry { link_id: "wan0".into(), capacity: 100, unit: "mbps".into() }),
            )
            .unwrap_err();
        assert_eq!(err.kind, TelemetryErrorKind::Conflict);
    }

    #[test]
    fn baseline_cross_owner_overlap_is_conflict() {
        let store = TelemetrySetupStore::new();
        store
            .put(
                7,
                "c1",
                1,
                TelemetrySetupBody::Baseline(BaselineEntry {
                    target: prefix_target("192.0.2.0/24"),
                    total_traffic_bps: 1000,
                    total_connection_rate: 10,
                }),
            )
            .unwrap();
        let err = store
            .put(
                8,
                "c2",
                1,
                TelemetrySetupBody::Baseline(BaselineEntry {
                    target: prefix_target("192.0.2.128/25"),
                    total_traffic_bps: 2000,
                    total_connection_rate: 20,
                }),
            )
            .unwrap_err();
        assert_eq!(err.kind, TelemetryErrorKind::Conflict);
    }

    #[test]
    fn baseline_same_owner_overlap_supersedes() {
        let store = TelemetrySetupStore::new();
        store
            .put(
                7,
                "c1",
                1,
                TelemetrySetupBody::Baseline(BaselineEntry {
                    target: prefix_target("192.0.2.0/24"),
                    total_traffic_bps: 1000,
                    total_connection_rate: 10,
                }),
            )
            .unwrap();
        store
            .put(
                7,
                "c1",
                2,
                TelemetrySetupBody::Baseline(BaselineEntry {
                    target: prefix_target("192.0.2.128/25"),
                    total_traffic_bps: 2000,
                    total_connection_rate: 20,
                }),
            )
            .unwrap();
        let rows = store.list_for_client(7, "c1");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tsid, 2);
    }
}
