//! Telemetry pre-mitigation store (C6, spec §4.6): reports keyed by
//! `(customer, cuid, tmid)`, filtered on GET by the query predicates in
//! [`crate::query`], with attack-detail rows validated against the
//! per-client vendor-mapping table (spec §4.6 "vendor-mapping
//! interaction").

use crate::error::TelemetryError;
use crate::query::{self, FilterQuery};
use crate::vendor::VendorMappingTable;
use dots_model::TelemetryPreMitigation;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReportKey {
    customer_id: i64,
    cuid: String,
    tmid: u32,
}

/// In-memory store for telemetry pre-mitigation reports.
#[derive(Default)]
pub struct PreMitigationStore {
    reports: RwLock<HashMap<ReportKey, TelemetryPreMitigation>>,
}

impl PreMitigationStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a pre-mitigation PUT. Each `AttackDetail` row
    /// must carry either a free-text `attack_description` or a
    /// `(vendor_id, attack_id)` pair the vendor-mapping table can resolve
    /// for this client, not both and not neither (spec §4.6).
    pub fn put(
        &self,
        customer_id: i64,
        cuid: &str,
        tmid: u32,
        report: TelemetryPreMitigation,
        vendor_mappings: &VendorMappingTable,
    ) -> Result<(), TelemetryError> {
        for detail in &report.attack_detail {
            let has_description = detail.attack_description.is_some();
            let resolvable = match (detail.vendor_id, detail.attack_id) {
                (Some(vendor_id), Some(attack_id)) => {
                    vendor_mappings.lookup(customer_id, cuid, vendor_id, attack_id).is_some()
                }
                _ => false,
            };
            if has_description == resolvable {
                return Err(TelemetryError::validation(
                    "attack_detail must carry exactly one of a free-text description or a resolvable vendor mapping",
                ));
            }
        }

        let key = ReportKey { customer_id, cuid: cuid.to_string(), tmid };
        self.reports.write().insert(key, report);
        Ok(())
    }

    /// Whether a report already exists for this exact `(customer, cuid,
    /// tmid)`, used by the dispatcher to report `2.01 Created` vs `2.04
    /// Changed` (spec §6).
    #[must_use]
    pub fn contains(&self, customer_id: i64, cuid: &str, tmid: u32) -> bool {
        let key = ReportKey { customer_id, cuid: cuid.to_string(), tmid };
        self.reports.read().contains_key(&key)
    }

    /// Returns every report for `(customer_id, cuid)` matching `queries`
    /// (spec §4.6 URI-filtering GET).
    #[must_use]
    pub fn get(
        &self,
        customer_id: i64,
        cuid: &str,
        queries: &[FilterQuery],
    ) -> Vec<TelemetryPreMitigation> {
        self.reports
            .read()
            .values()
            .filter(|r| r.customer_id == customer_id && r.cuid == cuid)
            .filter(|r| query::matches(r, queries))
            .cloned()
            .collect()
    }

    /// Removes every report a client holds (peace-time housekeeping,
    /// mirroring the mitigation engine's `mid=0`/telemetry-setup's
    /// `tsid=0` convention).
    pub fn clear_for_client(&self, customer_id: i64, cuid: &str) {
        self.reports
            .write()
            .retain(|k, _| !(k.customer_id == customer_id && k.cuid == cuid));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dots_model::{AttackDetail, Target};

    fn sample_report(tmid: u32) -> TelemetryPreMitigation {
        TelemetryPreMitigation {
            customer_id: 1,
            cuid: "c1".into(),
            tmid,
            targets: Target::default(),
            total_traffic_bps: 1000,
            attack_traffic_bps: 500,
            total_connections: 10,
            attack_detail: Vec::new(),
        }
    }

    #[test]
    fn put_with_free_text_description_is_accepted() {
        let store = PreMitigationStore::new();
        let vendors = VendorMappingTable::new();
        let mut report = sample_report(1);
        report.attack_detail.push(AttackDetail {
            vendor_id: None,
            attack_id: None,
            attack_description: Some("SYN flood".into()),
            top_talkers: Vec::new(),
        });
        store.put(1, "c1", 1, report, &vendors).unwrap();
        assert_eq!(store.get(1, "c1", &[]).len(), 1);
    }

    #[test]
    fn put_with_neither_description_nor_mapping_is_rejected() {
        let store = PreMitigationStore::new();
        let vendors = VendorMappingTable::new();
        let mut report = sample_report(1);
        report.attack_detail.push(AttackDetail {
            vendor_id: Some(99),
            attack_id: Some(1),
            attack_description: None,
            top_talkers: Vec::new(),
        });
        let err = store.put(1, "c1", 1, report, &vendors).unwrap_err();
        assert_eq!(err.kind, crate::error::TelemetryErrorKind::Validation);
    }

    #[test]
    fn put_with_both_description_and_resolvable_mapping_is_rejected() {
        let store = PreMitigationStore::new();
        let vendors = VendorMappingTable::new();
        vendors.insert(1, "c1", 99, 1, "SYN flood".into());
        let mut report = sample_report(1);
        report.attack_detail.push(AttackDetail {
            vendor_id: Some(99),
            attack_id: Some(1),
            attack_description: Some("also SYN flood".into()),
            top_talkers: Vec::new(),
        });
        let err = store.put(1, "c1", 1, report, &vendors).unwrap_err();
        assert_eq!(err.kind, crate::error::TelemetryErrorKind::Validation);
    }

    #[test]
    fn resolvable_mapping_with_no_description_is_accepted() {
        let store = PreMitigationStore::new();
        let vendors = VendorMappingTable::new();
        vendors.insert(1, "c1", 99, 1, "SYN flood".into());
        let mut report = sample_report(1);
        report.attack_detail.push(AttackDetail {
            vendor_id: Some(99),
            attack_id: Some(1),
            attack_description: None,
            top_talkers: Vec::new(),
        });
        store.put(1, "c1", 1, report, &vendors).unwrap();
    }
}
