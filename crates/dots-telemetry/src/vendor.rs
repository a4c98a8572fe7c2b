//! Per-client vendor-mapping table (spec §4.6, SPEC_FULL.md §C.2): maps a
//! client-declared `(vendor_id, attack_id)` pair to the human-readable
//! description the server substitutes when a pre-mitigation report omits
//! its own free-text `attack_description`.

use dots_model::VendorMappingEntry;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MappingKey {
    customer_id: i64,
    cuid: String,
    vendor_id: u32,
    attack_id: u32,
}

/// The vendor-mapping table, keyed per client so two tenants may reuse the
/// same vendor/attack-id pair for different descriptions.
#[derive(Default)]
pub struct VendorMappingTable {
    entries: RwLock<HashMap<MappingKey, String>>,
}

impl VendorMappingTable {
    /// Builds an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or replaces a mapping for a client.
    pub fn insert(&self, customer_id: i64, cuid: &str, vendor_id: u32, attack_id: u32, description: String) {
        self.entries.write().insert(
            MappingKey { customer_id, cuid: cuid.to_string(), vendor_id, attack_id },
            description,
        );
    }

    /// Looks up the description for a `(vendor_id, attack_id)` pair
    /// belonging to a client.
    #[must_use]
    pub fn lookup(&self, customer_id: i64, cuid: &str, vendor_id: u32, attack_id: u32) -> Option<String> {
        self.entries
            .read()
            .get(&MappingKey { customer_id, cuid: cuid.to_string(), vendor_id, attack_id })
            .cloned()
    }

    /// Bulk-loads every row of a client's vendor-mapping PUT, replacing any
    /// existing entries for the same `(vendor_id, attack_id)` pairs.
    pub fn replace_all(&self, customer_id: i64, cuid: &str, rows: Vec<VendorMappingEntry>) {
        for row in rows {
            self.insert(customer_id, cuid, row.vendor_id, row.attack_id, row.description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_lookup() {
        let table = VendorMappingTable::new();
        table.insert(1, "c1", 99, 1, "SYN flood".into());
        assert_eq!(table.lookup(1, "c1", 99, 1), Some("SYN flood".to_string()));
    }

    #[test]
    fn lookup_is_scoped_per_client() {
        let table = VendorMappingTable::new();
        table.insert(1, "c1", 99, 1, "SYN flood".into());
        assert_eq!(table.lookup(1, "c2", 99, 1), None);
    }

    #[test]
    fn replace_all_loads_every_row() {
        let table = VendorMappingTable::new();
        table.replace_all(
            1,
            "c1",
            vec![
                VendorMappingEntry { vendor_id: 1, attack_id: 1, description: "a".into() },
                VendorMappingEntry { vendor_id: 1, attack_id: 2, description: "b".into() },
            ],
        );
        assert_eq!(table.lookup(1, "c1", 1, 2), Some("b".to_string()));
    }
}
