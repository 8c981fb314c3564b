//! Static pricing catalog and cheapest-fit lookup.
//!
//! The catalog is the ground-truth pricing table used when live search
//! is unavailable. Exactly one entry per instance-type label; entries
//! are never mutated at runtime. Costs are distinct, so cheapest-fit
//! lookup has a unique answer for any requirement.

use leasewise_types::CatalogEntry;

/// The static pricing catalog, in fixed iteration order.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry { name: "Standard_B1s", cpu: 1.0, ram: 1.0, cost: 7.59, family: "Burstable" },
    CatalogEntry { name: "Standard_B2s", cpu: 2.0, ram: 4.0, cost: 30.37, family: "Burstable" },
    CatalogEntry { name: "Standard_B4ms", cpu: 4.0, ram: 16.0, cost: 60.74, family: "Burstable" },
    CatalogEntry { name: "Standard_D2s_v3", cpu: 2.0, ram: 8.0, cost: 70.08, family: "General Purpose" },
    CatalogEntry { name: "Standard_D4s_v3", cpu: 4.0, ram: 16.0, cost: 140.16, family: "General Purpose" },
    CatalogEntry { name: "Standard_D8s_v3", cpu: 8.0, ram: 32.0, cost: 280.32, family: "General Purpose" },
    CatalogEntry { name: "Standard_D16s_v3", cpu: 16.0, ram: 64.0, cost: 560.64, family: "General Purpose" },
    CatalogEntry { name: "Standard_E2s_v3", cpu: 2.0, ram: 16.0, cost: 91.98, family: "Memory Optimized" },
    CatalogEntry { name: "Standard_E4s_v3", cpu: 4.0, ram: 32.0, cost: 183.96, family: "Memory Optimized" },
    CatalogEntry { name: "Standard_E8s_v3", cpu: 8.0, ram: 64.0, cost: 367.92, family: "Memory Optimized" },
    CatalogEntry { name: "Standard_F2s_v2", cpu: 2.0, ram: 4.0, cost: 61.32, family: "Compute Optimized" },
    CatalogEntry { name: "Standard_F4s_v2", cpu: 4.0, ram: 8.0, cost: 122.64, family: "Compute Optimized" },
    CatalogEntry { name: "Standard_F8s_v2", cpu: 8.0, ram: 16.0, cost: 245.28, family: "Compute Optimized" },
];

/// Instance-family interpretation by type-label marker, checked in order.
const FAMILY_MARKERS: &[(&str, &str)] = &[
    ("_D", "General Purpose (balanced CPU/RAM)"),
    ("_E", "Memory Optimized (high RAM)"),
    ("_F", "Compute Optimized (high CPU)"),
    ("_M", "Memory Optimized Premium (very high RAM)"),
    ("_L", "Storage Optimized (high disk I/O)"),
    ("_B", "Burstable (variable workloads)"),
    ("_N", "GPU Enabled (ML/AI workloads)"),
];

/// Cheapest catalog entry whose capacity covers both requirements.
///
/// Returns `None` when no entry qualifies. Among qualifying entries the
/// strictly minimal-cost one wins; on an exact cost tie the first in
/// catalog order would win, but the fixed catalog has no ties.
pub fn find_best_fit(min_cpu: f64, min_ram: f64) -> Option<&'static CatalogEntry> {
    let mut best: Option<&CatalogEntry> = None;
    for entry in CATALOG {
        if entry.cpu >= min_cpu
            && entry.ram >= min_ram
            && best.is_none_or(|b| entry.cost < b.cost)
        {
            best = Some(entry);
        }
    }
    best
}

/// The cheapest entry in the whole catalog. Used as the soft default on
/// the single-VM analysis path when nothing fits.
pub fn cheapest_overall() -> &'static CatalogEntry {
    CATALOG
        .iter()
        .min_by(|a, b| a.cost.total_cmp(&b.cost))
        .expect("catalog is non-empty")
}

/// Look up a catalog entry by its exact label.
pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.name == name)
}

/// Identify the instance family from a type label.
pub fn instance_family(instance_type: &str) -> &'static str {
    for (marker, family) in FAMILY_MARKERS {
        if instance_type.contains(marker) {
            return family;
        }
    }
    "Unknown Family"
}
