//! Data model: VM records, catalog entries, recommendation rows.
//!
//! A [`VmRecord`] is one row of the uploaded dataset snapshot, immutable
//! for the duration of an analysis. A [`CatalogEntry`] is one row of the
//! static pricing catalog. A [`RecommendationRecord`] is one accepted
//! rightsizing decision as persisted in the savings ledger.

use serde::{Deserialize, Serialize};

/// One virtual machine from the dataset snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    /// Unique VM identifier (e.g. `vm-100011`).
    pub vm_id: String,

    /// Current instance-type label (e.g. `Standard_D4s_v3`).
    pub current_size: String,

    /// Provisioned CPU core count.
    pub cpu_cores: f64,

    /// Provisioned RAM in GB.
    pub ram_gb: f64,

    /// Average CPU utilization, percent.
    pub avg_cpu_usage_percent: f64,

    /// Average RAM utilization, percent.
    pub avg_ram_usage_percent: f64,

    /// Monthly cost in USD.
    pub monthly_cost_usd: f64,

    /// Cluster the VM belongs to.
    pub cluster_id: String,
}

impl VmRecord {
    /// Both CPU and RAM utilization below 30% -- the "zombie" criterion.
    pub fn is_underutilized(&self) -> bool {
        self.avg_cpu_usage_percent < 30.0 && self.avg_ram_usage_percent < 30.0
    }

    /// Both CPU and RAM utilization below 10%. Strict subset of
    /// [`is_underutilized`](Self::is_underutilized).
    pub fn is_near_zero(&self) -> bool {
        self.avg_cpu_usage_percent < 10.0 && self.avg_ram_usage_percent < 10.0
    }
}

/// One instance type in the static pricing catalog.
///
/// Entries are never mutated at runtime and there is exactly one entry
/// per label.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Instance-type label.
    pub name: &'static str,

    /// CPU core count.
    pub cpu: f64,

    /// RAM in GB.
    pub ram: f64,

    /// Monthly cost in USD.
    pub cost: f64,

    /// Human-readable family (e.g. "Burstable", "General Purpose").
    pub family: &'static str,
}

/// One accepted rightsizing recommendation, as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    /// VM this recommendation applies to.
    pub vm_id: String,

    /// Instance type the VM currently runs on.
    pub current_size: String,

    /// Current monthly cost in USD.
    pub current_cost: f64,

    /// Recommended replacement instance type.
    pub recommended_size: String,

    /// Monthly cost of the recommended type in USD.
    pub new_cost: f64,

    /// `current_cost - new_cost`.
    pub monthly_savings: f64,
}
