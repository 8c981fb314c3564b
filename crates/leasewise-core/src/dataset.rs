//! Dataset loading with column validation.
//!
//! The dataset is a CSV snapshot with a fixed column schema. A missing
//! file or missing columns is a reportable [`LeasewiseError`], never a
//! panic -- the caller turns it into user-facing text. Fields contain no
//! embedded commas, so a plain comma split is sufficient.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use leasewise_types::{LeasewiseError, Result, VmRecord};

/// Columns the dataset must provide, in no particular order.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "vm_id",
    "current_size",
    "cpu_cores",
    "ram_gb",
    "avg_cpu_usage_percent",
    "avg_ram_usage_percent",
    "monthly_cost_usd",
    "cluster_id",
];

/// An immutable, shareable dataset snapshot.
///
/// Loaded once per analysis session; re-uploading the dataset means
/// constructing a fresh `Dataset` and discarding this one.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<Vec<VmRecord>>,
}

impl Dataset {
    /// Load and validate a dataset CSV from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(LeasewiseError::DatasetMissing {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let records = parse_csv(&content)?;
        debug!(path = %path.display(), rows = records.len(), "dataset loaded");
        Ok(Self {
            records: Arc::new(records),
        })
    }

    /// Build a dataset from already-parsed records (tests, fixtures).
    pub fn from_records(records: Vec<VmRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    /// All records, in file order.
    pub fn records(&self) -> &[VmRecord] {
        &self.records
    }

    /// Number of VMs in the snapshot.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by its VM identifier.
    pub fn find(&self, vm_id: &str) -> Option<&VmRecord> {
        self.records.iter().find(|r| r.vm_id == vm_id)
    }

    /// Underutilized records sorted by monthly cost descending.
    ///
    /// The sort is stable: cost ties keep original file order.
    pub fn underutilized_by_cost(&self) -> Vec<&VmRecord> {
        let mut matched: Vec<&VmRecord> = self
            .records
            .iter()
            .filter(|r| r.is_underutilized())
            .collect();
        matched.sort_by(|a, b| b.monthly_cost_usd.total_cmp(&a.monthly_cost_usd));
        matched
    }
}

fn parse_csv(content: &str) -> Result<Vec<VmRecord>> {
    let mut lines = content.lines();
    let header = lines
        .next()
        .ok_or_else(|| LeasewiseError::DatasetInvalid {
            reason: "file is empty".into(),
        })?;

    let index: HashMap<&str, usize> = header
        .split(',')
        .map(str::trim)
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !index.contains_key(**c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(LeasewiseError::DatasetInvalid {
            reason: format!("missing required columns: {}", missing.join(", ")),
        });
    }

    let col = |name: &str| index[name];
    let (c_id, c_size, c_cpu, c_ram) = (
        col("vm_id"),
        col("current_size"),
        col("cpu_cores"),
        col("ram_gb"),
    );
    let (c_cpu_pct, c_ram_pct, c_cost, c_cluster) = (
        col("avg_cpu_usage_percent"),
        col("avg_ram_usage_percent"),
        col("monthly_cost_usd"),
        col("cluster_id"),
    );

    let mut records = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < index.len() {
            return Err(LeasewiseError::DatasetInvalid {
                reason: format!(
                    "row {}: expected {} fields, found {}",
                    line_no + 2,
                    index.len(),
                    fields.len()
                ),
            });
        }
        let number = |idx: usize, name: &str| -> Result<f64> {
            fields[idx]
                .parse::<f64>()
                .map_err(|_| LeasewiseError::DatasetInvalid {
                    reason: format!(
                        "row {}: column '{}' is not a number: '{}'",
                        line_no + 2,
                        name,
                        fields[idx]
                    ),
                })
        };
        records.push(VmRecord {
            vm_id: fields[c_id].to_string(),
            current_size: fields[c_size].to_string(),
            cpu_cores: number(c_cpu, "cpu_cores")?,
            ram_gb: number(c_ram, "ram_gb")?,
            avg_cpu_usage_percent: number(c_cpu_pct, "avg_cpu_usage_percent")?,
            avg_ram_usage_percent: number(c_ram_pct, "avg_ram_usage_percent")?,
            monthly_cost_usd: number(c_cost, "monthly_cost_usd")?,
            cluster_id: fields[c_cluster].to_string(),
        });
    }
    Ok(records)
}
