//! Waste filter engine: deterministic classification of VM records.
//!
//! Every number in the rendered reports is computed here with exact
//! sums over matched records -- the reasoning stages only narrate them.
//! Categories are recomputed on every call; nothing is cached.

use leasewise_types::{LeasewiseError, Result, VmRecord};

use crate::dataset::Dataset;
use crate::report::{count, pct, usd};

/// Usage hint returned for an unrecognized filter command.
pub const USAGE: &str =
    "Commands: 'all', 'zombie', 'near_zero', 'premium', 'cluster_analysis', 'top_N' (e.g. 'top_5')";

/// A filter mode parsed from a command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterMode {
    /// CPU < 30% and RAM < 30% ("zombie" / `all`).
    Zombie,
    /// CPU < 10% and RAM < 10%.
    NearZero,
    /// Memory- or storage-optimized premium families.
    Premium,
    /// Waste distribution grouped by cluster.
    ClusterAnalysis,
    /// Top N highest-cost underutilized VMs.
    TopN(usize),
}

impl FilterMode {
    /// Parse a command string, case-insensitively.
    ///
    /// `top_N` requires N to be a positive integer. Anything else is an
    /// [`LeasewiseError::UnknownCommand`] carrying [`USAGE`].
    pub fn parse(command: &str) -> Result<Self> {
        let cmd = command.trim().to_lowercase();
        match cmd.as_str() {
            "all" | "zombie" => Ok(Self::Zombie),
            "near_zero" => Ok(Self::NearZero),
            "premium" | "m_series" | "l_series" => Ok(Self::Premium),
            "cluster_analysis" => Ok(Self::ClusterAnalysis),
            _ => {
                if let Some(n_str) = cmd.strip_prefix("top_") {
                    match n_str.parse::<usize>() {
                        Ok(n) if n > 0 => return Ok(Self::TopN(n)),
                        _ => {}
                    }
                }
                Err(LeasewiseError::UnknownCommand {
                    usage: USAGE.into(),
                })
            }
        }
    }
}

// ── Typed reports ────────────────────────────────────────────────────────

/// Aggregate report over records matched by a waste criterion.
#[derive(Debug, Clone)]
pub struct WasteReport {
    /// Total rows in the dataset.
    pub total_count: usize,
    /// Rows matching the criterion.
    pub matched_count: usize,
    /// Exact sum of monthly cost over matched rows.
    pub matched_total_cost: f64,
    /// Matched rows ordered by cost descending, truncated to the
    /// requested sample size. Stable: cost ties keep file order.
    pub sample: Vec<VmRecord>,
}

fn build_report<F>(ds: &Dataset, sample_n: usize, matches: F) -> WasteReport
where
    F: Fn(&VmRecord) -> bool,
{
    let matched: Vec<&VmRecord> = ds.records().iter().filter(|r| matches(r)).collect();
    let matched_total_cost: f64 = matched.iter().map(|r| r.monthly_cost_usd).sum();
    let mut sorted = matched.clone();
    sorted.sort_by(|a, b| b.monthly_cost_usd.total_cmp(&a.monthly_cost_usd));
    WasteReport {
        total_count: ds.len(),
        matched_count: matched.len(),
        matched_total_cost,
        sample: sorted.into_iter().take(sample_n).cloned().collect(),
    }
}

/// Zombie report: CPU < 30% and RAM < 30%, sample of the top `sample_n`.
pub fn zombie_report(ds: &Dataset, sample_n: usize) -> WasteReport {
    build_report(ds, sample_n, VmRecord::is_underutilized)
}

/// Near-zero report: CPU < 10% and RAM < 10%.
pub fn near_zero_report(ds: &Dataset, sample_n: usize) -> WasteReport {
    build_report(ds, sample_n, VmRecord::is_near_zero)
}

/// Per-family statistics inside the premium report.
#[derive(Debug, Clone)]
pub struct FamilyStats {
    /// All VMs in the family.
    pub total: usize,
    /// Family VMs that are underutilized.
    pub underutilized: usize,
    /// Family VMs at near-zero utilization.
    pub near_zero: usize,
    /// Sum of monthly cost over the family's underutilized VMs.
    pub wasted_cost: f64,
    /// Near-zero family VMs by cost descending, top 5.
    pub near_zero_sample: Vec<VmRecord>,
}

/// Premium report: M-series (memory optimized premium) and L-series
/// (storage optimized), with independent underutilized/near-zero counts.
#[derive(Debug, Clone)]
pub struct PremiumReport {
    pub m_series: FamilyStats,
    pub l_series: FamilyStats,
}

fn family_stats(ds: &Dataset, marker: &str) -> FamilyStats {
    let in_family: Vec<&VmRecord> = ds
        .records()
        .iter()
        .filter(|r| r.current_size.to_lowercase().contains(marker))
        .collect();
    let underutilized: Vec<&VmRecord> = in_family
        .iter()
        .filter(|r| r.is_underutilized())
        .copied()
        .collect();
    let mut near_zero: Vec<&VmRecord> = in_family
        .iter()
        .filter(|r| r.is_near_zero())
        .copied()
        .collect();
    let near_zero_count = near_zero.len();
    near_zero.sort_by(|a, b| b.monthly_cost_usd.total_cmp(&a.monthly_cost_usd));
    FamilyStats {
        total: in_family.len(),
        underutilized: underutilized.len(),
        near_zero: near_zero_count,
        wasted_cost: underutilized.iter().map(|r| r.monthly_cost_usd).sum(),
        near_zero_sample: near_zero.into_iter().take(5).cloned().collect(),
    }
}

/// Build the premium (M/L-series) report.
pub fn premium_report(ds: &Dataset) -> PremiumReport {
    PremiumReport {
        m_series: family_stats(ds, "_m"),
        l_series: family_stats(ds, "_l"),
    }
}

/// Waste statistics for one cluster.
#[derive(Debug, Clone)]
pub struct ClusterStat {
    pub cluster_id: String,
    pub zombie_count: usize,
    pub wasted_cost: f64,
}

/// Cluster report: underutilized VMs grouped by cluster, ordered by
/// zombie count descending. Count ties keep first-appearance order.
pub fn cluster_report(ds: &Dataset) -> Vec<ClusterStat> {
    let mut stats: Vec<ClusterStat> = Vec::new();
    for record in ds.records().iter().filter(|r| r.is_underutilized()) {
        match stats.iter_mut().find(|s| s.cluster_id == record.cluster_id) {
            Some(stat) => {
                stat.zombie_count += 1;
                stat.wasted_cost += record.monthly_cost_usd;
            }
            None => stats.push(ClusterStat {
                cluster_id: record.cluster_id.clone(),
                zombie_count: 1,
                wasted_cost: record.monthly_cost_usd,
            }),
        }
    }
    stats.sort_by(|a, b| b.zombie_count.cmp(&a.zombie_count));
    stats
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Run a filter command against the dataset and render the report.
pub fn run(ds: &Dataset, command: &str) -> Result<String> {
    let mode = FilterMode::parse(command)?;
    Ok(match mode {
        FilterMode::Zombie => render_zombie(&zombie_report(ds, 5)),
        FilterMode::NearZero => render_near_zero(&near_zero_report(ds, 5)),
        FilterMode::Premium => render_premium(&premium_report(ds)),
        FilterMode::ClusterAnalysis => render_clusters(&cluster_report(ds)),
        FilterMode::TopN(n) => render_top_n(&zombie_report(ds, n), n),
    })
}

fn vm_table_rows(out: &mut String, sample: &[VmRecord]) {
    for vm in sample {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            vm.vm_id,
            vm.current_size,
            usd(vm.monthly_cost_usd),
            pct(vm.avg_cpu_usage_percent),
            pct(vm.avg_ram_usage_percent),
        ));
    }
}

fn render_zombie(report: &WasteReport) -> String {
    let fleet_pct = if report.total_count > 0 {
        report.matched_count as f64 / report.total_count as f64 * 100.0
    } else {
        0.0
    };
    let mut out = String::from("\n## ZOMBIE INSTANCE DISCOVERY\n\n");
    out.push_str("**Filter applied:** CPU < 30% AND RAM < 30%\n\n");
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| Total VMs in Dataset | {} |\n", count(report.total_count)));
    out.push_str(&format!("| Zombie Instances Found | {} |\n", count(report.matched_count)));
    out.push_str(&format!("| Monthly Cost (Wasted) | {} |\n", usd(report.matched_total_cost)));
    out.push_str(&format!("| Percentage of Fleet | {} |\n\n", pct(fleet_pct)));
    out.push_str("### Top 5 Highest-Cost Zombies\n\n");
    out.push_str("| VM ID | Instance Type | Monthly Cost | CPU % | RAM % |\n");
    out.push_str("|-------|---------------|--------------|-------|-------|\n");
    vm_table_rows(&mut out, &report.sample);
    out
}

fn render_near_zero(report: &WasteReport) -> String {
    let mut out = String::from("\n## NEAR-ZERO UTILIZATION VMs (Critical Waste)\n\n");
    out.push_str("**Filter applied:** CPU < 10% AND RAM < 10%\n\n");
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| Near-Zero VMs Found | {} |\n", count(report.matched_count)));
    out.push_str(&format!("| Monthly Cost (Wasted) | {} |\n", usd(report.matched_total_cost)));
    out.push_str("| **Recommendation** | Consider termination |\n");
    if !report.sample.is_empty() {
        out.push_str("\n### Top 5 Near-Zero VMs\n\n");
        out.push_str("| VM ID | Instance Type | Monthly Cost | CPU % | RAM % |\n");
        out.push_str("|-------|---------------|--------------|-------|-------|\n");
        vm_table_rows(&mut out, &report.sample);
    }
    out
}

fn render_family(out: &mut String, heading: &str, stats: &FamilyStats) {
    out.push_str(&format!("### {heading}\n\n"));
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| Total Instances | {} |\n", count(stats.total)));
    out.push_str(&format!("| Underutilized (< 30%) | {} |\n", count(stats.underutilized)));
    out.push_str(&format!("| Near-Zero (< 10%) | {} |\n", count(stats.near_zero)));
    out.push_str(&format!("| Wasted Monthly Cost | {} |\n\n", usd(stats.wasted_cost)));
}

fn render_premium(report: &PremiumReport) -> String {
    let mut out = String::from("\n## PREMIUM INSTANCE WASTE ANALYSIS\n\n");
    out.push_str("**Scope:** high-cost M-series and L-series instances\n\n");
    render_family(&mut out, "M-Series (Memory Optimized - Premium)", &report.m_series);
    if !report.m_series.near_zero_sample.is_empty() {
        out.push_str("**ALERT: Premium M-Series at Near-Zero Utilization:**\n\n");
        out.push_str("| VM ID | Instance Type | Monthly Cost | CPU % | RAM % |\n");
        out.push_str("|-------|---------------|--------------|-------|-------|\n");
        vm_table_rows(&mut out, &report.m_series.near_zero_sample);
        out.push('\n');
    }
    render_family(&mut out, "L-Series (Storage Optimized - Premium)", &report.l_series);
    out
}

fn render_clusters(stats: &[ClusterStat]) -> String {
    let mut out = String::from("\n## CLUSTER ANALYSIS\n\n");
    if stats.is_empty() {
        out.push_str("No underutilized VMs found in any cluster.\n");
        return out;
    }
    let worst = &stats[0];
    out.push_str(&format!("### Worst Offender: {}\n\n", worst.cluster_id));
    out.push_str(&format!("- **Zombie VMs:** {}\n", count(worst.zombie_count)));
    out.push_str(&format!("- **Wasted Monthly Cost:** {}\n\n", usd(worst.wasted_cost)));
    out.push_str("### Top 10 Clusters by Zombie Count\n\n");
    out.push_str("| Cluster ID | Zombie VMs | Wasted Cost |\n");
    out.push_str("|------------|------------|-------------|\n");
    for stat in stats.iter().take(10) {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            stat.cluster_id,
            count(stat.zombie_count),
            usd(stat.wasted_cost),
        ));
    }
    out
}

fn render_top_n(report: &WasteReport, n: usize) -> String {
    let mut out = format!("\n## TOP {n} HIGHEST-COST ZOMBIE VMs\n\n");
    out.push_str("| VM ID | Instance Type | Monthly Cost | CPU % | RAM % | Cluster |\n");
    out.push_str("|-------|---------------|--------------|-------|-------|--------|\n");
    for vm in &report.sample {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            vm.vm_id,
            vm.current_size,
            usd(vm.monthly_cost_usd),
            pct(vm.avg_cpu_usage_percent),
            pct(vm.avg_ram_usage_percent),
            vm.cluster_id,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm(id: &str, size: &str, cpu_pct: f64, ram_pct: f64, cost: f64, cluster: &str) -> VmRecord {
        VmRecord {
            vm_id: id.into(),
            current_size: size.into(),
            cpu_cores: 4.0,
            ram_gb: 16.0,
            avg_cpu_usage_percent: cpu_pct,
            avg_ram_usage_percent: ram_pct,
            monthly_cost_usd: cost,
            cluster_id: cluster.into(),
        }
    }

    fn fixture() -> Dataset {
        Dataset::from_records(vec![
            vm("vm-1", "Standard_D4s_v3", 5.0, 5.0, 140.16, "c1"),
            vm("vm-2", "Standard_E4s_v3", 25.0, 20.0, 183.96, "c1"),
            vm("vm-3", "Standard_M64s", 8.0, 3.0, 900.0, "c2"),
            vm("vm-4", "Standard_L8s_v2", 20.0, 15.0, 500.0, "c2"),
            vm("vm-5", "Standard_B2s", 80.0, 70.0, 30.37, "c3"),
        ])
    }

    #[test]
    fn parse_modes() {
        assert_eq!(FilterMode::parse("all").unwrap(), FilterMode::Zombie);
        assert_eq!(FilterMode::parse("ZOMBIE").unwrap(), FilterMode::Zombie);
        assert_eq!(FilterMode::parse(" near_zero ").unwrap(), FilterMode::NearZero);
        assert_eq!(FilterMode::parse("m_series").unwrap(), FilterMode::Premium);
        assert_eq!(FilterMode::parse("top_7").unwrap(), FilterMode::TopN(7));
    }

    #[test]
    fn parse_rejects_bad_commands_with_usage() {
        for bad in ["", "bogus", "top_", "top_0", "top_-3", "top_x"] {
            let err = FilterMode::parse(bad).unwrap_err();
            assert!(err.to_string().contains("Commands:"), "{bad}");
        }
    }

    #[test]
    fn zombie_counts_and_cost() {
        let ds = fixture();
        let report = zombie_report(&ds, 5);
        assert_eq!(report.total_count, 5);
        assert_eq!(report.matched_count, 4);
        let expected: f64 = 140.16 + 183.96 + 900.0 + 500.0;
        assert!((report.matched_total_cost - expected).abs() < 1e-9);
        // Sample sorted by cost descending.
        assert_eq!(report.sample[0].vm_id, "vm-3");
        assert_eq!(report.sample[1].vm_id, "vm-4");
    }

    #[test]
    fn near_zero_is_subset_of_zombie() {
        let ds = fixture();
        let zombies = zombie_report(&ds, 10);
        let near = near_zero_report(&ds, 10);
        assert!(near.matched_count <= zombies.matched_count);
        for vm in &near.sample {
            assert!(vm.is_underutilized());
        }
    }

    #[test]
    fn stable_order_on_cost_ties() {
        let ds = Dataset::from_records(vec![
            vm("vm-a", "Standard_B2s", 5.0, 5.0, 30.37, "c1"),
            vm("vm-b", "Standard_B2s", 5.0, 5.0, 30.37, "c1"),
        ]);
        let report = zombie_report(&ds, 5);
        assert_eq!(report.sample[0].vm_id, "vm-a");
        assert_eq!(report.sample[1].vm_id, "vm-b");
    }

    #[test]
    fn premium_subcounts() {
        let ds = fixture();
        let report = premium_report(&ds);
        assert_eq!(report.m_series.total, 1);
        assert_eq!(report.m_series.underutilized, 1);
        assert_eq!(report.m_series.near_zero, 1);
        assert_eq!(report.l_series.total, 1);
        assert_eq!(report.l_series.underutilized, 1);
        assert_eq!(report.l_series.near_zero, 0);
        assert!((report.l_series.wasted_cost - 500.0).abs() < 1e-9);
    }

    #[test]
    fn cluster_grouping_orders_by_count() {
        let ds = Dataset::from_records(vec![
            vm("vm-1", "Standard_B2s", 5.0, 5.0, 10.0, "beta"),
            vm("vm-2", "Standard_B2s", 5.0, 5.0, 20.0, "alpha"),
            vm("vm-3", "Standard_B2s", 5.0, 5.0, 30.0, "alpha"),
            vm("vm-4", "Standard_B2s", 90.0, 90.0, 40.0, "beta"),
        ]);
        let stats = cluster_report(&ds);
        assert_eq!(stats[0].cluster_id, "alpha");
        assert_eq!(stats[0].zombie_count, 2);
        assert!((stats[0].wasted_cost - 50.0).abs() < 1e-9);
        assert_eq!(stats[1].cluster_id, "beta");
        assert_eq!(stats[1].zombie_count, 1);
    }

    #[test]
    fn run_renders_reports() {
        let ds = fixture();
        let text = run(&ds, "zombie").unwrap();
        assert!(text.contains("ZOMBIE INSTANCE DISCOVERY"));
        assert!(text.contains("| Zombie Instances Found | 4 |"));
        assert!(text.contains("$1,724.12"));

        let text = run(&ds, "top_2").unwrap();
        assert!(text.contains("TOP 2 HIGHEST-COST ZOMBIE VMs"));
        assert!(text.contains("vm-3"));
        assert!(!text.contains("vm-1 |"));

        let text = run(&ds, "cluster_analysis").unwrap();
        assert!(text.contains("Worst Offender: c1"));
    }

    #[test]
    fn run_unknown_command_is_usage_error() {
        let ds = fixture();
        let err = run(&ds, "nope").unwrap_err();
        assert!(matches!(err, LeasewiseError::UnknownCommand { .. }));
    }

    #[test]
    fn empty_dataset_does_not_divide_by_zero() {
        let ds = Dataset::from_records(vec![]);
        let text = run(&ds, "all").unwrap();
        assert!(text.contains("| Zombie Instances Found | 0 |"));
        assert!(text.contains("0.0%"));
    }
}
