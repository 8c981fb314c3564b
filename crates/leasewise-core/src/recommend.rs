//! Per-VM rightsizing and the batch recommendation run.
//!
//! The sizing rule is fixed: effective usage is provisioned capacity
//! scaled by the observed utilization percentage, and the requirement
//! is that effective usage plus a 50% headroom margin, floored at one
//! unit. A recommendation only exists when the cheapest qualifying
//! catalog entry is strictly cheaper than the current spend.

use tracing::debug;

use leasewise_types::{LeasewiseError, RecommendationRecord, Result, VmRecord};

use crate::catalog;
use crate::dataset::Dataset;
use crate::report::{pct, usd};

/// Headroom multiplier applied on top of effective usage.
const HEADROOM: f64 = 1.5;

/// Capacity actually needed by a VM, derived from observed utilization.
#[derive(Debug, Clone, Copy)]
pub struct Requirement {
    /// Cores effectively in use.
    pub effective_cpu: f64,
    /// GB of RAM effectively in use.
    pub effective_ram: f64,
    /// Minimum cores to provision, with headroom.
    pub min_cpu: f64,
    /// Minimum RAM (GB) to provision, with headroom.
    pub min_ram: f64,
}

/// Compute the capacity requirement for a VM.
///
/// Both minimums are floored at 1.0 so a fully idle VM still maps onto
/// the smallest real instance.
pub fn requirement(vm: &VmRecord) -> Requirement {
    let effective_cpu = vm.cpu_cores * vm.avg_cpu_usage_percent / 100.0;
    let effective_ram = vm.ram_gb * vm.avg_ram_usage_percent / 100.0;
    Requirement {
        effective_cpu,
        effective_ram,
        min_cpu: (effective_cpu * HEADROOM).max(1.0),
        min_ram: (effective_ram * HEADROOM).max(1.0),
    }
}

/// Recommendation for one VM, or `None` when no catalog entry is both
/// sufficient and strictly cheaper than the current spend.
pub fn recommend_for(vm: &VmRecord) -> Option<RecommendationRecord> {
    let req = requirement(vm);
    let entry = catalog::find_best_fit(req.min_cpu, req.min_ram)?;
    if entry.cost >= vm.monthly_cost_usd {
        return None;
    }
    Some(RecommendationRecord {
        vm_id: vm.vm_id.clone(),
        current_size: vm.current_size.clone(),
        current_cost: vm.monthly_cost_usd,
        recommended_size: entry.name.to_string(),
        new_cost: entry.cost,
        monthly_savings: vm.monthly_cost_usd - entry.cost,
    })
}

/// Outcome of a full batch run over the dataset.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Recommendations with strictly positive savings, in the order
    /// they were produced (underutilized VMs by cost descending).
    pub records: Vec<RecommendationRecord>,
    /// Count of underutilized VMs examined.
    pub total_underutilized: usize,
    /// Exact sum of monthly savings across `records`.
    pub total_savings: f64,
}

impl BatchOutcome {
    /// Count of VMs that produced a recommendation.
    pub fn processed(&self) -> usize {
        self.records.len()
    }
}

/// Run rightsizing over every underutilized VM in the dataset.
///
/// VMs with no strictly-cheaper fit are counted but produce no record.
pub fn run_all(ds: &Dataset) -> BatchOutcome {
    let candidates = ds.underutilized_by_cost();
    let total_underutilized = candidates.len();
    let records: Vec<RecommendationRecord> =
        candidates.iter().filter_map(|vm| recommend_for(vm)).collect();
    let total_savings = records.iter().map(|r| r.monthly_savings).sum();
    debug!(
        underutilized = total_underutilized,
        processed = records.len(),
        "batch rightsizing complete"
    );
    BatchOutcome {
        records,
        total_underutilized,
        total_savings,
    }
}

// ── Single-VM semantic analysis ──────────────────────────────────────────

/// Which VM the sizing analysis should target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmSelector {
    /// Exact VM identifier.
    Id(String),
    /// 1-based position in the highest-cost underutilized list.
    Rank(usize),
}

/// Qualitative utilization level for a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadLevel {
    Idle,
    Light,
    Moderate,
    Heavy,
}

impl WorkloadLevel {
    fn from_pct(usage_pct: f64) -> Self {
        if usage_pct < 10.0 {
            Self::Idle
        } else if usage_pct < 30.0 {
            Self::Light
        } else if usage_pct < 60.0 {
            Self::Moderate
        } else {
            Self::Heavy
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
        }
    }
}

/// Dominant resource pattern: one resource dominates when its usage
/// percentage is more than twice the other's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadPattern {
    ComputeBound,
    MemoryBound,
    Balanced,
}

impl WorkloadPattern {
    fn from_usage(cpu_pct: f64, ram_pct: f64) -> Self {
        if cpu_pct > ram_pct * 2.0 {
            Self::ComputeBound
        } else if ram_pct > cpu_pct * 2.0 {
            Self::MemoryBound
        } else {
            Self::Balanced
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::ComputeBound => "compute-bound (batch processing, calculations)",
            Self::MemoryBound => "memory-bound (caching, in-memory database)",
            Self::Balanced => "balanced (web server, general application)",
        }
    }
}

/// How badly the VM is wasting its provisioned capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasteSeverity {
    /// Near-zero on both resources; termination candidate.
    Critical,
    /// Both resources severely underutilized.
    High,
    /// Partial underutilization only.
    Moderate,
}

impl WasteSeverity {
    fn from_usage(cpu_pct: f64, ram_pct: f64) -> Self {
        if cpu_pct < 10.0 && ram_pct < 10.0 {
            Self::Critical
        } else if cpu_pct < 30.0 && ram_pct < 30.0 {
            Self::High
        } else {
            Self::Moderate
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Moderate => "MODERATE",
        }
    }

    fn reason(self) -> &'static str {
        match self {
            Self::Critical => "Near-zero utilization, candidate for termination",
            Self::High => "Both CPU and RAM severely underutilized",
            Self::Moderate => "Partial underutilization",
        }
    }
}

/// Full analysis of one VM's fit against the catalog.
#[derive(Debug, Clone)]
pub struct VmAnalysis {
    pub vm: VmRecord,
    pub requirement: Requirement,
    pub cpu_level: WorkloadLevel,
    pub ram_level: WorkloadLevel,
    pub pattern: WorkloadPattern,
    pub severity: WasteSeverity,
    /// Recommended catalog label. When nothing in the catalog covers
    /// the requirement this falls back to the cheapest entry overall.
    pub recommended_size: String,
    pub new_cost: f64,
    pub monthly_savings: f64,
}

/// Analyze a single VM against the catalog.
///
/// Unlike [`recommend_for`], this always yields a target size: the
/// cheapest overall entry stands in when no entry fits, and savings may
/// come out negative when the VM is genuinely right-sized or too big
/// for the catalog.
pub fn analyze(vm: &VmRecord) -> VmAnalysis {
    let req = requirement(vm);
    let entry = catalog::find_best_fit(req.min_cpu, req.min_ram)
        .unwrap_or_else(catalog::cheapest_overall);
    VmAnalysis {
        vm: vm.clone(),
        requirement: req,
        cpu_level: WorkloadLevel::from_pct(vm.avg_cpu_usage_percent),
        ram_level: WorkloadLevel::from_pct(vm.avg_ram_usage_percent),
        pattern: WorkloadPattern::from_usage(
            vm.avg_cpu_usage_percent,
            vm.avg_ram_usage_percent,
        ),
        severity: WasteSeverity::from_usage(
            vm.avg_cpu_usage_percent,
            vm.avg_ram_usage_percent,
        ),
        recommended_size: entry.name.to_string(),
        new_cost: entry.cost,
        monthly_savings: vm.monthly_cost_usd - entry.cost,
    }
}

/// Resolve a selector and analyze the chosen VM.
pub fn analyze_selected(ds: &Dataset, selector: &VmSelector) -> Result<VmAnalysis> {
    let vm = match selector {
        VmSelector::Id(id) => ds.find(id).ok_or_else(|| {
            LeasewiseError::Validation(format!("VM '{id}' not found in dataset"))
        })?,
        VmSelector::Rank(rank) => {
            if *rank == 0 {
                return Err(LeasewiseError::Validation(
                    "rank is 1-based; 0 is not a valid rank".into(),
                ));
            }
            let candidates = ds.underutilized_by_cost();
            *candidates.get(rank - 1).ok_or_else(|| {
                LeasewiseError::Validation(format!(
                    "rank {rank} is out of range; only {} underutilized VMs",
                    candidates.len()
                ))
            })?
        }
    };
    Ok(analyze(vm))
}

/// Render a single-VM analysis as markdown.
pub fn render_analysis(analysis: &VmAnalysis) -> String {
    let vm = &analysis.vm;
    let req = &analysis.requirement;
    let mut out = format!("\n## RIGHTSIZING ANALYSIS: {}\n\n", vm.vm_id);
    out.push_str("| Property | Current | Usage Level | Effective Usage |\n");
    out.push_str("|----------|---------|-------------|------------------|\n");
    out.push_str(&format!(
        "| CPU | {} cores ({}) | {} | {:.2} cores |\n",
        vm.cpu_cores,
        pct(vm.avg_cpu_usage_percent),
        analysis.cpu_level.label(),
        req.effective_cpu,
    ));
    out.push_str(&format!(
        "| RAM | {} GB ({}) | {} | {:.2} GB |\n\n",
        vm.ram_gb,
        pct(vm.avg_ram_usage_percent),
        analysis.ram_level.label(),
        req.effective_ram,
    ));
    out.push_str(&format!(
        "**Workload pattern:** {}\n",
        analysis.pattern.label(),
    ));
    out.push_str(&format!(
        "**Waste assessment:** {} ({})\n",
        analysis.severity.label(),
        analysis.severity.reason(),
    ));
    out.push_str(&format!(
        "**Instance family:** {}\n\n",
        catalog::instance_family(&vm.current_size),
    ));
    out.push_str(&format!(
        "**Recommendation:** {} -> {} ({})\n\n",
        vm.current_size,
        analysis.recommended_size,
        catalog::instance_family(&analysis.recommended_size),
    ));
    out.push_str("| | Monthly Cost |\n|---|---|\n");
    out.push_str(&format!("| Current | {} |\n", usd(vm.monthly_cost_usd)));
    out.push_str(&format!("| Proposed | {} |\n", usd(analysis.new_cost)));
    out.push_str(&format!(
        "| **Savings** | **{}** |\n",
        usd(analysis.monthly_savings)
    ));
    if analysis.monthly_savings <= 0.0 {
        out.push_str("\nNo cheaper catalog option covers this workload; no change recommended.\n");
    }
    out
}
