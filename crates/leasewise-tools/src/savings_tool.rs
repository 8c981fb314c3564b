//! Savings ledger tools: summary, ranking, manual entry, and clearing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use leasewise_core::recommend;
use leasewise_core::savings::{self, SavingsLedger};
use leasewise_core::tools::{names, Tool, ToolError};
use leasewise_core::report::usd;

use crate::AdvisorState;

fn read_ledger(ledger: &SavingsLedger) -> Result<Vec<leasewise_types::RecommendationRecord>, ToolError> {
    ledger
        .read()
        .map_err(|e| ToolError::ExecutionFailed(e.to_string()))
}

/// `calculate_total_savings`: the financial summary over the ledger.
///
/// An empty or absent ledger triggers a batch run first, so the
/// financial question always has an answer grounded in current data.
pub struct CalculateTotalSavingsTool {
    state: Arc<AdvisorState>,
}

impl CalculateTotalSavingsTool {
    pub fn new(state: Arc<AdvisorState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for CalculateTotalSavingsTool {
    fn name(&self) -> &str {
        names::CALCULATE_TOTAL_SAVINGS
    }

    fn description(&self) -> &str {
        "Total the recommendation ledger: monthly and annual savings, \
         average per VM, and fleet cost reduction"
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
        let mut records = read_ledger(&self.state.ledger)?;
        if records.is_empty() {
            info!("ledger empty; running batch analysis first");
            let outcome = recommend::run_all(&self.state.dataset);
            self.state
                .ledger
                .replace(&outcome.records)
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            records = outcome.records;
        }
        let summary = savings::summarize(&records);
        Ok(savings::render_summary(&summary))
    }
}

/// `top_savings`: the `n` biggest opportunities in the ledger.
pub struct TopSavingsTool {
    state: Arc<AdvisorState>,
}

impl TopSavingsTool {
    pub fn new(state: Arc<AdvisorState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for TopSavingsTool {
    fn name(&self) -> &str {
        names::TOP_SAVINGS
    }

    fn description(&self) -> &str {
        "Rank the top N savings opportunities from the ledger (default 5)"
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let n = args.get("n").and_then(|v| v.as_u64()).unwrap_or(5) as usize;
        if n == 0 {
            return Err(ToolError::InvalidArgs("'n' must be at least 1".into()));
        }
        let records = read_ledger(&self.state.ledger)?;
        Ok(savings::render_top(&savings::top(&records, n)))
    }
}

/// `log_recommendation`: append one validated manual entry.
pub struct LogRecommendationTool {
    state: Arc<AdvisorState>,
}

impl LogRecommendationTool {
    pub fn new(state: Arc<AdvisorState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for LogRecommendationTool {
    fn name(&self) -> &str {
        names::LOG_RECOMMENDATION
    }

    fn description(&self) -> &str {
        "Append one recommendation to the savings ledger. Input: \
         'vm_id,current_size,current_cost,recommended_size,new_cost'; \
         savings are derived from the two costs"
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let input = args
            .get("recommendation")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArgs("missing 'recommendation'".into()))?;
        let fields: Vec<&str> = input.split(',').map(str::trim).collect();
        let [vm_id, current_size, current_cost, recommended_size, new_cost] = fields[..] else {
            return Err(ToolError::InvalidArgs(format!(
                "expected 5 comma-separated fields \
                 (vm_id,current_size,current_cost,recommended_size,new_cost), found {}",
                fields.len()
            )));
        };
        let record =
            savings::manual_entry(vm_id, current_size, current_cost, recommended_size, new_cost)
                .map_err(|e| ToolError::InvalidArgs(e.to_string()))?;
        self.state
            .ledger
            .append(&record)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(format!(
            "Logged: {} {} -> {} saving {}/month\n",
            record.vm_id,
            record.current_size,
            record.recommended_size,
            usd(record.monthly_savings),
        ))
    }
}

/// `clear_savings_report`: remove the ledger file.
pub struct ClearSavingsReportTool {
    state: Arc<AdvisorState>,
}

impl ClearSavingsReportTool {
    pub fn new(state: Arc<AdvisorState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for ClearSavingsReportTool {
    fn name(&self) -> &str {
        names::CLEAR_SAVINGS_REPORT
    }

    fn description(&self) -> &str {
        "Delete the savings ledger so the next analysis starts clean"
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
        let existed = self
            .state
            .ledger
            .clear()
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(if existed {
            "Savings ledger cleared.\n".to_string()
        } else {
            "No savings ledger to clear.\n".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasewise_core::dataset::Dataset;
    use leasewise_types::VmRecord;

    fn vm(id: &str, cpu_pct: f64, cost: f64) -> VmRecord {
        VmRecord {
            vm_id: id.into(),
            current_size: "Standard_D8s_v3".into(),
            cpu_cores: 8.0,
            ram_gb: 32.0,
            avg_cpu_usage_percent: cpu_pct,
            avg_ram_usage_percent: cpu_pct,
            monthly_cost_usd: cost,
            cluster_id: "c1".into(),
        }
    }

    fn state(dir: &tempfile::TempDir) -> Arc<AdvisorState> {
        Arc::new(AdvisorState::new(
            Dataset::from_records(vec![vm("vm-1", 5.0, 280.32), vm("vm-2", 90.0, 100.0)]),
            SavingsLedger::new(dir.path().join("savings_report.csv")),
        ))
    }

    #[tokio::test]
    async fn summary_regenerates_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let tool = CalculateTotalSavingsTool::new(state.clone());
        let out = tool.execute(serde_json::json!({})).await.unwrap();
        assert!(out.contains("TOTAL SAVINGS SUMMARY"));
        assert!(out.contains("| VMs with Recommendations | 1 |"));
        // vm-1: 280.32 down to B2s at 30.37, all ledger-derived.
        assert!(out.contains("| Current Monthly Cost | $280.32 |"));
        assert!(out.contains("| Projected Monthly Cost | $30.37 |"));
        assert!(out.contains("| Cost Reduction | 89.2% |"));
        // The regeneration persisted.
        assert_eq!(state.ledger.read().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn top_reads_existing_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let log = LogRecommendationTool::new(state.clone());
        log.execute(serde_json::json!({
            "recommendation": "vm-7,Standard_E4s_v3,183.96,Standard_B4ms,60.74",
        }))
        .await
        .unwrap();

        let top = TopSavingsTool::new(state);
        let out = top.execute(serde_json::json!({"n": 3})).await.unwrap();
        assert!(out.contains("vm-7"));
        assert!(out.contains("$123.22"));
    }

    #[tokio::test]
    async fn log_rejects_wrong_field_count() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let log = LogRecommendationTool::new(state.clone());
        let err = log
            .execute(serde_json::json!({"recommendation": "bad,input"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("5 comma-separated fields"));
        assert!(state.ledger.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn log_rejects_bad_numbers_without_touching_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let log = LogRecommendationTool::new(state.clone());
        let err = log
            .execute(serde_json::json!({
                "recommendation": "vm-7,Standard_E4s_v3,lots,Standard_B4ms,60.74",
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("current_cost"));
        assert!(state.ledger.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_reports_both_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let clear = ClearSavingsReportTool::new(state.clone());
        let out = clear.execute(serde_json::json!({})).await.unwrap();
        assert!(out.contains("No savings ledger"));

        state
            .ledger
            .append(&savings::manual_entry("vm-1", "a", "10", "b", "5").unwrap())
            .unwrap();
        let out = clear.execute(serde_json::json!({})).await.unwrap();
        assert!(out.contains("cleared"));
    }

    #[tokio::test]
    async fn top_rejects_zero() {
        let dir = tempfile::tempdir().unwrap();
        let top = TopSavingsTool::new(state(&dir));
        assert!(top.execute(serde_json::json!({"n": 0})).await.is_err());
    }
}
