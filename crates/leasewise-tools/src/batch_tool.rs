//! Batch rightsizing tool.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use leasewise_core::recommend;
use leasewise_core::report::{count, usd};
use leasewise_core::tools::{names, Tool, ToolError};

use crate::AdvisorState;

/// `batch_analyze_and_log`: rightsize every underutilized VM and
/// replace the savings ledger with the results.
pub struct RunBatchRightsizingTool {
    state: Arc<AdvisorState>,
}

impl RunBatchRightsizingTool {
    pub fn new(state: Arc<AdvisorState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for RunBatchRightsizingTool {
    fn name(&self) -> &str {
        names::BATCH_ANALYZE_AND_LOG
    }

    fn description(&self) -> &str {
        "Rightsize all underutilized VMs against the catalog and persist \
         the recommendations to the savings ledger"
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
        let outcome = recommend::run_all(&self.state.dataset);
        self.state
            .ledger
            .replace(&outcome.records)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        info!(
            processed = outcome.processed(),
            underutilized = outcome.total_underutilized,
            "batch recommendations persisted"
        );

        let mut out = String::from("\n## BATCH RIGHTSIZING COMPLETE\n\n");
        out.push_str("| Metric | Value |\n|--------|-------|\n");
        out.push_str(&format!(
            "| Underutilized VMs Examined | {} |\n",
            count(outcome.total_underutilized)
        ));
        out.push_str(&format!(
            "| Recommendations Written | {} |\n",
            count(outcome.processed())
        ));
        out.push_str(&format!(
            "| Total Monthly Savings | {} |\n",
            usd(outcome.total_savings)
        ));
        out.push_str(&format!(
            "\nLedger: `{}`\n",
            self.state.ledger.path().display()
        ));
        Ok(out)
    }
}
