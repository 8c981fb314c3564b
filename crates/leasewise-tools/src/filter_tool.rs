//! Waste filter tool.

use std::sync::Arc;

use async_trait::async_trait;

use leasewise_core::filter;
use leasewise_core::tools::{names, Tool, ToolError};
use leasewise_types::LeasewiseError;

use crate::AdvisorState;

/// `filter_underutilized_vms`: classify the fleet by a waste criterion and render
/// the aggregate report.
pub struct FilterVmsTool {
    state: Arc<AdvisorState>,
}

impl FilterVmsTool {
    pub fn new(state: Arc<AdvisorState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for FilterVmsTool {
    fn name(&self) -> &str {
        names::FILTER_UNDERUTILIZED_VMS
    }

    fn description(&self) -> &str {
        "Filter the VM fleet by a waste criterion: 'all', 'zombie', 'near_zero', \
         'premium', 'cluster_analysis', or 'top_N'"
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let command = args
            .get("command")
            .and_then(|c| c.as_str())
            .unwrap_or("all");
        filter::run(&self.state.dataset, command).map_err(|err| match err {
            LeasewiseError::UnknownCommand { usage } => ToolError::InvalidArgs(usage),
            other => ToolError::ExecutionFailed(other.to_string()),
        })
    }
}
