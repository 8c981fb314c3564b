//! Single-VM sizing analysis tool.

use std::sync::Arc;

use async_trait::async_trait;

use leasewise_core::recommend::{self, VmSelector};
use leasewise_core::tools::{names, Tool, ToolError};

use crate::AdvisorState;

/// `analyze_vm_semantically`: deep analysis of one VM's fit against the
/// catalog. The target is picked by `vm_id`, or by `rank` (1-based)
/// into the highest-cost underutilized list.
pub struct AnalyzeVmSizingTool {
    state: Arc<AdvisorState>,
}

impl AnalyzeVmSizingTool {
    pub fn new(state: Arc<AdvisorState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for AnalyzeVmSizingTool {
    fn name(&self) -> &str {
        names::ANALYZE_VM_SEMANTICALLY
    }

    fn description(&self) -> &str {
        "Analyze one VM's rightsizing fit; select it with 'vm_id' or with \
         'rank' (1 = most expensive underutilized VM)"
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let selector = if let Some(id) = args.get("vm_id").and_then(|v| v.as_str()) {
            VmSelector::Id(id.to_string())
        } else if let Some(rank) = args.get("rank").and_then(|v| v.as_u64()) {
            VmSelector::Rank(rank as usize)
        } else {
            return Err(ToolError::InvalidArgs(
                "provide either 'vm_id' or 'rank'".into(),
            ));
        };
        let analysis = recommend::analyze_selected(&self.state.dataset, &selector)
            .map_err(|e| ToolError::InvalidArgs(e.to_string()))?;
        Ok(recommend::render_analysis(&analysis))
    }
}
