//! Tool implementations for leasewise.
//!
//! Implements the `Tool` trait from leasewise-core over the
//! deterministic engine and the search bridge.
//!
//! # Tools
//!
//! - **Filter** ([`filter_tool`]): `filter_underutilized_vms`
//! - **Sizing** ([`sizing_tool`]): `analyze_vm_semantically`
//! - **Batch** ([`batch_tool`]): `batch_analyze_and_log`
//! - **Savings** ([`savings_tool`]): `calculate_total_savings`,
//!   `top_savings`, `log_recommendation`, `clear_savings_report`
//! - **Search** ([`search_tool`]): `exa_web_search`, `exa_crawl_url`

pub mod batch_tool;
pub mod filter_tool;
pub mod savings_tool;
pub mod search_tool;
pub mod sizing_tool;

use std::sync::Arc;

use leasewise_core::dataset::Dataset;
use leasewise_core::savings::SavingsLedger;
use leasewise_core::tools::ToolRegistry;
use leasewise_services::SearchBridge;

/// Shared state the engine tools operate on: the loaded dataset and
/// the recommendation ledger.
pub struct AdvisorState {
    pub dataset: Dataset,
    pub ledger: SavingsLedger,
}

impl AdvisorState {
    pub fn new(dataset: Dataset, ledger: SavingsLedger) -> Self {
        Self { dataset, ledger }
    }
}

/// Register every tool in this crate with the given registry.
///
/// The search tools are always registered; without a credential they
/// fail at call time with a clear message, and the chain builder never
/// schedules them in that case anyway.
pub fn register_all(
    registry: &mut ToolRegistry,
    state: Arc<AdvisorState>,
    bridge: Arc<SearchBridge>,
) {
    registry.register(Arc::new(filter_tool::FilterVmsTool::new(state.clone())));
    registry.register(Arc::new(sizing_tool::AnalyzeVmSizingTool::new(state.clone())));
    registry.register(Arc::new(batch_tool::RunBatchRightsizingTool::new(state.clone())));
    registry.register(Arc::new(savings_tool::CalculateTotalSavingsTool::new(state.clone())));
    registry.register(Arc::new(savings_tool::TopSavingsTool::new(state.clone())));
    registry.register(Arc::new(savings_tool::LogRecommendationTool::new(state.clone())));
    registry.register(Arc::new(savings_tool::ClearSavingsReportTool::new(state)));
    registry.register(Arc::new(search_tool::WebSearchTool::new(bridge.clone())));
    registry.register(Arc::new(search_tool::CrawlUrlTool::new(bridge)));
}
