//! Tool contract and name-based registry.
//!
//! Concrete tool implementations live in the `leasewise-tools` crate;
//! this module only defines the interface the pipeline dispatches
//! through.

pub mod registry;

pub use registry::{Tool, ToolError, ToolRegistry};

/// Canonical tool names shared between the chain builder and the tool
/// implementations. A chain referencing any other name fails to build.
pub mod names {
    pub const FILTER_UNDERUTILIZED_VMS: &str = "filter_underutilized_vms";
    pub const ANALYZE_VM_SEMANTICALLY: &str = "analyze_vm_semantically";
    pub const BATCH_ANALYZE_AND_LOG: &str = "batch_analyze_and_log";
    pub const CALCULATE_TOTAL_SAVINGS: &str = "calculate_total_savings";
    pub const TOP_SAVINGS: &str = "top_savings";
    pub const LOG_RECOMMENDATION: &str = "log_recommendation";
    pub const CLEAR_SAVINGS_REPORT: &str = "clear_savings_report";
    pub const WEB_SEARCH: &str = "exa_web_search";
    pub const CRAWL_URL: &str = "exa_crawl_url";
}
