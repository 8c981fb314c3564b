//! Stage-chain construction.
//!
//! Every intent maps to a fixed three-stage chain: the auditor surveys
//! waste, the architect works out sizing, the financier totals the
//! money. Each stage carries the concrete tool invocations it will
//! make and the indices of the upstream stages whose output it reads;
//! both are checked when the chain is built, so an unknown tool name or
//! a forward dependency fails fast instead of mid-run.

use leasewise_types::{LeasewiseError, Result};

use super::classifier::Intent;
use crate::tools::{names, ToolRegistry};

/// The three stage roles, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    /// Utilization auditor: surveys the fleet for waste.
    Auditor,
    /// Cloud solutions architect: maps waste to concrete sizing moves.
    Architect,
    /// FinOps analyst: totals the financial impact.
    Financier,
}

impl StageRole {
    pub fn title(self) -> &'static str {
        match self {
            Self::Auditor => "Utilization Auditor",
            Self::Architect => "Cloud Solutions Architect",
            Self::Financier => "FinOps Analyst",
        }
    }

    /// Stable lowercase name for logs and error text.
    pub fn name(self) -> &'static str {
        match self {
            Self::Auditor => "auditor",
            Self::Architect => "architect",
            Self::Financier => "financier",
        }
    }

    /// Tool names this role is allowed to invoke.
    ///
    /// The sets are disjoint on purpose except for the architect's
    /// research tools: the auditor observes, the architect prescribes,
    /// the financier aggregates.
    pub fn granted_tools(self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::Auditor => &[names::FILTER_UNDERUTILIZED_VMS],
            Self::Architect => &[
                names::ANALYZE_VM_SEMANTICALLY,
                names::BATCH_ANALYZE_AND_LOG,
                names::LOG_RECOMMENDATION,
                names::WEB_SEARCH,
                names::CRAWL_URL,
            ],
            Self::Financier => &[
                names::CALCULATE_TOTAL_SAVINGS,
                names::TOP_SAVINGS,
                names::CLEAR_SAVINGS_REPORT,
            ],
        };
        names.iter().map(|n| (*n).to_string()).collect()
    }
}

/// One concrete tool call a stage will make, in order.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tool: String,
    pub args: serde_json::Value,
}

impl Invocation {
    fn new(tool: &str, args: serde_json::Value) -> Self {
        Self {
            tool: tool.to_string(),
            args,
        }
    }
}

/// Specification of one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub role: StageRole,
    /// What this stage is trying to establish, in prose.
    pub instructions: String,
    /// The shape of the answer the stage should produce.
    pub expected_output: String,
    /// Tool calls the stage makes, executed in order.
    pub invocations: Vec<Invocation>,
    /// Indices of earlier stages whose output feeds this one.
    pub depends_on: Vec<usize>,
}

/// A validated three-stage chain for one intent.
#[derive(Debug, Clone)]
pub struct Chain {
    pub intent: Intent,
    pub stages: Vec<StageSpec>,
}

/// Queries carrying these terms want live market context even when the
/// intent is not pricing research.
const COMMERCE_KEYWORDS: &[&str] = &[
    "market", "price", "pricing", "discount", "vendor", "quote", "negotiat", "spot",
];

fn wants_market_context(query: &str) -> bool {
    let text = query.to_lowercase();
    COMMERCE_KEYWORDS.iter().any(|kw| text.contains(kw))
}

fn search_invocation() -> Invocation {
    Invocation::new(
        names::WEB_SEARCH,
        serde_json::json!({
            "query": "Azure virtual machine pricing pay-as-you-go current rates"
        }),
    )
}

impl Chain {
    /// Build the chain for an intent and validate every referenced
    /// tool and dependency index.
    ///
    /// `search_available` gates live research: without a configured
    /// credential no chain schedules the search tool and the pricing
    /// chain says it is using catalog figures. With a credential, the
    /// pricing chain always researches, and any other chain does too
    /// when the query mentions market or pricing terms.
    pub fn build(
        intent: Intent,
        query: &str,
        registry: &ToolRegistry,
        search_available: bool,
    ) -> Result<Self> {
        let mut chain = template(intent, search_available);
        if search_available && intent != Intent::PricingResearch && wants_market_context(query) {
            chain.stages[1].invocations.push(search_invocation());
        }
        for (index, stage) in chain.stages.iter().enumerate() {
            for invocation in &stage.invocations {
                if !registry.contains(&invocation.tool) {
                    return Err(LeasewiseError::ConfigInvalid {
                        reason: format!(
                            "stage '{}' references unregistered tool '{}'",
                            stage.role.name(),
                            invocation.tool
                        ),
                    });
                }
            }
            if let Some(bad) = stage.depends_on.iter().find(|d| **d >= index) {
                return Err(LeasewiseError::ConfigInvalid {
                    reason: format!(
                        "stage '{}' depends on stage {bad}, which does not run before it",
                        stage.role.name()
                    ),
                });
            }
        }
        Ok(chain)
    }
}

fn stage(
    role: StageRole,
    instructions: &str,
    expected_output: &str,
    invocations: Vec<Invocation>,
    depends_on: Vec<usize>,
) -> StageSpec {
    StageSpec {
        role,
        instructions: instructions.to_string(),
        expected_output: expected_output.to_string(),
        invocations,
        depends_on,
    }
}

fn audit_all() -> StageSpec {
    stage(
        StageRole::Auditor,
        "Survey the fleet for zombie instances: VMs running below 30% \
         CPU and 30% RAM utilization.",
        "A waste report with counts, wasted monthly cost, and the \
         highest-cost offenders.",
        vec![Invocation::new(names::FILTER_UNDERUTILIZED_VMS, serde_json::json!({"command": "all"}))],
        vec![],
    )
}

fn architect_batch() -> StageSpec {
    stage(
        StageRole::Architect,
        "Rightsize every underutilized VM against the pricing catalog \
         and persist the recommendations.",
        "A batch summary: VMs processed, VMs with a cheaper fit, and \
         total monthly savings.",
        vec![Invocation::new(names::BATCH_ANALYZE_AND_LOG, serde_json::json!({}))],
        vec![0],
    )
}

fn financier_summary() -> StageSpec {
    stage(
        StageRole::Financier,
        "Total the recommendation ledger into a financial summary.",
        "Monthly and annual savings, average per VM, and fleet cost \
         reduction percentage.",
        vec![Invocation::new(names::CALCULATE_TOTAL_SAVINGS, serde_json::json!({}))],
        vec![0, 1],
    )
}

fn template(intent: Intent, search_available: bool) -> Chain {
    let stages = match intent {
        Intent::Discovery => vec![audit_all(), architect_batch(), financier_summary()],
        Intent::FinancialSummary => vec![
            audit_all(),
            architect_batch(),
            stage(
                StageRole::Financier,
                "Total the recommendation ledger and rank the biggest \
                 opportunities.",
                "A financial summary followed by the top five savings \
                 opportunities.",
                vec![
                    Invocation::new(names::CALCULATE_TOTAL_SAVINGS, serde_json::json!({})),
                    Invocation::new(names::TOP_SAVINGS, serde_json::json!({"n": 5})),
                ],
                vec![0, 1],
            ),
        ],
        Intent::DeepDive => vec![
            stage(
                StageRole::Auditor,
                "Identify the three most expensive zombie instances as \
                 candidates for a detailed look.",
                "A short table of the top three zombies by monthly cost.",
                vec![Invocation::new(
                    names::FILTER_UNDERUTILIZED_VMS,
                    serde_json::json!({"command": "top_3"}),
                )],
                vec![],
            ),
            stage(
                StageRole::Architect,
                "Analyze the single most expensive zombie in depth: \
                 workload profile, capacity requirement, and the \
                 concrete instance type to move to.",
                "A per-VM rightsizing analysis with before/after costs.",
                vec![Invocation::new(
                    names::ANALYZE_VM_SEMANTICALLY,
                    serde_json::json!({"rank": 1}),
                )],
                vec![0],
            ),
            financier_summary(),
        ],
        Intent::ClusterAnalysis => vec![
            stage(
                StageRole::Auditor,
                "Break down zombie instances by cluster to find where \
                 waste concentrates.",
                "The worst-offending cluster and the top ten clusters \
                 by zombie count.",
                vec![Invocation::new(
                    names::FILTER_UNDERUTILIZED_VMS,
                    serde_json::json!({"command": "cluster_analysis"}),
                )],
                vec![],
            ),
            architect_batch(),
            financier_summary(),
        ],
        Intent::PremiumAudit => vec![
            stage(
                StageRole::Auditor,
                "Audit the premium M-series and L-series fleets for \
                 underutilized and near-zero instances.",
                "Per-family counts and wasted cost, with alerts for \
                 near-zero premium hardware.",
                vec![Invocation::new(
                    names::FILTER_UNDERUTILIZED_VMS,
                    serde_json::json!({"command": "premium"}),
                )],
                vec![],
            ),
            architect_batch(),
            financier_summary(),
        ],
        Intent::PricingResearch => {
            let mut architect_invocations = vec![Invocation::new(
                names::ANALYZE_VM_SEMANTICALLY,
                serde_json::json!({"rank": 1}),
            )];
            let instructions = if search_available {
                architect_invocations.push(search_invocation());
                "Size the most expensive zombie, then check live market \
                 pricing to validate the catalog figures."
            } else {
                "Size the most expensive zombie using the static pricing \
                 catalog. Live market research is unavailable without a \
                 search credential; note that the figures are catalog \
                 prices."
            };
            vec![
                audit_all(),
                stage(
                    StageRole::Architect,
                    instructions,
                    "A rightsizing analysis, with market pricing context \
                     when available.",
                    architect_invocations,
                    vec![0],
                ),
                financier_summary(),
            ]
        }
    };
    Chain { intent, stages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolError};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopTool(&'static str);

    #[async_trait]
    impl Tool for NoopTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "noop"
        }
        async fn execute(
            &self,
            _args: serde_json::Value,
        ) -> std::result::Result<String, ToolError> {
            Ok(String::new())
        }
    }

    fn full_registry() -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        for name in [
            names::FILTER_UNDERUTILIZED_VMS,
            names::ANALYZE_VM_SEMANTICALLY,
            names::BATCH_ANALYZE_AND_LOG,
            names::CALCULATE_TOTAL_SAVINGS,
            names::TOP_SAVINGS,
            names::LOG_RECOMMENDATION,
            names::CLEAR_SAVINGS_REPORT,
            names::WEB_SEARCH,
            names::CRAWL_URL,
        ] {
            reg.register(Arc::new(NoopTool(name)));
        }
        reg
    }

    const ALL_INTENTS: [Intent; 6] = [
        Intent::Discovery,
        Intent::FinancialSummary,
        Intent::DeepDive,
        Intent::ClusterAnalysis,
        Intent::PremiumAudit,
        Intent::PricingResearch,
    ];

    #[test]
    fn every_intent_builds_a_three_stage_chain() {
        let reg = full_registry();
        for intent in ALL_INTENTS {
            let chain = Chain::build(intent, "", &reg, true).unwrap();
            assert_eq!(chain.stages.len(), 3, "{:?}", intent);
            assert_eq!(chain.stages[0].role, StageRole::Auditor);
            assert_eq!(chain.stages[1].role, StageRole::Architect);
            assert_eq!(chain.stages[2].role, StageRole::Financier);
        }
    }

    #[test]
    fn dependencies_point_backwards() {
        let reg = full_registry();
        for intent in ALL_INTENTS {
            let chain = Chain::build(intent, "", &reg, true).unwrap();
            assert!(chain.stages[0].depends_on.is_empty());
            for (index, stage) in chain.stages.iter().enumerate() {
                assert!(stage.depends_on.iter().all(|d| *d < index));
            }
        }
    }

    #[test]
    fn invocations_respect_role_grants() {
        let reg = full_registry();
        for intent in ALL_INTENTS {
            let chain = Chain::build(intent, "market pricing", &reg, true).unwrap();
            for stage in &chain.stages {
                let granted = stage.role.granted_tools();
                for invocation in &stage.invocations {
                    assert!(
                        granted.contains(&invocation.tool),
                        "{:?}: {} not granted to {}",
                        intent,
                        invocation.tool,
                        stage.role.name()
                    );
                }
            }
        }
    }

    #[test]
    fn search_is_gated_on_availability() {
        let reg = full_registry();
        let with = Chain::build(Intent::PricingResearch, "", &reg, true).unwrap();
        assert!(with.stages[1]
            .invocations
            .iter()
            .any(|i| i.tool == names::WEB_SEARCH));

        let without = Chain::build(Intent::PricingResearch, "", &reg, false).unwrap();
        assert!(!without.stages[1]
            .invocations
            .iter()
            .any(|i| i.tool == names::WEB_SEARCH));
        assert!(without.stages[1].instructions.contains("unavailable"));
    }

    #[test]
    fn commerce_keywords_attach_search_to_other_chains() {
        let reg = full_registry();
        let chain = Chain::build(
            Intent::FinancialSummary,
            "total savings at current market rates",
            &reg,
            true,
        )
        .unwrap();
        assert!(chain.stages[1]
            .invocations
            .iter()
            .any(|i| i.tool == names::WEB_SEARCH));

        // No credential: the same query schedules no search.
        let chain = Chain::build(
            Intent::FinancialSummary,
            "total savings at current market rates",
            &reg,
            false,
        )
        .unwrap();
        assert!(!chain.stages[1]
            .invocations
            .iter()
            .any(|i| i.tool == names::WEB_SEARCH));

        // Plain financial query: no search either.
        let chain = Chain::build(Intent::FinancialSummary, "total savings", &reg, true).unwrap();
        assert!(!chain.stages[1]
            .invocations
            .iter()
            .any(|i| i.tool == names::WEB_SEARCH));
    }

    #[test]
    fn unknown_tool_fails_at_build_time() {
        // Registry missing everything: the first invocation fails.
        let reg = ToolRegistry::new();
        let err = Chain::build(Intent::Discovery, "", &reg, false).unwrap_err();
        assert!(err.to_string().contains("unregistered tool"));
    }
}
