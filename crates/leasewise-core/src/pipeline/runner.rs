//! Sequential stage runner.
//!
//! Stages execute strictly in order. Each stage runs its tool
//! invocations and hands the outputs to the [`Reasoner`] together with
//! the verbatim text of the upstream stages it declared in
//! `depends_on`. The report's answer is the final stage's text; the
//! full stage trail rides along for verbose display.

use std::sync::Arc;

use tracing::{debug, warn};

use leasewise_types::Result;

use super::chain::{Chain, StageSpec};
use crate::tools::ToolRegistry;

/// Composes a stage's prose from its spec and tool output.
///
/// The seam where a language model would sit. The default
/// [`TemplateReasoner`] is deterministic: it frames the tool output
/// without inventing numbers, which keeps every figure traceable to a
/// tool.
pub trait Reasoner: Send + Sync {
    fn compose(&self, stage: &StageSpec, context: &str, tool_output: &str) -> String;
}

/// Deterministic reasoner: a role heading, the stage's goal, and the
/// tool output verbatim.
pub struct TemplateReasoner;

impl Reasoner for TemplateReasoner {
    fn compose(&self, stage: &StageSpec, _context: &str, tool_output: &str) -> String {
        let mut out = format!("# {}\n", stage.role.title());
        if tool_output.trim().is_empty() {
            out.push('\n');
            out.push_str(&stage.instructions);
            out.push('\n');
        } else {
            out.push_str(tool_output);
        }
        out
    }
}

/// Output of one executed stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub role_title: &'static str,
    pub text: String,
}

/// Result of a full chain run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// The final stage's composed text.
    pub answer: String,
    /// Every stage's text, in execution order.
    pub stages: Vec<StageOutput>,
    /// Tool names in invocation order, duplicates preserved.
    pub tools_used: Vec<String>,
}

/// Executes validated chains against a tool registry.
pub struct PipelineRunner {
    registry: Arc<ToolRegistry>,
    reasoner: Box<dyn Reasoner>,
}

impl PipelineRunner {
    pub fn new(registry: Arc<ToolRegistry>, reasoner: Box<dyn Reasoner>) -> Self {
        Self { registry, reasoner }
    }

    /// Run every stage of the chain in order.
    ///
    /// A failed tool call does not abort the run: the error text is
    /// embedded in the stage output where the result would have been,
    /// so downstream stages and the user both see what went wrong.
    pub async fn run(&self, chain: &Chain) -> Result<PipelineReport> {
        let mut stages: Vec<StageOutput> = Vec::with_capacity(chain.stages.len());
        let mut tools_used: Vec<String> = Vec::new();

        for spec in &chain.stages {
            debug!(
                intent = chain.intent.name(),
                role = spec.role.name(),
                invocations = spec.invocations.len(),
                "running stage"
            );
            let granted = spec.role.granted_tools();
            let mut tool_output = String::new();
            for invocation in &spec.invocations {
                tools_used.push(invocation.tool.clone());
                match self
                    .registry
                    .execute(
                        &invocation.tool,
                        invocation.args.clone(),
                        &granted,
                        spec.role.name(),
                    )
                    .await
                {
                    Ok(text) => tool_output.push_str(&text),
                    Err(err) => {
                        warn!(
                            tool = %invocation.tool,
                            role = spec.role.name(),
                            error = %err,
                            "tool call failed"
                        );
                        tool_output.push_str(&format!("\nError: {err}\n"));
                    }
                }
            }

            // Chain validation guarantees every index points backwards.
            let context = spec
                .depends_on
                .iter()
                .filter_map(|d| stages.get(*d))
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let text = self.reasoner.compose(spec, &context, &tool_output);
            stages.push(StageOutput {
                role_title: spec.role.title(),
                text,
            });
        }

        let answer = stages.last().map(|s| s.text.clone()).unwrap_or_default();
        Ok(PipelineReport {
            answer,
            stages,
            tools_used,
        })
    }
}
