//! Interface for external answer evaluation.
//!
//! An evaluation collaborator scores a finished pipeline answer against
//! the query that produced it. The engine only defines the contract and
//! the score arithmetic; actual evaluators (LLM-backed or rule-based)
//! plug in from outside.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Score for a single metric, on a 0.0 to 1.0 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricScore {
    pub name: String,
    pub score: f64,
    pub passed: bool,
    pub reason: String,
}

/// Outcome of evaluating one answer.
///
/// `error` is set when the evaluator itself failed; metric scores from
/// before the failure are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evaluation {
    pub metrics: Vec<MetricScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Evaluation {
    /// Mean of the metric scores; zero when there are none.
    pub fn overall_score(&self) -> f64 {
        if self.metrics.is_empty() {
            return 0.0;
        }
        self.metrics.iter().map(|m| m.score).sum::<f64>() / self.metrics.len() as f64
    }

    /// Whether every metric passed and the evaluator did not fail.
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.metrics.iter().all(|m| m.passed)
    }
}

/// An external scorer for pipeline answers.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Score `answer` as a response to `query`.
    ///
    /// `tools_used` is the pipeline's tool trail in invocation order,
    /// so a scorer can check the answer was grounded in the right
    /// tools, not just that it reads well.
    async fn evaluate(&self, query: &str, answer: &str, tools_used: &[String]) -> Evaluation;
}
