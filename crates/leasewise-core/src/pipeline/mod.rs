//! Query classification, stage-chain construction, and the sequential
//! three-role runner.
//!
//! A query is classified into an intent, the intent selects a
//! three-stage chain (auditor, architect, financier), and the runner
//! executes the stages in order. Each stage sees the verbatim output of
//! the stages before it. All numbers come from tool output; the
//! reasoner only arranges them.

pub mod chain;
pub mod classifier;
pub mod runner;

pub use chain::{Chain, Invocation, StageRole, StageSpec};
pub use classifier::{classify, Intent};
pub use runner::{PipelineReport, PipelineRunner, Reasoner, StageOutput, TemplateReasoner};
