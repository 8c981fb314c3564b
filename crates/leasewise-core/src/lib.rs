//! # leasewise-core
//!
//! Deterministic engine and task pipeline for the leasewise VM
//! rightsizing advisor:
//!
//! - **[`dataset`]** -- CSV dataset loading with column validation
//! - **[`catalog`]** -- static pricing catalog and cheapest-fit lookup
//! - **[`filter`]** -- waste classification and aggregated reports
//! - **[`recommend`]** -- per-VM sizing and the batch recommendation run
//! - **[`savings`]** -- the persisted recommendation ledger and
//!   financial summaries
//! - **[`tools`]** -- the [`Tool`](tools::Tool) trait and name-based registry
//! - **[`pipeline`]** -- query classification, stage-chain construction,
//!   and the sequential three-role runner
//! - **[`eval`]** -- the interface the external evaluation collaborator
//!   plugs into
//!
//! Raw numbers never pass through language-model reasoning: every count
//! and dollar figure in a report is computed here and embedded in the
//! rendered text.

pub mod catalog;
pub mod dataset;
pub mod eval;
pub mod filter;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod savings;
pub mod tools;
