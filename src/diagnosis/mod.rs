//! Query replay and execution-plan diagnosis.
//!
//! - `locator`: find a profiled operation by identifier
//! - `namespace`: split `store.collection`
//! - `reconstruct`: rebuild an explainable request from the logged command
//! - `executor` / `plan`: run explain and parse the stage tree
//! - `extract`: performance block and flattened stages
//! - `recommend`: tuning rules
//! - `engine`: the assembled pipeline with its partial-result policy

pub mod backend;
pub mod engine;
pub mod executor;
pub mod extract;
pub mod locator;
pub mod namespace;
pub mod plan;
pub mod recommend;
pub mod reconstruct;


pub use backend::{PlanBackend, ProfileBackend};
pub use engine::{DiagnoseOptions, DiagnosticEngine};
pub use namespace::Namespace;
pub use plan::{ExplainPlan, ExplainSummary, RawStageNode};
pub use recommend::RuleConfig;
pub use reconstruct::ExplainRequest;
