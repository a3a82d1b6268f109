//! Counts labeled query patterns produced by a decomposition plan.
//!
//! The plan is replayed from its root to rebuild one unlabeled skeleton per
//! node. Raw `(node, labels, count)` records are then laid over those
//! skeletons and merged whenever two labeled instances of the same node are
//! isomorphic.

pub mod aggregate;
pub mod builder;
pub mod counts;
pub mod error;
pub mod index;
pub mod isomorphism;
pub mod plan;
pub mod report;
pub mod skeleton;
mod tokens;

pub use aggregate::{CountOptions, CountOutcome, DropPolicy, aggregate};
pub use builder::{Skeletons, build_skeletons};
pub use counts::{DuplicateRecords, RawCountRecord, RawCounts};
pub use error::{Error, Result, Site, TotalOverflow, VertexOutOfRange};
pub use index::{CanonicalIndex, IsoClass};
pub use isomorphism::are_isomorphic;
pub use plan::{Operation, Plan, PlanEdge, PlanNode};
pub use report::{ClassReport, JsonSink, OutputSink, SerializableEdge, SerializableGraph, TextSink, write_report};
pub use skeleton::{Label, Skeleton};

/// Builds every skeleton of `plan`, then folds `counts` into isomorphism classes.
pub fn count_labeled_queries(plan: &Plan, counts: &RawCounts, options: &CountOptions) -> Result<CountOutcome> {
  let skeletons = build_skeletons(plan)?;
  aggregate(&skeletons, counts, options)
}
