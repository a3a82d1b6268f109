use std::fmt;
use std::io;
use thiserror::Error;

/// A vertex index that does not exist in the graph it was used against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("vertex {vertex} out of range for a graph with {vertex_count} vertices")]
pub struct VertexOutOfRange {
  pub vertex: usize,
  pub vertex_count: usize,
}

/// A running total that no longer fits in a `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("adding {count} to {total} overflows the count of node {node_id}")]
pub struct TotalOverflow {
  pub node_id: usize,
  pub total: u64,
  pub count: u64,
}

/// Where an out-of-range vertex or an overflowing count was met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
  PlanEdge(usize),
  Record(usize),
}

impl fmt::Display for Site {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Site::PlanEdge(id) => write!(f, "plan edge {}", id),
      Site::Record(idx) => write!(f, "count record {}", idx),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// The plan cannot be loaded or replayed without corrupting a skeleton.
  #[error("malformed plan: {0}")]
  MalformedPlan(String),

  #[error("invalid vertex at {site}: {source}")]
  InvalidVertex {
    site: Site,
    #[source]
    source: VertexOutOfRange,
  },

  /// The record's node has no skeleton because the traversal never reached it.
  #[error("count record {record}: node {node_id} is not reachable from the plan root")]
  UnreachableNode { record: usize, node_id: usize },

  #[error("count record {record}: node {node_id} has {expected} vertices but {actual} labels were given")]
  SizeMismatch {
    record: usize,
    node_id: usize,
    expected: usize,
    actual: usize,
  },

  /// Summing would lose counts; the total is left as it was before this record.
  #[error("count overflow at {site}: {source}")]
  CountOverflow {
    site: Site,
    #[source]
    source: TotalOverflow,
  },

  /// The count stream cannot be read further.
  #[error("malformed counts: {0}")]
  MalformedCounts(String),

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  /// Errors that only invalidate a single count record.
  pub fn is_record_drop(&self) -> bool {
    matches!(
      self,
      Error::UnreachableNode { .. }
        | Error::SizeMismatch { .. }
        | Error::InvalidVertex { site: Site::Record(_), .. }
    )
  }
}

pub type Result<T> = std::result::Result<T, Error>;
