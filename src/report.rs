use std::io::Write;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::{CanonicalIndex, IsoClass};
use crate::plan::Plan;
use crate::skeleton::{Label, Skeleton};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableEdge {
  pub src: usize,
  pub dst: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<Label>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableGraph {
  pub vertex_count: usize,
  pub edge_count: usize,
  pub labels: Vec<Label>,
  pub edges: Vec<SerializableEdge>,
}

impl From<&Skeleton> for SerializableGraph {
  fn from(g: &Skeleton) -> Self {
    SerializableGraph {
      vertex_count: g.vertex_count(),
      edge_count: g.edge_count(),
      labels: g.labels(),
      edges: g
        .edges()
        .map(|(src, dst, label)| SerializableEdge { src, dst, label })
        .collect(),
    }
  }
}

/// One line of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReport {
  pub node_id: usize,
  pub is_query: bool,
  pub count: u64,
  pub graph: SerializableGraph,
}

impl ClassReport {
  pub fn new(class: &IsoClass, is_query: bool) -> Self {
    ClassReport {
      node_id: class.node_id,
      is_query,
      count: class.count,
      graph: SerializableGraph::from(&class.representative),
    }
  }
}

/// Receives every isomorphism class once, then `finish`.
pub trait OutputSink {
  fn write_class(&mut self, report: &ClassReport) -> Result<()>;

  fn finish(&mut self) -> Result<()> {
    Ok(())
  }
}

/// `Count:<n>`, `<vertices> <edges>`, the labels, then one `src dst` line per edge.
pub struct TextSink<W: Write> {
  out: W,
}

impl<W: Write> TextSink<W> {
  pub fn new(out: W) -> Self {
    TextSink { out }
  }

  pub fn into_inner(self) -> W {
    self.out
  }
}

impl<W: Write> OutputSink for TextSink<W> {
  fn write_class(&mut self, report: &ClassReport) -> Result<()> {
    let g = &report.graph;
    writeln!(self.out, "Count:{}", report.count)?;
    writeln!(self.out, "{} {}", g.vertex_count, g.edge_count)?;
    writeln!(self.out, "{}", g.labels.iter().join(" "))?;
    for e in &g.edges {
      match e.label {
        Some(label) => writeln!(self.out, "{} {} {}", e.src, e.dst, label)?,
        None => writeln!(self.out, "{} {}", e.src, e.dst)?,
      }
    }
    writeln!(self.out)?;
    Ok(())
  }

  fn finish(&mut self) -> Result<()> {
    self.out.flush()?;
    Ok(())
  }
}

/// Collects the classes and writes them as one pretty-printed JSON array.
pub struct JsonSink<W: Write> {
  out: W,
  reports: Vec<ClassReport>,
}

impl<W: Write> JsonSink<W> {
  pub fn new(out: W) -> Self {
    JsonSink { out, reports: Vec::new() }
  }

  pub fn into_inner(self) -> W {
    self.out
  }
}

impl<W: Write> OutputSink for JsonSink<W> {
  fn write_class(&mut self, report: &ClassReport) -> Result<()> {
    self.reports.push(report.clone());
    Ok(())
  }

  fn finish(&mut self) -> Result<()> {
    serde_json::to_writer_pretty(&mut self.out, &self.reports)?;
    writeln!(self.out)?;
    self.out.flush()?;
    Ok(())
  }
}

/// Streams every class of `index` into `sink`. With `queries_only`, classes of
/// nodes not flagged as queries are left out. Returns the number written.
pub fn write_report(
  plan: &Plan,
  index: &CanonicalIndex,
  sink: &mut dyn OutputSink,
  queries_only: bool,
) -> Result<usize> {
  let mut written = 0;
  for class in index.classes() {
    let is_query = plan.node(class.node_id).is_some_and(|n| n.is_query);
    if queries_only && !is_query {
      continue;
    }
    sink.write_class(&ClassReport::new(class, is_query))?;
    written += 1;
  }
  sink.finish()?;
  Ok(written)
}
