use std::fs;
use std::ops::Range;
use std::path::Path;

use crate::error::{Error, Result};
use crate::tokens::Tokens;

/// One pattern of the decomposition plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
  pub idx: usize,
  /// `edges[edge_start .. edge_start + edge_count]` leave this node.
  pub edge_start: usize,
  pub edge_count: usize,
  pub vertex_count: usize,
  pub is_query: bool,
}

impl PlanNode {
  pub fn edge_range(&self) -> Range<usize> {
    self.edge_start..self.edge_start + self.edge_count
  }
}

/// Adds one directed edge between two local vertices of the destination pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
  pub src_key: usize,
  pub dst_key: usize,
  pub forward: bool,
}

impl Operation {
  /// `(source, target)` of the edge this operation adds.
  pub fn oriented(&self) -> (usize, usize) {
    if self.forward {
      (self.src_key, self.dst_key)
    } else {
      (self.dst_key, self.src_key)
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEdge {
  pub id: usize,
  pub source_node: usize,
  pub dest_node: usize,
  pub operations: Vec<Operation>,
}

/// Decomposition plan. Edges refer to nodes by index into `nodes`.
#[derive(Debug, Clone)]
pub struct Plan {
  root_node_id: usize,
  nodes: Vec<PlanNode>,
  edges: Vec<PlanEdge>,
}

impl Plan {
  /// Checks every cross reference before handing out the plan.
  pub fn new(root_node_id: usize, nodes: Vec<PlanNode>, edges: Vec<PlanEdge>) -> Result<Self> {
    if root_node_id >= nodes.len() {
      return Err(Error::MalformedPlan(format!(
        "root node {} out of range ({} nodes)",
        root_node_id,
        nodes.len()
      )));
    }
    for (i, node) in nodes.iter().enumerate() {
      if node.idx != i {
        return Err(Error::MalformedPlan(format!("node at position {} has idx {}", i, node.idx)));
      }
      let end = node.edge_start.checked_add(node.edge_count);
      if end.is_none_or(|end| end > edges.len()) {
        return Err(Error::MalformedPlan(format!(
          "node {} owns edges {}+{} but the plan has {} edges",
          i,
          node.edge_start,
          node.edge_count,
          edges.len()
        )));
      }
    }
    for (i, edge) in edges.iter().enumerate() {
      if edge.id != i {
        return Err(Error::MalformedPlan(format!("edge at position {} has id {}", i, edge.id)));
      }
      for (what, node) in [("source", edge.source_node), ("destination", edge.dest_node)] {
        if node >= nodes.len() {
          return Err(Error::MalformedPlan(format!(
            "edge {} {} node {} out of range ({} nodes)",
            i,
            what,
            node,
            nodes.len()
          )));
        }
      }
    }
    Ok(Plan { root_node_id, nodes, edges })
  }

  /// Reads the whitespace-separated plan layout: three ignored header values,
  /// the root id, the node table and the edge table with their operations.
  pub fn parse(text: &str) -> Result<Self> {
    let mut t = Tokens::new(text);
    let (root_node_id, nodes, edges) = read_tables(&mut t).map_err(Error::MalformedPlan)?;
    Self::new(root_node_id, nodes, edges)
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    let text = fs::read_to_string(path.as_ref())?;
    Self::parse(&text)
  }

  pub fn root_node_id(&self) -> usize {
    self.root_node_id
  }

  pub fn nodes(&self) -> &[PlanNode] {
    &self.nodes
  }

  pub fn edges(&self) -> &[PlanEdge] {
    &self.edges
  }

  pub fn node(&self, idx: usize) -> Option<&PlanNode> {
    self.nodes.get(idx)
  }

  pub fn out_edges(&self, node: &PlanNode) -> &[PlanEdge] {
    &self.edges[node.edge_range()]
  }

  /// Per-node pattern size, indexed by node id.
  pub fn vertex_counts(&self) -> Vec<usize> {
    self.nodes.iter().map(|n| n.vertex_count).collect()
  }
}

type Tables = (usize, Vec<PlanNode>, Vec<PlanEdge>);

fn read_tables(t: &mut Tokens<'_>) -> std::result::Result<Tables, String> {
  for _ in 0..3 {
    t.next_value::<u64>("header value")?;
  }
  let root_node_id = t.next_value("root node id")?;

  let node_total: usize = t.next_value("node count")?;
  let mut nodes = Vec::with_capacity(node_total);
  for idx in 0..node_total {
    nodes.push(PlanNode {
      idx,
      edge_start: t.next_value("edge start index")?,
      edge_count: t.next_value("edge count of node")?,
      vertex_count: t.next_value("subgraph vertex count")?,
      is_query: t.next_flag("query flag")?,
    });
  }

  let edge_total: usize = t.next_value("edge count")?;
  let mut edges = Vec::with_capacity(edge_total);
  for id in 0..edge_total {
    let source_node = t.next_value("edge source node")?;
    let dest_node = t.next_value("edge destination node")?;
    let op_total: usize = t.next_value("operation count")?;
    let mut operations = Vec::with_capacity(op_total);
    for _ in 0..op_total {
      operations.push(Operation {
        src_key: t.next_value("operation source key")?,
        dst_key: t.next_value("operation destination key")?,
        forward: t.next_flag("operation direction")?,
      });
    }
    edges.push(PlanEdge { id, source_node, dest_node, operations });
  }

  Ok((root_node_id, nodes, edges))
}

#[cfg(test)]
mod tests {
  use super::*;

  const TWO_NODES: &str = "\
0 0 0
0
2
0 1 2 0
1 0 3 1
1
0 1 1
1 2 1
";

  #[test]
  fn parses_nodes_edges_and_operations() {
    let plan = Plan::parse(TWO_NODES).unwrap();
    assert_eq!(plan.root_node_id(), 0);
    assert_eq!(plan.nodes().len(), 2);
    assert_eq!(plan.vertex_counts(), vec![2, 3]);
    assert!(!plan.nodes()[0].is_query);
    assert!(plan.nodes()[1].is_query);

    let root = plan.node(0).unwrap();
    let out = plan.out_edges(root);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].dest_node, 1);
    assert_eq!(
      out[0].operations,
      vec![Operation { src_key: 1, dst_key: 2, forward: true }]
    );
  }

  #[test]
  fn backward_operation_swaps_endpoints() {
    let op = Operation { src_key: 0, dst_key: 2, forward: false };
    assert_eq!(op.oriented(), (2, 0));
  }

  #[test]
  fn truncated_plan_names_the_missing_field() {
    let err = Plan::parse("0 0 0\n0\n2\n0 1 2 0\n").unwrap_err();
    match err {
      Error::MalformedPlan(msg) => assert!(msg.contains("edge start index"), "{}", msg),
      other => panic!("unexpected error {:?}", other),
    }
  }

  #[test]
  fn edge_to_missing_node_is_rejected() {
    let text = "0 0 0\n0\n1\n0 1 2 0\n1\n0 5 0\n";
    assert!(matches!(Plan::parse(text), Err(Error::MalformedPlan(_))));
  }

  #[test]
  fn edge_range_past_the_edge_table_is_rejected() {
    let text = "0 0 0\n0\n1\n0 3 2 0\n1\n0 0 0\n";
    assert!(matches!(Plan::parse(text), Err(Error::MalformedPlan(_))));
  }

  #[test]
  fn root_out_of_range_is_rejected() {
    let text = "0 0 0\n4\n1\n0 0 2 1\n0\n";
    assert!(matches!(Plan::parse(text), Err(Error::MalformedPlan(_))));
  }
}
