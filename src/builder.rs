use std::collections::VecDeque;

use tracing::debug;

use crate::error::{Error, Result, Site, VertexOutOfRange};
use crate::plan::Plan;
use crate::skeleton::Skeleton;

/// Vertex count of the seed pattern every plan starts from.
pub const SEED_VERTICES: usize = 2;

/// Unlabeled skeleton of every plan node, indexed by node id. Nodes the
/// traversal never reached have none.
#[derive(Debug, Clone)]
pub struct Skeletons {
  by_node: Vec<Option<Skeleton>>,
}

impl Skeletons {
  pub fn get(&self, node_id: usize) -> Option<&Skeleton> {
    self.by_node.get(node_id).and_then(Option::as_ref)
  }

  pub fn len(&self) -> usize {
    self.by_node.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_node.is_empty()
  }

  pub fn reached(&self) -> impl Iterator<Item = (usize, &Skeleton)> {
    self
      .by_node
      .iter()
      .enumerate()
      .filter_map(|(id, s)| s.as_ref().map(|s| (id, s)))
  }
}

fn seed() -> std::result::Result<Skeleton, VertexOutOfRange> {
  let mut g = Skeleton::new();
  let a = g.add_vertex();
  let b = g.add_vertex();
  g.add_edge(a, b, None)?;
  Ok(g)
}

/// =============== Breadth-first replay of the plan ===============
///
/// Each child starts as a copy of its parent, gains at most one vertex and then
/// receives the edges of its plan edge's operations in order.
pub fn build_skeletons(plan: &Plan) -> Result<Skeletons> {
  let nodes = plan.nodes();
  let root_id = plan.root_node_id();
  let root = &nodes[root_id];
  if root.vertex_count != SEED_VERTICES {
    return Err(Error::MalformedPlan(format!(
      "root node {} declares {} vertices, the seed pattern has {}",
      root_id, root.vertex_count, SEED_VERTICES
    )));
  }

  let mut by_node: Vec<Option<Skeleton>> = vec![None; nodes.len()];
  let root_skeleton =
    seed().map_err(|e| Error::MalformedPlan(format!("cannot build the seed pattern of node {}: {}", root_id, e)))?;
  by_node[root_id] = Some(root_skeleton);

  let mut queue = VecDeque::from([root_id]);
  while let Some(cur) = queue.pop_front() {
    let cur_node = &nodes[cur];
    // queued nodes are always built
    let Some(parent) = by_node[cur].clone() else { continue };

    for edge in plan.out_edges(cur_node) {
      if edge.source_node != cur {
        return Err(Error::MalformedPlan(format!(
          "edge {} is listed under node {} but starts at node {}",
          edge.id, cur, edge.source_node
        )));
      }
      let child = &nodes[edge.dest_node];
      if child.idx == root_id || by_node[child.idx].is_some() {
        return Err(Error::MalformedPlan(format!(
          "node {} is the destination of more than one plan edge (again via edge {})",
          child.idx, edge.id
        )));
      }
      if child.vertex_count < cur_node.vertex_count {
        return Err(Error::MalformedPlan(format!(
          "edge {} shrinks node {} ({} vertices) into node {} ({} vertices)",
          edge.id, cur, cur_node.vertex_count, child.idx, child.vertex_count
        )));
      }
      if child.vertex_count > cur_node.vertex_count + 1 {
        return Err(Error::MalformedPlan(format!(
          "edge {} grows node {} by {} vertices, at most one is allowed",
          edge.id,
          cur,
          child.vertex_count - cur_node.vertex_count
        )));
      }

      let mut g = parent.clone();
      if cur_node.vertex_count < child.vertex_count {
        g.add_vertex();
      }
      for op in &edge.operations {
        let (src, dst) = op.oriented();
        g.add_edge(src, dst, None)
          .map_err(|source| Error::InvalidVertex { site: Site::PlanEdge(edge.id), source })?;
      }
      debug!(
        node = child.idx,
        parent = cur,
        vertices = g.vertex_count(),
        edges = g.edge_count(),
        "built skeleton"
      );
      by_node[child.idx] = Some(g);
      queue.push_back(child.idx);
    }
  }

  Ok(Skeletons { by_node })
}
