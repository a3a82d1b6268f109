use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::VertexOutOfRange;

pub type Label = u32;

/// Label carried by a vertex that has not been assigned one yet.
pub const UNLABELED: Label = Label::MAX;

/// Directed multigraph over the vertices `0..n`, labeled on vertices and
/// optionally on edges. Skeletons only grow.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
  graph: DiGraph<Label, Option<Label>>,
}

impl Skeleton {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn vertex_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  fn vertex(&self, v: usize) -> Result<NodeIndex, VertexOutOfRange> {
    if v < self.vertex_count() {
      Ok(NodeIndex::new(v))
    } else {
      Err(VertexOutOfRange { vertex: v, vertex_count: self.vertex_count() })
    }
  }

  /// Appends an unlabeled vertex and returns its index.
  pub fn add_vertex(&mut self) -> usize {
    self.graph.add_node(UNLABELED).index()
  }

  /// Adds the directed edge `src -> dst`. Parallel edges and self-loops are kept.
  pub fn add_edge(
    &mut self,
    src: usize,
    dst: usize,
    label: Option<Label>,
  ) -> Result<usize, VertexOutOfRange> {
    let a = self.vertex(src)?;
    let b = self.vertex(dst)?;
    Ok(self.graph.add_edge(a, b, label).index())
  }

  pub fn set_vertex_label(&mut self, v: usize, label: Label) -> Result<(), VertexOutOfRange> {
    let ix = self.vertex(v)?;
    self.graph[ix] = label;
    Ok(())
  }

  /// Overwrites vertex labels position by position, `labels[i]` going to vertex `i`.
  pub fn apply_labels(&mut self, labels: &[Label]) -> Result<(), VertexOutOfRange> {
    for (v, &label) in labels.iter().enumerate() {
      self.set_vertex_label(v, label)?;
    }
    Ok(())
  }

  pub fn vertex_label(&self, v: usize) -> Option<Label> {
    self.graph.node_weight(NodeIndex::new(v)).copied()
  }

  /// Vertex labels in vertex order.
  pub fn labels(&self) -> Vec<Label> {
    self.graph.node_indices().map(|ix| self.graph[ix]).collect()
  }

  /// `(source, target, edge label)` in insertion order.
  pub fn edges(&self) -> impl Iterator<Item = (usize, usize, Option<Label>)> + '_ {
    self
      .graph
      .edge_references()
      .map(|e| (e.source().index(), e.target().index(), *e.weight()))
  }

  /// `None` when `v` is not a vertex, like [`Skeleton::vertex_label`].
  pub fn out_degree(&self, v: usize) -> Option<usize> {
    self.degree(v, Direction::Outgoing)
  }

  pub fn in_degree(&self, v: usize) -> Option<usize> {
    self.degree(v, Direction::Incoming)
  }

  fn degree(&self, v: usize, dir: Direction) -> Option<usize> {
    let ix = self.vertex(v).ok()?;
    Some(self.graph.edges_directed(ix, dir).count())
  }
}
