use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::error::TotalOverflow;
use crate::isomorphism::are_isomorphic;
use crate::skeleton::{Label, Skeleton};

/// Isomorphism invariant used to bucket candidates. Equal digests are
/// necessary for isomorphism, never sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest {
  pub vertex_count: usize,
  pub edge_count: usize,
  pub endpoint_mix: u64,
  pub edge_label_xor: u64,
}

const NO_EDGE_LABEL: u64 = 0;

fn mix_edge(src: Label, dst: Label, label: Option<Label>) -> u64 {
  let mut h = DefaultHasher::new();
  (src, dst, label).hash(&mut h);
  h.finish()
}

impl Digest {
  pub fn of(g: &Skeleton) -> Self {
    let labels = g.labels();
    let mut endpoint_mix = 1u64;
    let mut edge_label_xor = 1u64;
    for (u, v, label) in g.edges() {
      endpoint_mix ^= mix_edge(labels[u], labels[v], label);
      edge_label_xor ^= label.map_or(NO_EDGE_LABEL, u64::from);
    }
    Digest {
      vertex_count: g.vertex_count(),
      edge_count: g.edge_count(),
      endpoint_mix,
      edge_label_xor,
    }
  }
}

/// Representative of one isomorphism class and its running total.
#[derive(Debug, Clone)]
pub struct IsoClass {
  pub node_id: usize,
  pub representative: Skeleton,
  pub count: u64,
}

/// =============== Digest bucket + exact isomorphism ===============
///
/// Classes never span plan nodes: the bucket key carries the node id.
#[derive(Debug, Default)]
pub struct CanonicalIndex {
  classes: Vec<IsoClass>,
  buckets: HashMap<(usize, Digest), Vec<usize>>,
}

impl CanonicalIndex {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds `count` to the class of `instance`, opening a new class when no
  /// representative in the bucket is isomorphic to it. On overflow the class
  /// keeps its previous total.
  pub fn add_occurrence(&mut self, node_id: usize, instance: Skeleton, count: u64) -> Result<(), TotalOverflow> {
    let bucket = self.buckets.entry((node_id, Digest::of(&instance))).or_default();
    for &slot in bucket.iter() {
      let class = &mut self.classes[slot];
      if are_isomorphic(&class.representative, &instance) {
        class.count = class
          .count
          .checked_add(count)
          .ok_or(TotalOverflow { node_id, total: class.count, count })?;
        return Ok(());
      }
    }
    bucket.push(self.classes.len());
    self.classes.push(IsoClass { node_id, representative: instance, count });
    Ok(())
  }

  /// Classes in the order they were first seen.
  pub fn classes(&self) -> impl Iterator<Item = &IsoClass> {
    self.classes.iter()
  }

  pub fn len(&self) -> usize {
    self.classes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.classes.is_empty()
  }

  /// Sum over the classes of `node_id`, `None` if it does not fit in a `u64`.
  pub fn total_for_node(&self, node_id: usize) -> Option<u64> {
    self
      .classes
      .iter()
      .filter(|c| c.node_id == node_id)
      .try_fold(0u64, |total, c| total.checked_add(c.count))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn labeled(labels: &[Label], edges: &[(usize, usize)]) -> Skeleton {
    let mut g = Skeleton::new();
    for _ in labels {
      g.add_vertex();
    }
    g.apply_labels(labels).unwrap();
    for &(u, v) in edges {
      g.add_edge(u, v, None).unwrap();
    }
    g
  }

  #[test]
  fn identical_instances_share_a_class() {
    let mut index = CanonicalIndex::new();
    index.add_occurrence(0, labeled(&[1, 2], &[(0, 1)]), 5).unwrap();
    index.add_occurrence(0, labeled(&[1, 2], &[(0, 1)]), 3).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.classes().next().unwrap().count, 8);
  }

  #[test]
  fn reversed_labels_on_a_directed_edge_stay_apart() {
    let mut index = CanonicalIndex::new();
    index.add_occurrence(0, labeled(&[1, 2], &[(0, 1)]), 5).unwrap();
    index.add_occurrence(0, labeled(&[2, 1], &[(0, 1)]), 3).unwrap();
    let counts: Vec<u64> = index.classes().map(|c| c.count).collect();
    assert_eq!(counts, vec![5, 3]);
  }

  #[test]
  fn isomorphic_relabelings_merge() {
    let mut index = CanonicalIndex::new();
    // path a -> b -> c written with two different vertex orders
    index.add_occurrence(3, labeled(&[7, 8, 9], &[(0, 1), (1, 2)]), 2).unwrap();
    index.add_occurrence(3, labeled(&[9, 7, 8], &[(1, 2), (2, 0)]), 4).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.total_for_node(3), Some(6));
  }

  #[test]
  fn different_nodes_never_merge() {
    let mut index = CanonicalIndex::new();
    index.add_occurrence(0, labeled(&[1, 2], &[(0, 1)]), 1).unwrap();
    index.add_occurrence(1, labeled(&[1, 2], &[(0, 1)]), 1).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.total_for_node(0), Some(1));
    assert_eq!(index.total_for_node(1), Some(1));
  }

  #[test]
  fn digest_collisions_are_settled_by_the_oracle() {
    // 6-cycle and two triangles: same sizes, labels and edge label mix
    let hexagon = labeled(&[0; 6], &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
    let triangles = labeled(&[0; 6], &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
    assert_eq!(Digest::of(&hexagon), Digest::of(&triangles));

    let mut index = CanonicalIndex::new();
    index.add_occurrence(0, hexagon, 1).unwrap();
    index.add_occurrence(0, triangles, 1).unwrap();
    assert_eq!(index.len(), 2);
  }

  #[test]
  fn overflowing_class_total_is_refused() {
    let mut index = CanonicalIndex::new();
    index.add_occurrence(0, labeled(&[1, 2], &[(0, 1)]), u64::MAX).unwrap();
    let err = index.add_occurrence(0, labeled(&[1, 2], &[(0, 1)]), 1).unwrap_err();
    assert_eq!(err, TotalOverflow { node_id: 0, total: u64::MAX, count: 1 });
    assert_eq!(index.len(), 1);
    assert_eq!(index.classes().next().unwrap().count, u64::MAX);
  }

  #[test]
  fn node_total_reports_overflow_across_classes() {
    let mut index = CanonicalIndex::new();
    index.add_occurrence(0, labeled(&[1, 2], &[(0, 1)]), u64::MAX).unwrap();
    index.add_occurrence(0, labeled(&[2, 1], &[(0, 1)]), 1).unwrap();
    index.add_occurrence(1, labeled(&[1, 2], &[(0, 1)]), 1).unwrap();
    assert_eq!(index.total_for_node(0), None);
    assert_eq!(index.total_for_node(1), Some(1));
    assert_eq!(index.total_for_node(2), Some(0));
  }

  #[test]
  fn sizes_are_part_of_the_digest() {
    let small = labeled(&[1, 1], &[(0, 1)]);
    let wide = labeled(&[1, 1, 1], &[(0, 1)]);
    let dense = labeled(&[1, 1], &[(0, 1), (0, 1)]);
    assert_ne!(Digest::of(&small), Digest::of(&wide));
    assert_ne!(Digest::of(&small), Digest::of(&dense));

    let mut index = CanonicalIndex::new();
    index.add_occurrence(0, small, 1).unwrap();
    index.add_occurrence(0, wide, 1).unwrap();
    index.add_occurrence(0, dense, 1).unwrap();
    assert_eq!(index.len(), 3);
  }
}
