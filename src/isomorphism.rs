use std::cmp::Reverse;
use std::collections::HashMap;

use crate::skeleton::{Label, Skeleton};

/// =============== Exact labeled isomorphism ===============
///
/// Full isomorphism, not subgraph containment: the search only runs on graphs
/// with equal vertex and edge counts, and every ordered vertex pair has to carry
/// the same multiset of edge labels on both sides.

/// Flattened view of a skeleton used during the search.
struct Profile {
  labels: Vec<Label>,
  out_deg: Vec<usize>,
  in_deg: Vec<usize>,
  // (u, v) -> sorted edge labels of every u -> v edge
  between: HashMap<(usize, usize), Vec<Option<Label>>>,
}

impl Profile {
  fn of(g: &Skeleton) -> Self {
    let n = g.vertex_count();
    let mut out_deg = vec![0; n];
    let mut in_deg = vec![0; n];
    let mut between: HashMap<(usize, usize), Vec<Option<Label>>> = HashMap::new();
    for (u, v, label) in g.edges() {
      out_deg[u] += 1;
      in_deg[v] += 1;
      between.entry((u, v)).or_default().push(label);
    }
    for labels in between.values_mut() {
      labels.sort_unstable();
    }
    Profile { labels: g.labels(), out_deg, in_deg, between }
  }

  fn edges_between(&self, u: usize, v: usize) -> &[Option<Label>] {
    self.between.get(&(u, v)).map(Vec::as_slice).unwrap_or(&[])
  }
}

struct Matcher<'a> {
  a: &'a Profile,
  b: &'a Profile,
  order: Vec<usize>,
  a_to_b: Vec<Option<usize>>,
  b_used: Vec<bool>,
}

impl Matcher<'_> {
  fn feasible(&self, u: usize, x: usize) -> bool {
    let (a, b) = (self.a, self.b);
    if self.b_used[x]
      || a.labels[u] != b.labels[x]
      || a.out_deg[u] != b.out_deg[x]
      || a.in_deg[u] != b.in_deg[x]
    {
      return false;
    }
    if a.edges_between(u, u) != b.edges_between(x, x) {
      return false;
    }
    for (w, mapped) in self.a_to_b.iter().enumerate() {
      let Some(y) = *mapped else { continue };
      if a.edges_between(u, w) != b.edges_between(x, y)
        || a.edges_between(w, u) != b.edges_between(y, x)
      {
        return false;
      }
    }
    true
  }

  fn extend(&mut self, depth: usize) -> bool {
    if depth == self.order.len() {
      return true;
    }
    let u = self.order[depth];
    for x in 0..self.b.labels.len() {
      if !self.feasible(u, x) {
        continue;
      }
      self.a_to_b[u] = Some(x);
      self.b_used[x] = true;
      if self.extend(depth + 1) {
        return true;
      }
      self.a_to_b[u] = None;
      self.b_used[x] = false;
    }
    false
  }
}

/// True when a vertex bijection maps `a` onto `b` preserving direction, vertex
/// labels, edge labels and edge multiplicity.
pub fn are_isomorphic(a: &Skeleton, b: &Skeleton) -> bool {
  if a.vertex_count() != b.vertex_count() || a.edge_count() != b.edge_count() {
    return false;
  }
  let pa = Profile::of(a);
  let pb = Profile::of(b);

  // cheap necessary condition before searching
  let mut la = pa.labels.clone();
  let mut lb = pb.labels.clone();
  la.sort_unstable();
  lb.sort_unstable();
  if la != lb {
    return false;
  }

  let n = pa.labels.len();
  let mut order: Vec<usize> = (0..n).collect();
  order.sort_by_key(|&v| Reverse(pa.out_deg[v] + pa.in_deg[v]));

  let mut matcher = Matcher {
    a: &pa,
    b: &pb,
    order,
    a_to_b: vec![None; n],
    b_used: vec![false; n],
  };
  matcher.extend(0)
}
