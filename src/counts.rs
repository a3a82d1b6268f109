use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result, Site, TotalOverflow};
use crate::skeleton::Label;
use crate::tokens::Tokens;

/// One raw observation: `count` matches of node `node_id` carrying `labels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCountRecord<'a> {
  /// Ordinal of the input record that last wrote this key.
  pub record: usize,
  pub node_id: usize,
  pub labels: &'a [Label],
  pub count: u64,
}

/// How a repeated `(node id, label assignment)` key is folded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateRecords {
  /// Add the counts together.
  #[default]
  Sum,
  /// Keep only the last record.
  Overwrite,
}

/// Raw counts keyed by `(node id, label assignment)`.
#[derive(Debug, Default)]
pub struct RawCounts {
  by_key: BTreeMap<(usize, Vec<Label>), (usize, u64)>,
  records_read: usize,
  duplicates: DuplicateRecords,
}

impl RawCounts {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_duplicates(duplicates: DuplicateRecords) -> Self {
    RawCounts { duplicates, ..Self::default() }
  }

  /// Folds one record in. Fails when summing a duplicate would overflow, in
  /// which case the stored total is left untouched.
  pub fn insert(&mut self, node_id: usize, labels: Vec<Label>, count: u64) -> Result<()> {
    let record = self.records_read;
    self.records_read += 1;
    let slot = self.by_key.entry((node_id, labels)).or_insert((record, 0));
    let (earlier, previous) = *slot;
    if earlier == record {
      slot.1 = count;
      return Ok(());
    }
    match self.duplicates {
      DuplicateRecords::Sum => {
        let Some(total) = previous.checked_add(count) else {
          return Err(Error::CountOverflow {
            site: Site::Record(record),
            source: TotalOverflow { node_id, total: previous, count },
          });
        };
        debug!(node_id, record, earlier, "duplicate count record summed");
        *slot = (record, total);
      }
      DuplicateRecords::Overwrite => {
        if previous != count {
          warn!(node_id, record, earlier, previous, count, "duplicate count record overwritten");
        }
        *slot = (record, count);
      }
    }
    Ok(())
  }

  /// Reads `node_id label* count` records; the number of labels of each record
  /// is `vertex_counts[node_id]`.
  pub fn parse(text: &str, vertex_counts: &[usize]) -> Result<Self> {
    Self::parse_with(text, vertex_counts, DuplicateRecords::default())
  }

  pub fn parse_with(text: &str, vertex_counts: &[usize], duplicates: DuplicateRecords) -> Result<Self> {
    let mut t = Tokens::new(text);
    let mut counts = RawCounts::with_duplicates(duplicates);
    while !t.is_exhausted() {
      let record = counts.records_read;
      let node_id: usize = t
        .next_value("node id")
        .map_err(|e| Error::MalformedCounts(format!("record {}: {}", record, e)))?;
      let Some(&width) = vertex_counts.get(node_id) else {
        return Err(Error::MalformedCounts(format!(
          "record {}: node {} is not in the plan ({} nodes)",
          record,
          node_id,
          vertex_counts.len()
        )));
      };
      let mut labels = Vec::with_capacity(width);
      for _ in 0..width {
        let label = t
          .next_value("vertex label")
          .map_err(|e| Error::MalformedCounts(format!("record {}: {}", record, e)))?;
        labels.push(label);
      }
      let count = t
        .next_value("count")
        .map_err(|e| Error::MalformedCounts(format!("record {}: {}", record, e)))?;
      counts.insert(node_id, labels, count)?;
    }
    Ok(counts)
  }

  pub fn from_path(
    path: impl AsRef<Path>,
    vertex_counts: &[usize],
    duplicates: DuplicateRecords,
  ) -> Result<Self> {
    let text = fs::read_to_string(path.as_ref())?;
    Self::parse_with(&text, vertex_counts, duplicates)
  }

  /// Distinct records ordered by node id, then label assignment.
  pub fn records(&self) -> impl Iterator<Item = RawCountRecord<'_>> {
    self.by_key.iter().map(|((node_id, labels), &(record, count))| RawCountRecord {
      record,
      node_id: *node_id,
      labels,
      count,
    })
  }

  /// Distinct keys.
  pub fn len(&self) -> usize {
    self.by_key.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_key.is_empty()
  }

  /// Records consumed, duplicates included.
  pub fn records_read(&self) -> usize {
    self.records_read
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_width_follows_the_node_size() {
    let counts = RawCounts::parse("0 1 2 5\n1 4 4 4 9\n", &[2, 3]).unwrap();
    let records: Vec<_> = counts.records().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].labels, &[1, 2]);
    assert_eq!(records[0].count, 5);
    assert_eq!(records[1].node_id, 1);
    assert_eq!(records[1].labels, &[4, 4, 4]);
    assert_eq!(records[1].count, 9);
  }

  #[test]
  fn records_may_span_lines() {
    let counts = RawCounts::parse("0\n1\n2\n5", &[2]).unwrap();
    assert_eq!(counts.len(), 1);
  }

  #[test]
  fn repeated_keys_are_summed_by_default() {
    let counts = RawCounts::parse("0 1 2 5\n0 1 2 3\n0 2 1 4\n", &[2]).unwrap();
    assert_eq!(counts.records_read(), 3);
    assert_eq!(counts.len(), 2);
    let first = counts.records().find(|r| r.labels == [1, 2]).unwrap();
    assert_eq!(first.count, 8);
    assert_eq!(first.record, 1);
  }

  #[test]
  fn overwrite_keeps_the_last_write() {
    let text = "0 1 2 5\n0 1 2 3\n0 2 1 4\n";
    let counts = RawCounts::parse_with(text, &[2], DuplicateRecords::Overwrite).unwrap();
    assert_eq!(counts.len(), 2);
    let first = counts.records().find(|r| r.labels == [1, 2]).unwrap();
    assert_eq!(first.count, 3);
    assert_eq!(first.record, 1);
  }

  #[test]
  fn summing_past_the_maximum_is_an_error() {
    let text = format!("0 1 2 {}\n0 1 2 1\n", u64::MAX);
    let err = RawCounts::parse(&text, &[2]).unwrap_err();
    assert!(matches!(
      err,
      Error::CountOverflow { site: Site::Record(1), source: TotalOverflow { node_id: 0, total: u64::MAX, count: 1 } }
    ));

    let mut counts = RawCounts::new();
    counts.insert(0, vec![1, 2], u64::MAX).unwrap();
    assert!(counts.insert(0, vec![1, 2], 1).is_err());
    assert_eq!(counts.records().next().unwrap().count, u64::MAX);
  }

  #[test]
  fn overwrite_never_overflows() {
    let text = format!("0 1 2 {}\n0 1 2 1\n", u64::MAX);
    let counts = RawCounts::parse_with(&text, &[2], DuplicateRecords::Overwrite).unwrap();
    assert_eq!(counts.records().next().unwrap().count, 1);
  }

  #[test]
  fn unknown_node_stops_the_stream() {
    let err = RawCounts::parse("0 1 2 5\n7 1 1\n", &[2]).unwrap_err();
    match err {
      Error::MalformedCounts(msg) => assert!(msg.contains("record 1"), "{}", msg),
      other => panic!("unexpected error {:?}", other),
    }
  }

  #[test]
  fn truncated_record_is_malformed() {
    assert!(matches!(
      RawCounts::parse("0 1 2", &[2]),
      Err(Error::MalformedCounts(_))
    ));
  }

  #[test]
  fn empty_input_has_no_records() {
    let counts = RawCounts::parse("  \n", &[2]).unwrap();
    assert!(counts.is_empty());
  }
}
