use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::builder::Skeletons;
use crate::counts::{RawCountRecord, RawCounts};
use crate::error::{Error, Result, Site};
use crate::index::CanonicalIndex;
use crate::skeleton::Skeleton;

/// What happens to a record that cannot be resolved against its skeleton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropPolicy {
  /// Report the record and keep going.
  #[default]
  Skip,
  /// Fail the run on the first such record.
  Abort,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CountOptions {
  pub drop_policy: DropPolicy,
  pub show_progress: bool,
}

/// Merged classes plus every record that was dropped on the way.
#[derive(Debug, Default)]
pub struct CountOutcome {
  pub index: CanonicalIndex,
  pub dropped: Vec<Error>,
}

/// Clones the record's node skeleton and writes the label assignment over it.
pub fn labeled_instance(skeletons: &Skeletons, record: &RawCountRecord<'_>) -> Result<Skeleton> {
  let Some(skeleton) = skeletons.get(record.node_id) else {
    return Err(Error::UnreachableNode { record: record.record, node_id: record.node_id });
  };
  if record.labels.len() != skeleton.vertex_count() {
    return Err(Error::SizeMismatch {
      record: record.record,
      node_id: record.node_id,
      expected: skeleton.vertex_count(),
      actual: record.labels.len(),
    });
  }
  let mut instance = skeleton.clone();
  instance
    .apply_labels(record.labels)
    .map_err(|source| Error::InvalidVertex { site: Site::Record(record.record), source })?;
  Ok(instance)
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
  if !visible {
    return ProgressBar::hidden();
  }
  let pb = ProgressBar::new(len as u64);
  let style = ProgressStyle::with_template("[count] [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len}")
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ");
  pb.set_style(style);
  pb
}

/// =============== Fold raw counts into isomorphism classes ===============
pub fn aggregate(skeletons: &Skeletons, counts: &RawCounts, options: &CountOptions) -> Result<CountOutcome> {
  let mut outcome = CountOutcome::default();
  let pb = progress_bar(counts.len(), options.show_progress);

  for record in counts.records() {
    pb.inc(1);
    match labeled_instance(skeletons, &record) {
      Ok(instance) => {
        if let Err(source) = outcome.index.add_occurrence(record.node_id, instance, record.count) {
          pb.abandon();
          return Err(Error::CountOverflow { site: Site::Record(record.record), source });
        }
      }
      Err(e) if e.is_record_drop() => {
        if options.drop_policy == DropPolicy::Abort {
          pb.abandon();
          return Err(e);
        }
        warn!(record = record.record, node_id = record.node_id, count = record.count, "dropped: {}", e);
        outcome.dropped.push(e);
      }
      Err(e) => {
        pb.abandon();
        return Err(e);
      }
    }
  }
  pb.finish_with_message("✔ Counting complete");

  info!(
    records = counts.len(),
    classes = outcome.index.len(),
    dropped = outcome.dropped.len(),
    "merged isomorphic labeled queries"
  );
  Ok(outcome)
}
