use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use labeled_query_count::{
  CountOptions, DropPolicy, DuplicateRecords, JsonSink, Plan, RawCounts, Result, TextSink, count_labeled_queries,
  write_report,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
  Text,
  Json,
}

/// Merge raw labeled query counts by isomorphism class.
#[derive(Debug, Parser)]
#[command(name = "labeled-query-count", version, about)]
struct Cli {
  /// Decomposition plan file.
  plan: PathBuf,

  /// Raw count file: `node_id label... count` records.
  counts: PathBuf,

  #[arg(long, value_enum, default_value_t = Format::Text)]
  format: Format,

  /// Write the report here instead of stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Only report classes of plan nodes flagged as queries.
  #[arg(long)]
  queries_only: bool,

  /// Fail on the first record that cannot be resolved instead of skipping it.
  #[arg(long)]
  strict: bool,

  /// Keep only the last of several records with the same node and labels
  /// instead of summing them.
  #[arg(long)]
  overwrite_duplicates: bool,

  /// Show a progress bar while counting.
  #[arg(long)]
  progress: bool,
}

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .with_target(false)
    .init();
}

fn run(cli: &Cli) -> Result<()> {
  let plan = Plan::from_path(&cli.plan)?;
  info!(
    nodes = plan.nodes().len(),
    edges = plan.edges().len(),
    root = plan.root_node_id(),
    "loaded plan from {}",
    cli.plan.display()
  );

  let duplicates = if cli.overwrite_duplicates {
    DuplicateRecords::Overwrite
  } else {
    DuplicateRecords::Sum
  };
  let counts = RawCounts::from_path(&cli.counts, &plan.vertex_counts(), duplicates)?;
  info!(read = counts.records_read(), distinct = counts.len(), "loaded raw counts");

  let options = CountOptions {
    drop_policy: if cli.strict { DropPolicy::Abort } else { DropPolicy::Skip },
    show_progress: cli.progress,
  };
  let outcome = count_labeled_queries(&plan, &counts, &options)?;
  if !outcome.dropped.is_empty() {
    warn!(dropped = outcome.dropped.len(), "some count records were not counted");
  }

  let out: Box<dyn Write> = match &cli.output {
    Some(path) => Box::new(BufWriter::new(File::create(path)?)),
    None => Box::new(BufWriter::new(io::stdout().lock())),
  };
  let written = match cli.format {
    Format::Text => write_report(&plan, &outcome.index, &mut TextSink::new(out), cli.queries_only)?,
    Format::Json => write_report(&plan, &outcome.index, &mut JsonSink::new(out), cli.queries_only)?,
  };
  info!(classes = written, "report written");
  Ok(())
}

fn main() -> ExitCode {
  init_tracing();
  let cli = Cli::parse();
  match run(&cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("{}", e);
      ExitCode::FAILURE
    }
  }
}
