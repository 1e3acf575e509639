use std::io::Read;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;

use vwap::{
    BatchReport, BucketSnapshot, CollectingSink, EngineConfig, FailurePolicy, InstrumentSet,
    RawTradeRecord, Rejection, RejectionSink, TracingSink, TradeError, VwapEngine,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyCli {
    Strict,
    Lenient,
}

#[derive(Debug, Parser)]
#[clap(name = "vwap-cli", version, about = "Hourly VWAP per currency pair")]
pub struct Cli {
    /// Headerless CSV of `time,pair,price,volume` rows; stdin when omitted
    #[clap(long, short)]
    pub input: Option<std::path::PathBuf>,

    /// What to do with invalid rows (defaults to VWAP_FAILURE_POLICY, then strict)
    #[clap(long, value_enum)]
    pub policy: Option<PolicyCli>,

    /// Number of submitting threads
    #[clap(long, default_value_t = 4)]
    pub threads: usize,

    /// Accepted pairs, comma-separated (defaults to VWAP_INSTRUMENTS, then the FX majors)
    #[clap(long, value_delimiter = ',')]
    pub instruments: Option<Vec<String>>,

    /// Print a JSON document instead of one line per bucket
    #[clap(long)]
    pub json: bool,
}

/// Convert CLI policy selection → engine policy
pub(crate) fn cli_to_policy(p: PolicyCli) -> FailurePolicy {
    match p {
        PolicyCli::Strict => FailurePolicy::Strict,
        PolicyCli::Lenient => FailurePolicy::Lenient,
    }
}

/// Environment first, then explicit flags on top.
pub(crate) fn build_config_from_cli(cli: &Cli) -> Result<EngineConfig> {
    let mut cfg = EngineConfig::try_from_env().context("invalid VWAP_* environment")?;

    if let Some(p) = cli.policy {
        cfg = cfg.with_failure_policy(cli_to_policy(p));
    }
    if let Some(list) = &cli.instruments {
        let set = InstrumentSet::parse_list(&list.join(","))
            .context("--instruments must name at least one pair")?;
        cfg = cfg.with_instruments(set);
    }

    Ok(cfg)
}

/// Read every row as-is. Rows with the wrong field count are kept so the
/// engine can reject them.
pub(crate) fn read_records<R: Read>(reader: R) -> Result<Vec<RawTradeRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut out = Vec::new();
    for (line, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("reading trade row {}", line + 1))?;
        out.push(RawTradeRecord::new(row.iter().map(str::to_string).collect()));
    }
    Ok(out)
}

/// Split `records` into `threads` contiguous batches and submit them in parallel.
pub(crate) fn run_batches(
    engine: &VwapEngine,
    records: &[RawTradeRecord],
    threads: usize,
) -> Result<BatchReport> {
    if records.is_empty() {
        return Ok(BatchReport::default());
    }
    let chunk = records.len().div_ceil(threads.max(1));

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = records
            .chunks(chunk)
            .enumerate()
            .map(|(i, batch)| s.spawn(move || (i * chunk, engine.submit(batch))))
            .collect();

        handles.into_iter().map(|h| h.join()).collect()
    });

    let mut report = BatchReport::default();
    for joined in results {
        let (offset, result) = joined.map_err(|_| anyhow!("submit worker panicked"))?;
        let batch = result.map_err(|e| {
            anyhow!(
                "row {} {}: {}",
                offset + e.index + 1,
                e.record,
                e.source
            )
        })?;
        report = report.merge(batch);
    }
    Ok(report)
}

#[derive(Debug, Serialize)]
pub(crate) struct Output {
    pub report: BatchReport,
    pub buckets: Vec<BucketSnapshot>,
    pub rejected: Vec<Rejection>,
}

pub(crate) fn render_text(out: &Output) -> String {
    let mut text = String::new();
    for b in &out.buckets {
        text.push_str(&format!("{} {:.6}\n", b.display_key(), b.vwap));
    }
    text
}

/// Build the engine, feed it, and collect everything worth printing.
pub(crate) fn run(cli: &Cli, records: &[RawTradeRecord]) -> Result<Output> {
    let cfg = build_config_from_cli(cli)?;

    let collector = Arc::new(CollectingSink::new());
    let sink = {
        let collector = Arc::clone(&collector);
        move |index: usize, record: &RawTradeRecord, reason: &TradeError| {
            TracingSink.on_rejected(index, record, reason);
            collector.on_rejected(index, record, reason);
        }
    };

    info!(
        records = records.len(),
        threads = cli.threads,
        policy = %cfg.failure_policy,
        "submitting trades"
    );

    let engine = VwapEngine::with_sink(cfg, Arc::new(sink));
    let report = run_batches(&engine, records, cli.threads)?;

    info!(
        accepted = report.accepted,
        rejected = report.rejected,
        buckets = engine.bucket_count(),
        "aggregation complete"
    );

    Ok(Output {
        report,
        buckets: engine.buckets(),
        rejected: collector.take(),
    })
}
