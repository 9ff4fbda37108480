//! `histbook keys` / `histbook run` orchestration.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use hb_core::ContainerKind;
use hb_hist::OutputFile;
use hb_registry::{BookingConfig, Registry, WriteFilter};
use serde::Serialize;

use crate::events::read_instructions;

/// Write-stage options for `histbook run`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub filter: String,
    pub include: String,
    pub exclude: String,
    pub dir: String,
    pub zero_negative: bool,
}

#[derive(Debug, Serialize)]
struct RunReport {
    booked: usize,
    instructions: usize,
    rejected: usize,
    fills: u64,
    misses: u64,
    replaced: u64,
    clamped_bins: usize,
    written: BTreeMap<&'static str, usize>,
    output: String,
}

fn book(path: &Path) -> Result<Registry> {
    let cfg = BookingConfig::from_path(path)
        .with_context(|| format!("failed to load booking file {}", path.display()))?;
    Registry::from_booking(&cfg).with_context(|| format!("invalid booking in {}", path.display()))
}

fn kind_label(kind: ContainerKind) -> &'static str {
    match kind {
        ContainerKind::Histogram1D => "hist1d",
        ContainerKind::Histogram2D => "hist2d",
        ContainerKind::SparseND => "sparse",
        ContainerKind::TupleRecord => "tuple",
        ContainerKind::TreeRecord => "tree",
        ContainerKind::Efficiency => "efficiency",
    }
}

pub fn cmd_keys(booking: &Path) -> Result<()> {
    let reg = book(booking)?;
    let keys: BTreeMap<&'static str, Vec<&str>> =
        ContainerKind::ALL.iter().map(|&k| (kind_label(k), reg.keys(k))).collect();
    println!("{}", serde_json::to_string_pretty(&keys)?);
    Ok(())
}

pub fn cmd_run(booking: &Path, events: &Path, output: &Path, opts: &RunOptions) -> Result<()> {
    let mut reg = book(booking)?;
    let booked = reg.len();

    let instructions = read_instructions(events)?;
    let mut rejected = 0;
    for (i, ins) in instructions.iter().enumerate() {
        // Rejected instructions are skipped; the replay goes on.
        if let Err(e) = ins.apply(&mut reg) {
            tracing::warn!("fill instruction {i} rejected: {e}");
            rejected += 1;
        }
    }
    tracing::info!(instructions = instructions.len(), rejected, "event replay finished");

    let clamped_bins = if opts.zero_negative { reg.zero_negative_bins_all() } else { 0 };

    let mut out = OutputFile::create(output);
    out.cd(&opts.dir);
    let filter =
        WriteFilter::substring(opts.filter.as_str()).include(&opts.include).exclude(&opts.exclude);
    let summary = reg.write_everything(&mut out, &filter)?;
    let path = out.finish().with_context(|| format!("failed to write {}", output.display()))?;

    let stats = reg.stats();
    let written = BTreeMap::from([
        ("hist1d", summary.hist1d),
        ("hist2d", summary.hist2d),
        ("sparse", summary.sparse),
        ("records", summary.records),
        ("efficiency", summary.efficiency),
    ]);
    let report = RunReport {
        booked,
        instructions: instructions.len(),
        rejected,
        fills: stats.fills,
        misses: stats.misses,
        replaced: stats.replaced,
        clamped_bins,
        written,
        output: path.display().to_string(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
