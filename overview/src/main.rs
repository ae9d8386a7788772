use anyhow::Context;
use candcore::candidate::read_candidates;
use candcore::Candidate;
use clap::Parser;
use generator::profile::build_candidates;
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use gui_bridge::model::OverviewModel;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::{ConfigOverrides, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Classifies single-pulse candidates and builds per-beam DM histograms")]
struct Args {
    /// Candidate file (10- or 14-column plain text)
    #[arg(long, default_value = "all_candidates.dat")]
    cands_file: PathBuf,
    /// Load thresholds from YAML; flags below override it
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long)]
    nbeams: Option<u32>,
    #[arg(long)]
    snr_cut: Option<f32>,
    /// Enabled-beam bitmask, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_mask)]
    beam_mask: Option<u64>,
    #[arg(long)]
    nbeams_cut: Option<u32>,
    #[arg(long)]
    members_cut: Option<u32>,
    #[arg(long)]
    dm_cut: Option<f32>,
    #[arg(long)]
    filter_cut: Option<u32>,
    #[arg(long)]
    filter_max: Option<u32>,
    #[arg(long)]
    min_bins: Option<usize>,
    /// Classify a seeded synthetic batch of this size instead of reading a file
    #[arg(long)]
    synthetic: Option<usize>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Write the overview (partition, counts, histograms) as JSON
    #[arg(long)]
    report: Option<PathBuf>,
    /// Keep the renderer bridge alive for incoming batches
    #[arg(long, default_value_t = false)]
    serve: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            nbeams: self.nbeams,
            snr_cut: self.snr_cut,
            beam_mask: self.beam_mask,
            nbeams_cut: self.nbeams_cut,
            members_cut: self.members_cut,
            dm_cut: self.dm_cut,
            filter_cut: self.filter_cut,
            filter_max: self.filter_max,
            min_bins: self.min_bins,
        }
    }
}

fn parse_mask(raw: &str) -> Result<u64, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse::<u64>(),
    };
    parsed.map_err(|err| format!("invalid beam mask '{}': {}", raw, err))
}

fn load_candidates(path: &Path) -> anyhow::Result<Vec<Candidate>> {
    let file =
        File::open(path).with_context(|| format!("opening candidate file {}", path.display()))?;
    let candidates = read_candidates(BufReader::new(file))
        .with_context(|| format!("reading candidate file {}", path.display()))?;
    Ok(candidates)
}

fn write_report(path: &Path, model: &OverviewModel) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("creating report {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), model)
        .with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?.with_overrides(&args.overrides()),
        None => WorkflowConfig::from_args(&args.overrides()),
    };
    let nbeams = workflow_config.classifier.nbeams;

    let candidates = match args.synthetic {
        Some(count) => build_candidates(count, nbeams, args.seed)?,
        None => load_candidates(&args.cands_file)?,
    };
    if candidates.is_empty() {
        println!("Found no candidates");
    } else {
        println!("Loaded {} candidates", candidates.len());
    }

    let runner = Runner::new(workflow_config);
    let gui_bridge = GuiBridge::new(Arc::new(runner.clone()));

    println!("Classifying candidates...");
    let result = runner.execute(&candidates)?;
    print!("{}", result.counts);

    println!("Building histograms...");
    for hist in result.histograms.iter().filter(|h| h.candidates > 0) {
        match hist.peak() {
            Some(peak) => println!(
                "  beam {:2}: {:6} candidates, {} bins, peak DM {:.1} ({})",
                hist.beam,
                hist.candidates,
                hist.bins.len(),
                peak.center,
                peak.count
            ),
            None => println!("  beam {:2}: empty", hist.beam),
        }
    }

    gui_bridge.publish(&OverviewModel::from_result(&result))?;
    gui_bridge.publish_status("Overview ready for rendering.");

    if let Some(path) = &args.report {
        write_report(path, &gui_bridge.snapshot()?)?;
        println!("Wrote overview to {}", path.display());
    }

    if args.serve {
        let bound = gui_bridge.spawn(gui_bind_address())?;
        gui_bridge.publish_status(&format!(
            "HTTP bridge running on {} (Ctrl+C to stop)...",
            bound
        ));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
        let metrics = runner.metrics();
        log::info!(
            "bridge stopped after {} batches ({} candidates, {} rejected)",
            metrics.batches,
            metrics.candidates,
            metrics.rejected
        );
    }

    Ok(())
}
