//! `ber-autonomy`: analyse BER sweep files and report target-BER
//! thresholds with their energy and battery cost.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use ber_autonomy::{load_file, AnalysisConfig, SweepAnalysis, Waveform};

#[derive(Parser)]
#[command(name = "ber-autonomy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON analysis configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target BER (repeatable); replaces the configured targets
    #[arg(short, long = "target-ber")]
    target_ber: Vec<f64>,

    /// Channel code rate in (0, 1]; overrides the file's R= value
    #[arg(short, long)]
    rate: Option<f64>,

    /// Write a per-threshold recap CSV here
    #[arg(long)]
    recap: Option<PathBuf>,

    /// Sweep files to analyse
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

impl Cli {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };
        if !self.target_ber.is_empty() {
            config.target_bers = self.target_ber.clone();
        }
        if self.rate.is_some() {
            config.code_rate = self.rate;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Lowest-threshold waveform for one target.
#[derive(Serialize)]
struct BestWaveform {
    target_ber: f64,
    waveform: Option<Waveform>,
    snr_db: Option<f64>,
}

#[derive(Serialize)]
struct Report<'a> {
    file: &'a Path,
    #[serde(flatten)]
    analysis: &'a SweepAnalysis,
    best: Vec<BestWaveform>,
}

#[derive(Serialize)]
struct RecapRow {
    file: String,
    waveform: Waveform,
    target_ber: f64,
    snr_db: Option<f64>,
    battery_days: Option<f64>,
    reported_battery_days: Option<f64>,
}

fn analyse_file(path: &Path, config: &AnalysisConfig) -> Result<SweepAnalysis> {
    let measurements = load_file(path, config.comment_marker)
        .with_context(|| format!("loading {}", path.display()))?;
    log::info!(
        "{}: {} samples, {} columns",
        path.display(),
        measurements.table.len(),
        measurements.table.width()
    );
    SweepAnalysis::run(&measurements, config)
        .with_context(|| format!("analysing {}", path.display()))
}

fn best_per_target(analysis: &SweepAnalysis, config: &AnalysisConfig) -> Vec<BestWaveform> {
    config
        .target_bers
        .iter()
        .map(|&target_ber| {
            let best = analysis.best_waveform(target_ber);
            BestWaveform {
                target_ber,
                waveform: best.map(|t| t.waveform),
                snr_db: best.and_then(|t| t.crossing.snr_db()),
            }
        })
        .collect()
}

fn recap_rows(path: &Path, analysis: &SweepAnalysis) -> Vec<RecapRow> {
    analysis
        .thresholds
        .iter()
        .map(|t| RecapRow {
            file: path.display().to_string(),
            waveform: t.waveform,
            target_ber: t.target_ber,
            snr_db: t.crossing.snr_db(),
            battery_days: t.operating_point.map(|p| p.battery_days),
            reported_battery_days: t.operating_point.and_then(|p| p.reported_battery_days),
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.analysis_config()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut recap = Vec::new();
    let mut failed = 0usize;

    for path in &cli.inputs {
        let analysis = match analyse_file(path, &config) {
            Ok(a) => a,
            Err(e) => {
                log::error!("{e:#}");
                failed += 1;
                continue;
            }
        };

        for t in &analysis.thresholds {
            match t.crossing.snr_db() {
                Some(snr) => log::info!(
                    "{} BER {:e}: {snr:.2} dB",
                    t.waveform,
                    t.target_ber
                ),
                None => log::warn!(
                    "{} never reaches BER {:e} in {}",
                    t.waveform,
                    t.target_ber,
                    path.display()
                ),
            }
        }

        let report = Report {
            file: path,
            analysis: &analysis,
            best: best_per_target(&analysis, &config),
        };
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
        recap.extend(recap_rows(path, &analysis));
    }

    if let Some(recap_path) = &cli.recap {
        let mut writer = csv::Writer::from_path(recap_path)
            .with_context(|| format!("creating {}", recap_path.display()))?;
        for row in &recap {
            writer.serialize(row)?;
        }
        writer.flush()?;
        log::info!("wrote {} recap rows to {}", recap.len(), recap_path.display());
    }

    if failed > 0 {
        bail!("{failed} of {} input files could not be analysed", cli.inputs.len());
    }
    Ok(())
}
