//! Writes a synthetic sweep file in the link simulator's CSV layout, for
//! trying out `ber-autonomy` without a simulation campaign.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ber_autonomy::analysis::energy::{DEFAULT_BATTERY_J, DEFAULT_BITS_PER_DAY};
use ber_autonomy::analysis::theory::nrz_ber;
use ber_autonomy::{LinkBudget, LinkMetadata, Waveform};

const N0_DBM_HZ: f64 = -80.0;
const ATTENUATION_DB: f64 = 40.0;
/// Bits per simulated point; anything rarer than one error reads as zero.
const BITS_MEASURED: f64 = 1e6;

#[derive(Parser)]
#[command(name = "generate_sample")]
#[command(about = "Write a synthetic BER sweep file")]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "teb_snr_sample.csv")]
    output: PathBuf,

    /// Simulate rate-1/3 channel coding
    #[arg(long)]
    coded: bool,

    /// First SNR (dB)
    #[arg(long, default_value = "-20", allow_hyphen_values = true)]
    from: f64,

    /// Last SNR (dB)
    #[arg(long, default_value = "20", allow_hyphen_values = true)]
    to: f64,

    /// Number of SNR points
    #[arg(short, long, default_value = "100")]
    points: usize,

    /// PRNG seed for the measurement jitter
    #[arg(long, default_value = "42")]
    seed: u64,
}

/// SNR penalty (dB) of each line code against antipodal NRZ.
fn penalty_db(waveform: Waveform) -> f64 {
    match waveform {
        Waveform::Nrz => 0.0,
        Waveform::Nrzt => 1.0,
        Waveform::Rz => 3.0,
    }
}

fn snr_range(from: f64, to: f64, points: usize) -> Vec<f64> {
    if points <= 1 {
        return vec![from];
    }
    let step = (to - from) / (points - 1) as f64;
    (0..points).map(|i| from + i as f64 * step).collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller
    fn gauss(&mut self, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// One measured BER: reference curve shifted by the waveform penalty,
/// with log-normal jitter and the simulator's zero-error floor.
fn measured_ber(snr_db: f64, waveform: Waveform, coding_gain_db: f64, rng: &mut SimpleRng) -> f64 {
    let ber = nrz_ber(snr_db - penalty_db(waveform) + coding_gain_db) * rng.gauss(0.08).exp();
    let ber = ber.min(0.5);
    if ber * BITS_MEASURED < 1.0 {
        0.0
    } else {
        ber
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let code_rate = if args.coded { 1.0 / 3.0 } else { 1.0 };
    let coding_gain_db = if args.coded { 2.0 } else { 0.0 };
    let budget = LinkBudget::from_metadata(&LinkMetadata {
        noise_density_dbm_hz: Some(N0_DBM_HZ),
        attenuation_db: Some(ATTENUATION_DB),
        bits_per_day: Some(DEFAULT_BITS_PER_DAY),
        battery_j: Some(DEFAULT_BATTERY_J),
        code_rate: Some(code_rate),
    });

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(
        out,
        "# nbBitsParEssai={BITS_MEASURED}, N0={N0_DBM_HZ:.1} dBm/Hz, Attenuation(dB)={ATTENUATION_DB:.1}, \
         bits_info_par_jour={DEFAULT_BITS_PER_DAY}, batterie(J)={DEFAULT_BATTERY_J:.1}, codage={}, R={code_rate}",
        if args.coded { "ON" } else { "OFF" },
    )?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "SNRdB",
        "E",
        "RZ",
        "NRZ",
        "NRZT",
        "Eb_tx (J/bit)",
        "Energie consommée (par jour)",
        "Duree batterie (jour)",
    ])?;

    let mut rng = SimpleRng::new(args.seed);
    let snr = snr_range(args.from, args.to, args.points);
    for &s in &snr {
        let eb_tx = budget.eb_tx(s);
        let energy_day = budget.energy_per_day(eb_tx);
        let [rz, nrz, nrzt] = [Waveform::Rz, Waveform::Nrz, Waveform::Nrzt]
            .map(|wf| measured_ber(s, wf, coding_gain_db, &mut rng));
        writer.write_record([
            format!("{s:.6}"),
            format!("{s:.6}"),
            format!("{rz:.6e}"),
            format!("{nrz:.6e}"),
            format!("{nrzt:.6e}"),
            format!("{eb_tx:.6e}"),
            format!("{energy_day:.6e}"),
            format!("{:.6e}", budget.battery_days(energy_day)),
        ])?;
    }
    writer.flush()?;

    log::info!("wrote {} SNR points to {}", snr.len(), args.output.display());
    println!("Wrote {} SNR points to {}", snr.len(), args.output.display());
    Ok(())
}
