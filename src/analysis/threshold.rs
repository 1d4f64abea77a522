//! Target-BER crossing search on a swept BER curve.
//!
//! The curve is interpolated linearly in `log10(BER)` against SNR (dB),
//! which is how BER waterfalls are read off a semilog plot.

use serde::Serialize;

use crate::data::filter::valid_pairs;

/// BER values are clamped to this floor before `log10`, so zero-error
/// samples stay on the curve.
pub const BER_FLOOR: f64 = 1e-15;

/// BER values are clamped to this ceiling before `log10`.
pub const BER_CEILING: f64 = 1.0;

/// Outcome of a crossing search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Crossing {
    /// The curve meets the target at this SNR (dB).
    At { snr_db: f64 },
    /// The target is never met inside the swept range.
    NoCrossing,
}

impl Crossing {
    pub fn snr_db(&self) -> Option<f64> {
        match *self {
            Crossing::At { snr_db } => Some(snr_db),
            Crossing::NoCrossing => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Crossing::At { .. })
    }
}

/// Find the SNR at which a BER curve first crosses `target_ber`.
///
/// `snr_db` and `ber` are parallel columns in any order and may contain
/// `NaN` (missing). Pairs with a missing side are dropped, the rest sorted
/// by SNR. Scanning upward, the first pair of consecutive samples whose
/// log-BER values bracket `log10(target_ber)` (endpoints inclusive) is
/// interpolated; later crossings of a non-monotonic curve are ignored.
/// A flat bracket reports its lower-SNR sample.
///
/// The target must be positive; a non-positive or `NaN` target never
/// crosses.
pub fn locate_crossing(snr_db: &[f64], ber: &[f64], target_ber: f64) -> Crossing {
    let samples: Vec<(f64, f64)> = valid_pairs(snr_db, ber)
        .into_iter()
        .map(|(snr, b)| (snr, b.clamp(BER_FLOOR, BER_CEILING).log10()))
        .collect();
    locate_in_log_domain(&samples, target_ber.log10())
}

/// Crossing search on already cleaned, SNR-sorted `(snr_db, log10(ber))`
/// samples.
pub fn locate_in_log_domain(samples: &[(f64, f64)], log_target: f64) -> Crossing {
    for pair in samples.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let brackets = (y0 >= log_target && y1 <= log_target)
            || (y0 <= log_target && y1 >= log_target);
        if !brackets {
            continue;
        }
        let t = if y1 != y0 {
            (log_target - y0) / (y1 - y0)
        } else {
            0.0
        };
        return Crossing::At {
            snr_db: x0 + t * (x1 - x0),
        };
    }
    Crossing::NoCrossing
}
