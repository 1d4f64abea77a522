//! Transmit energy per bit, daily energy draw and battery autonomy.
//!
//! ```text
//! Eb_rx      = 10^(SNR_dB/10) * N0            N0 in W/Hz
//! Eb_tx      = Eb_rx * 10^(attenuation_dB/10)
//! EnergyDay  = Eb_tx * bits_per_day / R       R = channel code rate
//! BatteryDays = battery_J / max(EnergyDay, ENERGY_FLOOR_J)
//! ```

use serde::Serialize;

use crate::data::filter::valid_pairs;
use crate::data::metadata::LinkMetadata;
use crate::error::{AnalysisError, Result};

/// Useful bits per day when the file does not state it.
pub const DEFAULT_BITS_PER_DAY: f64 = 1e6;

/// Battery capacity (J) when the file does not state it.
pub const DEFAULT_BATTERY_J: f64 = 3.0;

/// Daily energy is floored to this before dividing the battery capacity.
pub const ENERGY_FLOOR_J: f64 = 1e-30;

#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// dBm (or dBm/Hz) to W (or W/Hz).
#[inline]
pub fn dbm_to_watts(dbm: f64) -> f64 {
    1e-3 * db_to_linear(dbm)
}

// ---------------------------------------------------------------------------
// LinkBudget – metadata with fallbacks applied
// ---------------------------------------------------------------------------

/// Link-budget constants ready for computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkBudget {
    /// Noise density (W/Hz). `1.0` when N0 is unknown, so energies are
    /// expressed relative to the noise density.
    pub noise_density_w_hz: f64,
    /// Attenuation (dB) between transmitter and receiver.
    pub attenuation_db: f64,
    /// Useful bits to deliver per day.
    pub bits_per_day: f64,
    /// Battery capacity (J).
    pub battery_j: f64,
    /// Channel code rate; `None` means uncoded.
    pub code_rate: Option<f64>,
}

impl LinkBudget {
    /// Apply fallbacks to whatever the file stated.
    ///
    /// Missing N0 and attenuation apply no correction. Missing or
    /// non-positive bits/day and battery capacity fall back to
    /// [`DEFAULT_BITS_PER_DAY`] and [`DEFAULT_BATTERY_J`]. A stated code rate
    /// outside (0, 1] is ignored.
    pub fn from_metadata(meta: &LinkMetadata) -> Self {
        let code_rate = meta.code_rate.filter(|r| {
            let valid = valid_code_rate(*r);
            if !valid {
                log::warn!("ignoring code rate R={r} from file metadata");
            }
            valid
        });
        LinkBudget {
            noise_density_w_hz: meta.noise_density_dbm_hz.map_or(1.0, dbm_to_watts),
            attenuation_db: meta.attenuation_db.unwrap_or(0.0),
            bits_per_day: positive_or(meta.bits_per_day, DEFAULT_BITS_PER_DAY),
            battery_j: positive_or(meta.battery_j, DEFAULT_BATTERY_J),
            code_rate,
        }
    }

    /// Override the code rate. `None` keeps the current one.
    pub fn with_code_rate(mut self, rate: Option<f64>) -> Result<Self> {
        if let Some(r) = rate {
            if !valid_code_rate(r) {
                return Err(AnalysisError::invalid_parameter(
                    "code_rate",
                    format!("{r} is not in (0, 1]"),
                ));
            }
            self.code_rate = Some(r);
        }
        Ok(self)
    }

    /// Bits sent over the channel per day, including coding overhead.
    pub fn transmitted_bits_per_day(&self) -> f64 {
        match self.code_rate {
            Some(r) => self.bits_per_day / r,
            None => self.bits_per_day,
        }
    }

    /// Transmit energy per bit (J) needed to reach `snr_db` at the receiver.
    pub fn eb_tx(&self, snr_db: f64) -> f64 {
        let eb_rx = db_to_linear(snr_db) * self.noise_density_w_hz;
        eb_rx * db_to_linear(self.attenuation_db)
    }

    /// Energy drawn per day (J) at a given transmit energy per bit.
    pub fn energy_per_day(&self, eb_tx: f64) -> f64 {
        eb_tx * self.transmitted_bits_per_day()
    }

    /// Days the battery lasts at a given daily draw. Finite for any
    /// non-missing draw, however small.
    pub fn battery_days(&self, energy_per_day: f64) -> f64 {
        if energy_per_day.is_nan() {
            return f64::NAN;
        }
        self.battery_j / energy_per_day.max(ENERGY_FLOOR_J)
    }
}

fn valid_code_rate(r: f64) -> bool {
    r > 0.0 && r <= 1.0
}

fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| *v > 0.0).unwrap_or(fallback)
}

// ---------------------------------------------------------------------------
// DerivedCurve – per-sample energy and autonomy
// ---------------------------------------------------------------------------

/// Where the transmit energy per bit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    /// Read verbatim from the table.
    Measured,
    /// Computed from SNR and the link budget.
    Modeled,
}

/// Derived metrics at the sweep's operating points, index-aligned with the
/// SNR column they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedCurve {
    pub snr_db: Vec<f64>,
    pub eb_tx_j: Vec<f64>,
    pub energy_per_day_j: Vec<f64>,
    pub battery_days: Vec<f64>,
    pub source: EnergySource,
    /// Energy per day as written in the file, when it has such a column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_energy_per_day_j: Option<Vec<f64>>,
    /// Battery days as written in the file, when it has such a column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_battery_days: Option<Vec<f64>>,
}

/// Metrics evaluated at one SNR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperatingPoint {
    pub snr_db: f64,
    pub eb_tx_j: f64,
    pub energy_per_day_j: f64,
    pub battery_days: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_energy_per_day_j: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_battery_days: Option<f64>,
}

impl DerivedCurve {
    /// Compute the curve. A measured transmit-energy column, when given,
    /// takes precedence over the modeled value.
    pub fn compute(
        snr_db: &[f64],
        measured_eb_tx: Option<&[f64]>,
        budget: &LinkBudget,
    ) -> Result<Self> {
        let (eb_tx_j, source) = match measured_eb_tx {
            Some(eb) if eb.len() != snr_db.len() => {
                return Err(AnalysisError::invalid_parameter(
                    "eb_tx",
                    format!("{} values for {} SNR samples", eb.len(), snr_db.len()),
                ));
            }
            Some(eb) => (eb.to_vec(), EnergySource::Measured),
            None => (
                snr_db.iter().map(|&s| budget.eb_tx(s)).collect(),
                EnergySource::Modeled,
            ),
        };

        let energy_per_day_j: Vec<f64> = eb_tx_j.iter().map(|&e| budget.energy_per_day(e)).collect();
        let battery_days = energy_per_day_j
            .iter()
            .map(|&e| budget.battery_days(e))
            .collect();

        Ok(DerivedCurve {
            snr_db: snr_db.to_vec(),
            eb_tx_j,
            energy_per_day_j,
            battery_days,
            source,
            reported_energy_per_day_j: None,
            reported_battery_days: None,
        })
    }

    /// Attach the file's own energy-per-day and battery-days columns. They
    /// are carried next to the recomputed values and never replace them.
    pub fn with_reported(
        mut self,
        energy_per_day_j: Option<&[f64]>,
        battery_days: Option<&[f64]>,
    ) -> Result<Self> {
        for (name, column) in [("energy_per_day", energy_per_day_j), ("battery_days", battery_days)] {
            if let Some(values) = column {
                if values.len() != self.len() {
                    return Err(AnalysisError::invalid_parameter(
                        name,
                        format!("{} values for {} SNR samples", values.len(), self.len()),
                    ));
                }
            }
        }
        self.reported_energy_per_day_j = energy_per_day_j.map(<[f64]>::to_vec);
        self.reported_battery_days = battery_days.map(<[f64]>::to_vec);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.snr_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snr_db.is_empty()
    }

    /// Evaluate every metric at `snr_db` by piecewise-linear interpolation
    /// over the sorted, non-missing samples; values outside the sweep clamp
    /// to the end samples.
    pub fn at(&self, snr_db: f64) -> OperatingPoint {
        OperatingPoint {
            snr_db,
            eb_tx_j: interp_clamped(&valid_pairs(&self.snr_db, &self.eb_tx_j), snr_db),
            energy_per_day_j: interp_clamped(
                &valid_pairs(&self.snr_db, &self.energy_per_day_j),
                snr_db,
            ),
            battery_days: interp_clamped(&valid_pairs(&self.snr_db, &self.battery_days), snr_db),
            reported_energy_per_day_j: self.reported_at(&self.reported_energy_per_day_j, snr_db),
            reported_battery_days: self.reported_at(&self.reported_battery_days, snr_db),
        }
    }

    /// `None` when the column is absent or has no usable sample.
    fn reported_at(&self, column: &Option<Vec<f64>>, snr_db: f64) -> Option<f64> {
        let samples = valid_pairs(&self.snr_db, column.as_deref()?);
        Some(interp_clamped(&samples, snr_db)).filter(|v| !v.is_nan())
    }
}

/// Linear interpolation over `(x, y)` samples sorted by `x`, clamped to the
/// end values. `NaN` when there are no samples.
pub fn interp_clamped(samples: &[(f64, f64)], x: f64) -> f64 {
    let (Some(&(x_first, y_first)), Some(&(x_last, y_last))) = (samples.first(), samples.last())
    else {
        return f64::NAN;
    };
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= x_first {
        return y_first;
    }
    if x >= x_last {
        return y_last;
    }

    // First sample strictly above x; x_first <= x < x_last keeps it in 1..len.
    let upper = samples.partition_point(|&(xi, _)| xi <= x);
    let (x0, y0) = samples[upper - 1];
    let (x1, y1) = samples[upper];
    if x1 == x0 {
        return y0;
    }
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}
