use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::data::filter::mask_non_compliant;
use crate::data::metadata::LinkMetadata;
use crate::data::model::{Measurements, Waveform};
use crate::error::Result;

use super::energy::{DerivedCurve, LinkBudget, OperatingPoint};
use super::threshold::{locate_crossing, Crossing};

// ---------------------------------------------------------------------------
// Threshold – one (waveform, target BER) result
// ---------------------------------------------------------------------------

/// Where a waveform first meets a target BER, and what it costs there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    pub waveform: Waveform,
    pub target_ber: f64,
    pub crossing: Crossing,
    /// Derived metrics at the crossing SNR; `None` without a crossing.
    pub operating_point: Option<OperatingPoint>,
}

impl Threshold {
    /// Locate `target_ber` on `ber` and evaluate `curve` at the crossing.
    pub fn evaluate(waveform: Waveform, ber: &[f64], target_ber: f64, curve: &DerivedCurve) -> Self {
        let crossing = locate_crossing(&curve.snr_db, ber, target_ber);
        Threshold {
            waveform,
            target_ber,
            crossing,
            operating_point: crossing.snr_db().map(|snr| curve.at(snr)),
        }
    }
}

/// Battery days at the samples where `ber` meets `target_ber`, `None`
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompliantZone {
    pub waveform: Waveform,
    pub target_ber: f64,
    pub battery_days: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// SweepAnalysis – everything handed to the reporting layer
// ---------------------------------------------------------------------------

/// Results for one sweep file.
#[derive(Debug, Clone, Serialize)]
pub struct SweepAnalysis {
    pub metadata: LinkMetadata,
    pub budget: LinkBudget,
    /// Normalized names of the columns each waveform was read from.
    pub columns: BTreeMap<Waveform, String>,
    pub ber: BTreeMap<Waveform, Vec<f64>>,
    pub curve: DerivedCurve,
    /// One entry per (waveform, target), waveforms in configured order
    /// within each target.
    pub thresholds: Vec<Threshold>,
    pub compliant: Vec<CompliantZone>,
}

impl SweepAnalysis {
    /// Run the full analysis on a parsed sweep.
    pub fn run(measurements: &Measurements, config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let table = &measurements.table;
        let resolved = config.columns.resolve(table, &config.waveforms)?;

        let budget =
            LinkBudget::from_metadata(&measurements.metadata).with_code_rate(config.code_rate)?;
        let eb_tx = resolved.eb_tx(table);
        if eb_tx.is_some() {
            log::debug!("using measured transmit energy column");
        }
        let curve = DerivedCurve::compute(resolved.snr(table), eb_tx, &budget)?
            .with_reported(resolved.energy_per_day(table), resolved.battery_days(table))?;

        let series = resolved.series(table);
        let mut thresholds = Vec::new();
        let mut compliant = Vec::new();
        for &target in &config.target_bers {
            for s in &series {
                thresholds.push(Threshold::evaluate(s.waveform, s.ber, target, &curve));
                compliant.push(CompliantZone {
                    waveform: s.waveform,
                    target_ber: target,
                    battery_days: mask_non_compliant(&curve.battery_days, s.ber, target),
                });
            }
        }

        Ok(SweepAnalysis {
            metadata: measurements.metadata,
            budget,
            columns: series
                .iter()
                .map(|s| (s.waveform, s.column_name.to_string()))
                .collect(),
            ber: series.iter().map(|s| (s.waveform, s.ber.to_vec())).collect(),
            curve,
            thresholds,
            compliant,
        })
    }

    /// The result for one waveform and target, if it was requested.
    pub fn threshold(&self, waveform: Waveform, target_ber: f64) -> Option<&Threshold> {
        self.thresholds
            .iter()
            .find(|t| t.waveform == waveform && t.target_ber == target_ber)
    }

    /// The waveform reaching `target_ber` at the lowest SNR, i.e. with the
    /// least transmit energy. Ties keep the earlier waveform. `None` when no
    /// waveform reaches the target inside the sweep.
    pub fn best_waveform(&self, target_ber: f64) -> Option<&Threshold> {
        let mut best: Option<(&Threshold, f64)> = None;
        for t in self.thresholds.iter().filter(|t| t.target_ber == target_ber) {
            let Some(snr) = t.crossing.snr_db() else {
                continue;
            };
            if best.map_or(true, |(_, best_snr)| snr < best_snr) {
                best = Some((t, snr));
            }
        }
        best.map(|(t, _)| t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_measurements;
    use crate::error::AnalysisError;
    use approx::assert_relative_eq;

    const SWEEP: &str = "\
# N0=-80.0 dBm/Hz, Attenuation(dB)=40.0, bits_info_par_jour=1000000, batterie(J)=3.0
SNRdB,RZ,NRZ,NRZT
0,0.2,0.08,0.1
1,0.1,0.05,0.07
2,0.05,0.02,0.04
3,0.01,0.005,0.02
4,0.005,0.0008,0.01
5,0.0009,0.0001,0.005
";

    fn analyse(text: &str, config: &AnalysisConfig) -> Result<SweepAnalysis> {
        SweepAnalysis::run(&parse_measurements(text, '#')?, config)
    }

    #[test]
    fn thresholds_carry_operating_points() {
        let a = analyse(SWEEP, &AnalysisConfig::default()).unwrap();
        assert_eq!(a.thresholds.len(), 3);

        let rz = a.threshold(Waveform::Rz, 1e-3).unwrap();
        let snr = rz.crossing.snr_db().unwrap();
        assert!(snr > 4.9 && snr < 4.95, "got {snr}");

        let op = rz.operating_point.unwrap();
        assert_relative_eq!(op.snr_db, snr);
        // Eb_tx is exponential in SNR, interpolated linearly between 4 and 5 dB.
        let eb4 = 1e-7 * 10f64.powf(0.4);
        let eb5 = 1e-7 * 10f64.powf(0.5);
        assert_relative_eq!(op.eb_tx_j, eb4 + (snr - 4.0) * (eb5 - eb4), max_relative = 1e-9);
        assert!(op.battery_days > 0.0);
    }

    #[test]
    fn missing_crossing_is_reported_not_failed() {
        let a = analyse(SWEEP, &AnalysisConfig::default()).unwrap();
        let nrzt = a.threshold(Waveform::Nrzt, 1e-3).unwrap();
        assert_eq!(nrzt.crossing, Crossing::NoCrossing);
        assert!(nrzt.operating_point.is_none());
    }

    #[test]
    fn best_waveform_has_lowest_threshold() {
        let a = analyse(SWEEP, &AnalysisConfig::default()).unwrap();
        assert_eq!(a.best_waveform(1e-3).unwrap().waveform, Waveform::Nrz);

        let config = AnalysisConfig {
            target_bers: vec![1e-6],
            ..AnalysisConfig::default()
        };
        let a = analyse(SWEEP, &config).unwrap();
        assert!(a.best_waveform(1e-6).is_none());
    }

    #[test]
    fn ties_keep_configured_order() {
        let text = "snr,rz,nrz\n0,0.1,0.1\n1,0.0001,0.0001\n";
        let config = AnalysisConfig {
            waveforms: vec![Waveform::Rz, Waveform::Nrz],
            ..AnalysisConfig::default()
        };
        let a = analyse(text, &config).unwrap();
        assert_eq!(a.best_waveform(1e-3).unwrap().waveform, Waveform::Rz);
    }

    #[test]
    fn compliant_zone_masks_rows_above_target() {
        let a = analyse(SWEEP, &AnalysisConfig::default()).unwrap();
        let zone = a
            .compliant
            .iter()
            .find(|z| z.waveform == Waveform::Nrz)
            .unwrap();
        assert_eq!(zone.battery_days[..4], [None, None, None, None]);
        assert_eq!(zone.battery_days[4], Some(a.curve.battery_days[4]));
        assert_eq!(zone.battery_days[5], Some(a.curve.battery_days[5]));
    }

    #[test]
    fn code_rate_from_config_overrides_file() {
        let coded = SWEEP.replacen("batterie(J)=3.0", "batterie(J)=3.0, R=1.0", 1);
        let uncoded = analyse(&coded, &AnalysisConfig::default()).unwrap();
        let config = AnalysisConfig {
            code_rate: Some(1.0 / 3.0),
            ..AnalysisConfig::default()
        };
        let with_fec = analyse(&coded, &config).unwrap();
        assert_relative_eq!(
            with_fec.curve.energy_per_day_j[0],
            3.0 * uncoded.curve.energy_per_day_j[0],
            max_relative = 1e-12
        );
    }

    #[test]
    fn file_battery_column_is_reported_at_threshold() {
        let text = "\
snr,rz,Duree batterie (jour),Energie consommee (par jour)
0,0.01,99,0.5
2,0.0001,97,0.7
";
        let config = AnalysisConfig {
            waveforms: vec![Waveform::Rz],
            ..AnalysisConfig::default()
        };
        let a = analyse(text, &config).unwrap();
        assert_eq!(a.curve.reported_battery_days, Some(vec![99.0, 97.0]));

        let op = a.threshold(Waveform::Rz, 1e-3).unwrap().operating_point.unwrap();
        assert_relative_eq!(op.snr_db, 1.0, epsilon = 1e-12);
        assert_relative_eq!(op.reported_battery_days.unwrap(), 98.0, epsilon = 1e-12);
        assert_relative_eq!(op.reported_energy_per_day_j.unwrap(), 0.6, epsilon = 1e-12);
        // The recomputed value follows the link budget, not the file.
        assert!((op.battery_days - 98.0).abs() > 1.0);

        let json = serde_json::to_value(&a).unwrap();
        let reported = json["thresholds"][0]["operating_point"]["reported_battery_days"]
            .as_f64()
            .unwrap();
        assert_relative_eq!(reported, 98.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_waveform_column_is_fatal() {
        let err = analyse("snr,rz\n0,0.1\n", &AnalysisConfig::default()).unwrap_err();
        match err {
            AnalysisError::ColumnNotFound { available, .. } => {
                assert_eq!(available, vec!["snr".to_string(), "rz".to_string()]);
            }
            other => panic!("expected ColumnNotFound, got {other:?}"),
        }
    }

    #[test]
    fn serializes_for_the_reporting_layer() {
        let a = analyse(SWEEP, &AnalysisConfig::default()).unwrap();
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["columns"]["NRZT"], "nrzt");
        assert_eq!(json["thresholds"][2]["crossing"]["kind"], "no_crossing");
        assert!(json["thresholds"][2]["operating_point"].is_null());
        assert_eq!(json["curve"]["source"], "modeled");
    }
}
