//! Analysis configuration loading and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::columns::ColumnAliases;
use crate::data::model::Waveform;
use crate::error::{AnalysisError, Result};

/// What to compute for each sweep file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Target error rates to locate on every waveform's curve.
    pub target_bers: Vec<f64>,

    /// Channel code rate. Overrides the file's `R=` value when set.
    pub code_rate: Option<f64>,

    /// Waveforms whose BER columns must be present.
    pub waveforms: Vec<Waveform>,

    /// Marker that starts metadata and comment lines.
    pub comment_marker: char,

    /// Accepted raw names per logical column.
    pub columns: ColumnAliases,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_bers: vec![1e-3],
            code_rate: None,
            waveforms: Waveform::ALL.to_vec(),
            comment_marker: '#',
            columns: ColumnAliases::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON configuration file. Absent fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AnalysisConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the analysis cannot use.
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self
            .target_bers
            .iter()
            .find(|t| !(t.is_finite() && **t > 0.0))
        {
            return Err(AnalysisError::invalid_parameter(
                "target_bers",
                format!("{bad} is not a positive error rate"),
            ));
        }
        if let Some(r) = self.code_rate {
            if !(r > 0.0 && r <= 1.0) {
                return Err(AnalysisError::invalid_parameter(
                    "code_rate",
                    format!("{r} is not in (0, 1]"),
                ));
            }
        }
        if self.waveforms.is_empty() {
            return Err(AnalysisError::invalid_parameter(
                "waveforms",
                "at least one waveform is required",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_study() {
        let config = AnalysisConfig::default();
        assert_eq!(config.target_bers, vec![1e-3]);
        assert_eq!(config.waveforms, Waveform::ALL.to_vec());
        assert_eq!(config.comment_marker, '#');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "code_rate": 0.5, "waveforms": ["NRZ"], "columns": { "snr": ["ebn0_db"] } }"#)
                .unwrap();
        assert_eq!(config.code_rate, Some(0.5));
        assert_eq!(config.waveforms, vec![Waveform::Nrz]);
        assert_eq!(config.target_bers, vec![1e-3]);
        assert_eq!(config.columns.snr, vec!["ebn0_db".to_string()]);
        assert_eq!(config.columns.rz, ColumnAliases::default().rz);
    }

    #[test]
    fn rejects_out_of_domain_values() {
        let mut config = AnalysisConfig {
            target_bers: vec![1e-3, 0.0],
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
        config.target_bers = vec![1e-2];
        config.code_rate = Some(3.0);
        assert!(config.validate().is_err());
        config.code_rate = None;
        config.waveforms.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "target_bers": [1e-2, 1e-4] }}"#).unwrap();
        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.target_bers, vec![1e-2, 1e-4]);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, r#"{{ "target_bers": [-1] }}"#).unwrap();
        assert!(AnalysisConfig::load(bad.path()).is_err());
    }
}
