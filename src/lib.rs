//! Post-processing of BER sweep files from a link simulator.
//!
//! A sweep file is loaded into a [`MeasurementTable`] together with the
//! [`LinkMetadata`] from its leading comment line. For every waveform and
//! target BER the analysis reports the SNR at which the curve first meets
//! the target, and what that operating point costs in transmit energy and
//! battery days.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;

pub use analysis::energy::{DerivedCurve, LinkBudget, OperatingPoint};
pub use analysis::summary::{SweepAnalysis, Threshold};
pub use analysis::threshold::{locate_crossing, Crossing};
pub use config::AnalysisConfig;
pub use data::loader::{load_file, parse_measurements};
pub use data::metadata::LinkMetadata;
pub use data::model::{MeasurementTable, Measurements, Waveform};
pub use error::{AnalysisError, Result};
