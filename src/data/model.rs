use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

use super::metadata::LinkMetadata;

// ---------------------------------------------------------------------------
// Waveform – the line codes under comparison
// ---------------------------------------------------------------------------

/// Line-coding scheme whose BER curve is measured in the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Waveform {
    /// Non-return-to-zero.
    Nrz,
    /// Return-to-zero.
    Rz,
    /// Non-return-to-zero with trapezoidal transitions.
    Nrzt,
}

impl Waveform {
    /// All waveforms, in reporting order.
    pub const ALL: [Waveform; 3] = [Waveform::Nrz, Waveform::Rz, Waveform::Nrzt];

    /// Column resolution order: a waveform whose name contains another's
    /// goes first so the shorter fragment cannot steal its column.
    pub const RESOLUTION_ORDER: [Waveform; 3] = [Waveform::Nrzt, Waveform::Nrz, Waveform::Rz];

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Nrz => "NRZ",
            Waveform::Rz => "RZ",
            Waveform::Nrzt => "NRZT",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// MeasurementTable – named numeric columns, one row per SNR sample
// ---------------------------------------------------------------------------

/// The parsed sweep table. Missing or unparseable cells are `NaN`.
#[derive(Debug, Clone)]
pub struct MeasurementTable {
    /// Normalized column names, in file order.
    pub column_names: Vec<String>,
    columns: Vec<Vec<f64>>,
    rows: usize,
}

impl MeasurementTable {
    /// Build a table from parallel name/column vectors. All columns must
    /// have the same length.
    pub fn from_columns(column_names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if column_names.len() != columns.len() {
            return Err(AnalysisError::invalid_table(format!(
                "{} column names for {} columns",
                column_names.len(),
                columns.len()
            )));
        }
        let rows = columns.first().map_or(0, Vec::len);
        if let Some((name, col)) = column_names
            .iter()
            .zip(&columns)
            .find(|(_, col)| col.len() != rows)
        {
            return Err(AnalysisError::invalid_table(format!(
                "column '{name}' has {} values, expected {rows}",
                col.len()
            )));
        }
        Ok(MeasurementTable {
            column_names,
            columns,
            rows,
        })
    }

    /// Number of rows (SNR samples).
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column values by index.
    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// Column values by normalized name.
    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        self.column_names
            .iter()
            .position(|c| c == name)
            .map(|i| self.columns[i].as_slice())
    }
}

// ---------------------------------------------------------------------------
// WaveformSeries – read-only view of one waveform's BER column
// ---------------------------------------------------------------------------

/// A waveform bound to its BER column inside a [`MeasurementTable`].
#[derive(Debug, Clone, Copy)]
pub struct WaveformSeries<'a> {
    pub waveform: Waveform,
    /// Normalized name of the column the waveform resolved to.
    pub column_name: &'a str,
    pub ber: &'a [f64],
}

// ---------------------------------------------------------------------------
// Measurements – everything read from one sweep file
// ---------------------------------------------------------------------------

/// A parsed sweep file: link-budget metadata plus the measurement table.
#[derive(Debug, Clone)]
pub struct Measurements {
    pub metadata: LinkMetadata,
    pub table: MeasurementTable,
}
