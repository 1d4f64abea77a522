use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

use super::model::{MeasurementTable, Waveform, WaveformSeries};

// ---------------------------------------------------------------------------
// Column-name normalization
// ---------------------------------------------------------------------------

/// Normalize a raw header so lookups survive formatting drift between
/// producers: trimmed, lower-cased, accents folded to ASCII, brackets
/// removed, `/` and `\` replaced by `_`.
///
/// `"Eb_tx (J/bit)"` becomes `"eb_tx j_bit"` and
/// `"Énergie consommée (par jour)"` becomes `"energie consommee par jour"`.
pub fn normalize_column_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().to_lowercase().chars() {
        match c {
            '(' | ')' | '[' | ']' => {}
            '/' | '\\' => out.push('_'),
            other => push_unaccented(&mut out, other),
        }
    }
    out
}

fn push_unaccented(out: &mut String, c: char) {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'œ' => return out.push_str("oe"),
        'æ' => return out.push_str("ae"),
        other => other,
    };
    out.push(folded);
}

// ---------------------------------------------------------------------------
// Logical columns and their accepted raw names
// ---------------------------------------------------------------------------

/// A column the analysis knows how to use, independent of its spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalColumn {
    Snr,
    Ber(Waveform),
    EbTx,
    EnergyPerDay,
    BatteryDays,
}

impl fmt::Display for LogicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalColumn::Snr => write!(f, "SNR"),
            LogicalColumn::Ber(wf) => write!(f, "BER {wf}"),
            LogicalColumn::EbTx => write!(f, "Eb_tx"),
            LogicalColumn::EnergyPerDay => write!(f, "energy per day"),
            LogicalColumn::BatteryDays => write!(f, "battery days"),
        }
    }
}

/// Prioritized raw-name fragments for every logical column.
///
/// Fragments are normalized with [`normalize_column_name`] before
/// matching, so they may be written in any case or with accents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub snr: Vec<String>,
    pub nrz: Vec<String>,
    pub rz: Vec<String>,
    pub nrzt: Vec<String>,
    pub eb_tx: Vec<String>,
    pub energy_per_day: Vec<String>,
    pub battery_days: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            snr: strings(&["snrdb", "snr_db", "snrpb", "snr", "ebn0", "e"]),
            nrz: strings(&["nrz"]),
            rz: strings(&["rz"]),
            nrzt: strings(&["nrzt", "nrz t", "nrz-t"]),
            eb_tx: strings(&[
                "eb_tx j_bit",
                "eb_tx j",
                "eb_tx",
                "ebtx",
                "eb_tx_j_bit",
                "eb_tx_j",
            ]),
            energy_per_day: strings(&[
                "energyday_j",
                "energie consommee par jour",
                "energie",
                "energy",
            ]),
            battery_days: strings(&[
                "batterydays",
                "duree batterie jour",
                "duree",
                "batterie",
                "days",
            ]),
        }
    }
}

impl ColumnAliases {
    /// Accepted fragments for a logical column, highest priority first.
    pub fn for_column(&self, column: LogicalColumn) -> &[String] {
        match column {
            LogicalColumn::Snr => &self.snr,
            LogicalColumn::Ber(Waveform::Nrz) => &self.nrz,
            LogicalColumn::Ber(Waveform::Rz) => &self.rz,
            LogicalColumn::Ber(Waveform::Nrzt) => &self.nrzt,
            LogicalColumn::EbTx => &self.eb_tx,
            LogicalColumn::EnergyPerDay => &self.energy_per_day,
            LogicalColumn::BatteryDays => &self.battery_days,
        }
    }

    /// Map every logical column onto the table.
    ///
    /// SNR and the BER column of each waveform in `required` are mandatory;
    /// the others resolve to `None` when absent. A column claimed by one
    /// logical column is never offered to the next.
    pub fn resolve(
        &self,
        table: &MeasurementTable,
        required: &[Waveform],
    ) -> Result<ResolvedColumns> {
        let names = &table.column_names;
        let mut claimed = Vec::new();

        let snr = self
            .claim(names, LogicalColumn::Snr, &mut claimed)
            .ok_or_else(|| AnalysisError::column_not_found(LogicalColumn::Snr.to_string(), names))?;

        let mut found = Vec::new();
        for wf in Waveform::RESOLUTION_ORDER {
            if let Some(idx) = self.claim(names, LogicalColumn::Ber(wf), &mut claimed) {
                found.push((wf, idx));
            }
        }

        let mut series = Vec::with_capacity(required.len());
        for &wf in required {
            let idx = found
                .iter()
                .find(|(w, _)| *w == wf)
                .map(|&(_, idx)| idx)
                .ok_or_else(|| {
                    AnalysisError::column_not_found(LogicalColumn::Ber(wf).to_string(), names)
                })?;
            series.push((wf, idx));
        }

        let eb_tx = self.claim(names, LogicalColumn::EbTx, &mut claimed);
        let energy_per_day = self.claim(names, LogicalColumn::EnergyPerDay, &mut claimed);
        let battery_days = self.claim(names, LogicalColumn::BatteryDays, &mut claimed);

        Ok(ResolvedColumns {
            snr,
            series,
            eb_tx,
            energy_per_day,
            battery_days,
        })
    }

    fn claim(
        &self,
        names: &[String],
        column: LogicalColumn,
        claimed: &mut Vec<usize>,
    ) -> Option<usize> {
        let idx = find_column(names, self.for_column(column), claimed)?;
        log::debug!("{column} -> '{}'", names[idx]);
        claimed.push(idx);
        Some(idx)
    }
}

/// Locate a column by prioritized fragments: the first fragment with an
/// exact match wins; failing that, the first fragment contained in some
/// column name wins. Single-character fragments only match exactly.
/// Indices in `excluded` are skipped.
pub fn find_column(names: &[String], aliases: &[String], excluded: &[usize]) -> Option<usize> {
    let aliases: Vec<String> = aliases.iter().map(|a| normalize_column_name(a)).collect();
    let candidates = || {
        names
            .iter()
            .enumerate()
            .filter(|(i, _)| !excluded.contains(i))
    };

    aliases
        .iter()
        .find_map(|alias| candidates().find(|(_, name)| *name == alias).map(|(i, _)| i))
        .or_else(|| {
            aliases.iter().filter(|a| a.chars().count() > 1).find_map(|alias| {
                candidates()
                    .find(|(_, name)| name.contains(alias.as_str()))
                    .map(|(i, _)| i)
            })
        })
}

// ---------------------------------------------------------------------------
// ResolvedColumns – logical column → table index
// ---------------------------------------------------------------------------

/// Column indices resolved against one [`MeasurementTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumns {
    pub snr: usize,
    /// Requested waveforms with their BER column, in requested order.
    pub series: Vec<(Waveform, usize)>,
    pub eb_tx: Option<usize>,
    pub energy_per_day: Option<usize>,
    pub battery_days: Option<usize>,
}

impl ResolvedColumns {
    pub fn snr<'t>(&self, table: &'t MeasurementTable) -> &'t [f64] {
        table.column(self.snr)
    }

    pub fn eb_tx<'t>(&self, table: &'t MeasurementTable) -> Option<&'t [f64]> {
        self.eb_tx.map(|i| table.column(i))
    }

    pub fn energy_per_day<'t>(&self, table: &'t MeasurementTable) -> Option<&'t [f64]> {
        self.energy_per_day.map(|i| table.column(i))
    }

    pub fn battery_days<'t>(&self, table: &'t MeasurementTable) -> Option<&'t [f64]> {
        self.battery_days.map(|i| table.column(i))
    }

    /// Read-only BER views for the requested waveforms.
    pub fn series<'t>(&self, table: &'t MeasurementTable) -> Vec<WaveformSeries<'t>> {
        self.series
            .iter()
            .map(|&(waveform, idx)| WaveformSeries {
                waveform,
                column_name: &table.column_names[idx],
                ber: table.column(idx),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| normalize_column_name(s)).collect()
    }

    fn table(raw: &[&str]) -> MeasurementTable {
        let cols = raw.iter().map(|_| vec![0.0]).collect();
        MeasurementTable::from_columns(names(raw), cols).unwrap()
    }

    #[test]
    fn normalizes_simulator_headers() {
        assert_eq!(normalize_column_name(" Eb_tx (J/bit) "), "eb_tx j_bit");
        assert_eq!(
            normalize_column_name("Energie consommée (par jour)"),
            "energie consommee par jour"
        );
        assert_eq!(normalize_column_name("Durée batterie [jour]"), "duree batterie jour");
        assert_eq!(normalize_column_name("a\\b"), "a_b");
    }

    #[test]
    fn exact_match_beats_earlier_substring() {
        let cols = names(&["SNR offset", "SNRdB"]);
        let aliases = strings(&["snrdb", "snr"]);
        assert_eq!(find_column(&cols, &aliases, &[]), Some(1));
    }

    #[test]
    fn substring_pass_follows_alias_priority() {
        let cols = names(&["mean snr", "teb"]);
        assert_eq!(find_column(&cols, &strings(&["snrdb", "snr"]), &[]), Some(0));
        assert_eq!(find_column(&cols, &strings(&["xyz"]), &[]), None);
    }

    #[test]
    fn single_letter_aliases_match_exactly() {
        let aliases = strings(&["snr", "e"]);
        assert_eq!(find_column(&names(&["freq", "rz"]), &aliases, &[]), None);
        assert_eq!(find_column(&names(&["E", "rz"]), &aliases, &[]), Some(0));
    }

    #[test]
    fn waveforms_do_not_steal_each_others_columns() {
        let t = table(&["SNRdB", "TEB NRZT", "TEB NRZ", "TEB RZ"]);
        let resolved = ColumnAliases::default()
            .resolve(&t, &Waveform::ALL)
            .unwrap();
        assert_eq!(resolved.snr, 0);
        assert_eq!(
            resolved.series,
            vec![(Waveform::Nrz, 2), (Waveform::Rz, 3), (Waveform::Nrzt, 1)]
        );
    }

    #[test]
    fn resolves_simulator_layout_with_optional_columns() {
        let t = table(&[
            "SNRdB",
            "E",
            "RZ",
            "NRZ",
            "NRZT",
            "Eb_tx (J/bit)",
            "Energie consommée (par jour)",
            "Duree batterie (jour)",
        ]);
        let resolved = ColumnAliases::default()
            .resolve(&t, &Waveform::ALL)
            .unwrap();
        assert_eq!(resolved.snr, 0);
        assert_eq!(resolved.eb_tx, Some(5));
        assert_eq!(resolved.energy_per_day, Some(6));
        assert_eq!(resolved.battery_days, Some(7));
        let series = resolved.series(&t);
        assert_eq!(series[0].column_name, "nrz");
        assert_eq!(series[1].column_name, "rz");
        assert_eq!(series[2].column_name, "nrzt");
    }

    #[test]
    fn missing_snr_reports_available_columns() {
        let t = table(&["RZ", "NRZ"]);
        match ColumnAliases::default().resolve(&t, &[Waveform::Rz]) {
            Err(AnalysisError::ColumnNotFound { column, available }) => {
                assert_eq!(column, "SNR");
                assert_eq!(available, vec!["rz".to_string(), "nrz".to_string()]);
            }
            other => panic!("expected ColumnNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_requested_waveform_is_fatal_but_unrequested_is_not() {
        let t = table(&["SNRdB", "RZ"]);
        let aliases = ColumnAliases::default();
        assert!(aliases.resolve(&t, &[Waveform::Rz]).is_ok());
        let err = aliases.resolve(&t, &[Waveform::Rz, Waveform::Nrzt]).unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnNotFound { ref column, .. } if column == "BER NRZT"));
    }
}
