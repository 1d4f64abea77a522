use std::path::Path;

use crate::error::{AnalysisError, Result};

use super::columns::normalize_column_name;
use super::metadata::LinkMetadata;
use super::model::{MeasurementTable, Measurements};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a sweep file. Invalid UTF-8 sequences are replaced rather than
/// rejected.
pub fn load_file(path: &Path, comment_marker: char) -> Result<Measurements> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    parse_measurements(&text, comment_marker)
}

/// Parse sweep text into metadata and a [`MeasurementTable`].
///
/// Layout:
/// * optional first line starting with `comment_marker`, carrying
///   link-budget constants (see [`LinkMetadata`]);
/// * any further comment lines, ignored;
/// * a header row and data rows, comma- or semicolon-separated.
///
/// Comma separation is tried first; if it does not give a rectangular
/// table with at least two columns, semicolon separation is tried.
pub fn parse_measurements(text: &str, comment_marker: char) -> Result<Measurements> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let metadata = text
        .lines()
        .next()
        .map(|first| LinkMetadata::from_comment_line(first, comment_marker))
        .unwrap_or_default();

    let data: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with(comment_marker))
        .flat_map(|line| [line, "\n"])
        .collect();

    let raw = match tokenize(&data, b',') {
        Ok(raw) => raw,
        Err(comma) => {
            log::debug!("comma-separated parse rejected ({comma}); retrying with ';'");
            tokenize(&data, b';').map_err(|semicolon| {
                AnalysisError::invalid_table(format!(
                    "no usable delimiter: ',' gave {comma}; ';' gave {semicolon}"
                ))
            })?
        }
    };

    let table = raw.into_table()?;
    Ok(Measurements { metadata, table })
}

/// Coerce one cell to a number. Decimal commas are accepted; blank or
/// unparseable cells give `None`.
pub fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.replace(',', ".").parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Header and string cells, before numeric coercion.
struct RawTable {
    delimiter: u8,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

fn tokenize(data: &str, delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.len() < 2 {
        return Err(AnalysisError::invalid_table(format!(
            "header has {} column(s) with delimiter '{}'",
            headers.len(),
            delimiter as char
        )));
    }

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(RawTable {
        delimiter,
        headers,
        rows,
    })
}

impl RawTable {
    fn into_table(self) -> Result<MeasurementTable> {
        if self.rows.is_empty() {
            return Err(AnalysisError::invalid_table("no data rows"));
        }
        log::debug!(
            "parsed {} rows x {} columns with delimiter '{}'",
            self.rows.len(),
            self.headers.len(),
            self.delimiter as char
        );

        let names: Vec<String> = self
            .headers
            .iter()
            .map(|h| normalize_column_name(h))
            .collect();

        let mut columns = vec![Vec::with_capacity(self.rows.len()); names.len()];
        let mut failed = 0usize;
        for record in &self.rows {
            for (col, cell) in columns.iter_mut().zip(record.iter()) {
                let value = parse_cell(cell);
                if value.is_none() && !cell.trim().is_empty() {
                    failed += 1;
                }
                col.push(value.unwrap_or(f64::NAN));
            }
        }
        if failed > 0 {
            log::warn!("{failed} cell(s) could not be read as numbers and were treated as missing");
        }

        MeasurementTable::from_columns(names, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMULATOR_FILE: &str = "\
# nbBitsParEssai=200, N0=-80.0 dBm/Hz, Attenuation(dB)=40.0, bits_info_par_jour=1000000, batterie(J)=3.0, codage=OFF, R=1.0
SNRdB,E,RZ,NRZ,NRZT,Eb_tx (J/bit),Energie consommée (par jour),Duree batterie (jour)
0.000000,0.000000,2.000000e-01,1.000000e-01,1.500000e-01,1.000000e-07,1.000000e-01,3.000000e+01
1.000000,1.000000,1.000000e-01,5.000000e-02,8.000000e-02,1.258925e-07,1.258925e-01,2.382985e+01
";

    #[test]
    fn parses_simulator_output() {
        let m = parse_measurements(SIMULATOR_FILE, '#').unwrap();
        assert_eq!(m.metadata.noise_density_dbm_hz, Some(-80.0));
        assert_eq!(m.metadata.attenuation_db, Some(40.0));
        assert_eq!(m.table.len(), 2);
        assert_eq!(m.table.width(), 8);
        assert_eq!(
            m.table.column_names,
            vec![
                "snrdb",
                "e",
                "rz",
                "nrz",
                "nrzt",
                "eb_tx j_bit",
                "energie consommee par jour",
                "duree batterie jour"
            ]
        );
        assert_eq!(m.table.column_by_name("nrz"), Some(&[0.1, 0.05][..]));
    }

    #[test]
    fn falls_back_to_semicolons_with_decimal_commas() {
        let text = "SNRdB;RZ;NRZ\n0,5;1,23;2e-1\n1,5;0,5;0,1\n";
        let m = parse_measurements(text, '#').unwrap();
        assert_eq!(m.table.column_by_name("snrdb"), Some(&[0.5, 1.5][..]));
        assert_eq!(m.table.column_by_name("rz"), Some(&[1.23, 0.5][..]));
        assert_eq!(m.table.column_by_name("nrz"), Some(&[0.2, 0.1][..]));
    }

    #[test]
    fn semicolon_file_without_decimal_commas() {
        let text = "snr;rz\n0;0.1\n1;0.01\n";
        let m = parse_measurements(text, '#').unwrap();
        assert_eq!(m.table.column_names, vec!["snr", "rz"]);
    }

    #[test]
    fn quoted_decimal_comma_in_comma_file() {
        let m = parse_measurements("snr,rz\n0,\"1,23\"\n", '#').unwrap();
        assert_eq!(m.table.column_by_name("rz"), Some(&[1.23][..]));
    }

    #[test]
    fn bad_cells_become_missing() {
        let m = parse_measurements("snr,rz\n0,abc\n1,\n2,0.5\n", '#').unwrap();
        let rz = m.table.column_by_name("rz").unwrap();
        assert!(rz[0].is_nan());
        assert!(rz[1].is_nan());
        assert_eq!(rz[2], 0.5);
    }

    #[test]
    fn comment_lines_anywhere_are_skipped() {
        let text = "snr,rz\n# mid-table note\n0,0.1\n  # indented\n1,0.01\n";
        let m = parse_measurements(text, '#').unwrap();
        assert_eq!(m.table.len(), 2);
        assert_eq!(m.metadata, LinkMetadata::default());
    }

    #[test]
    fn ragged_table_is_rejected() {
        let err = parse_measurements("a;b\n1;2;3\n", '#').unwrap_err();
        match err {
            AnalysisError::InvalidTable { message } => {
                assert!(message.contains("',' gave Invalid table: header has 1 column"), "{message}");
                assert!(message.contains("';' gave CSV error"), "{message}");
            }
            other => panic!("expected InvalidTable, got {other:?}"),
        }
    }

    #[test]
    fn single_column_or_empty_table_is_rejected() {
        assert!(matches!(
            parse_measurements("snr\n1\n", '#').unwrap_err(),
            AnalysisError::InvalidTable { .. }
        ));
        assert!(matches!(
            parse_measurements("# N0=-80\nsnr,rz\n", '#').unwrap_err(),
            AnalysisError::InvalidTable { .. }
        ));
    }

    #[test]
    fn parse_cell_handles_decimal_comma() {
        assert_eq!(parse_cell("1,23"), Some(1.23));
        assert_eq!(parse_cell(" 4.5e-3 "), Some(4.5e-3));
        assert_eq!(parse_cell(""), None);
        assert_eq!(parse_cell("n/a"), None);
    }
}
