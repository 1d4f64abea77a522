//! Link-budget constants carried in the sweep file's leading comment.
//!
//! The simulator writes a single line such as
//!
//! ```text
//! # nbBitsParEssai=200, nbEssais=100, N0=-80.0 dBm/Hz, Attenuation(dB)=40.0, bits_info_par_jour=1000000, batterie(J)=3.0, codage=OFF, R=1.0
//! ```
//!
//! Keys may appear in any order and in any case. Values accept a decimal
//! point or a decimal comma. Unknown keys are ignored and missing keys stay
//! unset; extraction never fails.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, space0},
    combinator::{opt, value},
    number::complete::double,
    IResult, Parser,
};
use serde::Serialize;

/// Optional constants parsed from the leading comment line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LinkMetadata {
    /// Noise spectral density N0 (dBm/Hz).
    pub noise_density_dbm_hz: Option<f64>,
    /// Channel attenuation (dB).
    pub attenuation_db: Option<f64>,
    /// Useful (information) bits to deliver per day.
    pub bits_per_day: Option<f64>,
    /// Battery energy capacity (J).
    pub battery_j: Option<f64>,
    /// Channel code rate used by the simulator (`R=`).
    pub code_rate: Option<f64>,
}

impl LinkMetadata {
    /// Parse `line` if it starts (after leading whitespace) with `marker`;
    /// any other line yields empty metadata.
    pub fn from_comment_line(line: &str, marker: char) -> Self {
        let mut meta = LinkMetadata::default();
        let Some(body) = line.trim_start().strip_prefix(marker) else {
            return meta;
        };
        let body = decimal_commas_to_points(body);

        for (pos, _) in body.char_indices() {
            if !at_word_start(&body, pos) {
                continue;
            }
            if let Ok((_, (field, v))) = assignment(&body[pos..]) {
                meta.set_first(field, v);
            }
        }

        if meta == LinkMetadata::default() {
            log::debug!("comment line carries no link-budget constants");
        }
        meta
    }

    /// Keep the first occurrence of each key.
    fn set_first(&mut self, field: Field, v: f64) {
        let slot = match field {
            Field::NoiseDensity => &mut self.noise_density_dbm_hz,
            Field::Attenuation => &mut self.attenuation_db,
            Field::BitsPerDay => &mut self.bits_per_day,
            Field::Battery => &mut self.battery_j,
            Field::CodeRate => &mut self.code_rate,
        };
        slot.get_or_insert(v);
    }
}

/// Rewrite a comma sitting between two digits as a decimal point. Other
/// commas separate key/value pairs and are kept.
fn decimal_commas_to_points(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let between_digits = i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if c == ',' && between_digits {
                '.'
            } else {
                c
            }
        })
        .collect()
}

fn at_word_start(s: &str, pos: usize) -> bool {
    s[..pos]
        .chars()
        .next_back()
        .map_or(true, |prev| !(prev.is_alphanumeric() || prev == '_'))
}

// ============================================================================
// Nom parsers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    NoiseDensity,
    Attenuation,
    BitsPerDay,
    Battery,
    CodeRate,
}

/// `<label> = <number>`
fn assignment(input: &str) -> IResult<&str, (Field, f64)> {
    let (input, field) = parse_label(input)?;
    let (input, _) = (space0, char('='), space0).parse(input)?;
    let (input, v) = double(input)?;
    Ok((input, (field, v)))
}

fn parse_label(input: &str) -> IResult<&str, Field> {
    alt((
        value(Field::Attenuation, attenuation_label),
        value(Field::BitsPerDay, bits_per_day_label),
        value(Field::Battery, battery_label),
        value(Field::NoiseDensity, tag_no_case("n0")),
        value(Field::CodeRate, alt((tag_no_case("rate"), tag_no_case("r")))),
    ))
    .parse(input)
}

/// `Atten`, `Attenuation`, optionally followed by `(dB)`.
fn attenuation_label(input: &str) -> IResult<&str, ()> {
    let (input, _) = tag_no_case("atten").parse(input)?;
    let (input, _) = opt(tag_no_case("uation")).parse(input)?;
    let (input, _) = opt(unit_suffix("db")).parse(input)?;
    Ok((input, ()))
}

/// `bits (par jour)`, `bits(per day)`, `bits_info_par_jour`, `bits_per_day`.
fn bits_per_day_label(input: &str) -> IResult<&str, ()> {
    alt((
        value((), tag_no_case("bits_info_par_jour")),
        value((), tag_no_case("bits_par_jour")),
        value((), tag_no_case("bits_per_day")),
        value(
            (),
            (
                tag_no_case("bits"),
                space0,
                char('('),
                space0,
                alt((tag_no_case("par"), tag_no_case("per"))),
                space0,
                alt((tag_no_case("jour"), tag_no_case("day"))),
                space0,
                char(')'),
            ),
        ),
    ))
    .parse(input)
}

/// `batterie` or `battery`, optionally followed by `(J)`.
fn battery_label(input: &str) -> IResult<&str, ()> {
    let (input, _) = alt((tag_no_case("batterie"), tag_no_case("battery"))).parse(input)?;
    let (input, _) = opt(unit_suffix("j")).parse(input)?;
    Ok((input, ()))
}

/// ` ( unit )`, case-insensitive.
fn unit_suffix<'a>(unit: &'static str) -> impl Parser<&'a str, Output = (), Error = nom::error::Error<&'a str>> {
    value(
        (),
        (space0, char('('), space0, tag_no_case(unit), space0, char(')')),
    )
}
