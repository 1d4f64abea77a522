//! Reference BER of uncoded antipodal NRZ over AWGN, drawn next to the
//! measured curves as a sanity check.

use super::energy::db_to_linear;

/// Complementary error function (Abramowitz & Stegun 7.1.26).
///
/// Absolute error below 1.5e-7 for x >= 0.
pub fn erfc(x: f64) -> f64 {
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    poly * (-x * x).exp()
}

/// `Pe = Q(sqrt(2 Eb/N0)) = 0.5 erfc(sqrt(Eb/N0))`
pub fn nrz_ber(snr_db: f64) -> f64 {
    0.5 * erfc(db_to_linear(snr_db).sqrt())
}

/// [`nrz_ber`] over an SNR sweep.
pub fn nrz_curve(snr_db: &[f64]) -> Vec<f64> {
    snr_db.iter().map(|&s| nrz_ber(s)).collect()
}
