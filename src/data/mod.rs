/// Data layer: sweep file ingestion and column mapping.
///
/// Architecture:
/// ```text
///  sweep .csv (',' or ';', optional '#' metadata line)
///        │
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │  loader   │ ───▶ │ metadata  │  N0, attenuation, bits/day, battery, R
///   └──────────┘      └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ MeasurementTable  │  normalized names, f64 columns (NaN = missing)
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ columns   │  logical column → index (SNR, BER per waveform, ...)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  clean/sort (SNR, value) pairs, compliant rows
///   └──────────┘
/// ```

pub mod columns;
pub mod filter;
pub mod loader;
pub mod metadata;
pub mod model;
