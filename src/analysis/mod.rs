/// Analysis layer: thresholds, transmit energy and battery autonomy.
///
/// ```text
///   MeasurementTable + LinkMetadata
///        │
///        ├──▶ energy     Eb_tx, energy/day, battery days per sample
///        │
///        ├──▶ threshold  SNR* where BER crosses each target (log domain)
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  thresholds + operating points, best waveform
///   └──────────┘
///
///   theory      reference NRZ curve over AWGN
/// ```

pub mod energy;
pub mod summary;
pub mod theory;
pub mod threshold;
