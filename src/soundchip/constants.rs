//! Chip constants and register curves
//!
//! Register values are stored raw; everything that turns a register byte into a
//! real-world quantity (seconds, Hz, gain) lives here so the curves can be tested
//! in isolation.

/// Number of voices on the chip
pub const NUM_CHANNELS: usize = 4;

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Per-channel level into the mix bus (four full-scale voices sum to 1.0)
pub const CHANNEL_MIX_LEVEL: f32 = 0.25;

/// Largest value any 8-bit control register is clamped to
pub const REGISTER_MAX: u32 = 255;

/// Upper bound for the noise clock
pub const MAX_NOISE_FREQUENCY: f64 = 1_048_576.0;

/// Fastest envelope stage (register 0)
pub const ENVELOPE_MIN_SECONDS: f64 = 0.001;
/// Ratio between the slowest and fastest stage (register 255 = 8 s)
pub const ENVELOPE_TIME_RANGE: f64 = 8000.0;

/// Filter corner at cutoff register 0
pub const FILTER_MIN_HZ: f64 = 20.0;
/// Ratio between the highest and lowest corner (20 Hz .. 20 kHz)
pub const FILTER_HZ_RANGE: f64 = 1000.0;
/// Corner frequency ceiling as a fraction of the sample rate
pub const FILTER_MAX_SAMPLE_FRACTION: f64 = 0.45;

/// Maximum overdrive gain (register 255)
pub const MAX_OVERDRIVE_DRIVE: f32 = 4.0;

/// Map a register to 0.0..=1.0, clamping above 255
#[inline]
pub fn register_fraction(value: u32) -> f32 {
    value.min(REGISTER_MAX) as f32 / REGISTER_MAX as f32
}

/// Stage duration in seconds for an envelope rate register.
///
/// Exponential from 1 ms (0) to 8 s (255) so equal register steps feel like
/// equal perceptual steps.
pub fn envelope_seconds(rate: u32) -> f64 {
    let t = rate.min(REGISTER_MAX) as f64 / REGISTER_MAX as f64;
    ENVELOPE_MIN_SECONDS * ENVELOPE_TIME_RANGE.powf(t)
}

/// Filter corner frequency in Hz for a cutoff value in register units.
///
/// Fractional input is accepted so modulated cutoffs stay smooth.
pub fn filter_cutoff_hz(cutoff: f64, sample_rate: f64) -> f64 {
    let t = cutoff.clamp(0.0, REGISTER_MAX as f64) / REGISTER_MAX as f64;
    (FILTER_MIN_HZ * FILTER_HZ_RANGE.powf(t)).min(FILTER_MAX_SAMPLE_FRACTION * sample_rate)
}
