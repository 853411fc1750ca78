//! Shared resonant filter
//!
//! Chamberlin state-variable filter, run twice per output sample. Oversampling
//! moves the coefficient's stability limit well above the highest cutoff the
//! register curve can reach, and the hard limit on the integrators keeps the
//! state bounded even if a coefficient lands on the edge.

use super::constants::{filter_cutoff_hz, register_fraction};
use std::f64::consts::{PI, SQRT_2};

/// Passes through the filter per output sample
const OVERSAMPLE: usize = 2;
/// Damping at resonance 0 (Butterworth)
const MAX_DAMPING: f64 = SQRT_2;
/// Damping at resonance 255
const MIN_DAMPING: f64 = 0.1;
/// `f^2 + 2fq` must stay below 4 for the loop to be stable
const STABILITY_LIMIT: f64 = 3.6;
/// Integrator ceiling
pub const STATE_LIMIT: f32 = 8.0;

/// Filter response selected by FILTER_TYPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Bypass
    #[default]
    Off,
    /// Low-pass output
    LowPass,
    /// High-pass output
    HighPass,
    /// Band-pass output
    BandPass,
}

impl FilterType {
    /// Decode FILTER_TYPE. Values above 3 clamp to [`FilterType::BandPass`].
    pub fn from_register(value: u32) -> Self {
        match value {
            0 => FilterType::Off,
            1 => FilterType::LowPass,
            2 => FilterType::HighPass,
            _ => FilterType::BandPass,
        }
    }
}

/// Frequency and damping coefficients for one cutoff/resonance pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCoefficients {
    /// Integrator gain per pass
    pub f: f32,
    /// Damping (inverse Q)
    pub q: f32,
}

impl FilterCoefficients {
    /// Compute coefficients. `cutoff` is in register units and may be fractional.
    pub fn new(cutoff: f64, resonance: u32, sample_rate: f64) -> Self {
        let q = MAX_DAMPING - (MAX_DAMPING - MIN_DAMPING) * register_fraction(resonance) as f64;
        let fc = filter_cutoff_hz(cutoff, sample_rate);
        let f = 2.0 * (PI * fc / (OVERSAMPLE as f64 * sample_rate)).sin();
        let f_max = -q + (q * q + STABILITY_LIMIT).sqrt();
        Self {
            f: f.min(f_max) as f32,
            q: q as f32,
        }
    }
}

/// State-variable filter with low-pass, high-pass and band-pass outputs
#[derive(Clone, Debug, Default)]
pub struct StateVariableFilter {
    low: f32,
    band: f32,
    /// Last (cutoff, resonance) pair and its coefficients
    cached: Option<(f64, u32, FilterCoefficients)>,
}

impl StateVariableFilter {
    /// Create a filter with cleared integrators
    pub fn new() -> Self {
        Self::default()
    }

    fn coefficients(&mut self, cutoff: f64, resonance: u32, sample_rate: f64) -> FilterCoefficients {
        match self.cached {
            Some((c, r, coeffs)) if c == cutoff && r == resonance => coeffs,
            _ => {
                let coeffs = FilterCoefficients::new(cutoff, resonance, sample_rate);
                self.cached = Some((cutoff, resonance, coeffs));
                coeffs
            }
        }
    }

    /// Filter one sample.
    ///
    /// [`FilterType::Off`] returns the input untouched and leaves the
    /// integrators as they are.
    pub fn process(
        &mut self,
        input: f32,
        filter_type: FilterType,
        cutoff: f64,
        resonance: u32,
        sample_rate: f64,
    ) -> f32 {
        if filter_type == FilterType::Off {
            return input;
        }

        let FilterCoefficients { f, q } = self.coefficients(cutoff, resonance, sample_rate);
        let mut high = 0.0;
        for _ in 0..OVERSAMPLE {
            self.low += f * self.band;
            high = input - self.low - q * self.band;
            self.band += f * high;
            self.low = self.low.clamp(-STATE_LIMIT, STATE_LIMIT);
            self.band = self.band.clamp(-STATE_LIMIT, STATE_LIMIT);
        }

        match filter_type {
            FilterType::LowPass => self.low,
            FilterType::HighPass => high,
            FilterType::BandPass => self.band,
            FilterType::Off => input,
        }
    }

    /// Integrator contents `(low, band)`
    pub fn state(&self) -> (f32, f32) {
        (self.low, self.band)
    }

    /// Clear integrators
    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
        self.cached = None;
    }
}
