//! LFSR noise generator
//!
//! The noise channel is a Fibonacci shift register clocked by its own frequency
//! register through a fractional accumulator, independent of the output sample
//! rate. Each mode has a fixed width and tap set so the bit sequence is fully
//! deterministic.

use super::constants::MAX_NOISE_FREQUENCY;

/// Noise timbre selected by the MODE register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseMode {
    /// 23-bit maximal-length register, flat spectrum
    #[default]
    White,
    /// 7-bit register, 127-step loop heard as a buzzy pitch
    Periodic,
    /// 11-bit register with four taps, short ringing cycle
    Metallic,
}

impl NoiseMode {
    /// Decode the MODE register. Values above 2 clamp to [`NoiseMode::Metallic`].
    pub fn from_register(value: u32) -> Self {
        match value {
            0 => NoiseMode::White,
            1 => NoiseMode::Periodic,
            _ => NoiseMode::Metallic,
        }
    }

    /// Register width in bits
    #[inline]
    pub fn width(self) -> u32 {
        match self {
            NoiseMode::White => 23,
            NoiseMode::Periodic => 7,
            NoiseMode::Metallic => 11,
        }
    }

    /// Feedback tap positions (bit indices)
    #[inline]
    pub fn taps(self) -> &'static [u32] {
        match self {
            NoiseMode::White => &[22, 17],
            NoiseMode::Periodic => &[6, 5],
            NoiseMode::Metallic => &[10, 8, 6, 4],
        }
    }

    /// All-ones mask for the register width
    #[inline]
    pub fn mask(self) -> u32 {
        (1 << self.width()) - 1
    }

    /// Seed loaded at power-on and whenever the register would be zero
    #[inline]
    pub fn seed(self) -> u32 {
        self.mask()
    }
}

/// Noise generator state
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    mode: NoiseMode,
    /// Shift register, never zero
    lfsr: u32,
    /// Fractional clock, a step fires every time it crosses 1.0
    accumulator: f64,
}

impl NoiseGenerator {
    /// Create a white noise generator with the default seed
    pub fn new() -> Self {
        let mode = NoiseMode::White;
        Self {
            mode,
            lfsr: mode.seed(),
            accumulator: 0.0,
        }
    }

    /// Current mode
    #[inline]
    pub fn mode(&self) -> NoiseMode {
        self.mode
    }

    /// Current register contents
    #[inline]
    pub fn lfsr(&self) -> u32 {
        self.lfsr
    }

    /// Switch mode and load its seed.
    ///
    /// The metallic register is not maximal-length: masked leftovers from another
    /// mode can fall onto its 85- or 7-step cycles, so every switch starts from
    /// the seed. The clock accumulator is kept.
    pub fn set_mode(&mut self, mode: NoiseMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.lfsr = mode.seed();
    }

    /// Current output, bit 0 mapped to +/-1
    #[inline]
    pub fn output(&self) -> f32 {
        if self.lfsr & 1 != 0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Shift the register once
    #[inline]
    pub fn step(&mut self) {
        let feedback = self
            .mode
            .taps()
            .iter()
            .fold(0, |acc, &tap| acc ^ ((self.lfsr >> tap) & 1));
        self.lfsr = ((self.lfsr << 1) | feedback) & self.mode.mask();
        if self.lfsr == 0 {
            self.lfsr = self.mode.seed();
        }
    }

    /// Advance the noise clock by one output sample
    #[inline]
    pub fn clock(&mut self, frequency: f64, sample_rate: f64) {
        self.accumulator += frequency.clamp(0.0, MAX_NOISE_FREQUENCY) / sample_rate;
        while self.accumulator >= 1.0 {
            self.accumulator -= 1.0;
            self.step();
        }
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}
