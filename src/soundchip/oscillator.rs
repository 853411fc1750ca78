//! Tone oscillators
//!
//! A single phase accumulator drives all three tone waveforms. Phase is kept in
//! `f64` so long notes do not drift in pitch.

use std::f64::consts::TAU;

/// PWM_CTRL enable bit
pub const PWM_ENABLE: u32 = 0x80;
/// PWM_CTRL rate bits, in 0.1 Hz steps
pub const PWM_RATE_MASK: u32 = 0x7F;

/// Waveform produced by a tone channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    /// Pulse wave with variable duty cycle
    Square,
    /// Linear up/down ramp
    Triangle,
    /// Pure sine
    Sine,
}

impl Waveform {
    /// Evaluate the waveform at `phase` (0..1). `duty` only affects [`Waveform::Square`].
    #[inline]
    pub fn sample(self, phase: f64, duty: f64) -> f32 {
        match self {
            Waveform::Square => {
                if phase < duty {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => (4.0 * (phase - 0.5).abs() - 1.0) as f32,
            Waveform::Sine => (TAU * phase).sin() as f32,
        }
    }
}

/// Phase accumulator
#[derive(Clone, Debug, Default)]
pub struct Oscillator {
    /// Current phase in [0, 1)
    phase: f64,
    /// Phase increment per sample
    increment: f64,
}

impl Oscillator {
    /// Create an oscillator at phase 0 with frequency 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frequency in Hz. Clamped to [0, sample_rate / 2].
    #[inline]
    pub fn set_frequency(&mut self, frequency: f64, sample_rate: f64) {
        let nyquist = sample_rate / 2.0;
        self.increment = frequency.clamp(0.0, nyquist) / sample_rate;
    }

    /// Phase increment per sample
    #[inline]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Current phase
    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Restart the waveform cycle
    #[inline]
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    /// Advance by one sample. Returns `true` if the phase wrapped past 1.0.
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.phase += self.increment;
        if self.phase >= 1.0 {
            // increment <= 0.5, a single subtraction always lands back in range
            self.phase -= 1.0;
            true
        } else {
            false
        }
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.increment = 0.0;
    }
}

/// Triangle LFO sweeping the square channel's duty cycle
#[derive(Clone, Debug, Default)]
pub struct PulseWidthModulator {
    phase: f64,
}

impl PulseWidthModulator {
    /// Create a modulator at LFO phase 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Duty cycle for the current sample, advancing the LFO when enabled.
    ///
    /// `duty` carries the base duty in bits 0-7 and the modulation depth in
    /// bits 8-15, both as fractions of 256.
    pub fn next_duty(&mut self, duty: u32, pwm_control: u32, sample_rate: f64) -> f64 {
        let base = (duty & 0xFF) as f64 / 256.0;
        if pwm_control & PWM_ENABLE == 0 {
            return base;
        }

        let depth = ((duty >> 8) & 0xFF) as f64 / 256.0;
        let rate = (pwm_control & PWM_RATE_MASK) as f64 * 0.1;
        let lfo = 4.0 * (self.phase - 0.5).abs() - 1.0;

        self.phase += rate / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        (base + lfo * depth).clamp(0.0, 1.0)
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SR: f64 = 44_100.0;

    #[test]
    fn test_phase_increment_is_exact() {
        let mut osc = Oscillator::new();
        osc.set_frequency(440.0, SR);
        assert_eq!(osc.increment(), 440.0 / SR);
        osc.advance();
        assert_eq!(osc.phase(), 440.0 / SR);
    }

    #[test]
    fn test_phase_returns_after_one_period() {
        for freq in [441.0, 882.0, 4410.0, 11_025.0] {
            let mut osc = Oscillator::new();
            osc.set_frequency(freq, SR);
            let ticks = (SR / freq).round() as usize;
            let mut wraps = 0;
            for _ in 0..ticks {
                if osc.advance() {
                    wraps += 1;
                }
            }
            let p = osc.phase();
            let distance = p.min(1.0 - p);
            assert!(distance < 1e-9, "freq {freq}: phase {p}");
            assert!(wraps <= 1);
        }
    }

    #[test]
    fn test_zero_frequency_freezes_phase() {
        let mut osc = Oscillator::new();
        osc.set_frequency(0.0, SR);
        for _ in 0..1000 {
            assert!(!osc.advance());
        }
        assert_eq!(osc.phase(), 0.0);
    }

    #[test]
    fn test_frequency_clamped_to_nyquist() {
        let mut osc = Oscillator::new();
        osc.set_frequency(100_000.0, SR);
        assert_eq!(osc.increment(), 0.5);
        osc.set_frequency(-5.0, SR);
        assert_eq!(osc.increment(), 0.0);
    }

    #[test]
    fn test_waveform_shapes() {
        assert_eq!(Waveform::Square.sample(0.25, 0.5), 1.0);
        assert_eq!(Waveform::Square.sample(0.75, 0.5), -1.0);
        assert_eq!(Waveform::Triangle.sample(0.0, 0.5), 1.0);
        assert_eq!(Waveform::Triangle.sample(0.5, 0.5), -1.0);
        assert_relative_eq!(Waveform::Triangle.sample(0.25, 0.5), 0.0);
        assert_eq!(Waveform::Sine.sample(0.0, 0.5), 0.0);
        assert_relative_eq!(Waveform::Sine.sample(0.25, 0.5), 1.0);
    }

    #[test]
    fn test_pwm_disabled_uses_base_duty() {
        let mut pwm = PulseWidthModulator::new();
        // Depth set but PWM disabled
        let duty = 64 | (200 << 8);
        for _ in 0..100 {
            assert_eq!(pwm.next_duty(duty, 0x05, SR), 0.25);
        }
    }

    #[test]
    fn test_pwm_zero_depth_keeps_duty() {
        let mut pwm = PulseWidthModulator::new();
        for _ in 0..1000 {
            assert_eq!(pwm.next_duty(128, PWM_ENABLE | 50, SR), 0.5);
        }
    }

    #[test]
    fn test_pwm_moves_duty_within_bounds() {
        let mut pwm = PulseWidthModulator::new();
        let duty = 128 | (64 << 8);
        let mut min: f64 = 1.0;
        let mut max: f64 = 0.0;
        // 10 Hz LFO, one full cycle
        for _ in 0..4410 {
            let d = pwm.next_duty(duty, PWM_ENABLE | 100, SR);
            min = min.min(d);
            max = max.max(d);
        }
        assert_relative_eq!(max, 0.75, epsilon = 1e-3);
        assert_relative_eq!(min, 0.25, epsilon = 1e-3);
    }

    #[test]
    fn test_square_duty_quarter_high_time() {
        let mut osc = Oscillator::new();
        osc.set_frequency(441.0, SR);
        let mut high = 0;
        for _ in 0..100 {
            if Waveform::Square.sample(osc.phase(), 0.25) > 0.0 {
                high += 1;
            }
            osc.advance();
        }
        assert_eq!(high, 25);
    }
}
