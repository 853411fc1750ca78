//! One voice of the chip
//!
//! A channel owns its signal generator, envelope and sweep unit. The chip drives
//! it in fixed steps every sample:
//!
//! 1. [`Channel::update`] latches the register snapshot (gate edges, frequency,
//!    sweep, duty, noise mode)
//! 2. [`Channel::raw`] reads the generator at the current phase
//! 3. [`Channel::advance`] moves the generator one sample forward
//! 4. [`Channel::envelope_tick`] advances the envelope
//!
//! Cross-channel links (sync, ring modulation, filter modulation) are resolved
//! by the chip between those steps.

use super::envelope::{Envelope, EnvelopeParams, EnvelopeShape, RateTable};
use super::noise::{NoiseGenerator, NoiseMode};
use super::oscillator::{Oscillator, PulseWidthModulator, Waveform};
use super::registers::{ChannelId, ChannelRegisters};
use super::sweep::{Sweep, SweepUnit};

/// Signal source of a channel
#[derive(Clone, Debug)]
pub enum Generator {
    /// Phase-accumulator waveform
    Tone {
        /// Waveform shape
        waveform: Waveform,
        /// Phase accumulator
        oscillator: Oscillator,
        /// Duty-cycle LFO (square only)
        pwm: PulseWidthModulator,
        /// Duty cycle latched for the current sample
        duty: f64,
    },
    /// LFSR noise
    Noise(NoiseGenerator),
}

impl Generator {
    fn for_channel(id: ChannelId) -> Self {
        let tone = |waveform| Generator::Tone {
            waveform,
            oscillator: Oscillator::new(),
            pwm: PulseWidthModulator::new(),
            duty: 0.5,
        };
        match id {
            ChannelId::Square => tone(Waveform::Square),
            ChannelId::Triangle => tone(Waveform::Triangle),
            ChannelId::Sine => tone(Waveform::Sine),
            ChannelId::Noise => Generator::Noise(NoiseGenerator::new()),
        }
    }
}

/// A single chip voice
#[derive(Clone, Debug)]
pub struct Channel {
    id: ChannelId,
    generator: Generator,
    envelope: Envelope,
    sweep: SweepUnit,
    /// Effective gate seen on the previous sample
    gate: bool,
    /// FREQ register value last latched
    frequency_register: u32,
    /// Frequency after sweep, in Hz
    working_frequency: u32,
}

impl Channel {
    /// Create a silent channel
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            generator: Generator::for_channel(id),
            envelope: Envelope::new(),
            sweep: SweepUnit::new(),
            gate: false,
            frequency_register: 0,
            working_frequency: 0,
        }
    }

    /// Channel identity
    #[inline]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Signal generator
    #[inline]
    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Envelope state
    #[inline]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Frequency in Hz after sweep
    #[inline]
    pub fn working_frequency(&self) -> u32 {
        self.working_frequency
    }

    /// A channel contributes to the mix while its envelope is running
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.envelope.is_active()
    }

    /// True for the three phase-accumulator channels
    #[inline]
    pub fn is_tone(&self) -> bool {
        matches!(self.generator, Generator::Tone { .. })
    }

    /// Latch this sample's register values
    pub fn update(&mut self, regs: &ChannelRegisters, sample_rate: u32) {
        let gate = regs.control.gate_high();
        let rising = gate && !self.gate;
        if rising {
            if !self.envelope.is_active() {
                self.restart_phase();
            }
            self.envelope.gate_on();
            self.working_frequency = regs.frequency;
        } else if !gate && self.gate {
            self.envelope.gate_off();
        }
        self.gate = gate;

        if regs.frequency != self.frequency_register {
            self.frequency_register = regs.frequency;
            self.working_frequency = regs.frequency;
        }

        self.sweep.configure(Sweep::from_register(regs.sweep));
        self.working_frequency = self.sweep.tick(self.working_frequency, sample_rate);

        let sr = sample_rate as f64;
        match &mut self.generator {
            Generator::Tone {
                waveform,
                oscillator,
                pwm,
                duty,
            } => {
                oscillator.set_frequency(self.working_frequency as f64, sr);
                if *waveform == Waveform::Square {
                    *duty = pwm.next_duty(regs.duty, regs.pwm_control, sr);
                }
            }
            Generator::Noise(noise) => {
                noise.set_mode(NoiseMode::from_register(regs.noise_mode));
            }
        }
    }

    /// Pre-envelope output at the current position, in [-1, 1]
    #[inline]
    pub fn raw(&self) -> f32 {
        match &self.generator {
            Generator::Tone {
                waveform,
                oscillator,
                duty,
                ..
            } => waveform.sample(oscillator.phase(), *duty),
            Generator::Noise(noise) => noise.output(),
        }
    }

    /// Move the generator one sample forward. Returns `true` when a tone
    /// oscillator wrapped (noise never reports a wrap).
    #[inline]
    pub fn advance(&mut self, sample_rate: u32) -> bool {
        match &mut self.generator {
            Generator::Tone { oscillator, .. } => oscillator.advance(),
            Generator::Noise(noise) => {
                noise.clock(self.working_frequency as f64, sample_rate as f64);
                false
            }
        }
    }

    /// Hard sync: restart the waveform cycle. No effect on noise.
    #[inline]
    pub fn hard_sync(&mut self) {
        self.restart_phase();
    }

    fn restart_phase(&mut self) {
        if let Generator::Tone { oscillator, .. } = &mut self.generator {
            oscillator.reset_phase();
        }
    }

    /// Advance the envelope and return its level
    #[inline]
    pub fn envelope_tick(
        &mut self,
        shape: EnvelopeShape,
        regs: &ChannelRegisters,
        rates: &RateTable,
    ) -> f32 {
        let params = EnvelopeParams {
            attack: regs.attack,
            decay: regs.decay,
            sustain: regs.sustain,
            release: regs.release,
        };
        self.envelope.tick(shape, &params, rates, self.gate)
    }

    /// Reset to power-on state
    pub fn reset(&mut self) {
        *self = Self::new(self.id);
    }
}
