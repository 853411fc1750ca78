//! ADSR envelope generator
//!
//! Each channel owns one [`Envelope`]. Stages ramp linearly; the rate registers
//! select the ramp duration on an exponential curve (1 ms .. 8 s), precomputed
//! into a [`RateTable`] for the active sample rate.
//!
//! Level never jumps: a gate-off always releases from the level the envelope
//! holds at that instant, and a retrigger attacks from there too.

use super::constants::{envelope_seconds, register_fraction, REGISTER_MAX};

/// Envelope shape selected by ENV_SHAPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeShape {
    /// Attack, decay to sustain, hold, release on gate-off
    #[default]
    Adsr,
    /// Attack then hold at full level
    SawUp,
    /// Attack then decay all the way to silence
    SawDown,
    /// Attack, decay, release, repeat while the gate is high
    Loop,
}

impl EnvelopeShape {
    /// Decode ENV_SHAPE. Values above 3 clamp to [`EnvelopeShape::Loop`].
    pub fn from_register(value: u32) -> Self {
        match value {
            0 => EnvelopeShape::Adsr,
            1 => EnvelopeShape::SawUp,
            2 => EnvelopeShape::SawDown,
            _ => EnvelopeShape::Loop,
        }
    }
}

/// Envelope stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeStage {
    /// Silent, waiting for a gate
    #[default]
    Idle,
    /// Rising towards 1.0
    Attack,
    /// Falling towards the sustain level
    Decay,
    /// Holding
    Sustain,
    /// Falling towards 0.0
    Release,
}

/// Per-sample level step for every rate register value at one sample rate
#[derive(Clone, Debug)]
pub struct RateTable {
    steps: [f32; 256],
}

impl RateTable {
    /// Build the table for `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        let sr = sample_rate.max(1) as f64;
        let steps = std::array::from_fn(|rate| (1.0 / (envelope_seconds(rate as u32) * sr)) as f32);
        Self { steps }
    }

    /// Level change per sample for a rate register (clamped to 255)
    #[inline]
    pub fn step(&self, rate: u32) -> f32 {
        self.steps[rate.min(REGISTER_MAX) as usize]
    }
}

/// Rate and level registers feeding one envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeParams {
    /// Attack rate
    pub attack: u32,
    /// Decay rate
    pub decay: u32,
    /// Sustain level
    pub sustain: u32,
    /// Release rate
    pub release: u32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0,
            decay: 0,
            sustain: REGISTER_MAX,
            release: 0,
        }
    }
}

/// Envelope state machine
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    stage: EnvelopeStage,
    level: f32,
}

impl Envelope {
    /// Create an idle envelope
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage
    #[inline]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current level (0.0..=1.0)
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// True while the envelope is producing sound
    #[inline]
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Gate rising edge: attack from the current level
    pub fn gate_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    /// Gate falling edge: release from the current level
    pub fn gate_off(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.stage = EnvelopeStage::Release;
        }
    }

    /// Advance one sample and return the new level.
    ///
    /// `gate` is the current gate level; only the [`EnvelopeShape::Loop`] shape
    /// looks at it, to decide whether to restart after release.
    pub fn tick(
        &mut self,
        shape: EnvelopeShape,
        params: &EnvelopeParams,
        rates: &RateTable,
        gate: bool,
    ) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.level += rates.step(params.attack);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = match shape {
                        EnvelopeShape::SawUp => EnvelopeStage::Sustain,
                        _ => EnvelopeStage::Decay,
                    };
                }
            }
            EnvelopeStage::Decay => {
                let target = match shape {
                    EnvelopeShape::SawDown => 0.0,
                    _ => register_fraction(params.sustain),
                };
                let done = match shape {
                    EnvelopeShape::Loop => EnvelopeStage::Release,
                    _ => EnvelopeStage::Sustain,
                };
                if self.level > target {
                    self.level -= rates.step(params.decay);
                    if self.level <= target {
                        self.level = target;
                        self.stage = done;
                    }
                } else {
                    self.stage = done;
                }
            }
            EnvelopeStage::Sustain => {}
            EnvelopeStage::Release => {
                self.level -= rates.step(params.release);
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = if shape == EnvelopeShape::Loop && gate {
                        EnvelopeStage::Attack
                    } else {
                        EnvelopeStage::Idle
                    };
                }
            }
        }
        self.level
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
    }
}
