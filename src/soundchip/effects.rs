//! Post-mix effects: overdrive and reverb

use super::constants::{register_fraction, DEFAULT_SAMPLE_RATE, MAX_OVERDRIVE_DRIVE};

/// Comb delays in samples at 44.1 kHz (mutually prime)
const COMB_DELAYS: [usize; 4] = [1687, 1601, 2053, 2251];
/// Feedback scale per comb
const COMB_DECAYS: [f32; 4] = [0.97, 0.95, 0.93, 0.91];
/// Allpass delays in samples at 44.1 kHz
const ALLPASS_DELAYS: [usize; 2] = [389, 307];
/// Allpass feedback
const ALLPASS_FEEDBACK: f32 = 0.5;
/// Pre-delay in milliseconds
const PRE_DELAY_MS: usize = 8;
/// Wet signal scale, keeps the comb sum inside full scale
const WET_LEVEL: f32 = 0.3;
/// Comb feedback scale at REVERB_DECAY = 0
const DECAY_BASE: f32 = 0.1;
/// Added feedback scale at REVERB_DECAY = 255
const DECAY_RANGE: f32 = 0.89;

/// Soft clipper, `tanh(x * drive)`
#[inline]
pub fn overdrive(sample: f32, amount: u32) -> f32 {
    if amount == 0 {
        return sample;
    }
    let drive = register_fraction(amount) * MAX_OVERDRIVE_DRIVE;
    (sample * drive).tanh()
}

/// Fixed-length circular delay line
#[derive(Clone, Debug)]
struct DelayLine {
    buffer: Vec<f32>,
    pos: usize,
}

impl DelayLine {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            pos: 0,
        }
    }

    /// Oldest sample in the line
    #[inline]
    fn front(&self) -> f32 {
        self.buffer[self.pos]
    }

    /// Overwrite the oldest sample and move on
    #[inline]
    fn push(&mut self, value: f32) {
        self.buffer[self.pos] = value;
        self.pos = (self.pos + 1) % self.buffer.len();
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

/// Schroeder reverb: pre-delay, four parallel combs, two series allpasses
#[derive(Clone, Debug)]
pub struct Reverb {
    pre_delay: DelayLine,
    combs: [DelayLine; 4],
    allpasses: [DelayLine; 2],
    /// REVERB_DECAY value the comb feedback was computed for
    decay_register: u32,
    comb_feedback: [f32; 4],
}

impl Reverb {
    /// Create a reverb with delay lengths scaled to `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        let scale = |len: usize| {
            ((len as u64 * sample_rate as u64 + DEFAULT_SAMPLE_RATE as u64 / 2)
                / DEFAULT_SAMPLE_RATE as u64) as usize
        };
        let mut reverb = Self {
            pre_delay: DelayLine::new(PRE_DELAY_MS * sample_rate as usize / 1000),
            combs: COMB_DELAYS.map(|len| DelayLine::new(scale(len))),
            allpasses: ALLPASS_DELAYS.map(|len| DelayLine::new(scale(len))),
            decay_register: 0,
            comb_feedback: [0.0; 4],
        };
        reverb.set_decay(0);
        reverb
    }

    /// Apply a REVERB_DECAY register value
    pub fn set_decay(&mut self, decay: u32) {
        self.decay_register = decay;
        let base = DECAY_BASE + register_fraction(decay) * DECAY_RANGE;
        self.comb_feedback = COMB_DECAYS.map(|d| base * d);
    }

    /// Produce one wet sample
    pub fn process_wet(&mut self, input: f32) -> f32 {
        let delayed = self.pre_delay.front();
        self.pre_delay.push(input);

        let mut out = 0.0;
        for (comb, feedback) in self.combs.iter_mut().zip(self.comb_feedback) {
            let tap = comb.front();
            comb.push(delayed + tap * feedback);
            out += tap;
        }

        for allpass in &mut self.allpasses {
            let tap = allpass.front();
            allpass.push(out + tap * ALLPASS_FEEDBACK);
            out = tap - out;
        }

        out * WET_LEVEL
    }

    /// Run one sample through the reverb and blend with the dry signal.
    ///
    /// The tail keeps running at mix 0 so raising the mix later picks it up.
    pub fn process(&mut self, input: f32, mix: u32, decay: u32) -> f32 {
        if decay != self.decay_register {
            self.set_decay(decay);
        }
        let wet = self.process_wet(input);
        if mix == 0 {
            return input;
        }
        let mix = register_fraction(mix);
        input * (1.0 - mix) + wet * mix
    }

    /// Clear all delay lines
    pub fn reset(&mut self) {
        self.pre_delay.clear();
        for line in self.combs.iter_mut().chain(self.allpasses.iter_mut()) {
            line.clear();
        }
        self.set_decay(0);
    }
}
