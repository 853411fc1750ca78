//! Backend trait abstraction
//!
//! The streaming and export layers only need something that accepts register
//! writes and produces samples. [`SoundChipBackend`] is that seam.

use crate::soundchip::{SoundChip, DEFAULT_SAMPLE_RATE, NUM_CHANNELS};

/// What the streaming and export layers drive
///
/// # Example
///
/// ```
/// use synthchip::soundchip::registers::{AUDIO_CTRL, SQUARE_CTRL, SQUARE_FREQ, SQUARE_VOL};
/// use synthchip::{SoundChip, SoundChipBackend};
///
/// fn play_note<B: SoundChipBackend>(chip: &mut B) -> Vec<f32> {
///     chip.write_register(AUDIO_CTRL, 1);
///     chip.write_register(SQUARE_FREQ, 220);
///     chip.write_register(SQUARE_VOL, 200);
///     chip.write_register(SQUARE_CTRL, 1);
///     chip.generate_samples(128)
/// }
///
/// let samples = play_note(&mut <SoundChip as SoundChipBackend>::new());
/// assert_eq!(samples.len(), 128);
/// ```
pub trait SoundChipBackend: Send {
    /// Create a backend at the default sample rate (44.1 kHz)
    fn new() -> Self
    where
        Self: Sized;

    /// Create a backend rendering at `sample_rate` Hz
    fn with_sample_rate(sample_rate: u32) -> Self
    where
        Self: Sized;

    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Reset registers and all internal state to power-on values
    fn reset(&mut self);

    /// Write a register. Unmapped addresses are ignored.
    fn write_register(&mut self, addr: u32, value: u32);

    /// Current register value, 0 for unmapped addresses
    fn read_register(&self, addr: u32) -> u32;

    /// Render one sample
    fn clock(&mut self);

    /// Sample produced by the most recent [`clock`](Self::clock), in [-1.0, 1.0]
    fn get_sample(&self) -> f32;

    /// Render `count` samples into a fresh vector
    fn generate_samples(&mut self, count: usize) -> Vec<f32> {
        let mut samples = vec![0.0; count];
        self.generate_samples_into(&mut samples);
        samples
    }

    /// Fill `buffer` with consecutive samples without allocating
    fn generate_samples_into(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            self.clock();
            *sample = self.get_sample();
        }
    }

    /// Last post-envelope output per channel
    fn channel_outputs(&self) -> [f32; NUM_CHANNELS];

    /// Mute or unmute a channel (0=Square, 1=Triangle, 2=Sine, 3=Noise)
    fn set_channel_mute(&mut self, channel: usize, mute: bool);

    /// Check if a channel is muted
    fn is_channel_muted(&self, channel: usize) -> bool;
}

impl SoundChipBackend for SoundChip {
    fn new() -> Self {
        SoundChip::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    fn with_sample_rate(sample_rate: u32) -> Self {
        SoundChip::with_sample_rate(sample_rate)
    }

    fn sample_rate(&self) -> u32 {
        SoundChip::sample_rate(self)
    }

    fn reset(&mut self) {
        SoundChip::reset(self)
    }

    fn write_register(&mut self, addr: u32, value: u32) {
        SoundChip::write_register(self, addr, value)
    }

    fn read_register(&self, addr: u32) -> u32 {
        SoundChip::read_register(self, addr)
    }

    fn clock(&mut self) {
        SoundChip::clock(self)
    }

    fn get_sample(&self) -> f32 {
        SoundChip::get_sample(self)
    }

    fn generate_samples_into(&mut self, buffer: &mut [f32]) {
        SoundChip::generate_samples_into(self, buffer)
    }

    fn channel_outputs(&self) -> [f32; NUM_CHANNELS] {
        SoundChip::channel_outputs(self)
    }

    fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        SoundChip::set_channel_mute(self, channel, mute)
    }

    fn is_channel_muted(&self, channel: usize) -> bool {
        SoundChip::is_channel_muted(self, channel)
    }
}
