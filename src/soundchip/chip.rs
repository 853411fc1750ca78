//! Sound chip emulation
//!
//! Sample-accurate render loop. Every call to [`SoundChip::clock`] snapshots the
//! register bank once and advances every stateful unit by exactly one sample
//! period, so gate edges are never seen later than the next sample boundary.

use super::channel::Channel;
use super::constants::{register_fraction, DEFAULT_SAMPLE_RATE, NUM_CHANNELS, REGISTER_MAX};
use super::effects::{overdrive, Reverb};
use super::envelope::{EnvelopeShape, RateTable};
use super::filter::{FilterType, StateVariableFilter};
use super::mixer::Mixer;
use super::registers::{AudioControl, ChannelId, ChannelRegisters, FilterRegisters, RegisterBank};
use crate::config::ChipConfig;
use crate::Result;
use std::sync::Arc;

/// Four channel register-driven synthesizer
///
/// The register bank is held behind an [`Arc`] so other threads can keep
/// writing registers (see [`SoundChip::register_handle`]) while this instance
/// renders.
///
/// # Example
///
/// ```
/// use synthchip::soundchip::registers::{AUDIO_CTRL, SINE_CTRL, SINE_FREQ, SINE_VOL};
/// use synthchip::SoundChip;
///
/// let mut chip = SoundChip::new();
/// chip.write_register(AUDIO_CTRL, 1);
/// chip.write_register(SINE_FREQ, 440);
/// chip.write_register(SINE_VOL, 255);
/// chip.write_register(SINE_CTRL, 1);
///
/// chip.clock();
/// let sample = chip.get_sample();
/// assert!((-1.0..=1.0).contains(&sample));
/// ```
#[derive(Clone)]
pub struct SoundChip {
    registers: Arc<RegisterBank>,
    sample_rate: u32,
    rates: RateTable,
    channels: [Channel; NUM_CHANNELS],
    filter: StateVariableFilter,
    reverb: Reverb,
    mixer: Mixer,
    last_sample: f32,
}

impl SoundChip {
    /// Create a chip at 44.1 kHz
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    /// Create a chip rendering at `sample_rate`
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self::with_registers(Arc::new(RegisterBank::new()), sample_rate)
    }

    /// Create a chip around an existing register bank
    pub fn with_registers(registers: Arc<RegisterBank>, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        Self {
            registers,
            sample_rate,
            rates: RateTable::new(sample_rate),
            channels: ChannelId::ALL.map(Channel::new),
            filter: StateVariableFilter::new(),
            reverb: Reverb::new(sample_rate),
            mixer: Mixer::default(),
            last_sample: 0.0,
        }
    }

    /// Create a chip from a validated configuration
    pub fn from_config(config: &ChipConfig) -> Result<Self> {
        config.validate()?;
        let mut chip = Self::with_sample_rate(config.sample_rate);
        chip.set_master_gain(config.master_gain);
        Ok(chip)
    }

    /// Output sample rate
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Register bank
    #[inline]
    pub fn registers(&self) -> &RegisterBank {
        &self.registers
    }

    /// Shared handle for writers on other threads
    pub fn register_handle(&self) -> Arc<RegisterBank> {
        Arc::clone(&self.registers)
    }

    /// Power-cycle: restore register defaults and clear every unit
    pub fn reset(&mut self) {
        tracing::debug!(sample_rate = self.sample_rate, "sound chip reset");
        self.registers.reset();
        for channel in &mut self.channels {
            channel.reset();
        }
        self.filter.reset();
        self.reverb.reset();
        self.mixer.reset();
        self.last_sample = 0.0;
    }

    /// Write a register. Never fails; unmapped addresses are ignored.
    #[inline]
    pub fn write_register(&self, addr: u32, value: u32) {
        self.registers.write(addr, value);
    }

    /// Read a register (0 for unmapped addresses)
    #[inline]
    pub fn read_register(&self, addr: u32) -> u32 {
        self.registers.read(addr)
    }

    /// Render one sample
    #[inline]
    pub fn clock(&mut self) {
        self.last_sample = self.compute_next_sample();
    }

    /// Most recently rendered sample
    #[inline]
    pub fn get_sample(&self) -> f32 {
        self.last_sample
    }

    /// Render `count` samples
    pub fn generate_samples(&mut self, count: usize) -> Vec<f32> {
        let mut samples = vec![0.0; count];
        self.generate_samples_into(&mut samples);
        samples
    }

    /// Render into an existing buffer
    pub fn generate_samples_into(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            self.clock();
            *sample = self.last_sample;
        }
    }

    /// Voice state
    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    /// Last post-envelope output per channel
    pub fn channel_outputs(&self) -> [f32; NUM_CHANNELS] {
        self.mixer.channel_outputs()
    }

    /// Mute or unmute a channel on the host side
    pub fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        self.mixer.set_mute(channel, mute);
    }

    /// Check if a channel is muted
    pub fn is_channel_muted(&self, channel: usize) -> bool {
        self.mixer.is_muted(channel)
    }

    /// Master gain applied after summing
    pub fn master_gain(&self) -> f32 {
        self.mixer.master_gain()
    }

    /// Change the master gain
    pub fn set_master_gain(&mut self, gain: f32) {
        self.mixer.set_master_gain(gain);
    }

    fn compute_next_sample(&mut self) -> f32 {
        let bank = &*self.registers;
        if !bank.audio_control().contains(AudioControl::ENABLE) {
            return 0.0;
        }

        let shape = EnvelopeShape::from_register(bank.envelope_shape());
        let regs: [ChannelRegisters; NUM_CHANNELS] = ChannelId::ALL.map(|id| bank.channel(id));
        let filter_regs = bank.filter();
        let fx = bank.effects();
        let sample_rate = self.sample_rate;

        for (channel, r) in self.channels.iter_mut().zip(&regs) {
            channel.update(r, sample_rate);
        }

        let raw: [f32; NUM_CHANNELS] = std::array::from_fn(|i| self.channels[i].raw());
        let mut wrapped = [false; NUM_CHANNELS];
        for (channel, wrap) in self.channels.iter_mut().zip(wrapped.iter_mut()) {
            *wrap = channel.advance(sample_rate);
        }

        for (channel, r) in self.channels.iter_mut().zip(&regs) {
            if let Some(source) = ChannelId::from_selector(r.sync_source) {
                if source != channel.id() && wrapped[source.index()] {
                    channel.hard_sync();
                }
            }
        }

        let mut voices = [0.0; NUM_CHANNELS];
        for (i, (channel, r)) in self.channels.iter_mut().zip(&regs).enumerate() {
            let mut signal = raw[i];
            if let Some(source) = ChannelId::from_selector(r.ring_mod_source) {
                signal *= raw[source.index()];
            }
            let level = channel.envelope_tick(shape, r, &self.rates);
            voices[i] = signal * level * register_fraction(r.volume);
        }

        let buses = self.mixer.route(&voices, filter_regs.routing);
        let filtered = self.filter.process(
            buses.filtered,
            FilterType::from_register(filter_regs.filter_type),
            effective_cutoff(&filter_regs, &raw),
            filter_regs.resonance,
            sample_rate as f64,
        );

        let mut sample = self.mixer.mix(buses.dry, filtered);
        sample = overdrive(sample, fx.overdrive);
        sample = self.reverb.process(sample, fx.reverb_mix, fx.reverb_decay);
        Mixer::clip(sample)
    }
}

/// Cutoff in register units after modulation, clamped to 0..=255
fn effective_cutoff(regs: &FilterRegisters, raw: &[f32; NUM_CHANNELS]) -> f64 {
    let max = REGISTER_MAX as f64;
    let base = regs.cutoff.min(REGISTER_MAX) as f64;
    let modulation = match ChannelId::from_selector(regs.mod_source) {
        Some(source) => regs.mod_amount.min(REGISTER_MAX) as f64 * raw[source.index()] as f64,
        None => 0.0,
    };
    (base + modulation).clamp(0.0, max)
}

impl Default for SoundChip {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SoundChip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundChip")
            .field("sample_rate", &self.sample_rate)
            .field("enabled", &self.registers.audio_control())
            .field("last_sample", &self.last_sample)
            .finish_non_exhaustive()
    }
}
