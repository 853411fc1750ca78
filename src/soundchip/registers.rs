//! Register map and register bank
//!
//! The chip is controlled exclusively through a flat space of 32-bit registers.
//! Every register is an independent word: writes are last-write-wins, values are
//! never validated at write time and are clamped by the unit that consumes them.
//!
//! The [`RegisterBank`] is the only state shared between writer threads (CPU
//! emulators, players, tests) and the renderer. Each word is an [`AtomicU32`], so
//! neither side ever blocks on the other.

use super::constants::NUM_CHANNELS;
use bitflags::bitflags;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

// Global control (F800-F8FF)

/// Master control, bit 0 enables the chip
pub const AUDIO_CTRL: u32 = 0xF800;
/// Envelope shape shared by all channels (0=ADSR, 1=SawUp, 2=SawDown, 3=Loop)
pub const ENV_SHAPE: u32 = 0xF804;
/// Filter cutoff (0-255, exponential 20 Hz .. 20 kHz)
pub const FILTER_CUTOFF: u32 = 0xF820;
/// Filter resonance (0-255)
pub const FILTER_RESONANCE: u32 = 0xF824;
/// Filter type (0=off, 1=low-pass, 2=high-pass, 3=band-pass)
pub const FILTER_TYPE: u32 = 0xF828;
/// Filter cutoff modulation source (0=none, 1-4 = channel 0-3)
pub const FILTER_MOD_SOURCE: u32 = 0xF82C;
/// Filter cutoff modulation depth (0-255)
pub const FILTER_MOD_AMOUNT: u32 = 0xF830;
/// Bitmask of channels routed through the shared filter
pub const FILTER_ROUTING: u32 = 0xF834;

// Square channel (F900-F93F)

/// Square frequency in Hz
pub const SQUARE_FREQ: u32 = 0xF900;
/// Square volume (0-255)
pub const SQUARE_VOL: u32 = 0xF904;
/// Square control (bit 0 gate, bit 1 force release)
pub const SQUARE_CTRL: u32 = 0xF908;
/// Square duty cycle (bits 0-7) and PWM depth (bits 8-15), both /256
pub const SQUARE_DUTY: u32 = 0xF90C;
/// Square PWM control (bit 7 enable, bits 0-6 rate in 0.1 Hz)
pub const SQUARE_PWM_CTRL: u32 = 0xF922;
/// Square attack rate
pub const SQUARE_ATK: u32 = 0xF930;
/// Square decay rate
pub const SQUARE_DEC: u32 = 0xF934;
/// Square sustain level
pub const SQUARE_SUS: u32 = 0xF938;
/// Square release rate
pub const SQUARE_REL: u32 = 0xF93C;

// Triangle channel (F940-F97F)

/// Triangle frequency in Hz
pub const TRI_FREQ: u32 = 0xF940;
/// Triangle volume (0-255)
pub const TRI_VOL: u32 = 0xF944;
/// Triangle control
pub const TRI_CTRL: u32 = 0xF948;
/// Triangle attack rate
pub const TRI_ATK: u32 = 0xF960;
/// Triangle decay rate
pub const TRI_DEC: u32 = 0xF964;
/// Triangle sustain level
pub const TRI_SUS: u32 = 0xF968;
/// Triangle release rate
pub const TRI_REL: u32 = 0xF96C;

// Sine channel (F980-F9BF)

/// Sine frequency in Hz
pub const SINE_FREQ: u32 = 0xF980;
/// Sine volume (0-255)
pub const SINE_VOL: u32 = 0xF984;
/// Sine control
pub const SINE_CTRL: u32 = 0xF988;
/// Sine attack rate
pub const SINE_ATK: u32 = 0xF990;
/// Sine decay rate
pub const SINE_DEC: u32 = 0xF994;
/// Sine sustain level
pub const SINE_SUS: u32 = 0xF998;
/// Sine release rate
pub const SINE_REL: u32 = 0xF99C;

// Noise channel (F9C0-F9FF)

/// Noise clock frequency in Hz
pub const NOISE_FREQ: u32 = 0xF9C0;
/// Noise volume (0-255)
pub const NOISE_VOL: u32 = 0xF9C4;
/// Noise control
pub const NOISE_CTRL: u32 = 0xF9C8;
/// Noise attack rate
pub const NOISE_ATK: u32 = 0xF9D0;
/// Noise decay rate
pub const NOISE_DEC: u32 = 0xF9D4;
/// Noise sustain level
pub const NOISE_SUS: u32 = 0xF9D8;
/// Noise release rate
pub const NOISE_REL: u32 = 0xF9DC;
/// Noise mode (0=white, 1=periodic, 2=metallic)
pub const NOISE_MODE: u32 = 0xF9E0;

// Sweep units, one word per channel

/// Square sweep
pub const SQUARE_SWEEP: u32 = 0xF910;
/// Triangle sweep
pub const TRI_SWEEP: u32 = 0xF914;
/// Sine sweep
pub const SINE_SWEEP: u32 = 0xF918;
/// Noise sweep
pub const NOISE_SWEEP: u32 = 0xF91C;

// Modulation (FA00-FAFF)

/// Hard sync source for channel 0 (channels 1-3 follow at +4)
pub const SYNC_SOURCE_CH0: u32 = 0xFA00;
/// Hard sync source for channel 3
pub const SYNC_SOURCE_CH3: u32 = 0xFA0C;
/// Ring modulation source for channel 0 (channels 1-3 follow at +4)
pub const RING_MOD_SOURCE_CH0: u32 = 0xFA10;
/// Ring modulation source for channel 3
pub const RING_MOD_SOURCE_CH3: u32 = 0xFA1C;
/// Overdrive amount (0-255 maps to drive 0.0-4.0)
pub const OVERDRIVE_CTRL: u32 = 0xFA40;
/// Reverb wet/dry mix (0-255)
pub const REVERB_MIX: u32 = 0xFA50;
/// Reverb tail length (0-255)
pub const REVERB_DECAY: u32 = 0xFA54;

const SOURCE_REG_SPACING: u32 = 4;

/// FREQ, VOL, CTRL, ATK, DEC, SUS, REL per channel
const CHANNEL_ADDRESSES: [[u32; 7]; NUM_CHANNELS] = [
    [SQUARE_FREQ, SQUARE_VOL, SQUARE_CTRL, SQUARE_ATK, SQUARE_DEC, SQUARE_SUS, SQUARE_REL],
    [TRI_FREQ, TRI_VOL, TRI_CTRL, TRI_ATK, TRI_DEC, TRI_SUS, TRI_REL],
    [SINE_FREQ, SINE_VOL, SINE_CTRL, SINE_ATK, SINE_DEC, SINE_SUS, SINE_REL],
    [NOISE_FREQ, NOISE_VOL, NOISE_CTRL, NOISE_ATK, NOISE_DEC, NOISE_SUS, NOISE_REL],
];

const CHANNEL_BLOCK_REGISTERS: [ChannelRegister; 7] = [
    ChannelRegister::Frequency,
    ChannelRegister::Volume,
    ChannelRegister::Control,
    ChannelRegister::Attack,
    ChannelRegister::Decay,
    ChannelRegister::Sustain,
    ChannelRegister::Release,
];

const SWEEP_ADDRESSES: [u32; NUM_CHANNELS] = [SQUARE_SWEEP, TRI_SWEEP, SINE_SWEEP, NOISE_SWEEP];

/// Power-on sustain level (full scale)
const DEFAULT_SUSTAIN: u32 = 255;
/// Power-on square duty (50%)
const DEFAULT_DUTY: u32 = 128;
/// Power-on filter routing (noise channel only)
const DEFAULT_FILTER_ROUTING: u32 = 1 << 3;

bitflags! {
    /// Bits of [`AUDIO_CTRL`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AudioControl: u32 {
        /// Chip enable
        const ENABLE = 0x01;
    }
}

bitflags! {
    /// Bits of a channel CTRL register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelControl: u32 {
        /// Note on
        const GATE = 0x01;
        /// Treat the gate as low regardless of bit 0
        const FORCE_RELEASE = 0x02;
    }
}

impl ChannelControl {
    /// Effective gate level after applying force-release
    #[inline]
    pub fn gate_high(self) -> bool {
        self.contains(ChannelControl::GATE) && !self.contains(ChannelControl::FORCE_RELEASE)
    }
}

/// One of the four fixed voices of the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    /// Channel 0
    Square = 0,
    /// Channel 1
    Triangle = 1,
    /// Channel 2
    Sine = 2,
    /// Channel 3
    Noise = 3,
}

impl ChannelId {
    /// All channels in index order
    pub const ALL: [ChannelId; NUM_CHANNELS] = [
        ChannelId::Square,
        ChannelId::Triangle,
        ChannelId::Sine,
        ChannelId::Noise,
    ];

    /// Channel index (0-3)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Convert an index back to a channel
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Decode a source selector register (0 = none, 1-4 = channel 0-3).
    ///
    /// Values above 4 clamp to the last channel.
    pub fn from_selector(value: u32) -> Option<Self> {
        if value == 0 {
            return None;
        }
        let index = value.min(NUM_CHANNELS as u32) as usize - 1;
        Self::from_index(index)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Square => write!(f, "Square"),
            ChannelId::Triangle => write!(f, "Triangle"),
            ChannelId::Sine => write!(f, "Sine"),
            ChannelId::Noise => write!(f, "Noise"),
        }
    }
}

/// Per-channel register kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRegister {
    /// FREQ
    Frequency,
    /// VOL
    Volume,
    /// CTRL
    Control,
    /// ATK
    Attack,
    /// DEC
    Decay,
    /// SUS
    Sustain,
    /// REL
    Release,
    /// SWEEP
    Sweep,
    /// SYNC_SOURCE
    SyncSource,
    /// RING_MOD_SOURCE
    RingModSource,
    /// DUTY (square only)
    Duty,
    /// PWM_CTRL (square only)
    PwmControl,
    /// MODE (noise only)
    NoiseMode,
}

const CHANNEL_REGISTER_COUNT: usize = 13;
const GLOBAL_REGISTER_COUNT: usize = 11;

/// Number of storage words in a [`RegisterBank`]
pub const NUM_REGISTER_SLOTS: usize = GLOBAL_REGISTER_COUNT + NUM_CHANNELS * CHANNEL_REGISTER_COUNT;

/// A decoded register address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// AUDIO_CTRL
    AudioCtrl,
    /// ENV_SHAPE
    EnvShape,
    /// FILTER_CUTOFF
    FilterCutoff,
    /// FILTER_RESONANCE
    FilterResonance,
    /// FILTER_TYPE
    FilterType,
    /// FILTER_MOD_SOURCE
    FilterModSource,
    /// FILTER_MOD_AMOUNT
    FilterModAmount,
    /// FILTER_ROUTING
    FilterRouting,
    /// OVERDRIVE_CTRL
    Overdrive,
    /// REVERB_MIX
    ReverbMix,
    /// REVERB_DECAY
    ReverbDecay,
    /// A per-channel register
    Channel(ChannelId, ChannelRegister),
}

impl Register {
    /// Decode a bus address. Returns `None` for unmapped addresses.
    pub fn from_addr(addr: u32) -> Option<Self> {
        let global = match addr {
            AUDIO_CTRL => Some(Register::AudioCtrl),
            ENV_SHAPE => Some(Register::EnvShape),
            FILTER_CUTOFF => Some(Register::FilterCutoff),
            FILTER_RESONANCE => Some(Register::FilterResonance),
            FILTER_TYPE => Some(Register::FilterType),
            FILTER_MOD_SOURCE => Some(Register::FilterModSource),
            FILTER_MOD_AMOUNT => Some(Register::FilterModAmount),
            FILTER_ROUTING => Some(Register::FilterRouting),
            OVERDRIVE_CTRL => Some(Register::Overdrive),
            REVERB_MIX => Some(Register::ReverbMix),
            REVERB_DECAY => Some(Register::ReverbDecay),
            SQUARE_DUTY => Some(Register::Channel(ChannelId::Square, ChannelRegister::Duty)),
            SQUARE_PWM_CTRL => Some(Register::Channel(
                ChannelId::Square,
                ChannelRegister::PwmControl,
            )),
            NOISE_MODE => Some(Register::Channel(ChannelId::Noise, ChannelRegister::NoiseMode)),
            _ => None,
        };
        if global.is_some() {
            return global;
        }

        if let Some(index) = SWEEP_ADDRESSES.iter().position(|&a| a == addr) {
            return ChannelId::from_index(index)
                .map(|ch| Register::Channel(ch, ChannelRegister::Sweep));
        }

        if let Some(ch) = Self::spaced_channel(addr, SYNC_SOURCE_CH0, SYNC_SOURCE_CH3) {
            return Some(Register::Channel(ch, ChannelRegister::SyncSource));
        }
        if let Some(ch) = Self::spaced_channel(addr, RING_MOD_SOURCE_CH0, RING_MOD_SOURCE_CH3) {
            return Some(Register::Channel(ch, ChannelRegister::RingModSource));
        }

        for (index, block) in CHANNEL_ADDRESSES.iter().enumerate() {
            if let Some(offset) = block.iter().position(|&a| a == addr) {
                return ChannelId::from_index(index)
                    .map(|ch| Register::Channel(ch, CHANNEL_BLOCK_REGISTERS[offset]));
            }
        }

        None
    }

    fn spaced_channel(addr: u32, first: u32, last: u32) -> Option<ChannelId> {
        if !(first..=last).contains(&addr) || (addr - first) % SOURCE_REG_SPACING != 0 {
            return None;
        }
        ChannelId::from_index(((addr - first) / SOURCE_REG_SPACING) as usize)
    }

    /// Bus address of this register.
    ///
    /// Returns `None` for channel registers that only exist on another channel
    /// (e.g. DUTY on the sine channel).
    pub fn addr(&self) -> Option<u32> {
        let (ch, reg) = match *self {
            Register::AudioCtrl => return Some(AUDIO_CTRL),
            Register::EnvShape => return Some(ENV_SHAPE),
            Register::FilterCutoff => return Some(FILTER_CUTOFF),
            Register::FilterResonance => return Some(FILTER_RESONANCE),
            Register::FilterType => return Some(FILTER_TYPE),
            Register::FilterModSource => return Some(FILTER_MOD_SOURCE),
            Register::FilterModAmount => return Some(FILTER_MOD_AMOUNT),
            Register::FilterRouting => return Some(FILTER_ROUTING),
            Register::Overdrive => return Some(OVERDRIVE_CTRL),
            Register::ReverbMix => return Some(REVERB_MIX),
            Register::ReverbDecay => return Some(REVERB_DECAY),
            Register::Channel(ch, reg) => (ch, reg),
        };

        let index = ch.index() as u32;
        match reg {
            ChannelRegister::Sweep => Some(SWEEP_ADDRESSES[ch.index()]),
            ChannelRegister::SyncSource => Some(SYNC_SOURCE_CH0 + index * SOURCE_REG_SPACING),
            ChannelRegister::RingModSource => {
                Some(RING_MOD_SOURCE_CH0 + index * SOURCE_REG_SPACING)
            }
            ChannelRegister::Duty => (ch == ChannelId::Square).then_some(SQUARE_DUTY),
            ChannelRegister::PwmControl => (ch == ChannelId::Square).then_some(SQUARE_PWM_CTRL),
            ChannelRegister::NoiseMode => (ch == ChannelId::Noise).then_some(NOISE_MODE),
            block_reg => CHANNEL_BLOCK_REGISTERS
                .iter()
                .position(|&r| r == block_reg)
                .map(|offset| CHANNEL_ADDRESSES[ch.index()][offset]),
        }
    }

    /// Storage slot inside the register bank
    fn slot(&self) -> usize {
        match *self {
            Register::AudioCtrl => 0,
            Register::EnvShape => 1,
            Register::FilterCutoff => 2,
            Register::FilterResonance => 3,
            Register::FilterType => 4,
            Register::FilterModSource => 5,
            Register::FilterModAmount => 6,
            Register::FilterRouting => 7,
            Register::Overdrive => 8,
            Register::ReverbMix => 9,
            Register::ReverbDecay => 10,
            Register::Channel(ch, reg) => {
                GLOBAL_REGISTER_COUNT + ch.index() * CHANNEL_REGISTER_COUNT + reg as usize
            }
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::AudioCtrl => "AUDIO_CTRL",
            Register::EnvShape => "ENV_SHAPE",
            Register::FilterCutoff => "FILTER_CUTOFF",
            Register::FilterResonance => "FILTER_RESONANCE",
            Register::FilterType => "FILTER_TYPE",
            Register::FilterModSource => "FILTER_MOD_SOURCE",
            Register::FilterModAmount => "FILTER_MOD_AMOUNT",
            Register::FilterRouting => "FILTER_ROUTING",
            Register::Overdrive => "OVERDRIVE_CTRL",
            Register::ReverbMix => "REVERB_MIX",
            Register::ReverbDecay => "REVERB_DECAY",
            Register::Channel(ch, reg) => {
                let reg_name = match reg {
                    ChannelRegister::Frequency => "FREQ",
                    ChannelRegister::Volume => "VOL",
                    ChannelRegister::Control => "CTRL",
                    ChannelRegister::Attack => "ATK",
                    ChannelRegister::Decay => "DEC",
                    ChannelRegister::Sustain => "SUS",
                    ChannelRegister::Release => "REL",
                    ChannelRegister::Sweep => "SWEEP",
                    ChannelRegister::SyncSource => "SYNC_SOURCE",
                    ChannelRegister::RingModSource => "RING_MOD_SOURCE",
                    ChannelRegister::Duty => "DUTY",
                    ChannelRegister::PwmControl => "PWM_CTRL",
                    ChannelRegister::NoiseMode => "MODE",
                };
                return write!(f, "{ch} {reg_name}");
            }
        };
        write!(f, "{name}")
    }
}

/// Snapshot of one channel's registers, taken once per sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelRegisters {
    /// Frequency in Hz
    pub frequency: u32,
    /// Volume (0-255)
    pub volume: u32,
    /// Control bits
    pub control: ChannelControl,
    /// Attack rate (0-255)
    pub attack: u32,
    /// Decay rate (0-255)
    pub decay: u32,
    /// Sustain level (0-255)
    pub sustain: u32,
    /// Release rate (0-255)
    pub release: u32,
    /// Packed sweep settings
    pub sweep: u32,
    /// Hard sync source selector
    pub sync_source: u32,
    /// Ring modulation source selector
    pub ring_mod_source: u32,
    /// Duty / PWM depth
    pub duty: u32,
    /// PWM control
    pub pwm_control: u32,
    /// Noise mode
    pub noise_mode: u32,
}

/// Snapshot of the filter registers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterRegisters {
    /// Filter type selector
    pub filter_type: u32,
    /// Cutoff (0-255)
    pub cutoff: u32,
    /// Resonance (0-255)
    pub resonance: u32,
    /// Modulation source selector
    pub mod_source: u32,
    /// Modulation depth (0-255)
    pub mod_amount: u32,
    /// Channel routing bitmask
    pub routing: u32,
}

/// Snapshot of the post-processing registers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectRegisters {
    /// Overdrive amount (0-255)
    pub overdrive: u32,
    /// Reverb mix (0-255)
    pub reverb_mix: u32,
    /// Reverb decay (0-255)
    pub reverb_decay: u32,
}

/// Lock-free register storage shared between writers and the renderer
#[derive(Debug)]
pub struct RegisterBank {
    slots: [AtomicU32; NUM_REGISTER_SLOTS],
}

impl RegisterBank {
    /// Create a register bank holding the power-on values
    pub fn new() -> Self {
        let bank = RegisterBank {
            slots: std::array::from_fn(|_| AtomicU32::new(0)),
        };
        bank.reset();
        bank
    }

    /// Restore power-on values
    pub fn reset(&self) {
        for slot in &self.slots {
            slot.store(0, Ordering::Relaxed);
        }
        for ch in ChannelId::ALL {
            self.store(
                Register::Channel(ch, ChannelRegister::Sustain),
                DEFAULT_SUSTAIN,
            );
        }
        self.store(
            Register::Channel(ChannelId::Square, ChannelRegister::Duty),
            DEFAULT_DUTY,
        );
        self.store(Register::FilterRouting, DEFAULT_FILTER_ROUTING);
    }

    /// Write a register by bus address. Unmapped addresses are ignored.
    pub fn write(&self, addr: u32, value: u32) {
        match Register::from_addr(addr) {
            Some(register) => self.store(register, value),
            None => tracing::warn!("invalid register address: {addr:#06X}"),
        }
    }

    /// Read a register by bus address (0 for unmapped addresses)
    pub fn read(&self, addr: u32) -> u32 {
        Register::from_addr(addr).map_or(0, |register| self.load(register))
    }

    /// Store a decoded register
    #[inline]
    pub fn store(&self, register: Register, value: u32) {
        self.slots[register.slot()].store(value, Ordering::Relaxed);
    }

    /// Load a decoded register
    #[inline]
    pub fn load(&self, register: Register) -> u32 {
        self.slots[register.slot()].load(Ordering::Relaxed)
    }

    /// Master control bits
    #[inline]
    pub fn audio_control(&self) -> AudioControl {
        AudioControl::from_bits_truncate(self.load(Register::AudioCtrl))
    }

    /// Raw envelope shape selector
    #[inline]
    pub fn envelope_shape(&self) -> u32 {
        self.load(Register::EnvShape)
    }

    /// Snapshot one channel's registers
    pub fn channel(&self, ch: ChannelId) -> ChannelRegisters {
        let reg = |r| self.load(Register::Channel(ch, r));
        ChannelRegisters {
            frequency: reg(ChannelRegister::Frequency),
            volume: reg(ChannelRegister::Volume),
            control: ChannelControl::from_bits_truncate(reg(ChannelRegister::Control)),
            attack: reg(ChannelRegister::Attack),
            decay: reg(ChannelRegister::Decay),
            sustain: reg(ChannelRegister::Sustain),
            release: reg(ChannelRegister::Release),
            sweep: reg(ChannelRegister::Sweep),
            sync_source: reg(ChannelRegister::SyncSource),
            ring_mod_source: reg(ChannelRegister::RingModSource),
            duty: reg(ChannelRegister::Duty),
            pwm_control: reg(ChannelRegister::PwmControl),
            noise_mode: reg(ChannelRegister::NoiseMode),
        }
    }

    /// Snapshot the filter registers
    pub fn filter(&self) -> FilterRegisters {
        FilterRegisters {
            filter_type: self.load(Register::FilterType),
            cutoff: self.load(Register::FilterCutoff),
            resonance: self.load(Register::FilterResonance),
            mod_source: self.load(Register::FilterModSource),
            mod_amount: self.load(Register::FilterModAmount),
            routing: self.load(Register::FilterRouting),
        }
    }

    /// Snapshot the post-processing registers
    pub fn effects(&self) -> EffectRegisters {
        EffectRegisters {
            overdrive: self.load(Register::Overdrive),
            reverb_mix: self.load(Register::ReverbMix),
            reverb_decay: self.load(Register::ReverbDecay),
        }
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_conversion() {
        assert_eq!(Register::from_addr(AUDIO_CTRL), Some(Register::AudioCtrl));
        assert_eq!(
            Register::from_addr(TRI_SUS),
            Some(Register::Channel(ChannelId::Triangle, ChannelRegister::Sustain))
        );
        assert_eq!(
            Register::from_addr(NOISE_SWEEP),
            Some(Register::Channel(ChannelId::Noise, ChannelRegister::Sweep))
        );
        assert_eq!(
            Register::from_addr(RING_MOD_SOURCE_CH0 + 8),
            Some(Register::Channel(ChannelId::Sine, ChannelRegister::RingModSource))
        );
        assert_eq!(Register::from_addr(SYNC_SOURCE_CH0 + 2), None);
        assert_eq!(Register::from_addr(0x1234), None);
    }

    #[test]
    fn test_address_round_trip_for_every_mapped_register() {
        let mut mapped = 0;
        for addr in 0xF800..=0xFAFF {
            if let Some(register) = Register::from_addr(addr) {
                assert_eq!(register.addr(), Some(addr), "{register}");
                mapped += 1;
            }
        }
        // 11 global + 4 x (7 block + sweep + sync + ring) + duty + pwm + mode
        assert_eq!(mapped, 11 + 4 * 10 + 3);
    }

    #[test]
    fn test_register_slots_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for addr in 0xF800..=0xFAFF {
            if let Some(register) = Register::from_addr(addr) {
                assert!(seen.insert(register.slot()), "duplicate slot for {register}");
                assert!(register.slot() < NUM_REGISTER_SLOTS);
            }
        }
    }

    #[test]
    fn test_register_bank_power_on_values() {
        let bank = RegisterBank::new();
        assert_eq!(bank.read(AUDIO_CTRL), 0);
        assert_eq!(bank.read(SQUARE_SUS), 255);
        assert_eq!(bank.read(NOISE_SUS), 255);
        assert_eq!(bank.read(SQUARE_DUTY), 128);
        assert_eq!(bank.read(FILTER_ROUTING), 0x08);
        assert!(!bank.audio_control().contains(AudioControl::ENABLE));
    }

    #[test]
    fn test_register_bank_last_write_wins() {
        let bank = RegisterBank::new();
        bank.write(SINE_FREQ, 220);
        bank.write(SINE_FREQ, 440);
        assert_eq!(bank.read(SINE_FREQ), 440);
        assert_eq!(bank.channel(ChannelId::Sine).frequency, 440);

        // Out-of-range values are stored untouched
        bank.write(FILTER_CUTOFF, 300);
        assert_eq!(bank.filter().cutoff, 300);
    }

    #[test]
    fn test_unmapped_write_changes_nothing() {
        let bank = RegisterBank::new();
        let before: Vec<u32> = bank.slots.iter().map(|s| s.load(Ordering::Relaxed)).collect();
        bank.write(0xF801, 0xFFFF_FFFF);
        bank.write(0x0000, 1);
        let after: Vec<u32> = bank.slots.iter().map(|s| s.load(Ordering::Relaxed)).collect();
        assert_eq!(before, after);
        assert_eq!(bank.read(0xF801), 0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let bank = RegisterBank::new();
        bank.write(AUDIO_CTRL, 1);
        bank.write(SQUARE_SUS, 10);
        bank.write(FILTER_ROUTING, 0x0F);
        bank.reset();
        assert_eq!(bank.read(AUDIO_CTRL), 0);
        assert_eq!(bank.read(SQUARE_SUS), 255);
        assert_eq!(bank.read(FILTER_ROUTING), 0x08);
    }

    #[test]
    fn test_control_bits() {
        assert!(ChannelControl::GATE.gate_high());
        assert!(!(ChannelControl::GATE | ChannelControl::FORCE_RELEASE).gate_high());
        assert!(!ChannelControl::from_bits_truncate(0xFC).gate_high());
    }

    #[test]
    fn test_source_selector() {
        assert_eq!(ChannelId::from_selector(0), None);
        assert_eq!(ChannelId::from_selector(1), Some(ChannelId::Square));
        assert_eq!(ChannelId::from_selector(4), Some(ChannelId::Noise));
        assert_eq!(ChannelId::from_selector(99), Some(ChannelId::Noise));
    }
}
