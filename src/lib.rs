//! Register-driven four channel synthesizer chip
//!
//! An emulator of a programmable sound chip: square, triangle, sine and noise
//! voices, each with its own ADSR envelope and frequency sweep, plus ring
//! modulation, hard sync, a shared resonant filter, overdrive and reverb. Client
//! code (CPU emulators, music players, test harnesses) drives the chip purely by
//! writing 32-bit values to registers; the chip renders one output sample per
//! tick from whatever those registers currently say.
//!
//! # Features
//! - Sample-accurate render loop (registers are re-read every sample)
//! - Lock-free register bank shared between writer threads and the renderer
//! - Deterministic LFSR noise in white, periodic and metallic modes
//! - Chamberlin state-variable filter with cutoff modulation from any channel
//! - Square pulse-width modulation, hard sync and ring modulation
//! - Overdrive and Schroeder reverb on the mixed output
//!
//! # Crate feature flags
//! - `streaming` (default): background renderer thread and ring buffer (`streaming`)
//! - `export-wav` (opt-in): offline rendering to WAV files (enables optional `hound` dep)
//!
//! # Quick start
//! ## Render samples directly
//! ```
//! use synthchip::soundchip::registers::*;
//! use synthchip::SoundChip;
//!
//! let mut chip = SoundChip::new();
//! chip.write_register(AUDIO_CTRL, 1);
//! chip.write_register(SINE_FREQ, 440);
//! chip.write_register(SINE_VOL, 255);
//! chip.write_register(SINE_CTRL, 1); // gate on
//! let audio = chip.generate_samples(44_100);
//! assert_eq!(audio.len(), 44_100);
//! ```
//!
//! ## Background rendering
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use synthchip::soundchip::registers::{AUDIO_CTRL, NOISE_CTRL, NOISE_FREQ, NOISE_VOL};
//! use synthchip::{RealtimeRenderer, SoundChip, StreamConfig};
//!
//! let chip = SoundChip::new();
//! let registers = chip.register_handle();
//! let renderer = RealtimeRenderer::spawn(chip, StreamConfig::low_latency(44_100)).unwrap();
//!
//! registers.write(AUDIO_CTRL, 1);
//! registers.write(NOISE_FREQ, 8000);
//! registers.write(NOISE_VOL, 255);
//! registers.write(NOISE_CTRL, 1);
//!
//! let mut block = vec![0.0; 512];
//! let read = renderer.buffer().read(&mut block);
//! # let _ = read;
//! # }
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod config;
#[cfg(feature = "export-wav")]
pub mod export; // Offline rendering
pub mod soundchip;
#[cfg(feature = "streaming")]
pub mod streaming; // Background rendering

/// Error types for sound chip operations
#[derive(thiserror::Error, Debug)]
pub enum SoundChipError {
    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for SoundChipError {
    /// Converts a String into `SoundChipError::Other`.
    ///
    /// Prefer the specific variants (`ConfigError`, `AudioFileError`) where the
    /// failure has a known category.
    fn from(msg: String) -> Self {
        SoundChipError::Other(msg)
    }
}

impl From<&str> for SoundChipError {
    /// Converts a string slice into `SoundChipError::Other`.
    fn from(msg: &str) -> Self {
        SoundChipError::Other(msg.to_string())
    }
}

/// Result type for sound chip operations
pub type Result<T> = std::result::Result<T, SoundChipError>;

// Public API exports
pub use backend::SoundChipBackend;
pub use config::ChipConfig;
#[cfg(feature = "export-wav")]
pub use export::{render_to_wav, ExportConfig};
pub use soundchip::{ChannelId, RegisterBank, SoundChip};
#[cfg(feature = "streaming")]
pub use streaming::{PlaybackStats, RealtimeRenderer, RingBuffer, StreamConfig};
