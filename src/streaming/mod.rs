//! Background rendering into a ring buffer
//!
//! A renderer thread clocks the chip ahead of the audio device and parks the
//! samples in a [`RingBuffer`]; the host's audio callback drains it. Memory use
//! is bounded by the ring buffer size regardless of how long the chip runs.

pub mod realtime;
pub mod ring_buffer;

pub use realtime::{PlaybackStats, RealtimeRenderer};
pub use ring_buffer::RingBuffer;

use crate::soundchip::DEFAULT_SAMPLE_RATE;
use crate::{Result, SoundChipError};

/// How long the renderer sleeps before retrying a full ring, in microseconds
pub const BUFFER_BACKOFF_MICROS: u64 = 100;

/// Ring and block sizing for a [`RealtimeRenderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Ring capacity in samples (rounded up to a power of two).
    /// This is the worst-case delay between a register write and hearing it.
    pub ring_buffer_size: usize,

    /// Samples the renderer produces per iteration
    pub block_size: usize,

    /// Must match the backend's sample rate
    pub sample_rate: u32,
}

impl StreamConfig {
    /// 4096-sample ring, 256-sample blocks (about 93 ms at 44.1 kHz).
    /// Gate changes are heard quickly; needs a responsive consumer.
    pub fn low_latency(sample_rate: u32) -> Self {
        Self {
            ring_buffer_size: 4096,
            block_size: 256,
            sample_rate,
        }
    }

    /// 16384-sample ring, 1024-sample blocks (about 372 ms at 44.1 kHz).
    /// Rides out scheduler hiccups at the cost of sluggish register response.
    pub fn stable(sample_rate: u32) -> Self {
        Self {
            ring_buffer_size: 16384,
            block_size: 1024,
            sample_rate,
        }
    }

    /// Worst-case ring latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.ring_buffer_size as f32 * 1000.0 / self.sample_rate as f32
    }

    /// Reject sizes the renderer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(SoundChipError::ConfigError("sample rate must be non-zero".into()));
        }
        if self.block_size == 0 {
            return Err(SoundChipError::ConfigError(
                "block size must be greater than 0".into(),
            ));
        }
        if self.block_size > self.ring_buffer_size {
            return Err(SoundChipError::ConfigError(format!(
                "block size {} larger than ring buffer {}",
                self.block_size, self.ring_buffer_size
            )));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::stable(DEFAULT_SAMPLE_RATE)
    }
}
