//! Offline rendering to audio files
//!
//! Renders a backend for a fixed number of samples and writes the result to
//! disk. Register writes must be issued before rendering (or from another
//! thread through the register bank while rendering runs).
//!
//! # Example
//!
//! ```no_run
//! use synthchip::export::{render_to_wav, ExportConfig};
//! use synthchip::soundchip::registers::*;
//! use synthchip::SoundChip;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut chip = SoundChip::new();
//! chip.write_register(AUDIO_CTRL, 1);
//! chip.write_register(TRI_FREQ, 220);
//! chip.write_register(TRI_VOL, 255);
//! chip.write_register(TRI_CTRL, 1);
//!
//! render_to_wav(&mut chip, 44_100 * 2, "triangle.wav", ExportConfig::stereo().fade_out(0.5))?;
//! # Ok(())
//! # }
//! ```

mod wav;
pub use wav::*;

/// Export configuration options
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Whether to normalize audio to prevent clipping
    pub normalize: bool,
    /// Fade out duration in seconds (0 = no fade)
    pub fade_out_duration: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            channels: 1,
            normalize: false,
            fade_out_duration: 0.0,
        }
    }
}

impl ExportConfig {
    /// Create config for stereo export
    pub fn stereo() -> Self {
        Self {
            channels: 2,
            ..Default::default()
        }
    }

    /// Enable normalization to leave headroom below full scale
    pub fn normalize(mut self, enable: bool) -> Self {
        self.normalize = enable;
        self
    }

    /// Add fade out at the end
    pub fn fade_out(mut self, duration_seconds: f32) -> Self {
        self.fade_out_duration = duration_seconds;
        self
    }
}

/// Headroom target for normalization
const NORMALIZE_PEAK: f32 = 0.95;

/// Scale samples down so the peak sits at 0.95. Quieter material is untouched.
fn normalize_samples(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > NORMALIZE_PEAK {
        let scale = NORMALIZE_PEAK / peak;
        for sample in samples.iter_mut() {
            *sample *= scale;
        }
    }
}

/// Apply a linear fade out to the end of audio samples
fn apply_fade_out(samples: &mut [f32], fade_duration: f32, sample_rate: u32) {
    if fade_duration <= 0.0 || samples.is_empty() {
        return;
    }

    let fade_samples = ((fade_duration * sample_rate as f32) as usize).max(1);
    let start_fade = samples.len().saturating_sub(fade_samples);

    for (i, sample) in samples.iter_mut().enumerate().skip(start_fade) {
        let progress = (i - start_fade) as f32 / fade_samples as f32;
        *sample *= 1.0 - progress;
    }
}
