//! WAV file export

use super::{apply_fade_out, normalize_samples, ExportConfig};
use crate::backend::SoundChipBackend;
use crate::{Result, SoundChipError};
use std::path::Path;

/// Render `sample_count` samples from `backend` into a 16-bit PCM WAV file
///
/// The backend keeps running from its current state; registers should be set
/// up beforehand.
pub fn render_to_wav<B, P>(
    backend: &mut B,
    sample_count: usize,
    output_path: P,
    config: ExportConfig,
) -> Result<()>
where
    B: SoundChipBackend + ?Sized,
    P: AsRef<Path>,
{
    if !(1..=2).contains(&config.channels) {
        return Err(SoundChipError::ConfigError(format!(
            "unsupported channel count {}",
            config.channels
        )));
    }

    let sample_rate = backend.sample_rate();
    tracing::info!(
        samples = sample_count,
        seconds = sample_count as f32 / sample_rate as f32,
        "rendering"
    );
    let mut samples = backend.generate_samples(sample_count);

    if config.normalize {
        normalize_samples(&mut samples);
    }
    if config.fade_out_duration > 0.0 {
        apply_fade_out(&mut samples, config.fade_out_duration, sample_rate);
    }

    write_pcm16(output_path.as_ref(), &samples, sample_rate, config.channels)?;
    tracing::info!(path = %output_path.as_ref().display(), "export complete");
    Ok(())
}

/// Quantize to signed 16-bit, saturating outside [-1, 1]
fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

fn wav_error(stage: &str) -> impl Fn(hound::Error) -> SoundChipError + '_ {
    move |e| SoundChipError::AudioFileError(format!("WAV {stage} failed: {e}"))
}

/// Write a mono signal as `channels` identical interleaved channels
fn write_pcm16(path: &Path, mono: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error("create"))?;

    for &sample in mono {
        let pcm = to_pcm16(sample);
        for _ in 0..channels {
            writer.write_sample(pcm).map_err(wav_error("write"))?;
        }
    }
    writer.finalize().map_err(wav_error("finalize"))
}
