//! End-to-end rendering scenarios driven purely through register writes

use rustfft::{num_complex::Complex, FftPlanner};
use synthchip::soundchip::constants::filter_cutoff_hz;
use synthchip::soundchip::registers::*;
use synthchip::soundchip::{ChannelId, EnvelopeStage};
use synthchip::SoundChip;

const SR: u32 = 44_100;

/// Power spectrum of the last `len` samples (Hann window), bins 0..len/2
fn power_spectrum(samples: &[f32], len: usize) -> Vec<f64> {
    let segment = &samples[samples.len() - len..];
    let mut buf: Vec<Complex<f64>> = segment
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 - 0.5 * (std::f64::consts::TAU * i as f64 / len as f64).cos();
            Complex::new(s as f64 * w, 0.0)
        })
        .collect();
    FftPlanner::<f64>::new().plan_fft_forward(len).process(&mut buf);
    buf[..len / 2].iter().map(|c| c.norm_sqr()).collect()
}

fn bin_width(len: usize) -> f64 {
    SR as f64 / len as f64
}

/// Mean power per bin between two frequencies
fn band_density(power: &[f64], len: usize, from_hz: f64, to_hz: f64) -> f64 {
    let bw = bin_width(len);
    let lo = (from_hz / bw) as usize + 1;
    let hi = ((to_hz / bw) as usize + 1).min(power.len());
    power[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
}

fn band_energy(power: &[f64], len: usize, from_hz: f64, to_hz: f64) -> f64 {
    let bw = bin_width(len);
    let lo = (from_hz / bw) as usize + 1;
    let hi = ((to_hz / bw) as usize + 1).min(power.len());
    power[lo..hi].iter().sum()
}

#[test]
fn sine_440_renders_steady_tone_from_phase_zero() {
    let mut chip = SoundChip::new();
    chip.write_register(AUDIO_CTRL, 1);
    chip.write_register(SINE_FREQ, 440);
    chip.write_register(SINE_VOL, 255);
    chip.write_register(SINE_ATK, 0);
    chip.write_register(SINE_DEC, 0);
    chip.write_register(SINE_SUS, 255);
    chip.write_register(SINE_REL, 0);
    chip.write_register(SINE_CTRL, 1);

    let samples = chip.generate_samples(SR as usize);

    // Starts at phase 0: no click on the first sample
    assert_eq!(samples[0], 0.0);

    // No discontinuity anywhere: slope bounded by a full-scale 440 Hz sine
    let max_step = 0.25 * std::f32::consts::TAU * 440.0 / SR as f32;
    for pair in samples.windows(2) {
        assert!((pair[1] - pair[0]).abs() <= max_step * 1.01);
    }

    // Full amplitude once the 1 ms attack is over
    let peak = samples[1000..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!((peak - 0.25).abs() < 1e-3, "peak {peak}");

    // 440 Hz: 880 zero crossings per second
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
        .count();
    assert!((878..=882).contains(&crossings), "{crossings} crossings");

    let len = 32_768;
    let power = power_spectrum(&samples, len);
    let peak_bin = (1..power.len())
        .max_by(|&a, &b| power[a].total_cmp(&power[b]))
        .unwrap();
    let peak_hz = peak_bin as f64 * bin_width(len);
    assert!((peak_hz - 440.0).abs() < 2.0, "spectral peak at {peak_hz} Hz");

    assert_eq!(chip.channel(ChannelId::Sine).envelope().stage(), EnvelopeStage::Sustain);
}

#[test]
fn filtered_white_noise_concentrates_below_resonant_cutoff() {
    let mut chip = SoundChip::new();
    chip.write_register(AUDIO_CTRL, 1);
    chip.write_register(NOISE_MODE, 0);
    chip.write_register(NOISE_FREQ, 8000);
    chip.write_register(NOISE_SWEEP, 0);
    chip.write_register(NOISE_VOL, 255);
    chip.write_register(FILTER_TYPE, 1);
    chip.write_register(FILTER_CUTOFF, 64);
    chip.write_register(FILTER_RESONANCE, 220);
    chip.write_register(NOISE_CTRL, 1);

    let samples = chip.generate_samples(2 * SR as usize);
    assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0));

    let fc = filter_cutoff_hz(64.0, SR as f64);
    let len = 65_536;
    let power = power_spectrum(&samples, len);
    let total: f64 = power[1..].iter().sum();

    // Energy sits below the corner
    let below = band_energy(&power, len, 0.0, 2.0 * fc);
    assert!(below / total > 0.9, "only {:.3} of energy below 2*fc", below / total);

    // Resonant bump at the corner, well above the passband
    let at_peak = band_density(&power, len, 0.8 * fc, 1.25 * fc);
    let passband = band_density(&power, len, 0.2 * fc, 0.5 * fc);
    let stopband = band_density(&power, len, 4.0 * fc, 8.0 * fc);
    assert!(at_peak > 3.0 * passband, "peak {at_peak} passband {passband}");
    assert!(stopband < passband / 100.0, "stopband {stopband} passband {passband}");

    // Smoothed spectral maximum lands near the mapped cutoff
    let bw = bin_width(len);
    let smoothed = |k: usize| power[k - 20..=k + 20].iter().sum::<f64>();
    let search = (30.0 / bw) as usize..(2000.0 / bw) as usize;
    let peak_bin = search.max_by(|&a, &b| smoothed(a).total_cmp(&smoothed(b))).unwrap();
    let peak_hz = peak_bin as f64 * bw;
    assert!(
        peak_hz > 0.7 * fc && peak_hz < 1.4 * fc,
        "resonant peak at {peak_hz} Hz, cutoff {fc} Hz"
    );
}

#[test]
fn identical_register_histories_render_identical_output() {
    let render = || {
        let mut chip = SoundChip::new();
        chip.write_register(AUDIO_CTRL, 1);
        chip.write_register(SQUARE_FREQ, 180);
        chip.write_register(SQUARE_VOL, 200);
        chip.write_register(SQUARE_PWM_CTRL, 0x80 | 30);
        chip.write_register(SQUARE_DUTY, 128 | (90 << 8));
        chip.write_register(NOISE_FREQ, 12_000);
        chip.write_register(NOISE_VOL, 255);
        chip.write_register(NOISE_MODE, 2);
        chip.write_register(NOISE_SWEEP, 0x80 | 0x02 | (50 << 8));
        chip.write_register(FILTER_TYPE, 3);
        chip.write_register(FILTER_MOD_SOURCE, 1);
        chip.write_register(FILTER_MOD_AMOUNT, 40);
        chip.write_register(REVERB_MIX, 80);
        chip.write_register(SQUARE_CTRL, 1);
        chip.write_register(NOISE_CTRL, 1);
        let mut out = chip.generate_samples(10_000);
        chip.write_register(SQUARE_CTRL, 0);
        chip.write_register(NOISE_MODE, 1);
        out.extend(chip.generate_samples(10_000));
        out
    };
    let a = render();
    let b = render();
    assert_eq!(a.len(), b.len());
    assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    assert!(a.iter().any(|&s| s != 0.0));
}

#[test]
fn gate_off_mid_attack_releases_without_jump() {
    let mut chip = SoundChip::new();
    chip.write_register(AUDIO_CTRL, 1);
    chip.write_register(TRI_FREQ, 200);
    chip.write_register(TRI_VOL, 255);
    chip.write_register(TRI_ATK, 180);
    chip.write_register(TRI_REL, 120);
    chip.write_register(TRI_CTRL, 1);
    chip.generate_samples(2000);

    let level_at_gate_off = chip.channel(ChannelId::Triangle).envelope().level();
    assert!(level_at_gate_off > 0.0 && level_at_gate_off < 1.0);
    chip.write_register(TRI_CTRL, 0);

    let mut previous = level_at_gate_off;
    for _ in 0..200_000 {
        chip.clock();
        let env = chip.channel(ChannelId::Triangle).envelope();
        assert!(env.level() <= previous);
        previous = env.level();
        if env.stage() == EnvelopeStage::Idle {
            break;
        }
    }
    assert_eq!(previous, 0.0);
    assert!(!chip.channel(ChannelId::Triangle).is_enabled());
}

#[test]
fn noise_sweep_glides_up_to_nyquist() {
    let mut chip = SoundChip::new();
    chip.write_register(AUDIO_CTRL, 1);
    chip.write_register(NOISE_FREQ, 1000);
    chip.write_register(NOISE_VOL, 255);
    // Up, shift 1, every sample
    chip.write_register(NOISE_SWEEP, 0x80 | 0x08 | 0x01 | (1 << 8));
    chip.write_register(NOISE_CTRL, 1);

    let mut trajectory = Vec::new();
    for _ in 0..10 {
        chip.clock();
        trajectory.push(chip.channel(ChannelId::Noise).working_frequency());
    }
    assert_eq!(
        trajectory,
        vec![1500, 2250, 3375, 5062, 7593, 11389, 17083, 22050, 22050, 22050]
    );
}

#[test]
fn chip_disable_freezes_all_units() {
    let mut chip = SoundChip::new();
    chip.write_register(AUDIO_CTRL, 1);
    chip.write_register(SINE_FREQ, 440);
    chip.write_register(SINE_VOL, 255);
    chip.write_register(SINE_CTRL, 1);
    chip.generate_samples(100);
    let level = chip.channel(ChannelId::Sine).envelope().level();

    chip.write_register(AUDIO_CTRL, 0);
    let silent = chip.generate_samples(1000);
    assert!(silent.iter().all(|&s| s == 0.0));
    assert_eq!(chip.channel(ChannelId::Sine).envelope().level(), level);
}

#[test]
fn periodic_noise_repeats_every_127_steps() {
    let mut chip = SoundChip::new();
    chip.write_register(AUDIO_CTRL, 1);
    chip.write_register(NOISE_MODE, 1);
    // One LFSR step per sample
    chip.write_register(NOISE_FREQ, SR);
    chip.write_register(NOISE_VOL, 255);
    chip.write_register(NOISE_ATK, 0);
    chip.write_register(FILTER_ROUTING, 0);
    chip.write_register(NOISE_CTRL, 1);

    let samples = chip.generate_samples(2000);
    let steady = &samples[500..];
    for i in 0..steady.len() - 127 {
        assert_eq!(steady[i], steady[i + 127]);
    }
}

/// RMS of `samples` over `half` samples either side of each centre
fn windowed_rms(samples: &[f32], centres: impl Iterator<Item = usize>, half: usize) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for centre in centres {
        for &s in &samples[centre - half..centre + half] {
            sum += s as f64 * s as f64;
            count += 1;
        }
    }
    (sum / count as f64).sqrt()
}

/// Wideband noise through the low-pass, cutoff swept by a 2 Hz sine that is never gated
fn lfo_filtered_noise(mod_amount: u32) -> Vec<f32> {
    let mut chip = SoundChip::new();
    chip.write_register(AUDIO_CTRL, 1);
    chip.write_register(SINE_FREQ, 2);
    chip.write_register(NOISE_MODE, 0);
    chip.write_register(NOISE_FREQ, SR);
    chip.write_register(NOISE_VOL, 255);
    chip.write_register(NOISE_ATK, 0);
    chip.write_register(NOISE_DEC, 0);
    chip.write_register(NOISE_SUS, 255);
    chip.write_register(FILTER_ROUTING, 0x08);
    chip.write_register(FILTER_TYPE, 1);
    chip.write_register(FILTER_CUTOFF, 128);
    chip.write_register(FILTER_RESONANCE, 0);
    chip.write_register(FILTER_MOD_SOURCE, 3);
    chip.write_register(FILTER_MOD_AMOUNT, mod_amount);
    chip.write_register(NOISE_CTRL, 1);
    chip.generate_samples(4 * SR as usize)
}

#[test]
fn cutoff_modulation_makes_noise_level_follow_lfo() {
    let period = SR as usize / 2;
    let crests = || (0..8).map(|k| period / 4 + k * period);
    let troughs = || (0..7).map(|k| 3 * period / 4 + k * period);

    let swept = lfo_filtered_noise(127);
    assert!(swept.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    let open = windowed_rms(&swept, crests(), 1500);
    let closed = windowed_rms(&swept, troughs(), 1500);
    assert!(open > 5.0 * closed, "open {open} closed {closed}");

    // Same setup without modulation: level does not track the sine
    let steady = lfo_filtered_noise(0);
    let a = windowed_rms(&steady, crests(), 1500);
    let b = windowed_rms(&steady, troughs(), 1500);
    assert!(a / b > 0.5 && a / b < 2.0, "unmodulated {a} vs {b}");
}
