//! Register writes from other threads while the chip renders

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use synthchip::soundchip::registers::*;
use synthchip::SoundChip;

/// Tiny xorshift so writer threads produce varied values without a rand dep
fn xorshift(state: &mut u32) -> u32 {
    *state ^= *state << 13;
    *state ^= *state >> 17;
    *state ^= *state << 5;
    *state
}

#[test]
fn concurrent_writers_never_push_output_out_of_range() {
    let mut chip = SoundChip::new();
    let bank = chip.register_handle();
    bank.write(AUDIO_CTRL, 1);

    let done = Arc::new(AtomicBool::new(false));
    let addresses: Vec<u32> = (0..0x400).step_by(4).map(|off| 0xF800 + off).collect();
    let addresses = Arc::new(addresses);

    let writers: Vec<_> = (0..4u32)
        .map(|n| {
            let bank = Arc::clone(&bank);
            let done = Arc::clone(&done);
            let addresses = Arc::clone(&addresses);
            thread::spawn(move || {
                let mut state = 0x9E37_79B9 ^ (n + 1);
                let mut writes = 0u64;
                while !done.load(Ordering::Relaxed) {
                    let addr = addresses[xorshift(&mut state) as usize % addresses.len()];
                    // Mostly in-range values, sometimes garbage
                    let value = match xorshift(&mut state) % 4 {
                        0 => xorshift(&mut state),
                        _ => xorshift(&mut state) % 256,
                    };
                    bank.write(addr, value);
                    // Keep the chip enabled most of the time
                    bank.write(AUDIO_CTRL, 1);
                    writes += 1;
                }
                writes
            })
        })
        .collect();

    let mut block = vec![0.0; 1024];
    for _ in 0..200 {
        chip.generate_samples_into(&mut block);
        for &s in &block {
            assert!(s.is_finite());
            assert!((-1.0..=1.0).contains(&s), "sample {s} out of range");
        }
    }

    done.store(true, Ordering::Relaxed);
    let total: u64 = writers.into_iter().map(|w| w.join().unwrap()).sum();
    assert!(total > 0);
}

#[test]
fn writes_from_another_thread_are_observed() {
    let mut chip = SoundChip::new();
    let bank = chip.register_handle();

    thread::spawn(move || {
        bank.write(AUDIO_CTRL, 1);
        bank.write(SQUARE_FREQ, 440);
        bank.write(SQUARE_VOL, 255);
        bank.write(SQUARE_CTRL, 1);
    })
    .join()
    .unwrap();

    assert_eq!(chip.read_register(SQUARE_FREQ), 440);
    let samples = chip.generate_samples(1000);
    assert!(samples.iter().any(|&s| s.abs() > 0.2));
}

#[cfg(feature = "streaming")]
#[test]
fn realtime_renderer_survives_register_storm() {
    use std::time::{Duration, Instant};
    use synthchip::{RealtimeRenderer, StreamConfig};

    let chip = SoundChip::new();
    let bank = chip.register_handle();
    let renderer = RealtimeRenderer::spawn(chip, StreamConfig::low_latency(44_100)).unwrap();
    let buffer = renderer.buffer();

    let writer = {
        let bank = Arc::clone(&bank);
        thread::spawn(move || {
            let mut state = 12_345;
            let start = Instant::now();
            while start.elapsed() < Duration::from_millis(200) {
                bank.write(AUDIO_CTRL, 1);
                bank.write(SINE_FREQ, xorshift(&mut state) % 4000);
                bank.write(SINE_VOL, 255);
                bank.write(SINE_CTRL, xorshift(&mut state) & 1);
                bank.write(FILTER_CUTOFF, xorshift(&mut state) % 256);
                bank.write(REVERB_MIX, xorshift(&mut state) % 256);
            }
        })
    };

    let mut read = 0;
    let mut block = [0.0; 512];
    let start = Instant::now();
    while read < 16_384 {
        assert!(start.elapsed() < Duration::from_secs(10), "renderer stalled");
        let n = buffer.read(&mut block);
        assert!(block[..n].iter().all(|s| (-1.0..=1.0).contains(s)));
        read += n;
        if n == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }

    writer.join().unwrap();
    let chip = renderer.stop().unwrap();
    assert_eq!(chip.sample_rate(), 44_100);
}
