//! Background renderer thread
//!
//! Owns a backend on a dedicated thread and keeps the ring buffer topped up.
//! Register writes reach the chip through its lock-free register bank, so the
//! renderer never waits on writers; it only sleeps when the buffer is full.

use super::{RingBuffer, StreamConfig, BUFFER_BACKOFF_MICROS};
use crate::backend::SoundChipBackend;
use crate::{Result, SoundChipError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Renderer statistics for monitoring buffer health
#[derive(Debug, Clone, Default)]
pub struct PlaybackStats {
    /// Blocks that found the buffer full and had to wait
    pub overrun_count: usize,
    /// Samples rendered so far
    pub samples_rendered: usize,
    /// Buffer fill after the last block (0.0 to 1.0)
    pub fill_percentage: f32,
}

/// Handle to a running renderer thread
///
/// Dropping the handle stops the thread.
pub struct RealtimeRenderer<B: SoundChipBackend + 'static> {
    buffer: Arc<RingBuffer>,
    config: StreamConfig,
    stats: Arc<Mutex<PlaybackStats>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<B>>,
}

impl<B: SoundChipBackend + 'static> RealtimeRenderer<B> {
    /// Move `backend` onto a new renderer thread
    ///
    /// # Errors
    ///
    /// Fails if the config's sample rate does not match the backend, if the
    /// config fails [`StreamConfig::validate`], if the ring buffer cannot be
    /// allocated or if the thread cannot be spawned.
    pub fn spawn(backend: B, config: StreamConfig) -> Result<Self> {
        if backend.sample_rate() != config.sample_rate {
            return Err(SoundChipError::ConfigError(format!(
                "stream sample rate {} Hz does not match chip sample rate {} Hz",
                config.sample_rate,
                backend.sample_rate()
            )));
        }
        config.validate()?;

        let buffer = Arc::new(RingBuffer::new(config.ring_buffer_size)?);
        let stats = Arc::new(Mutex::new(PlaybackStats::default()));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let buffer = Arc::clone(&buffer);
            let stats = Arc::clone(&stats);
            let stop = Arc::clone(&stop);
            let block_size = config.block_size;
            std::thread::Builder::new()
                .name("synthchip-render".into())
                .spawn(move || render_loop(backend, &buffer, &stats, &stop, block_size))?
        };

        tracing::info!(
            sample_rate = config.sample_rate,
            ring_buffer_size = buffer.capacity(),
            latency_ms = config.latency_ms(),
            "renderer started"
        );

        Ok(RealtimeRenderer {
            buffer,
            config,
            stats,
            stop,
            handle: Some(handle),
        })
    }

    /// Ring buffer for the audio callback to drain
    pub fn buffer(&self) -> Arc<RingBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Current renderer statistics
    pub fn stats(&self) -> PlaybackStats {
        self.stats.lock().clone()
    }

    /// Get the stream configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Get buffer latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        self.config.latency_ms()
    }

    /// True while the renderer thread is alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the thread and hand the backend back
    pub fn stop(mut self) -> Result<B> {
        self.shutdown()
            .unwrap_or_else(|| Err(SoundChipError::Other("renderer already stopped".into())))
    }

    fn shutdown(&mut self) -> Option<Result<B>> {
        self.stop.store(true, Ordering::Release);
        let handle = self.handle.take()?;
        Some(
            handle
                .join()
                .map_err(|_| SoundChipError::Other("renderer thread panicked".into())),
        )
    }
}

impl<B: SoundChipBackend + 'static> Drop for RealtimeRenderer<B> {
    fn drop(&mut self) {
        if let Some(Err(e)) = self.shutdown() {
            tracing::warn!("renderer shutdown failed: {e}");
        }
    }
}

impl<B: SoundChipBackend + 'static> std::fmt::Debug for RealtimeRenderer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeRenderer")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn render_loop<B: SoundChipBackend>(
    mut backend: B,
    buffer: &RingBuffer,
    stats: &Mutex<PlaybackStats>,
    stop: &AtomicBool,
    block_size: usize,
) -> B {
    let mut block = vec![0.0; block_size];

    'render: while !stop.load(Ordering::Acquire) {
        backend.generate_samples_into(&mut block);

        let mut offset = 0;
        let mut stalled = false;
        while offset < block.len() {
            let written = buffer.write(&block[offset..]);
            offset += written;
            if written > 0 {
                continue;
            }
            if !stalled {
                stalled = true;
                stats.lock().overrun_count += 1;
                tracing::debug!(fill = buffer.fill_percentage(), "ring buffer full, renderer waiting");
            }
            if stop.load(Ordering::Acquire) {
                break 'render;
            }
            std::thread::sleep(Duration::from_micros(BUFFER_BACKOFF_MICROS));
        }

        let mut stats = stats.lock();
        stats.samples_rendered += block.len();
        stats.fill_percentage = buffer.fill_percentage();
    }

    tracing::info!(
        samples_rendered = stats.lock().samples_rendered,
        "renderer stopped"
    );
    backend
}
