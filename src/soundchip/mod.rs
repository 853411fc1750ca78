//! Sound chip core
//!
//! Register bank, signal generators, envelope, sweep, filter, effects and the
//! per-sample render loop.

pub mod channel;
pub mod chip;
pub mod constants;
pub mod effects;
pub mod envelope;
pub mod filter;
pub mod mixer;
pub mod noise;
pub mod oscillator;
pub mod registers;
pub mod sweep;

pub use channel::{Channel, Generator};
pub use chip::SoundChip;
pub use constants::{DEFAULT_SAMPLE_RATE, NUM_CHANNELS};
pub use envelope::{Envelope, EnvelopeShape, EnvelopeStage};
pub use filter::{FilterType, StateVariableFilter};
pub use mixer::Mixer;
pub use noise::{NoiseGenerator, NoiseMode};
pub use oscillator::{Oscillator, Waveform};
pub use registers::{AudioControl, ChannelControl, ChannelId, Register, RegisterBank};
pub use sweep::{Sweep, SweepDirection, SweepUnit};
