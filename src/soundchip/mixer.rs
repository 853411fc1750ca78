//! Mixer and output stage
//!
//! Voices are split into a dry bus and a filter bus according to
//! FILTER_ROUTING, then recombined, scaled and clipped.

use super::constants::{CHANNEL_MIX_LEVEL, NUM_CHANNELS};

/// Host-side state per channel
#[derive(Clone, Debug, Default)]
pub struct ChannelState {
    /// User mute flag
    pub muted: bool,
    /// Last post-envelope output (for visualization)
    pub last_output: f32,
}

/// Dry and filtered bus sums for one sample
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Buses {
    /// Channels not routed through the filter
    pub dry: f32,
    /// Channels routed through the filter
    pub filtered: f32,
}

/// Audio mixer
#[derive(Clone, Debug)]
pub struct Mixer {
    /// Per-channel state
    pub channels: [ChannelState; NUM_CHANNELS],
    master_gain: f32,
}

impl Mixer {
    /// Create a mixer with the given master gain
    pub fn new(master_gain: f32) -> Self {
        Self {
            channels: Default::default(),
            master_gain,
        }
    }

    /// Master gain applied after summing
    #[inline]
    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Change the master gain
    #[inline]
    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
    }

    /// Sort post-envelope voices onto the two buses.
    ///
    /// Bit `n` of `routing` sends channel `n` to the filter bus. Muted channels
    /// are dropped and meter as silence.
    pub fn route(&mut self, voices: &[f32; NUM_CHANNELS], routing: u32) -> Buses {
        let mut buses = Buses::default();
        for (i, (&voice, state)) in voices.iter().zip(self.channels.iter_mut()).enumerate() {
            let voice = if state.muted { 0.0 } else { voice };
            state.last_output = voice;
            if routing & (1 << i) != 0 {
                buses.filtered += voice;
            } else {
                buses.dry += voice;
            }
        }
        buses
    }

    /// Recombine the buses and apply the channel mix level and master gain
    #[inline]
    pub fn mix(&self, dry: f32, filtered: f32) -> f32 {
        (dry + filtered) * CHANNEL_MIX_LEVEL * self.master_gain
    }

    /// Hard clip to the output range
    #[inline]
    pub fn clip(sample: f32) -> f32 {
        sample.clamp(-1.0, 1.0)
    }

    /// Get the last output levels for all channels
    #[inline]
    pub fn channel_outputs(&self) -> [f32; NUM_CHANNELS] {
        std::array::from_fn(|i| self.channels[i].last_output)
    }

    /// Set mute state for a channel
    #[inline]
    pub fn set_mute(&mut self, channel: usize, muted: bool) {
        if let Some(state) = self.channels.get_mut(channel) {
            state.muted = muted;
        }
    }

    /// Check if channel is muted
    #[inline]
    pub fn is_muted(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(|c| c.muted)
    }

    /// Clear metering (mute flags are host settings and survive)
    pub fn reset(&mut self) {
        for state in &mut self.channels {
            state.last_output = 0.0;
        }
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_splits_buses() {
        let mut mixer = Mixer::default();
        let buses = mixer.route(&[0.1, 0.2, 0.3, 0.4], 0b1010);
        assert!((buses.dry - 0.4).abs() < 1e-6);
        assert!((buses.filtered - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_muted_channel_is_silent_and_meters_zero() {
        let mut mixer = Mixer::default();
        mixer.set_mute(2, true);
        assert!(mixer.is_muted(2));
        let buses = mixer.route(&[0.5, 0.5, 0.5, 0.5], 0);
        assert_eq!(buses.dry, 1.5);
        assert_eq!(mixer.channel_outputs(), [0.5, 0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_out_of_range_channel_is_ignored() {
        let mut mixer = Mixer::default();
        mixer.set_mute(9, true);
        assert!(!mixer.is_muted(9));
    }

    #[test]
    fn test_full_scale_voices_sum_to_unity() {
        let mixer = Mixer::default();
        assert_eq!(mixer.mix(2.0, 2.0), 1.0);
        let loud = Mixer::new(2.0);
        assert_eq!(Mixer::clip(loud.mix(4.0, 0.0)), 1.0);
        assert_eq!(Mixer::clip(-3.0), -1.0);
    }

    #[test]
    fn test_reset_keeps_mutes() {
        let mut mixer = Mixer::default();
        mixer.set_mute(0, true);
        mixer.route(&[0.0, 1.0, 0.0, 0.0], 0);
        mixer.reset();
        assert!(mixer.is_muted(0));
        assert_eq!(mixer.channel_outputs(), [0.0; 4]);
    }
}
