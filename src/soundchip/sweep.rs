//! Frequency sweep unit
//!
//! Every `period` samples the working frequency moves by `freq >> shift`, up or
//! down, giving the classic siren and laser glides without host involvement.

/// SWEEP register layout
pub const SWEEP_SHIFT_MASK: u32 = 0x07;
/// Direction bit (1 = up)
pub const SWEEP_DIRECTION_UP: u32 = 0x08;
/// Enable bit
pub const SWEEP_ENABLE: u32 = 0x80;
/// Period field position (bits 8-23)
pub const SWEEP_PERIOD_SHIFT: u32 = 8;
/// Period field width mask (after shifting)
pub const SWEEP_PERIOD_MASK: u32 = 0xFFFF;

/// Sweep direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    /// Frequency rises
    Up,
    /// Frequency falls
    Down,
}

/// Decoded sweep settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sweep {
    /// No sweeping
    #[default]
    Disabled,
    /// Step every `period` samples by `freq >> shift`
    Active {
        /// Samples between steps (never 0)
        period: u32,
        /// Step direction
        direction: SweepDirection,
        /// Step size as a right shift of the current frequency (0-7)
        shift: u32,
    },
}

impl Sweep {
    /// Decode a SWEEP register. A clear enable bit or a zero period disables the unit.
    pub fn from_register(value: u32) -> Self {
        let period = (value >> SWEEP_PERIOD_SHIFT) & SWEEP_PERIOD_MASK;
        if value & SWEEP_ENABLE == 0 || period == 0 {
            return Sweep::Disabled;
        }
        let direction = if value & SWEEP_DIRECTION_UP != 0 {
            SweepDirection::Up
        } else {
            SweepDirection::Down
        };
        Sweep::Active {
            period,
            direction,
            shift: value & SWEEP_SHIFT_MASK,
        }
    }

    /// Encode back into register form
    pub fn to_register(self) -> u32 {
        match self {
            Sweep::Disabled => 0,
            Sweep::Active {
                period,
                direction,
                shift,
            } => {
                let dir = match direction {
                    SweepDirection::Up => SWEEP_DIRECTION_UP,
                    SweepDirection::Down => 0,
                };
                SWEEP_ENABLE
                    | dir
                    | (shift & SWEEP_SHIFT_MASK)
                    | ((period & SWEEP_PERIOD_MASK) << SWEEP_PERIOD_SHIFT)
            }
        }
    }
}

/// Sweep state for one channel
#[derive(Clone, Debug, Default)]
pub struct SweepUnit {
    sweep: Sweep,
    counter: u32,
}

impl SweepUnit {
    /// Create a disabled sweep unit
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply new settings. The step counter restarts when the settings change.
    #[inline]
    pub fn configure(&mut self, sweep: Sweep) {
        if sweep != self.sweep {
            self.sweep = sweep;
            self.counter = 0;
        }
    }

    /// Current settings
    #[inline]
    pub fn sweep(&self) -> Sweep {
        self.sweep
    }

    /// Advance one sample and return the (possibly updated) working frequency.
    ///
    /// Results are clamped to `[1, sample_rate / 2]`. A frequency of 0 is left alone.
    pub fn tick(&mut self, frequency: u32, sample_rate: u32) -> u32 {
        let Sweep::Active {
            period,
            direction,
            shift,
        } = self.sweep
        else {
            return frequency;
        };

        self.counter += 1;
        if self.counter < period {
            return frequency;
        }
        self.counter = 0;

        if frequency == 0 {
            return 0;
        }

        let delta = frequency >> shift;
        let next = match direction {
            SweepDirection::Up => frequency.saturating_add(delta),
            SweepDirection::Down => frequency - delta,
        };
        next.clamp(1, (sample_rate / 2).max(1))
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.sweep = Sweep::Disabled;
        self.counter = 0;
    }
}
