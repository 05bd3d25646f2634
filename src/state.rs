//! Driver state visible to the application.

use crate::calibration::Calibration;

/// Bring-up and polling states of the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Issue a soft reset
    #[default]
    Reset,
    /// Waiting for the reset to complete
    Resetting,
    /// Issue stop-continuous-measurement
    Stop,
    /// Waiting for the sensor to go idle
    Stopping,
    /// Read scale factor, offset and flow unit
    ReadSettings,
    /// Issue start-continuous-measurement
    Start,
    /// Waiting for the first measurement
    Starting,
    /// Read and drop the first, unreliable frame
    DiscardPacket,
    /// Waiting for the next frame
    NewPacket,
    /// Streaming; flow is updated on every poll period
    Initialized,
    /// Stopped on request; left only through a restart
    NotInitialized,
}

impl State {
    /// Whether the flow value is currently being refreshed
    #[must_use]
    pub const fn is_initialized(self) -> bool {
        matches!(self, State::Initialized)
    }
}

/// The driver's view of one physical sensor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    pub(crate) state: State,
    pub(crate) error_count: u8,
    pub(crate) last_transition_ms: u32,
    pub(crate) last_sample_ms: Option<u32>,
    pub(crate) last_valid_sample_ms: u32,
    pub(crate) latest_flow: f32,
    pub(crate) calibration: Option<Calibration>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh session, starting in [`State::Reset`]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Reset,
            error_count: 0,
            last_transition_ms: 0,
            last_sample_ms: None,
            last_valid_sample_ms: 0,
            latest_flow: 0.0,
            calibration: None,
        }
    }

    /// Current state of the bring-up
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Consecutive bus failures since the last successful step
    #[must_use]
    pub const fn error_count(&self) -> u8 {
        self.error_count
    }

    /// Time of the last state transition, in ms
    #[must_use]
    pub const fn last_transition_ms(&self) -> u32 {
        self.last_transition_ms
    }

    /// Time of the last steady-state read attempt, in ms
    #[must_use]
    pub const fn last_sample_ms(&self) -> Option<u32> {
        self.last_sample_ms
    }

    /// Most recently decoded flow
    ///
    /// Kept across failed reads; only meaningful while [`State::Initialized`].
    #[must_use]
    pub const fn latest_flow(&self) -> f32 {
        self.latest_flow
    }

    /// Calibration from the last successful settings read
    #[must_use]
    pub const fn calibration(&self) -> Option<Calibration> {
        self.calibration
    }

    pub(crate) fn transition(&mut self, next: State, now: u32) {
        #[cfg(feature = "defmt")]
        defmt::debug!("{} -> {} at {} ms", self.state, next, now);

        self.state = next;
        self.last_transition_ms = now;
    }

    /// Record a successful step that moves the machine to `next`
    pub(crate) fn advance(&mut self, next: State, now: u32) {
        self.error_count = 0;
        self.transition(next, now);
    }

    pub(crate) fn record_failure(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}
