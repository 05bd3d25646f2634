//! Non-blocking polling driver for the SFM3019 flow sensor

use embedded_hal::i2c::I2c;

use crate::{
    bus,
    calibration::{Calibration, SETTINGS_REPLY_LEN},
    clock::{self, Clock},
    command::{self, Command},
    config::Config,
    error::Error,
    flow::{RawSample, SAMPLE_LEN},
    state::{Session, State},
};

/// SFM3019 driver instance (polling)
///
/// Bring-up and measurement run as a state machine advanced by
/// [`Self::poll`]; no call ever blocks waiting for the sensor.
#[derive(Debug)]
pub struct Sfm3019<I2C, C> {
    i2c: I2C,
    clock: C,
    config: Config,
    session: Session,
}

impl<I2C, C, E> Sfm3019<I2C, C>
where
    I2C: I2c<Error = E>,
    C: Clock,
{
    /// Create a new driver with the default configuration
    pub fn new(i2c: I2C, clock: C) -> Self {
        Self::with_config(i2c, clock, Config::default())
    }

    /// Create a new driver instance
    pub fn with_config(i2c: I2C, clock: C, config: Config) -> Self {
        Self {
            i2c,
            clock,
            config,
            session: Session::new(),
        }
    }

    /// Release the I2C bus, consuming the driver
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Configuration the driver was created with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Session state as last left by [`Self::poll`]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current state of the bring-up
    pub fn state(&self) -> State {
        self.session.state
    }

    /// Consecutive bus failures since the last successful step
    pub fn error_count(&self) -> u8 {
        self.session.error_count
    }

    /// Calibration read during the last bring-up
    pub fn calibration(&self) -> Option<Calibration> {
        self.session.calibration
    }

    /// Most recently decoded flow, kept across failed reads
    pub fn latest_flow(&self) -> f32 {
        self.session.latest_flow
    }

    /// Latest flow, if the driver is streaming
    pub fn flow(&self) -> Option<f32> {
        self.session
            .state
            .is_initialized()
            .then_some(self.session.latest_flow)
    }

    /// Advance the state machine by one step
    ///
    /// Performs at most one command/response exchange with the sensor and
    /// returns the resulting state. Call at least once per millisecond for
    /// the bring-up to progress at full speed.
    pub fn poll(&mut self) -> State {
        let now = self.clock.now_ms();

        match self.session.state {
            State::Reset => {
                self.issue(&command::encode(Command::SoftReset), State::Resetting, now);
            }
            State::Resetting => {
                self.advance_after(self.config.reset_delay_ms, State::Stop, now);
            }
            State::Stop => {
                let frame = command::encode(Command::StopContinuousMeasurement);
                self.issue(&frame, State::Stopping, now);
            }
            State::Stopping => {
                self.advance_after(self.config.stop_delay_ms, State::ReadSettings, now);
            }
            State::ReadSettings => match self.read_calibration() {
                Ok(calibration) => {
                    #[cfg(feature = "defmt")]
                    defmt::info!(
                        "scale factor: {}, offset: {}, flow unit: 0x{:04X}",
                        calibration.scale_factor(),
                        calibration.offset(),
                        calibration.flow_unit().raw()
                    );

                    self.session.calibration = Some(calibration);
                    self.session.advance(State::Start, now);
                }
                Err(error) => self.fail(&error),
            },
            State::Start => {
                let frame = self.config.gas_mode.start_frame();
                self.issue(frame.as_bytes(), State::Starting, now);
            }
            State::Starting => {
                self.advance_after(self.config.start_delay_ms, State::DiscardPacket, now);
            }
            State::DiscardPacket => match self.read_sample() {
                Ok(_) => self.session.advance(State::NewPacket, now),
                Err(error) => {
                    self.fail(&error);
                    self.session.transition(State::NewPacket, now);
                }
            },
            State::NewPacket => {
                if self.advance_after(self.config.first_sample_delay_ms, State::Initialized, now) {
                    self.session.last_sample_ms = None;
                    self.session.last_valid_sample_ms = now;
                }
            }
            State::Initialized => self.poll_sample(now),
            State::NotInitialized => {}
        }

        if self.session.error_count >= self.config.max_errors.max(1) {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "{} consecutive bus errors in {}, restarting",
                self.session.error_count,
                self.session.state
            );

            self.session.error_count = 0;
            self.session.transition(State::Reset, now);
        }

        self.session.state
    }

    /// Abandon the current bring-up or measurement and start over
    pub fn restart(&mut self) {
        let now = self.clock.now_ms();
        self.session.error_count = 0;
        self.session.transition(State::Reset, now);
    }

    /// Stop continuous measurement and park the driver
    ///
    /// The driver stays in [`State::NotInitialized`] until [`Self::restart`].
    ///
    /// # Errors
    ///
    /// Returns an error if I2C communication fails; the state is left unchanged
    pub fn stop(&mut self) -> Result<(), Error<E>> {
        let frame = command::encode(Command::StopContinuousMeasurement);
        bus::write(&mut self.i2c, self.config.address, &frame)?;

        let now = self.clock.now_ms();
        self.session.advance(State::NotInitialized, now);
        Ok(())
    }

    /// Update the O2 fraction of a running mixture measurement
    ///
    /// The fraction is clamped to 0-100 %.
    ///
    /// # Errors
    ///
    /// Returns an error if I2C communication fails
    pub fn set_o2_fraction(&mut self, percent: u8) -> Result<(), Error<E>> {
        let frame = command::change_o2_fraction_frame(percent);
        bus::write(&mut self.i2c, self.config.address, &frame)
    }

    /// Write a command and move to `next` once the sensor accepted it
    fn issue(&mut self, frame: &[u8], next: State, now: u32) {
        match bus::write(&mut self.i2c, self.config.address, frame) {
            Ok(()) => self.session.advance(next, now),
            Err(error) => self.fail(&error),
        }
    }

    /// Move to `next` once `delay_ms` passed since the last transition
    fn advance_after(&mut self, delay_ms: u32, next: State, now: u32) -> bool {
        if clock::elapsed(now, self.session.last_transition_ms) < delay_ms {
            return false;
        }
        self.session.advance(next, now);
        true
    }

    #[cfg_attr(not(feature = "defmt"), allow(unused_variables))]
    fn fail(&mut self, error: &Error<E>) {
        self.session.record_failure();

        #[cfg(feature = "defmt")]
        defmt::warn!(
            "{} failed ({}/{}): {}",
            self.session.state,
            self.session.error_count,
            self.config.max_errors,
            error.fault()
        );
    }

    fn read_calibration(&mut self) -> Result<Calibration, Error<E>> {
        let frame = command::read_settings_frame(self.config.gas_mode);
        bus::write(&mut self.i2c, self.config.address, &frame)?;

        let mut reply = [0u8; SETTINGS_REPLY_LEN];
        bus::read(&mut self.i2c, self.config.address, &mut reply)?;

        Calibration::from_reply(&reply, self.config.verify_settings_crc)
    }

    fn read_sample(&mut self) -> Result<RawSample, Error<E>> {
        let mut frame = [0u8; SAMPLE_LEN];
        bus::read(&mut self.i2c, self.config.address, &mut frame)?;
        Ok(RawSample::from_bytes(frame))
    }

    fn poll_sample(&mut self, now: u32) {
        let period = self.config.poll_period_ms;
        let due = self
            .session
            .last_sample_ms
            .is_none_or(|last| clock::elapsed(now, last) >= period);

        if due {
            self.session.last_sample_ms = Some(now);

            match self.read_sample() {
                Ok(sample) => {
                    self.session.error_count = 0;
                    self.store_sample(&sample, now);
                }
                Err(error) => self.fail(&error),
            }
        }

        if let Some(timeout) = self.config.data_timeout_ms {
            if clock::elapsed(now, self.session.last_valid_sample_ms) >= timeout {
                #[cfg(feature = "defmt")]
                defmt::warn!("no valid sample for {} ms, restarting", timeout);

                self.session.error_count = 0;
                self.session.transition(State::Reset, now);
            }
        }
    }

    fn store_sample(&mut self, sample: &RawSample, now: u32) {
        let Some(calibration) = self.session.calibration else {
            return;
        };

        match sample.flow::<E>(&calibration) {
            Ok(flow) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("flow: {}", flow);

                self.session.latest_flow = flow;
                self.session.last_valid_sample_ms = now;
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("dropping sample with CRC 0x{:02X}", sample.crc());
            }
        }
    }
}
