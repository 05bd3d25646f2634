//! Asynchronous driver for the SFM3019
//!
//! Runs the same bring-up sequence as [`crate::Sfm3019`] but awaits each
//! delay instead of gating on a clock. Suited to executors that provide an
//! async delay.

use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::{
    calibration::{Calibration, SETTINGS_REPLY_LEN},
    command::{self, Command, DEFAULT_ADDRESS, GasMode},
    config::Config,
    error::Error,
    flow::{RawSample, SAMPLE_LEN},
};

/// SFM3019 driver instance (asynchronous)
#[derive(Debug)]
pub struct Sfm3019Async<I2C> {
    i2c: I2C,
    address: u8,
    calibration: Option<Calibration>,
}

impl<I2C, E> Sfm3019Async<I2C>
where
    I2C: I2c<Error = E>,
    E: embedded_hal::i2c::Error,
{
    /// Create a new driver instance at the default address
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Create a new driver instance at `address`
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            calibration: None,
        }
    }

    /// Release the I2C bus, consuming the driver
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Calibration read by the last [`Self::read_calibration`]
    pub fn calibration(&self) -> Option<Calibration> {
        self.calibration
    }

    async fn write(&mut self, frame: &[u8]) -> Result<(), Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("i2c write 0x{:02X}: {=[u8]:x}", self.address, frame);

        self.i2c.write(self.address, frame).await.map_err(Error::write)
    }

    async fn read(&mut self, buffer: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c.read(self.address, buffer).await.map_err(Error::read)
    }

    /// Reset the sensor
    ///
    /// # Errors
    ///
    /// Returns an error if I2C communication fails
    pub async fn soft_reset(&mut self) -> Result<(), Error<E>> {
        self.write(&command::encode(Command::SoftReset)).await
    }

    /// Stop continuous measurement
    ///
    /// # Errors
    ///
    /// Returns an error if I2C communication fails
    pub async fn stop_measurement(&mut self) -> Result<(), Error<E>> {
        self.write(&command::encode(Command::StopContinuousMeasurement))
            .await
    }

    /// Read scale factor, offset and flow unit for `mode`
    ///
    /// The sensor must be idle. Each word of the reply is CRC checked.
    ///
    /// # Errors
    ///
    /// Returns an error if I2C communication fails, a CRC check fails or the
    /// scale factor is zero
    pub async fn read_calibration(&mut self, mode: GasMode) -> Result<Calibration, Error<E>> {
        self.write(&command::read_settings_frame(mode)).await?;

        let mut reply = [0u8; SETTINGS_REPLY_LEN];
        self.read(&mut reply).await?;

        let calibration = Calibration::from_reply::<E>(&reply, true)?;
        self.calibration = Some(calibration);
        Ok(calibration)
    }

    /// Start continuous measurement in `mode`
    ///
    /// # Errors
    ///
    /// Returns an error if I2C communication fails
    pub async fn start_measurement(&mut self, mode: GasMode) -> Result<(), Error<E>> {
        self.write(mode.start_frame().as_bytes()).await
    }

    /// Update the O2 fraction of a running mixture measurement
    ///
    /// # Errors
    ///
    /// Returns an error if I2C communication fails
    pub async fn set_o2_fraction(&mut self, percent: u8) -> Result<(), Error<E>> {
        self.write(&command::change_o2_fraction_frame(percent)).await
    }

    /// Read one streamed sample without converting it
    ///
    /// # Errors
    ///
    /// Returns an error if I2C communication fails
    pub async fn read_raw(&mut self) -> Result<RawSample, Error<E>> {
        let mut frame = [0u8; SAMPLE_LEN];
        self.read(&mut frame).await?;
        Ok(RawSample::from_bytes(frame))
    }

    /// Read one streamed sample and convert it into flow
    ///
    /// # Errors
    ///
    /// Returns an error if I2C communication fails, the sample is invalid or
    /// no calibration has been read yet
    pub async fn read_flow(&mut self) -> Result<f32, Error<E>> {
        let calibration = self.calibration.ok_or(Error::<E>::InvalidCalibration)?;
        self.read_raw().await?.flow(&calibration)
    }

    /// Bring the sensor up and leave it streaming in `config.gas_mode`
    ///
    /// Resets the sensor, stops any running measurement, reads the
    /// calibration, starts streaming and drops the first frame, waiting the
    /// delays from `config` in between.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered
    pub async fn initialize<D: DelayNs>(
        &mut self,
        delay: &mut D,
        config: &Config,
    ) -> Result<Calibration, Error<E>> {
        self.soft_reset().await?;
        delay.delay_ms(config.reset_delay_ms).await;

        self.stop_measurement().await?;
        delay.delay_ms(config.stop_delay_ms).await;

        let calibration = self.read_calibration(config.gas_mode).await?;

        self.start_measurement(config.gas_mode).await?;
        delay.delay_ms(config.start_delay_ms).await;

        let _ = self.read_raw().await?;
        delay.delay_ms(config.first_sample_delay_ms).await;

        #[cfg(feature = "defmt")]
        defmt::info!("SFM3019 streaming, scale factor {}", calibration.scale_factor());

        Ok(calibration)
    }
}
