//! Decoding of streamed measurement frames.

use crate::{calibration::Calibration, codec, error::Error};

/// Length of one streamed measurement frame
pub const SAMPLE_LEN: usize = 3;

/// A measurement word and its CRC as read from the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    word: [u8; 2],
    crc: u8,
}

impl RawSample {
    /// Split a 3-byte frame into word and CRC
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SAMPLE_LEN]) -> Self {
        Self {
            word: [bytes[0], bytes[1]],
            crc: bytes[2],
        }
    }

    /// CRC byte sent with the word
    #[must_use]
    pub const fn crc(&self) -> u8 {
        self.crc
    }

    /// Validate the frame and return the raw word in host order
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoData`] if the CRC byte is zero, which the sensor
    /// sends before its first sample, and [`Error::Crc`] on a CRC mismatch
    pub fn validate<E>(&self) -> Result<u16, Error<E>> {
        if self.crc == 0 {
            return Err(Error::NoData);
        }
        if !codec::verify_word(&[self.word[0], self.word[1], self.crc]) {
            #[cfg(feature = "defmt")]
            defmt::warn!("CRC error in sample {=[u8]:x}", &self.word[..]);
            return Err(Error::Crc);
        }
        Ok(u16::from_be_bytes(self.word))
    }

    /// Validate the frame and convert it into flow
    ///
    /// # Errors
    ///
    /// See [`Self::validate`]
    pub fn flow<E>(&self, calibration: &Calibration) -> Result<f32, Error<E>> {
        self.validate().map(|raw| calibration.convert(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_valid_sample() {
        let sample = RawSample::from_bytes([0xA0, 0xAA, 0x59]);
        let flow = sample.flow::<()>(&Calibration::NOMINAL_AIR).unwrap();
        assert!((flow - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_corrupt_sample() {
        let sample = RawSample::from_bytes([0xA0, 0xAB, 0x59]);
        assert_eq!(sample.validate::<()>(), Err(Error::Crc));
    }

    #[test]
    fn zero_crc_means_no_data() {
        let sample = RawSample::from_bytes([0x00, 0x00, 0x00]);
        assert_eq!(sample.validate::<()>(), Err(Error::NoData));
    }
}
