//! Scale factor, offset and flow unit read from the sensor.

use crate::{codec, error::Error};

/// Length of the reply to the read-scale-factor-offset command
pub const SETTINGS_REPLY_LEN: usize = 9;

bitfield::bitfield! {
    /// Flow unit code reported alongside the scale factor
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct FlowUnit(u16);
    impl Debug;
    u8;
    /// Unit prefix (power of ten)
    pub prefix, _: 3, 0;
    /// Time base the volume is referred to
    pub time_base, _: 7, 4;
    /// Volume unit
    pub volume, _: 12, 8;
}

impl FlowUnit {
    /// Raw unit code as sent by the sensor
    #[must_use]
    pub const fn raw(&self) -> u16 {
        self.0
    }
}

/// Calibration constants used to convert raw samples into flow
///
/// A calibration always has a non-zero scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    scale_factor: u16,
    offset: u16,
    flow_unit: FlowUnit,
}

impl Calibration {
    /// Nominal SFM3019 constants for air, in standard liters per minute
    pub const NOMINAL_AIR: Self = Self {
        scale_factor: 170,
        // 0xA000, the two's-complement form of -24576; `convert` relies on the
        // signed reading, so raw words below 0x8000 are high positive flows
        offset: 40960,
        flow_unit: FlowUnit(0x0148),
    };

    /// Create a calibration, rejecting a zero scale factor
    #[must_use]
    pub const fn new(scale_factor: u16, offset: u16, flow_unit: u16) -> Option<Self> {
        if scale_factor == 0 {
            return None;
        }
        Some(Self {
            scale_factor,
            offset,
            flow_unit: FlowUnit(flow_unit),
        })
    }

    /// Decode the 9-byte settings reply
    ///
    /// Layout: scale factor, offset and flow unit, each a big-endian word
    /// followed by its CRC. The CRCs are only checked when `verify_crc` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crc`] if a word fails its CRC check and
    /// [`Error::InvalidCalibration`] if the scale factor is zero
    pub fn from_reply<E>(
        reply: &[u8; SETTINGS_REPLY_LEN],
        verify_crc: bool,
    ) -> Result<Self, Error<E>> {
        let mut words = [0u16; 3];
        for (word, chunk) in words.iter_mut().zip(reply.chunks_exact(3)) {
            if verify_crc && !codec::verify_word(&[chunk[0], chunk[1], chunk[2]]) {
                #[cfg(feature = "defmt")]
                defmt::warn!("CRC error in settings word {=[u8]:x}", chunk);
                return Err(Error::Crc);
            }
            *word = u16::from_be_bytes([chunk[0], chunk[1]]);
        }

        let [scale_factor, offset, flow_unit] = words;
        Self::new(scale_factor, offset, flow_unit).ok_or(Error::InvalidCalibration)
    }

    /// Scale factor the sample is divided by
    #[must_use]
    pub const fn scale_factor(&self) -> u16 {
        self.scale_factor
    }

    /// Offset subtracted from the sample, as sent by the sensor
    #[must_use]
    pub const fn offset(&self) -> u16 {
        self.offset
    }

    /// Flow unit the converted value is expressed in
    #[must_use]
    pub const fn flow_unit(&self) -> FlowUnit {
        self.flow_unit
    }

    /// Convert a raw sample into flow
    ///
    /// Sample and offset are both two's-complement words on the wire.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn convert(&self, raw: u16) -> f32 {
        let raw = i32::from(raw as i16);
        let offset = i32::from(self.offset as i16);
        #[allow(clippy::cast_precision_loss)]
        let delta = (raw - offset) as f32;
        delta / f32::from(self.scale_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(scale: u16, offset: u16, unit: u16) -> [u8; SETTINGS_REPLY_LEN] {
        let mut out = [0u8; SETTINGS_REPLY_LEN];
        for (chunk, word) in out.chunks_exact_mut(3).zip([scale, offset, unit]) {
            let [hi, lo] = word.to_be_bytes();
            chunk.copy_from_slice(&[hi, lo, codec::crc8(&[hi, lo])]);
        }
        out
    }

    #[test]
    fn decodes_settings_reply() {
        let calibration =
            Calibration::from_reply::<()>(&reply(170, 40960, 0x0148), true).unwrap();
        assert_eq!(calibration, Calibration::NOMINAL_AIR);
        assert_eq!(calibration.flow_unit().raw(), 0x0148);
        assert_eq!(calibration.flow_unit().volume(), 1);
        assert_eq!(calibration.flow_unit().time_base(), 4);
        assert_eq!(calibration.flow_unit().prefix(), 8);
    }

    #[test]
    fn rejects_zero_scale_factor() {
        assert_eq!(Calibration::new(0, 40960, 0x0148), None);
        assert_eq!(
            Calibration::from_reply::<()>(&reply(0, 40960, 0x0148), true),
            Err(Error::InvalidCalibration)
        );
    }

    #[test]
    fn rejects_corrupt_word_only_when_verifying() {
        let mut bytes = reply(170, 40960, 0x0148);
        bytes[5] ^= 0xFF;
        assert_eq!(Calibration::from_reply::<()>(&bytes, true), Err(Error::Crc));
        assert!(Calibration::from_reply::<()>(&bytes, false).is_ok());
    }

    #[test]
    fn converts_raw_sample() {
        let flow = Calibration::NOMINAL_AIR.convert(41130);
        assert!((flow - 1.0).abs() < 1e-6);

        let flow = Calibration::NOMINAL_AIR.convert(40790);
        assert!((flow + 1.0).abs() < 1e-6);
    }

    #[test]
    fn nominal_offset_is_signed_on_the_wire() {
        assert_eq!(Calibration::NOMINAL_AIR.offset() as i16, -24576);
        // Zero raw word is 24576 counts above the offset
        let flow = Calibration::NOMINAL_AIR.convert(0);
        assert!((flow - 24576.0 / 170.0).abs() < 1e-3);
    }

    #[test]
    fn converts_high_flow_past_sign_boundary() {
        // 240 slm is a positive word while the offset word is negative
        let raw = (-24576i32 + 170 * 240) as u16;
        let flow = Calibration::NOMINAL_AIR.convert(raw);
        assert!((flow - 240.0).abs() < 1e-3);
    }
}
