//! Command opcodes and frame encoding for the SFM3019.

use crate::codec;

/// Default I2C address of the SFM3019
pub const DEFAULT_ADDRESS: u8 = 0x2E;

/// Lowest O2 fraction accepted by the change-O2-fraction command, in percent
pub const O2_FRACTION_MIN: u8 = 0;
/// Lowest O2 fraction accepted when starting an air/O2 mixture measurement, in percent
pub const GAS_MIXTURE_O2_MIN: u8 = 21;
/// Highest O2 fraction accepted by any command, in percent
pub const O2_FRACTION_MAX: u8 = 100;

/// 16-bit command opcodes, transmitted big-endian
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
#[repr(u16)]
pub enum Command {
    /// Software reset
    SoftReset = 0x0006,
    /// Stop continuous measurement and return to idle
    StopContinuousMeasurement = 0x3FF9,
    /// Read scale factor, offset and flow unit for a measurement command
    ReadScaleFactorOffset = 0x3661,
    /// Start continuous measurement calibrated for air
    ContinuousMeasurementAir = 0x3608,
    /// Start continuous measurement calibrated for O2
    ContinuousMeasurementO2 = 0x3603,
    /// Start continuous measurement for an air/O2 mixture
    ContinuousMeasurementAirO2 = 0x3632,
    /// Update the O2 fraction used by a running mixture measurement
    ChangeO2Fraction = 0xE17D,
}

impl From<Command> for u16 {
    fn from(command: Command) -> u16 {
        command as u16
    }
}

/// Gas the sensor is calibrated for while streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GasMode {
    /// Air
    #[default]
    Air,
    /// Pure oxygen
    Oxygen,
    /// Air/O2 mixture with the given O2 fraction in percent
    AirOxygenMixture(u8),
}

impl GasMode {
    /// Measurement command that starts streaming in this mode
    #[must_use]
    pub const fn command(self) -> Command {
        match self {
            GasMode::Air => Command::ContinuousMeasurementAir,
            GasMode::Oxygen => Command::ContinuousMeasurementO2,
            GasMode::AirOxygenMixture(_) => Command::ContinuousMeasurementAirO2,
        }
    }

    /// Frame that starts continuous measurement in this mode
    #[must_use]
    pub fn start_frame(self) -> Frame {
        match self {
            GasMode::AirOxygenMixture(fraction) => Frame::Argument(encode_with_argument(
                Command::ContinuousMeasurementAirO2,
                gas_mixture_argument(fraction),
            )),
            mode => Frame::Command(encode(mode.command())),
        }
    }
}

/// An encoded command ready to be written to the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Frame {
    /// Bare 2-byte opcode
    Command([u8; 2]),
    /// Opcode, 16-bit argument and the argument's CRC
    Argument([u8; 5]),
}

impl Frame {
    /// Frame bytes in transmission order
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Command(bytes) => bytes.as_slice(),
            Frame::Argument(bytes) => bytes.as_slice(),
        }
    }
}

/// Encode a bare command as a 2-byte frame
#[must_use]
pub const fn encode(command: Command) -> [u8; 2] {
    (command as u16).to_be_bytes()
}

/// Encode a command with one argument word as a 5-byte frame
///
/// The CRC covers the two argument bytes only.
#[must_use]
pub const fn encode_with_argument(command: Command, argument: u16) -> [u8; 5] {
    let [op_hi, op_lo] = (command as u16).to_be_bytes();
    let [arg_hi, arg_lo] = argument.to_be_bytes();
    [op_hi, op_lo, arg_hi, arg_lo, codec::crc8(&[arg_hi, arg_lo])]
}

/// Clamp an O2 fraction for the change-O2-fraction command to `[0, 100]`
#[must_use]
pub fn o2_fraction_argument(percent: u8) -> u16 {
    u16::from(percent.clamp(O2_FRACTION_MIN, O2_FRACTION_MAX))
}

/// Clamp an O2 fraction for the air/O2 mixture start command to `[21, 100]`
#[must_use]
pub fn gas_mixture_argument(percent: u8) -> u16 {
    u16::from(percent.clamp(GAS_MIXTURE_O2_MIN, O2_FRACTION_MAX))
}

/// Frame requesting the scale factor, offset and unit for `mode`
#[must_use]
pub fn read_settings_frame(mode: GasMode) -> [u8; 5] {
    encode_with_argument(Command::ReadScaleFactorOffset, mode.command().into())
}

/// Frame changing the O2 fraction of a running mixture measurement
#[must_use]
pub fn change_o2_fraction_frame(percent: u8) -> [u8; 5] {
    encode_with_argument(Command::ChangeO2Fraction, o2_fraction_argument(percent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_opcodes_big_endian() {
        assert_eq!(encode(Command::SoftReset), [0x00, 0x06]);
        assert_eq!(encode(Command::StopContinuousMeasurement), [0x3F, 0xF9]);
        assert_eq!(encode(Command::ContinuousMeasurementAir), [0x36, 0x08]);
        assert_eq!(encode(Command::ContinuousMeasurementO2), [0x36, 0x03]);
    }

    #[test]
    fn read_settings_frame_for_air() {
        assert_eq!(
            read_settings_frame(GasMode::Air),
            [0x36, 0x61, 0x36, 0x08, 0xD0]
        );
    }

    #[test]
    fn change_o2_fraction_clamps_to_zero_and_hundred() {
        assert_eq!(o2_fraction_argument(150), 100);
        assert_eq!(o2_fraction_argument(10), 10);
        assert_eq!(o2_fraction_argument(0), 0);
        assert_eq!(
            change_o2_fraction_frame(150),
            [0xE1, 0x7D, 0x00, 0x64, codec::crc8(&[0x00, 0x64])]
        );
    }

    #[test]
    fn gas_mixture_clamps_to_twenty_one_and_hundred() {
        assert_eq!(gas_mixture_argument(150), 100);
        assert_eq!(gas_mixture_argument(10), 21);
        assert_eq!(gas_mixture_argument(40), 40);
    }

    #[test]
    fn mixture_start_frame_carries_clamped_fraction() {
        let frame = GasMode::AirOxygenMixture(10).start_frame();
        assert_eq!(frame.as_bytes(), &[0x36, 0x32, 0x00, 0x15, 0x37]);

        let frame = GasMode::Oxygen.start_frame();
        assert_eq!(frame, Frame::Command([0x36, 0x03]));
    }
}
