//! Thin I2C transport used by the drivers.

use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource};

use crate::error::Error;

/// Class of a failed bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusFault {
    /// The device did not acknowledge its address
    NackAddress,
    /// The device did not acknowledge a data byte
    NackData,
    /// The controller could not buffer the transfer
    BufferFull,
    /// Fewer bytes than requested were received
    Packet,
    /// Any other failure
    Unknown,
}

impl BusFault {
    /// Classify an error raised while writing
    #[must_use]
    pub fn from_write(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => BusFault::NackAddress,
            ErrorKind::NoAcknowledge(_) => BusFault::NackData,
            ErrorKind::Overrun => BusFault::BufferFull,
            _ => BusFault::Unknown,
        }
    }

    /// Classify an error raised while reading
    ///
    /// A read the device stops acknowledging early comes back short, so it
    /// is reported as a packet error.
    #[must_use]
    pub fn from_read(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(_) | ErrorKind::Overrun => BusFault::Packet,
            _ => BusFault::Unknown,
        }
    }
}

impl<E: i2c::Error> Error<E> {
    pub(crate) fn write(source: E) -> Self {
        Error::Communication {
            fault: BusFault::from_write(source.kind()),
            source,
        }
    }

    pub(crate) fn read(source: E) -> Self {
        Error::Communication {
            fault: BusFault::from_read(source.kind()),
            source,
        }
    }
}

/// Write `bytes` to the device at `address`
pub(crate) fn write<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
    bytes: &[u8],
) -> Result<(), Error<I2C::Error>> {
    #[cfg(feature = "defmt")]
    defmt::trace!("i2c write 0x{:02X}: {=[u8]:x}", address, bytes);

    i2c.write(address, bytes).map_err(Error::write)
}

/// Fill `buffer` from the device at `address`
pub(crate) fn read<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
    buffer: &mut [u8],
) -> Result<(), Error<I2C::Error>> {
    i2c.read(address, buffer).map_err(Error::read)?;

    #[cfg(feature = "defmt")]
    defmt::trace!("i2c read 0x{:02X}: {=[u8]:x}", address, &buffer[..]);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_write_faults() {
        assert_eq!(
            BusFault::from_write(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
            BusFault::NackAddress
        );
        assert_eq!(
            BusFault::from_write(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)),
            BusFault::NackData
        );
        assert_eq!(BusFault::from_write(ErrorKind::Overrun), BusFault::BufferFull);
        assert_eq!(BusFault::from_write(ErrorKind::Bus), BusFault::Unknown);
    }

    #[test]
    fn classifies_read_faults() {
        assert_eq!(
            BusFault::from_read(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)),
            BusFault::Packet
        );
        assert_eq!(BusFault::from_read(ErrorKind::ArbitrationLoss), BusFault::Unknown);
    }
}
