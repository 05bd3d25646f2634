use crate::bus::BusFault;

/// Error type for SFM3019 operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the sensor
    Communication {
        /// Class of the bus failure
        fault: BusFault,
        /// Error reported by the I2C implementation
        source: E,
    },
    /// CRC mismatch in received data
    Crc,
    /// The sensor has not produced a sample yet (CRC byte is zero)
    NoData,
    /// The sensor reported a scale factor of zero
    InvalidCalibration,
}

impl<E> Error<E> {
    /// Bus failure class, if this is a communication error
    pub fn fault(&self) -> Option<BusFault> {
        match self {
            Error::Communication { fault, .. } => Some(*fault),
            _ => None,
        }
    }
}
