//! Byte order and CRC helpers shared by command and reply frames.

use crc::{CRC_8_NRSC_5, Crc};

/// CRC-8 used by Sensirion sensors: polynomial 0x31, init 0xFF, no final XOR
const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_NRSC_5);

/// Reverse the byte order of a 16-bit word
///
/// The sensor transmits every 16-bit field most significant byte first.
#[must_use]
pub const fn swap_byte_order(value: u16) -> u16 {
    value.rotate_left(8)
}

/// Calculate the CRC-8 of `data` (polynomial 0x31, init 0xFF, no final XOR)
///
/// Command arguments and every 2-byte word read from the sensor carry this
/// checksum.
#[must_use]
pub const fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Verify a 2-byte word followed by its CRC byte
#[must_use]
pub const fn verify_word(word: &[u8; 3]) -> bool {
    crc8(&[word[0], word[1]]) == word[2]
}
