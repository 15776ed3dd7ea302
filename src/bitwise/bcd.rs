// Binary-Coded Decimal helpers for frequency fields
//
// Radios store frequencies as packed decimal digit pairs, one pair per
// byte with the tens digit in the high nibble. Little-endian order puts
// the least-significant pair first.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BcdError {
    #[error("invalid BCD digit in byte {0:#04x}")]
    InvalidDigit(u8),

    #[error("value {0} does not fit in {1} BCD bytes")]
    ValueTooLarge(u64, usize),
}

pub type Result<T> = std::result::Result<T, BcdError>;

/// Split a packed byte into (tens, ones). Fails on non-decimal nibbles,
/// which is how 0xFF fill is distinguished from live data.
pub fn unpack_pair(byte: u8) -> Result<(u8, u8)> {
    let tens = byte >> 4;
    let ones = byte & 0x0F;
    if tens > 9 || ones > 9 {
        return Err(BcdError::InvalidDigit(byte));
    }
    Ok((tens, ones))
}

/// Pack two decimal digits into one byte.
pub fn pack_pair(tens: u8, ones: u8) -> Result<u8> {
    if tens > 9 || ones > 9 {
        return Err(BcdError::InvalidDigit((tens << 4) | ones));
    }
    Ok((tens << 4) | ones)
}

/// Decode a little-endian BCD array: [0x00, 0x20, 0x65, 0x14] -> 14652000.
pub fn bcd_to_u64_le(bytes: &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    for &byte in bytes.iter().rev() {
        let (tens, ones) = unpack_pair(byte)?;
        value = value
            .checked_mul(100)
            .and_then(|v| v.checked_add(u64::from(tens * 10 + ones)))
            .ok_or(BcdError::ValueTooLarge(value, bytes.len()))?;
    }
    Ok(value)
}

/// Decode a big-endian BCD array: [0x14, 0x65, 0x20, 0x00] -> 14652000.
pub fn bcd_to_u64_be(bytes: &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    for &byte in bytes {
        let (tens, ones) = unpack_pair(byte)?;
        value = value
            .checked_mul(100)
            .and_then(|v| v.checked_add(u64::from(tens * 10 + ones)))
            .ok_or(BcdError::ValueTooLarge(value, bytes.len()))?;
    }
    Ok(value)
}

/// Encode to little-endian BCD, least-significant pair first.
pub fn u64_to_bcd_le(value: u64, num_bytes: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; num_bytes];
    let mut remaining = value;
    for slot in out.iter_mut() {
        let pair = (remaining % 100) as u8;
        remaining /= 100;
        *slot = pack_pair(pair / 10, pair % 10)?;
    }
    if remaining > 0 {
        return Err(BcdError::ValueTooLarge(value, num_bytes));
    }
    Ok(out)
}

/// Encode to big-endian BCD, most-significant pair first.
pub fn u64_to_bcd_be(value: u64, num_bytes: usize) -> Result<Vec<u8>> {
    let mut out = u64_to_bcd_le(value, num_bytes)?;
    out.reverse();
    Ok(out)
}
