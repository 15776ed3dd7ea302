// Fixed-width integer accessors over raw record slices.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntError {
    #[error("short slice: need {needed} bytes, have {available}")]
    ShortSlice { needed: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, IntError>;

fn need(data: &[u8], n: usize) -> Result<()> {
    if data.len() < n {
        return Err(IntError::ShortSlice {
            needed: n,
            available: data.len(),
        });
    }
    Ok(())
}

pub fn read_u16_le(data: &[u8]) -> Result<u16> {
    need(data, 2)?;
    Ok(u16::from_le_bytes([data[0], data[1]]))
}

pub fn read_u16_be(data: &[u8]) -> Result<u16> {
    need(data, 2)?;
    Ok(u16::from_be_bytes([data[0], data[1]]))
}

pub fn read_u32_le(data: &[u8]) -> Result<u32> {
    need(data, 4)?;
    Ok(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
}

pub fn write_u16_le(data: &mut [u8], value: u16) -> Result<()> {
    need(data, 2)?;
    data[..2].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

pub fn write_u16_be(data: &mut [u8], value: u16) -> Result<()> {
    need(data, 2)?;
    data[..2].copy_from_slice(&value.to_be_bytes());
    Ok(())
}

pub fn write_u32_le(data: &mut [u8], value: u32) -> Result<()> {
    need(data, 4)?;
    data[..4].copy_from_slice(&value.to_le_bytes());
    Ok(())
}
