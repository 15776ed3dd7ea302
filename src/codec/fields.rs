// Field-level readers and writers over channel-record slices.

use crate::bitwise::{self, bcd};
use crate::descriptors::{FieldDef, FieldKind};
use nom::bytes::complete::take;
use nom::IResult;

/// Decoded squelch-tone wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneValue {
    None,
    /// CTCSS in tenths of Hz.
    Ctcss(u16),
    Dtcs { code: u16, reverse: bool },
}

/// Decode the 16-bit tone encoding: 0 and 0xFFFF mean no tone, the
/// 0x8000 flag selects DCS with the code in the low 12 bits and 0x4000
/// for reversed polarity, anything else is CTCSS in tenths of Hz.
pub fn decode_tone_u16(raw: u16) -> ToneValue {
    if raw == 0 || raw == 0xFFFF {
        ToneValue::None
    } else if raw & 0x8000 != 0 {
        ToneValue::Dtcs {
            code: raw & 0x0FFF,
            reverse: raw & 0x4000 != 0,
        }
    } else {
        ToneValue::Ctcss(raw)
    }
}

pub fn encode_tone_u16(tone: ToneValue) -> u16 {
    match tone {
        ToneValue::None => 0,
        ToneValue::Ctcss(dhz) => dhz,
        ToneValue::Dtcs { code, reverse } => {
            0x8000 | (code & 0x0FFF) | if reverse { 0x4000 } else { 0 }
        }
    }
}

/// A field's decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(u64),
    Tone(ToneValue),
    Text(String),
}

fn bcd_parser(
    num_bytes: usize,
    unit: u32,
    little_endian: bool,
) -> impl Fn(&[u8]) -> IResult<&[u8], u64> {
    move |input: &[u8]| {
        let (rest, bytes) = take(num_bytes)(input)?;
        let decoded = if little_endian {
            bcd::bcd_to_u64_le(bytes)
        } else {
            bcd::bcd_to_u64_be(bytes)
        };
        let value = decoded.map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify))
        })?;
        Ok((rest, value * u64::from(unit)))
    }
}

fn text_parser(len: usize) -> impl Fn(&[u8]) -> IResult<&[u8], String> {
    move |input: &[u8]| {
        let (rest, bytes) = take(len)(input)?;
        let end = bytes
            .iter()
            .position(|&b| b == 0x00 || b == 0xFF)
            .unwrap_or(bytes.len());
        let text: String = bytes[..end]
            .iter()
            .copied()
            .filter(|b| (0x20..0x7F).contains(b))
            .map(char::from)
            .collect();
        Ok((rest, text.trim_end().to_string()))
    }
}

/// Parse a fixed-width name at `offset` in `data` (used for the separate
/// name tables some formats keep).
pub fn read_text_at(data: &[u8], offset: usize, len: usize) -> Result<String, String> {
    let slice = data
        .get(offset..offset + len)
        .ok_or_else(|| format!("name at {offset:#06x}+{len} outside image"))?;
    let (_, text) = text_parser(len)(slice).map_err(|e| e.to_string())?;
    Ok(text)
}

/// Read one declared field out of a channel record.
pub fn read_field(record: &[u8], def: &FieldDef) -> Result<FieldValue, String> {
    let slice = record
        .get(def.offset..def.offset + def.size)
        .ok_or_else(|| format!("field outside record ({:#04x}+{})", def.offset, def.size))?;
    match def.kind {
        FieldKind::BcdLe { unit } => {
            let (_, value) = bcd_parser(def.size, unit, true)(slice)
                .map_err(|_| "invalid BCD digits".to_string())?;
            Ok(FieldValue::Int(value))
        }
        FieldKind::BcdBe { unit } => {
            let (_, value) = bcd_parser(def.size, unit, false)(slice)
                .map_err(|_| "invalid BCD digits".to_string())?;
            Ok(FieldValue::Int(value))
        }
        FieldKind::U16Le => Ok(FieldValue::Int(u64::from(
            bitwise::read_u16_le(slice).map_err(|e| e.to_string())?,
        ))),
        FieldKind::U16Be => Ok(FieldValue::Int(u64::from(
            bitwise::read_u16_be(slice).map_err(|e| e.to_string())?,
        ))),
        FieldKind::U32Le => Ok(FieldValue::Int(u64::from(
            bitwise::read_u32_le(slice).map_err(|e| e.to_string())?,
        ))),
        FieldKind::Byte => Ok(FieldValue::Int(u64::from(slice[0]))),
        FieldKind::ToneU16Le => {
            let raw = bitwise::read_u16_le(slice).map_err(|e| e.to_string())?;
            Ok(FieldValue::Tone(decode_tone_u16(raw)))
        }
        FieldKind::Str => {
            let (_, text) = text_parser(def.size)(slice).map_err(|e| e.to_string())?;
            Ok(FieldValue::Text(text))
        }
    }
}

/// Write an integer-kinded field into a channel record.
pub fn write_int(record: &mut [u8], def: &FieldDef, value: u64) -> Result<(), String> {
    let slice = record
        .get_mut(def.offset..def.offset + def.size)
        .ok_or_else(|| format!("field outside record ({:#04x}+{})", def.offset, def.size))?;
    match def.kind {
        FieldKind::BcdLe { unit } | FieldKind::BcdBe { unit } => {
            let little_endian = matches!(def.kind, FieldKind::BcdLe { .. });
            let unit = u64::from(unit);
            if value % unit != 0 {
                return Err(format!("{value} not a multiple of unit {unit}"));
            }
            let bytes = if little_endian {
                bcd::u64_to_bcd_le(value / unit, def.size)
            } else {
                bcd::u64_to_bcd_be(value / unit, def.size)
            }
            .map_err(|e| e.to_string())?;
            slice.copy_from_slice(&bytes);
            Ok(())
        }
        FieldKind::U16Le => bitwise::write_u16_le(slice, value as u16).map_err(|e| e.to_string()),
        FieldKind::U16Be => bitwise::write_u16_be(slice, value as u16).map_err(|e| e.to_string()),
        FieldKind::U32Le => bitwise::write_u32_le(slice, value as u32).map_err(|e| e.to_string()),
        FieldKind::Byte => {
            slice[0] = value as u8;
            Ok(())
        }
        _ => Err("field kind does not take an integer".to_string()),
    }
}

/// Fill an integer field with 0xFF, the transmit-inhibit marker for BCD
/// frequency pairs.
pub fn write_fill(record: &mut [u8], def: &FieldDef) -> Result<(), String> {
    let slice = record
        .get_mut(def.offset..def.offset + def.size)
        .ok_or_else(|| format!("field outside record ({:#04x}+{})", def.offset, def.size))?;
    slice.fill(0xFF);
    Ok(())
}

pub fn write_tone(record: &mut [u8], def: &FieldDef, tone: ToneValue) -> Result<(), String> {
    if def.kind != FieldKind::ToneU16Le {
        return Err("not a tone field".to_string());
    }
    let slice = record
        .get_mut(def.offset..def.offset + def.size)
        .ok_or_else(|| format!("field outside record ({:#04x}+{})", def.offset, def.size))?;
    bitwise::write_u16_le(slice, encode_tone_u16(tone)).map_err(|e| e.to_string())
}

/// Write a name, truncated to `len` and padded with 0xFF.
pub fn write_text_at(data: &mut [u8], offset: usize, len: usize, text: &str) -> Result<(), String> {
    let slice = data
        .get_mut(offset..offset + len)
        .ok_or_else(|| format!("name at {offset:#06x}+{len} outside image"))?;
    slice.fill(0xFF);
    for (slot, ch) in slice.iter_mut().zip(text.bytes().filter(|b| (0x20..0x7F).contains(b))) {
        *slot = ch;
    }
    Ok(())
}
