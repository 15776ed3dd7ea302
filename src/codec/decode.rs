// Raw image -> channel array, driven by a memory-format descriptor.

use super::fields::{self, FieldValue, ToneValue};
use super::CodecError;
use crate::core::{Channel, ChannelArray, CrossMode, Duplex, Mode, MemoryMap, Skip, ToneMode};
use crate::descriptors::{EmptyCheck, FlagTarget, MemFormat};

/// Decode every channel slot the image covers. Slots past the end of a
/// short image stay empty.
pub fn decode_image(mmap: &MemoryMap, fmt: &MemFormat) -> Result<ChannelArray, CodecError> {
    let mut array = ChannelArray::new(1, fmt.num_channels as u32)
        .map_err(|e| CodecError::new(0, "bounds", e.to_string()))?;
    let data = mmap.bytes();

    for i in 0..fmt.num_channels {
        let index = (i + 1) as u32;
        let offset = fmt.start_offset + i * fmt.channel_size;
        if offset + fmt.channel_size > data.len() {
            tracing::debug!(
                slot = index,
                "image ends before this slot, remaining channels left empty"
            );
            break;
        }
        let record = &data[offset..offset + fmt.channel_size];

        if slot_is_empty(record, fmt).map_err(|cause| CodecError::new(i, "empty_check", cause))? {
            continue;
        }

        match decode_channel(index, record, data, i, fmt) {
            Ok(Some(ch)) => {
                array
                    .fill(ch)
                    .map_err(|e| CodecError::new(i, "slot", e.to_string()))?;
            }
            Ok(None) => {
                // Undecodable frequency bytes: leave the slot empty.
            }
            Err(err) => return Err(err),
        }
    }

    Ok(array)
}

fn slot_is_empty(record: &[u8], fmt: &MemFormat) -> Result<bool, String> {
    match fmt.empty_check {
        EmptyCheck::BcdBytes { field } => {
            let def = fmt
                .field(field)
                .ok_or_else(|| format!("empty_check names unknown field '{field}'"))?;
            let slice = record
                .get(def.offset..def.offset + def.size)
                .ok_or_else(|| "empty_check field outside record".to_string())?;
            Ok(slice.iter().all(|&b| b == 0xFF) || slice.iter().all(|&b| b == 0x00))
        }
        EmptyCheck::Sentinels { field, values } => {
            let def = fmt
                .field(field)
                .ok_or_else(|| format!("empty_check names unknown field '{field}'"))?;
            match fields::read_field(record, def) {
                Ok(FieldValue::Int(v)) => Ok(values.contains(&v)),
                Ok(_) => Err(format!("empty_check field '{field}' is not an integer")),
                // Undecodable bytes in the sentinel field mean unused.
                Err(_) => Ok(true),
            }
        }
    }
}

fn decode_channel(
    index: u32,
    record: &[u8],
    image: &[u8],
    slot: usize,
    fmt: &MemFormat,
) -> Result<Option<Channel>, CodecError> {
    let mut ch = Channel::new(index);

    // Frequencies first: a slot that passes the empty check but has
    // garbage frequency bytes is treated as unused, not fatal.
    let rx = match read_int(record, fmt, slot, "rxfreq")? {
        Some(v) => v,
        None => {
            tracing::warn!(slot = index, "undecodable receive frequency, slot skipped");
            return Ok(None);
        }
    };
    ch.freq = rx;

    match read_int(record, fmt, slot, "txfreq")? {
        None => {
            // 0xFF fill in the transmit slot: transmit inhibited.
            ch.duplex = Duplex::Off;
            ch.offset = 0;
        }
        Some(tx) if tx == rx => {
            ch.duplex = Duplex::Simplex;
            ch.offset = 0;
        }
        Some(tx) => {
            let diff = tx.abs_diff(rx);
            if diff > fmt.split_threshold_hz {
                ch.duplex = Duplex::Split;
                ch.offset = tx;
            } else if tx > rx {
                ch.duplex = Duplex::Plus;
                ch.offset = diff;
            } else {
                ch.duplex = Duplex::Minus;
                ch.offset = diff;
            }
        }
    }

    let tx_tone = read_tone(record, fmt, slot, "txtone")?;
    let rx_tone = read_tone(record, fmt, slot, "rxtone")?;
    reconcile_tones(&mut ch, tx_tone, rx_tone);

    apply_flags(&mut ch, record, slot, fmt)?;

    if let Some(table) = fmt.name_table {
        let offset = table.offset + slot * table.stride;
        match fields::read_text_at(image, offset, table.len) {
            Ok(name) => ch.name = name,
            Err(cause) => {
                tracing::debug!(slot = index, %cause, "name table entry unreadable");
            }
        }
    } else if let Some(def) = fmt.field("name") {
        if let FieldValue::Text(name) = fields::read_field(record, def)
            .map_err(|cause| CodecError::new(slot, "name", cause))?
        {
            ch.name = name;
        }
    }

    apply_defaults(&mut ch, fmt);

    Ok(Some(ch))
}

fn read_int(
    record: &[u8],
    fmt: &MemFormat,
    slot: usize,
    name: &str,
) -> Result<Option<u64>, CodecError> {
    let def = match fmt.field(name) {
        Some(def) => def,
        None => return Err(CodecError::new(slot, name, "descriptor lacks field")),
    };
    match fields::read_field(record, def) {
        Ok(FieldValue::Int(v)) => Ok(Some(v)),
        Ok(_) => Err(CodecError::new(slot, name, "field is not an integer")),
        Err(_) => Ok(None),
    }
}

fn read_tone(
    record: &[u8],
    fmt: &MemFormat,
    slot: usize,
    name: &str,
) -> Result<ToneValue, CodecError> {
    let def = match fmt.field(name) {
        Some(def) => def,
        None => return Ok(ToneValue::None),
    };
    match fields::read_field(record, def).map_err(|cause| CodecError::new(slot, name, cause))? {
        FieldValue::Tone(t) => Ok(t),
        _ => Err(CodecError::new(slot, name, "field is not a tone")),
    }
}

fn polarity(tx: Option<bool>, rx: Option<bool>) -> String {
    let ch = |rev: Option<bool>| if rev == Some(true) { 'R' } else { 'N' };
    format!("{}{}", ch(tx), ch(rx))
}

/// Collapse the two wire tones into a tone mode.
fn reconcile_tones(ch: &mut Channel, tx: ToneValue, rx: ToneValue) {
    match (tx, rx) {
        (ToneValue::None, ToneValue::None) => ch.tone_mode = ToneMode::None,
        (ToneValue::Ctcss(t), ToneValue::None) => {
            ch.tone_mode = ToneMode::Tone;
            ch.rtone = t;
        }
        (ToneValue::Ctcss(t), ToneValue::Ctcss(r)) if t == r => {
            ch.tone_mode = ToneMode::Tsql;
            ch.rtone = t;
            ch.ctone = r;
        }
        (ToneValue::None, ToneValue::Ctcss(r)) => {
            ch.tone_mode = ToneMode::TsqlR;
            ch.ctone = r;
        }
        (
            ToneValue::Dtcs { code: tc, reverse: tr },
            ToneValue::Dtcs { code: rc, reverse: rr },
        ) if tc == rc => {
            ch.tone_mode = ToneMode::Dtcs;
            ch.dtcs = tc;
            ch.rx_dtcs = rc;
            ch.dtcs_polarity = polarity(Some(tr), Some(rr));
        }
        (ToneValue::None, ToneValue::Dtcs { code, reverse }) => {
            ch.tone_mode = ToneMode::DtcsR;
            ch.rx_dtcs = code;
            ch.dtcs_polarity = polarity(None, Some(reverse));
        }
        (tx, rx) => {
            ch.tone_mode = ToneMode::Cross;
            let mut tx_rev = None;
            let mut rx_rev = None;
            match tx {
                ToneValue::Ctcss(t) => ch.rtone = t,
                ToneValue::Dtcs { code, reverse } => {
                    ch.dtcs = code;
                    tx_rev = Some(reverse);
                }
                ToneValue::None => {}
            }
            match rx {
                ToneValue::Ctcss(r) => ch.ctone = r,
                ToneValue::Dtcs { code, reverse } => {
                    ch.rx_dtcs = code;
                    rx_rev = Some(reverse);
                }
                ToneValue::None => {}
            }
            ch.cross_mode = match (tx, rx) {
                (ToneValue::Ctcss(_), ToneValue::Ctcss(_)) => CrossMode::ToneToTone,
                (ToneValue::Ctcss(_), ToneValue::Dtcs { .. }) => CrossMode::ToneToDtcs,
                (ToneValue::Dtcs { .. }, ToneValue::Ctcss(_)) => CrossMode::DtcsToTone,
                (ToneValue::Dtcs { .. }, ToneValue::Dtcs { .. }) => CrossMode::DtcsToDtcs,
                (ToneValue::Ctcss(_), ToneValue::None) => CrossMode::ToneToNone,
                (ToneValue::Dtcs { .. }, ToneValue::None) => CrossMode::DtcsToNone,
                (ToneValue::None, ToneValue::Ctcss(_)) => CrossMode::NoneToTone,
                (ToneValue::None, ToneValue::Dtcs { .. }) => CrossMode::NoneToDtcs,
                (ToneValue::None, ToneValue::None) => CrossMode::ToneToTone,
            };
            ch.dtcs_polarity = polarity(tx_rev, rx_rev);
        }
    }
}

fn apply_flags(
    ch: &mut Channel,
    record: &[u8],
    slot: usize,
    fmt: &MemFormat,
) -> Result<(), CodecError> {
    for flag in fmt.flags {
        let def = fmt
            .field(flag.field)
            .ok_or_else(|| CodecError::new(slot, flag.field, "flag names unknown field"))?;
        let byte = record
            .get(def.offset)
            .copied()
            .ok_or_else(|| CodecError::new(slot, flag.field, "flag field outside record"))?;
        if flag.values.is_empty() {
            return Err(CodecError::new(slot, flag.field, "flag mapping has no values"));
        }
        let mut raw = (byte & flag.mask) >> flag.shift;
        if flag.invert {
            raw ^= flag.mask >> flag.shift;
        }
        // Clamp out-of-table values to the last label; some radios use
        // spare encodings for the same setting.
        let idx = (raw as usize).min(flag.values.len().saturating_sub(1));
        let label = flag.values[idx];
        match flag.target {
            FlagTarget::Mode => {
                ch.mode = Mode::from_label(label)
                    .map_err(|e| CodecError::new(slot, flag.field, e.to_string()))?;
            }
            FlagTarget::Power => ch.power = label.to_string(),
            FlagTarget::Skip => {
                ch.skip = Skip::from_label(label)
                    .map_err(|e| CodecError::new(slot, flag.field, e.to_string()))?;
            }
        }
    }
    Ok(())
}

fn apply_defaults(ch: &mut Channel, fmt: &MemFormat) {
    let has = |target: FlagTarget| fmt.flags.iter().any(|f| f.target == target);
    if !has(FlagTarget::Mode) {
        if let Some(mode) = fmt.defaults.mode {
            ch.mode = mode;
        }
    }
    if !has(FlagTarget::Power) && ch.power.is_empty() {
        if let Some(power) = fmt.defaults.power {
            ch.power = power.to_string();
        }
    }
    if let Some(step) = fmt.defaults.tuning_step {
        ch.tuning_step = step;
    }
}
