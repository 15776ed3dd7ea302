// Channel array -> raw image, writing through a copy of the original.
//
// Only bytes belonging to declared fields (and name entries) of
// occupied slots are touched; everything else, including whole empty
// slots, passes through bit-exact.

use super::fields::{self, ToneValue};
use super::CodecError;
use crate::core::constants::is_valid_dtcs;
use crate::core::{Channel, ChannelArray, CrossMode, Duplex, MemoryMap, ToneMode};
use crate::descriptors::{FlagTarget, MemFormat};

pub fn encode_image(
    original: &MemoryMap,
    channels: &ChannelArray,
    fmt: &MemFormat,
) -> Result<MemoryMap, CodecError> {
    let mut out = original.to_vec();

    for (slot, ch) in channels.iter().enumerate().take(fmt.num_channels) {
        if ch.empty {
            continue;
        }
        let offset = fmt.start_offset + slot * fmt.channel_size;
        if offset + fmt.channel_size > out.len() {
            return Err(CodecError::new(
                slot,
                "record",
                format!("occupied slot {} does not fit the image", ch.index),
            ));
        }

        {
            let record = &mut out[offset..offset + fmt.channel_size];
            encode_record(ch, record, slot, fmt)?;
        }

        if let Some(table) = fmt.name_table {
            let name_off = table.offset + slot * table.stride;
            fields::write_text_at(&mut out, name_off, table.len, &ch.name)
                .map_err(|cause| CodecError::new(slot, "name", cause))?;
        }
    }

    Ok(MemoryMap::new(out))
}

fn encode_record(
    ch: &Channel,
    record: &mut [u8],
    slot: usize,
    fmt: &MemFormat,
) -> Result<(), CodecError> {
    let field = |name: &str| {
        fmt.field(name)
            .ok_or_else(|| CodecError::new(slot, name, "descriptor lacks field"))
    };

    let rxfreq = field("rxfreq")?;
    fields::write_int(record, rxfreq, ch.freq)
        .map_err(|cause| CodecError::new(slot, "rxfreq", cause))?;

    let txfreq = field("txfreq")?;
    match ch.duplex {
        Duplex::Off => fields::write_fill(record, txfreq)
            .map_err(|cause| CodecError::new(slot, "txfreq", cause))?,
        _ => fields::write_int(record, txfreq, ch.tx_freq())
            .map_err(|cause| CodecError::new(slot, "txfreq", cause))?,
    }

    let (tx_tone, rx_tone) = wire_tones(ch, slot)?;
    if let Some(def) = fmt.field("txtone") {
        fields::write_tone(record, def, tx_tone)
            .map_err(|cause| CodecError::new(slot, "txtone", cause))?;
    }
    if let Some(def) = fmt.field("rxtone") {
        fields::write_tone(record, def, rx_tone)
            .map_err(|cause| CodecError::new(slot, "rxtone", cause))?;
    }

    apply_flags(ch, record, slot, fmt)?;

    if fmt.name_table.is_none() {
        if let Some(def) = fmt.field("name") {
            let start = def.offset;
            fields::write_text_at(record, start, def.size, &ch.name)
                .map_err(|cause| CodecError::new(slot, "name", cause))?;
        }
    }

    Ok(())
}

fn dtcs_tone(code: u16, pol: char, slot: usize) -> Result<ToneValue, CodecError> {
    if !is_valid_dtcs(code) {
        return Err(CodecError::new(
            slot,
            "dtcs",
            format!("{code:03} is not a standard DCS code"),
        ));
    }
    Ok(ToneValue::Dtcs {
        code,
        reverse: pol == 'R',
    })
}

/// Expand the tone mode back into the two wire tones.
fn wire_tones(ch: &Channel, slot: usize) -> Result<(ToneValue, ToneValue), CodecError> {
    let tx_pol = ch.dtcs_polarity.chars().next().unwrap_or('N');
    let rx_pol = ch.dtcs_polarity.chars().nth(1).unwrap_or('N');

    Ok(match ch.tone_mode {
        ToneMode::None => (ToneValue::None, ToneValue::None),
        ToneMode::Tone => (ToneValue::Ctcss(ch.rtone), ToneValue::None),
        ToneMode::Tsql => (ToneValue::Ctcss(ch.ctone), ToneValue::Ctcss(ch.ctone)),
        ToneMode::TsqlR => (ToneValue::None, ToneValue::Ctcss(ch.ctone)),
        ToneMode::Dtcs => (
            dtcs_tone(ch.dtcs, tx_pol, slot)?,
            dtcs_tone(ch.dtcs, rx_pol, slot)?,
        ),
        ToneMode::DtcsR => (ToneValue::None, dtcs_tone(ch.rx_dtcs, rx_pol, slot)?),
        ToneMode::Cross => match ch.cross_mode {
            CrossMode::ToneToTone => (ToneValue::Ctcss(ch.rtone), ToneValue::Ctcss(ch.ctone)),
            CrossMode::ToneToDtcs => (
                ToneValue::Ctcss(ch.rtone),
                dtcs_tone(ch.rx_dtcs, rx_pol, slot)?,
            ),
            CrossMode::DtcsToTone => (
                dtcs_tone(ch.dtcs, tx_pol, slot)?,
                ToneValue::Ctcss(ch.ctone),
            ),
            CrossMode::NoneToTone => (ToneValue::None, ToneValue::Ctcss(ch.ctone)),
            CrossMode::NoneToDtcs => (ToneValue::None, dtcs_tone(ch.rx_dtcs, rx_pol, slot)?),
            CrossMode::DtcsToNone => (dtcs_tone(ch.dtcs, tx_pol, slot)?, ToneValue::None),
            CrossMode::ToneToNone => (ToneValue::Ctcss(ch.rtone), ToneValue::None),
            CrossMode::DtcsToDtcs => (
                dtcs_tone(ch.dtcs, tx_pol, slot)?,
                dtcs_tone(ch.rx_dtcs, rx_pol, slot)?,
            ),
        },
    })
}

fn apply_flags(
    ch: &Channel,
    record: &mut [u8],
    slot: usize,
    fmt: &MemFormat,
) -> Result<(), CodecError> {
    for flag in fmt.flags {
        let def = fmt
            .field(flag.field)
            .ok_or_else(|| CodecError::new(slot, flag.field, "flag names unknown field"))?;
        let label = match flag.target {
            FlagTarget::Mode => ch.mode.as_label(),
            FlagTarget::Power => ch.power.as_str(),
            FlagTarget::Skip => ch.skip.as_label(),
        };
        let idx = flag
            .values
            .iter()
            .position(|&v| v == label)
            .ok_or_else(|| {
                CodecError::new(
                    slot,
                    flag.field,
                    format!("'{label}' not in {:?}", flag.values),
                )
            })?;
        let mut raw = idx as u8;
        if flag.invert {
            raw ^= flag.mask >> flag.shift;
        }
        let byte = record
            .get_mut(def.offset)
            .ok_or_else(|| CodecError::new(slot, flag.field, "flag field outside record"))?;
        *byte = (*byte & !flag.mask) | ((raw << flag.shift) & flag.mask);
    }
    Ok(())
}
