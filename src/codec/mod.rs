// Data-driven memory codec.
//
// The decoder and encoder never hardcode a layout; they walk the field
// map of a memory-format descriptor. The encoder starts from the bytes
// that came out of the radio, so anything the descriptor does not
// describe survives a decode/encode cycle untouched.

pub mod decode;
pub mod encode;
pub mod fields;

use thiserror::Error;

pub use decode::decode_image;
pub use encode::encode_image;
pub use fields::{decode_tone_u16, encode_tone_u16, FieldValue, ToneValue};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("channel {channel_index} field '{field}': {cause}")]
pub struct CodecError {
    /// Zero-based slot the failure occurred in.
    pub channel_index: usize,
    pub field: String,
    pub cause: String,
}

impl CodecError {
    pub fn new(channel_index: usize, field: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            channel_index,
            field: field.into(),
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Channel, CrossMode, Duplex, MemoryMap, Mode, Skip, ToneMode};
    use crate::descriptors::models::UV5R_FORMAT;

    fn blank_image() -> MemoryMap {
        MemoryMap::filled(0x1948)
    }

    fn sample_channel(index: u32) -> Channel {
        let mut ch = Channel::new(index);
        ch.freq = 146_520_000;
        ch.duplex = Duplex::Plus;
        ch.offset = 600_000;
        ch.tone_mode = ToneMode::Tone;
        ch.rtone = 885;
        ch.mode = Mode::Fm;
        ch.power = "High".to_string();
        ch.skip = Skip::None;
        ch.name = "CALL".to_string();
        ch
    }

    #[test]
    fn all_empty_image_roundtrips_bit_exact() {
        let raw = blank_image();
        let array = decode_image(&raw, &UV5R_FORMAT).unwrap();
        assert_eq!(array.occupied().count(), 0);

        let rebuilt = encode_image(&raw, &array, &UV5R_FORMAT).unwrap();
        assert_eq!(rebuilt.bytes(), raw.bytes());
    }

    #[test]
    fn field_roundtrip_through_raw_bytes() {
        let raw = blank_image();
        let mut array = decode_image(&raw, &UV5R_FORMAT).unwrap();
        array.set(sample_channel(1)).unwrap();

        let encoded = encode_image(&raw, &array, &UV5R_FORMAT).unwrap();
        let decoded = decode_image(&encoded, &UV5R_FORMAT).unwrap();
        let got = decoded.get(1).unwrap();

        assert!(!got.empty);
        assert_eq!(got.freq, 146_520_000);
        assert_eq!(got.duplex, Duplex::Plus);
        assert_eq!(got.offset, 600_000);
        assert_eq!(got.tone_mode, ToneMode::Tone);
        assert_eq!(got.rtone, 885);
        assert_eq!(got.mode, Mode::Fm);
        assert_eq!(got.power, "High");
        assert_eq!(got.skip, Skip::None);
        assert_eq!(got.name, "CALL");
    }

    #[test]
    fn tone_mode_variants_roundtrip() {
        let raw = blank_image();

        let mut tsql = sample_channel(2);
        tsql.tone_mode = ToneMode::Tsql;
        tsql.ctone = 1000;
        tsql.rtone = 1000;

        let mut dtcs = sample_channel(3);
        dtcs.tone_mode = ToneMode::Dtcs;
        dtcs.dtcs = 23;
        dtcs.rx_dtcs = 23;
        dtcs.dtcs_polarity = "RN".to_string();

        let mut cross = sample_channel(4);
        cross.tone_mode = ToneMode::Cross;
        cross.cross_mode = CrossMode::ToneToDtcs;
        cross.rtone = 885;
        cross.rx_dtcs = 371;
        cross.dtcs_polarity = "NR".to_string();

        let mut array = decode_image(&raw, &UV5R_FORMAT).unwrap();
        for ch in [tsql.clone(), dtcs.clone(), cross.clone()] {
            array.set(ch).unwrap();
        }

        let decoded =
            decode_image(&encode_image(&raw, &array, &UV5R_FORMAT).unwrap(), &UV5R_FORMAT)
                .unwrap();

        let got = decoded.get(2).unwrap();
        assert_eq!(got.tone_mode, ToneMode::Tsql);
        assert_eq!(got.ctone, 1000);

        let got = decoded.get(3).unwrap();
        assert_eq!(got.tone_mode, ToneMode::Dtcs);
        assert_eq!(got.dtcs, 23);
        assert_eq!(got.dtcs_polarity, "RN");

        let got = decoded.get(4).unwrap();
        assert_eq!(got.tone_mode, ToneMode::Cross);
        assert_eq!(got.cross_mode, CrossMode::ToneToDtcs);
        assert_eq!(got.rtone, 885);
        assert_eq!(got.rx_dtcs, 371);
        assert_eq!(got.dtcs_polarity, "NR");
    }

    #[test]
    fn undeclared_bytes_survive() {
        let mut raw = blank_image();
        // Occupy slot 1, then scribble on record bytes no field declares
        // (offsets 12 and 13 of a 16-byte record).
        let mut array = decode_image(&raw, &UV5R_FORMAT).unwrap();
        array.set(sample_channel(1)).unwrap();
        raw = encode_image(&raw, &array, &UV5R_FORMAT).unwrap();
        raw.set(0x0008 + 12, &[0xAB, 0xCD]).unwrap();

        let cycled = encode_image(
            &raw,
            &decode_image(&raw, &UV5R_FORMAT).unwrap(),
            &UV5R_FORMAT,
        )
        .unwrap();

        assert_eq!(cycled.get(0x0008 + 12, 2).unwrap(), &[0xAB, 0xCD]);
        assert_eq!(cycled.bytes(), raw.bytes());
    }

    #[test]
    fn empty_slots_never_rewritten() {
        let mut raw = blank_image();
        // Slot 5 holds junk that still passes the empty check (all 0x00).
        let slot5 = 0x0008 + 4 * 16;
        raw.set(slot5, &[0x00; 16]).unwrap();

        let array = decode_image(&raw, &UV5R_FORMAT).unwrap();
        assert!(array.get(5).unwrap().empty);

        let rebuilt = encode_image(&raw, &array, &UV5R_FORMAT).unwrap();
        assert_eq!(rebuilt.get(slot5, 16).unwrap(), &[0x00; 16]);
    }

    #[test]
    fn tx_inhibit_roundtrip() {
        let raw = blank_image();
        let mut ch = sample_channel(9);
        ch.duplex = Duplex::Off;
        ch.offset = 0;
        ch.tone_mode = ToneMode::None;

        let mut array = decode_image(&raw, &UV5R_FORMAT).unwrap();
        array.set(ch).unwrap();
        let encoded = encode_image(&raw, &array, &UV5R_FORMAT).unwrap();

        // TX frequency field is 0xFF fill on the wire.
        let record = encoded.get(0x0008 + 8 * 16, 16).unwrap();
        assert_eq!(&record[4..8], &[0xFF; 4]);

        let got = decode_image(&encoded, &UV5R_FORMAT).unwrap();
        assert_eq!(got.get(9).unwrap().duplex, Duplex::Off);
    }

    #[test]
    fn split_operation_roundtrip() {
        let raw = blank_image();
        let mut ch = sample_channel(10);
        ch.duplex = Duplex::Split;
        ch.offset = 446_000_000;

        let mut array = decode_image(&raw, &UV5R_FORMAT).unwrap();
        array.set(ch).unwrap();
        let decoded = decode_image(
            &encode_image(&raw, &array, &UV5R_FORMAT).unwrap(),
            &UV5R_FORMAT,
        )
        .unwrap();

        let got = decoded.get(10).unwrap();
        assert_eq!(got.duplex, Duplex::Split);
        assert_eq!(got.offset, 446_000_000);
        assert_eq!(got.freq, 146_520_000);
    }

    #[test]
    fn short_image_leaves_tail_empty() {
        // Room for the header and only two records.
        let raw = MemoryMap::filled(0x0008 + 2 * 16);
        let array = decode_image(&raw, &UV5R_FORMAT).unwrap();
        assert_eq!(array.len(), 128);
        assert!(array.iter().all(|c| c.empty));
    }

    #[test]
    fn invalid_dtcs_code_refused_on_encode() {
        let raw = blank_image();
        let mut ch = sample_channel(1);
        ch.tone_mode = ToneMode::Dtcs;
        ch.dtcs = 999;
        ch.rx_dtcs = 999;

        let mut array = decode_image(&raw, &UV5R_FORMAT).unwrap();
        array.set(ch).unwrap();
        let err = encode_image(&raw, &array, &UV5R_FORMAT).unwrap_err();
        assert_eq!(err.channel_index, 0);
    }
}
