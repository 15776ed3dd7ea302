// The model catalogue. Adding a radio means adding data here.

use super::*;
use crate::core::Mode;
use crate::obfuscate::ChecksumKind;
use std::time::Duration;

// ---------------------------------------------------------------------
// Baofeng UV-5R family
// ---------------------------------------------------------------------

const UV5R_FIELDS: &[FieldDef] = &[
    FieldDef { name: "rxfreq", offset: 0, size: 4, kind: FieldKind::BcdLe { unit: 10 } },
    FieldDef { name: "txfreq", offset: 4, size: 4, kind: FieldKind::BcdLe { unit: 10 } },
    FieldDef { name: "rxtone", offset: 8, size: 2, kind: FieldKind::ToneU16Le },
    FieldDef { name: "txtone", offset: 10, size: 2, kind: FieldKind::ToneU16Le },
    FieldDef { name: "flags1", offset: 14, size: 1, kind: FieldKind::Byte },
    FieldDef { name: "flags2", offset: 15, size: 1, kind: FieldKind::Byte },
];

const UV5R_FLAGS: &[FlagMapping] = &[
    FlagMapping {
        target: FlagTarget::Power,
        field: "flags1",
        mask: 0x03,
        shift: 0,
        invert: false,
        values: &["High", "Low"],
    },
    FlagMapping {
        target: FlagTarget::Mode,
        field: "flags2",
        mask: 0x40,
        shift: 6,
        invert: false,
        values: &["NFM", "FM"],
    },
    // Scan bit set means the slot participates in scanning.
    FlagMapping {
        target: FlagTarget::Skip,
        field: "flags2",
        mask: 0x04,
        shift: 2,
        invert: true,
        values: &["", "S"],
    },
];

pub static UV5R_FORMAT: MemFormat = MemFormat {
    id: "uv5r",
    lossless: true,
    channel_size: 16,
    num_channels: 128,
    start_offset: 0x0008,
    name_table: Some(NameTable {
        offset: 0x1008,
        stride: 16,
        len: 7,
    }),
    name_len: 7,
    fields: UV5R_FIELDS,
    flags: UV5R_FLAGS,
    empty_check: EmptyCheck::BcdBytes { field: "rxfreq" },
    defaults: Defaults {
        mode: None,
        power: None,
        tuning_step: Some(5.0),
    },
    split_threshold_hz: 70_000_000,
};

pub static UV5R_PROTOCOL: ProtocolDescriptor = ProtocolDescriptor {
    id: "baofeng-magic",
    baud: 9600,
    handshake: Handshake::Magic(MagicHandshake {
        magics: &[
            b"\x50\xBB\xFF\x20\x12\x07\x25",
            b"\x50\xBB\xFF\x01\x25\x98\x4D",
        ],
        inter_byte_delay: Duration::from_millis(10),
        ack: 0x06,
        ident_cmd: 0x02,
        ident_sentinel: Some(0xDD),
        ident_min: 8,
        ident_max: 12,
        ack_after_ident: true,
    }),
    read_frame: ReadFrame {
        cmd: b'S',
        block_size: 0x40,
        response_header: true,
        response_cmd: Some(b'X'),
        strip_prefix: 0,
        ack_after_block: Some((0x06, Duration::from_millis(50))),
    },
    write_frame: WriteFrame {
        cmd: b'X',
        block_size: 0x10,
        ack: 0x06,
        post_ack_delay: Duration::from_millis(50),
    },
    layout: MemoryLayout::Ranged {
        main: (0x0000, 0x1800),
        aux: Some((0x1EC0, 0x2000)),
    },
    obfuscation: Obfuscation::None,
    timing: STANDARD_TIMING,
    ident_header_len: 8,
    checksum: None,
    mem_format: &UV5R_FORMAT,
};

// ---------------------------------------------------------------------
// Wouxun KG-UV8D
// ---------------------------------------------------------------------

const KGUV8D_FIELDS: &[FieldDef] = &[
    FieldDef { name: "rxfreq", offset: 0, size: 4, kind: FieldKind::BcdLe { unit: 10 } },
    FieldDef { name: "txfreq", offset: 4, size: 4, kind: FieldKind::BcdLe { unit: 10 } },
    FieldDef { name: "txtone", offset: 8, size: 2, kind: FieldKind::ToneU16Le },
    FieldDef { name: "rxtone", offset: 10, size: 2, kind: FieldKind::ToneU16Le },
    FieldDef { name: "flags1", offset: 12, size: 1, kind: FieldKind::Byte },
    FieldDef { name: "flags2", offset: 13, size: 1, kind: FieldKind::Byte },
];

const KGUV8D_FLAGS: &[FlagMapping] = &[
    FlagMapping {
        target: FlagTarget::Mode,
        field: "flags1",
        mask: 0x10,
        shift: 4,
        invert: false,
        values: &["NFM", "FM"],
    },
    FlagMapping {
        target: FlagTarget::Power,
        field: "flags1",
        mask: 0x01,
        shift: 0,
        invert: false,
        values: &["Low", "High"],
    },
    FlagMapping {
        target: FlagTarget::Skip,
        field: "flags2",
        mask: 0x01,
        shift: 0,
        invert: false,
        values: &["", "S"],
    },
];

pub static KGUV8D_FORMAT: MemFormat = MemFormat {
    id: "kg-uv8d",
    lossless: true,
    channel_size: 16,
    num_channels: 500,
    start_offset: 0x0400,
    name_table: Some(NameTable {
        offset: 0x3400,
        stride: 8,
        len: 8,
    }),
    name_len: 8,
    fields: KGUV8D_FIELDS,
    flags: KGUV8D_FLAGS,
    empty_check: EmptyCheck::BcdBytes { field: "rxfreq" },
    defaults: Defaults {
        mode: None,
        power: None,
        tuning_step: Some(12.5),
    },
    split_threshold_hz: 70_000_000,
};

pub static KGUV8D_PROTOCOL: ProtocolDescriptor = ProtocolDescriptor {
    id: "wouxun-program",
    baud: 19200,
    handshake: Handshake::Program(ProgramHandshake {
        pre_command: Some((b"\x02", Duration::from_millis(100))),
        program: b"PROGRAM",
        ack: 0x06,
        retries: 3,
        ack_window: Duration::from_millis(500),
        ident_cmd: Some(0x02),
        ident_len: 8,
        ident_prefix: Some(b"KG-UV8D"),
        ack_after_ident: false,
    }),
    read_frame: ReadFrame {
        cmd: b'R',
        block_size: 0x40,
        response_header: true,
        response_cmd: None,
        strip_prefix: 0,
        ack_after_block: None,
    },
    write_frame: WriteFrame {
        cmd: b'W',
        block_size: 0x40,
        ack: 0x06,
        post_ack_delay: Duration::from_millis(50),
    },
    layout: MemoryLayout::Ranged {
        main: (0x0000, 0x8000),
        aux: None,
    },
    obfuscation: Obfuscation::Wouxun { init: 0x57 },
    timing: STANDARD_TIMING,
    ident_header_len: 0,
    checksum: Some(ChecksumKind::RangeSum {
        start: 0,
        stop: 0x7FFE,
        store: 0x7FFF,
    }),
    mem_format: &KGUV8D_FORMAT,
};

// ---------------------------------------------------------------------
// Baofeng UV-17Pro family
// ---------------------------------------------------------------------

const UV17_FIELDS: &[FieldDef] = &[
    FieldDef { name: "rxfreq", offset: 0, size: 4, kind: FieldKind::BcdLe { unit: 10 } },
    FieldDef { name: "txfreq", offset: 4, size: 4, kind: FieldKind::BcdLe { unit: 10 } },
    FieldDef { name: "rxtone", offset: 8, size: 2, kind: FieldKind::ToneU16Le },
    FieldDef { name: "txtone", offset: 10, size: 2, kind: FieldKind::ToneU16Le },
    FieldDef { name: "flags1", offset: 12, size: 1, kind: FieldKind::Byte },
    FieldDef { name: "flags2", offset: 13, size: 1, kind: FieldKind::Byte },
    FieldDef { name: "flags3", offset: 14, size: 1, kind: FieldKind::Byte },
];

const UV17_FLAGS: &[FlagMapping] = &[
    FlagMapping {
        target: FlagTarget::Mode,
        field: "flags1",
        mask: 0x01,
        shift: 0,
        invert: false,
        values: &["NFM", "FM"],
    },
    FlagMapping {
        target: FlagTarget::Power,
        field: "flags2",
        mask: 0x03,
        shift: 0,
        invert: false,
        values: &["High", "Med", "Low"],
    },
    FlagMapping {
        target: FlagTarget::Skip,
        field: "flags3",
        mask: 0x02,
        shift: 1,
        invert: false,
        values: &["", "S"],
    },
];

pub static UV17PRO_FORMAT: MemFormat = MemFormat {
    id: "uv17pro",
    lossless: true,
    channel_size: 32,
    num_channels: 1000,
    start_offset: 0x0000,
    name_table: Some(NameTable {
        offset: 0x8000,
        stride: 16,
        len: 12,
    }),
    name_len: 12,
    fields: UV17_FIELDS,
    flags: UV17_FLAGS,
    empty_check: EmptyCheck::BcdBytes { field: "rxfreq" },
    defaults: Defaults {
        mode: None,
        power: None,
        tuning_step: Some(12.5),
    },
    split_threshold_hz: 70_000_000,
};

/// 25-byte session-parameter command of the UV17Pro handshake.
const UV17_SEND: &[u8] = &[
    b'S', b'E', b'N', b'D', 0x21, 0x05, 0x0D, 0x01, 0x01, 0x01, 0x04, 0x11, 0x08, 0x05, 0x0D,
    0x0D, 0x01, 0x11, 0x0F, 0x09, 0x12, 0x09, 0x10, 0x04, 0x00,
];

pub static UV17PRO_PROTOCOL: ProtocolDescriptor = ProtocolDescriptor {
    id: "uv17pro",
    baud: 115_200,
    handshake: Handshake::Uv17(Uv17Handshake {
        idents: &[b"PROGRAMBF5RTECHU"],
        fingerprint: b"\x06",
        settle: Duration::from_millis(200),
        followups: &[(b"F", 16), (b"M", 6), (UV17_SEND, 1)],
        followup_delay: Duration::from_millis(50),
    }),
    read_frame: ReadFrame {
        cmd: b'R',
        block_size: 0x40,
        response_header: false,
        response_cmd: None,
        strip_prefix: 4,
        ack_after_block: None,
    },
    write_frame: WriteFrame {
        cmd: b'W',
        block_size: 0x40,
        ack: 0x06,
        post_ack_delay: Duration::from_millis(50),
    },
    layout: MemoryLayout::Regions {
        regions: &[(0x0000, 0x8000), (0xA000, 0x4000), (0xF000, 0x2000)],
        total_size: 0xE000,
    },
    obfuscation: Obfuscation::Uv17Pro { symbol_index: 1 },
    timing: STANDARD_TIMING,
    ident_header_len: 0,
    checksum: None,
    mem_format: &UV17PRO_FORMAT,
};

// ---------------------------------------------------------------------
// Generic fallback format
// ---------------------------------------------------------------------

const GENERIC_FIELDS: &[FieldDef] = &[
    FieldDef { name: "rxfreq", offset: 0, size: 4, kind: FieldKind::BcdLe { unit: 10 } },
    FieldDef { name: "txfreq", offset: 4, size: 4, kind: FieldKind::BcdLe { unit: 10 } },
];

/// Minimal layout for radios whose record format has not been mapped.
/// Decode works well enough to inspect frequencies; upload is refused
/// because the format is not lossless.
pub static GENERIC_FORMAT: MemFormat = MemFormat {
    id: "generic",
    lossless: false,
    channel_size: 16,
    num_channels: 16,
    start_offset: 0x0000,
    name_table: None,
    name_len: 0,
    fields: GENERIC_FIELDS,
    flags: &[],
    empty_check: EmptyCheck::BcdBytes { field: "rxfreq" },
    defaults: Defaults {
        mode: Some(Mode::Fm),
        power: Some("High"),
        tuning_step: Some(5.0),
    },
    split_threshold_hz: 70_000_000,
};

pub static BF888_PROTOCOL: ProtocolDescriptor = ProtocolDescriptor {
    id: "baofeng-program",
    baud: 9600,
    handshake: Handshake::Program(ProgramHandshake {
        pre_command: None,
        program: b"\x02PROGRAM",
        ack: 0x06,
        retries: 3,
        ack_window: Duration::from_millis(500),
        ident_cmd: Some(0x02),
        ident_len: 8,
        ident_prefix: None,
        ack_after_ident: true,
    }),
    read_frame: ReadFrame {
        cmd: b'R',
        block_size: 0x08,
        response_header: true,
        response_cmd: None,
        strip_prefix: 0,
        ack_after_block: Some((0x06, Duration::from_millis(20))),
    },
    write_frame: WriteFrame {
        cmd: b'W',
        block_size: 0x08,
        ack: 0x06,
        post_ack_delay: Duration::from_millis(20),
    },
    layout: MemoryLayout::Ranged {
        main: (0x0000, 0x0400),
        aux: None,
    },
    obfuscation: Obfuscation::None,
    timing: STANDARD_TIMING,
    ident_header_len: 0,
    checksum: None,
    mem_format: &GENERIC_FORMAT,
};

// ---------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------

pub static MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        vendor: "Baofeng",
        model: "UV-5R",
        display: "Baofeng UV-5R",
        protocol: &UV5R_PROTOCOL,
        memsize: 0x1948, // 8-byte ident header + main + aux
        overrides: ModelOverrides {
            baud: None,
            obfuscation: None,
        },
    },
    ModelDescriptor {
        vendor: "Baofeng",
        model: "UV-82",
        display: "Baofeng UV-82",
        protocol: &UV5R_PROTOCOL,
        memsize: 0x1948,
        overrides: ModelOverrides {
            baud: None,
            obfuscation: None,
        },
    },
    ModelDescriptor {
        vendor: "Wouxun",
        model: "KG-UV8D",
        display: "Wouxun KG-UV8D",
        protocol: &KGUV8D_PROTOCOL,
        memsize: 0x8000,
        overrides: ModelOverrides {
            baud: None,
            obfuscation: None,
        },
    },
    ModelDescriptor {
        vendor: "Baofeng",
        model: "UV-17Pro",
        display: "Baofeng UV-17Pro",
        protocol: &UV17PRO_PROTOCOL,
        memsize: 0xE000,
        overrides: ModelOverrides {
            baud: None,
            obfuscation: None,
        },
    },
    ModelDescriptor {
        vendor: "Baofeng",
        model: "UV-17ProGPS",
        display: "Baofeng UV-17Pro GPS",
        protocol: &UV17PRO_PROTOCOL,
        memsize: 0xE000,
        overrides: ModelOverrides {
            baud: None,
            obfuscation: Some(Obfuscation::Uv17Pro { symbol_index: 4 }),
        },
    },
    ModelDescriptor {
        vendor: "Baofeng",
        model: "BF-888S",
        display: "Baofeng BF-888S",
        protocol: &BF888_PROTOCOL,
        memsize: 0x0400,
        overrides: ModelOverrides {
            baud: None,
            obfuscation: None,
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memsize_covers_layout_and_header() {
        for model in MODELS {
            let proto = model.effective_protocol();
            let expected = proto.ident_header_len + proto.layout.total_bytes();
            assert_eq!(
                model.memsize, expected,
                "{} memsize disagrees with its layout",
                model.full_name()
            );
        }
    }

    #[test]
    fn formats_fit_inside_images() {
        for model in MODELS {
            let fmt = model.protocol.mem_format;
            let records_end = fmt.start_offset + fmt.num_channels * fmt.channel_size;
            assert!(
                records_end <= model.memsize,
                "{}: channel records spill past the image",
                model.full_name()
            );
            if let Some(names) = fmt.name_table {
                let names_end = names.offset + fmt.num_channels * names.stride;
                assert!(
                    names_end <= model.memsize,
                    "{}: name table spills past the image",
                    model.full_name()
                );
            }
        }
    }

    #[test]
    fn fields_fit_inside_records() {
        for model in MODELS {
            let fmt = model.protocol.mem_format;
            for field in fmt.fields {
                assert!(
                    field.offset + field.size <= fmt.channel_size,
                    "{}: field {} spills past the record",
                    model.full_name(),
                    field.name
                );
            }
            for flag in fmt.flags {
                let field = fmt.field(flag.field).expect("flag names a missing field");
                assert_eq!(field.kind, FieldKind::Byte, "flags map over byte fields");
            }
        }
    }

    #[test]
    fn uv17_send_command_length() {
        assert_eq!(UV17_SEND.len(), 25);
    }

    #[test]
    fn frequency_fields_are_universal() {
        for model in MODELS {
            let fmt = model.protocol.mem_format;
            assert!(fmt.field("rxfreq").is_some());
            assert!(fmt.field("txfreq").is_some());
        }
    }
}
