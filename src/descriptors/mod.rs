// Protocol and memory-format descriptors.
//
// Everything a radio model needs is expressed as immutable data: how to
// wake it up, how blocks are framed, where memory lives, how payloads
// are scrambled, and how channel records are laid out. The engine and
// codec consume these tables; supporting a new radio means adding an
// entry in models.rs, not writing code.

pub mod models;
pub mod registry;

use crate::core::Mode;
use crate::obfuscate::ChecksumKind;
use std::time::Duration;

pub use registry::{all_models, find_model};

/// Per-step deadlines. Clone-mode firmware is slow and serial cables
/// add latency, so every protocol carries its own budget.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Stale-byte drain between steps.
    pub drain: Duration,
    /// Waiting for the handshake ACK byte.
    pub handshake_ack: Duration,
    /// Per-byte deadline while reading the identification response.
    pub ident_byte: Duration,
    /// Whole-block read deadline.
    pub block: Duration,
    /// Waiting for the ACK after an uploaded block.
    pub write_ack: Duration,
}

pub const STANDARD_TIMING: Timing = Timing {
    drain: Duration::from_millis(100),
    handshake_ack: Duration::from_secs(3),
    ident_byte: Duration::from_millis(500),
    block: Duration::from_secs(2),
    write_ack: Duration::from_secs(2),
};

/// Handshake driven by a magic byte sequence (most Baofeng handhelds).
#[derive(Debug, Clone, Copy)]
pub struct MagicHandshake {
    /// Candidate wake-up sequences, tried in order.
    pub magics: &'static [&'static [u8]],
    /// Gap between the individual magic bytes.
    pub inter_byte_delay: Duration,
    pub ack: u8,
    /// Identification request, usually 0x02.
    pub ident_cmd: u8,
    /// Byte that terminates the identification response early.
    pub ident_sentinel: Option<u8>,
    pub ident_min: usize,
    pub ident_max: usize,
    /// Send an ACK after the identification and discard one reply byte.
    pub ack_after_ident: bool,
}

/// Handshake driven by a literal program phrase (Wouxun and relatives).
#[derive(Debug, Clone, Copy)]
pub struct ProgramHandshake {
    /// Optional command sent before the phrase, with a settle delay.
    pub pre_command: Option<(&'static [u8], Duration)>,
    pub program: &'static [u8],
    pub ack: u8,
    /// ACK wait attempts; each gets its own window.
    pub retries: u32,
    pub ack_window: Duration,
    /// Identification request after the ACK, if the model has one.
    pub ident_cmd: Option<u8>,
    pub ident_len: usize,
    /// Expected identification prefix. Mismatch logs a warning only.
    pub ident_prefix: Option<&'static [u8]>,
    pub ack_after_ident: bool,
}

/// Handshake for the UV17Pro family: a 16-byte identification literal,
/// a fingerprint check, then a fixed run of follow-up commands.
#[derive(Debug, Clone, Copy)]
pub struct Uv17Handshake {
    pub idents: &'static [&'static [u8]],
    /// Required response prefix.
    pub fingerprint: &'static [u8],
    /// Wait before polling for the first response byte.
    pub settle: Duration,
    /// (command, declared response length) pairs sent after the ident.
    pub followups: &'static [(&'static [u8], usize)],
    /// Gap between follow-up commands.
    pub followup_delay: Duration,
}

#[derive(Debug, Clone, Copy)]
pub enum Handshake {
    Magic(MagicHandshake),
    Program(ProgramHandshake),
    Uv17(Uv17Handshake),
}

/// Framing of a block-read request and its response.
#[derive(Debug, Clone, Copy)]
pub struct ReadFrame {
    pub cmd: u8,
    pub block_size: usize,
    /// The response echoes [cmd, addr_hi, addr_lo, size] before the data.
    pub response_header: bool,
    /// Command byte expected in the response header when it differs from
    /// the request command (UV-5R answers an 'S' read with 'X').
    pub response_cmd: Option<u8>,
    /// Fixed-length prefix to strip from the response data.
    pub strip_prefix: usize,
    /// ACK byte to send after each block, with a settle delay.
    pub ack_after_block: Option<(u8, Duration)>,
}

/// Framing of a block-write request.
#[derive(Debug, Clone, Copy)]
pub struct WriteFrame {
    pub cmd: u8,
    pub block_size: usize,
    pub ack: u8,
    pub post_ack_delay: Duration,
}

/// Where the radio's memory lives on the wire.
#[derive(Debug, Clone, Copy)]
pub enum MemoryLayout {
    /// One [start, end) range, with an optional auxiliary range whose
    /// read failure truncates instead of aborting.
    Ranged {
        main: (u32, u32),
        aux: Option<(u32, u32)>,
    },
    /// Non-contiguous (start, size) regions, decoded in order; the image
    /// is their concatenation.
    Regions {
        regions: &'static [(u32, usize)],
        total_size: usize,
    },
}

impl MemoryLayout {
    /// Total byte budget, which drives progress percentages.
    pub fn total_bytes(&self) -> usize {
        match self {
            MemoryLayout::Ranged { main, aux } => {
                let main_len = (main.1 - main.0) as usize;
                let aux_len = aux.map(|(s, e)| (e - s) as usize).unwrap_or(0);
                main_len + aux_len
            }
            MemoryLayout::Regions { total_size, .. } => *total_size,
        }
    }
}

/// Payload scrambling applied per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obfuscation {
    None,
    Uv17Pro { symbol_index: usize },
    Wouxun { init: u8 },
}

/// Wire-level description of one protocol family.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolDescriptor {
    pub id: &'static str,
    pub baud: u32,
    pub handshake: Handshake,
    pub read_frame: ReadFrame,
    pub write_frame: WriteFrame,
    pub layout: MemoryLayout,
    pub obfuscation: Obfuscation,
    pub timing: Timing,
    /// Bytes of the identification response kept as an image header.
    pub ident_header_len: usize,
    /// Whole-image checksum, verified after download and restamped
    /// before upload.
    pub checksum: Option<ChecksumKind>,
    pub mem_format: &'static MemFormat,
}

/// Separate name table when names live outside the channel record.
#[derive(Debug, Clone, Copy)]
pub struct NameTable {
    pub offset: usize,
    pub stride: usize,
    pub len: usize,
}

/// How a field's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Little-endian packed decimal; `unit` multiplies the decoded value.
    BcdLe { unit: u32 },
    /// Big-endian packed decimal.
    BcdBe { unit: u32 },
    U16Le,
    U16Be,
    U32Le,
    Byte,
    /// 16-bit squelch-tone encoding: 0/0xFFFF none, 0x8000 flag for DCS
    /// (low 12 bits the code, 0x4000 reverse polarity), CTCSS otherwise
    /// in tenths of Hz.
    ToneU16Le,
    /// Fixed-width text, terminated by 0x00 or 0xFF.
    Str,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
    pub kind: FieldKind,
}

/// Which channel attribute a bit field feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagTarget {
    Mode,
    Power,
    Skip,
}

/// A symbolic bit field over a named byte field.
#[derive(Debug, Clone, Copy)]
pub struct FlagMapping {
    pub target: FlagTarget,
    pub field: &'static str,
    pub mask: u8,
    pub shift: u8,
    /// Flip the extracted bits before indexing `values`.
    pub invert: bool,
    /// Domain labels indexed by the extracted value.
    pub values: &'static [&'static str],
}

/// How an unused slot is recognized.
#[derive(Debug, Clone, Copy)]
pub enum EmptyCheck {
    /// All bytes of the field are 0xFF or all 0x00. The byte-level check
    /// matters for BCD fields, where 0xFF is not a decodable digit pair.
    BcdBytes { field: &'static str },
    /// The decoded integer equals one of the sentinel values.
    Sentinels {
        field: &'static str,
        values: &'static [u64],
    },
}

/// Values applied when a format does not carry the attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct Defaults {
    pub mode: Option<Mode>,
    pub power: Option<&'static str>,
    pub tuning_step: Option<f32>,
}

/// Data-driven layout of channel records inside a raw image.
#[derive(Debug, Clone, Copy)]
pub struct MemFormat {
    pub id: &'static str,
    /// Whether decode/encode is byte-exact outside declared fields.
    /// Uploads through a non-lossless format are refused.
    pub lossless: bool,
    pub channel_size: usize,
    pub num_channels: usize,
    pub start_offset: usize,
    pub name_table: Option<NameTable>,
    /// Maximum name length for in-record or table names.
    pub name_len: usize,
    pub fields: &'static [FieldDef],
    pub flags: &'static [FlagMapping],
    pub empty_check: EmptyCheck,
    pub defaults: Defaults,
    /// TX/RX distance beyond which the pair is treated as split.
    pub split_threshold_hz: u64,
}

impl MemFormat {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Per-model adjustments layered over the protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelOverrides {
    pub baud: Option<u32>,
    pub obfuscation: Option<Obfuscation>,
}

/// One supported radio model.
#[derive(Debug, Clone, Copy)]
pub struct ModelDescriptor {
    pub vendor: &'static str,
    pub model: &'static str,
    pub display: &'static str,
    pub protocol: &'static ProtocolDescriptor,
    /// Expected image size, including any ident header.
    pub memsize: usize,
    pub overrides: ModelOverrides,
}

impl ModelDescriptor {
    /// The protocol with this model's overrides applied.
    pub fn effective_protocol(&self) -> ProtocolDescriptor {
        let mut proto = *self.protocol;
        if let Some(baud) = self.overrides.baud {
            proto.baud = baud;
        }
        if let Some(obf) = self.overrides.obfuscation {
            proto.obfuscation = obf;
        }
        proto
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.vendor, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_byte_budget() {
        let ranged = MemoryLayout::Ranged {
            main: (0x0000, 0x1800),
            aux: Some((0x1EC0, 0x2000)),
        };
        assert_eq!(ranged.total_bytes(), 0x1800 + 0x140);

        let regions = MemoryLayout::Regions {
            regions: &[(0x0000, 0x100), (0x8000, 0x80)],
            total_size: 0x180,
        };
        assert_eq!(regions.total_bytes(), 0x180);
    }

    #[test]
    fn overrides_apply() {
        let model = find_model("Baofeng", "UV-17ProGPS").unwrap();
        let proto = model.effective_protocol();
        assert_ne!(
            proto.obfuscation,
            model.protocol.obfuscation,
            "override should replace the base obfuscation"
        );
    }
}
