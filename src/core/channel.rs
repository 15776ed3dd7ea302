// The neutral channel record every radio image decodes into.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("unknown duplex label: {0}")]
    UnknownDuplex(String),

    #[error("unknown tone mode label: {0}")]
    UnknownToneMode(String),

    #[error("unknown cross mode label: {0}")]
    UnknownCrossMode(String),

    #[error("unknown mode label: {0}")]
    UnknownMode(String),

    #[error("unknown skip label: {0}")]
    UnknownSkip(String),

    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),
}

pub type Result<T> = std::result::Result<T, ChannelError>;

/// Relationship between transmit and receive frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Duplex {
    /// Transmit on the receive frequency.
    #[default]
    Simplex,
    /// Transmit above the receive frequency by the offset.
    Plus,
    /// Transmit below the receive frequency by the offset.
    Minus,
    /// Independent transmit frequency stored in the offset field.
    Split,
    /// Transmit inhibited.
    Off,
}

impl Duplex {
    pub fn as_label(self) -> &'static str {
        match self {
            Duplex::Simplex => "",
            Duplex::Plus => "+",
            Duplex::Minus => "-",
            Duplex::Split => "split",
            Duplex::Off => "off",
        }
    }

    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "" => Ok(Duplex::Simplex),
            "+" => Ok(Duplex::Plus),
            "-" => Ok(Duplex::Minus),
            "split" => Ok(Duplex::Split),
            "off" => Ok(Duplex::Off),
            other => Err(ChannelError::UnknownDuplex(other.to_string())),
        }
    }
}

/// Squelch-tone configuration of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToneMode {
    #[default]
    None,
    /// CTCSS on transmit only.
    Tone,
    /// CTCSS on both sides (tone squelch).
    Tsql,
    /// DCS on both sides.
    Dtcs,
    /// DCS on receive only.
    DtcsR,
    /// CTCSS on receive only.
    TsqlR,
    /// Mixed encode/decode, detailed by the cross mode.
    Cross,
}

impl ToneMode {
    pub fn as_label(self) -> &'static str {
        match self {
            ToneMode::None => "",
            ToneMode::Tone => "Tone",
            ToneMode::Tsql => "TSQL",
            ToneMode::Dtcs => "DTCS",
            ToneMode::DtcsR => "DTCS-R",
            ToneMode::TsqlR => "TSQL-R",
            ToneMode::Cross => "Cross",
        }
    }

    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "" => Ok(ToneMode::None),
            "Tone" => Ok(ToneMode::Tone),
            "TSQL" => Ok(ToneMode::Tsql),
            "DTCS" => Ok(ToneMode::Dtcs),
            "DTCS-R" => Ok(ToneMode::DtcsR),
            "TSQL-R" => Ok(ToneMode::TsqlR),
            "Cross" => Ok(ToneMode::Cross),
            other => Err(ChannelError::UnknownToneMode(other.to_string())),
        }
    }
}

/// The eight encode->decode combinations a cross-mode channel can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrossMode {
    #[default]
    ToneToTone,
    ToneToDtcs,
    DtcsToTone,
    NoneToTone,
    NoneToDtcs,
    DtcsToNone,
    ToneToNone,
    DtcsToDtcs,
}

impl CrossMode {
    pub fn as_label(self) -> &'static str {
        match self {
            CrossMode::ToneToTone => "Tone->Tone",
            CrossMode::ToneToDtcs => "Tone->DTCS",
            CrossMode::DtcsToTone => "DTCS->Tone",
            CrossMode::NoneToTone => "->Tone",
            CrossMode::NoneToDtcs => "->DTCS",
            CrossMode::DtcsToNone => "DTCS->",
            CrossMode::ToneToNone => "Tone->",
            CrossMode::DtcsToDtcs => "DTCS->DTCS",
        }
    }

    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "Tone->Tone" => Ok(CrossMode::ToneToTone),
            "Tone->DTCS" => Ok(CrossMode::ToneToDtcs),
            "DTCS->Tone" => Ok(CrossMode::DtcsToTone),
            "->Tone" => Ok(CrossMode::NoneToTone),
            "->DTCS" => Ok(CrossMode::NoneToDtcs),
            "DTCS->" => Ok(CrossMode::DtcsToNone),
            "Tone->" => Ok(CrossMode::ToneToNone),
            "DTCS->DTCS" => Ok(CrossMode::DtcsToDtcs),
            other => Err(ChannelError::UnknownCrossMode(other.to_string())),
        }
    }
}

/// Modulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Fm,
    Nfm,
    Wfm,
    Am,
    Nam,
    Dv,
    Usb,
    Lsb,
    Cw,
    Rtty,
    Dig,
    Pkt,
    Dmr,
}

impl Mode {
    pub fn as_label(self) -> &'static str {
        match self {
            Mode::Fm => "FM",
            Mode::Nfm => "NFM",
            Mode::Wfm => "WFM",
            Mode::Am => "AM",
            Mode::Nam => "NAM",
            Mode::Dv => "DV",
            Mode::Usb => "USB",
            Mode::Lsb => "LSB",
            Mode::Cw => "CW",
            Mode::Rtty => "RTTY",
            Mode::Dig => "DIG",
            Mode::Pkt => "PKT",
            Mode::Dmr => "DMR",
        }
    }

    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "FM" => Ok(Mode::Fm),
            "NFM" => Ok(Mode::Nfm),
            "WFM" => Ok(Mode::Wfm),
            "AM" => Ok(Mode::Am),
            "NAM" => Ok(Mode::Nam),
            "DV" => Ok(Mode::Dv),
            "USB" => Ok(Mode::Usb),
            "LSB" => Ok(Mode::Lsb),
            "CW" => Ok(Mode::Cw),
            "RTTY" => Ok(Mode::Rtty),
            "DIG" => Ok(Mode::Dig),
            "PKT" => Ok(Mode::Pkt),
            "DMR" => Ok(Mode::Dmr),
            other => Err(ChannelError::UnknownMode(other.to_string())),
        }
    }
}

/// Scan behavior for the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Skip {
    #[default]
    None,
    Skip,
    Priority,
}

impl Skip {
    pub fn as_label(self) -> &'static str {
        match self {
            Skip::None => "",
            Skip::Skip => "S",
            Skip::Priority => "P",
        }
    }

    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "" => Ok(Skip::None),
            "S" => Ok(Skip::Skip),
            "P" => Ok(Skip::Priority),
            other => Err(ChannelError::UnknownSkip(other.to_string())),
        }
    }
}

/// One programmable memory slot.
///
/// CTCSS tones are stored in tenths of a hertz (885 = 88.5 Hz). The
/// offset field carries the transmit offset for plus/minus duplex and
/// the absolute transmit frequency for split operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// 1-based slot number, fixed at creation.
    pub index: u32,
    pub empty: bool,
    /// Receive frequency in Hz.
    pub freq: u64,
    /// Transmit offset in Hz (absolute TX frequency for split).
    pub offset: u64,
    pub duplex: Duplex,
    pub tone_mode: ToneMode,
    /// Transmit CTCSS in tenths of Hz.
    pub rtone: u16,
    /// Receive CTCSS in tenths of Hz.
    pub ctone: u16,
    /// Transmit DCS code.
    pub dtcs: u16,
    /// Receive DCS code.
    pub rx_dtcs: u16,
    /// Two characters from {N, R}: transmit and receive polarity.
    pub dtcs_polarity: String,
    pub cross_mode: CrossMode,
    pub mode: Mode,
    /// Tuning step in kHz.
    pub tuning_step: f32,
    pub skip: Skip,
    /// Model-defined power label (e.g. "High", "Low").
    pub power: String,
    pub name: String,
    pub comment: String,
}

impl Channel {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            empty: false,
            freq: 0,
            offset: 0,
            duplex: Duplex::Simplex,
            tone_mode: ToneMode::None,
            rtone: 885,
            ctone: 885,
            dtcs: 23,
            rx_dtcs: 23,
            dtcs_polarity: "NN".to_string(),
            cross_mode: CrossMode::ToneToTone,
            mode: Mode::Fm,
            tuning_step: 5.0,
            skip: Skip::None,
            power: String::new(),
            name: String::new(),
            comment: String::new(),
        }
    }

    pub fn new_empty(index: u32) -> Self {
        let mut ch = Self::new(index);
        ch.empty = true;
        ch
    }

    /// Derived transmit frequency in Hz. Zero when transmit is inhibited.
    pub fn tx_freq(&self) -> u64 {
        match self.duplex {
            Duplex::Simplex => self.freq,
            Duplex::Plus => self.freq + self.offset,
            Duplex::Minus => self.freq.saturating_sub(self.offset),
            Duplex::Split => self.offset,
            Duplex::Off => 0,
        }
    }

    /// Parse a frequency in MHz ("146.520") or with an explicit unit
    /// suffix ("146.52 MHz", "146520 kHz") into Hz.
    pub fn parse_freq(text: &str) -> Result<u64> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        if let Some(stripped) = text.strip_suffix(" MHz") {
            return Self::parse_freq(stripped);
        }
        if let Some(stripped) = text.strip_suffix(" kHz") {
            let khz: u64 = stripped
                .trim()
                .parse()
                .map_err(|_| ChannelError::InvalidFrequency(text.to_string()))?;
            return Ok(khz * 1000);
        }
        match text.split_once('.') {
            Some((mhz, frac)) => {
                if frac.len() > 6 || frac.chars().any(|c| !c.is_ascii_digit()) {
                    return Err(ChannelError::InvalidFrequency(text.to_string()));
                }
                let mhz: u64 = if mhz.is_empty() {
                    0
                } else {
                    mhz.parse()
                        .map_err(|_| ChannelError::InvalidFrequency(text.to_string()))?
                };
                let sub: u64 = format!("{frac:0<6}")
                    .parse()
                    .map_err(|_| ChannelError::InvalidFrequency(text.to_string()))?;
                Ok(mhz * 1_000_000 + sub)
            }
            None => {
                let mhz: u64 = text
                    .parse()
                    .map_err(|_| ChannelError::InvalidFrequency(text.to_string()))?;
                Ok(mhz * 1_000_000)
            }
        }
    }

    /// Format Hz as a fixed six-decimal MHz string.
    pub fn format_freq(freq: u64) -> String {
        format!("{}.{:06}", freq / 1_000_000, freq % 1_000_000)
    }

    /// Format tenths of Hz as a one-decimal string ("88.5").
    pub fn format_tone(dhz: u16) -> String {
        format!("{}.{}", dhz / 10, dhz % 10)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.empty {
            return write!(f, "#{}: (empty)", self.index);
        }
        let dup = match self.duplex {
            Duplex::Simplex => "/",
            d => d.as_label(),
        };
        write!(
            f,
            "#{}: {} {}{} {} [{}] {}",
            self.index,
            Self::format_freq(self.freq),
            dup,
            Self::format_freq(self.offset),
            self.mode.as_label(),
            self.tone_mode.as_label(),
            self.name,
        )
    }
}
