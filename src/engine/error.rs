// Engine error taxonomy.

use crate::codec::CodecError;
use crate::serial::TransportError;
use std::fmt;
use thiserror::Error;

/// Which part of a clone session an error or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Handshake,
    Download,
    Upload,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Handshake => "handshake",
            Phase::Download => "download",
            Phase::Upload => "upload",
        })
    }
}

#[derive(Error, Debug)]
pub enum CloneError {
    #[error("serial transport unsupported on this platform")]
    UnsupportedTransport,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("port unavailable: {0}")]
    PortUnavailable(String),

    #[error("handshake failed: {reason}")]
    HandshakeFailed {
        reason: String,
        last_response: Option<u8>,
    },

    #[error("protocol error{at}: observed {observed:02X?}, expected {expected:02X?}", at = fmt_addr(.address))]
    ProtocolError {
        address: Option<u32>,
        observed: Vec<u8>,
        expected: Vec<u8>,
    },

    #[error("timeout during {phase}{at}", at = fmt_addr(.address))]
    Timeout { phase: Phase, address: Option<u32> },

    #[error("block at {address:#06X} not acknowledged (got {ack:02X?})")]
    WriteFailed { address: u32, ack: Option<u8> },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("upload refused: {reason}")]
    UploadRefused { reason: String },

    #[error("cancelled during {phase} after {bytes_done} bytes")]
    Cancelled { phase: Phase, bytes_done: usize },

    #[error("transport failure during {phase}: {source}")]
    Transport {
        phase: Phase,
        #[source]
        source: TransportError,
    },
}

fn fmt_addr(address: &Option<u32>) -> String {
    match address {
        Some(a) => format!(" at {a:#06X}"),
        None => String::new(),
    }
}

impl CloneError {
    /// Annotate a transport error with the phase and, for timeouts, the
    /// block address in flight.
    pub fn from_transport(err: TransportError, phase: Phase, address: Option<u32>) -> Self {
        match err {
            TransportError::Timeout(_) => CloneError::Timeout { phase, address },
            TransportError::Unsupported => CloneError::UnsupportedTransport,
            TransportError::PermissionDenied(msg) => CloneError::PermissionDenied(msg),
            TransportError::PortUnavailable(msg) => CloneError::PortUnavailable(msg),
            other => CloneError::Transport {
                phase,
                source: other,
            },
        }
    }
}

pub type CloneResult<T> = std::result::Result<T, CloneError>;
