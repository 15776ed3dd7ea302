// radioclone: clone-protocol engine and memory codec for
// serial-programmed handheld radios.
// Licensed under GPLv3

pub mod bitwise;
pub mod codec;
pub mod core;
pub mod descriptors;
pub mod engine;
pub mod formats;
pub mod obfuscate;
pub mod serial;

// Re-export the types most callers need
pub use crate::core::{Channel, ChannelArray, MemoryMap, RadioImage};
pub use codec::{decode_image, encode_image, CodecError};
pub use descriptors::{all_models, find_model, ModelDescriptor};
pub use engine::{progress_channel, CancelFlag, CloneError, CloneSession, ProgressEvent};
pub use formats::{load_image, save_image, Metadata};
pub use serial::{LinkSettings, SerialLink, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
