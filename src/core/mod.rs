// Core data model: channels, slot arrays, raw images.

pub mod array;
pub mod channel;
pub mod constants;
pub mod image;

pub use array::ChannelArray;
pub use channel::{Channel, CrossMode, Duplex, Mode, Skip, ToneMode};
pub use constants::{DTCS_CODES, TONES_DHZ, TUNING_STEPS_KHZ};
pub use image::{MemoryMap, RadioImage};
