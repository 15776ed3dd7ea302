// Low-level byte codecs shared by the memory codec.

pub mod bcd;
pub mod ints;

pub use bcd::{bcd_to_u64_be, bcd_to_u64_le, u64_to_bcd_be, u64_to_bcd_le, BcdError};
pub use ints::{read_u16_be, read_u16_le, read_u32_le, write_u16_be, write_u16_le, write_u32_le};
