// Byte transport: the real serial link and a scripted test double.

pub mod comm;

#[cfg(test)]
pub mod mock;

pub use comm::{list_ports, LinkSettings, SerialLink, Transport, TransportError};
