// Raw image storage.
//
// A radio's memory dump is a single owned byte buffer. The codec
// borrows it for decode and writes through a fresh copy for encode, so
// the downloaded bytes stay bit-exact until an upload is built.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("range {start:#06x}..{end:#06x} outside image of {len} bytes")]
    OutOfRange { start: usize, end: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// Owned raw memory bytes with bounds-checked access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMap {
    data: Vec<u8>,
}

impl MemoryMap {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// All-0xFF buffer, the erased-flash fill most radios use.
    pub fn filled(size: usize) -> Self {
        Self {
            data: vec![0xFF; size],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, start: usize, len: usize) -> Result<&[u8]> {
        let end = start + len;
        if end > self.data.len() {
            return Err(ImageError::OutOfRange {
                start,
                end,
                len: self.data.len(),
            });
        }
        Ok(&self.data[start..end])
    }

    pub fn set(&mut self, start: usize, bytes: &[u8]) -> Result<()> {
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(ImageError::OutOfRange {
                start,
                end,
                len: self.data.len(),
            });
        }
        self.data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn truncate(&mut self, size: usize) {
        self.data.truncate(size);
    }

    /// hexdump -C style rendering for debug output.
    pub fn hexdump(&self, start: usize, end: usize) -> String {
        let end = end.min(self.data.len());
        let start = start.min(end);
        let mut out = String::new();
        for (row, chunk) in self.data[start..end].chunks(16).enumerate() {
            out.push_str(&format!("{:08x}  ", start + row * 16));
            for (i, byte) in chunk.iter().enumerate() {
                if i == 8 {
                    out.push(' ');
                }
                out.push_str(&format!("{byte:02x} "));
            }
            for i in chunk.len()..16 {
                if i == 8 {
                    out.push(' ');
                }
                out.push_str("   ");
            }
            out.push_str(" |");
            for &byte in chunk {
                out.push(if (0x20..0x7F).contains(&byte) {
                    byte as char
                } else {
                    '.'
                });
            }
            out.push_str("|\n");
        }
        out
    }
}

impl From<Vec<u8>> for MemoryMap {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl AsRef<[u8]> for MemoryMap {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Display for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryMap({} bytes)", self.data.len())
    }
}

/// A downloaded (or loaded) radio image: model identity, the raw bytes,
/// and the identification bytes the radio returned during handshake.
#[derive(Debug, Clone)]
pub struct RadioImage {
    pub vendor: String,
    pub model: String,
    pub mmap: MemoryMap,
    /// Raw identification response, when the protocol produced one.
    pub ident: Option<Vec<u8>>,
}

impl RadioImage {
    pub fn new(vendor: impl Into<String>, model: impl Into<String>, mmap: MemoryMap) -> Self {
        Self {
            vendor: vendor.into(),
            model: model.into(),
            mmap,
            ident: None,
        }
    }

    pub fn with_ident(mut self, ident: Vec<u8>) -> Self {
        self.ident = Some(ident);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_checked_access() {
        let mut mmap = MemoryMap::new(vec![0u8; 16]);
        mmap.set(4, &[1, 2, 3]).unwrap();
        assert_eq!(mmap.get(4, 3).unwrap(), &[1, 2, 3]);
        assert!(mmap.get(15, 2).is_err());
        assert!(mmap.set(15, &[1, 2]).is_err());
    }

    #[test]
    fn filled_is_erased_flash() {
        let mmap = MemoryMap::filled(8);
        assert_eq!(mmap.bytes(), &[0xFF; 8]);
    }

    #[test]
    fn hexdump_renders_ascii_column() {
        let mmap = MemoryMap::new(b"ABC\x00\xff0123456789abcd".to_vec());
        let dump = mmap.hexdump(0, mmap.len());
        assert!(dump.contains("41 42 43"));
        assert!(dump.contains("|ABC..0123456789a|"));
    }

    #[test]
    fn image_carries_ident() {
        let img = RadioImage::new("Baofeng", "UV-5R", MemoryMap::filled(4))
            .with_ident(vec![0xAA, 0xBB]);
        assert_eq!(img.ident.as_deref(), Some(&[0xAA, 0xBB][..]));
    }
}
