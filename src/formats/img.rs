// Image container files: raw memory bytes, a sentinel, then Base64 of
// the JSON metadata. The binary half must round-trip bit-exact.

use super::metadata::Metadata;
use crate::core::{MemoryMap, RadioImage};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad metadata base64: {0}")]
    Base64(String),

    #[error("bad metadata text: {0}")]
    Text(String),

    #[error("bad metadata JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ImgError>;

/// Separates raw bytes from the metadata trailer.
pub const SENTINEL: &[u8] = b"\x00\xffchirp\xeeimg\x00\x01";

/// Load a container file. A file without the sentinel is treated as a
/// bare memory dump with empty metadata.
pub fn load_image(path: impl AsRef<Path>) -> Result<(MemoryMap, Metadata)> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    match find_sentinel(&data) {
        Some(idx) => {
            let raw = data[..idx].to_vec();
            let trailer = &data[idx + SENTINEL.len()..];
            let decoded =
                base64::decode(trailer).map_err(|e| ImgError::Base64(e.to_string()))?;
            let json = String::from_utf8(decoded).map_err(|e| ImgError::Text(e.to_string()))?;
            let metadata = Metadata::from_json(&json)?;
            Ok((MemoryMap::new(raw), metadata))
        }
        None => Ok((MemoryMap::new(data), Metadata::default())),
    }
}

/// Save a container file: raw bytes, sentinel, Base64(JSON metadata).
pub fn save_image(path: impl AsRef<Path>, mmap: &MemoryMap, metadata: &Metadata) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(mmap.bytes())?;
    file.write_all(SENTINEL)?;
    let json = metadata.to_json()?;
    file.write_all(base64::encode(json.as_bytes()).as_bytes())?;
    Ok(())
}

/// Save a downloaded image with metadata derived from its model.
pub fn save_radio_image(path: impl AsRef<Path>, image: &RadioImage) -> Result<()> {
    let metadata = Metadata::new(image.vendor.clone(), image.model.clone());
    save_image(path, &image.mmap, &metadata)
}

fn find_sentinel(data: &[u8]) -> Option<usize> {
    data.windows(SENTINEL.len()).position(|w| w == SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn sentinel_bytes() {
        assert_eq!(SENTINEL.len(), 13);
        assert_eq!(
            SENTINEL,
            &[0x00, 0xFF, 0x63, 0x68, 0x69, 0x72, 0x70, 0xEE, 0x69, 0x6D, 0x67, 0x00, 0x01]
        );
    }

    #[test]
    fn save_load_roundtrip() -> Result<()> {
        let file = NamedTempFile::new().unwrap();
        let mmap = MemoryMap::new(vec![0x01, 0x02, 0xFF, 0x00, 0xAB]);
        let meta = Metadata::new("Baofeng", "UV-5R");

        save_image(file.path(), &mmap, &meta)?;
        let (loaded, loaded_meta) = load_image(file.path())?;

        assert_eq!(loaded.bytes(), mmap.bytes());
        assert_eq!(loaded_meta.vendor, "Baofeng");
        assert_eq!(loaded_meta.model, "UV-5R");
        Ok(())
    }

    #[test]
    fn raw_dump_without_sentinel() -> Result<()> {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

        let (mmap, meta) = load_image(file.path())?;
        assert_eq!(mmap.bytes(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(meta.vendor.is_empty());
        Ok(())
    }

    #[test]
    fn foreign_container_is_readable() -> Result<()> {
        // Files written by other tools: same sentinel, arbitrary JSON.
        let file = NamedTempFile::new().unwrap();
        let mut bytes = vec![0xAA, 0xBB];
        bytes.extend_from_slice(SENTINEL);
        let json = r#"{"vendor":"Wouxun","model":"KG-UV8D","rclass":"KGUV8DRadio"}"#;
        bytes.extend_from_slice(base64::encode(json).as_bytes());
        std::fs::write(file.path(), &bytes).unwrap();

        let (mmap, meta) = load_image(file.path())?;
        assert_eq!(mmap.bytes(), &[0xAA, 0xBB]);
        assert_eq!(meta.model, "KG-UV8D");
        assert_eq!(meta.extra["rclass"], serde_json::json!("KGUV8DRadio"));
        Ok(())
    }

    #[test]
    fn binary_half_bit_exact_with_sentinel_like_noise() -> Result<()> {
        // Raw bytes may not contain the sentinel; bytes close to it must
        // not confuse the splitter.
        let file = NamedTempFile::new().unwrap();
        let mut raw = vec![0x00, 0xFF, b'c', b'h', b'i', b'r', b'q']; // near miss
        raw.extend_from_slice(&[0x55; 16]);
        let mmap = MemoryMap::new(raw.clone());

        save_image(file.path(), &mmap, &Metadata::default())?;
        let (loaded, _) = load_image(file.path())?;
        assert_eq!(loaded.bytes(), &raw[..]);
        Ok(())
    }
}
