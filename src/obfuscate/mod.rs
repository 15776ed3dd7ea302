// Payload obfuscation and checksum primitives.
//
// Every routine here is pure: inputs are borrowed, outputs are fresh
// buffers. The engine applies these per block, so positions restart at
// zero for each block.

/// Per-model XOR key rows for the UV17Pro protocol family. A model's
/// descriptor selects one row by symbol index.
pub const UV17_KEYS: [[u8; 4]; 20] = [
    *b"BHT ",
    *b"CO 7",
    *b"A ES",
    *b"EIYM",
    *b"PQXN",
    *b"RVBU",
    *b"ZT K",
    *b"GWFD",
    *b"L SJ",
    *b"MKQA",
    *b"VUCE",
    *b"Y RH",
    *b"NPOB",
    *b"XDGI",
    *b"W TZ",
    *b"SFJL",
    *b"KA V",
    *b"TMWC",
    *b"DE Q",
    *b"JZUP",
];

/// Keyed XOR used by the UV17Pro family. Symmetric: applying it twice
/// with the same key row restores the input.
///
/// A byte passes through unchanged when the key byte is 0x20 or when
/// XOR would collide with the 0x00/0xFF fill values the radios use as
/// erased-flash markers.
pub fn uv17_xor(data: &[u8], symbol_index: usize) -> Vec<u8> {
    let key = &UV17_KEYS[symbol_index % UV17_KEYS.len()];
    data.iter()
        .enumerate()
        .map(|(i, &b)| {
            let k = key[i % 4];
            if k == 0x20 || b == 0x00 || b == 0xFF || b == k || b == (k ^ 0xFF) {
                b
            } else {
                b ^ k
            }
        })
        .collect()
}

/// Wouxun chained XOR, encrypt direction. Each output byte is the XOR of
/// the previous output byte (or the init value) with the input byte.
pub fn wouxun_encrypt(data: &[u8], init: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev = init;
    for &b in data {
        let enc = prev ^ b;
        out.push(enc);
        prev = enc;
    }
    out
}

/// Wouxun chained XOR, decrypt direction.
pub fn wouxun_decrypt(data: &[u8], init: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev = init;
    for &b in data {
        out.push(b ^ prev);
        prev = b;
    }
    out
}

/// Checksum algorithms radios append to images or frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// (start + sum of all bytes) mod 256, appended after the data.
    Sum { start: u8 },
    /// XOR fold of all bytes, appended after the data.
    Xor,
    /// Sum of bytes in [start, stop] mod 256, stored at a fixed address.
    RangeSum {
        start: usize,
        stop: usize,
        store: usize,
    },
}

fn sum_mod_256(bytes: &[u8], start: u8) -> u8 {
    bytes
        .iter()
        .fold(start, |acc, &b| acc.wrapping_add(b))
}

fn xor_fold(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &b| acc ^ b)
}

/// Compute the checksum byte over `data` (for the trailing-byte kinds,
/// `data` excludes the checksum itself).
pub fn compute(kind: ChecksumKind, data: &[u8]) -> u8 {
    match kind {
        ChecksumKind::Sum { start } => sum_mod_256(data, start),
        ChecksumKind::Xor => xor_fold(data),
        ChecksumKind::RangeSum { start, stop, .. } => {
            if start >= data.len() {
                return 0;
            }
            let stop = stop.min(data.len() - 1);
            if start > stop {
                return 0;
            }
            sum_mod_256(&data[start..=stop], 0)
        }
    }
}

/// Return a new buffer with the checksum applied: trailing kinds append
/// one byte, range-sum writes into its store address.
pub fn append(kind: ChecksumKind, data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    match kind {
        ChecksumKind::Sum { .. } | ChecksumKind::Xor => out.push(compute(kind, data)),
        ChecksumKind::RangeSum { store, .. } => {
            let ck = compute(kind, data);
            if store < out.len() {
                out[store] = ck;
            }
        }
    }
    out
}

/// Check the stored checksum byte against a fresh computation.
pub fn verify(kind: ChecksumKind, data: &[u8]) -> bool {
    match kind {
        ChecksumKind::Sum { .. } | ChecksumKind::Xor => match data.split_last() {
            Some((&stored, body)) => stored == compute(kind, body),
            None => false,
        },
        ChecksumKind::RangeSum { store, .. } => {
            data.get(store).copied() == Some(compute(kind, data))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uv17_involution() {
        for idx in 0..UV17_KEYS.len() {
            let data: Vec<u8> = (0..=255u8).collect();
            let once = uv17_xor(&data, idx);
            let twice = uv17_xor(&once, idx);
            assert_eq!(twice, data, "key row {idx} is not an involution");
        }
    }

    #[test]
    fn uv17_passthrough_rules() {
        // Key row 0 is "BHT " - position 3 has a space key, identity.
        let data = [0x12, 0x12, 0x12, 0x12];
        let enc = uv17_xor(&data, 0);
        assert_eq!(enc[3], 0x12);
        // 0x00 and 0xFF never change regardless of key.
        let fill = [0x00, 0xFF, 0x00, 0xFF];
        assert_eq!(uv17_xor(&fill, 5), fill);
    }

    #[test]
    fn uv17_changes_plain_bytes() {
        let data = [0x12, 0x34, 0x56, 0x78];
        let enc = uv17_xor(&data, 1); // "CO 7"
        assert_eq!(enc[0], 0x12 ^ b'C');
        assert_eq!(enc[1], 0x34 ^ b'O');
        assert_eq!(enc[2], 0x56); // space key
        assert_eq!(enc[3], 0x78 ^ b'7');
    }

    #[test]
    fn wouxun_involution() {
        let data: Vec<u8> = (0..64u8).map(|i| i.wrapping_mul(7)).collect();
        for init in [0x00, 0x57, 0xFF] {
            assert_eq!(wouxun_decrypt(&wouxun_encrypt(&data, init), init), data);
            assert_eq!(wouxun_encrypt(&wouxun_decrypt(&data, init), init), data);
        }
    }

    #[test]
    fn wouxun_chain_shape() {
        let enc = wouxun_encrypt(&[0x01, 0x02, 0x03], 0x57);
        assert_eq!(enc[0], 0x57 ^ 0x01);
        assert_eq!(enc[1], enc[0] ^ 0x02);
        assert_eq!(enc[2], enc[1] ^ 0x03);
    }

    #[test]
    fn checksum_roundtrip_and_flip_detection() {
        let data = [0x10, 0x20, 0x30, 0x40, 0x00, 0x55];
        let kinds = [
            ChecksumKind::Sum { start: 0x34 },
            ChecksumKind::Xor,
            ChecksumKind::RangeSum {
                start: 0,
                stop: 3,
                store: 4,
            },
        ];
        for kind in kinds {
            let stamped = append(kind, &data);
            assert!(verify(kind, &stamped), "{kind:?} failed on own output");
            for i in 0..4 {
                let mut flipped = stamped.clone();
                flipped[i] ^= 0x01;
                assert!(!verify(kind, &flipped), "{kind:?} missed flip at {i}");
            }
        }
    }

    #[test]
    fn checksum_empty_input() {
        assert!(!verify(ChecksumKind::Xor, &[]));
        let stamped = append(ChecksumKind::Sum { start: 0 }, &[]);
        assert_eq!(stamped, vec![0x00]);
    }
}
