//! Folder/file hash components used to address entries in the archive index.
//!
//! The archive index keys each file by two 32-bit hashes: one of the directory
//! part of its path and one of the file name. Both are CRC-32 (reflected,
//! polynomial `0xEDB88320`, initial value `0xFFFFFFFF`) without the final
//! inversion, computed over the lowercased bytes.

const POLY: u32 = 0xEDB8_8320;

const CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-32 without the final inversion.
pub fn index_hash(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        crc = CRC_TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}

/// Hash a single path component the way the archive index does.
pub fn hash_component(component: &str) -> u32 {
    index_hash(component.to_ascii_lowercase().as_bytes())
}

/// The two hash components addressing a path in the archive index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathHash {
    pub folder: u32,
    pub file: u32,
}

impl PathHash {
    /// Split `path` at its last separator and hash both halves.
    ///
    /// A path without a separator has an empty folder component.
    pub fn of(path: &str) -> Self {
        let normalized = path.replace('\\', "/");
        let (folder, file) = match normalized.rfind('/') {
            Some(idx) => (&normalized[..idx], &normalized[idx + 1..]),
            None => ("", normalized.as_str()),
        };

        Self {
            folder: hash_component(folder),
            file: hash_component(file),
        }
    }
}
