//! Minimal unix `ar` reader
//!
//! `.deb` packages are `ar` archives holding `debian-binary`,
//! `control.tar.*` and `data.tar.*`. Only reading is needed, and only of
//! well-formed archives, so this stays a small fixed-layout parser:
//! an 8-byte global magic, then 60-byte entry headers with decimal sizes
//! and entry data padded to even offsets.

use thiserror::Error;

/// Global archive magic.
const AR_MAGIC: &[u8] = b"!<arch>\n";

/// Entry-header terminator.
const HEADER_END: &[u8] = b"`\n";

/// Length of one entry header.
const HEADER_LEN: usize = 60;

/// Archive parse failures.
#[derive(Error, Debug)]
pub enum ArError {
    /// Missing `!<arch>` magic
    #[error("not an ar archive (bad global magic)")]
    BadMagic,

    /// Header malformed or missing its terminator
    #[error("malformed ar entry header at offset {offset}")]
    BadHeader {
        /// Byte offset of the offending header
        offset: usize,
    },

    /// Entry data runs past the end of the archive
    #[error("truncated ar archive: entry {name} wants {size} bytes")]
    Truncated {
        /// Entry name
        name: String,
        /// Declared entry size
        size: usize,
    },
}

/// One archive member.
#[derive(Debug, Clone)]
pub struct ArEntry {
    /// Member name, without the GNU trailing slash
    pub name: String,
    /// Member contents
    pub data: Vec<u8>,
}

/// Parse all members of an `ar` archive.
pub fn read_entries(bytes: &[u8]) -> Result<Vec<ArEntry>, ArError> {
    if bytes.len() < AR_MAGIC.len() || &bytes[..AR_MAGIC.len()] != AR_MAGIC {
        return Err(ArError::BadMagic);
    }

    let mut entries = Vec::new();
    let mut offset = AR_MAGIC.len();

    while offset < bytes.len() {
        // A single stray padding byte at the end is tolerated.
        if bytes.len() - offset < HEADER_LEN {
            break;
        }
        let header = &bytes[offset..offset + HEADER_LEN];
        if &header[58..60] != HEADER_END {
            return Err(ArError::BadHeader { offset });
        }

        let name = parse_name(&header[0..16]);
        let size = parse_size(&header[48..58]).ok_or(ArError::BadHeader { offset })?;

        let data_start = offset + HEADER_LEN;
        let data_end = data_start + size;
        if data_end > bytes.len() {
            return Err(ArError::Truncated { name, size });
        }

        entries.push(ArEntry {
            name,
            data: bytes[data_start..data_end].to_vec(),
        });

        // Entries are padded to even offsets.
        offset = data_end + (size & 1);
    }

    Ok(entries)
}

/// Trim padding and the GNU `/` name terminator.
fn parse_name(field: &[u8]) -> String {
    String::from_utf8_lossy(field)
        .trim_end()
        .trim_end_matches('/')
        .to_string()
}

fn parse_size(field: &[u8]) -> Option<usize> {
    String::from_utf8_lossy(field).trim().parse().ok()
}

/// Serialize entries into archive bytes. Used by tests to build fixtures
/// the same way `dpkg-deb` lays them out.
#[cfg(test)]
pub fn write_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut bytes = AR_MAGIC.to_vec();
    for (name, data) in entries {
        bytes.extend_from_slice(format!("{name:<16}").as_bytes());
        bytes.extend_from_slice(b"0           "); // mtime
        bytes.extend_from_slice(b"0     "); // uid
        bytes.extend_from_slice(b"0     "); // gid
        bytes.extend_from_slice(b"100644  "); // mode
        bytes.extend_from_slice(format!("{:<10}", data.len()).as_bytes());
        bytes.extend_from_slice(HEADER_END);
        bytes.extend_from_slice(data);
        if data.len() % 2 == 1 {
            bytes.push(b'\n');
        }
    }
    bytes
}
