//! Data-payload extraction
//!
//! Finds the `data.tar.*` member of the package and unpacks it. The
//! compression codec is detected by attempting each supported decoder on
//! the payload rather than trusting the member's extension; xz payloads
//! are recognized by magic and reported as unsupported instead of being
//! mis-parsed.

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::debug;

use crate::ar::{self, ArError};

/// xz stream magic, for a precise unsupported-codec message.
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];

/// Supported payload codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// gzip (`data.tar.gz`)
    Gzip,
    /// zstandard (`data.tar.zst`)
    Zstd,
}

/// Payload-extraction failures.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Outer archive could not be parsed
    #[error(transparent)]
    Ar(#[from] ArError),

    /// No `data.tar.*` member present
    #[error("package has no data.tar member")]
    MissingPayload,

    /// Payload compressed with a codec this build cannot decode
    #[error("unsupported payload codec: {name}")]
    UnsupportedCodec {
        /// Codec name for the error dialog
        name: String,
    },

    /// Unpacking failed
    #[error("payload unpack failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Detect the payload codec by attempting each decoder on the prefix.
pub fn detect_codec(data: &[u8]) -> Result<Codec, PayloadError> {
    let mut probe = [0u8; 64];

    if GzDecoder::new(data).read(&mut probe).is_ok() {
        return Ok(Codec::Gzip);
    }
    if zstd::stream::read::Decoder::new(data)
        .and_then(|mut decoder| decoder.read(&mut probe))
        .is_ok()
    {
        return Ok(Codec::Zstd);
    }
    if data.starts_with(XZ_MAGIC) {
        return Err(PayloadError::UnsupportedCodec {
            name: "xz".to_string(),
        });
    }
    Err(PayloadError::UnsupportedCodec {
        name: "unknown".to_string(),
    })
}

/// Extract the package's data payload into `dest`.
pub fn extract_data_tar(package: &[u8], dest: &Path) -> Result<Codec, PayloadError> {
    let entries = ar::read_entries(package)?;
    let payload = entries
        .iter()
        .find(|entry| entry.name.starts_with("data.tar"))
        .ok_or(PayloadError::MissingPayload)?;

    let codec = detect_codec(&payload.data)?;
    debug!(member = %payload.name, ?codec, "unpacking data payload");

    match codec {
        Codec::Gzip => unpack(GzDecoder::new(&payload.data[..]), dest)?,
        Codec::Zstd => unpack(zstd::stream::read::Decoder::new(&payload.data[..])?, dest)?,
    }
    Ok(codec)
}

fn unpack(reader: impl Read, dest: &Path) -> std::io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.unpack(dest)
}
