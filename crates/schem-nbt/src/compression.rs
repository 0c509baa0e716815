use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use schem_common::{Result, SchemError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Write};

/// Outer wrapping of a serialized tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Gzip,
    Zlib,
}

impl Compression {
    /// Sniffs the wrapping from the first two bytes.
    pub fn detect(bytes: &[u8]) -> Compression {
        match bytes {
            [0x1F, 0x8B, ..] => Compression::Gzip,
            [cmf, flg, ..] if is_zlib_header(*cmf, *flg) => Compression::Zlib,
            _ => Compression::None,
        }
    }

    /// Unwraps `bytes`, refusing to produce more than `limit` bytes.
    pub fn decompress<'a>(self, bytes: &'a [u8], limit: usize) -> Result<Cow<'a, [u8]>> {
        match self {
            Compression::None => Ok(Cow::Borrowed(bytes)),
            Compression::Gzip => read_bounded(GzDecoder::new(bytes), limit, self).map(Cow::Owned),
            Compression::Zlib => read_bounded(ZlibDecoder::new(bytes), limit, self).map(Cow::Owned),
        }
    }

    pub fn compress(self, data: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data),
            Compression::Gzip => {
                // GzEncoder leaves mtime at zero, so output is reproducible
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(&data)?;
                Ok(encoder.finish()?)
            }
            Compression::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(&data)?;
                Ok(encoder.finish()?)
            }
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Zlib => write!(f, "zlib"),
        }
    }
}

// RFC 1950: deflate method, window of at most 32K, header checksum.
fn is_zlib_header(cmf: u8, flg: u8) -> bool {
    cmf & 0x0F == 8 && cmf >> 4 <= 7 && (u16::from(cmf) << 8 | u16::from(flg)) % 31 == 0
}

fn read_bounded<R: Read>(decoder: R, limit: usize, compression: Compression) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    if let Err(e) = decoder.take(limit as u64 + 1).read_to_end(&mut out) {
        return Err(SchemError::corrupt(
            0,
            format!(
                "{} stream broken after {} decompressed bytes: {}",
                compression,
                out.len(),
                e
            ),
        ));
    }
    if out.len() > limit {
        return Err(SchemError::corrupt(
            0,
            format!("decompressed size exceeds the limit of {} bytes", limit),
        ));
    }
    Ok(out)
}
