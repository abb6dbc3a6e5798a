//! On-disk layout of a wallet file.
//!
//! ```text
//! header (88 bytes)
//!   magic "SBXW"          4
//!   version major, minor  2 + 2   (u16 LE)
//!   salt                  16
//!   key check             60      (sealed KEY_CHECK_PLAINTEXT)
//!   crc32                 4       (over the 84 bytes above)
//! frame*
//!   length                4       (u32 LE, whole frame)
//!   length check          4       (crc32 of the length bytes)
//!   sealed record         n       (nonce || ciphertext || tag)
//!   crc32                 4       (over everything above)
//! ```
//!
//! Frames are only ever appended. Replaying them in file order with
//! last-write-wins per (category, name) yields the current store contents.
//!
//! The length check lets replay trust a length that runs past the end of the
//! file: only an interrupted final append produces one. A damaged length is
//! reported as corruption instead of being mistaken for a short tail.

use crate::crypto::{RecordCipher, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::error::{CoreError, CoreResult};

/// Magic bytes at the start of every wallet file.
pub const MAGIC: [u8; 4] = *b"SBXW";

/// Format version written by this build.
pub const FORMAT_VERSION: (u16, u16) = (1, 0);

/// Plaintext sealed into the header to verify keys.
const KEY_CHECK_PLAINTEXT: &[u8; 32] = b"strongbox-wallet-key-verifier-v1";

/// Size of the sealed key check.
const KEY_CHECK_SIZE: usize = NONCE_SIZE + KEY_CHECK_PLAINTEXT.len() + TAG_SIZE;

/// Size of the CRC32 trailer.
const CRC_SIZE: usize = 4;

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = MAGIC.len() + 4 + SALT_SIZE + KEY_CHECK_SIZE + CRC_SIZE;

/// Size of the length field plus its check.
const FRAME_PREFIX_SIZE: usize = 8;

/// Smallest valid frame: prefix, an empty sealed record, CRC.
const MIN_FRAME_SIZE: usize = FRAME_PREFIX_SIZE + NONCE_SIZE + TAG_SIZE + CRC_SIZE;

/// Largest frame accepted on read or write (64 MiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// The fixed header of a wallet file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHeader {
    /// Format version (major, minor).
    pub format_version: (u16, u16),
    /// Per-store salt for key derivation and record binding.
    pub salt: [u8; SALT_SIZE],
    key_check: Vec<u8>,
}

impl StoreHeader {
    /// Creates the header for a new store unlocked by `raw_key`.
    ///
    /// Returns the header together with the cipher for the new store.
    pub fn create(raw_key: &str) -> CoreResult<(Self, RecordCipher)> {
        let salt = crate::crypto::generate_salt();
        let cipher = RecordCipher::for_raw_key(raw_key, salt)?;
        let key_check = cipher.seal(KEY_CHECK_PLAINTEXT)?;

        let header = Self {
            format_version: FORMAT_VERSION,
            salt,
            key_check,
        };
        Ok((header, cipher))
    }

    /// Verifies `raw_key` against this header and returns the store cipher.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if the key does not unlock the store.
    pub fn unlock(&self, raw_key: &str) -> CoreResult<RecordCipher> {
        let cipher = RecordCipher::for_raw_key(raw_key, self.salt)?;
        match cipher.open(&self.key_check) {
            Ok(plaintext) if plaintext.as_slice() == KEY_CHECK_PLAINTEXT => Ok(cipher),
            _ => Err(CoreError::AuthenticationFailed),
        }
    }

    /// Encodes the header to exactly [`HEADER_SIZE`] bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&self.format_version.0.to_le_bytes());
        buf.extend_from_slice(&self.format_version.1.to_le_bytes());
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.key_check);

        let crc = compute_crc32(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Decodes a header from the first [`HEADER_SIZE`] bytes of `data`.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if !is_header_prefix(data) {
            return Err(CoreError::invalid_format("not a strongbox wallet file"));
        }
        if data.len() < HEADER_SIZE {
            return Err(CoreError::invalid_format("header too short"));
        }

        let body = &data[..HEADER_SIZE - CRC_SIZE];
        let stored_crc = read_u32(data, HEADER_SIZE - CRC_SIZE);
        let computed_crc = compute_crc32(body);
        if stored_crc != computed_crc {
            return Err(CoreError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let major = u16::from_le_bytes([data[4], data[5]]);
        let minor = u16::from_le_bytes([data[6], data[7]]);
        if major != FORMAT_VERSION.0 {
            return Err(CoreError::invalid_format(format!(
                "incompatible format version: store is v{major}.{minor}, expected v{}.{}",
                FORMAT_VERSION.0, FORMAT_VERSION.1
            )));
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&data[8..8 + SALT_SIZE]);
        let key_check = data[8 + SALT_SIZE..HEADER_SIZE - CRC_SIZE].to_vec();

        Ok(Self {
            format_version: (major, minor),
            salt,
            key_check,
        })
    }
}

/// Returns true if `data` could be the beginning of a wallet header.
///
/// A file that is shorter than a header but passes this check is an
/// interrupted provisioning, safe to reinitialize.
#[must_use]
pub fn is_header_prefix(data: &[u8]) -> bool {
    let n = data.len().min(MAGIC.len());
    data[..n] == MAGIC[..n]
}

/// Wraps a sealed record into a frame.
///
/// # Errors
///
/// Returns `MalformedInput` if the frame would exceed [`MAX_FRAME_SIZE`].
pub fn encode_frame(sealed: &[u8]) -> CoreResult<Vec<u8>> {
    let frame_len = FRAME_PREFIX_SIZE + sealed.len() + CRC_SIZE;
    if frame_len > MAX_FRAME_SIZE {
        return Err(CoreError::malformed_input(format!(
            "entry too large: {frame_len} bytes exceeds the {MAX_FRAME_SIZE} byte limit"
        )));
    }

    let len_bytes = (frame_len as u32).to_le_bytes();
    let mut buf = Vec::with_capacity(frame_len);
    buf.extend_from_slice(&len_bytes);
    buf.extend_from_slice(&compute_crc32(&len_bytes).to_le_bytes());
    buf.extend_from_slice(sealed);
    let crc = compute_crc32(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    Ok(buf)
}

/// Result of reading one frame from the front of a buffer.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A complete frame with a matching checksum.
    Intact {
        /// The sealed record inside the frame.
        sealed: &'a [u8],
        /// Total frame length in bytes.
        len: usize,
    },
    /// The buffer ends before the frame does, and the frame's length field
    /// (when present) is intact.
    Truncated,
    /// The frame is complete but its checksum does not match.
    Damaged {
        /// Total frame length in bytes.
        len: usize,
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },
}

/// Reads the frame at the start of `buf`.
///
/// # Errors
///
/// Returns `Corruption` if the length field is damaged or impossible.
pub fn read_frame(buf: &[u8]) -> CoreResult<Frame<'_>> {
    if buf.len() < FRAME_PREFIX_SIZE {
        return Ok(Frame::Truncated);
    }

    let stored_check = read_u32(buf, 4);
    let computed_check = compute_crc32(&buf[..4]);
    if stored_check != computed_check {
        return Err(CoreError::corruption(format!(
            "frame length field damaged: check {stored_check:08x}, computed {computed_check:08x}"
        )));
    }

    let len = read_u32(buf, 0) as usize;
    if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&len) {
        return Err(CoreError::corruption(format!("invalid frame length {len}")));
    }
    if buf.len() < len {
        return Ok(Frame::Truncated);
    }

    let expected = read_u32(buf, len - CRC_SIZE);
    let actual = compute_crc32(&buf[..len - CRC_SIZE]);
    if expected != actual {
        return Ok(Frame::Damaged {
            len,
            expected,
            actual,
        });
    }

    Ok(Frame::Intact {
        sealed: &buf[FRAME_PREFIX_SIZE..len - CRC_SIZE],
        len,
    })
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Computes the CRC32 (IEEE) of `data`.
#[must_use]
pub fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
