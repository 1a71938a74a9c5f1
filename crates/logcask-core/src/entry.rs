//! Entry Data Structure and Frame Codec
//!
//! This module defines the core `Entry` type - one key/value record - and
//! its self-delimiting on-disk encoding.
//!
//! ## Frame Layout
//!
//! Each entry is written as a single frame:
//!
//! ```text
//! ┌────────────┬──────────┬─────────┬────────────┬───────────┐
//! │ total_size │ key_len  │ key     │ value_len  │ value     │
//! │ (u32 LE)   │ (u32 LE) │ (N)     │ (u32 LE)   │ (M)       │
//! └────────────┴──────────┴─────────┴────────────┴───────────┘
//! ```
//!
//! `total_size` counts the entire frame *including itself*, so a reader
//! can peek the first four bytes, learn the frame length, and advance
//! exactly one record. Frames are concatenated with no padding.
//!
//! ## Design Decisions
//! - Keys and values are opaque byte strings on disk but surfaced as
//!   UTF-8 text at the API boundary; non-UTF-8 payloads read back from
//!   disk are reported as corruption.
//! - Little-endian fixed-width lengths keep the reader a straight-line
//!   decode with no varint state.
//!
//! ## Example
//! ```ignore
//! let entry = Entry::new("user-1", "hello");
//! let frame = entry.encode();
//! let decoded = Entry::decode(&frame)?;
//! assert_eq!(decoded, entry);
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Fixed bytes per frame: the three u32 length fields.
pub const FRAME_OVERHEAD: usize = 12;

/// A single key/value record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Size of the encoded frame in bytes.
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.key.len() + self.value.len()
    }

    /// Encode this entry as one self-delimited frame.
    pub fn encode(&self) -> Bytes {
        let total = self.encoded_len();
        let mut buf = BytesMut::with_capacity(total);
        buf.put_u32_le(total as u32);
        buf.put_u32_le(self.key.len() as u32);
        buf.put_slice(self.key.as_bytes());
        buf.put_u32_le(self.value.len() as u32);
        buf.put_slice(self.value.as_bytes());
        buf.freeze()
    }

    /// Decode one frame. `frame` must hold exactly the bytes announced by
    /// the leading `total_size`, or the frame is reported as corrupt.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() < FRAME_OVERHEAD {
            return Err(Error::CorruptFrame(format!(
                "frame of {} bytes is shorter than the fixed header",
                frame.len()
            )));
        }

        let mut cursor = frame;
        let total = cursor.get_u32_le() as usize;
        if total != frame.len() {
            return Err(Error::CorruptFrame(format!(
                "length prefix says {} bytes but frame holds {}",
                total,
                frame.len()
            )));
        }

        let key_len = cursor.get_u32_le() as usize;
        if key_len + 4 > cursor.remaining() {
            return Err(Error::CorruptFrame(format!(
                "key length {} overruns the frame",
                key_len
            )));
        }
        let key = cursor[..key_len].to_vec();
        cursor.advance(key_len);

        let value_len = cursor.get_u32_le() as usize;
        if value_len != cursor.remaining() {
            return Err(Error::CorruptFrame(format!(
                "value length {} disagrees with {} remaining bytes",
                value_len,
                cursor.remaining()
            )));
        }
        let value = cursor[..value_len].to_vec();

        Ok(Self {
            key: String::from_utf8(key)
                .map_err(|_| Error::CorruptFrame("key is not valid UTF-8".to_string()))?,
            value: String::from_utf8(value)
                .map_err(|_| Error::CorruptFrame("value is not valid UTF-8".to_string()))?,
        })
    }
}
