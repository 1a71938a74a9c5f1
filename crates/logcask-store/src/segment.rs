//! Segment Files and Frame Scanning
//!
//! A segment is one append-only file on disk holding a contiguous run of
//! encoded entry frames with no padding. Segments are identified by a
//! monotonically increasing integer baked into the file name:
//!
//! ```text
//! {prefix}-{id}        e.g.  data-segment-0, data-segment-7
//! ```
//!
//! The prefix and the id parser are the sole naming contract between the
//! engine and the filesystem; there is no directory-level manifest. Ids
//! may be sparse after compaction (`0, 7, 8` is a legal file set), so
//! nothing here assumes contiguity.
//!
//! ## Frame Scanning
//!
//! `FrameScanner` decodes a segment front to back. Ordinary frames are
//! decoded in a reusable 8 KiB scratch buffer; a frame whose announced
//! size reaches the scratch size falls back to a one-off heap allocation,
//! so records larger than the buffer still round-trip. A clean EOF on a
//! frame boundary ends the scan; a torn length prefix or a short frame
//! body surfaces as `CorruptFrame`.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

use logcask_core::entry::FRAME_OVERHEAD;
use logcask_core::{Entry, Error, Result};

/// Scratch buffer size for sequential frame decoding.
pub(crate) const SCRATCH_SIZE: usize = 8192;

/// One segment file: its numeric id and filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: u32,
    pub path: PathBuf,
}

impl Segment {
    pub fn new(dir: &Path, prefix: &str, id: u32) -> Self {
        Self {
            id,
            path: dir.join(format!("{prefix}-{id}")),
        }
    }

    /// Parse a file name of the form `{prefix}-{id}`. The id must be a
    /// canonical decimal: no sign, no leading zeros other than `0` itself.
    pub fn parse_name(prefix: &str, name: &str) -> Option<u32> {
        let digits = name.strip_prefix(prefix)?.strip_prefix('-')?;
        let id: u32 = digits.parse().ok()?;
        (digits == id.to_string()).then_some(id)
    }

    /// List the segment files under `dir`, sorted ascending by id.
    ///
    /// Numeric order is what replay and merging rely on: a larger id means
    /// later in time, and later writes shadow earlier ones.
    pub async fn list(dir: &Path, prefix: &str) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(dirent) = entries.next_entry().await? {
            if !dirent.file_type().await?.is_file() {
                continue;
            }
            let name = dirent.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = Self::parse_name(prefix, name) {
                segments.push(Segment {
                    id,
                    path: dirent.path(),
                });
            }
        }
        segments.sort_by_key(|segment| segment.id);
        Ok(segments)
    }

    /// Current byte length of the segment file.
    pub async fn size(&self) -> Result<u64> {
        Ok(fs::metadata(&self.path).await?.len())
    }

    pub async fn open_read(&self) -> Result<File> {
        Ok(File::open(&self.path).await?)
    }

    pub async fn open_append(&self) -> Result<File> {
        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?)
    }

    /// Open as the compaction target: created if absent, truncated if not.
    pub async fn open_truncate(&self) -> Result<File> {
        Ok(OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .await?)
    }
}

/// Sequential frame decoder over one segment file.
pub(crate) struct FrameScanner {
    reader: BufReader<File>,
    scratch: Box<[u8; SCRATCH_SIZE]>,
}

impl FrameScanner {
    pub async fn open(segment: &Segment) -> Result<Self> {
        Ok(Self {
            reader: BufReader::with_capacity(SCRATCH_SIZE, segment.open_read().await?),
            scratch: Box::new([0u8; SCRATCH_SIZE]),
        })
    }

    /// Decode the next frame, returning the entry and its encoded length.
    ///
    /// `Ok(None)` on a clean end of file. A partial length prefix or a
    /// body shorter than announced is `CorruptFrame`.
    pub async fn next_frame(&mut self) -> Result<Option<(Entry, u64)>> {
        let mut prefix = [0u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            let n = self.reader.read(&mut prefix[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(Error::CorruptFrame(
                    "torn length prefix at end of segment".to_string(),
                ));
            }
            filled += n;
        }

        let total = u32::from_le_bytes(prefix) as usize;
        if total < FRAME_OVERHEAD {
            return Err(Error::CorruptFrame(format!(
                "length prefix {total} is below the fixed frame header size"
            )));
        }

        let entry = if total < SCRATCH_SIZE {
            let frame = &mut self.scratch[..total];
            frame[..4].copy_from_slice(&prefix);
            read_exact_or_corrupt(&mut self.reader, &mut frame[4..]).await?;
            Entry::decode(frame)?
        } else {
            let mut frame = vec![0u8; total];
            frame[..4].copy_from_slice(&prefix);
            read_exact_or_corrupt(&mut self.reader, &mut frame[4..]).await?;
            Entry::decode(&frame)?
        };

        Ok(Some((entry, total as u64)))
    }
}

/// Read only the value of the frame the reader is positioned at: skip the
/// size header, skip the key, read the value. Used by point reads that
/// have already seeked to the record.
pub(crate) async fn read_value<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let total = read_u32_le(reader).await? as u64;
    let key_len = read_u32_le(reader).await? as u64;
    if FRAME_OVERHEAD as u64 + key_len > total {
        return Err(Error::CorruptFrame(format!(
            "key length {key_len} overruns frame of {total} bytes"
        )));
    }

    let mut key = vec![0u8; key_len as usize];
    read_exact_or_corrupt(reader, &mut key).await?;

    let value_len = read_u32_le(reader).await? as u64;
    if FRAME_OVERHEAD as u64 + key_len + value_len != total {
        return Err(Error::CorruptFrame(format!(
            "frame lengths disagree: header {total}, key {key_len}, value {value_len}"
        )));
    }

    let mut value = vec![0u8; value_len as usize];
    read_exact_or_corrupt(reader, &mut value).await?;
    String::from_utf8(value)
        .map_err(|_| Error::CorruptFrame("value is not valid UTF-8".to_string()))
}

async fn read_u32_le<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact_or_corrupt(reader, &mut buf).await?;
    Ok(u32::from_le_bytes(buf))
}

async fn read_exact_or_corrupt<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::CorruptFrame(
            "segment ends inside a frame".to_string(),
        )),
        Err(e) => Err(Error::Io(e)),
    }
}
