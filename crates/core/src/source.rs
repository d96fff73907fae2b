//! Frame source: sequential reader for the on-disk frame container.
//!
//! A frame container is a headerless concatenation of frames, each prefixed
//! with a 5-digit zero-padded ASCII length field:
//!
//! ```text
//! [ "00421" ][ 421 bytes ][ "12345" ][ 12345 bytes ] ...
//! ```
//!
//! No trailer, no checksum. End-of-stream is reached when fewer than 5
//! prefix bytes remain; [`VideoSource::reset`] seeks back to offset 0 so the
//! pacing loop can replay the container indefinitely.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Result, StreamError};

/// Width of the decimal ASCII length prefix (frames are 0–99999 bytes).
pub const LENGTH_PREFIX_LEN: usize = 5;

/// Sequential reader over one frame container file.
///
/// Owned by a [`Session`](crate::session::Session): opened at SETUP, moved
/// into the pacing thread while playing, and closed (dropped) at teardown.
#[derive(Debug)]
pub struct VideoSource {
    reader: BufReader<File>,
    path: String,
    frames_read: u64,
}

impl VideoSource {
    /// Open a frame container.
    ///
    /// Fails with [`StreamError::SourceUnavailable`] when the file is
    /// missing or unreadable; the caller maps this to a not-found reply.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_text = path.as_ref().display().to_string();
        let file = File::open(&path).map_err(|cause| StreamError::SourceUnavailable {
            path: path_text.clone(),
            cause,
        })?;

        tracing::debug!(path = %path_text, "frame source opened");

        Ok(Self {
            reader: BufReader::new(file),
            path: path_text,
            frames_read: 0,
        })
    }

    /// Read the next length-prefixed frame.
    ///
    /// Returns `Ok(None)` at end-of-stream: fewer than 5 prefix bytes left,
    /// or a final frame cut short by EOF. A prefix that is not 5 ASCII
    /// digits is an `InvalidData` error — the container is corrupt, not
    /// merely exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        match self.reader.read_exact(&mut prefix) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let length = std::str::from_utf8(&prefix)
            .ok()
            .and_then(|text| text.parse::<usize>().ok())
            .ok_or_else(|| {
                StreamError::Io(std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!("bad frame length prefix {:?} in {}", prefix, self.path),
                ))
            })?;

        let mut frame = vec![0u8; length];
        match self.reader.read_exact(&mut frame) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        self.frames_read += 1;
        Ok(Some(frame))
    }

    /// Number of frames delivered since open or the last [`reset`](Self::reset).
    pub fn frame_index(&self) -> u64 {
        self.frames_read
    }

    /// Seek back to the start of the container and zero the frame counter.
    pub fn reset(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.frames_read = 0;
        tracing::trace!(path = %self.path, "frame source rewound");
        Ok(())
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }
}
