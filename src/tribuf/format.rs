//! Tri-buffer format constants and header.

use std::fmt;

use crate::codec::{ByteReader, ByteWriter};
use crate::util::{Error, Result};

/// Size of the region header in bytes (`total`, `offset16`, `offset8`).
pub const HEADER_SIZE: usize = 12;

/// Size of one header unit in bytes. All offsets count 32-bit words.
pub const WORD_SIZE: usize = 4;

/// Where in a file a value lives. Used for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    /// Version and region-boundary header
    Header,
    /// 32-bit region of the tri-buffer
    Words32,
    /// 16-bit region of the tri-buffer
    Words16,
    /// 8-bit region of the tri-buffer
    Bytes8,
    /// Flat little-endian data outside the tri-buffer (sequences, materials, DSQ)
    Plain,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Region::Header => "header",
            Region::Words32 => "32-bit region",
            Region::Words16 => "16-bit region",
            Region::Bytes8 => "8-bit region",
            Region::Plain => "plain section",
        })
    }
}

/// Region boundaries, all in 32-bit word units from the start of the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriBufferHeader {
    /// Total payload size.
    pub total_words: i32,
    /// Start of the 16-bit region (= size of the 32-bit region).
    pub offset16: i32,
    /// Start of the 8-bit region.
    pub offset8: i32,
}

impl TriBufferHeader {
    /// Build the header for regions of the given byte lengths (each a multiple of 4).
    pub fn for_regions(len32: usize, len16: usize, len8: usize) -> Result<Self> {
        let words = |bytes: usize| {
            i32::try_from(bytes / WORD_SIZE)
                .map_err(|_| Error::invariant("tri-buffer exceeds 2^31 words"))
        };
        let offset16 = words(len32)?;
        let offset8 = offset16 + words(len16)?;
        let total_words = offset8 + words(len8)?;
        Ok(Self {
            total_words,
            offset16,
            offset8,
        })
    }

    /// Byte ranges of the three regions within the payload.
    pub fn byte_ranges(&self) -> Result<[std::ops::Range<usize>; 3]> {
        let (total, o16, o8) = (self.total_words, self.offset16, self.offset8);
        if o16 < 0 || o8 < o16 || total < o8 {
            return Err(Error::invalid(format!(
                "region offsets out of order: offset16={o16} offset8={o8} total={total}"
            )));
        }
        let bytes = |words: i32| words as usize * WORD_SIZE;
        Ok([
            0..bytes(o16),
            bytes(o16)..bytes(o8),
            bytes(o8)..bytes(total),
        ])
    }

    /// Number of 16-bit elements: `(offset8 - offset16) * 2`.
    pub fn num16(&self) -> usize {
        (self.offset8 - self.offset16).max(0) as usize * 2
    }

    /// Number of 8-bit elements: `(total - offset8) * 4`.
    pub fn num8(&self) -> usize {
        (self.total_words - self.offset8).max(0) as usize * 4
    }

    /// Payload size in bytes.
    pub fn payload_len(&self) -> usize {
        self.total_words.max(0) as usize * WORD_SIZE
    }

    pub fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            total_words: r.read_i32()?,
            offset16: r.read_i32()?,
            offset8: r.read_i32()?,
        })
    }

    pub fn write(&self, w: &mut ByteWriter) -> Result<()> {
        w.write_i32(self.total_words)?;
        w.write_i32(self.offset16)?;
        w.write_i32(self.offset8)
    }
}
