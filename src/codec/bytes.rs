//! Little-endian scalar access for the plain (non tri-buffer) sections.
//!
//! The sequence table, the material table and whole DSQ files are flat
//! little-endian streams. [`ByteReader`] is a bounds-checked cursor over a
//! borrowed slice; [`ByteWriter`] appends to an owned buffer.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use glam::{Vec2, Vec3};

use super::Quat16;
use crate::tribuf::Region;
use crate::util::{decode_cp1252, encode_cp1252, BBox3f, Error, Result};

/// Bounds-checked little-endian reader.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    region: Region,
}

impl<'a> ByteReader<'a> {
    /// Create a reader over `data`; errors are reported against `region`.
    pub fn new(data: &'a [u8], region: Region) -> Self {
        Self { data, pos: 0, region }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Take the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::TruncatedInput {
                region: self.region,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Everything not yet read.
    pub fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    /// Read an `i32` element count, rejecting negative values.
    pub fn read_count(&mut self, what: &str) -> Result<usize> {
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| Error::invalid(format!("negative {what} count {count}")))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_box(&mut self) -> Result<BBox3f> {
        Ok(BBox3f::new(self.read_vec3()?, self.read_vec3()?))
    }

    pub fn read_quat16(&mut self) -> Result<Quat16> {
        Ok(Quat16 {
            x: self.read_i16()?,
            y: self.read_i16()?,
            z: self.read_i16()?,
            w: self.read_i16()?,
        })
    }

    /// Read `len` bytes of Windows-1252 text.
    pub fn read_text(&mut self, len: usize) -> Result<String> {
        Ok(decode_cp1252(self.take(len)?))
    }

    /// Read a string prefixed by an `i32` byte length.
    pub fn read_name(&mut self) -> Result<String> {
        let len = self.read_count("name length")?;
        self.read_text(len)
    }

    /// Read a NUL-terminated string, consuming the terminator.
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.data[self.pos..];
        let Some(len) = rest.iter().position(|b| *b == 0) else {
            return Err(Error::TruncatedInput {
                region: self.region,
                needed: rest.len() + 1,
                available: rest.len(),
            });
        };
        let text = self.read_text(len)?;
        self.pos += 1;
        Ok(text)
    }
}

/// Little-endian writer over a growable buffer.
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing bytes (e.g. a flushed tri-buffer).
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish and return the bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.buf.write_u8(value)?;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.buf.write_i8(value)?;
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.buf.write_i16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.buf.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.buf.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.buf.write_f32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a collection length as `i32`.
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        let count = i32::try_from(count)
            .map_err(|_| Error::invariant(format!("count {count} does not fit in i32")))?;
        self.write_i32(count)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.buf.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_vec2(&mut self, v: Vec2) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)
    }

    pub fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)?;
        self.write_f32(v.z)
    }

    pub fn write_box(&mut self, b: &BBox3f) -> Result<()> {
        self.write_vec3(b.min)?;
        self.write_vec3(b.max)
    }

    /// Write a NUL-terminated string.
    pub fn write_cstring(&mut self, text: &str) -> Result<()> {
        let bytes = encode_cp1252(text)?;
        self.write_bytes(&bytes)?;
        self.write_u8(0)
    }

    pub fn write_quat16(&mut self, q: Quat16) -> Result<()> {
        for c in q.to_array() {
            self.write_i16(c)?;
        }
        Ok(())
    }

    /// Write a string prefixed by an `i32` byte length.
    pub fn write_name(&mut self, name: &str) -> Result<()> {
        let bytes = encode_cp1252(name)?;
        self.write_count(bytes.len())?;
        self.write_bytes(&bytes)
    }
}
