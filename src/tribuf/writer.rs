//! Tri-buffer writer.

use glam::{Vec2, Vec3};
use tracing::trace;

use super::{Checkpoint, GuardCounter, GuardMark, TriBufferHeader};
use crate::codec::Quat16;
use crate::util::{encode_cp1252, BBox3f, Error, Result};

/// Three growable regions filled independently, concatenated by [`finish`](Self::finish).
///
/// Writes into memory cannot fail, so scalar writes return nothing. Only
/// counts (which must fit in `i32`) and strings (which must fit the codepage)
/// are fallible.
#[derive(Default)]
pub struct TriBufferWriter {
    buf32: Vec<u8>,
    buf16: Vec<u8>,
    buf8: Vec<u8>,
    guards: GuardCounter,
    marks: Vec<GuardMark>,
}

impl TriBufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checkpoints written so far.
    pub fn marks(&self) -> &[GuardMark] {
        &self.marks
    }

    /// Bytes written to each region: `[32-bit, 16-bit, 8-bit]`.
    pub fn lens(&self) -> [usize; 3] {
        [self.buf32.len(), self.buf16.len(), self.buf8.len()]
    }

    // 32-bit region

    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buf32.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf32.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buf32.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a collection length as `i32`.
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        let count = i32::try_from(count)
            .map_err(|_| Error::invariant(format!("count {count} does not fit in i32")))?;
        self.write_i32(count);
        Ok(())
    }

    pub fn write_vec2(&mut self, v: Vec2) {
        self.write_f32(v.x);
        self.write_f32(v.y);
    }

    pub fn write_vec3(&mut self, v: Vec3) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    pub fn write_box(&mut self, b: &BBox3f) {
        self.write_vec3(b.min);
        self.write_vec3(b.max);
    }

    // 16-bit region

    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.buf16.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf16.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_quat16(&mut self, q: Quat16) {
        for c in q.to_array() {
            self.write_i16(c);
        }
    }

    pub fn write_u16s(&mut self, values: &[u16]) {
        for v in values {
            self.write_u16(*v);
        }
    }

    // 8-bit region

    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.buf8.push(value as u8);
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf8.push(value);
    }

    pub fn write_u8s(&mut self, values: &[u8]) {
        self.buf8.extend_from_slice(values);
    }

    /// Write a NUL-terminated Windows-1252 string.
    pub fn write_cstring(&mut self, text: &str) -> Result<()> {
        let bytes = encode_cp1252(text)?;
        self.buf8.extend_from_slice(&bytes);
        self.buf8.push(0);
        Ok(())
    }

    /// Write the next guard value to all three regions.
    pub fn write_guard(&mut self, checkpoint: Checkpoint) {
        let g = self.guards;
        self.write_i32(g.next32);
        self.write_i16(g.next16);
        self.write_i8(g.next8);
        trace!(%checkpoint, value = g.next32, "guard written");
        self.marks.push(GuardMark {
            checkpoint,
            value: g.next32,
        });
        self.guards.advance();
    }

    /// Pad the 16- and 8-bit regions to whole words and concatenate.
    pub fn finish(mut self) -> Result<(TriBufferHeader, Vec<u8>)> {
        pad_to_word(&mut self.buf16);
        pad_to_word(&mut self.buf8);
        let header =
            TriBufferHeader::for_regions(self.buf32.len(), self.buf16.len(), self.buf8.len())?;

        let mut payload =
            Vec::with_capacity(self.buf32.len() + self.buf16.len() + self.buf8.len());
        payload.extend_from_slice(&self.buf32);
        payload.extend_from_slice(&self.buf16);
        payload.extend_from_slice(&self.buf8);
        Ok((header, payload))
    }
}

fn pad_to_word(buf: &mut Vec<u8>) {
    let rem = buf.len() % 4;
    if rem != 0 {
        buf.resize(buf.len() + 4 - rem, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_pads_small_regions() -> Result<()> {
        let mut w = TriBufferWriter::new();
        w.write_i32(-1);
        w.write_i16(3);
        w.write_u8(0xAA);
        w.write_u8(0xBB);
        w.write_u8(0xCC);
        let (header, payload) = w.finish()?;

        assert_eq!(header.offset16, 1);
        assert_eq!(header.offset8, 2);
        assert_eq!(header.total_words, 3);
        assert_eq!(payload.len(), 12);
        assert_eq!(&payload[4..8], &[3, 0, 0, 0]);
        assert_eq!(&payload[8..12], &[0xAA, 0xBB, 0xCC, 0]);
        Ok(())
    }

    #[test]
    fn test_guard_values_per_region() -> Result<()> {
        let mut w = TriBufferWriter::new();
        w.write_guard(Checkpoint::Header);
        w.write_guard(Checkpoint::Bounds);
        assert_eq!(w.lens(), [8, 4, 2]);
        assert_eq!(w.marks().len(), 2);

        let (header, payload) = w.finish()?;
        assert_eq!(header.total_words, 4);
        assert_eq!(&payload[0..8], &[0, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(&payload[8..12], &[0, 0, 1, 0]);
        assert_eq!(&payload[12..16], &[0, 1, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_cstring_terminated() -> Result<()> {
        let mut w = TriBufferWriter::new();
        w.write_cstring("Bip01")?;
        assert_eq!(w.lens()[2], 6);
        assert!(w.write_cstring("日本").is_err());
        Ok(())
    }
}
