//! Tri-buffer reader.

use glam::{Vec2, Vec3};
use tracing::trace;

use super::{Checkpoint, GuardCounter, GuardMark, Region, TriBufferHeader};
use crate::codec::{ByteReader, Quat16};
use crate::util::{BBox3f, Error, Result};

/// Cursor set over the three regions of a tri-buffer payload.
///
/// Each region has its own cursor. 32-bit values, counts and floats come from
/// the 32-bit region, quaternions and indices from the 16-bit region, names
/// and encoded normals from the 8-bit region.
pub struct TriBufferReader<'a> {
    r32: ByteReader<'a>,
    r16: ByteReader<'a>,
    r8: ByteReader<'a>,
    guards: GuardCounter,
    marks: Vec<GuardMark>,
}

impl<'a> TriBufferReader<'a> {
    /// Slice `payload` into the three regions described by `header`.
    pub fn new(payload: &'a [u8], header: &TriBufferHeader) -> Result<Self> {
        let [range32, range16, range8] = header.byte_ranges()?;
        if range8.end > payload.len() {
            return Err(Error::TruncatedInput {
                region: Region::Header,
                needed: range8.end,
                available: payload.len(),
            });
        }
        Ok(Self {
            r32: ByteReader::new(&payload[range32], Region::Words32),
            r16: ByteReader::new(&payload[range16], Region::Words16),
            r8: ByteReader::new(&payload[range8], Region::Bytes8),
            guards: GuardCounter::default(),
            marks: Vec::new(),
        })
    }

    /// Unread bytes in each region: `[32-bit, 16-bit, 8-bit]`.
    pub fn remaining(&self) -> [usize; 3] {
        [self.r32.remaining(), self.r16.remaining(), self.r8.remaining()]
    }

    /// Checkpoints verified so far.
    pub fn marks(&self) -> &[GuardMark] {
        &self.marks
    }

    /// Give up the checkpoint trace.
    pub fn into_marks(self) -> Vec<GuardMark> {
        self.marks
    }

    // 32-bit region

    pub fn read_i32(&mut self) -> Result<i32> {
        self.r32.read_i32()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.r32.read_u32()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.r32.read_f32()
    }

    /// Read an element count, rejecting negative values.
    pub fn read_count(&mut self, what: &str) -> Result<usize> {
        self.r32.read_count(what)
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        self.r32.read_vec2()
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        self.r32.read_vec3()
    }

    pub fn read_box(&mut self) -> Result<BBox3f> {
        self.r32.read_box()
    }

    /// Read `count` items from the 32-bit region with `f`.
    ///
    /// The preallocation is capped by what the region can still hold, so a
    /// corrupt count fails with truncation instead of exhausting memory.
    pub fn read_array32<T>(
        &mut self,
        count: usize,
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::with_capacity(count.min(self.r32.remaining() / 4));
        for _ in 0..count {
            items.push(f(self)?);
        }
        Ok(items)
    }

    // 16-bit region

    pub fn read_i16(&mut self) -> Result<i16> {
        self.r16.read_i16()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.r16.read_u16()
    }

    pub fn read_quat16(&mut self) -> Result<Quat16> {
        self.r16.read_quat16()
    }

    pub fn read_quats(&mut self, count: usize) -> Result<Vec<Quat16>> {
        let mut quats = Vec::with_capacity(count.min(self.r16.remaining() / 8));
        for _ in 0..count {
            quats.push(self.r16.read_quat16()?);
        }
        Ok(quats)
    }

    pub fn read_u16s(&mut self, count: usize) -> Result<Vec<u16>> {
        let mut values = Vec::with_capacity(count.min(self.r16.remaining() / 2));
        for _ in 0..count {
            values.push(self.r16.read_u16()?);
        }
        Ok(values)
    }

    // 8-bit region

    pub fn read_i8(&mut self) -> Result<i8> {
        self.r8.read_i8()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.r8.read_u8()
    }

    pub fn read_u8s(&mut self, count: usize) -> Result<Vec<u8>> {
        Ok(self.r8.take(count)?.to_vec())
    }

    /// Read a NUL-terminated Windows-1252 string.
    pub fn read_cstring(&mut self) -> Result<String> {
        self.r8.read_cstring()
    }

    /// Verify the next guard value in all three regions.
    pub fn check_guard(&mut self, checkpoint: Checkpoint) -> Result<()> {
        let expected = self.guards;
        let observed32 = self.r32.read_i32()?;
        let observed16 = self.r16.read_i16()?;
        let observed8 = self.r8.read_i8()?;

        let mismatch = |region, expected: i32, observed: i32| Error::GuardMismatch {
            checkpoint,
            region,
            expected,
            observed,
        };
        if observed32 != expected.next32 {
            return Err(mismatch(Region::Words32, expected.next32, observed32));
        }
        if observed16 != expected.next16 {
            return Err(mismatch(
                Region::Words16,
                expected.next16.into(),
                observed16.into(),
            ));
        }
        if observed8 != expected.next8 {
            return Err(mismatch(Region::Bytes8, expected.next8.into(), observed8.into()));
        }

        trace!(%checkpoint, value = observed32, "guard ok");
        self.marks.push(GuardMark {
            checkpoint,
            value: observed32,
        });
        self.guards.advance();
        Ok(())
    }
}
