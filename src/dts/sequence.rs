//! Sequence record codec, shared by DTS tails and DSQ files.

use super::version::Layout;
use crate::codec::{BitSet, ByteReader, ByteWriter};
use crate::shape::{Sequence, SequenceFlags};
use crate::util::{Error, Result};

/// Legacy flag bytes, in file order.
const LEGACY_FLAG_BYTES: [SequenceFlags; 3] = [
    SequenceFlags::BLEND,
    SequenceFlags::CYCLIC,
    SequenceFlags::MAKE_PATH,
];

/// Read one sequence record. DSQ records carry no name index (`with_name_index = false`).
pub(crate) fn read_sequence(
    r: &mut ByteReader<'_>,
    layout: &Layout,
    with_name_index: bool,
) -> Result<Sequence> {
    let name_index = if with_name_index { r.read_i32()? } else { -1 };
    let mut flags = if layout.sequence_flags_word {
        SequenceFlags::from_bits_retain(r.read_u32()?)
    } else {
        SequenceFlags::empty()
    };
    let num_keyframes = r.read_i32()?;
    let duration = r.read_f32()?;
    if !layout.sequence_flags_word {
        for flag in LEGACY_FLAG_BYTES {
            if r.read_u8()? != 0 {
                flags |= flag;
            }
        }
    }
    let priority = r.read_i32()?;
    let first_ground_frame = r.read_i32()?;
    let num_ground_frames = r.read_i32()?;

    let (base_rotation, base_translation, base_scale) = if layout.sequence_flags_word {
        (r.read_i32()?, r.read_i32()?, r.read_i32()?)
    } else {
        let base = r.read_i32()?;
        (base, base, -1)
    };
    let base_object_state = r.read_i32()?;
    let base_decal_state = r.read_i32()?;
    let first_trigger = r.read_i32()?;
    let num_triggers = r.read_i32()?;
    let tool_begin = r.read_f32()?;

    let rotation_matters = BitSet::read(r)?;
    let (translation_matters, scale_matters) = if layout.sequence_flags_word {
        (BitSet::read(r)?, BitSet::read(r)?)
    } else {
        (rotation_matters.clone(), BitSet::new())
    };

    Ok(Sequence {
        name_index,
        flags,
        num_keyframes,
        duration,
        priority,
        first_ground_frame,
        num_ground_frames,
        base_rotation,
        base_translation,
        base_scale,
        base_object_state,
        base_decal_state,
        first_trigger,
        num_triggers,
        tool_begin,
        rotation_matters,
        translation_matters,
        scale_matters,
        decal_matters: BitSet::read(r)?,
        ifl_matters: BitSet::read(r)?,
        vis_matters: BitSet::read(r)?,
        frame_matters: BitSet::read(r)?,
        mat_frame_matters: BitSet::read(r)?,
    })
}

/// Write one sequence record.
pub(crate) fn write_sequence(
    w: &mut ByteWriter,
    seq: &Sequence,
    layout: &Layout,
    with_name_index: bool,
) -> Result<()> {
    if !layout.sequence_flags_word && !seq.is_legacy_compatible() {
        return Err(Error::invariant(format!(
            "sequence {} uses scale channels, separate translation tracks or flags {:?} \
             that versions before 22 cannot store",
            seq.name_index,
            seq.flags.difference(SequenceFlags::LEGACY)
        )));
    }

    if with_name_index {
        w.write_i32(seq.name_index)?;
    }
    if layout.sequence_flags_word {
        w.write_u32(seq.flags.bits())?;
    }
    w.write_i32(seq.num_keyframes)?;
    w.write_f32(seq.duration)?;
    if !layout.sequence_flags_word {
        for flag in LEGACY_FLAG_BYTES {
            w.write_u8(seq.flags.contains(flag).into())?;
        }
    }
    w.write_i32(seq.priority)?;
    w.write_i32(seq.first_ground_frame)?;
    w.write_i32(seq.num_ground_frames)?;
    w.write_i32(seq.base_rotation)?;
    if layout.sequence_flags_word {
        w.write_i32(seq.base_translation)?;
        w.write_i32(seq.base_scale)?;
    }
    w.write_i32(seq.base_object_state)?;
    w.write_i32(seq.base_decal_state)?;
    w.write_i32(seq.first_trigger)?;
    w.write_i32(seq.num_triggers)?;
    w.write_f32(seq.tool_begin)?;

    seq.rotation_matters.write(w)?;
    if layout.sequence_flags_word {
        seq.translation_matters.write(w)?;
        seq.scale_matters.write(w)?;
    }
    seq.decal_matters.write(w)?;
    seq.ifl_matters.write(w)?;
    seq.vis_matters.write(w)?;
    seq.frame_matters.write(w)?;
    seq.mat_frame_matters.write(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tribuf::Region;

    fn layout(v: i32) -> Layout {
        Layout::for_version(v).unwrap_or_else(|| panic!("no layout for {v}"))
    }

    fn walk() -> Sequence {
        let mut seq = Sequence::new(4, 10, 0.33);
        seq.flags = SequenceFlags::CYCLIC;
        seq.base_scale = -1;
        seq.rotation_matters = [0].into_iter().collect();
        seq.translation_matters = [0].into_iter().collect();
        seq.vis_matters = BitSet::with_capacity(3);
        seq.num_triggers = 1;
        seq
    }

    fn round_trip(seq: &Sequence, version: i32, with_name_index: bool) -> Result<(Sequence, usize)> {
        let layout = layout(version);
        let mut w = ByteWriter::new();
        write_sequence(&mut w, seq, &layout, with_name_index)?;
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes, Region::Plain);
        let decoded = read_sequence(&mut r, &layout, with_name_index)?;
        assert_eq!(r.remaining(), 0);
        Ok((decoded, bytes.len()))
    }

    #[test]
    fn test_current_layout() -> Result<()> {
        let seq = walk();
        let (decoded, len) = round_trip(&seq, 24, true)?;
        assert_eq!(decoded, seq);
        // 15 scalar words, 8 sets of (2 words + payload)
        assert_eq!(len, 15 * 4 + 8 * 8 + 3 * 4);

        let (decoded, len_dsq) = round_trip(&seq, 24, false)?;
        assert_eq!(decoded.name_index, -1);
        assert_eq!(len_dsq, len - 4);
        Ok(())
    }

    #[test]
    fn test_legacy_layout() -> Result<()> {
        let seq = walk();
        let (decoded, len) = round_trip(&seq, 21, true)?;
        assert_eq!(decoded, seq);
        // No flag word (+3 bytes), two fewer bases, two fewer sets
        assert_eq!(len, 12 * 4 + 3 + 6 * 8 + 2 * 4);
        Ok(())
    }

    #[test]
    fn test_legacy_rejects_split_channels() {
        let mut seq = walk();
        seq.translation_matters = [0, 1].into_iter().collect();
        let mut w = ByteWriter::new();
        assert!(matches!(
            write_sequence(&mut w, &seq, &layout(21), true),
            Err(Error::InvariantViolation(_))
        ));

        let mut seq = walk();
        seq.flags |= SequenceFlags::HAS_TRANSLUCENCY;
        assert!(write_sequence(&mut w, &seq, &layout(20), true).is_err());
    }
}
