//! DSQ encoding.

use tracing::debug;

use super::DsqFile;
use crate::codec::{ByteWriter, Quat16};
use crate::dts::sequence::write_sequence;
use crate::dts::Layout;
use crate::util::{Error, Result};

fn write_names(w: &mut ByteWriter, names: &[String]) -> Result<()> {
    w.write_count(names.len())?;
    for name in names {
        w.write_name(name)?;
    }
    Ok(())
}

/// Older files interleave one rotation and one translation per keyframe
/// and have no scale or ground arrays.
fn check_legacy_arrays(file: &DsqFile) -> Result<()> {
    if file.translations.len() != file.rotations.len() {
        return Err(Error::invariant(format!(
            "version {} pairs rotations with translations: {} vs {}",
            file.version,
            file.rotations.len(),
            file.translations.len()
        )));
    }
    let extra = file.uniform_scales.len()
        + file.aligned_scales.len()
        + file.arbitrary_scale_factors.len()
        + file.ground_translations.len();
    if extra > 0 {
        return Err(Error::invariant(format!(
            "version {} has no scale or ground arrays",
            file.version
        )));
    }
    Ok(())
}

#[tracing::instrument(skip_all, fields(version = file.version))]
pub(crate) fn write_dsq(file: &DsqFile) -> Result<Vec<u8>> {
    let layout = Layout::dsq(file.version)?;
    file.validate()?;
    if !layout.split_node_counts {
        check_legacy_arrays(file)?;
    }

    let mut w = ByteWriter::new();
    w.write_i32(file.version)?;
    write_names(&mut w, &file.node_names)?;
    write_names(&mut w, &file.object_names)?;
    w.write_i32(file.old_shape_num_objects)?;

    if layout.split_node_counts {
        w.write_count(file.rotations.len())?;
        for q in &file.rotations {
            w.write_quat16(Quat16::encode(*q))?;
        }
        w.write_count(file.translations.len())?;
        for t in &file.translations {
            w.write_vec3(*t)?;
        }
        w.write_count(file.uniform_scales.len())?;
        for s in &file.uniform_scales {
            w.write_f32(*s)?;
        }
        w.write_count(file.aligned_scales.len())?;
        for s in &file.aligned_scales {
            w.write_vec3(*s)?;
        }
        w.write_count(file.arbitrary_scale_rotations.len())?;
        for q in &file.arbitrary_scale_rotations {
            w.write_quat16(Quat16::encode(*q))?;
        }
        for s in &file.arbitrary_scale_factors {
            w.write_vec3(*s)?;
        }
        w.write_count(file.ground_translations.len())?;
        for t in &file.ground_translations {
            w.write_vec3(*t)?;
        }
        for q in &file.ground_rotations {
            w.write_quat16(Quat16::encode(*q))?;
        }
    } else {
        w.write_count(file.rotations.len())?;
        for (q, t) in file.rotations.iter().zip(&file.translations) {
            w.write_quat16(Quat16::encode(*q))?;
            w.write_vec3(*t)?;
        }
    }
    // Legacy
    w.write_i32(0)?;

    w.write_count(file.sequences.len())?;
    for seq in &file.sequences {
        w.write_name(&seq.name)?;
        write_sequence(&mut w, &seq.sequence, &layout, false)?;
    }

    w.write_count(file.triggers.len())?;
    for trigger in &file.triggers {
        w.write_u32(trigger.state)?;
        w.write_f32(trigger.pos)?;
    }

    debug!(
        sequences = file.sequences.len(),
        bytes = w.len(),
        "encoded sequence file"
    );
    Ok(w.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsq::{decode_sequence_file, DsqSequence};
    use crate::shape::{Sequence, SequenceFlags, Trigger};
    use glam::{Quat, Vec3};

    fn quantized(angle: f32) -> Quat {
        Quat16::encode(Quat::from_rotation_y(angle)).decode()
    }

    fn two_sequences() -> DsqFile {
        let mut idle = Sequence::new(-1, 2, 0.5);
        idle.flags = SequenceFlags::CYCLIC;
        idle.base_scale = -1;
        idle.rotation_matters = [0, 1].into_iter().collect();
        idle.translation_matters = [0, 1].into_iter().collect();

        let mut wave = Sequence::new(-1, 3, 1.0);
        wave.base_rotation = 4;
        wave.base_translation = 4;
        wave.base_scale = -1;
        wave.rotation_matters = [1].into_iter().collect();
        wave.translation_matters = [1].into_iter().collect();
        wave.num_triggers = 1;

        DsqFile {
            node_names: vec!["root".into(), "arm".into()],
            rotations: (0..7).map(|i| quantized(i as f32 * 0.2)).collect(),
            translations: (0..7).map(|i| Vec3::new(i as f32, 0.0, 0.5)).collect(),
            sequences: vec![DsqSequence::new("idle", idle), DsqSequence::new("wave", wave)],
            triggers: vec![Trigger::new(Trigger::STATE_ON | 1, 0.5)],
            ..DsqFile::default()
        }
    }

    #[test]
    fn test_round_trip_each_tier() -> Result<()> {
        for version in [17, 21, 22, 24] {
            let mut file = two_sequences();
            file.version = version;
            let decoded = decode_sequence_file(&encode(&file)?)?;
            assert_eq!(decoded, file, "version {version}");
        }
        Ok(())
    }

    fn encode(file: &DsqFile) -> Result<Vec<u8>> {
        write_dsq(file)
    }

    #[test]
    fn test_legacy_interleaves_keyframes() -> Result<()> {
        let mut file = two_sequences();
        file.version = 21;
        let bytes = encode(&file)?;
        // version, 2 node names, empty object list, old object count
        let start = 4 + 4 + (4 + 4) + (4 + 3) + 4 + 4;
        assert_eq!(&bytes[start..start + 4], &7i32.to_le_bytes());
        // first pair: quaternion (8 bytes) then translation x = 0.0
        assert_eq!(&bytes[start + 12..start + 16], &0.0f32.to_le_bytes());
        assert_eq!(&bytes[start + 16..start + 20], &0.0f32.to_le_bytes());
        assert_eq!(&bytes[start + 20..start + 24], &0.5f32.to_le_bytes());
        Ok(())
    }

    #[test]
    fn test_legacy_rejects_unpaired_arrays() {
        let mut file = two_sequences();
        file.version = 20;
        file.translations.pop();
        assert!(matches!(encode(&file), Err(Error::InvariantViolation(_))));

        let mut file = two_sequences();
        file.version = 20;
        file.uniform_scales.push(1.0);
        assert!(matches!(encode(&file), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_unsupported_versions() {
        for version in [16, 25] {
            let mut file = two_sequences();
            file.version = version;
            assert!(matches!(encode(&file), Err(Error::UnsupportedVersion { .. })));
        }
    }
}
