//! Integration tests for DSQ sequence files.

use glam::{Quat, Vec3};
use tempfile::NamedTempFile;

use torque_dts::codec::{BitSet, Quat16};
use torque_dts::dsq::{self, DsqFile, DsqSequence};
use torque_dts::shape::{Sequence, SequenceFlags, Trigger};
use torque_dts::Error;

fn walk_file() -> DsqFile {
    let mut walk = Sequence::new(-1, 10, 1.0);
    walk.flags = SequenceFlags::CYCLIC;
    walk.rotation_matters = [0].into_iter().collect();
    walk.translation_matters = BitSet::new();
    walk.base_scale = -1;

    DsqFile {
        node_names: vec!["Bip01".into(), "Bip01 Spine".into(), "Bip01 Head".into()],
        rotations: (0..10)
            .map(|i| Quat16::encode(Quat::from_rotation_y(i as f32 * 0.3)).decode())
            .collect(),
        sequences: vec![DsqSequence::new("walk", walk)],
        ..DsqFile::default()
    }
}

#[test]
fn test_walk_scenario() {
    let bytes = dsq::encode_sequence_file(&walk_file()).expect("encode");
    let file = dsq::decode_sequence_file(&bytes).expect("decode");

    assert_eq!(file.version, 24);
    assert_eq!(file.sequences[0].name, "walk");
    assert_eq!(file.sequences[0].sequence.num_keyframes, 10);
    // Only node 0 is animated, so only ten slots
    assert_eq!(file.rotations.len(), 10);
    assert_eq!(file.node_rotation(0, 0, 9), Some(file.rotations[9]));
    assert_eq!(file.node_rotation(0, 1, 0), None);
    assert_eq!(file, walk_file());
}

#[test]
fn test_scales_and_ground_frames() {
    let mut file = walk_file();
    let mut lift = Sequence::new(-1, 2, 0.5);
    lift.flags = SequenceFlags::ARBITRARY_SCALE;
    lift.base_rotation = -1;
    lift.base_translation = 0;
    lift.translation_matters = [2].into_iter().collect();
    lift.scale_matters = [2].into_iter().collect();
    lift.num_ground_frames = 2;
    lift.num_triggers = 2;
    file.sequences.push(DsqSequence::new("lift", lift));

    file.translations = vec![Vec3::ZERO, Vec3::Y];
    file.uniform_scales = vec![1.0];
    file.aligned_scales = vec![Vec3::splat(2.0)];
    file.arbitrary_scale_rotations = vec![Quat::IDENTITY, Quat16::encode(Quat::from_rotation_x(1.0)).decode()];
    file.arbitrary_scale_factors = vec![Vec3::ONE, Vec3::new(1.0, 3.0, 1.0)];
    file.ground_translations = vec![Vec3::ZERO, Vec3::X];
    file.ground_rotations = vec![Quat::IDENTITY, Quat::IDENTITY];
    file.triggers = vec![Trigger::new(1, 0.0), Trigger::new(Trigger::STATE_ON | 1, 1.0)];
    file.object_names = vec!["legacy".into()];
    file.old_shape_num_objects = 1;

    let decoded = dsq::decode_sequence_file(&dsq::encode_sequence_file(&file).expect("encode"))
        .expect("decode");
    assert_eq!(decoded, file);
    assert_eq!(decoded.find_sequence("LIFT"), Some(1));
    assert_eq!(decoded.node_translation(1, 2, 1), Some(Vec3::Y));
}

#[test]
fn test_unquantized_rotation_tolerance() {
    let mut file = walk_file();
    file.rotations[4] = Quat::from_euler(glam::EulerRot::ZYX, 0.7, 0.2, -0.4);
    let decoded = dsq::decode_sequence_file(&dsq::encode_sequence_file(&file).expect("encode"))
        .expect("decode");
    let (a, b) = (decoded.rotations[4].to_array(), file.rotations[4].to_array());
    for i in 0..4 {
        assert!((a[i] - b[i]).abs() <= 1.0 / 32767.0);
    }
}

#[test]
fn test_names_are_windows_1252() {
    let mut file = walk_file();
    file.node_names[2] = "Kopf°".into();
    let bytes = dsq::encode_sequence_file(&file).expect("encode");
    // version, count, then "Bip01" with its length
    assert_eq!(&bytes[8..12], &5i32.to_le_bytes());
    assert!(bytes.windows(5).any(|w| w == b"Kopf\xB0"));
    let decoded = dsq::decode_sequence_file(&bytes).expect("decode");
    assert_eq!(decoded.find_node("kopf°"), Some(2));
}

#[test]
fn test_truncated_file() {
    let bytes = dsq::encode_sequence_file(&walk_file()).expect("encode");
    for cut in [2, 20, bytes.len() / 2, bytes.len() - 1] {
        let err = dsq::decode_sequence_file(&bytes[..cut]).unwrap_err();
        assert!(matches!(err, Error::TruncatedInput { .. }), "cut at {cut}: {err}");
    }
}

#[test]
fn test_unsupported_version() {
    let mut bytes = dsq::encode_sequence_file(&walk_file()).expect("encode");
    bytes[0..4].copy_from_slice(&25i32.to_le_bytes());
    assert!(matches!(
        dsq::decode_sequence_file(&bytes),
        Err(Error::UnsupportedVersion { version: 25, .. })
    ));
}

#[test]
fn test_file_roundtrip() {
    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let mut file = walk_file();
    file.version = 21;
    // Older layout pairs a translation with every rotation
    assert!(matches!(
        dsq::write_sequence_file(temp.path(), &file),
        Err(Error::InvariantViolation(_))
    ));
    file.translations = (0..10).map(|i| Vec3::new(0.0, 0.0, i as f32)).collect();
    file.sequences[0].sequence.translation_matters = [0].into_iter().collect();

    dsq::write_sequence_file(temp.path(), &file).expect("write");
    let decoded = dsq::read_sequence_file(temp.path()).expect("read");
    assert_eq!(decoded.version, 21);
    assert_eq!(decoded, file);

    assert!(matches!(
        dsq::read_sequence_file("/nonexistent/walk.dsq"),
        Err(Error::FileNotFound(_))
    ));
}
