//! DSQ sequence files.
//!
//! A DSQ carries animation without geometry. Nodes are identified by name
//! instead of by index, so the keyframes can be applied to any shape with
//! matching node names (compared case-insensitively).
//!
//! ```text
//! i32 version
//! node names, object names, old object count
//! keyframe arrays (layout depends on version)
//! i32 legacy word
//! sequences, each preceded by its name
//! triggers
//! ```
//!
//! Versions 17 to 24 are supported.

mod reader;
mod writer;

use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};

use crate::dts::{read_bytes, DSQ_VERSION_DEFAULT};
use crate::shape::{Channel, Sequence, Trigger};
use crate::util::{Error, Result};

/// A named sequence in a DSQ file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DsqSequence {
    pub name: String,
    /// Bases and matters sets index the arrays of the owning [`DsqFile`];
    /// `name_index` is unused.
    pub sequence: Sequence,
}

impl DsqSequence {
    pub fn new(name: impl Into<String>, sequence: Sequence) -> Self {
        Self {
            name: name.into(),
            sequence,
        }
    }
}

/// Contents of a DSQ file.
#[derive(Clone, Debug, PartialEq)]
pub struct DsqFile {
    /// Version written by [`encode_sequence_file`].
    pub version: i32,
    pub node_names: Vec<String>,
    /// Legacy object names, usually empty.
    pub object_names: Vec<String>,
    pub old_shape_num_objects: i32,

    pub rotations: Vec<Quat>,
    pub translations: Vec<Vec3>,
    pub uniform_scales: Vec<f32>,
    pub aligned_scales: Vec<Vec3>,
    pub arbitrary_scale_rotations: Vec<Quat>,
    pub arbitrary_scale_factors: Vec<Vec3>,
    pub ground_translations: Vec<Vec3>,
    pub ground_rotations: Vec<Quat>,

    pub sequences: Vec<DsqSequence>,
    pub triggers: Vec<Trigger>,
}

impl Default for DsqFile {
    fn default() -> Self {
        Self {
            version: DSQ_VERSION_DEFAULT,
            node_names: Vec::new(),
            object_names: Vec::new(),
            old_shape_num_objects: 0,
            rotations: Vec::new(),
            translations: Vec::new(),
            uniform_scales: Vec::new(),
            aligned_scales: Vec::new(),
            arbitrary_scale_rotations: Vec::new(),
            arbitrary_scale_factors: Vec::new(),
            ground_translations: Vec::new(),
            ground_rotations: Vec::new(),
            sequences: Vec::new(),
            triggers: Vec::new(),
        }
    }
}

impl DsqFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the node called `name`, ignoring case.
    pub fn find_node(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.node_names.iter().position(|n| n.to_lowercase() == name)
    }

    /// Index of the sequence called `name`, ignoring case.
    pub fn find_sequence(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.sequences
            .iter()
            .position(|s| s.name.to_lowercase() == name)
    }

    /// Rotation of `node` at `frame` of sequence `seq`, if the sequence animates it.
    pub fn node_rotation(&self, seq: usize, node: usize, frame: usize) -> Option<Quat> {
        let index = self.key_index(seq, Channel::Rotation, node, frame)?;
        self.rotations.get(index).copied()
    }

    /// Translation of `node` at `frame` of sequence `seq`, if the sequence animates it.
    pub fn node_translation(&self, seq: usize, node: usize, frame: usize) -> Option<Vec3> {
        let index = self.key_index(seq, Channel::Translation, node, frame)?;
        self.translations.get(index).copied()
    }

    fn key_index(&self, seq: usize, channel: Channel, node: usize, frame: usize) -> Option<usize> {
        self.sequences
            .get(seq)?
            .sequence
            .key_index(channel, node, frame)
    }

    /// Check that every sequence fits the node list and keyframe arrays.
    pub fn validate(&self) -> Result<()> {
        let nodes = self.node_names.len();
        if self.arbitrary_scale_rotations.len() != self.arbitrary_scale_factors.len() {
            return Err(Error::invariant(format!(
                "{} arbitrary scale rotations vs {} factors",
                self.arbitrary_scale_rotations.len(),
                self.arbitrary_scale_factors.len()
            )));
        }
        if self.ground_rotations.len() != self.ground_translations.len() {
            return Err(Error::invariant(format!(
                "{} ground rotations vs {} translations",
                self.ground_rotations.len(),
                self.ground_translations.len()
            )));
        }

        for (i, DsqSequence { name, sequence: seq }) in self.sequences.iter().enumerate() {
            let what = |set: &str| format!("sequence {name:?} {set}");
            seq.rotation_matters.check_bound(nodes, &what("rotation"))?;
            seq.translation_matters.check_bound(nodes, &what("translation"))?;
            seq.scale_matters.check_bound(nodes, &what("scale"))?;

            let keys = [
                (Channel::Rotation, self.rotations.len()),
                (Channel::Translation, self.translations.len()),
            ];
            for (channel, len) in keys {
                let slots = seq.slot_count(channel);
                let (base, _) = seq.channel(channel);
                if slots > 0 && (base < 0 || base as usize + slots > len) {
                    return Err(Error::invariant(format!(
                        "sequence {i} {channel:?} keys {base}..{} exceed {len}",
                        base as i64 + slots as i64
                    )));
                }
            }
            let triggers_end = seq.first_trigger as i64 + seq.num_triggers as i64;
            if seq.num_triggers > 0 && triggers_end > self.triggers.len() as i64 {
                return Err(Error::invariant(format!(
                    "sequence {name:?} triggers end at {triggers_end}, file has {}",
                    self.triggers.len()
                )));
            }
        }
        Ok(())
    }
}

/// Decode a DSQ file.
pub fn decode_sequence_file(bytes: &[u8]) -> Result<DsqFile> {
    reader::read_dsq(bytes)
}

/// Encode `file` as DSQ `file.version`.
pub fn encode_sequence_file(file: &DsqFile) -> Result<Vec<u8>> {
    writer::write_dsq(file)
}

/// Read and decode a DSQ file from disk.
pub fn read_sequence_file(path: impl AsRef<Path>) -> Result<DsqFile> {
    let bytes = read_bytes(path.as_ref())?;
    decode_sequence_file(&bytes)
}

/// Encode `file` and write it to disk.
pub fn write_sequence_file(path: impl AsRef<Path>, file: &DsqFile) -> Result<()> {
    fs::write(path, encode_sequence_file(file)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BitSet;

    fn walk() -> DsqFile {
        let mut seq = Sequence::new(-1, 10, 1.0);
        seq.rotation_matters = [0].into_iter().collect();
        seq.translation_matters = BitSet::new();
        seq.base_scale = -1;
        DsqFile {
            node_names: vec!["Root".into(), "Hip".into()],
            rotations: (0..10)
                .map(|i| Quat::from_rotation_z(i as f32 * 0.1))
                .collect(),
            sequences: vec![DsqSequence::new("walk", seq)],
            ..DsqFile::default()
        }
    }

    #[test]
    fn test_find_ignores_case() {
        let dsq = walk();
        assert_eq!(dsq.find_node("root"), Some(0));
        assert_eq!(dsq.find_node("HIP"), Some(1));
        assert_eq!(dsq.find_node("spine"), None);
        assert_eq!(dsq.find_sequence("Walk"), Some(0));
    }

    #[test]
    fn test_keyframe_lookup() {
        let dsq = walk();
        assert_eq!(dsq.node_rotation(0, 0, 3), Some(dsq.rotations[3]));
        assert_eq!(dsq.node_rotation(0, 1, 3), None);
        assert_eq!(dsq.node_rotation(0, 0, 10), None);
        assert_eq!(dsq.node_translation(0, 0, 0), None);
    }

    #[test]
    fn test_validate() -> Result<()> {
        walk().validate()?;

        let mut dsq = walk();
        dsq.rotations.truncate(9);
        assert!(matches!(dsq.validate(), Err(Error::InvariantViolation(_))));

        let mut dsq = walk();
        dsq.sequences[0].sequence.rotation_matters.insert(2);
        assert!(dsq.validate().is_err());

        let mut dsq = walk();
        dsq.ground_translations.push(Vec3::ONE);
        assert!(dsq.validate().is_err());
        Ok(())
    }
}
