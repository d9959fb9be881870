//! DTS shape files.
//!
//! ```text
//! i16 version, i16 exporter version
//! tri-buffer header + payload (see crate::tribuf)
//! i32 sequence count, sequence records
//! i8 material list marker, i32 material count, material columns
//! ```
//!
//! Decoding accepts versions 19 to 28; versions 27 and 28 fail once the mesh
//! list is reached. Encoding produces versions 19 to 26.
//!
//! ## Example
//!
//! ```ignore
//! use torque_dts::dts;
//!
//! let shape = dts::read_shape_file("player.dts")?;
//! let bytes = dts::encode(&shape, 24)?;
//! ```

mod material;
mod mesh;
mod reader;
mod records;
pub(crate) mod sequence;
mod version;
mod writer;

pub use version::*;

use std::fs;
use std::path::Path;

use crate::shape::Shape;
use crate::tribuf::GuardMark;
use crate::util::{Error, Result};

/// Encoder settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// DTS version to write.
    pub version: i16,
    /// Exporter version stamped into the header.
    pub exporter_version: i16,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: DTS_VERSION_DEFAULT,
            exporter_version: 0,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: i16) -> Self {
        self.version = version;
        self
    }

    pub fn with_exporter_version(mut self, exporter_version: i16) -> Self {
        self.exporter_version = exporter_version;
        self
    }
}

/// A decoded DTS file with its header fields.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeFile {
    pub version: i16,
    pub exporter_version: i16,
    pub shape: Shape,
    /// Checkpoints verified while decoding, in file order.
    pub guards: Vec<GuardMark>,
}

/// Decode a DTS file.
pub fn decode(bytes: &[u8]) -> Result<Shape> {
    decode_file(bytes).map(|file| file.shape)
}

/// Decode a DTS file, keeping its version, exporter version and guard trace.
pub fn decode_file(bytes: &[u8]) -> Result<ShapeFile> {
    reader::read_shape(bytes)
}

/// Encode `shape` as DTS `version`.
pub fn encode(shape: &Shape, version: i16) -> Result<Vec<u8>> {
    encode_with(shape, &WriteOptions::new().with_version(version))
}

/// Encode `shape` with explicit options.
pub fn encode_with(shape: &Shape, options: &WriteOptions) -> Result<Vec<u8>> {
    writer::write_shape(shape, options)
}

/// Read and decode a DTS file from disk.
pub fn read_shape_file(path: impl AsRef<Path>) -> Result<Shape> {
    let bytes = read_bytes(path.as_ref())?;
    decode(&bytes)
}

/// Encode `shape` and write it to disk.
pub fn write_shape_file(path: impl AsRef<Path>, shape: &Shape, options: &WriteOptions) -> Result<()> {
    let bytes = encode_with(shape, options)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read a whole file, mapping a missing file to [`Error::FileNotFound`].
pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Mesh, MeshData, Primitive, Subshape};
    use crate::tribuf::Checkpoint;
    use glam::{Vec2, Vec3};

    fn minimal() -> Shape {
        let mut shape = Shape::new();
        let root = shape.add_node("root", None);
        let mesh = MeshData::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            vec![Vec3::Z; 3],
            vec![Primitive::triangles(0, 3, Some(0))],
            vec![0, 1, 2],
        );
        shape.add_object("box", root, vec![Mesh::Standard(mesh)]);
        shape.subshapes.push(Subshape {
            num_nodes: 1,
            num_objects: 1,
            ..Subshape::default()
        });
        shape.add_detail_level("detail32", 0, 0, 32.0);
        shape
    }

    #[test]
    fn test_write_options() {
        let opts = WriteOptions::default();
        assert_eq!(opts.version, 24);
        assert_eq!(opts.exporter_version, 0);
        let opts = WriteOptions::new().with_version(22).with_exporter_version(7);
        assert_eq!((opts.version, opts.exporter_version), (22, 7));
    }

    #[test]
    fn test_header_fields() -> Result<()> {
        let bytes = encode_with(&minimal(), &WriteOptions::new().with_exporter_version(3))?;
        assert_eq!(&bytes[0..2], &24i16.to_le_bytes());
        assert_eq!(&bytes[2..4], &3i16.to_le_bytes());

        let file = decode_file(&bytes)?;
        assert_eq!(file.version, 24);
        assert_eq!(file.exporter_version, 3);
        assert_eq!(file.shape, minimal());
        Ok(())
    }

    #[test]
    fn test_checkpoint_order() -> Result<()> {
        let file = decode_file(&encode(&minimal(), 24)?)?;
        let checkpoints: Vec<_> = file.guards.iter().map(|g| g.checkpoint).collect();
        assert_eq!(
            checkpoints,
            vec![
                Checkpoint::Header,
                Checkpoint::Bounds,
                Checkpoint::Nodes,
                Checkpoint::Objects,
                Checkpoint::Decals,
                Checkpoint::IflMaterials,
                Checkpoint::SubshapeFirsts,
                Checkpoint::SubshapeCounts,
                Checkpoint::NodeTransforms,
                Checkpoint::NodeScales,
                Checkpoint::GroundTransforms,
                Checkpoint::ObjectStates,
                Checkpoint::DecalStates,
                Checkpoint::Triggers,
                Checkpoint::DetailLevels,
                Checkpoint::MeshStart(0),
                Checkpoint::MeshEnd(0),
                Checkpoint::Meshes,
                Checkpoint::Names,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_legacy_checkpoints() -> Result<()> {
        let mut shape = minimal();
        if let Some(data) = shape.meshes[0].data_mut() {
            data.encoded_normals.clear();
        }
        let file = decode_file(&encode(&shape, 21)?)?;
        assert!(!file.guards.iter().any(|g| matches!(
            g.checkpoint,
            Checkpoint::NodeScales | Checkpoint::GroundTransforms
        )));
        assert_eq!(file.shape, shape);
        Ok(())
    }

    #[test]
    fn test_layout_constraints() {
        let mut shape = minimal();
        shape.node_uniform_scales.push(2.0);
        assert!(matches!(encode(&shape, 21), Err(Error::InvariantViolation(_))));

        let mut shape = minimal();
        shape.ground_translations.push(Vec3::X);
        shape.ground_rotations.push(glam::Quat::IDENTITY);
        assert!(matches!(encode(&shape, 23), Err(Error::InvariantViolation(_))));
        assert!(encode(&shape, 24).is_ok());

        // Encoded normals are only stored from version 22
        assert!(matches!(encode(&minimal(), 21), Err(Error::InvariantViolation(_))));

        let mut shape = minimal();
        shape.detail_levels[0].alpha_in = 0.5;
        assert!(matches!(encode(&shape, 25), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = read_shape_file("/nonexistent/shape.dts").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
