//! Mesh codec.
//!
//! ```text
//! type word (kind | flags)
//! -- standard and skin --
//! guard
//! frames, material frames, parent mesh, bounds, center, radius
//! verts, tverts, normals, [encoded normals]
//! primitives (16-bit range + 32-bit type word)
//! indices, merge indices, verts per frame, flags
//! guard
//! -- skin only --
//! duplicate verts / normals / encoded normals
//! bind matrices, influences (columnar), bone nodes
//! guard
//! ```

use glam::Mat4;

use super::records::{pack_primitive_type, unpack_primitive};
use super::version::Layout;
use crate::shape::{Influence, Mesh, MeshData, MeshFlags, MeshKind, SkinBone, SkinMesh};
use crate::tribuf::{Checkpoint, TriBufferReader, TriBufferWriter};
use crate::util::{Error, Result};

pub(crate) fn read_mesh(
    r: &mut TriBufferReader<'_>,
    layout: &Layout,
    version: i16,
    index: usize,
) -> Result<Mesh> {
    let word = r.read_u32()?;
    let tag = word & MeshKind::TYPE_MASK;
    let kind = MeshKind::from_tag(tag).ok_or(Error::InvalidTag {
        what: "mesh type",
        value: word,
    })?;

    match kind {
        MeshKind::Null => Ok(Mesh::Null),
        MeshKind::Decal | MeshKind::Sorted => Err(Error::UnsupportedMesh(kind)),
        MeshKind::Standard | MeshKind::Skin if layout.vertex_channels => Err(Error::unsupported(
            version,
            "meshes with a second UV set and vertex colors",
        )),
        MeshKind::Standard => {
            let mesh = read_mesh_data(r, layout, index)?;
            Ok(Mesh::Standard(with_type_flags(mesh, word)))
        }
        MeshKind::Skin => {
            let mesh = read_mesh_data(r, layout, index)?;
            read_skin(r, layout, with_type_flags(mesh, word), index).map(Mesh::Skin)
        }
    }
}

/// Keep the type word's flag bits only when they differ from the flags word.
fn with_type_flags(mut mesh: MeshData, word: u32) -> MeshData {
    let bits = word & !MeshKind::TYPE_MASK;
    if bits != mesh.flags.bits() & !MeshKind::TYPE_MASK {
        mesh.type_flags = Some(MeshFlags::from_bits_retain(bits));
    }
    mesh
}

fn read_mesh_data(r: &mut TriBufferReader<'_>, layout: &Layout, index: usize) -> Result<MeshData> {
    r.check_guard(Checkpoint::MeshStart(index))?;

    let num_frames = r.read_i32()?;
    let num_mat_frames = r.read_i32()?;
    let parent_mesh = r.read_i32()?;
    let bounds = r.read_box()?;
    let center = r.read_vec3()?;
    let radius = r.read_f32()?;

    let num_verts = r.read_count("vertex")?;
    let verts = r.read_array32(num_verts, |r| r.read_vec3())?;
    let num_tverts = r.read_count("texture coordinate")?;
    let tverts = r.read_array32(num_tverts, |r| r.read_vec2())?;
    let normals = r.read_array32(num_verts, |r| r.read_vec3())?;
    let encoded_normals = if layout.encoded_normals {
        r.read_u8s(num_verts)?
    } else {
        Vec::new()
    };

    let num_primitives = r.read_count("primitive")?;
    let primitives = r.read_array32(num_primitives, |r| {
        let first = r.read_u16()?;
        let num = r.read_u16()?;
        let word = r.read_u32()?;
        unpack_primitive(first, num, word)
    })?;
    let num_indices = r.read_count("index")?;
    let indices = r.read_u16s(num_indices)?;
    let num_merge = r.read_count("merge index")?;
    let merge_indices = r.read_u16s(num_merge)?;
    let verts_per_frame = r.read_i32()?;
    let flags = MeshFlags::from_bits_retain(r.read_u32()?);

    r.check_guard(Checkpoint::MeshEnd(index))?;

    Ok(MeshData {
        num_frames,
        num_mat_frames,
        parent_mesh,
        bounds,
        center,
        radius,
        verts,
        tverts,
        normals,
        encoded_normals,
        primitives,
        indices,
        merge_indices,
        verts_per_frame,
        flags,
        type_flags: None,
    })
}

fn read_skin(
    r: &mut TriBufferReader<'_>,
    layout: &Layout,
    mesh: MeshData,
    index: usize,
) -> Result<SkinMesh> {
    // Copy of the vertex block. The primary arrays are authoritative.
    let dup = r.read_count("skin vertex")?;
    r.read_array32(dup, |r| r.read_vec3())?;
    r.read_array32(dup, |r| r.read_vec3())?;
    if layout.encoded_normals {
        r.read_u8s(dup)?;
    }

    let num_bones = r.read_count("bone")?;
    let matrices = r.read_array32(num_bones, |r| {
        let mut m = [0f32; 16];
        for v in &mut m {
            *v = r.read_f32()?;
        }
        // Row-major on disk
        Ok(Mat4::from_cols_array(&m).transpose())
    })?;

    let num_influences = r.read_count("influence")?;
    let vertex_indices = r.read_array32(num_influences, |r| r.read_i32())?;
    let bone_indices = r.read_array32(num_influences, |r| r.read_i32())?;
    let weights = r.read_array32(num_influences, |r| r.read_f32())?;

    let num_nodes = r.read_count("bone node")?;
    if num_nodes != num_bones {
        return Err(Error::invalid(format!(
            "skin mesh {index} has {num_bones} bind matrices but {num_nodes} bone nodes"
        )));
    }
    let node_indices = r.read_array32(num_nodes, |r| r.read_i32())?;

    r.check_guard(Checkpoint::SkinEnd(index))?;

    let bones = node_indices
        .into_iter()
        .zip(matrices)
        .map(|(node_index, inverse_bind)| SkinBone {
            node_index,
            inverse_bind,
        })
        .collect();
    let influences = vertex_indices
        .into_iter()
        .zip(bone_indices)
        .zip(weights)
        .map(|((vertex_index, bone_index), weight)| Influence {
            vertex_index,
            bone_index,
            weight,
        })
        .collect();

    Ok(SkinMesh {
        mesh,
        bones,
        influences,
    })
}

pub(crate) fn write_mesh(
    w: &mut TriBufferWriter,
    mesh: &Mesh,
    layout: &Layout,
    version: i16,
    index: usize,
) -> Result<()> {
    let kind = mesh.kind();
    let data = match mesh {
        Mesh::Null => {
            w.write_u32(kind.tag());
            return Ok(());
        }
        Mesh::Decal | Mesh::Sorted => return Err(Error::UnsupportedMesh(kind)),
        Mesh::Standard(_) | Mesh::Skin(_) if layout.vertex_channels => {
            return Err(Error::unsupported(
                version,
                "meshes with a second UV set and vertex colors",
            ))
        }
        Mesh::Standard(data) => data,
        Mesh::Skin(skin) => &skin.mesh,
    };

    let type_flags = data.type_flags.unwrap_or(data.flags);
    w.write_u32(kind.tag() | (type_flags.bits() & !MeshKind::TYPE_MASK));
    write_mesh_data(w, data, layout, index)?;
    if let Mesh::Skin(skin) = mesh {
        write_skin(w, skin, layout, index)?;
    }
    Ok(())
}

fn write_mesh_data(w: &mut TriBufferWriter, mesh: &MeshData, layout: &Layout, index: usize) -> Result<()> {
    w.write_guard(Checkpoint::MeshStart(index));

    w.write_i32(mesh.num_frames);
    w.write_i32(mesh.num_mat_frames);
    w.write_i32(mesh.parent_mesh);
    w.write_box(&mesh.bounds);
    w.write_vec3(mesh.center);
    w.write_f32(mesh.radius);

    w.write_count(mesh.verts.len())?;
    for v in &mesh.verts {
        w.write_vec3(*v);
    }
    w.write_count(mesh.tverts.len())?;
    for t in &mesh.tverts {
        w.write_vec2(*t);
    }
    for n in &mesh.normals {
        w.write_vec3(*n);
    }
    if layout.encoded_normals {
        w.write_u8s(&mesh.encoded_normals);
    }

    w.write_count(mesh.primitives.len())?;
    for p in &mesh.primitives {
        w.write_u16(p.first_element);
        w.write_u16(p.num_elements);
        w.write_u32(pack_primitive_type(p)?);
    }
    w.write_count(mesh.indices.len())?;
    w.write_u16s(&mesh.indices);
    w.write_count(mesh.merge_indices.len())?;
    w.write_u16s(&mesh.merge_indices);
    w.write_i32(mesh.verts_per_frame);
    w.write_u32(mesh.flags.bits());

    w.write_guard(Checkpoint::MeshEnd(index));
    Ok(())
}

fn write_skin(w: &mut TriBufferWriter, skin: &SkinMesh, layout: &Layout, index: usize) -> Result<()> {
    let mesh = &skin.mesh;
    w.write_count(mesh.verts.len())?;
    for v in &mesh.verts {
        w.write_vec3(*v);
    }
    for n in &mesh.normals {
        w.write_vec3(*n);
    }
    if layout.encoded_normals {
        w.write_u8s(&mesh.encoded_normals);
    }

    w.write_count(skin.bones.len())?;
    for bone in &skin.bones {
        for v in bone.inverse_bind.transpose().to_cols_array() {
            w.write_f32(v);
        }
    }

    w.write_count(skin.influences.len())?;
    for inf in &skin.influences {
        w.write_i32(inf.vertex_index);
    }
    for inf in &skin.influences {
        w.write_i32(inf.bone_index);
    }
    for inf in &skin.influences {
        w.write_f32(inf.weight);
    }

    w.write_count(skin.bones.len())?;
    for bone in &skin.bones {
        w.write_i32(bone.node_index);
    }

    w.write_guard(Checkpoint::SkinEnd(index));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Primitive;
    use glam::{Vec2, Vec3};

    fn layout(v: i32) -> Layout {
        Layout::for_version(v).unwrap_or_else(|| panic!("no layout for {v}"))
    }

    fn triangle() -> MeshData {
        let mut mesh = MeshData::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            vec![Vec3::Z; 3],
            vec![Primitive::triangles(0, 3, Some(0))],
            vec![0, 1, 2],
        );
        mesh.encoded_normals = vec![7, 8, 9];
        mesh.merge_indices = vec![2];
        mesh.flags = MeshFlags::USE_ENCODED_NORMALS;
        mesh
    }

    fn round_trip(mesh: &Mesh, version: i32) -> Result<(Mesh, [usize; 3])> {
        let layout = layout(version);
        let mut w = TriBufferWriter::new();
        write_mesh(&mut w, mesh, &layout, version as i16, 0)?;
        let lens = w.lens();
        let (header, payload) = w.finish()?;
        let mut r = TriBufferReader::new(&payload, &header)?;
        let decoded = read_mesh(&mut r, &layout, version as i16, 0)?;
        assert_eq!(r.remaining(), [0, 0, 0]);
        Ok((decoded, lens))
    }

    #[test]
    fn test_standard_mesh() -> Result<()> {
        let mesh = Mesh::Standard(triangle());
        let (decoded, lens) = round_trip(&mesh, 24)?;
        assert_eq!(decoded, mesh);
        // 3 indices + 1 merge index + 2 guards + primitive range
        assert_eq!(lens[1], 2 * (3 + 1 + 2 + 2));
        // 3 encoded normals + 2 guards
        assert_eq!(lens[2], 5);
        Ok(())
    }

    #[test]
    fn test_type_word_flags() -> Result<()> {
        let layout = layout(24);
        let mut data = triangle();
        let mut w = TriBufferWriter::new();
        write_mesh(&mut w, &Mesh::Standard(data.clone()), &layout, 24, 0)?;
        let (_, payload) = w.finish()?;
        assert_eq!(&payload[0..4], &MeshFlags::USE_ENCODED_NORMALS.bits().to_le_bytes());

        // A type word that disagrees with the flags word is kept as read
        data.type_flags = Some(MeshFlags::BILLBOARD);
        let mesh = Mesh::Standard(data);
        let mut w = TriBufferWriter::new();
        write_mesh(&mut w, &mesh, &layout, 24, 0)?;
        let (header, payload) = w.finish()?;
        assert_eq!(&payload[0..4], &MeshFlags::BILLBOARD.bits().to_le_bytes());

        let mut r = TriBufferReader::new(&payload, &header)?;
        let decoded = read_mesh(&mut r, &layout, 24, 0)?;
        assert_eq!(decoded, mesh);
        let mut w = TriBufferWriter::new();
        write_mesh(&mut w, &decoded, &layout, 24, 0)?;
        assert_eq!(w.finish()?.1, payload);
        Ok(())
    }

    #[test]
    fn test_encoded_normals_absent_before_22() -> Result<()> {
        let mut data = triangle();
        data.encoded_normals.clear();
        let mesh = Mesh::Standard(data);
        let (decoded, lens) = round_trip(&mesh, 21)?;
        assert_eq!(decoded, mesh);
        assert_eq!(lens[2], 2);
        Ok(())
    }

    #[test]
    fn test_skin_mesh() -> Result<()> {
        let bind = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let skin = SkinMesh {
            mesh: triangle(),
            bones: vec![SkinBone {
                node_index: 1,
                inverse_bind: bind,
            }],
            influences: (0..3)
                .map(|v| Influence {
                    vertex_index: v,
                    bone_index: 0,
                    weight: 1.0,
                })
                .collect(),
        };
        let mesh = Mesh::Skin(skin);

        let layout = layout(24);
        let mut w = TriBufferWriter::new();
        write_mesh(&mut w, &mesh, &layout, 24, 0)?;
        let (header, payload) = w.finish()?;

        // Translation sits in the last column; on disk rows come first, so
        // it lands at offsets 3, 7 and 11 of the matrix.
        let words: Vec<f32> = payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let rows = [1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0, 3.0];
        assert!(words.windows(12).any(|w| w == rows));

        let mut r = TriBufferReader::new(&payload, &header)?;
        let decoded = read_mesh(&mut r, &layout, 24, 0)?;
        assert_eq!(decoded, mesh);
        let checkpoints: Vec<_> = r.marks().iter().map(|m| m.checkpoint).collect();
        assert_eq!(
            checkpoints,
            vec![Checkpoint::MeshStart(0), Checkpoint::MeshEnd(0), Checkpoint::SkinEnd(0)]
        );
        Ok(())
    }

    #[test]
    fn test_null_mesh_is_one_word() -> Result<()> {
        let (decoded, lens) = round_trip(&Mesh::Null, 24)?;
        assert_eq!(decoded, Mesh::Null);
        assert_eq!(lens, [4, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_mesh_type_errors() -> Result<()> {
        let layout = layout(24);
        for (word, sorted) in [(3u32, true), (6u32, false)] {
            let mut w = TriBufferWriter::new();
            w.write_u32(word);
            let (header, payload) = w.finish()?;
            let mut r = TriBufferReader::new(&payload, &header)?;
            let err = read_mesh(&mut r, &layout, 24, 0).unwrap_err();
            if sorted {
                assert!(matches!(err, Error::UnsupportedMesh(MeshKind::Sorted)));
            } else {
                assert!(matches!(err, Error::InvalidTag { what: "mesh type", value: 6 }));
            }
        }

        let mut w = TriBufferWriter::new();
        assert!(matches!(
            write_mesh(&mut w, &Mesh::Decal, &layout, 24, 0),
            Err(Error::UnsupportedMesh(MeshKind::Decal))
        ));
        Ok(())
    }

    #[test]
    fn test_vertex_channels_unsupported() {
        let mut w = TriBufferWriter::new();
        let err = write_mesh(&mut w, &Mesh::Standard(triangle()), &layout(26), 26, 0).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { version: 26, .. }));
    }
}
