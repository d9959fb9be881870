//! DTS encoding.

use tracing::debug;

use super::material::write_materials;
use super::mesh::write_mesh;
use super::records::write_records;
use super::sequence::write_sequence;
use super::version::Layout;
use super::WriteOptions;
use crate::codec::{ByteWriter, Quat16};
use crate::shape::{Mesh, Shape};
use crate::tribuf::{Checkpoint, TriBufferWriter};
use crate::util::{Error, Result};

/// Reject shape content the target layout has no place for.
fn check_layout_fits(shape: &Shape, layout: &Layout, version: i16) -> Result<()> {
    if !layout.split_node_counts && shape.node_translations.len() != shape.node_rotations.len() {
        return Err(Error::invariant(format!(
            "version {version} stores one keyframe count: {} translations vs {} rotations",
            shape.node_translations.len(),
            shape.node_rotations.len()
        )));
    }
    if !layout.node_scales
        && !(shape.node_uniform_scales.is_empty()
            && shape.node_aligned_scales.is_empty()
            && shape.node_arbitrary_scale_factors.is_empty())
    {
        return Err(Error::invariant(format!(
            "version {version} has no node scale arrays"
        )));
    }
    if !layout.ground_frames && !shape.ground_translations.is_empty() {
        return Err(Error::invariant(format!(
            "version {version} has no ground transforms"
        )));
    }
    if !layout.detail_alpha
        && shape
            .detail_levels
            .iter()
            .any(|d| d.alpha_in != 0.0 || d.alpha_out != 0.0)
    {
        return Err(Error::invariant(format!(
            "version {version} has no detail level alpha"
        )));
    }

    for (i, mesh) in shape.meshes.iter().enumerate() {
        if layout.legacy_skin_count && matches!(mesh, Mesh::Skin(_)) {
            return Err(Error::unsupported(
                version,
                format!("mesh {i}: skins in the mesh list"),
            ));
        }
        let Some(data) = mesh.data() else { continue };
        let expected = if layout.encoded_normals { data.verts.len() } else { 0 };
        if data.encoded_normals.len() != expected {
            return Err(Error::invariant(format!(
                "mesh {i} has {} encoded normals, version {version} stores {expected}",
                data.encoded_normals.len()
            )));
        }
    }
    Ok(())
}

/// Encode `shape` as a complete DTS file.
#[tracing::instrument(skip_all, fields(version = options.version))]
pub(crate) fn write_shape(shape: &Shape, options: &WriteOptions) -> Result<Vec<u8>> {
    let version = options.version;
    let layout = Layout::dts_write(version)?;
    shape.validate()?;
    check_layout_fits(shape, &layout, version)?;

    let (nodes, objects) = shape.linked_records();
    let mut w = TriBufferWriter::new();

    w.write_count(nodes.len())?;
    w.write_count(objects.len())?;
    w.write_count(shape.decals.len())?;
    w.write_count(shape.subshapes.len())?;
    w.write_count(shape.ifl_materials.len())?;
    if layout.split_node_counts {
        w.write_count(shape.node_rotations.len())?;
        w.write_count(shape.node_translations.len())?;
        w.write_count(shape.node_uniform_scales.len())?;
        w.write_count(shape.node_aligned_scales.len())?;
        w.write_count(shape.node_arbitrary_scale_factors.len())?;
    } else {
        w.write_count(shape.node_rotations.len() + nodes.len())?;
    }
    if layout.ground_frames {
        w.write_count(shape.ground_translations.len())?;
    }
    w.write_count(shape.object_states.len())?;
    w.write_count(shape.decal_states.len())?;
    w.write_count(shape.triggers.len())?;
    w.write_count(shape.detail_levels.len())?;
    w.write_count(shape.meshes.len())?;
    if layout.legacy_skin_count {
        w.write_i32(0);
    }
    w.write_count(shape.names.len())?;
    w.write_f32(shape.smallest_visible_size);
    w.write_i32(shape.smallest_visible_detail_level);
    w.write_guard(Checkpoint::Header);

    w.write_f32(shape.radius);
    w.write_f32(shape.tube_radius);
    w.write_vec3(shape.center);
    w.write_box(&shape.bounds);
    w.write_guard(Checkpoint::Bounds);

    write_records(&mut w, &nodes);
    w.write_guard(Checkpoint::Nodes);
    write_records(&mut w, &objects);
    w.write_guard(Checkpoint::Objects);
    write_records(&mut w, &shape.decals);
    w.write_guard(Checkpoint::Decals);
    write_records(&mut w, &shape.ifl_materials);
    w.write_guard(Checkpoint::IflMaterials);

    for s in &shape.subshapes {
        w.write_i32(s.first_node);
    }
    for s in &shape.subshapes {
        w.write_i32(s.first_object);
    }
    for s in &shape.subshapes {
        w.write_i32(s.first_decal);
    }
    w.write_guard(Checkpoint::SubshapeFirsts);
    for s in &shape.subshapes {
        w.write_i32(s.num_nodes);
    }
    for s in &shape.subshapes {
        w.write_i32(s.num_objects);
    }
    for s in &shape.subshapes {
        w.write_i32(s.num_decals);
    }
    w.write_guard(Checkpoint::SubshapeCounts);

    for (rotation, translation) in shape
        .default_rotations
        .iter()
        .zip(&shape.default_translations)
    {
        w.write_quat16(Quat16::encode(*rotation));
        w.write_vec3(*translation);
    }
    for t in &shape.node_translations {
        w.write_vec3(*t);
    }
    for q in &shape.node_rotations {
        w.write_quat16(Quat16::encode(*q));
    }
    w.write_guard(Checkpoint::NodeTransforms);

    if layout.node_scales {
        for s in &shape.node_uniform_scales {
            w.write_f32(*s);
        }
        for s in &shape.node_aligned_scales {
            w.write_vec3(*s);
        }
        for s in &shape.node_arbitrary_scale_factors {
            w.write_vec3(*s);
        }
        for q in &shape.node_arbitrary_scale_rotations {
            w.write_quat16(Quat16::encode(*q));
        }
        w.write_guard(Checkpoint::NodeScales);
    }

    if layout.ground_frames {
        for t in &shape.ground_translations {
            w.write_vec3(*t);
        }
        for q in &shape.ground_rotations {
            w.write_quat16(Quat16::encode(*q));
        }
        w.write_guard(Checkpoint::GroundTransforms);
    }

    write_records(&mut w, &shape.object_states);
    w.write_guard(Checkpoint::ObjectStates);
    for state in &shape.decal_states {
        w.write_i32(*state);
    }
    w.write_guard(Checkpoint::DecalStates);
    write_records(&mut w, &shape.triggers);
    w.write_guard(Checkpoint::Triggers);
    write_records(&mut w, &shape.detail_levels);
    w.write_guard(Checkpoint::DetailLevels);

    for (i, mesh) in shape.meshes.iter().enumerate() {
        write_mesh(&mut w, mesh, &layout, version, i)?;
    }
    w.write_guard(Checkpoint::Meshes);

    for name in shape.names.iter() {
        w.write_cstring(name)?;
    }
    w.write_guard(Checkpoint::Names);

    if layout.detail_alpha {
        for detail in &shape.detail_levels {
            w.write_f32(detail.alpha_in);
        }
        for detail in &shape.detail_levels {
            w.write_f32(detail.alpha_out);
        }
    }
    // Legacy placeholder
    w.write_i32(0);

    let guards = w.marks().len();
    let (header, payload) = w.finish()?;

    let mut out = ByteWriter::new();
    out.write_i16(version)?;
    out.write_i16(options.exporter_version)?;
    header.write(&mut out)?;
    out.write_bytes(&payload)?;

    out.write_count(shape.sequences.len())?;
    for seq in &shape.sequences {
        write_sequence(&mut out, seq, &layout, true)?;
    }
    write_materials(&mut out, &shape.materials, &layout)?;

    debug!(
        words = header.total_words,
        guards,
        bytes = out.len(),
        "encoded shape"
    );
    Ok(out.into_inner())
}
