//! DTS decoding.

use glam::{Quat, Vec3};
use tracing::{debug, warn};

use super::material::read_materials;
use super::mesh::read_mesh;
use super::records::read_records;
use super::sequence::read_sequence;
use super::version::Layout;
use super::ShapeFile;
use crate::codec::{ByteReader, Quat16};
use crate::shape::{NameTable, Shape, Subshape};
use crate::tribuf::{Checkpoint, Region, TriBufferHeader, TriBufferReader};
use crate::util::{Error, Result};

/// Element counts from the head of the 32-bit region.
#[derive(Debug, Default)]
struct Counts {
    nodes: usize,
    objects: usize,
    decals: usize,
    subshapes: usize,
    ifl_materials: usize,
    rotations: usize,
    translations: usize,
    uniform_scales: usize,
    aligned_scales: usize,
    arbitrary_scales: usize,
    ground_frames: usize,
    object_states: usize,
    decal_states: usize,
    triggers: usize,
    detail_levels: usize,
    meshes: usize,
    names: usize,
}

fn read_counts(r: &mut TriBufferReader<'_>, layout: &Layout, version: i16) -> Result<Counts> {
    let mut c = Counts {
        nodes: r.read_count("node")?,
        objects: r.read_count("object")?,
        decals: r.read_count("decal")?,
        subshapes: r.read_count("subshape")?,
        ifl_materials: r.read_count("IFL material")?,
        ..Counts::default()
    };

    if layout.split_node_counts {
        c.rotations = r.read_count("node rotation")?;
        c.translations = r.read_count("node translation")?;
        c.uniform_scales = r.read_count("uniform scale")?;
        c.aligned_scales = r.read_count("aligned scale")?;
        c.arbitrary_scales = r.read_count("arbitrary scale")?;
    } else {
        // One count covering the rest pose and the keyframes
        let combined = r.read_count("node keyframe")?;
        c.rotations = combined.checked_sub(c.nodes).ok_or_else(|| {
            Error::invalid(format!(
                "combined keyframe count {combined} is smaller than the node count {}",
                c.nodes
            ))
        })?;
        c.translations = c.rotations;
    }
    if layout.ground_frames {
        c.ground_frames = r.read_count("ground frame")?;
    }

    c.object_states = r.read_count("object state")?;
    c.decal_states = r.read_count("decal state")?;
    c.triggers = r.read_count("trigger")?;
    c.detail_levels = r.read_count("detail level")?;
    c.meshes = r.read_count("mesh")?;

    if layout.legacy_skin_count {
        let skins = r.read_count("skin")?;
        if skins != 0 {
            return Err(Error::unsupported(
                version,
                format!("{skins} skins stored outside the mesh list"),
            ));
        }
    }
    c.names = r.read_count("name")?;
    Ok(c)
}

fn read_quats(r: &mut TriBufferReader<'_>, count: usize) -> Result<Vec<Quat>> {
    Ok(r.read_quats(count)?.into_iter().map(Quat16::decode).collect())
}

fn read_vec3s(r: &mut TriBufferReader<'_>, count: usize) -> Result<Vec<Vec3>> {
    r.read_array32(count, |r| r.read_vec3())
}

fn read_column(r: &mut TriBufferReader<'_>, count: usize) -> Result<Vec<i32>> {
    r.read_array32(count, |r| r.read_i32())
}

/// Decode a complete DTS file, keeping the header fields and guard trace.
#[tracing::instrument(skip_all, fields(len = bytes.len()))]
pub(crate) fn read_shape(bytes: &[u8]) -> Result<ShapeFile> {
    let mut head = ByteReader::new(bytes, Region::Header);
    let version = head.read_i16()?;
    let exporter_version = head.read_i16()?;
    let layout = Layout::dts_read(version)?;
    let header = TriBufferHeader::read(&mut head)?;
    let payload = head.take(header.payload_len())?;

    debug!(
        version,
        exporter_version,
        words = header.total_words,
        num16 = header.num16(),
        num8 = header.num8(),
        "decoding shape"
    );

    let mut r = TriBufferReader::new(payload, &header)?;
    let c = read_counts(&mut r, &layout, version)?;

    let mut shape = Shape {
        smallest_visible_size: r.read_f32()?,
        smallest_visible_detail_level: r.read_i32()?,
        ..Shape::default()
    };
    r.check_guard(Checkpoint::Header)?;

    shape.radius = r.read_f32()?;
    shape.tube_radius = r.read_f32()?;
    shape.center = r.read_vec3()?;
    shape.bounds = r.read_box()?;
    r.check_guard(Checkpoint::Bounds)?;

    shape.nodes = read_records(&mut r, c.nodes)?;
    r.check_guard(Checkpoint::Nodes)?;
    shape.objects = read_records(&mut r, c.objects)?;
    r.check_guard(Checkpoint::Objects)?;
    shape.decals = read_records(&mut r, c.decals)?;
    r.check_guard(Checkpoint::Decals)?;
    shape.ifl_materials = read_records(&mut r, c.ifl_materials)?;
    r.check_guard(Checkpoint::IflMaterials)?;

    // Subshapes are stored column by column
    let first_node = read_column(&mut r, c.subshapes)?;
    let first_object = read_column(&mut r, c.subshapes)?;
    let first_decal = read_column(&mut r, c.subshapes)?;
    r.check_guard(Checkpoint::SubshapeFirsts)?;
    let num_nodes = read_column(&mut r, c.subshapes)?;
    let num_objects = read_column(&mut r, c.subshapes)?;
    let num_decals = read_column(&mut r, c.subshapes)?;
    r.check_guard(Checkpoint::SubshapeCounts)?;
    shape.subshapes = (0..c.subshapes)
        .map(|i| Subshape {
            first_node: first_node[i],
            first_object: first_object[i],
            first_decal: first_decal[i],
            num_nodes: num_nodes[i],
            num_objects: num_objects[i],
            num_decals: num_decals[i],
        })
        .collect();

    let defaults = r.read_array32(c.nodes, |r| {
        let rotation = r.read_quat16()?.decode();
        Ok((rotation, r.read_vec3()?))
    })?;
    let (rotations, translations): (Vec<_>, Vec<_>) = defaults.into_iter().unzip();
    shape.default_rotations = rotations;
    shape.default_translations = translations;
    shape.node_translations = read_vec3s(&mut r, c.translations)?;
    shape.node_rotations = read_quats(&mut r, c.rotations)?;
    r.check_guard(Checkpoint::NodeTransforms)?;

    if layout.node_scales {
        shape.node_uniform_scales = r.read_array32(c.uniform_scales, |r| r.read_f32())?;
        shape.node_aligned_scales = read_vec3s(&mut r, c.aligned_scales)?;
        shape.node_arbitrary_scale_factors = read_vec3s(&mut r, c.arbitrary_scales)?;
        shape.node_arbitrary_scale_rotations = read_quats(&mut r, c.arbitrary_scales)?;
        r.check_guard(Checkpoint::NodeScales)?;
    }

    if layout.ground_frames {
        shape.ground_translations = read_vec3s(&mut r, c.ground_frames)?;
        shape.ground_rotations = read_quats(&mut r, c.ground_frames)?;
        r.check_guard(Checkpoint::GroundTransforms)?;
    }

    shape.object_states = read_records(&mut r, c.object_states)?;
    r.check_guard(Checkpoint::ObjectStates)?;
    shape.decal_states = read_column(&mut r, c.decal_states)?;
    r.check_guard(Checkpoint::DecalStates)?;
    shape.triggers = read_records(&mut r, c.triggers)?;
    r.check_guard(Checkpoint::Triggers)?;
    shape.detail_levels = read_records(&mut r, c.detail_levels)?;
    r.check_guard(Checkpoint::DetailLevels)?;

    if layout.packed_vertex_header {
        return Err(Error::unsupported(version, "packed vertex buffer layout"));
    }
    shape.meshes = (0..c.meshes)
        .map(|i| read_mesh(&mut r, &layout, version, i))
        .collect::<Result<_>>()?;
    r.check_guard(Checkpoint::Meshes)?;

    let names = (0..c.names)
        .map(|_| r.read_cstring())
        .collect::<Result<Vec<_>>>()?;
    shape.names = NameTable::from_names(names);
    r.check_guard(Checkpoint::Names)?;

    if layout.detail_alpha {
        for detail in &mut shape.detail_levels {
            detail.alpha_in = r.read_f32()?;
        }
        for detail in &mut shape.detail_levels {
            detail.alpha_out = r.read_f32()?;
        }
    }

    if r.remaining()[0] >= 4 {
        let legacy = r.read_i32()?;
        if legacy != 0 {
            warn!(value = legacy, "non-zero legacy word at the end of the 32-bit region");
        }
    }

    let mut tail = ByteReader::new(head.rest(), Region::Plain);
    let num_sequences = tail.read_count("sequence")?;
    shape.sequences = (0..num_sequences)
        .map(|_| read_sequence(&mut tail, &layout, true))
        .collect::<Result<_>>()?;
    shape.materials = read_materials(&mut tail, &layout)?;
    if tail.remaining() > 0 {
        warn!(bytes = tail.remaining(), "ignoring data after the material list");
    }

    // Derived links are rebuilt rather than trusted
    shape.compute_links();

    debug!(
        nodes = shape.nodes.len(),
        objects = shape.objects.len(),
        meshes = shape.meshes.len(),
        sequences = shape.sequences.len(),
        materials = shape.materials.len(),
        "decoded shape"
    );

    Ok(ShapeFile {
        version,
        exporter_version,
        shape,
        guards: r.into_marks(),
    })
}
