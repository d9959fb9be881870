//! Mesh variants.

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3};

use crate::util::{bounding_radius, BBox3f};

/// Mesh type tag stored in the low three bits of the mesh type word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MeshKind {
    Standard = 0,
    Skin = 1,
    Decal = 2,
    Sorted = 3,
    Null = 4,
}

impl MeshKind {
    /// Mask selecting the kind from a type word.
    pub const TYPE_MASK: u32 = 7;

    /// Kind for a type tag (already masked). Tags 5..=7 are unassigned.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Standard),
            1 => Some(Self::Skin),
            2 => Some(Self::Decal),
            3 => Some(Self::Sorted),
            4 => Some(Self::Null),
            _ => None,
        }
    }

    #[inline]
    pub fn tag(self) -> u32 {
        self as u32
    }
}

bitflags! {
    /// Mesh flag word, stored after the index lists.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MeshFlags: u32 {
        const BILLBOARD = 1 << 31;
        const HAS_DETAIL_TEXTURE = 1 << 30;
        const BILLBOARD_Z_AXIS = 1 << 29;
        const USE_ENCODED_NORMALS = 1 << 28;
        const HAS_COLOR = 1 << 27;
        const HAS_TVERT2 = 1 << 26;
    }
}

/// Draw topology of a primitive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Topology {
    #[default]
    Triangles,
    Strip,
    Fan,
}

/// A run of indices drawn with one material.
///
/// On disk the topology, the indexed flag and the material slot share a
/// single 32-bit word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Primitive {
    pub first_element: u16,
    pub num_elements: u16,
    pub topology: Topology,
    pub indexed: bool,
    /// Material list slot, `None` for untextured geometry.
    pub material: Option<u32>,
    /// Slot bits left in the type word of untextured primitives.
    pub unused_material_bits: u32,
}

impl Primitive {
    /// Indexed triangle list.
    pub fn triangles(first_element: u16, num_elements: u16, material: Option<u32>) -> Self {
        Self {
            first_element,
            num_elements,
            topology: Topology::Triangles,
            indexed: true,
            material,
            unused_material_bits: 0,
        }
    }

    /// Index range covered by this primitive.
    pub fn elements(&self) -> std::ops::Range<usize> {
        let first = self.first_element as usize;
        first..first + self.num_elements as usize
    }
}

/// Geometry shared by standard and skinned meshes.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub num_frames: i32,
    pub num_mat_frames: i32,
    /// Mesh sharing this mesh's vertex data, or `-1`.
    pub parent_mesh: i32,
    pub bounds: BBox3f,
    pub center: Vec3,
    pub radius: f32,
    pub verts: Vec<Vec3>,
    pub tverts: Vec<Vec2>,
    /// One normal per vertex.
    pub normals: Vec<Vec3>,
    /// One byte per vertex (index into the engine's normal table). Stored from version 22.
    pub encoded_normals: Vec<u8>,
    pub primitives: Vec<Primitive>,
    pub indices: Vec<u16>,
    /// Deprecated merge indices.
    pub merge_indices: Vec<u16>,
    pub verts_per_frame: i32,
    pub flags: MeshFlags,
    /// Flag bits of the mesh type word when they disagree with `flags`.
    pub type_flags: Option<MeshFlags>,
}

impl Default for MeshData {
    fn default() -> Self {
        Self {
            num_frames: 1,
            num_mat_frames: 1,
            parent_mesh: -1,
            bounds: BBox3f::default(),
            center: Vec3::ZERO,
            radius: 0.0,
            verts: Vec::new(),
            tverts: Vec::new(),
            normals: Vec::new(),
            encoded_normals: Vec::new(),
            primitives: Vec::new(),
            indices: Vec::new(),
            merge_indices: Vec::new(),
            verts_per_frame: 0,
            flags: MeshFlags::empty(),
            type_flags: None,
        }
    }
}

impl MeshData {
    /// Single-frame mesh with bounds computed from `verts`.
    ///
    /// Encoded normals are zero-filled, one per vertex.
    pub fn new(
        verts: Vec<Vec3>,
        tverts: Vec<Vec2>,
        normals: Vec<Vec3>,
        primitives: Vec<Primitive>,
        indices: Vec<u16>,
    ) -> Self {
        let mut mesh = Self {
            verts_per_frame: verts.len() as i32,
            encoded_normals: vec![0; verts.len()],
            verts,
            tverts,
            normals,
            primitives,
            indices,
            ..Self::default()
        };
        mesh.compute_bounds();
        mesh
    }

    /// Recompute `bounds`, `center` and `radius` from the vertices.
    pub fn compute_bounds(&mut self) {
        if self.verts.is_empty() {
            self.bounds = BBox3f::default();
            self.center = Vec3::ZERO;
            self.radius = 0.0;
            return;
        }
        self.bounds = BBox3f::from_points(&self.verts);
        self.center = self.bounds.center();
        self.radius = bounding_radius(&self.verts, self.center);
    }

    /// Number of triangles drawn, counting strips and fans by their expansion.
    pub fn triangle_count(&self) -> usize {
        self.primitives
            .iter()
            .map(|p| match p.topology {
                Topology::Triangles => p.num_elements as usize / 3,
                Topology::Strip | Topology::Fan => (p.num_elements as usize).saturating_sub(2),
            })
            .sum()
    }
}

/// A bone of a skinned mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkinBone {
    pub node_index: i32,
    /// Object space to bone space at bind time.
    pub inverse_bind: Mat4,
}

/// One vertex-bone weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Influence {
    pub vertex_index: i32,
    pub bone_index: i32,
    pub weight: f32,
}

/// Mesh deformed by node transforms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinMesh {
    pub mesh: MeshData,
    pub bones: Vec<SkinBone>,
    pub influences: Vec<Influence>,
}

/// A mesh slot of the shape.
///
/// `Null` is a real mesh kind: it fills a detail slot where an object has no
/// geometry and stores nothing beyond its type tag.
#[derive(Clone, Debug, PartialEq)]
pub enum Mesh {
    Standard(MeshData),
    Skin(SkinMesh),
    /// Deprecated. Recognized but carries no codec.
    Decal,
    /// Recognized but carries no codec.
    Sorted,
    Null,
}

impl Mesh {
    pub fn kind(&self) -> MeshKind {
        match self {
            Mesh::Standard(_) => MeshKind::Standard,
            Mesh::Skin(_) => MeshKind::Skin,
            Mesh::Decal => MeshKind::Decal,
            Mesh::Sorted => MeshKind::Sorted,
            Mesh::Null => MeshKind::Null,
        }
    }

    /// Geometry of a standard or skinned mesh.
    pub fn data(&self) -> Option<&MeshData> {
        match self {
            Mesh::Standard(data) => Some(data),
            Mesh::Skin(skin) => Some(&skin.mesh),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut MeshData> {
        match self {
            Mesh::Standard(data) => Some(data),
            Mesh::Skin(skin) => Some(&mut skin.mesh),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Mesh::Null)
    }
}
