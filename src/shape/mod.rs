//! In-memory shape model.
//!
//! A [`Shape`] is a set of flat arrays cross-referenced by `i32` indices, the
//! same way the engine stores it. Nothing here knows about file versions; the
//! codecs in [`crate::dts`] and [`crate::dsq`] map it to and from bytes.
//!
//! - [`Node`], [`Object`], [`Subshape`], [`DetailLevel`] - scene structure
//! - [`Mesh`] - geometry per object and detail level
//! - [`Sequence`] - animation descriptors indexing the flat keyframe arrays
//! - [`NameTable`] - names shared by all of the above

mod material;
mod mesh;
mod names;
mod node;
mod sequence;

pub use material::*;
pub use mesh::*;
pub use names::*;
pub use node::*;
pub use sequence::*;

use glam::{Mat4, Quat, Vec3};

use crate::util::{BBox3f, Error, Result};

/// A complete DTS shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    pub nodes: Vec<Node>,
    pub objects: Vec<Object>,
    pub decals: Vec<Decal>,
    pub subshapes: Vec<Subshape>,
    pub ifl_materials: Vec<IflMaterial>,

    /// Rest pose, one per node.
    pub default_rotations: Vec<Quat>,
    pub default_translations: Vec<Vec3>,

    // Keyframes, addressed through `Sequence` bases and matters sets
    pub node_rotations: Vec<Quat>,
    pub node_translations: Vec<Vec3>,
    pub node_uniform_scales: Vec<f32>,
    pub node_aligned_scales: Vec<Vec3>,
    pub node_arbitrary_scale_factors: Vec<Vec3>,
    pub node_arbitrary_scale_rotations: Vec<Quat>,
    pub ground_translations: Vec<Vec3>,
    pub ground_rotations: Vec<Quat>,

    /// One per object, positionally matched.
    pub object_states: Vec<ObjectState>,
    /// Deprecated.
    pub decal_states: Vec<i32>,
    pub triggers: Vec<Trigger>,
    pub detail_levels: Vec<DetailLevel>,
    pub meshes: Vec<Mesh>,
    pub names: NameTable,
    pub sequences: Vec<Sequence>,
    pub materials: Vec<Material>,

    pub radius: f32,
    pub tube_radius: f32,
    pub center: Vec3,
    pub bounds: BBox3f,
    pub smallest_visible_size: f32,
    pub smallest_visible_detail_level: i32,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for a stored name index.
    pub fn name(&self, index: i32) -> Option<&str> {
        self.names.resolve_index(index)
    }

    /// Append a node with an identity rest pose. Returns its index.
    pub fn add_node(&mut self, name: &str, parent: Option<usize>) -> usize {
        let name_index = self.names.intern(name) as i32;
        let parent_index = parent.map_or(-1, |p| p as i32);
        self.nodes.push(Node::new(name_index, parent_index));
        self.default_rotations.push(Quat::IDENTITY);
        self.default_translations.push(Vec3::ZERO);
        self.compute_links();
        self.nodes.len() - 1
    }

    /// Append an object on `node` owning `meshes` (one per detail level) and
    /// its default state. Returns the object index.
    pub fn add_object(&mut self, name: &str, node: usize, meshes: Vec<Mesh>) -> usize {
        let name_index = self.names.intern(name) as i32;
        let first_mesh = self.meshes.len() as i32;
        let num_meshes = meshes.len() as i32;
        self.meshes.extend(meshes);
        self.objects
            .push(Object::new(name_index, node as i32, first_mesh, num_meshes));
        self.object_states.push(ObjectState::default());
        self.compute_links();
        self.objects.len() - 1
    }

    /// Append a detail level. Returns its index.
    pub fn add_detail_level(&mut self, name: &str, subshape: i32, object_detail: i32, size: f32) -> usize {
        let name_index = self.names.intern(name) as i32;
        self.detail_levels
            .push(DetailLevel::new(name_index, subshape, object_detail, size));
        self.detail_levels.len() - 1
    }

    /// Index of the node called `name`, ignoring case.
    pub fn find_node(&self, name: &str) -> Option<usize> {
        let index = self.names.lookup(name)? as i32;
        self.nodes.iter().position(|n| n.name_index == index)
    }

    /// Index of the sequence called `name`, ignoring case.
    pub fn find_sequence(&self, name: &str) -> Option<usize> {
        let index = self.names.lookup(name)? as i32;
        self.sequences.iter().position(|s| s.name_index == index)
    }

    /// Parent chain of `node`, nearest first, not including `node` itself.
    ///
    /// A parent index out of range or a cycle in the chain is a corrupt shape.
    pub fn ancestors(&self, node: usize) -> Result<Vec<usize>> {
        let mut chain = Vec::new();
        let mut current = self
            .nodes
            .get(node)
            .ok_or_else(|| Error::invalid(format!("node {node} out of range")))?;
        while let Some(parent) = current.parent() {
            if parent == node || chain.contains(&parent) {
                return Err(Error::invalid(format!(
                    "node hierarchy has a cycle through node {parent}"
                )));
            }
            current = self.nodes.get(parent).ok_or_else(|| {
                Error::invalid(format!("node parent {parent} out of range"))
            })?;
            chain.push(parent);
        }
        Ok(chain)
    }

    /// Rest-pose transform of `node` relative to the shape root.
    pub fn world_matrix(&self, node: usize) -> Result<Mat4> {
        let mut world = self.local_matrix(node)?;
        for parent in self.ancestors(node)? {
            world = self.local_matrix(parent)? * world;
        }
        Ok(world)
    }

    fn local_matrix(&self, node: usize) -> Result<Mat4> {
        match (self.default_rotations.get(node), self.default_translations.get(node)) {
            (Some(r), Some(t)) => Ok(Mat4::from_rotation_translation(*r, *t)),
            _ => Err(Error::invariant(format!("node {node} has no default transform"))),
        }
    }

    /// Rebuild the derived child/sibling links of nodes and objects.
    ///
    /// Children and objects are chained in index order.
    pub fn compute_links(&mut self) {
        let (nodes, objects) = self.linked_records();
        self.nodes = nodes;
        self.objects = objects;
    }

    /// Copies of the node and object records with derived links filled in.
    pub fn linked_records(&self) -> (Vec<Node>, Vec<Object>) {
        let mut nodes = self.nodes.clone();
        let mut objects = self.objects.clone();
        for node in &mut nodes {
            node.first_object = -1;
            node.first_child = -1;
            node.next_sibling = -1;
        }
        for obj in &mut objects {
            obj.next_sibling = -1;
        }

        // Last child / last object seen per node
        let mut last_child = vec![-1i32; nodes.len()];
        for i in 0..nodes.len() {
            let Some(parent) = nodes[i].parent().filter(|p| *p < nodes.len()) else {
                continue;
            };
            match last_child[parent] {
                -1 => nodes[parent].first_child = i as i32,
                prev => nodes[prev as usize].next_sibling = i as i32,
            }
            last_child[parent] = i as i32;
        }

        let mut last_object = vec![-1i32; nodes.len()];
        for i in 0..objects.len() {
            let Some(node) = usize::try_from(objects[i].node_index)
                .ok()
                .filter(|n| *n < nodes.len())
            else {
                continue;
            };
            match last_object[node] {
                -1 => nodes[node].first_object = i as i32,
                prev => objects[prev as usize].next_sibling = i as i32,
            }
            last_object[node] = i as i32;
        }
        (nodes, objects)
    }

    /// Rotation of `node` at `frame` of sequence `seq`, if the sequence animates it.
    pub fn node_rotation(&self, seq: usize, node: usize, frame: usize) -> Option<Quat> {
        let index = self.sequences.get(seq)?.key_index(Channel::Rotation, node, frame)?;
        self.node_rotations.get(index).copied()
    }

    /// Translation of `node` at `frame` of sequence `seq`, if the sequence animates it.
    pub fn node_translation(&self, seq: usize, node: usize, frame: usize) -> Option<Vec3> {
        let index = self
            .sequences
            .get(seq)?
            .key_index(Channel::Translation, node, frame)?;
        self.node_translations.get(index).copied()
    }

    /// State of `object` at `frame` of sequence `seq`, if the sequence animates it.
    pub fn object_state(&self, seq: usize, object: usize, frame: usize) -> Option<ObjectState> {
        let index = self
            .sequences
            .get(seq)?
            .key_index(Channel::ObjectState, object, frame)?;
        self.object_states.get(index).copied()
    }

    /// Check the structural invariants a shape must satisfy to be written.
    pub fn validate(&self) -> Result<()> {
        if self.detail_levels.is_empty() {
            return Err(Error::invariant("shape has no detail levels"));
        }
        if self.subshapes.is_empty() {
            return Err(Error::invariant("shape has no subshapes"));
        }
        check_len("default rotations", self.default_rotations.len(), self.nodes.len())?;
        check_len("default translations", self.default_translations.len(), self.nodes.len())?;
        check_len("object states", self.object_states.len(), self.objects.len())?;
        check_len(
            "arbitrary scale rotations",
            self.node_arbitrary_scale_rotations.len(),
            self.node_arbitrary_scale_factors.len(),
        )?;
        check_len(
            "ground rotations",
            self.ground_rotations.len(),
            self.ground_translations.len(),
        )?;

        self.validate_names()?;
        self.validate_hierarchy()?;
        self.validate_meshes()?;
        self.validate_sequences()
    }

    fn validate_names(&self) -> Result<()> {
        let names = self.names.len();
        let check = |what: &str, i: usize, index: i32| {
            if usize::try_from(index).is_ok_and(|n| n < names) {
                Ok(())
            } else {
                Err(Error::invariant(format!(
                    "{what} {i} has name index {index}, table has {names} names"
                )))
            }
        };
        for (i, n) in self.nodes.iter().enumerate() {
            check("node", i, n.name_index)?;
        }
        for (i, o) in self.objects.iter().enumerate() {
            check("object", i, o.name_index)?;
        }
        for (i, d) in self.detail_levels.iter().enumerate() {
            check("detail level", i, d.name_index)?;
        }
        for (i, m) in self.ifl_materials.iter().enumerate() {
            check("ifl material", i, m.name_index)?;
        }
        for (i, s) in self.sequences.iter().enumerate() {
            check("sequence", i, s.name_index)?;
        }
        Ok(())
    }

    fn validate_hierarchy(&self) -> Result<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            if node.parent_index < -1 {
                return Err(Error::invariant(format!(
                    "node {i} has parent index {}",
                    node.parent_index
                )));
            }
            self.ancestors(i)
                .map_err(|e| Error::invariant(e.to_string()))?;
        }
        for (i, obj) in self.objects.iter().enumerate() {
            if obj.node_index < -1 || obj.node_index >= self.nodes.len() as i32 {
                return Err(Error::invariant(format!(
                    "object {i} attached to missing node {}",
                    obj.node_index
                )));
            }
            if obj.first_mesh < 0 || obj.num_meshes < 0 || obj.mesh_range().end > self.meshes.len() {
                return Err(Error::invariant(format!(
                    "object {i} mesh range {:?} exceeds {} meshes",
                    obj.mesh_range(),
                    self.meshes.len()
                )));
            }
        }
        for (i, sub) in self.subshapes.iter().enumerate() {
            let in_range = |first: i32, num: i32, len: usize| {
                first >= 0 && num >= 0 && i64::from(first) + i64::from(num) <= len as i64
            };
            if !in_range(sub.first_node, sub.num_nodes, self.nodes.len())
                || !in_range(sub.first_object, sub.num_objects, self.objects.len())
            {
                return Err(Error::invariant(format!("subshape {i} range out of bounds")));
            }
        }
        for (i, detail) in self.detail_levels.iter().enumerate() {
            if detail.subshape >= self.subshapes.len() as i32 {
                return Err(Error::invariant(format!(
                    "detail level {i} references subshape {}",
                    detail.subshape
                )));
            }
        }
        Ok(())
    }

    fn validate_meshes(&self) -> Result<()> {
        for (i, mesh) in self.meshes.iter().enumerate() {
            let Some(data) = mesh.data() else { continue };
            if data.normals.len() != data.verts.len() {
                return Err(Error::invariant(format!(
                    "mesh {i} has {} normals for {} vertices",
                    data.normals.len(),
                    data.verts.len()
                )));
            }
            if let Some(p) = data.primitives.iter().find(|p| p.elements().end > data.indices.len()) {
                return Err(Error::invariant(format!(
                    "mesh {i} primitive {:?} exceeds {} indices",
                    p.elements(),
                    data.indices.len()
                )));
            }
            if let Mesh::Skin(skin) = mesh {
                if let Some(bone) = skin
                    .bones
                    .iter()
                    .find(|b| b.node_index < 0 || b.node_index >= self.nodes.len() as i32)
                {
                    return Err(Error::invariant(format!(
                        "skin mesh {i} bone references node {}",
                        bone.node_index
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_sequences(&self) -> Result<()> {
        for (i, seq) in self.sequences.iter().enumerate() {
            let what = |set: &str| format!("sequence {i} {set}");
            seq.rotation_matters.check_bound(self.nodes.len(), &what("rotation"))?;
            seq.translation_matters.check_bound(self.nodes.len(), &what("translation"))?;
            seq.scale_matters.check_bound(self.nodes.len(), &what("scale"))?;
            seq.vis_matters.check_bound(self.objects.len(), &what("visibility"))?;
            seq.frame_matters.check_bound(self.objects.len(), &what("frame"))?;
            seq.mat_frame_matters.check_bound(self.objects.len(), &what("material frame"))?;
            seq.ifl_matters.check_bound(self.ifl_materials.len(), &what("ifl"))?;

            let keys = [
                (Channel::Rotation, self.node_rotations.len()),
                (Channel::Translation, self.node_translations.len()),
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
                    "sequence {i} triggers end at {triggers_end}, shape has {}",
                    self.triggers.len()
                )));
            }
            let ground_end = seq.first_ground_frame as i64 + seq.num_ground_frames as i64;
            if seq.num_ground_frames > 0 && ground_end > self.ground_translations.len() as i64 {
                return Err(Error::invariant(format!(
                    "sequence {i} ground frames end at {ground_end}, shape has {}",
                    self.ground_translations.len()
                )));
            }
        }
        Ok(())
    }
}

fn check_len(what: &str, len: usize, expected: usize) -> Result<()> {
    if len == expected {
        Ok(())
    } else {
        Err(Error::invariant(format!("{len} {what}, expected {expected}")))
    }
}
