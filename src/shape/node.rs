//! Fixed-layout shape records.
//!
//! Index fields keep their on-disk `i32` type; `-1` means "none".

/// A node of the transform hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub name_index: i32,
    /// Parent node, or `-1` for a root.
    pub parent_index: i32,
    /// Derived. Recomputed by [`Shape::compute_links`](super::Shape::compute_links).
    pub first_object: i32,
    /// Derived.
    pub first_child: i32,
    /// Derived.
    pub next_sibling: i32,
}

impl Node {
    pub fn new(name_index: i32, parent_index: i32) -> Self {
        Self {
            name_index,
            parent_index,
            first_object: -1,
            first_child: -1,
            next_sibling: -1,
        }
    }

    /// Parent index as `usize`, `None` for roots.
    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.parent_index).ok()
    }
}

/// Renderable attached to a node, owning a contiguous run of meshes (one per detail).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Object {
    pub name_index: i32,
    pub num_meshes: i32,
    pub first_mesh: i32,
    pub node_index: i32,
    /// Derived. Next object attached to the same node.
    pub next_sibling: i32,
    /// Deprecated.
    pub first_decal: i32,
}

impl Object {
    pub fn new(name_index: i32, node_index: i32, first_mesh: i32, num_meshes: i32) -> Self {
        Self {
            name_index,
            num_meshes,
            first_mesh,
            node_index,
            next_sibling: -1,
            first_decal: -1,
        }
    }

    /// Mesh indices owned by this object.
    pub fn mesh_range(&self) -> std::ops::Range<usize> {
        let first = self.first_mesh.max(0) as usize;
        first..first + self.num_meshes.max(0) as usize
    }
}

/// Deprecated decal record, carried for lossless round trips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decal {
    pub name_index: i32,
    pub num_meshes: i32,
    pub first_mesh: i32,
    pub object_index: i32,
    pub next_sibling: i32,
}

/// Contiguous node/object/decal ranges forming one independently animated group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Subshape {
    pub first_node: i32,
    pub first_object: i32,
    pub first_decal: i32,
    pub num_nodes: i32,
    pub num_objects: i32,
    pub num_decals: i32,
}

/// Visibility and frame state of one object. Positionally matched to `Shape::objects`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectState {
    pub vis: f32,
    pub frame: i32,
    pub mat_frame: i32,
}

impl Default for ObjectState {
    fn default() -> Self {
        Self {
            vis: 1.0,
            frame: 0,
            mat_frame: 0,
        }
    }
}

/// Level of detail selected by projected size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetailLevel {
    pub name_index: i32,
    pub subshape: i32,
    pub object_detail: i32,
    pub size: f32,
    pub avg_error: f32,
    pub max_error: f32,
    pub poly_count: i32,
    /// Fade-in distance. Stored from version 26.
    pub alpha_in: f32,
    /// Fade-out distance. Stored from version 26.
    pub alpha_out: f32,
}

impl DetailLevel {
    pub fn new(name_index: i32, subshape: i32, object_detail: i32, size: f32) -> Self {
        Self {
            name_index,
            subshape,
            object_detail,
            size,
            ..Self::default()
        }
    }
}

impl Default for DetailLevel {
    fn default() -> Self {
        Self {
            name_index: -1,
            subshape: 0,
            object_detail: 0,
            size: 0.0,
            avg_error: -1.0,
            max_error: -1.0,
            poly_count: 0,
            alpha_in: 0.0,
            alpha_out: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_records_have_unset_links() {
        let node = Node::new(0, -1);
        assert_eq!(node.parent(), None);
        assert_eq!(node.first_child, -1);
        assert_eq!(Node::new(1, 0).parent(), Some(0));

        let obj = Object::new(2, 0, 3, 2);
        assert_eq!(obj.mesh_range(), 3..5);
        assert_eq!(obj.first_decal, -1);
    }
}
