//! Guard checkpoints.
//!
//! At fixed points of the walk, writer and reader push the current value of
//! three counters (32-, 16- and 8-bit) into their respective regions and then
//! increment all three. A reader that disagrees with the writer about how much
//! was written fails at the first checkpoint after the divergence.

use std::fmt;

/// Named checkpoint in the tri-buffer walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    Header,
    Bounds,
    Nodes,
    Objects,
    Decals,
    IflMaterials,
    SubshapeFirsts,
    SubshapeCounts,
    NodeTransforms,
    NodeScales,
    GroundTransforms,
    ObjectStates,
    DecalStates,
    Triggers,
    DetailLevels,
    /// Start of a standard/skin mesh body
    MeshStart(usize),
    /// End of the shared standard/skin prefix
    MeshEnd(usize),
    /// End of the skin-only block
    SkinEnd(usize),
    Meshes,
    Names,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::Header => f.write_str("header"),
            Checkpoint::Bounds => f.write_str("bounds"),
            Checkpoint::Nodes => f.write_str("nodes"),
            Checkpoint::Objects => f.write_str("objects"),
            Checkpoint::Decals => f.write_str("decals"),
            Checkpoint::IflMaterials => f.write_str("ifl materials"),
            Checkpoint::SubshapeFirsts => f.write_str("subshape starts"),
            Checkpoint::SubshapeCounts => f.write_str("subshape counts"),
            Checkpoint::NodeTransforms => f.write_str("node transforms"),
            Checkpoint::NodeScales => f.write_str("node scales"),
            Checkpoint::GroundTransforms => f.write_str("ground transforms"),
            Checkpoint::ObjectStates => f.write_str("object states"),
            Checkpoint::DecalStates => f.write_str("decal states"),
            Checkpoint::Triggers => f.write_str("triggers"),
            Checkpoint::DetailLevels => f.write_str("detail levels"),
            Checkpoint::MeshStart(i) => write!(f, "mesh {i} start"),
            Checkpoint::MeshEnd(i) => write!(f, "mesh {i} end"),
            Checkpoint::SkinEnd(i) => write!(f, "mesh {i} skin data"),
            Checkpoint::Meshes => f.write_str("meshes"),
            Checkpoint::Names => f.write_str("names"),
        }
    }
}

/// The three guard counters. They start at zero and advance together, each
/// wrapping at its own width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuardCounter {
    pub next32: i32,
    pub next16: i16,
    pub next8: i8,
}

impl GuardCounter {
    /// Advance all three counters by one.
    #[inline]
    pub fn advance(&mut self) {
        self.next32 = self.next32.wrapping_add(1);
        self.next16 = self.next16.wrapping_add(1);
        self.next8 = self.next8.wrapping_add(1);
    }
}

/// A checkpoint that was written or verified, with the 32-bit guard value used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuardMark {
    pub checkpoint: Checkpoint,
    pub value: i32,
}
