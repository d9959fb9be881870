//! Version layout table.
//!
//! Every version-dependent decision of the DTS and DSQ codecs is a named
//! field of [`Layout`]. The table below declares each tier's full field set
//! once; the codecs only ever ask the layout, never the raw version number.

use std::ops::RangeInclusive;

use crate::util::{Error, Result};

/// Oldest DTS version the decoder accepts.
pub const DTS_VERSION_OLDEST: i16 = 19;

/// Newest DTS version the decoder recognizes.
pub const DTS_VERSION_NEWEST: i16 = 28;

/// Newest DTS version the encoder can produce.
pub const DTS_VERSION_WRITABLE: i16 = 26;

/// Version written when none is requested.
pub const DTS_VERSION_DEFAULT: i16 = 24;

/// Oldest DSQ version with keyframe data the codec understands.
pub const DSQ_VERSION_OLDEST: i32 = 17;

/// Newest DSQ version.
pub const DSQ_VERSION_NEWEST: i32 = 24;

/// DSQ version written by default.
pub const DSQ_VERSION_DEFAULT: i32 = 24;

/// Marker byte opening the material list.
pub const MATERIAL_LIST_MARKER: i8 = 1;

/// Field set of one format version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Separate rotation, translation and three scale counts in the header.
    /// Older files store one combined count.
    pub split_node_counts: bool,
    /// Node scale arrays and their guard.
    pub node_scales: bool,
    /// Ground transform arrays, their header count and their guard.
    pub ground_frames: bool,
    /// Header carries a skin count (skins stored outside the mesh list).
    pub legacy_skin_count: bool,
    /// One encoded-normal byte per vertex after the normals.
    pub encoded_normals: bool,
    /// Material names have an `i32` length instead of a `u8` length.
    pub wide_material_names: bool,
    /// Four reserved bytes per material after the detail map column.
    pub material_reserved: bool,
    /// `alpha_in` / `alpha_out` per detail level after the name table.
    pub detail_alpha: bool,
    /// Second UV set and vertex colors in standard meshes. Not implemented.
    pub vertex_channels: bool,
    /// Sequences store a 32-bit flag word; older ones store three bytes.
    /// Also selects separate translation/scale bases and matters sets.
    pub sequence_flags_word: bool,
    /// Meshes share a packed vertex buffer. Not implemented.
    pub packed_vertex_header: bool,
}

const LEGACY: Layout = Layout {
    split_node_counts: false,
    node_scales: false,
    ground_frames: false,
    legacy_skin_count: true,
    encoded_normals: false,
    wide_material_names: false,
    material_reserved: false,
    detail_alpha: false,
    vertex_channels: false,
    sequence_flags_word: false,
    packed_vertex_header: false,
};

const SCALED: Layout = Layout {
    split_node_counts: true,
    node_scales: true,
    encoded_normals: true,
    sequence_flags_word: true,
    ..LEGACY
};

const INLINE_SKINS: Layout = Layout {
    legacy_skin_count: false,
    ..SCALED
};

const GROUND: Layout = Layout {
    ground_frames: true,
    ..INLINE_SKINS
};

const RESERVED: Layout = Layout {
    material_reserved: true,
    ..GROUND
};

const WIDE: Layout = Layout {
    wide_material_names: true,
    detail_alpha: true,
    vertex_channels: true,
    ..GROUND
};

const PACKED: Layout = Layout {
    packed_vertex_header: true,
    ..WIDE
};

/// Version tiers in ascending order.
pub const LAYOUT_TABLE: [(RangeInclusive<i32>, Layout); 7] = [
    (16..=21, LEGACY),
    (22..=22, SCALED),
    (23..=23, INLINE_SKINS),
    (24..=24, GROUND),
    (25..=25, RESERVED),
    (26..=26, WIDE),
    (27..=28, PACKED),
];

impl Layout {
    /// Field set for `version`, or `None` outside the table.
    pub fn for_version(version: i32) -> Option<Self> {
        LAYOUT_TABLE
            .iter()
            .find(|(range, _)| range.contains(&version))
            .map(|(_, layout)| *layout)
    }

    /// Layout for decoding a DTS file of `version`.
    pub fn dts_read(version: i16) -> Result<Self> {
        if !(DTS_VERSION_OLDEST..=DTS_VERSION_NEWEST).contains(&version) {
            return Err(Error::unsupported(
                version,
                format!("DTS decoding supports versions {DTS_VERSION_OLDEST} to {DTS_VERSION_NEWEST}"),
            ));
        }
        Self::for_version(version.into())
            .ok_or_else(|| Error::unsupported(version, "no layout for version"))
    }

    /// Layout for encoding a DTS file of `version`.
    pub fn dts_write(version: i16) -> Result<Self> {
        if !(DTS_VERSION_OLDEST..=DTS_VERSION_WRITABLE).contains(&version) {
            return Err(Error::unsupported(
                version,
                format!("DTS encoding supports versions {DTS_VERSION_OLDEST} to {DTS_VERSION_WRITABLE}"),
            ));
        }
        Self::for_version(version.into())
            .ok_or_else(|| Error::unsupported(version, "no layout for version"))
    }

    /// Layout for a DSQ file of `version` (read or write).
    pub fn dsq(version: i32) -> Result<Self> {
        if !(DSQ_VERSION_OLDEST..=DSQ_VERSION_NEWEST).contains(&version) {
            return Err(Error::unsupported(
                version,
                format!("DSQ supports versions {DSQ_VERSION_OLDEST} to {DSQ_VERSION_NEWEST}"),
            ));
        }
        Self::for_version(version)
            .ok_or_else(|| Error::unsupported(version, "no layout for version"))
    }
}
