//! Material list entries.

use bitflags::bitflags;

bitflags! {
    /// Material flag word.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        const S_WRAP = 0x0000_0001;
        const T_WRAP = 0x0000_0002;
        const TRANSLUCENT = 0x0000_0004;
        const ADDITIVE = 0x0000_0008;
        const SUBTRACTIVE = 0x0000_0010;
        const SELF_ILLUMINATING = 0x0000_0020;
        const NEVER_ENV_MAP = 0x0000_0040;
        const NO_MIP_MAP = 0x0000_0080;
        const MIP_MAP_ZERO_BORDER = 0x0000_0100;
        const IFL_MATERIAL = 0x0800_0000;
        const IFL_FRAME = 0x1000_0000;
        const DETAIL_MAP = 0x2000_0000;
        const BUMP_MAP = 0x4000_0000;
        const REFLECTANCE_MAP = 0x8000_0000;

        /// Bits marking a material as an auxiliary map of another.
        const AUXILIARY_MASK = 0xE000_0000;
    }
}

/// Texture material referenced by primitives through their material slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Texture name, Windows-1252 on disk.
    pub name: String,
    pub flags: MaterialFlags,
    /// Material list index of the reflectance map, or `-1`.
    pub reflectance_map: i32,
    pub bump_map: i32,
    pub detail_map: i32,
    pub detail_scale: f32,
    pub reflectance: f32,
}

impl Material {
    pub fn new(name: impl Into<String>, flags: MaterialFlags) -> Self {
        Self {
            name: name.into(),
            flags,
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            flags: MaterialFlags::empty(),
            reflectance_map: -1,
            bump_map: -1,
            detail_map: -1,
            detail_scale: 1.0,
            reflectance: 0.0,
        }
    }
}

/// Material slot whose texture cycles through an image file list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IflMaterial {
    pub name_index: i32,
    /// Material list slot being animated.
    pub slot: i32,
    pub first_frame: i32,
    pub time: i32,
    pub num_frames: i32,
}

impl IflMaterial {
    pub fn new(name_index: i32, slot: i32) -> Self {
        Self {
            name_index,
            slot,
            first_frame: -1,
            time: -1,
            num_frames: -1,
        }
    }
}
