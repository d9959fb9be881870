//! Animation sequences and triggers.
//!
//! A sequence does not own keyframes. It names a base offset into each flat
//! channel array plus a "matters" set per channel; only nodes in the set
//! consume slots, `num_keyframes` each, in ascending node order.

use std::borrow::Cow;

use bitflags::bitflags;

use crate::codec::BitSet;

bitflags! {
    /// Sequence flag word.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SequenceFlags: u32 {
        const UNIFORM_SCALE = 1 << 0;
        const ALIGNED_SCALE = 1 << 1;
        const ARBITRARY_SCALE = 1 << 2;
        const BLEND = 1 << 3;
        const CYCLIC = 1 << 4;
        const MAKE_PATH = 1 << 5;
        const IFL_INIT = 1 << 6;
        const HAS_TRANSLUCENCY = 1 << 7;

        /// Flags expressible in files older than version 22.
        const LEGACY = Self::BLEND.bits() | Self::CYCLIC.bits() | Self::MAKE_PATH.bits();
    }
}

/// Animated channel of a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Rotation,
    Translation,
    Scale,
    ObjectState,
    DecalState,
}

/// Animation sequence descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    /// Name table index. Unused (`-1`) inside DSQ files, which store names inline.
    pub name_index: i32,
    pub flags: SequenceFlags,
    pub num_keyframes: i32,
    pub duration: f32,
    pub priority: i32,
    pub first_ground_frame: i32,
    pub num_ground_frames: i32,
    pub base_rotation: i32,
    pub base_translation: i32,
    pub base_scale: i32,
    pub base_object_state: i32,
    pub base_decal_state: i32,
    pub first_trigger: i32,
    pub num_triggers: i32,
    pub tool_begin: f32,
    pub rotation_matters: BitSet,
    pub translation_matters: BitSet,
    pub scale_matters: BitSet,
    /// Deprecated.
    pub decal_matters: BitSet,
    /// Deprecated.
    pub ifl_matters: BitSet,
    pub vis_matters: BitSet,
    pub frame_matters: BitSet,
    pub mat_frame_matters: BitSet,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            name_index: -1,
            flags: SequenceFlags::empty(),
            num_keyframes: 0,
            duration: 0.0,
            priority: 0,
            first_ground_frame: 0,
            num_ground_frames: 0,
            base_rotation: 0,
            base_translation: 0,
            base_scale: 0,
            base_object_state: 0,
            base_decal_state: 0,
            first_trigger: 0,
            num_triggers: 0,
            tool_begin: 0.0,
            rotation_matters: BitSet::new(),
            translation_matters: BitSet::new(),
            scale_matters: BitSet::new(),
            decal_matters: BitSet::new(),
            ifl_matters: BitSet::new(),
            vis_matters: BitSet::new(),
            frame_matters: BitSet::new(),
            mat_frame_matters: BitSet::new(),
        }
    }
}

impl Sequence {
    pub fn new(name_index: i32, num_keyframes: i32, duration: f32) -> Self {
        Self {
            name_index,
            num_keyframes,
            duration,
            ..Self::default()
        }
    }

    /// Base offset and matters set of a channel.
    ///
    /// Object states are shared by the visibility, frame and material frame
    /// tracks, so their set is the union of the three.
    pub fn channel(&self, channel: Channel) -> (i32, Cow<'_, BitSet>) {
        match channel {
            Channel::Rotation => (self.base_rotation, Cow::Borrowed(&self.rotation_matters)),
            Channel::Translation => {
                (self.base_translation, Cow::Borrowed(&self.translation_matters))
            }
            Channel::Scale => (self.base_scale, Cow::Borrowed(&self.scale_matters)),
            Channel::ObjectState => {
                let states = self
                    .vis_matters
                    .union(&self.frame_matters)
                    .union(&self.mat_frame_matters);
                (self.base_object_state, Cow::Owned(states))
            }
            Channel::DecalState => (self.base_decal_state, Cow::Borrowed(&self.decal_matters)),
        }
    }

    /// Position of keyframe `frame` of node (or object) `index` in the flat
    /// array of `channel`, or `None` if the channel does not animate it.
    pub fn key_index(&self, channel: Channel, index: usize, frame: usize) -> Option<usize> {
        let (base, matters) = self.channel(channel);
        let keys = usize::try_from(self.num_keyframes).ok()?;
        if !matters.contains(index) || frame >= keys {
            return None;
        }
        let base = usize::try_from(base).ok()?;
        Some(base + matters.rank(index) * keys + frame)
    }

    /// Number of slots this sequence occupies in the flat array of `channel`.
    pub fn slot_count(&self, channel: Channel) -> usize {
        let (_, matters) = self.channel(channel);
        matters.len() * self.num_keyframes.max(0) as usize
    }

    /// Whether the sequence can be stored without loss before version 22.
    ///
    /// Older layouts share one base and one matters set between rotation and
    /// translation, have no scale channel, and only keep three flags.
    pub fn is_legacy_compatible(&self) -> bool {
        self.base_translation == self.base_rotation
            && self.base_scale == -1
            && self.translation_matters == self.rotation_matters
            && self.scale_matters.is_empty()
            && SequenceFlags::LEGACY.contains(self.flags)
    }
}

/// Event marker fired when playback crosses `pos`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Trigger {
    /// State number in the low bits plus [`Trigger::STATE_ON`] and
    /// [`Trigger::INVERT_ON_REVERSE`].
    pub state: u32,
    /// Position in the sequence, 0..1.
    pub pos: f32,
}

impl Trigger {
    pub const STATE_ON: u32 = 1 << 31;
    pub const INVERT_ON_REVERSE: u32 = 1 << 30;
    pub const STATE_MASK: u32 = !(Self::STATE_ON | Self::INVERT_ON_REVERSE);

    pub fn new(state: u32, pos: f32) -> Self {
        Self { state, pos }
    }

    pub fn state_number(&self) -> u32 {
        self.state & Self::STATE_MASK
    }

    pub fn is_on(&self) -> bool {
        self.state & Self::STATE_ON != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_index_uses_rank() {
        let mut seq = Sequence::new(0, 4, 1.0);
        seq.base_rotation = 10;
        seq.rotation_matters = [1, 3, 6].into_iter().collect();

        assert_eq!(seq.key_index(Channel::Rotation, 1, 0), Some(10));
        assert_eq!(seq.key_index(Channel::Rotation, 3, 2), Some(16));
        assert_eq!(seq.key_index(Channel::Rotation, 6, 3), Some(21));
        assert_eq!(seq.key_index(Channel::Rotation, 2, 0), None);
        assert_eq!(seq.key_index(Channel::Rotation, 1, 4), None);
        assert_eq!(seq.slot_count(Channel::Rotation), 12);
    }

    #[test]
    fn test_object_states_share_slots() {
        let mut seq = Sequence::new(0, 2, 1.0);
        seq.vis_matters = [2].into_iter().collect();
        seq.frame_matters = [0].into_iter().collect();
        assert_eq!(seq.key_index(Channel::ObjectState, 2, 1), Some(3));
        assert_eq!(seq.slot_count(Channel::ObjectState), 4);
    }

    #[test]
    fn test_legacy_compatibility() {
        let mut seq = Sequence::new(0, 2, 1.0);
        seq.base_scale = -1;
        seq.rotation_matters = [0].into_iter().collect();
        seq.translation_matters = seq.rotation_matters.clone();
        seq.flags = SequenceFlags::CYCLIC;
        assert!(seq.is_legacy_compatible());

        seq.flags |= SequenceFlags::UNIFORM_SCALE;
        assert!(!seq.is_legacy_compatible());
    }

    #[test]
    fn test_trigger_state() {
        let t = Trigger::new(Trigger::STATE_ON | 3, 0.5);
        assert!(t.is_on());
        assert_eq!(t.state_number(), 3);
    }
}
