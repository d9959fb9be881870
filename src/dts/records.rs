//! Fixed-width records of the 32-bit region.
//!
//! Each record is a run of 32-bit words in declaration order with no version
//! branching. [`record!`] generates the read and write for such a struct from
//! its field list, so the order is written down once.

use crate::shape::{
    Decal, DetailLevel, IflMaterial, Node, Object, ObjectState, Primitive, Topology, Trigger,
};
use crate::tribuf::{TriBufferReader, TriBufferWriter};
use crate::util::{Error, Result};

/// A record stored as consecutive 32-bit words.
pub(crate) trait Record: Sized {
    fn read(r: &mut TriBufferReader<'_>) -> Result<Self>;
    fn write(&self, w: &mut TriBufferWriter);
}

/// A single 32-bit word field.
pub(crate) trait Word: Copy {
    fn get(r: &mut TriBufferReader<'_>) -> Result<Self>;
    fn put(self, w: &mut TriBufferWriter);
}

impl Word for i32 {
    fn get(r: &mut TriBufferReader<'_>) -> Result<Self> {
        r.read_i32()
    }
    fn put(self, w: &mut TriBufferWriter) {
        w.write_i32(self)
    }
}

impl Word for u32 {
    fn get(r: &mut TriBufferReader<'_>) -> Result<Self> {
        r.read_u32()
    }
    fn put(self, w: &mut TriBufferWriter) {
        w.write_u32(self)
    }
}

impl Word for f32 {
    fn get(r: &mut TriBufferReader<'_>) -> Result<Self> {
        r.read_f32()
    }
    fn put(self, w: &mut TriBufferWriter) {
        w.write_f32(self)
    }
}

/// Implement [`Record`] for a struct whose listed fields are all [`Word`]s.
///
/// `..default` fills fields not stored in the record from `Default`.
macro_rules! record {
    (@impl $ty:ident { $($field:ident),+ } { $($rest:tt)* }) => {
        impl Record for $ty {
            fn read(r: &mut TriBufferReader<'_>) -> Result<Self> {
                Ok(Self {
                    $($field: Word::get(r)?,)+
                    $($rest)*
                })
            }

            fn write(&self, w: &mut TriBufferWriter) {
                $(Word::put(self.$field, w);)+
            }
        }
    };
    ($ty:ident { $($field:ident),+ $(,)? } ..default) => {
        record!(@impl $ty { $($field),+ } { ..$ty::default() });
    };
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        record!(@impl $ty { $($field),+ } {});
    };
}

record!(Node {
    name_index,
    parent_index,
    first_object,
    first_child,
    next_sibling,
});

record!(Object {
    name_index,
    num_meshes,
    first_mesh,
    node_index,
    next_sibling,
    first_decal,
});

record!(Decal {
    name_index,
    num_meshes,
    first_mesh,
    object_index,
    next_sibling,
});

record!(IflMaterial {
    name_index,
    slot,
    first_frame,
    time,
    num_frames,
});

record!(ObjectState { vis, frame, mat_frame });

record!(Trigger { state, pos });

record!(DetailLevel {
    name_index,
    subshape,
    object_detail,
    size,
    avg_error,
    max_error,
    poly_count,
} ..default);

/// Read `count` records.
pub(crate) fn read_records<T: Record>(r: &mut TriBufferReader<'_>, count: usize) -> Result<Vec<T>> {
    r.read_array32(count, T::read)
}

pub(crate) fn write_records<T: Record>(w: &mut TriBufferWriter, records: &[T]) {
    for record in records {
        record.write(w);
    }
}

// Primitive type word
pub const PRIMITIVE_STRIP: u32 = 0x4000_0000;
pub const PRIMITIVE_FAN: u32 = 0x8000_0000;
pub const PRIMITIVE_TYPE_MASK: u32 = 0xC000_0000;
pub const PRIMITIVE_INDEXED: u32 = 0x2000_0000;
pub const PRIMITIVE_NO_MATERIAL: u32 = 0x1000_0000;
pub const PRIMITIVE_MATERIAL_MASK: u32 = 0x0FFF_FFFF;

/// Pack topology, indexed flag and material slot into the primitive type word.
pub(crate) fn pack_primitive_type(p: &Primitive) -> Result<u32> {
    let topology = match p.topology {
        Topology::Triangles => 0,
        Topology::Strip => PRIMITIVE_STRIP,
        Topology::Fan => PRIMITIVE_FAN,
    };
    let indexed = if p.indexed { PRIMITIVE_INDEXED } else { 0 };
    let material = match p.material {
        None if p.unused_material_bits <= PRIMITIVE_MATERIAL_MASK => {
            PRIMITIVE_NO_MATERIAL | p.unused_material_bits
        }
        None => {
            return Err(Error::invariant(format!(
                "primitive material bits {:#x} exceed {PRIMITIVE_MATERIAL_MASK:#x}",
                p.unused_material_bits
            )))
        }
        Some(m) if m <= PRIMITIVE_MATERIAL_MASK => m,
        Some(m) => {
            return Err(Error::invariant(format!(
                "primitive material slot {m} exceeds {PRIMITIVE_MATERIAL_MASK:#x}"
            )))
        }
    };
    Ok(topology | indexed | material)
}

/// Build a primitive from its 16-bit range and 32-bit type word.
pub(crate) fn unpack_primitive(first_element: u16, num_elements: u16, word: u32) -> Result<Primitive> {
    let topology = match word & PRIMITIVE_TYPE_MASK {
        0 => Topology::Triangles,
        PRIMITIVE_STRIP => Topology::Strip,
        PRIMITIVE_FAN => Topology::Fan,
        _ => {
            return Err(Error::InvalidTag {
                what: "primitive topology",
                value: word,
            })
        }
    };
    let slot = word & PRIMITIVE_MATERIAL_MASK;
    let (material, unused_material_bits) = if word & PRIMITIVE_NO_MATERIAL != 0 {
        (None, slot)
    } else {
        (Some(slot), 0)
    };
    Ok(Primitive {
        first_element,
        num_elements,
        topology,
        indexed: word & PRIMITIVE_INDEXED != 0,
        material,
        unused_material_bits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_level_field_order() -> Result<()> {
        let detail = DetailLevel {
            poly_count: 12,
            alpha_in: 5.0,
            ..DetailLevel::new(3, 0, 1, 32.0)
        };
        let mut w = TriBufferWriter::new();
        detail.write(&mut w);
        assert_eq!(w.lens(), [28, 0, 0]);
        let (header, payload) = w.finish()?;
        assert_eq!(&payload[0..4], &3i32.to_le_bytes());
        assert_eq!(&payload[12..16], &32.0f32.to_le_bytes());
        assert_eq!(&payload[24..28], &12i32.to_le_bytes());

        let mut r = TriBufferReader::new(&payload, &header)?;
        let decoded = DetailLevel::read(&mut r)?;
        assert_eq!(decoded.size, 32.0);
        assert_eq!(decoded.poly_count, 12);
        // Not part of the record
        assert_eq!(decoded.alpha_in, 0.0);
        Ok(())
    }

    #[test]
    fn test_node_records() -> Result<()> {
        let nodes = vec![Node::new(0, -1), Node::new(1, 0)];
        let mut w = TriBufferWriter::new();
        write_records(&mut w, &nodes);
        let (header, payload) = w.finish()?;
        assert_eq!(payload.len(), 40);

        let mut r = TriBufferReader::new(&payload, &header)?;
        let decoded: Vec<Node> = read_records(&mut r, 2)?;
        assert_eq!(decoded, nodes);
        Ok(())
    }

    #[test]
    fn test_primitive_type_word() -> Result<()> {
        let tri = Primitive::triangles(0, 3, Some(5));
        assert_eq!(pack_primitive_type(&tri)?, 0x2000_0005);

        let strip = Primitive {
            topology: Topology::Strip,
            indexed: true,
            material: None,
            ..tri
        };
        let word = pack_primitive_type(&strip)?;
        assert_eq!(word, 0x7000_0000);
        assert_eq!(unpack_primitive(0, 3, word)?, strip);

        let fan = unpack_primitive(4, 6, 0x8000_0002)?;
        assert_eq!(fan.topology, Topology::Fan);
        assert!(!fan.indexed);
        assert_eq!(fan.material, Some(2));
        Ok(())
    }

    #[test]
    fn test_untextured_primitive_keeps_slot_bits() -> Result<()> {
        let p = unpack_primitive(0, 3, 0x3000_0005)?;
        assert_eq!(p.material, None);
        assert_eq!(p.unused_material_bits, 5);
        assert_eq!(pack_primitive_type(&p)?, 0x3000_0005);

        let overflow = Primitive {
            unused_material_bits: 0x1000_0000,
            ..p
        };
        assert!(matches!(pack_primitive_type(&overflow), Err(Error::InvariantViolation(_))));
        Ok(())
    }

    #[test]
    fn test_invalid_primitive_topology() {
        assert!(matches!(
            unpack_primitive(0, 3, 0xC000_0000),
            Err(Error::InvalidTag { what: "primitive topology", .. })
        ));
        let bad = Primitive::triangles(0, 3, Some(0x1000_0000));
        assert!(matches!(pack_primitive_type(&bad), Err(Error::InvariantViolation(_))));
    }
}
