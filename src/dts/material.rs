//! Material list codec.
//!
//! The list follows the sequences in the plain tail of a DTS file. After the
//! marker byte and count, every field is stored as its own column.

use super::version::{Layout, MATERIAL_LIST_MARKER};
use crate::codec::{ByteReader, ByteWriter};
use crate::shape::{Material, MaterialFlags};
use crate::util::{encode_cp1252, Error, Result};

pub(crate) fn read_materials(r: &mut ByteReader<'_>, layout: &Layout) -> Result<Vec<Material>> {
    let marker = r.read_i8()?;
    if marker != MATERIAL_LIST_MARKER {
        return Err(Error::InvalidTag {
            what: "material list",
            value: marker as u8 as u32,
        });
    }
    let count = r.read_count("material")?;
    let mut materials = Vec::with_capacity(count.min(r.remaining()));

    for _ in 0..count {
        let len = if layout.wide_material_names {
            r.read_count("material name length")?
        } else {
            r.read_u8()? as usize
        };
        materials.push(Material {
            name: r.read_text(len)?,
            ..Material::default()
        });
    }
    for m in &mut materials {
        m.flags = MaterialFlags::from_bits_retain(r.read_u32()?);
    }
    for m in &mut materials {
        m.reflectance_map = r.read_i32()?;
    }
    for m in &mut materials {
        m.bump_map = r.read_i32()?;
    }
    for m in &mut materials {
        m.detail_map = r.read_i32()?;
    }
    if layout.material_reserved {
        r.take(4 * count)?;
    }
    for m in &mut materials {
        m.detail_scale = r.read_f32()?;
    }
    for m in &mut materials {
        m.reflectance = r.read_f32()?;
    }
    Ok(materials)
}

pub(crate) fn write_materials(w: &mut ByteWriter, materials: &[Material], layout: &Layout) -> Result<()> {
    w.write_i8(MATERIAL_LIST_MARKER)?;
    w.write_count(materials.len())?;

    for m in materials {
        let name = encode_cp1252(&m.name)?;
        if layout.wide_material_names {
            w.write_count(name.len())?;
        } else {
            let len = u8::try_from(name.len()).map_err(|_| {
                Error::invariant(format!(
                    "material name {:?} is {} bytes, this version allows 255",
                    m.name,
                    name.len()
                ))
            })?;
            w.write_u8(len)?;
        }
        w.write_bytes(&name)?;
    }
    for m in materials {
        w.write_u32(m.flags.bits())?;
    }
    for m in materials {
        w.write_i32(m.reflectance_map)?;
    }
    for m in materials {
        w.write_i32(m.bump_map)?;
    }
    for m in materials {
        w.write_i32(m.detail_map)?;
    }
    if layout.material_reserved {
        w.write_bytes(&vec![0; 4 * materials.len()])?;
    }
    for m in materials {
        w.write_f32(m.detail_scale)?;
    }
    for m in materials {
        w.write_f32(m.reflectance)?;
    }
    Ok(())
}
