//! DSQ decoding.

use tracing::{debug, warn};

use super::{DsqFile, DsqSequence};
use crate::codec::ByteReader;
use crate::dts::sequence::read_sequence;
use crate::dts::Layout;
use crate::shape::Trigger;
use crate::tribuf::Region;
use crate::util::Result;

fn read_array<T>(
    r: &mut ByteReader<'_>,
    count: usize,
    mut f: impl FnMut(&mut ByteReader<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    (0..count).map(|_| f(r)).collect()
}

fn read_names(r: &mut ByteReader<'_>, what: &str) -> Result<Vec<String>> {
    let count = r.read_count(what)?;
    read_array(r, count, |r| r.read_name())
}

#[tracing::instrument(skip_all, fields(len = bytes.len()))]
pub(crate) fn read_dsq(bytes: &[u8]) -> Result<DsqFile> {
    let mut r = ByteReader::new(bytes, Region::Plain);
    let version = r.read_i32()?;
    let layout = Layout::dsq(version)?;

    let mut file = DsqFile {
        version,
        node_names: read_names(&mut r, "node name")?,
        object_names: read_names(&mut r, "object name")?,
        old_shape_num_objects: r.read_i32()?,
        ..DsqFile::default()
    };
    debug!(version, nodes = file.node_names.len(), "decoding sequence file");

    if layout.split_node_counts {
        let n = r.read_count("rotation")?;
        file.rotations = read_array(&mut r, n, |r| Ok(r.read_quat16()?.decode()))?;
        let n = r.read_count("translation")?;
        file.translations = read_array(&mut r, n, |r| r.read_vec3())?;
        let n = r.read_count("uniform scale")?;
        file.uniform_scales = read_array(&mut r, n, |r| r.read_f32())?;
        let n = r.read_count("aligned scale")?;
        file.aligned_scales = read_array(&mut r, n, |r| r.read_vec3())?;
        let n = r.read_count("arbitrary scale")?;
        file.arbitrary_scale_rotations = read_array(&mut r, n, |r| Ok(r.read_quat16()?.decode()))?;
        file.arbitrary_scale_factors = read_array(&mut r, n, |r| r.read_vec3())?;
        let n = r.read_count("ground frame")?;
        file.ground_translations = read_array(&mut r, n, |r| r.read_vec3())?;
        file.ground_rotations = read_array(&mut r, n, |r| Ok(r.read_quat16()?.decode()))?;
    } else {
        // Rotation and translation interleaved per keyframe
        let n = r.read_count("keyframe")?;
        let pairs = read_array(&mut r, n, |r| {
            let rotation = r.read_quat16()?.decode();
            Ok((rotation, r.read_vec3()?))
        })?;
        let (rotations, translations): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        file.rotations = rotations;
        file.translations = translations;
    }

    let legacy = r.read_i32()?;
    if legacy != 0 {
        warn!(value = legacy, "non-zero legacy word before the sequence list");
    }

    let n = r.read_count("sequence")?;
    file.sequences = read_array(&mut r, n, |r| {
        let name = r.read_name()?;
        let sequence = read_sequence(r, &layout, false)?;
        Ok(DsqSequence { name, sequence })
    })?;

    let n = r.read_count("trigger")?;
    file.triggers = read_array(&mut r, n, |r| {
        let state = r.read_u32()?;
        Ok(Trigger::new(state, r.read_f32()?))
    })?;

    if r.remaining() > 0 {
        warn!(bytes = r.remaining(), "ignoring data after the trigger list");
    }
    debug!(
        sequences = file.sequences.len(),
        rotations = file.rotations.len(),
        translations = file.translations.len(),
        "decoded sequence file"
    );
    Ok(file)
}
