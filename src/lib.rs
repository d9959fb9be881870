//! # torque-dts
//!
//! Rust implementation of the Torque Game Engine DTS shape and DSQ sequence
//! formats.
//!
//! DTS files hold a complete shape: node hierarchy, meshes per detail level,
//! materials and embedded animation sequences. DSQ files hold sequences on
//! their own, keyed by node name. Both decode into owned in-memory models and
//! encode back byte-for-byte, apart from quaternions, which are stored as
//! 16-bit fixed point.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math types, Windows-1252 text
//! - [`codec`] - Quantized quaternions, bit sets, little-endian byte cursors
//! - [`tribuf`] - Three-region payload with guard checkpoints
//! - [`shape`] - In-memory shape model and name table
//! - [`dts`] - DTS encoding and decoding
//! - [`dsq`] - DSQ encoding and decoding
//!
//! ## Example
//!
//! ```ignore
//! use torque_dts::prelude::*;
//!
//! let shape = dts::read_shape_file("player.dts")?;
//! for node in &shape.nodes {
//!     println!("{}", shape.name(node.name_index).unwrap_or("?"));
//! }
//! let bytes = dts::encode(&shape, 24)?;
//! ```

pub mod util;
pub mod codec;
pub mod tribuf;
pub mod shape;
pub mod dts;
pub mod dsq;

// Re-export commonly used types
pub use util::{Error, Result};
pub use shape::{NameTable, Shape};
pub use dts::{decode, encode, encode_with, ShapeFile, WriteOptions};
pub use dsq::{decode_sequence_file, encode_sequence_file, DsqFile, DsqSequence};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::shape::*;
    pub use crate::dts::{self, ShapeFile, WriteOptions};
    pub use crate::dsq::{self, DsqFile, DsqSequence};
    pub use crate::codec::{BitSet, Quat16};
}
