//! Primitive codecs shared by the DTS and DSQ layers.
//!
//! - [`Quat16`] - 16-bit fixed-point quaternions
//! - [`BitSet`] - run of 32-bit words marking animated nodes
//! - [`ByteReader`] / [`ByteWriter`] - little-endian scalars over flat sections

mod bitset;
mod bytes;
mod quat;

pub use bitset::*;
pub use bytes::*;
pub use quat::*;
