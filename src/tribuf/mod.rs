//! Tri-buffer stream.
//!
//! The main body of a DTS file is split into three regions by element width.
//! Every field goes to the region matching its size, and each region is
//! read with its own cursor.
//!
//! ## Layout
//!
//! ```text
//! +--------------------+
//! | total_words   i32  |  \
//! | offset16      i32  |   } region header, all in 32-bit word units
//! | offset8       i32  |  /
//! +--------------------+  word 0
//! | 32-bit region      |  counts, floats, i32 fields, guards
//! +--------------------+  word offset16
//! | 16-bit region      |  quaternions, indices, guards (padded to 4 bytes)
//! +--------------------+  word offset8
//! | 8-bit region       |  names, encoded normals, guards (padded to 4 bytes)
//! +--------------------+  word total_words
//! ```
//!
//! Writer and reader interleave guard values through all three regions at
//! fixed [`Checkpoint`]s to catch layout drift close to where it happens.

mod format;
mod guard;
mod reader;
mod writer;

pub use format::*;
pub use guard::*;
pub use reader::*;
pub use writer::*;
