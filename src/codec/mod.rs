//! Integer coding primitives: tight-variable-byte, gamma/delta universal
//! codes, and the fixed-block codec used by posting lists.

pub mod block;
pub mod gamma;
pub mod tvb;

pub use block::{BitpackedBlockCodec, BlockCodec, BLOCK_SIZE};
