//! Supporting infrastructure for the syntax engine.
//!
//! Provides bitstream cursors, Huffman codebooks, the constant tables from
//! ISO/IEC 14496-3 and the error types.

pub mod bitstream_io;
pub mod errors;
pub mod huffman;
pub mod tables;
