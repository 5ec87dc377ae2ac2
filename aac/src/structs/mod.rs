//! Data structures for the AAC syntactic productions.
//!
//! Each file pairs the structs of one syntax area with their productions,
//! written once and traversed by the read, write and dump operation modes.

pub mod adts;
pub mod asc;
pub mod element;
pub mod ics;

/// Upper bound on window groups in one individual channel stream.
pub const MAX_WINDOW_GROUPS: usize = 8;

/// Upper bound on scalefactor bands.
pub const MAX_SFB: usize = 64;

/// Upper bound on raw_data_blocks in one ADTS frame.
pub const MAX_RAW_DATA_BLOCKS: usize = 4;

/// Upper bound on syntactic elements in one raw_data_block.
pub const MAX_SYN_ELE: usize = 10;
