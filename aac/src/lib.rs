#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Parser, writer and introspector for ISO/IEC 14496-3 AAC bitstreams.
//!
//! ### Bitstream Organization
//!
//! **ADTS framing**: self-synchronizing frames with a 56-bit header (72
//! with CRC) carrying up to four raw_data_blocks each.
//! **Raw framing**: bare raw_data_blocks, configured out of band by an
//! AudioSpecificConfig descriptor.
//!
//! Beneath either framing, a raw_data_block is a sequence of syntactic
//! elements (SCE, CPE, CCE, DSE, PCE, FIL) terminated by END and padded to
//! a byte boundary.
//!
//! ### One description, three traversals
//!
//! Every syntactic production is written once, generic over a
//! [`syntax::SyntaxOp`], and driven in three modes: read (binary to
//! structured), write (structured to binary) and dump (structured to a
//! field-event stream rendered as JSON).
//!
//! ## Quick Start
//!
//! ```rust
//! use aac::process::reader::{FrameSink, Reader};
//! use aac::syntax::READER_FLAGS_FRAME_DATA;
//!
//! struct Counter(usize);
//!
//! impl FrameSink for Counter {
//!     fn frame_end(
//!         &mut self,
//!         _ctx: &aac::ctx::Context,
//!         _frame: &[u8],
//!         _adts: &aac::structs::adts::Adts,
//!     ) {
//!         self.0 += 1;
//!     }
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let data: &[u8] = &[0xFF, 0xF1, 0x4C, 0x40, 0x01, 0x1F, 0xFC, 0xE0];
//! let mut reader = Reader::new(Counter(0));
//! let mut off = 0;
//! reader.parse(READER_FLAGS_FRAME_DATA, data, &mut off)?;
//! assert_eq!(reader.sink().0, 1);
//! # Ok(())
//! # }
//! ```

/// Per-stream parsing state.
///
/// The [`Context`](ctx::Context) tracks the selected framing, the last
/// seen ADTS header or AudioSpecificConfig, and the window grouping
/// derived from the most recent `ics_info`.
pub mod ctx;

/// Audio format descriptors and canonical constants.
pub mod format;

/// Drivers: streaming reader, writers and the dump sink.
pub mod process;

/// Data structures for the AAC syntactic productions.
pub mod structs;

/// The three-mode syntax engine.
pub mod syntax;

/// Bitstream cursors, Huffman codebooks, constant tables and errors.
pub mod utils;
