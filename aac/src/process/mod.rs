//! Drivers over the syntax engine.
//!
//! Provides the streaming [`Reader`](reader::Reader) with its ADTS
//! sync-and-dispatch loop, the [writer](writer) functions producing
//! headers, configurations and silent frames, and the
//! [`Dump`](dump::Dump) introspection sink.

pub mod dump;
pub mod reader;
pub mod writer;
