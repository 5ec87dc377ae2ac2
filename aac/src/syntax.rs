//! The three operation modes of the syntax engine.
//!
//! Every AAC syntactic production is written once, generic over a
//! [`SyntaxOp`]. The read mode consumes bits into the production's struct,
//! the write mode emits the struct's fields, and the dump mode reports each
//! field as a `(name, value)` event to a [`DumpSink`]. Only steps the
//! format itself defines asymmetrically (section run-length accumulation,
//! spectral traversal, trailing padding) branch on the operation kind.
//!
//! [`DumpSink`]: crate::process::dump::DumpSink

use anyhow::Result;

use crate::process::dump::DumpSink;
use crate::utils::bitstream_io::{BsIoSliceReader, BsIoVecWriter};
use crate::utils::huffman;

/// Parse frame data instead of skipping frame payloads.
pub const READER_FLAGS_FRAME_DATA: u32 = 0x01;

/// Expand raw_data_block contents into dump events.
pub const DUMP_FLAGS_FRAME_DATA: u32 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Read,
    Write,
    Dump,
}

/// One traversal mode over the shared syntax description.
pub trait SyntaxOp {
    const KIND: OpKind;

    /// Transfers an unsigned field of `n` bits.
    ///
    /// Read ignores `value` and returns the consumed bits; write emits the
    /// low `n` bits of `value`; dump reports `(name, value)`. The returned
    /// value is what the caller stores back into the field.
    fn bits(&mut self, name: &'static str, value: u64, n: u32) -> Result<u64>;

    /// Transfers a signed field of `n` bits, sign-extended on read.
    fn bits_i(&mut self, name: &'static str, value: i64, n: u32) -> Result<i64>;

    fn begin_struct(&mut self, name: &'static str) -> Result<()>;
    fn end_struct(&mut self, name: &'static str) -> Result<()>;
    fn begin_array(&mut self, name: &'static str) -> Result<()>;
    fn end_array(&mut self, name: &'static str) -> Result<()>;
    fn begin_array_item(&mut self) -> Result<()>;
    fn end_array_item(&mut self) -> Result<()>;

    /// Zero-bit padding to the next byte boundary; a verified consume on
    /// read, zero emission on write, nothing on dump.
    fn trailing_bits(&mut self) -> Result<()>;

    /// Remaining input bits. Unbounded on the growable write cursor, zero
    /// on dump, where no bitstream backs the traversal.
    fn rem_bits(&mut self) -> Result<u64>;

    /// Transfers one Huffman-coded scalefactor codebook index.
    fn huffman_scale_factor(&mut self, name: &'static str, value: i64) -> Result<i64>;

    /// Transfers one spectral Huffman step (a pair or quad of coefficients
    /// plus sign bits and escapes). Coefficients are not retained by the
    /// data model, so only the read mode consumes anything.
    fn spectral_step(&mut self, sect_cb: u8) -> Result<()>;
}

/// Read mode: binary to structured.
pub struct ReadOp<'a> {
    pub bs: BsIoSliceReader<'a>,
    pub flags: u32,
}

impl<'a> ReadOp<'a> {
    pub fn new(bs: BsIoSliceReader<'a>, flags: u32) -> Self {
        Self { bs, flags }
    }
}

impl SyntaxOp for ReadOp<'_> {
    const KIND: OpKind = OpKind::Read;

    fn bits(&mut self, _name: &'static str, _value: u64, n: u32) -> Result<u64> {
        self.bs.get_n(n)
    }

    fn bits_i(&mut self, _name: &'static str, _value: i64, n: u32) -> Result<i64> {
        self.bs.get_s(n)
    }

    fn begin_struct(&mut self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn end_struct(&mut self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn begin_array(&mut self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn end_array(&mut self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn begin_array_item(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_array_item(&mut self) -> Result<()> {
        Ok(())
    }

    fn trailing_bits(&mut self) -> Result<()> {
        self.bs.read_trailing_bits()
    }

    fn rem_bits(&mut self) -> Result<u64> {
        self.bs.available()
    }

    fn huffman_scale_factor(&mut self, _name: &'static str, _value: i64) -> Result<i64> {
        huffman::decode_scale_factor(&mut self.bs)
    }

    fn spectral_step(&mut self, sect_cb: u8) -> Result<()> {
        let cb = huffman::spectral_codebook(sect_cb)?;
        let (_, _, y, z) = huffman::decode_spectral(&mut self.bs, cb)?;
        if sect_cb == huffman::ESC_HCB {
            if y.abs() == huffman::ESC_FLAG {
                huffman::read_escape(&mut self.bs, y < 0)?;
            }
            if z.abs() == huffman::ESC_FLAG {
                huffman::read_escape(&mut self.bs, z < 0)?;
            }
        }
        Ok(())
    }
}

/// Write mode: structured to binary.
#[derive(Default)]
pub struct WriteOp {
    pub bw: BsIoVecWriter,
}

impl SyntaxOp for WriteOp {
    const KIND: OpKind = OpKind::Write;

    fn bits(&mut self, _name: &'static str, value: u64, n: u32) -> Result<u64> {
        self.bw.put_n(value, n)?;
        Ok(value)
    }

    fn bits_i(&mut self, _name: &'static str, value: i64, n: u32) -> Result<i64> {
        self.bw.put_s(value, n)?;
        Ok(value)
    }

    fn begin_struct(&mut self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn end_struct(&mut self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn begin_array(&mut self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn end_array(&mut self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn begin_array_item(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_array_item(&mut self) -> Result<()> {
        Ok(())
    }

    fn trailing_bits(&mut self) -> Result<()> {
        self.bw.write_trailing_bits()
    }

    fn rem_bits(&mut self) -> Result<u64> {
        Ok(u64::MAX)
    }

    fn huffman_scale_factor(&mut self, _name: &'static str, value: i64) -> Result<i64> {
        huffman::encode_scale_factor(&mut self.bw, value)?;
        Ok(value)
    }

    fn spectral_step(&mut self, _sect_cb: u8) -> Result<()> {
        Ok(())
    }
}

/// Dump mode: structured to field events.
pub struct DumpOp<'s> {
    pub sink: &'s mut dyn DumpSink,
    pub flags: u32,
}

impl<'s> DumpOp<'s> {
    pub fn new(sink: &'s mut dyn DumpSink, flags: u32) -> Self {
        Self { sink, flags }
    }
}

impl SyntaxOp for DumpOp<'_> {
    const KIND: OpKind = OpKind::Dump;

    fn bits(&mut self, name: &'static str, value: u64, _n: u32) -> Result<u64> {
        self.sink.field(name, value as i64)?;
        Ok(value)
    }

    fn bits_i(&mut self, name: &'static str, value: i64, _n: u32) -> Result<i64> {
        self.sink.field(name, value)?;
        Ok(value)
    }

    fn begin_struct(&mut self, name: &'static str) -> Result<()> {
        self.sink.begin_struct(name)
    }

    fn end_struct(&mut self, name: &'static str) -> Result<()> {
        self.sink.end_struct(name)
    }

    fn begin_array(&mut self, name: &'static str) -> Result<()> {
        self.sink.begin_array(name)
    }

    fn end_array(&mut self, name: &'static str) -> Result<()> {
        self.sink.end_array(name)
    }

    fn begin_array_item(&mut self) -> Result<()> {
        self.sink.begin_array_item()
    }

    fn end_array_item(&mut self) -> Result<()> {
        self.sink.end_array_item()
    }

    fn trailing_bits(&mut self) -> Result<()> {
        Ok(())
    }

    fn rem_bits(&mut self) -> Result<u64> {
        Ok(0)
    }

    fn huffman_scale_factor(&mut self, name: &'static str, value: i64) -> Result<i64> {
        self.sink.field(name, value)?;
        Ok(value)
    }

    fn spectral_step(&mut self, _sect_cb: u8) -> Result<()> {
        Ok(())
    }
}

/// Transfers an unsigned struct field, naming it after the access path.
#[macro_export]
macro_rules! syn_bits {
    ($op:expr, $f:expr, $n:expr) => {{
        let v = $op.bits(stringify!($f), u64::from($f), $n)?;
        $f = v as _;
    }};
}

/// Transfers a one-bit flag field.
#[macro_export]
macro_rules! syn_flag {
    ($op:expr, $f:expr) => {{
        let v = $op.bits(stringify!($f), u64::from($f), 1)?;
        $f = v != 0;
    }};
}
