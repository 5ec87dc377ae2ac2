//! Bitstream cursors for AAC parsing and emission.
//!
//! Thin wrappers over `bitstream_io` adding the operations the AAC syntax
//! needs: MSB-first transput of arbitrary widths, trailing-bit handling,
//! aligned raw-byte transfer and write-buffer acquisition.

use std::io;
use std::io::SeekFrom;

use anyhow::{Result, bail};
use bitstream_io::{
    BigEndian, BitRead, BitReader, BitWrite, BitWriter, SignedInteger, UnsignedInteger,
};

use crate::utils::errors::BitstreamError;

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

fn underflow(e: io::Error) -> anyhow::Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        BitstreamError::NeedMoreData.into()
    } else {
        e.into()
    }
}

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> Result<bool> {
        self.bs.read_bit().map_err(underflow)
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> Result<I> {
        self.bs.read_unsigned_var(n).map_err(underflow)
    }

    #[inline(always)]
    pub fn get_s<S: SignedInteger>(&mut self, n: u32) -> Result<S> {
        self.bs.read_signed_var(n).map_err(underflow)
    }

    /// Reads `n` bits without consuming them.
    #[inline(always)]
    pub fn peek_n<I: UnsignedInteger>(&mut self, n: u32) -> Result<I> {
        let position = self.position()?;
        let value = self.get_n(n);
        self.bs.seek_bits(SeekFrom::Start(position))?;
        value
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> Result<()> {
        self.bs.skip(n).map_err(underflow)
    }

    /// Consumes zero bits up to the next byte boundary.
    ///
    /// A nonzero alignment bit fails with [`BitstreamError::BadAlignment`].
    pub fn read_trailing_bits(&mut self) -> Result<()> {
        while !self.byte_aligned() {
            if self.get()? {
                bail!(BitstreamError::BadAlignment);
            }
        }
        Ok(())
    }

    /// Reads all remaining bytes, which must be exactly `buf.len()`.
    pub fn read_raw_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        if !self.byte_aligned() {
            bail!(BitstreamError::NotByteAligned);
        }
        let remaining = (self.available()? >> 3) as usize;
        if remaining != buf.len() {
            bail!(BitstreamError::RawLengthMismatch {
                remaining,
                requested: buf.len(),
            });
        }
        self.bs.read_bytes(buf).map_err(underflow)
    }

    #[inline(always)]
    pub fn byte_aligned(&self) -> bool {
        self.bs.byte_aligned()
    }

    #[inline(always)]
    pub fn available(&mut self) -> Result<u64> {
        let pos = self.bs.position_in_bits()?;
        Ok(self.len - pos)
    }

    #[inline(always)]
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.bs.position_in_bits()?)
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

/// Write cursor over an owned, growable byte buffer.
///
/// The buffer grows as bits are written; [`into_vec`](Self::into_vec)
/// releases it to the caller once the stream is byte aligned.
pub struct BsIoVecWriter {
    bs: BitWriter<Vec<u8>, BigEndian>,
    bits: u64,
}

impl Default for BsIoVecWriter {
    fn default() -> Self {
        Self {
            bs: BitWriter::new(Vec::new()),
            bits: 0,
        }
    }
}

impl BsIoVecWriter {
    #[inline(always)]
    pub fn put(&mut self, bit: bool) -> Result<()> {
        self.bs.write_bit(bit)?;
        self.bits += 1;
        Ok(())
    }

    #[inline(always)]
    pub fn put_n<I: UnsignedInteger>(&mut self, value: I, n: u32) -> Result<()> {
        self.bs.write_unsigned_var(n, value)?;
        self.bits += u64::from(n);
        Ok(())
    }

    #[inline(always)]
    pub fn put_s<S: SignedInteger>(&mut self, value: S, n: u32) -> Result<()> {
        self.bs.write_signed_var(n, value)?;
        self.bits += u64::from(n);
        Ok(())
    }

    /// Emits zero bits up to the next byte boundary.
    pub fn write_trailing_bits(&mut self) -> Result<()> {
        while !self.byte_aligned() {
            self.put(false)?;
        }
        Ok(())
    }

    pub fn write_raw_bytes(&mut self, buf: &[u8]) -> Result<()> {
        if !self.byte_aligned() {
            bail!(BitstreamError::NotByteAligned);
        }
        self.bs.write_bytes(buf)?;
        self.bits += (buf.len() as u64) << 3;
        Ok(())
    }

    #[inline(always)]
    pub fn byte_aligned(&self) -> bool {
        self.bits % 8 == 0
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.bits
    }

    /// Detaches the written buffer, releasing ownership to the caller.
    pub fn into_vec(self) -> Result<Vec<u8>> {
        if !self.byte_aligned() {
            bail!(BitstreamError::NotByteAligned);
        }
        Ok(self.bs.into_writer())
    }
}

#[test]
fn read_msb_first() -> Result<()> {
    let mut bs = BsIoSliceReader::from_slice(&[0xFF, 0xF1, 0x50]);
    assert_eq!(bs.get_n::<u16>(12)?, 0xFFF);
    assert!(!bs.get()?);
    assert_eq!(bs.get_n::<u8>(2)?, 0b00);
    assert!(bs.get()?);
    assert_eq!(bs.available()?, 8);
    assert_eq!(bs.get_n::<u8>(8)?, 0x50);

    let err = bs.get_n::<u8>(1).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BitstreamError>(),
        Some(BitstreamError::NeedMoreData)
    ));
    Ok(())
}

#[test]
fn read_signed_extends() -> Result<()> {
    let mut bs = BsIoSliceReader::from_slice(&[0b1110_0110]);
    assert_eq!(bs.get_s::<i8>(3)?, -1);
    assert_eq!(bs.get_s::<i8>(3)?, 1);
    assert_eq!(bs.get_s::<i8>(2)?, -2);
    Ok(())
}

#[test]
fn peek_does_not_consume() -> Result<()> {
    let mut bs = BsIoSliceReader::from_slice(&[0xAB, 0xCD]);
    assert_eq!(bs.peek_n::<u16>(12)?, 0xABC);
    assert_eq!(bs.position()?, 0);
    assert_eq!(bs.get_n::<u16>(16)?, 0xABCD);
    Ok(())
}

#[test]
fn trailing_bits_must_be_zero() {
    let mut bs = BsIoSliceReader::from_slice(&[0b1010_0000]);
    bs.get_n::<u8>(3).unwrap();
    let err = bs.read_trailing_bits().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BitstreamError>(),
        Some(BitstreamError::BadAlignment)
    ));

    let mut bs = BsIoSliceReader::from_slice(&[0b1010_0000]);
    bs.get_n::<u8>(4).unwrap();
    bs.read_trailing_bits().unwrap();
    assert!(bs.byte_aligned());
}

#[test]
fn write_and_acquire() -> Result<()> {
    let mut bs = BsIoVecWriter::default();
    bs.put_n(0xFFFu16, 12)?;
    bs.put(false)?;
    bs.put_n(0u8, 2)?;
    bs.put(true)?;
    bs.write_trailing_bits()?;
    let buf = bs.into_vec()?;
    assert_eq!(buf, vec![0xFF, 0xF1]);
    Ok(())
}

#[test]
fn acquire_requires_alignment() {
    let mut bs = BsIoVecWriter::default();
    bs.put_n(3u8, 3).unwrap();
    assert!(bs.into_vec().is_err());
}

#[test]
fn raw_bytes_need_alignment_and_exact_length() -> Result<()> {
    let mut bw = BsIoVecWriter::default();
    bw.put_n(0xA5u8, 8)?;
    bw.write_raw_bytes(&[0x01, 0x02])?;
    let buf = bw.into_vec()?;
    assert_eq!(buf, vec![0xA5, 0x01, 0x02]);

    let mut bs = BsIoSliceReader::from_slice(&buf);
    bs.skip_n(8)?;
    let mut tail = [0u8; 2];
    bs.read_raw_bytes(&mut tail)?;
    assert_eq!(tail, [0x01, 0x02]);

    // A partial read is refused: all remaining bytes must be taken.
    let mut bs = BsIoSliceReader::from_slice(&buf);
    let mut short = [0u8; 2];
    let err = bs.read_raw_bytes(&mut short).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BitstreamError>(),
        Some(BitstreamError::RawLengthMismatch { .. })
    ));

    // Unaligned cursors cannot transfer raw bytes.
    let mut bs = BsIoSliceReader::from_slice(&buf);
    bs.skip_n(3)?;
    let err = bs.read_raw_bytes(&mut tail).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BitstreamError>(),
        Some(BitstreamError::NotByteAligned)
    ));
    Ok(())
}
