//! Huffman codebooks for scalefactor and spectral data.
//!
//! One scalefactor codebook of 121 entries plus eleven spectral codebooks
//! (section codebook ids 1 to 11). Entries are `(codeword, code length)` in
//! symbol-index order; lookup is prefix match by bit-at-a-time consumption,
//! shortest codes first. Spectral books carry their dequantization
//! parameters (dimension, largest absolute value, signedness); book 11
//! additionally supports escape-coded magnitudes.

use anyhow::{Result, bail};

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::SyntaxError;

/// Codebook id of the escape codebook.
pub const ESC_HCB: u8 = 11;

/// Magnitude marking an escape-coded coefficient in book 11.
pub const ESC_FLAG: i32 = 16;

/// Largest representable quantized value; escape overflow yields one more.
pub const MAX_QUANTIZED_VALUE: i32 = 8191;

/// Spectral codebook parameters (Table 4.132).
pub struct SpectralCodebook {
    pub id: u8,
    pub dimension: u8,
    pub lav: i32,
    pub signed: bool,
    entries: &'static [(u32, u8)],
}

pub static HCB_LIST: [SpectralCodebook; 11] = [
    SpectralCodebook { id: 1, dimension: 4, lav: 1, signed: true, entries: &HCB1 },
    SpectralCodebook { id: 2, dimension: 4, lav: 1, signed: true, entries: &HCB2 },
    SpectralCodebook { id: 3, dimension: 4, lav: 2, signed: false, entries: &HCB3 },
    SpectralCodebook { id: 4, dimension: 4, lav: 2, signed: false, entries: &HCB4 },
    SpectralCodebook { id: 5, dimension: 2, lav: 4, signed: true, entries: &HCB5 },
    SpectralCodebook { id: 6, dimension: 2, lav: 4, signed: true, entries: &HCB6 },
    SpectralCodebook { id: 7, dimension: 2, lav: 7, signed: false, entries: &HCB7 },
    SpectralCodebook { id: 8, dimension: 2, lav: 7, signed: false, entries: &HCB8 },
    SpectralCodebook { id: 9, dimension: 2, lav: 12, signed: false, entries: &HCB9 },
    SpectralCodebook { id: 10, dimension: 2, lav: 12, signed: false, entries: &HCB10 },
    SpectralCodebook { id: 11, dimension: 2, lav: 16, signed: false, entries: &HCB11 },
];

pub fn spectral_codebook(id: u8) -> Result<&'static SpectralCodebook> {
    HCB_LIST
        .iter()
        .find(|cb| cb.id == id)
        .ok_or_else(|| SyntaxError::CodeNotFound(id).into())
}

/// Matches one codeword against `entries`, consuming bits as it goes.
///
/// Returns the symbol index of the matched entry.
fn prefix_match(bs: &mut BsIoSliceReader, entries: &[(u32, u8)], id: u8) -> Result<usize> {
    let max_len = entries.iter().map(|e| e.1).max().unwrap_or(0);
    let mut cw: u32 = 0;
    for len in 1..=max_len {
        cw = (cw << 1) | u32::from(bs.get()?);
        for (index, &(code, code_len)) in entries.iter().enumerate() {
            if code_len == len && code == cw {
                return Ok(index);
            }
        }
    }
    bail!(SyntaxError::CodeNotFound(id))
}

/// Decodes one scalefactor codeword, returning the codebook index (0..=120).
pub fn decode_scale_factor(bs: &mut BsIoSliceReader) -> Result<i64> {
    prefix_match(bs, &HCB_SF, 0).map(|index| index as i64)
}

/// Emits the scalefactor codeword for codebook index `index`.
pub fn encode_scale_factor(
    bw: &mut crate::utils::bitstream_io::BsIoVecWriter,
    index: i64,
) -> Result<()> {
    let Ok(index) = usize::try_from(index) else {
        bail!(SyntaxError::ScaleFactorOutOfRange(index));
    };
    let Some(&(code, len)) = HCB_SF.get(index) else {
        bail!(SyntaxError::ScaleFactorOutOfRange(index as i64));
    };
    bw.put_n(code, u32::from(len))
}

/// Splits a symbol index into its 2 or 4 quantized components.
pub fn unpack_index(cb: &SpectralCodebook, index: usize) -> (i32, i32, i32, i32) {
    let (modulus, off) = if cb.signed {
        (2 * cb.lav + 1, cb.lav)
    } else {
        (cb.lav + 1, 0)
    };
    let mut idx = index as i32;
    let mut unpack = |weight: i32| {
        let v = idx / weight - off;
        idx -= (v + off) * weight;
        v
    };
    if cb.dimension == 4 {
        let w = unpack(modulus * modulus * modulus);
        let x = unpack(modulus * modulus);
        let y = unpack(modulus);
        let z = unpack(1);
        (w, x, y, z)
    } else {
        let y = unpack(modulus);
        let z = unpack(1);
        (0, 0, y, z)
    }
}

/// Decodes one spectral codeword plus the sign bits of an unsigned book.
pub fn decode_spectral(
    bs: &mut BsIoSliceReader,
    cb: &SpectralCodebook,
) -> Result<(i32, i32, i32, i32)> {
    let index = prefix_match(bs, cb.entries, cb.id)?;
    let (mut w, mut x, mut y, mut z) = unpack_index(cb, index);
    if !cb.signed {
        if cb.dimension == 4 {
            if w != 0 && bs.get()? {
                w = -w;
            }
            if x != 0 && bs.get()? {
                x = -x;
            }
        }
        if y != 0 && bs.get()? {
            y = -y;
        }
        if z != 0 && bs.get()? {
            z = -z;
        }
    }
    Ok((w, x, y, z))
}

/// Reads an escape-coded magnitude: a unary prefix growing the field width
/// from 4 bits, then the raw magnitude bits. An exhausted prefix yields
/// `MAX_QUANTIZED_VALUE + 1`.
pub fn read_escape(bs: &mut BsIoSliceReader, minus: bool) -> Result<i32> {
    let mut width = 4u32;
    while width < 13 {
        if !bs.get()? {
            break;
        }
        width += 1;
    }
    if width == 13 {
        return Ok(MAX_QUANTIZED_VALUE + 1);
    }
    let raw: u32 = bs.get_n(width)?;
    let value = (raw + (1 << width)) as i32;
    Ok(if minus { -value } else { value })
}

static HCB_SF: [(u32, u8); 121] = [
    (0x3ffe8, 18), (0x3ffe6, 18), (0x3ffe7, 18), (0x3ffe5, 18),
    (0x7fff5, 19), (0x7fff1, 19), (0x7ffed, 19), (0x7fff6, 19),
    (0x7ffee, 19), (0x7ffef, 19), (0x7fff0, 19), (0x7fffc, 19),
    (0x7fffd, 19), (0x7ffff, 19), (0x7fffe, 19), (0x7fff7, 19),
    (0x7fff8, 19), (0x7fffb, 19), (0x7fff9, 19), (0x3ffe4, 18),
    (0x7fffa, 19), (0x3ffe3, 18), (0x1ffef, 17), (0x1fff0, 17),
    (0xfff5, 16), (0x1ffee, 17), (0xfff2, 16), (0xfff3, 16),
    (0xfff4, 16), (0xfff1, 16), (0x7ff6, 15), (0x7ff7, 15),
    (0x3ff9, 14), (0x3ff5, 14), (0x3ff7, 14), (0x3ff3, 14),
    (0x3ff6, 14), (0x3ff2, 14), (0x1ff7, 13), (0x1ff5, 13),
    (0xff9, 12), (0xff7, 12), (0xff6, 12), (0x7f9, 11),
    (0xff4, 12), (0x7f8, 11), (0x3f9, 10), (0x3f7, 10),
    (0x3f5, 10), (0x1f8, 9), (0x1f7, 9), (0xfa, 8),
    (0xf8, 8), (0xf6, 8), (0x79, 7), (0x3a, 6),
    (0x38, 6), (0x1a, 5), (0xb, 4), (0x4, 3),
    (0x0, 1), (0xa, 4), (0xc, 4), (0x1b, 5),
    (0x39, 6), (0x3b, 6), (0x78, 7), (0x7a, 7),
    (0xf7, 8), (0xf9, 8), (0x1f6, 9), (0x1f9, 9),
    (0x3f4, 10), (0x3f6, 10), (0x3f8, 10), (0x7f5, 11),
    (0x7f4, 11), (0x7f6, 11), (0x7f7, 11), (0xff5, 12),
    (0xff8, 12), (0x1ff4, 13), (0x1ff6, 13), (0x1ff8, 13),
    (0x3ff8, 14), (0x3ff4, 14), (0xfff0, 16), (0x7ff4, 15),
    (0xfff6, 16), (0x7ff5, 15), (0x3ffe2, 18), (0x7ffd9, 19),
    (0x7ffda, 19), (0x7ffdb, 19), (0x7ffdc, 19), (0x7ffdd, 19),
    (0x7ffde, 19), (0x7ffd8, 19), (0x7ffd2, 19), (0x7ffd3, 19),
    (0x7ffd4, 19), (0x7ffd5, 19), (0x7ffd6, 19), (0x7fff2, 19),
    (0x7ffdf, 19), (0x7ffe0, 19), (0x7ffe1, 19), (0x7ffe2, 19),
    (0x7ffe3, 19), (0x7ffe4, 19), (0x7ffe5, 19), (0x7ffe6, 19),
    (0x7ffe7, 19), (0x7ffe8, 19), (0x7ffe9, 19), (0x7ffea, 19),
    (0x7ffeb, 19), (0x7ffec, 19), (0x7fff4, 19), (0x7fff3, 19),
    (0x7ffd7, 19),
];

static HCB1: [(u32, u8); 81] = [
    (0x7d0, 11), (0x1e0, 9), (0x7d1, 11), (0x3d0, 10),
    (0x60, 7), (0x3d1, 10), (0x7d2, 11), (0x1e1, 9),
    (0x7d3, 11), (0x3d2, 10), (0x61, 7), (0x3d3, 10),
    (0x62, 7), (0x10, 5), (0x63, 7), (0x3d4, 10),
    (0x64, 7), (0x3d5, 10), (0x7d4, 11), (0x1e2, 9),
    (0x7d5, 11), (0x3d6, 10), (0x65, 7), (0x3d7, 10),
    (0x7d6, 11), (0x1e3, 9), (0x7d7, 11), (0x3d8, 10),
    (0x66, 7), (0x3d9, 10), (0x67, 7), (0x11, 5),
    (0x68, 7), (0x3da, 10), (0x69, 7), (0x3db, 10),
    (0x6a, 7), (0x12, 5), (0x6b, 7), (0x13, 5),
    (0x0, 1), (0x14, 5), (0x6c, 7), (0x15, 5),
    (0x6d, 7), (0x3dc, 10), (0x6e, 7), (0x3dd, 10),
    (0x6f, 7), (0x16, 5), (0x70, 7), (0x3de, 10),
    (0x71, 7), (0x3df, 10), (0x7d8, 11), (0x1e4, 9),
    (0x7d9, 11), (0x3e0, 10), (0x72, 7), (0x3e1, 10),
    (0x7da, 11), (0x1e5, 9), (0x7db, 11), (0x3e2, 10),
    (0x73, 7), (0x3e3, 10), (0x74, 7), (0x17, 5),
    (0x75, 7), (0x3e4, 10), (0x76, 7), (0x3e5, 10),
    (0x7dc, 11), (0x1e6, 9), (0x7dd, 11), (0x3e6, 10),
    (0x77, 7), (0x3e7, 10), (0x7de, 11), (0x1e7, 9),
    (0x7df, 11),
];

static HCB2: [(u32, u8); 81] = [
    (0x1d6, 9), (0x60, 7), (0x1d7, 9), (0xd2, 8),
    (0x18, 6), (0xd3, 8), (0x1d8, 9), (0xd4, 8),
    (0x1d9, 9), (0xd5, 8), (0x19, 6), (0x61, 7),
    (0x1a, 6), (0x4, 5), (0x1b, 6), (0x62, 7),
    (0x1c, 6), (0xd6, 8), (0x1da, 9), (0x63, 7),
    (0xd7, 8), (0xd8, 8), (0x1d, 6), (0xd9, 8),
    (0x1db, 9), (0x64, 7), (0x1dc, 9), (0xda, 8),
    (0x1e, 6), (0xdb, 8), (0x1f, 6), (0x5, 5),
    (0x20, 6), (0xdc, 8), (0x21, 6), (0xdd, 8),
    (0x22, 6), (0x6, 5), (0x23, 6), (0x7, 5),
    (0x0, 3), (0x8, 5), (0x24, 6), (0x9, 5),
    (0x25, 6), (0xde, 8), (0x26, 6), (0xdf, 8),
    (0x27, 6), (0xa, 5), (0x28, 6), (0xe0, 8),
    (0x29, 6), (0xe1, 8), (0x1dd, 9), (0x65, 7),
    (0x1de, 9), (0xe2, 8), (0x2a, 6), (0xe3, 8),
    (0xe4, 8), (0x66, 7), (0x1df, 9), (0xe5, 8),
    (0x2b, 6), (0xe6, 8), (0x2c, 6), (0xb, 5),
    (0x2d, 6), (0x67, 7), (0x2e, 6), (0xe7, 8),
    (0x1e0, 9), (0xe8, 8), (0x1e1, 9), (0xe9, 8),
    (0x2f, 6), (0xea, 8), (0x1e2, 9), (0x68, 7),
    (0x1e3, 9),
];

static HCB3: [(u32, u8); 81] = [
    (0x0, 1), (0x8, 4), (0xf8, 8), (0x9, 4),
    (0x18, 5), (0xf9, 8), (0xffc0, 16), (0xffc1, 16),
    (0xffc2, 16), (0xa, 4), (0x36, 6), (0xffc3, 16),
    (0x37, 6), (0x38, 6), (0xffc4, 16), (0xffc5, 16),
    (0xffc6, 16), (0xffc7, 16), (0xffc8, 16), (0xffc9, 16),
    (0xffca, 16), (0xffcb, 16), (0xffcc, 16), (0xffcd, 16),
    (0xffce, 16), (0xffcf, 16), (0xffd0, 16), (0xb, 4),
    (0x19, 5), (0xffd1, 16), (0x1a, 5), (0x39, 6),
    (0xffd2, 16), (0xffd3, 16), (0xfa, 8), (0xffd4, 16),
    (0x3a, 6), (0x3b, 6), (0xffd5, 16), (0x3c, 6),
    (0x3d, 6), (0xffd6, 16), (0xffd7, 16), (0xffd8, 16),
    (0xffd9, 16), (0xffda, 16), (0xffdb, 16), (0xffdc, 16),
    (0xfb, 8), (0xffdd, 16), (0xffde, 16), (0xffdf, 16),
    (0xffe0, 16), (0xffe1, 16), (0xfc, 8), (0xffe2, 16),
    (0xffe3, 16), (0xffe4, 16), (0x3fe, 10), (0xffe5, 16),
    (0xffe6, 16), (0xffe7, 16), (0xffe8, 16), (0x1fc, 9),
    (0x1fd, 9), (0xffe9, 16), (0xfd, 8), (0x1fe, 9),
    (0xffea, 16), (0xffeb, 16), (0xffec, 16), (0xffed, 16),
    (0xffee, 16), (0xffef, 16), (0xfff0, 16), (0xfff1, 16),
    (0xfff2, 16), (0xfff3, 16), (0xfff4, 16), (0xfff5, 16),
    (0xfff6, 16),
];

static HCB4: [(u32, u8); 81] = [
    (0x0, 4), (0x12, 5), (0xd8, 8), (0x13, 5),
    (0x1, 4), (0xd9, 8), (0x1dc, 9), (0xda, 8),
    (0x7ae, 11), (0x14, 5), (0x15, 5), (0xdb, 8),
    (0x16, 5), (0x2, 4), (0xdc, 8), (0xdd, 8),
    (0x64, 7), (0x3ca, 10), (0x1dd, 9), (0xde, 8),
    (0x7af, 11), (0xdf, 8), (0xe0, 8), (0x3cb, 10),
    (0x7b0, 11), (0x3cc, 10), (0x7b1, 11), (0x17, 5),
    (0x18, 5), (0xe1, 8), (0x3, 4), (0x4, 4),
    (0xe2, 8), (0xe3, 8), (0xe4, 8), (0x3cd, 10),
    (0x5, 4), (0x6, 4), (0xe5, 8), (0x7, 4),
    (0x8, 4), (0x65, 7), (0xe6, 8), (0x66, 7),
    (0x1de, 9), (0xe7, 8), (0xe8, 8), (0x3ce, 10),
    (0x67, 7), (0x68, 7), (0x1df, 9), (0x3cf, 10),
    (0x1e0, 9), (0x3d0, 10), (0xe9, 8), (0xea, 8),
    (0x7b2, 11), (0xeb, 8), (0xec, 8), (0x3d1, 10),
    (0x7b3, 11), (0x3d2, 10), (0xf70, 12), (0xed, 8),
    (0x69, 7), (0x3d3, 10), (0x6a, 7), (0x6b, 7),
    (0x1e1, 9), (0x3d4, 10), (0x1e2, 9), (0x7b4, 11),
    (0x7b5, 11), (0x3d5, 10), (0xf71, 12), (0x1e3, 9),
    (0x1e4, 9), (0x7b6, 11), (0x7b7, 11), (0x3d6, 10),
    (0xf72, 12),
];

static HCB5: [(u32, u8); 81] = [
    (0x1fec, 13), (0xfea, 12), (0x7e4, 11), (0x7e5, 11),
    (0x3e6, 10), (0x7e6, 11), (0x7e7, 11), (0xfeb, 12),
    (0x1fed, 13), (0xfec, 12), (0x7e8, 11), (0x3e7, 10),
    (0x1e8, 9), (0xe8, 8), (0x1e9, 9), (0x3e8, 10),
    (0x7e9, 11), (0xfed, 12), (0xfee, 12), (0x3e9, 10),
    (0x1ea, 9), (0xe9, 8), (0x70, 7), (0xea, 8),
    (0x1eb, 9), (0x3ea, 10), (0x7ea, 11), (0x7eb, 11),
    (0x1ec, 9), (0xeb, 8), (0x18, 5), (0x8, 4),
    (0x19, 5), (0xec, 8), (0x1ed, 9), (0x7ec, 11),
    (0x3eb, 10), (0xed, 8), (0x71, 7), (0x9, 4),
    (0x0, 1), (0xa, 4), (0x72, 7), (0xee, 8),
    (0x7ed, 11), (0x7ee, 11), (0x1ee, 9), (0xef, 8),
    (0x1a, 5), (0xb, 4), (0x1b, 5), (0xf0, 8),
    (0x3ec, 10), (0x7ef, 11), (0x7f0, 11), (0x3ed, 10),
    (0x1ef, 9), (0xf1, 8), (0x73, 7), (0xf2, 8),
    (0x1f0, 9), (0x3ee, 10), (0xfef, 12), (0xff0, 12),
    (0x7f1, 11), (0x3ef, 10), (0x1f1, 9), (0xf3, 8),
    (0x1f2, 9), (0x3f0, 10), (0x7f2, 11), (0xff1, 12),
    (0x1fee, 13), (0xff2, 12), (0xff3, 12), (0x7f3, 11),
    (0x3f1, 10), (0x7f4, 11), (0xff4, 12), (0xff5, 12),
    (0x1fef, 13),
];

static HCB6: [(u32, u8); 81] = [
    (0x7f0, 11), (0x3f0, 10), (0x1e0, 9), (0x1e1, 9),
    (0x1e2, 9), (0x1e3, 9), (0x1e4, 9), (0x3f1, 10),
    (0x7f1, 11), (0x3f2, 10), (0x1e5, 9), (0xe8, 8),
    (0x68, 7), (0x69, 7), (0x6a, 7), (0xe9, 8),
    (0x1e6, 9), (0x3f3, 10), (0x1e7, 9), (0xea, 8),
    (0x24, 6), (0x25, 6), (0x26, 6), (0x27, 6),
    (0x28, 6), (0xeb, 8), (0x1e8, 9), (0x1e9, 9),
    (0x6b, 7), (0x29, 6), (0x0, 4), (0x1, 4),
    (0x2, 4), (0x2a, 6), (0x6c, 7), (0x1ea, 9),
    (0x1eb, 9), (0x6d, 7), (0x2b, 6), (0x3, 4),
    (0x4, 4), (0x5, 4), (0x2c, 6), (0x6e, 7),
    (0x1ec, 9), (0x1ed, 9), (0x6f, 7), (0x2d, 6),
    (0x6, 4), (0x7, 4), (0x8, 4), (0x2e, 6),
    (0x70, 7), (0x1ee, 9), (0x1ef, 9), (0xec, 8),
    (0x2f, 6), (0x30, 6), (0x31, 6), (0x32, 6),
    (0x33, 6), (0xed, 8), (0x1f0, 9), (0x3f4, 10),
    (0x1f1, 9), (0xee, 8), (0x71, 7), (0x72, 7),
    (0x73, 7), (0xef, 8), (0x1f2, 9), (0x3f5, 10),
    (0x7f2, 11), (0x3f6, 10), (0x1f3, 9), (0x1f4, 9),
    (0x1f5, 9), (0x1f6, 9), (0x1f7, 9), (0x3f7, 10),
    (0x7f3, 11),
];

static HCB7: [(u32, u8); 64] = [
    (0x0, 1), (0x4, 3), (0x34, 6), (0x70, 7),
    (0xea, 8), (0x1e8, 9), (0x3ee, 10), (0xffa, 12),
    (0x5, 3), (0xc, 4), (0x35, 6), (0x71, 7),
    (0xeb, 8), (0xec, 8), (0x1e9, 9), (0x1ea, 9),
    (0x36, 6), (0x37, 6), (0x72, 7), (0xed, 8),
    (0xee, 8), (0x1eb, 9), (0x1ec, 9), (0x3ef, 10),
    (0x73, 7), (0x74, 7), (0xef, 8), (0xf0, 8),
    (0x1ed, 9), (0x1ee, 9), (0x3f0, 10), (0x3f1, 10),
    (0xf1, 8), (0xf2, 8), (0x1ef, 9), (0x1f0, 9),
    (0x3f2, 10), (0x3f3, 10), (0x3f4, 10), (0xffb, 12),
    (0xf3, 8), (0x1f1, 9), (0x1f2, 9), (0x3f5, 10),
    (0x3f6, 10), (0xffc, 12), (0x7f6, 11), (0x7f7, 11),
    (0x1f3, 9), (0x1f4, 9), (0x3f7, 10), (0x3f8, 10),
    (0x7f8, 11), (0x7f9, 11), (0x7fa, 11), (0xffd, 12),
    (0x1f5, 9), (0x1f6, 9), (0x3f9, 10), (0x3fa, 10),
    (0x7fb, 11), (0x7fc, 11), (0xffe, 12), (0xfff, 12),
];

static HCB8: [(u32, u8); 64] = [
    (0xe, 5), (0x2, 4), (0xf, 5), (0x2a, 6),
    (0x68, 7), (0xec, 8), (0x1f6, 9), (0x3fa, 10),
    (0x3, 4), (0x0, 3), (0x4, 4), (0x10, 5),
    (0x2b, 6), (0x69, 7), (0x6a, 7), (0xed, 8),
    (0x11, 5), (0x5, 4), (0x6, 4), (0x12, 5),
    (0x2c, 6), (0x6b, 7), (0x6c, 7), (0xee, 8),
    (0x2d, 6), (0x13, 5), (0x14, 5), (0x2e, 6),
    (0x2f, 6), (0x6d, 7), (0xef, 8), (0xf0, 8),
    (0x6e, 7), (0x30, 6), (0x31, 6), (0x32, 6),
    (0x6f, 7), (0x70, 7), (0xf1, 8), (0x1f7, 9),
    (0xf2, 8), (0x71, 7), (0x33, 6), (0x72, 7),
    (0x73, 7), (0xf3, 8), (0xf4, 8), (0x3fb, 10),
    (0x1f8, 9), (0x74, 7), (0x75, 7), (0xf5, 8),
    (0xf6, 8), (0xf7, 8), (0x1f9, 9), (0x3fc, 10),
    (0x3fd, 10), (0xf8, 8), (0xf9, 8), (0xfa, 8),
    (0x1fa, 9), (0x1fb, 9), (0x1fc, 9), (0x3fe, 10),
];

static HCB9: [(u32, u8); 169] = [
    (0x0, 1), (0x4, 3), (0x34, 6), (0xe6, 8),
    (0x1e0, 9), (0x3d6, 10), (0x3d7, 10), (0x7dc, 11),
    (0x7dd, 11), (0x7fb4, 15), (0x7fb5, 15), (0x7fb6, 15),
    (0x7fb7, 15), (0x5, 3), (0xc, 4), (0x35, 6),
    (0x70, 7), (0xe7, 8), (0xe8, 8), (0x1e1, 9),
    (0x3d8, 10), (0x3d9, 10), (0x3da, 10), (0x7de, 11),
    (0x7fb8, 15), (0x7fb9, 15), (0x36, 6), (0x37, 6),
    (0x71, 7), (0xe9, 8), (0xea, 8), (0x1e2, 9),
    (0x1e3, 9), (0x3db, 10), (0x3dc, 10), (0x7df, 11),
    (0x7fba, 15), (0x7fbb, 15), (0x7fbc, 15), (0xeb, 8),
    (0x72, 7), (0xec, 8), (0x1e4, 9), (0x1e5, 9),
    (0x3dd, 10), (0x3de, 10), (0x7e0, 11), (0x7e1, 11),
    (0x7e2, 11), (0x7fbd, 15), (0x7fbe, 15), (0x7fbf, 15),
    (0x1e6, 9), (0xed, 8), (0xee, 8), (0x1e7, 9),
    (0x3df, 10), (0x3e0, 10), (0x3e1, 10), (0x7e3, 11),
    (0x7e4, 11), (0x7fc0, 15), (0x7fc1, 15), (0x7fc2, 15),
    (0x7fc3, 15), (0x3e2, 10), (0xef, 8), (0x1e8, 9),
    (0x3e3, 10), (0x3e4, 10), (0x3e5, 10), (0x7e5, 11),
    (0x7e6, 11), (0x7e7, 11), (0x7fc4, 15), (0x7fc5, 15),
    (0x7fc6, 15), (0x7fc7, 15), (0x3e6, 10), (0x1e9, 9),
    (0x1ea, 9), (0x3e7, 10), (0x3e8, 10), (0x7e8, 11),
    (0x7e9, 11), (0x7fc8, 15), (0x7fc9, 15), (0x7fca, 15),
    (0x7fcb, 15), (0x7fcc, 15), (0x7fcd, 15), (0x7ea, 11),
    (0x3e9, 10), (0x3ea, 10), (0x7eb, 11), (0x7ec, 11),
    (0x7ed, 11), (0x7fce, 15), (0x7fcf, 15), (0x7fd0, 15),
    (0x7fd1, 15), (0x7fd2, 15), (0x7fd3, 15), (0x7fd4, 15),
    (0x7ee, 11), (0x3eb, 10), (0x3ec, 10), (0x7ef, 11),
    (0x7f0, 11), (0x7fd5, 15), (0x7fd6, 15), (0x7fd7, 15),
    (0x7fd8, 15), (0x7fd9, 15), (0x7fda, 15), (0x7fdb, 15),
    (0x7fdc, 15), (0x1fec, 13), (0x3ed, 10), (0x7f1, 11),
    (0x7f2, 11), (0xfea, 12), (0xfeb, 12), (0xfec, 12),
    (0x7fdd, 15), (0x7fde, 15), (0x7fdf, 15), (0x7fe0, 15),
    (0x7fe1, 15), (0x7fe2, 15), (0xfed, 12), (0x7f3, 11),
    (0x7f4, 11), (0xfee, 12), (0xfef, 12), (0xff0, 12),
    (0x7fe3, 15), (0x7fe4, 15), (0x7fe5, 15), (0x7fe6, 15),
    (0x7fe7, 15), (0x7fe8, 15), (0x7fe9, 15), (0x7fea, 15),
    (0xff1, 12), (0xff2, 12), (0xff3, 12), (0x7feb, 15),
    (0x7fec, 15), (0x7fed, 15), (0x7fee, 15), (0x7fef, 15),
    (0x7ff0, 15), (0x7ff1, 15), (0x7ff2, 15), (0x7ff3, 15),
    (0x7ff4, 15), (0xff4, 12), (0xff5, 12), (0x7ff5, 15),
    (0x7ff6, 15), (0x7ff7, 15), (0x7ff8, 15), (0x7ff9, 15),
    (0x7ffa, 15), (0x7ffb, 15), (0x7ffc, 15), (0x7ffd, 15),
    (0x7ffe, 15),
];

static HCB10: [(u32, u8); 169] = [
    (0x1a, 6), (0x6, 5), (0x1b, 6), (0x1c, 6),
    (0x50, 7), (0xc2, 8), (0x1b8, 9), (0x3ac, 10),
    (0x3ad, 10), (0x3ae, 10), (0x7aa, 11), (0x7ab, 11),
    (0xf86, 12), (0x7, 5), (0x0, 4), (0x1, 4),
    (0x8, 5), (0x1d, 6), (0x51, 7), (0x52, 7),
    (0xc3, 8), (0xc4, 8), (0x1b9, 9), (0x3af, 10),
    (0x3b0, 10), (0x7ac, 11), (0x1e, 6), (0x2, 4),
    (0x9, 5), (0xa, 5), (0x1f, 6), (0x20, 6),
    (0x53, 7), (0x54, 7), (0xc5, 8), (0xc6, 8),
    (0x1ba, 9), (0x3b1, 10), (0x3b2, 10), (0x21, 6),
    (0xb, 5), (0xc, 5), (0x22, 6), (0x23, 6),
    (0x55, 7), (0x56, 7), (0xc7, 8), (0xc8, 8),
    (0x1bb, 9), (0x1bc, 9), (0x3b3, 10), (0x3b4, 10),
    (0x57, 7), (0x24, 6), (0x25, 6), (0x26, 6),
    (0x58, 7), (0x59, 7), (0xc9, 8), (0xca, 8),
    (0xcb, 8), (0x1bd, 9), (0x1be, 9), (0x3b5, 10),
    (0x3b6, 10), (0xcc, 8), (0x5a, 7), (0x27, 6),
    (0x5b, 7), (0x5c, 7), (0xcd, 8), (0xce, 8),
    (0xcf, 8), (0x1bf, 9), (0x1c0, 9), (0x3b7, 10),
    (0x3b8, 10), (0x7ad, 11), (0x1c1, 9), (0x5d, 7),
    (0x5e, 7), (0x5f, 7), (0xd0, 8), (0xd1, 8),
    (0xd2, 8), (0x1c2, 9), (0x1c3, 9), (0x1c4, 9),
    (0x3b9, 10), (0x3ba, 10), (0x7ae, 11), (0x1c5, 9),
    (0xd3, 8), (0x60, 7), (0xd4, 8), (0xd5, 8),
    (0xd6, 8), (0x1c6, 9), (0x1c7, 9), (0x1c8, 9),
    (0x3bb, 10), (0x3bc, 10), (0x3bd, 10), (0x7af, 11),
    (0x3be, 10), (0xd7, 8), (0xd8, 8), (0xd9, 8),
    (0xda, 8), (0x1c9, 9), (0x1ca, 9), (0x1cb, 9),
    (0x3bf, 10), (0x3c0, 10), (0x3c1, 10), (0x7b0, 11),
    (0x7b1, 11), (0x3c2, 10), (0x1cc, 9), (0xdb, 8),
    (0x1cd, 9), (0x1ce, 9), (0x1cf, 9), (0x1d0, 9),
    (0x3c3, 10), (0x3c4, 10), (0x3c5, 10), (0x3c6, 10),
    (0x7b2, 11), (0x7b3, 11), (0x7b4, 11), (0x1d1, 9),
    (0x1d2, 9), (0x1d3, 9), (0x1d4, 9), (0x3c7, 10),
    (0x3c8, 10), (0x3c9, 10), (0x3ca, 10), (0x7b5, 11),
    (0x7b6, 11), (0x7b7, 11), (0xf87, 12), (0x7b8, 11),
    (0x3cb, 10), (0x1d5, 9), (0x3cc, 10), (0x3cd, 10),
    (0x3ce, 10), (0x3cf, 10), (0x3d0, 10), (0x7b9, 11),
    (0x7ba, 11), (0x7bb, 11), (0x7bc, 11), (0xf88, 12),
    (0x7bd, 11), (0x3d1, 10), (0x3d2, 10), (0x3d3, 10),
    (0x3d4, 10), (0x7be, 11), (0x7bf, 11), (0x7c0, 11),
    (0x7c1, 11), (0x7c2, 11), (0xf89, 12), (0xf8a, 12),
    (0xf8b, 12),
];

static HCB11: [(u32, u8); 289] = [
    (0x0, 4), (0x1, 4), (0x2, 4), (0xc, 5),
    (0xd, 5), (0xe, 5), (0xee0, 12), (0xee1, 12),
    (0xee2, 12), (0xee3, 12), (0xee4, 12), (0xee5, 12),
    (0xee6, 12), (0xee7, 12), (0xee8, 12), (0xee9, 12),
    (0xeea, 12), (0x3, 4), (0x4, 4), (0xf, 5),
    (0x10, 5), (0x11, 5), (0x76, 7), (0x30, 6),
    (0x31, 6), (0xeeb, 12), (0xeec, 12), (0xeed, 12),
    (0xeee, 12), (0xeef, 12), (0xef0, 12), (0xef1, 12),
    (0xef2, 12), (0xef3, 12), (0x5, 4), (0x12, 5),
    (0x32, 6), (0x33, 6), (0xef4, 12), (0xef5, 12),
    (0xef6, 12), (0xef7, 12), (0xef8, 12), (0xef9, 12),
    (0xefa, 12), (0xefb, 12), (0xefc, 12), (0xefd, 12),
    (0xefe, 12), (0xeff, 12), (0xf00, 12), (0x13, 5),
    (0x14, 5), (0x34, 6), (0xf01, 12), (0xf02, 12),
    (0xf03, 12), (0xf04, 12), (0xf05, 12), (0xf06, 12),
    (0xf07, 12), (0xf08, 12), (0xf09, 12), (0xf0a, 12),
    (0xf0b, 12), (0xf0c, 12), (0xf0d, 12), (0xf0e, 12),
    (0x15, 5), (0x16, 5), (0xf0f, 12), (0xf10, 12),
    (0xf11, 12), (0xf12, 12), (0xf13, 12), (0xf14, 12),
    (0xf15, 12), (0xf16, 12), (0xf17, 12), (0xf18, 12),
    (0xf19, 12), (0xf1a, 12), (0xf1b, 12), (0xf1c, 12),
    (0xf1d, 12), (0x17, 5), (0x35, 6), (0xf1e, 12),
    (0xf1f, 12), (0xf20, 12), (0xf21, 12), (0xf22, 12),
    (0xf23, 12), (0xf24, 12), (0xf25, 12), (0xf26, 12),
    (0xf27, 12), (0xf28, 12), (0xf29, 12), (0xf2a, 12),
    (0xf2b, 12), (0xf2c, 12), (0x36, 6), (0x37, 6),
    (0xf2d, 12), (0xf2e, 12), (0xf2f, 12), (0xf30, 12),
    (0xf31, 12), (0xf32, 12), (0xf33, 12), (0xf34, 12),
    (0xf35, 12), (0xf36, 12), (0xf37, 12), (0xf38, 12),
    (0xf39, 12), (0xf3a, 12), (0xf3b, 12), (0x38, 6),
    (0x39, 6), (0xf3c, 12), (0xf3d, 12), (0xf3e, 12),
    (0xf3f, 12), (0xf40, 12), (0xf41, 12), (0xf42, 12),
    (0xf43, 12), (0xf44, 12), (0xf45, 12), (0xf46, 12),
    (0xf47, 12), (0xf48, 12), (0xf49, 12), (0xf4a, 12),
    (0x3a, 6), (0xf4b, 12), (0xf4c, 12), (0xf4d, 12),
    (0xf4e, 12), (0xf4f, 12), (0xf50, 12), (0xf51, 12),
    (0xf52, 12), (0xf53, 12), (0xf54, 12), (0xf55, 12),
    (0xf56, 12), (0xf57, 12), (0xf58, 12), (0xf59, 12),
    (0xf5a, 12), (0xf5b, 12), (0xf5c, 12), (0xf5d, 12),
    (0xf5e, 12), (0xf5f, 12), (0xf60, 12), (0xf61, 12),
    (0xf62, 12), (0xf63, 12), (0xf64, 12), (0xf65, 12),
    (0xf66, 12), (0xf67, 12), (0xf68, 12), (0xf69, 12),
    (0xf6a, 12), (0xf6b, 12), (0xf6c, 12), (0xf6d, 12),
    (0xf6e, 12), (0xf6f, 12), (0xf70, 12), (0xf71, 12),
    (0xf72, 12), (0xf73, 12), (0xf74, 12), (0xf75, 12),
    (0xf76, 12), (0xf77, 12), (0xf78, 12), (0xf79, 12),
    (0xf7a, 12), (0xf7b, 12), (0xf7c, 12), (0xf7d, 12),
    (0xf7e, 12), (0xf7f, 12), (0xf80, 12), (0xf81, 12),
    (0xf82, 12), (0xf83, 12), (0xf84, 12), (0xf85, 12),
    (0xf86, 12), (0xf87, 12), (0xf88, 12), (0xf89, 12),
    (0xf8a, 12), (0xf8b, 12), (0xf8c, 12), (0xf8d, 12),
    (0xf8e, 12), (0xf8f, 12), (0xf90, 12), (0xf91, 12),
    (0xf92, 12), (0xf93, 12), (0xf94, 12), (0xf95, 12),
    (0xf96, 12), (0xf97, 12), (0xf98, 12), (0xf99, 12),
    (0xf9a, 12), (0xf9b, 12), (0xf9c, 12), (0xf9d, 12),
    (0xf9e, 12), (0xf9f, 12), (0xfa0, 12), (0xfa1, 12),
    (0xfa2, 12), (0xfa3, 12), (0xfa4, 12), (0xfa5, 12),
    (0xfa6, 12), (0xfa7, 12), (0xfa8, 12), (0xfa9, 12),
    (0xfaa, 12), (0xfab, 12), (0xfac, 12), (0xfad, 12),
    (0xfae, 12), (0xfaf, 12), (0xfb0, 12), (0xfb1, 12),
    (0xfb2, 12), (0xfb3, 12), (0xfb4, 12), (0xfb5, 12),
    (0xfb6, 12), (0xfb7, 12), (0xfb8, 12), (0xfb9, 12),
    (0xfba, 12), (0xfbb, 12), (0xfbc, 12), (0xfbd, 12),
    (0xfbe, 12), (0xfbf, 12), (0xfc0, 12), (0xfc1, 12),
    (0xfc2, 12), (0xfc3, 12), (0xfc4, 12), (0xfc5, 12),
    (0xfc6, 12), (0xfc7, 12), (0xfc8, 12), (0xfc9, 12),
    (0xfca, 12), (0xfcb, 12), (0xfcc, 12), (0xfcd, 12),
    (0xfce, 12), (0xfcf, 12), (0xfd0, 12), (0xfd1, 12),
    (0xfd2, 12), (0xfd3, 12), (0xfd4, 12), (0xfd5, 12),
    (0xfd6, 12), (0xfd7, 12), (0xfd8, 12), (0xfd9, 12),
    (0xfda, 12), (0xfdb, 12), (0xfdc, 12), (0xfdd, 12),
    (0xfde, 12), (0xfdf, 12), (0xfe0, 12), (0xfe1, 12),
    (0xfe2, 12),
];


#[cfg(test)]
fn encode_entry(buf: &mut Vec<u8>, bitpos: &mut u32, code: u32, len: u8) {
    for i in (0..len).rev() {
        let bit = (code >> i) & 1;
        if *bitpos % 8 == 0 {
            buf.push(0);
        }
        let last = buf.len() - 1;
        buf[last] |= (bit as u8) << (7 - *bitpos % 8);
        *bitpos += 1;
    }
}

#[test]
fn scale_factor_zero_delta_is_one_bit() -> Result<()> {
    // Index 60 (dpcm delta 0) is the single-bit codeword.
    assert_eq!(HCB_SF[60], (0x0, 1));
    let mut bs = BsIoSliceReader::from_slice(&[0x00]);
    assert_eq!(decode_scale_factor(&mut bs)?, 60);
    assert_eq!(bs.position()?, 1);
    Ok(())
}

#[test]
fn scale_factor_decode_after_encode() -> Result<()> {
    let mut bw = crate::utils::bitstream_io::BsIoVecWriter::default();
    for index in [0i64, 38, 59, 60, 61, 90, 120] {
        encode_scale_factor(&mut bw, index)?;
    }
    bw.write_trailing_bits()?;
    let buf = bw.into_vec()?;

    let mut bs = BsIoSliceReader::from_slice(&buf);
    for index in [0i64, 38, 59, 60, 61, 90, 120] {
        assert_eq!(decode_scale_factor(&mut bs)?, index);
    }
    Ok(())
}

#[test]
fn scale_factor_codebook_is_prefix_free() {
    for (i, &(code, len)) in HCB_SF.iter().enumerate() {
        for (j, &(other, other_len)) in HCB_SF.iter().enumerate() {
            if i == j {
                continue;
            }
            if other_len >= len {
                assert_ne!(other >> (other_len - len), code, "entries {i} and {j}");
            }
        }
    }
}

#[test]
fn unknown_code_fails() {
    // Codebook 2 is incomplete; an all-ones run exhausts it without a match.
    let cb = spectral_codebook(2).unwrap();
    let mut bs = BsIoSliceReader::from_slice(&[0xFF, 0xFF]);
    let err = decode_spectral(&mut bs, cb).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SyntaxError>(),
        Some(SyntaxError::CodeNotFound(2))
    ));
}

#[test]
fn unpack_signed_quad() {
    let cb = spectral_codebook(1).unwrap();
    assert_eq!((cb.dimension, cb.lav, cb.signed), (4, 1, true));
    // Index 40 is the all-zero quad of the 3^4 grid.
    assert_eq!(unpack_index(cb, 40), (0, 0, 0, 0));
    assert_eq!(unpack_index(cb, 0), (-1, -1, -1, -1));
    assert_eq!(unpack_index(cb, 80), (1, 1, 1, 1));
}

#[test]
fn unpack_unsigned_pair() {
    let cb = spectral_codebook(11).unwrap();
    assert_eq!((cb.dimension, cb.lav, cb.signed), (2, 16, false));
    assert_eq!(unpack_index(cb, 0), (0, 0, 0, 0));
    assert_eq!(unpack_index(cb, 16), (0, 0, 0, 16));
    assert_eq!(unpack_index(cb, 17 * 16 + 16), (0, 0, 16, 16));
}

#[test]
fn spectral_decode_signed_roundtrip() -> Result<()> {
    let cb = spectral_codebook(2).unwrap();
    let mut buf = Vec::new();
    let mut bitpos = 0;
    let (code, len) = cb.entries[40];
    encode_entry(&mut buf, &mut bitpos, code, len);
    while bitpos % 8 != 0 {
        bitpos += 1;
    }

    let mut bs = BsIoSliceReader::from_slice(&buf);
    assert_eq!(decode_spectral(&mut bs, cb)?, (0, 0, 0, 0));
    Ok(())
}

#[test]
fn spectral_decode_reads_sign_bits() -> Result<()> {
    let cb = spectral_codebook(7).unwrap();
    // Symbol (1, 1): both components nonzero, two sign bits follow.
    let index = 1 * 8 + 1;
    let (code, len) = cb.entries[index];
    let mut buf = Vec::new();
    let mut bitpos = 0;
    encode_entry(&mut buf, &mut bitpos, code, len);
    encode_entry(&mut buf, &mut bitpos, 0b10, 2); // y negative, z positive
    let mut bs = BsIoSliceReader::from_slice(&buf);
    assert_eq!(decode_spectral(&mut bs, cb)?, (0, 0, -1, 1));
    Ok(())
}

#[test]
fn escape_magnitudes() -> Result<()> {
    // No unary ones: 4-bit field, value 0b0101 -> 16 + 5.
    let mut bs = BsIoSliceReader::from_slice(&[0b0_0101_000]);
    assert_eq!(read_escape(&mut bs, false)?, 21);

    // One unary one: 5-bit field, all zero -> 32.
    let mut bs = BsIoSliceReader::from_slice(&[0b10_00000_0]);
    assert_eq!(read_escape(&mut bs, true)?, -32);

    // Exhausted prefix: overflow marker.
    let mut bs = BsIoSliceReader::from_slice(&[0xFF, 0xFF]);
    assert_eq!(read_escape(&mut bs, false)?, MAX_QUANTIZED_VALUE + 1);
    Ok(())
}
