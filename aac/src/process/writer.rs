//! Emission drivers: headers, configurations and silent frames.
//!
//! Each writer runs the syntax engine in write mode over a growable
//! cursor and returns the acquired buffer. Frame writers emit single
//! raw_data_block frames; header error-check data is never produced.

use std::mem;

use anyhow::{Result, bail};

use crate::ctx::Context;
use crate::format::DataFormat;
use crate::structs::MAX_SYN_ELE;
use crate::structs::adts::{Adts, adts_error_check};
use crate::structs::asc::Asc;
use crate::structs::element::{
    Cpe, EXT_TYPE_FILL, ExtensionPayload, Fil, RawDataBlock, Sce, SyntacticElement,
};
use crate::syntax::WriteOp;
use crate::utils::errors::{ConfigError, WriterError};

/// ADTS header length in bits without CRC.
const ADTS_HEADER_BITS: usize = 56;

/// Silent element payload lengths in bits, element id included.
const SILENT_SCE_BITS: usize = 29;
const SILENT_CPE_BITS: usize = 43;
const END_BITS: usize = 3;

/// Largest payload of one fill element, in bytes.
const MAX_FILL_PAYLOAD: usize = 269;

/// Serializes an AudioSpecificConfig, zero-padded to a whole byte count.
pub fn write_asc(asc: &Asc) -> Result<Vec<u8>> {
    let mut op = WriteOp::default();
    let mut asc = asc.clone();
    asc.syntax(&mut op)?;
    op.bw.write_trailing_bits()?;
    op.bw.into_vec()
}

/// Serializes a bare ADTS header.
pub fn write_adts(adts: &Adts) -> Result<Vec<u8>> {
    let mut op = WriteOp::default();
    let mut adts = adts.clone();
    adts.fixed_header(&mut op)?;
    adts.variable_header(&mut op)?;
    op.bw.write_trailing_bits()?;
    op.bw.into_vec()
}

/// Serializes the context's current raw_data_block (Raw framing).
pub fn write_raw_data_block(ctx: &mut Context) -> Result<Vec<u8>> {
    let mut op = WriteOp::default();
    let mut block = mem::take(&mut ctx.raw_data_block);
    let res = block.syntax(&mut op, ctx);
    ctx.raw_data_block = block;
    res?;
    op.bw.into_vec()
}

/// Serializes one ADTS frame: the context's header followed by its staged
/// raw_data_block(s).
pub fn write_adts_frame(ctx: &mut Context) -> Result<Vec<u8>> {
    let mut op = WriteOp::default();
    let mut adts = ctx.adts()?.clone();
    adts.fixed_header(&mut op)?;
    adts.variable_header(&mut op)?;
    adts_error_check(&mut op, &adts)?;

    let mut frame = mem::take(&mut ctx.adts_frame);
    let mut res = Ok(());
    for i in 0..=usize::from(adts.number_of_raw_data_blocks_in_frame) {
        res = frame.raw_data_blocks[i].syntax(&mut op, ctx);
        if res.is_err() {
            break;
        }
    }
    ctx.adts_frame = frame;
    res?;
    op.bw.into_vec()
}

fn silent_frame_bits(ctx: &Context, channel_count: u32) -> Result<usize> {
    let mut bits = match ctx.data_format() {
        DataFormat::Raw => 0,
        DataFormat::Adts => ADTS_HEADER_BITS,
        DataFormat::Unknown => bail!(ConfigError::NoDataFormat),
    };
    bits += match channel_count {
        1 => SILENT_SCE_BITS,
        2 => SILENT_CPE_BITS,
        _ => bail!(WriterError::BadSilentChannelCount(channel_count)),
    };
    Ok(bits + END_BITS)
}

/// Smallest frame, in bytes, that can hold a silent frame for the
/// context's framing and `channel_count` channels.
pub fn silent_frame_min_size(ctx: &Context, channel_count: u32) -> Result<usize> {
    Ok(silent_frame_bits(ctx, channel_count)?.div_ceil(8))
}

fn silent_ics_gain() -> crate::structs::ics::Ics {
    crate::structs::ics::Ics {
        global_gain: 0x8C,
        ..Default::default()
    }
}

/// Emits a silent frame of exactly `frame_length` bytes.
///
/// The raw_data_block carries a silent SCE (mono) or CPE (stereo), padded
/// to the requested length with FILL elements. Under ADTS framing the
/// context's header is emitted first with `aac_frame_length` set to
/// `frame_length`.
pub fn write_silent_frame(
    ctx: &mut Context,
    channel_count: u32,
    frame_length: usize,
) -> Result<Vec<u8>> {
    let min_bits = silent_frame_bits(ctx, channel_count)?;
    if frame_length * 8 < min_bits {
        bail!(WriterError::SilentFrameTooShort {
            length: frame_length,
            min: min_bits.div_ceil(8),
        });
    }

    let mut block = RawDataBlock::default();

    let fill_bits = frame_length * 8 - min_bits;
    if fill_bits >= 8 {
        // Budget the fill headers: 3-bit id and 4-bit count per element,
        // plus the 8-bit escape count for payloads past 14 bytes.
        let mut budget = fill_bits as isize;
        let mut spent = 0;
        while spent < fill_bits {
            let rem = fill_bits - spent;
            budget -= 3 + 4;
            if rem >= 15 * 8 {
                budget -= 8;
            }
            spent += 8 * MAX_FILL_PAYLOAD;
        }

        let mut fill_bytes = budget.max(0) as usize / 8;
        while fill_bytes > 0 {
            if block.elements.len() >= MAX_SYN_ELE - 2 {
                bail!(WriterError::TooManyFillElements);
            }
            let fill_size = fill_bytes.min(MAX_FILL_PAYLOAD);
            block.elements.push(SyntacticElement::Fil(Fil {
                count: fill_size as u16,
                extension_payload: ExtensionPayload {
                    extension_type: EXT_TYPE_FILL,
                },
            }));
            fill_bytes -= fill_size;
        }
    }

    if channel_count == 1 {
        let mut sce = Box::<Sce>::default();
        sce.ics = silent_ics_gain();
        sce.ics.ics_info.window_shape = true;
        block.elements.push(SyntacticElement::Sce(sce));
    } else {
        let mut cpe = Box::<Cpe>::default();
        cpe.common_window = true;
        cpe.ics_info.window_shape = true;
        cpe.ics1 = silent_ics_gain();
        cpe.ics2 = silent_ics_gain();
        block.elements.push(SyntacticElement::Cpe(cpe));
    }
    block.elements.push(SyntacticElement::End);

    match ctx.data_format() {
        DataFormat::Raw => {
            ctx.raw_data_block = block;
            write_raw_data_block(ctx)
        }
        DataFormat::Adts => {
            ctx.adts.aac_frame_length = frame_length as u16;
            ctx.adts_frame.raw_data_blocks[0] = block;
            write_adts_frame(ctx)
        }
        DataFormat::Unknown => bail!(ConfigError::NoDataFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format;

    #[test]
    fn write_asc_minimal_lc() -> Result<()> {
        let asc = Asc::from_format(&format::AAC_LC_16B_48000HZ_STEREO_RAW)?;
        assert_eq!(write_asc(&asc)?, vec![0x11, 0x90, 0x00, 0x00]);

        let asc = Asc::from_format(&format::AAC_LC_16B_48000HZ_MONO_RAW)?;
        assert_eq!(write_asc(&asc)?, vec![0x11, 0x88, 0x00, 0x00]);

        let asc = Asc::from_format(&format::AAC_LC_16B_44100HZ_STEREO_RAW)?;
        assert_eq!(write_asc(&asc)?, vec![0x12, 0x10, 0x00, 0x00]);
        Ok(())
    }

    #[test]
    fn write_asc_roundtrip() -> Result<()> {
        for fmt in [
            format::AAC_LC_16B_48000HZ_STEREO_RAW,
            format::AAC_LC_16B_48000HZ_MONO_RAW,
            format::AAC_LC_16B_44100HZ_STEREO_RAW,
            format::AAC_LC_16B_44100HZ_MONO_RAW,
        ] {
            let asc = Asc::from_format(&fmt)?;
            let buf = write_asc(&asc)?;
            let parsed = crate::process::reader::parse_asc(&buf)?;
            assert_eq!(parsed.audio_object_type, asc.audio_object_type);
            assert_eq!(
                parsed.sampling_frequency_index,
                asc.sampling_frequency_index
            );
            assert_eq!(parsed.channel_configuration, asc.channel_configuration);
            assert_eq!(parsed.format()?, fmt);
        }
        Ok(())
    }

    #[test]
    fn write_adts_stereo_48000() -> Result<()> {
        let mut adts = Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS)?;
        adts.aac_frame_length = 13;
        assert_eq!(
            write_adts(&adts)?,
            vec![0xFF, 0xF1, 0x4C, 0x80, 0x01, 0xBF, 0xFC]
        );
        Ok(())
    }

    #[test]
    fn write_adts_mono_48000() -> Result<()> {
        let mut adts = Adts::from_format(&format::AAC_LC_16B_48000HZ_MONO_ADTS)?;
        adts.aac_frame_length = 11;
        assert_eq!(
            write_adts(&adts)?,
            vec![0xFF, 0xF1, 0x4C, 0x40, 0x01, 0x7F, 0xFC]
        );
        Ok(())
    }

    #[test]
    fn write_adts_roundtrip() -> Result<()> {
        for fmt in [
            format::AAC_LC_16B_48000HZ_STEREO_ADTS,
            format::AAC_LC_16B_44100HZ_MONO_ADTS,
        ] {
            let mut adts = Adts::from_format(&fmt)?;
            adts.aac_frame_length = 13;
            let buf = write_adts(&adts)?;
            assert_eq!(buf[0], 0xFF);
            assert_eq!(buf[1] >> 4, 0xF);
            let parsed = crate::process::reader::parse_adts(&buf)?;
            assert_eq!(parsed.aac_frame_length, 13);
            assert_eq!(parsed.format()?, fmt);
        }
        Ok(())
    }

    #[test]
    fn silent_frame_sizes() -> Result<()> {
        let mut ctx = Context::new();
        ctx.set_adts(Adts::from_format(&format::AAC_LC_16B_48000HZ_MONO_ADTS)?);
        assert_eq!(silent_frame_min_size(&ctx, 1)?, 11);
        assert_eq!(silent_frame_min_size(&ctx, 2)?, 13);
        assert!(silent_frame_min_size(&ctx, 3).is_err());

        ctx.set_asc(Asc::from_format(&format::AAC_LC_16B_48000HZ_MONO_RAW)?);
        assert_eq!(silent_frame_min_size(&ctx, 1)?, 4);
        assert_eq!(silent_frame_min_size(&ctx, 2)?, 6);
        Ok(())
    }

    #[test]
    fn silent_frame_matches_requested_length() -> Result<()> {
        let mut ctx = Context::new();
        ctx.set_adts(Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS)?);

        for frame_length in [13, 16, 24, 64, 512] {
            let frame = write_silent_frame(&mut ctx, 2, frame_length)?;
            assert_eq!(frame.len(), frame_length, "length {frame_length}");
            assert_eq!(frame[0], 0xFF);
            assert_eq!(frame[1] >> 4, 0xF);
        }

        let err = write_silent_frame(&mut ctx, 2, 5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WriterError>(),
            Some(WriterError::SilentFrameTooShort { .. })
        ));
        Ok(())
    }

    #[test]
    fn silent_frame_header_carries_frame_length() -> Result<()> {
        let mut ctx = Context::new();
        ctx.set_adts(Adts::from_format(&format::AAC_LC_16B_48000HZ_MONO_ADTS)?);
        let frame = write_silent_frame(&mut ctx, 1, 11)?;
        let adts = crate::process::reader::parse_adts(&frame)?;
        assert_eq!(adts.aac_frame_length, 11);
        assert_eq!(adts.channel_configuration, 1);
        Ok(())
    }
}
