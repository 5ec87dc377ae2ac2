//! Streaming reader: ADTS sync-and-dispatch plus the top-level parsers.
//!
//! A [`Reader`] owns one [`Context`] and drives the syntax engine in read
//! mode over caller-supplied input. ADTS frames are reported through a
//! [`FrameSink`]; the external offset cursor makes parsing resumable when
//! input arrives in chunks.

use std::mem;

use anyhow::{Result, anyhow, bail};
use log::debug;

use crate::ctx::Context;
use crate::format::DataFormat;
use crate::log_or_err;
use crate::structs::adts::{Adts, adts_error_check};
use crate::structs::asc::Asc;
use crate::syntax::{READER_FLAGS_FRAME_DATA, ReadOp};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::{AdtsError, BitstreamError, ConfigError};

/// ADTS header length in bytes without CRC.
const ADTS_HEADER_LENGTH: usize = 7;

/// Receiver of per-frame callbacks.
///
/// Both callbacks are invoked synchronously, in input order, and only for
/// frames whose header parsed completely; `frame_begin` strictly precedes
/// `frame_end` for the same frame.
pub trait FrameSink {
    fn frame_begin(&mut self, _ctx: &Context, _frame: &[u8], _adts: &Adts) {}
    fn frame_end(&mut self, _ctx: &Context, _frame: &[u8], _adts: &Adts) {}
}

/// Sink for callers that only want the parsed context.
impl FrameSink for () {}

/// Streaming AAC reader.
pub struct Reader<S: FrameSink> {
    ctx: Context,
    sink: S,
    stopped: bool,
    fail_level: log::Level,
}

impl<S: FrameSink> Reader<S> {
    pub fn new(sink: S) -> Self {
        Self {
            ctx: Context::new(),
            sink,
            stopped: false,
            fail_level: log::Level::Error,
        }
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Requests a cooperative stop.
    ///
    /// The reader observes the flag between frame iterations; once stopped,
    /// further `parse` calls return without invoking callbacks until
    /// [`resume`](Self::resume).
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn resume(&mut self) {
        self.stopped = false;
    }

    /// Sets the level at which tolerated diagnostics become hard failures.
    ///
    /// - `log::Level::Error`: only fail on errors (default)
    /// - `log::Level::Warn`: fail on warnings as well (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    /// Parses as much of `buf[*off..]` as possible.
    ///
    /// `off` advances past every completely parsed frame or raw block. A
    /// frame cut short by the end of the buffer leaves `off` at its first
    /// byte and returns `Ok`; parsing resumes there once the caller has
    /// appended input.
    pub fn parse(&mut self, flags: u32, buf: &[u8], off: &mut usize) -> Result<()> {
        if self.stopped {
            return Ok(());
        }

        if self.ctx.data_format() == DataFormat::Unknown {
            if buf.len().saturating_sub(*off) < 2 {
                return Ok(());
            }
            let mut probe = BsIoSliceReader::from_slice(&buf[*off..]);
            if probe.peek_n::<u16>(12)? == 0xFFF {
                self.ctx.set_data_format(DataFormat::Adts);
            }
        }

        while *off < buf.len() && !self.stopped {
            let more = match self.ctx.data_format() {
                DataFormat::Raw => self.read_raw_data_block(flags, buf, off)?,
                DataFormat::Adts => self.read_adts_frame(flags, buf, off)?,
                DataFormat::Unknown => bail!(ConfigError::NoDataFormat),
            };
            if !more {
                break;
            }
        }
        Ok(())
    }

    fn read_raw_data_block(&mut self, flags: u32, buf: &[u8], off: &mut usize) -> Result<bool> {
        let mut op = ReadOp::new(BsIoSliceReader::from_slice(&buf[*off..]), flags);
        let mut block = mem::take(&mut self.ctx.raw_data_block);
        let res = block.syntax(&mut op, &mut self.ctx);
        self.ctx.raw_data_block = block;
        match res {
            Ok(()) => {
                *off += (op.bs.position()? / 8) as usize;
                Ok(true)
            }
            Err(e) if is_need_more_data(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn read_adts_frame(&mut self, flags: u32, buf: &[u8], off: &mut usize) -> Result<bool> {
        let frame_start = *off;
        let mut op = ReadOp::new(BsIoSliceReader::from_slice(&buf[frame_start..]), flags);

        self.ctx.clear_adts();
        let mut adts = Adts::default();
        if let Err(e) = adts
            .fixed_header(&mut op)
            .and_then(|()| adts.variable_header(&mut op))
        {
            return if is_need_more_data(&e) { Ok(false) } else { Err(e) };
        }
        self.ctx.set_adts(adts.clone());

        let frame_length = usize::from(adts.aac_frame_length);
        if frame_length < ADTS_HEADER_LENGTH {
            bail!(AdtsError::FrameLengthTooShort(adts.aac_frame_length));
        }
        if frame_start + frame_length > buf.len() {
            // Insufficient at the frame boundary: resume here later.
            return Ok(false);
        }
        let frame = &buf[frame_start..frame_start + frame_length];
        debug!("adts frame at {frame_start:#x}: {frame_length} bytes");

        {
            let Self { ctx, sink, .. } = self;
            sink.frame_begin(ctx, frame, &adts);
        }

        adts_error_check(&mut op, &adts)?;
        if flags & READER_FLAGS_FRAME_DATA != 0 {
            let mut frame_blocks = mem::take(&mut self.ctx.adts_frame);
            let mut res = Ok(());
            for i in 0..=usize::from(adts.number_of_raw_data_blocks_in_frame) {
                res = frame_blocks.raw_data_blocks[i].syntax(&mut op, &mut self.ctx);
                if res.is_err() {
                    break;
                }
            }
            self.ctx.adts_frame = frame_blocks;
            // Mid-frame failures abort this frame; the header stays in the
            // context.
            res?;

            let consumed = (op.bs.position()? / 8) as usize;
            if consumed != frame_length {
                log_or_err!(
                    self,
                    log::Level::Warn,
                    anyhow!(AdtsError::FrameLengthMismatch {
                        declared: frame_length,
                        consumed,
                    })
                );
            }
        }

        *off = frame_start + frame_length;
        {
            let Self { ctx, sink, .. } = self;
            sink.frame_end(ctx, frame, &adts);
        }
        Ok(true)
    }
}

fn is_need_more_data(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<BitstreamError>(),
        Some(BitstreamError::NeedMoreData)
    )
}

/// Parses a standalone AudioSpecificConfig.
pub fn parse_asc(buf: &[u8]) -> Result<Asc> {
    if buf.len() < 2 {
        bail!(ConfigError::InputTooShort(buf.len()));
    }
    let mut op = ReadOp::new(BsIoSliceReader::from_slice(buf), 0);
    let mut asc = Asc::default();
    asc.syntax(&mut op)?;
    Ok(asc)
}

/// Parses a standalone ADTS header.
pub fn parse_adts(buf: &[u8]) -> Result<Adts> {
    if buf.len() < 2 {
        bail!(AdtsError::InputTooShort(buf.len()));
    }
    let mut op = ReadOp::new(BsIoSliceReader::from_slice(buf), 0);
    let mut adts = Adts::default();
    adts.fixed_header(&mut op)?;
    adts.variable_header(&mut op)?;
    Ok(adts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format;
    use crate::process::writer::write_silent_frame;
    use crate::structs::asc::AudioObjectType;
    use crate::structs::element::SyntacticElement;
    use crate::utils::errors::SyntaxError;

    #[derive(Default)]
    struct RecordingSink {
        begins: Vec<usize>,
        ends: Vec<usize>,
    }

    impl FrameSink for RecordingSink {
        fn frame_begin(&mut self, _ctx: &Context, frame: &[u8], _adts: &Adts) {
            self.begins.push(frame.len());
        }

        fn frame_end(&mut self, _ctx: &Context, frame: &[u8], _adts: &Adts) {
            assert_eq!(self.begins.len(), self.ends.len() + 1);
            self.ends.push(frame.len());
        }
    }

    #[test]
    fn parse_asc_rejects_short_input() {
        let err = parse_asc(&[0x19]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InputTooShort(1))
        ));
    }

    #[test]
    fn parse_asc_minimal_lc() -> Result<()> {
        let asc = parse_asc(&[0x11, 0x90])?;
        assert_eq!(asc.audio_object_type, AudioObjectType::AacLc);
        assert_eq!(asc.sampling_frequency_index, 3);
        assert_eq!(asc.channel_configuration, 2);
        assert_eq!(asc.format()?, format::AAC_LC_16B_48000HZ_STEREO_RAW);

        let asc = parse_asc(&[0x11, 0x88])?;
        assert_eq!(asc.channel_configuration, 1);
        assert_eq!(asc.format()?, format::AAC_LC_16B_48000HZ_MONO_RAW);

        let asc = parse_asc(&[0x12, 0x10])?;
        assert_eq!(asc.sampling_frequency_index, 4);
        assert_eq!(asc.format()?, format::AAC_LC_16B_44100HZ_STEREO_RAW);
        Ok(())
    }

    #[test]
    fn parse_asc_non_lc_has_no_format() -> Result<()> {
        // AOT 3 (SSR) parses but does not map to a format.
        let asc = parse_asc(&[0x19, 0x90])?;
        assert_eq!(asc.audio_object_type, AudioObjectType::AacSsr);
        assert!(asc.format().is_err());
        Ok(())
    }

    #[test]
    fn parse_asc_with_sbr_sync_extension() -> Result<()> {
        let asc = parse_asc(&[0x11, 0x90, 0x56, 0xE5, 0x00])?;
        assert_eq!(asc.sync_extension_type, 0x2B7);
        assert!(!asc.sbr_present_flag);
        assert_eq!(asc.format()?, format::AAC_LC_16B_48000HZ_STEREO_RAW);
        Ok(())
    }

    #[test]
    fn parse_adts_rejects_short_input() {
        let err = parse_adts(&[0x19]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AdtsError>(),
            Some(AdtsError::InputTooShort(1))
        ));
    }

    #[test]
    fn parse_adts_rejects_bad_syncword() {
        let err = parse_adts(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AdtsError>(),
            Some(AdtsError::BadSyncword(0x010))
        ));
    }

    #[test]
    fn parse_adts_mono_44100() -> Result<()> {
        let adts = parse_adts(&[0xFF, 0xF1, 0x50, 0x40, 0x01, 0x7F, 0xFC])?;
        assert_eq!(adts.syncword, 0xFFF);
        assert!(!adts.id);
        assert_eq!(adts.layer, 0);
        assert!(adts.protection_absent);
        assert_eq!(
            adts.profile_object_type + 1,
            AudioObjectType::AacLc as u8
        );
        assert_eq!(adts.sampling_frequency_index, 4);
        assert_eq!(adts.channel_configuration, 1);
        assert_eq!(adts.aac_frame_length, 11);
        assert_eq!(adts.format()?, format::AAC_LC_16B_44100HZ_MONO_ADTS);
        Ok(())
    }

    #[test]
    fn parse_adts_stereo_48000() -> Result<()> {
        let adts = parse_adts(&[0xFF, 0xF1, 0x4C, 0x80, 0x01, 0xBF, 0xFC])?;
        assert_eq!(adts.sampling_frequency_index, 3);
        assert_eq!(adts.channel_configuration, 2);
        assert_eq!(adts.aac_frame_length, 13);
        assert_eq!(adts.format()?, format::AAC_LC_16B_48000HZ_STEREO_ADTS);
        Ok(())
    }

    fn silent_stream(frames: usize, frame_length: usize) -> Vec<u8> {
        let mut ctx = Context::new();
        ctx.set_adts(Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS).unwrap());
        let mut stream = Vec::new();
        for _ in 0..frames {
            stream.extend(write_silent_frame(&mut ctx, 2, frame_length).unwrap());
        }
        stream
    }

    #[test]
    fn reader_reports_frames_in_order() -> Result<()> {
        let stream = silent_stream(3, 32);
        assert_eq!(stream.len(), 3 * 32);

        let mut reader = Reader::new(RecordingSink::default());
        let mut off = 0;
        reader.parse(0, &stream, &mut off)?;

        assert_eq!(off, stream.len());
        assert_eq!(reader.sink().begins, vec![32, 32, 32]);
        assert_eq!(reader.sink().ends, vec![32, 32, 32]);
        assert_eq!(reader.ctx().adts()?.aac_frame_length, 32);
        Ok(())
    }

    #[test]
    fn reader_parses_frame_data() -> Result<()> {
        let stream = silent_stream(1, 64);

        let mut reader = Reader::new(());
        let mut off = 0;
        reader.parse(READER_FLAGS_FRAME_DATA, &stream, &mut off)?;

        assert_eq!(off, stream.len());
        let elements = &reader.ctx().adts_frame.raw_data_blocks[0].elements;
        assert!(matches!(elements.first(), Some(SyntacticElement::Fil(_))));
        assert!(
            elements
                .iter()
                .any(|e| matches!(e, SyntacticElement::Cpe(_)))
        );
        assert!(matches!(elements.last(), Some(SyntacticElement::End)));
        Ok(())
    }

    #[test]
    fn reader_resumes_on_partial_input() -> Result<()> {
        let stream = silent_stream(2, 24);
        let mut reader = Reader::new(RecordingSink::default());

        // Three bytes cannot even hold the header.
        let mut off = 0;
        reader.parse(0, &stream[..3], &mut off)?;
        assert_eq!(off, 0);
        assert!(reader.sink().begins.is_empty());

        // A torn second frame parses the first and stops at the boundary.
        let mut off = 0;
        reader.parse(0, &stream[..30], &mut off)?;
        assert_eq!(off, 24);
        assert_eq!(reader.sink().begins, vec![24]);

        // The full buffer resumes from the recorded offset.
        reader.parse(0, &stream, &mut off)?;
        assert_eq!(off, stream.len());
        assert_eq!(reader.sink().ends, vec![24, 24]);
        Ok(())
    }

    #[test]
    fn stopped_reader_makes_no_progress() -> Result<()> {
        let stream = silent_stream(2, 24);
        let mut reader = Reader::new(RecordingSink::default());
        let mut off = 0;

        reader.stop();
        reader.parse(0, &stream, &mut off)?;
        assert_eq!(off, 0);
        assert!(reader.sink().begins.is_empty());

        reader.resume();
        reader.parse(0, &stream, &mut off)?;
        assert_eq!(reader.sink().begins.len(), 2);
        Ok(())
    }

    #[test]
    fn reader_parses_raw_blocks_after_set_asc() -> Result<()> {
        let mut write_ctx = Context::new();
        write_ctx.set_asc(Asc::from_format(&format::AAC_LC_16B_48000HZ_STEREO_RAW)?);
        let block = write_silent_frame(&mut write_ctx, 2, 8)?;
        assert_eq!(block.len(), 8);

        let mut reader = Reader::new(());
        reader
            .ctx_mut()
            .set_asc(Asc::from_format(&format::AAC_LC_16B_48000HZ_STEREO_RAW)?);
        let mut off = 0;
        reader.parse(0, &block, &mut off)?;

        assert_eq!(off, block.len());
        let elements = &reader.ctx().raw_data_block.elements;
        assert!(
            elements
                .iter()
                .any(|e| matches!(e, SyntacticElement::Cpe(_)))
        );
        assert!(matches!(elements.last(), Some(SyntacticElement::End)));
        Ok(())
    }

    #[test]
    fn reader_parses_multiple_raw_data_blocks_per_frame() -> Result<()> {
        // Mono 48 kHz header, frame length 9, two END-only blocks.
        let frame = [0xFF, 0xF1, 0x4C, 0x40, 0x01, 0x3F, 0xFD, 0xE0, 0xE0];

        let mut reader = Reader::new(RecordingSink::default());
        let mut off = 0;
        reader.parse(READER_FLAGS_FRAME_DATA, &frame, &mut off)?;

        assert_eq!(off, frame.len());
        assert_eq!(
            reader.ctx().adts()?.number_of_raw_data_blocks_in_frame,
            1
        );
        for block in &reader.ctx().adts_frame.raw_data_blocks[..2] {
            assert!(matches!(
                block.elements.as_slice(),
                [SyntacticElement::End]
            ));
        }
        Ok(())
    }

    #[test]
    fn reader_rejects_unrecognized_input() {
        let mut reader = Reader::new(());
        let mut off = 0;
        let err = reader
            .parse(0, &[0x01, 0x02, 0x03, 0x04], &mut off)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NoDataFormat)
        ));
    }

    #[test]
    fn truncated_frame_body_is_terminal_under_frame_data() -> Result<()> {
        let mut stream = silent_stream(1, 24);
        // Corrupt the payload: an LFE tag aborts the block parse.
        stream[7] = 0b011_00000;

        let mut reader = Reader::new(RecordingSink::default());
        let mut off = 0;
        let err = reader
            .parse(READER_FLAGS_FRAME_DATA, &stream, &mut off)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::Unsupported("LFE channel element"))
        ));
        // The header survived; frame_begin fired, frame_end did not.
        assert_eq!(reader.ctx().adts()?.aac_frame_length, 24);
        assert_eq!(reader.sink().begins.len(), 1);
        assert!(reader.sink().ends.is_empty());
        Ok(())
    }
}
