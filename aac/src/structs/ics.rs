//! Individual channel streams and their sub-productions.
//!
//! Covers ics_info (Table 4.6), section_data (4.52), scale_factor_data
//! (4.53), pulse_data (4.7), tns_data (4.54), gain_control_data (4.12),
//! spectral_data (4.56) and individual_channel_stream (4.50).

use anyhow::{Result, bail};

use crate::ctx::Context;
use crate::structs::asc::AudioObjectType;
use crate::structs::{MAX_SFB, MAX_WINDOW_GROUPS};
use crate::syntax::{OpKind, SyntaxOp};
use crate::utils::errors::SyntaxError;
use crate::{syn_bits, syn_flag};

/// 4.6.3.2 – section codebook classes.
pub const ZERO_HCB: u8 = 0;
pub const FIRST_PAIR_HCB: u8 = 5;
pub const NOISE_HCB: u8 = 13;
pub const INTENSITY_HCB2: u8 = 14;
pub const INTENSITY_HCB: u8 = 15;

/// Prediction covers at most this many scalefactor bands.
const PRED_SFB_MAX: u8 = 40;

/// Table 4.128 – Window Sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowSequence {
    #[default]
    OnlyLong = 0,
    LongStart = 1,
    EightShort = 2,
    LongStop = 3,
}

impl WindowSequence {
    fn from_bits(value: u8) -> Self {
        match value & 3 {
            0 => Self::OnlyLong,
            1 => Self::LongStart,
            2 => Self::EightShort,
            _ => Self::LongStop,
        }
    }
}

fn is_intensity(sfb_cb: u8) -> bool {
    sfb_cb == INTENSITY_HCB || sfb_cb == INTENSITY_HCB2
}

fn is_noise(sfb_cb: u8) -> bool {
    sfb_cb == NOISE_HCB
}

/// Table 4.6 – ics_info.
#[derive(Debug, Clone)]
pub struct IcsInfo {
    pub ics_reserved_bit: bool,
    pub window_sequence: WindowSequence,
    pub window_shape: bool,
    pub max_sfb: u8,
    pub scale_factor_grouping: u8,
    pub predictor_data_present: bool,
    pub predictor_reset: bool,
    pub predictor_reset_group_number: u8,
    pub prediction_used: [bool; MAX_SFB],
    pub ltp_data_present: bool,
}

impl Default for IcsInfo {
    fn default() -> Self {
        Self {
            ics_reserved_bit: false,
            window_sequence: WindowSequence::OnlyLong,
            window_shape: false,
            max_sfb: 0,
            scale_factor_grouping: 0,
            predictor_data_present: false,
            predictor_reset: false,
            predictor_reset_group_number: 0,
            prediction_used: [false; MAX_SFB],
            ltp_data_present: false,
        }
    }
}

impl IcsInfo {
    pub(crate) fn syntax<O: SyntaxOp>(
        &mut self,
        op: &mut O,
        ctx: &Context,
        common_window: bool,
    ) -> Result<()> {
        if O::KIND == OpKind::Read {
            *self = Self::default();
        }
        let aot = ctx.audio_object_type()?;

        syn_flag!(op, self.ics_reserved_bit);
        let ws = op.bits("window_sequence", self.window_sequence as u64, 2)?;
        self.window_sequence = WindowSequence::from_bits(ws as u8);
        syn_flag!(op, self.window_shape);
        if self.window_sequence == WindowSequence::EightShort {
            syn_bits!(op, self.max_sfb, 4);
            syn_bits!(op, self.scale_factor_grouping, 7);
            return Ok(());
        }
        syn_bits!(op, self.max_sfb, 6);
        syn_flag!(op, self.predictor_data_present);
        if self.predictor_data_present {
            if aot == AudioObjectType::AacMain {
                syn_flag!(op, self.predictor_reset);
                if self.predictor_reset {
                    syn_bits!(op, self.predictor_reset_group_number, 5);
                }
                for sfb in 0..usize::from(self.max_sfb.min(PRED_SFB_MAX)) {
                    syn_flag!(op, self.prediction_used[sfb]);
                }
            } else {
                syn_flag!(op, self.ltp_data_present);
                if self.ltp_data_present {
                    bail!(SyntaxError::Unsupported("ltp_data"));
                }
                if common_window {
                    syn_flag!(op, self.ltp_data_present);
                    if self.ltp_data_present {
                        bail!(SyntaxError::Unsupported("ltp_data"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Table 4.52 – section_data.
#[derive(Debug, Clone)]
pub struct SectionData {
    pub sect_cb: [[u8; MAX_SFB]; MAX_WINDOW_GROUPS],
    pub sect_start: [[u16; MAX_SFB]; MAX_WINDOW_GROUPS],
    pub sect_end: [[u16; MAX_SFB]; MAX_WINDOW_GROUPS],
    pub sfb_cb: [[u8; MAX_SFB]; MAX_WINDOW_GROUPS],
    pub num_sec: [u8; MAX_WINDOW_GROUPS],
}

impl Default for SectionData {
    fn default() -> Self {
        Self {
            sect_cb: [[0; MAX_SFB]; MAX_WINDOW_GROUPS],
            sect_start: [[0; MAX_SFB]; MAX_WINDOW_GROUPS],
            sect_end: [[0; MAX_SFB]; MAX_WINDOW_GROUPS],
            sfb_cb: [[0; MAX_SFB]; MAX_WINDOW_GROUPS],
            num_sec: [0; MAX_WINDOW_GROUPS],
        }
    }
}

impl SectionData {
    pub(crate) fn syntax<O: SyntaxOp>(
        &mut self,
        op: &mut O,
        ctx: &Context,
        ics_info: &IcsInfo,
    ) -> Result<()> {
        let (sect_bits, sect_esc_val) = if ics_info.window_sequence == WindowSequence::EightShort {
            (3u32, (1u64 << 3) - 1)
        } else {
            (5u32, (1u64 << 5) - 1)
        };
        let cb_bits = if ctx.section_data_resilience() { 5 } else { 4 };
        let max_sfb = usize::from(ics_info.max_sfb);

        for g in 0..usize::from(ctx.info.num_window_groups) {
            match O::KIND {
                OpKind::Read => {
                    let mut k = 0usize;
                    let mut i = 0usize;
                    while k < max_sfb {
                        let cb = op.bits("sect_cb", 0, cb_bits)? as u8;
                        let mut sect_len = 0usize;
                        if section_has_run_length(ctx, cb) {
                            let mut incr = op.bits("sect_len_incr", 0, sect_bits)?;
                            while incr == sect_esc_val {
                                sect_len += sect_esc_val as usize;
                                incr = op.bits("sect_len_incr", 0, sect_bits)?;
                            }
                            sect_len += incr as usize;
                        } else {
                            sect_len = 1;
                        }
                        if k + sect_len > max_sfb || i >= MAX_SFB {
                            bail!(SyntaxError::SectionOverflow {
                                band: k + sect_len,
                                max: max_sfb,
                            });
                        }
                        self.sect_cb[g][i] = cb;
                        self.sect_start[g][i] = k as u16;
                        self.sect_end[g][i] = (k + sect_len) as u16;
                        for sfb in k..k + sect_len {
                            self.sfb_cb[g][sfb] = cb;
                        }
                        k += sect_len;
                        i += 1;
                    }
                    self.num_sec[g] = i as u8;
                }
                OpKind::Write | OpKind::Dump => {
                    for i in 0..usize::from(self.num_sec[g]) {
                        let cb = self.sect_cb[g][i];
                        op.bits("sect_cb", u64::from(cb), cb_bits)?;
                        if section_has_run_length(ctx, cb) {
                            let mut sect_len =
                                u64::from(self.sect_end[g][i] - self.sect_start[g][i]);
                            while sect_len >= sect_esc_val {
                                op.bits("sect_len_incr", sect_esc_val, sect_bits)?;
                                sect_len -= sect_esc_val;
                            }
                            op.bits("sect_len_incr", sect_len, sect_bits)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// A section carries an escape-coded run length unless the resilience
/// variant pins its codebook class to single-band sections.
fn section_has_run_length(ctx: &Context, cb: u8) -> bool {
    !ctx.section_data_resilience() || cb < 11 || (cb > 11 && cb < 16)
}

/// Table 4.53 – scale_factor_data.
#[derive(Debug, Clone)]
pub struct ScaleFactorData {
    pub dpcm_is_position: [[i16; MAX_SFB]; MAX_WINDOW_GROUPS],
    pub dpcm_noise_nrg: [[i16; MAX_SFB]; MAX_WINDOW_GROUPS],
    pub dpcm_sf: [[i16; MAX_SFB]; MAX_WINDOW_GROUPS],
}

impl Default for ScaleFactorData {
    fn default() -> Self {
        Self {
            dpcm_is_position: [[0; MAX_SFB]; MAX_WINDOW_GROUPS],
            dpcm_noise_nrg: [[0; MAX_SFB]; MAX_WINDOW_GROUPS],
            dpcm_sf: [[0; MAX_SFB]; MAX_WINDOW_GROUPS],
        }
    }
}

impl ScaleFactorData {
    pub(crate) fn syntax<O: SyntaxOp>(
        &mut self,
        op: &mut O,
        ctx: &Context,
        ics_info: &IcsInfo,
        section_data: &SectionData,
    ) -> Result<()> {
        if ctx.scalefactor_data_resilience() {
            bail!(SyntaxError::Unsupported("rvlc scale_factor_data"));
        }

        let mut noise_pcm_flag = true;
        for g in 0..usize::from(ctx.info.num_window_groups) {
            for sfb in 0..usize::from(ics_info.max_sfb) {
                let cb = section_data.sfb_cb[g][sfb];
                if cb == ZERO_HCB {
                    continue;
                }
                if is_intensity(cb) {
                    let v = op.huffman_scale_factor(
                        "dpcm_is_position",
                        i64::from(self.dpcm_is_position[g][sfb]),
                    )?;
                    self.dpcm_is_position[g][sfb] = v as i16;
                } else if is_noise(cb) {
                    if noise_pcm_flag {
                        noise_pcm_flag = false;
                        let v = op.bits(
                            "dpcm_noise_nrg",
                            (self.dpcm_noise_nrg[g][sfb] as u64) & 0x1FF,
                            9,
                        )?;
                        self.dpcm_noise_nrg[g][sfb] = v as i16;
                    } else {
                        let v = op.huffman_scale_factor(
                            "dpcm_noise_nrg",
                            i64::from(self.dpcm_noise_nrg[g][sfb]),
                        )?;
                        self.dpcm_noise_nrg[g][sfb] = v as i16;
                    }
                } else {
                    let v =
                        op.huffman_scale_factor("dpcm_sf", i64::from(self.dpcm_sf[g][sfb]))?;
                    self.dpcm_sf[g][sfb] = v as i16;
                }
            }
        }
        Ok(())
    }
}

/// Table 4.7 – pulse_data.
#[derive(Debug, Clone, Default)]
pub struct PulseData {
    pub number_pulse: u8,
    pub pulse_start_sfb: u8,
    pub pulse_offset: [u8; 4],
    pub pulse_amp: [u8; 4],
}

impl PulseData {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O) -> Result<()> {
        syn_bits!(op, self.number_pulse, 2);
        syn_bits!(op, self.pulse_start_sfb, 6);
        for i in 0..=usize::from(self.number_pulse) {
            syn_bits!(op, self.pulse_offset[i], 5);
            syn_bits!(op, self.pulse_amp[i], 4);
        }
        Ok(())
    }
}

/// Table 4.54 – tns_data.
#[derive(Debug, Clone)]
pub struct TnsData {
    pub n_filt: [u8; 8],
    pub coef_res: [bool; 8],
    pub length: [[u8; 4]; 8],
    pub order: [[u8; 4]; 8],
    pub direction: [[bool; 4]; 8],
    pub coef_compress: [[bool; 4]; 8],
    pub coef: [[[u8; 32]; 4]; 8],
}

impl Default for TnsData {
    fn default() -> Self {
        Self {
            n_filt: [0; 8],
            coef_res: [false; 8],
            length: [[0; 4]; 8],
            order: [[0; 4]; 8],
            direction: [[false; 4]; 8],
            coef_compress: [[false; 4]; 8],
            coef: [[[0; 32]; 4]; 8],
        }
    }
}

impl TnsData {
    pub(crate) fn syntax<O: SyntaxOp>(
        &mut self,
        op: &mut O,
        ctx: &Context,
        ics_info: &IcsInfo,
    ) -> Result<()> {
        let (n_filt_bits, length_bits, order_bits) =
            if ics_info.window_sequence == WindowSequence::EightShort {
                (1, 4, 3)
            } else {
                (2, 6, 5)
            };

        for w in 0..usize::from(ctx.info.num_windows) {
            let mut start_coef_bits = 3;
            syn_bits!(op, self.n_filt[w], n_filt_bits);
            if self.n_filt[w] != 0 {
                syn_flag!(op, self.coef_res[w]);
                start_coef_bits += u32::from(self.coef_res[w]);
            }
            for filt in 0..usize::from(self.n_filt[w]) {
                syn_bits!(op, self.length[w][filt], length_bits);
                syn_bits!(op, self.order[w][filt], order_bits);
                if self.order[w][filt] != 0 {
                    syn_flag!(op, self.direction[w][filt]);
                    syn_flag!(op, self.coef_compress[w][filt]);
                    let coef_bits = start_coef_bits - u32::from(self.coef_compress[w][filt]);
                    for i in 0..usize::from(self.order[w][filt]) {
                        syn_bits!(op, self.coef[w][filt][i], coef_bits);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Table 4.12 – gain_control_data.
#[derive(Debug, Clone)]
pub struct GainControlData {
    pub max_band: u8,
    pub adjust_num: [[u8; 8]; 4],
    pub alevcode: [[[u8; 8]; 8]; 4],
    pub aloccode: [[[u8; 8]; 8]; 4],
}

impl Default for GainControlData {
    fn default() -> Self {
        Self {
            max_band: 0,
            adjust_num: [[0; 8]; 4],
            alevcode: [[[0; 8]; 8]; 4],
            aloccode: [[[0; 8]; 8]; 4],
        }
    }
}

impl GainControlData {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O, ics_info: &IcsInfo) -> Result<()> {
        syn_bits!(op, self.max_band, 2);
        // Window count and location widths vary with the window sequence.
        let (num_wd, loc_bits): (usize, [u32; 8]) = match ics_info.window_sequence {
            WindowSequence::OnlyLong => (1, [5; 8]),
            WindowSequence::LongStart => (2, [4, 2, 0, 0, 0, 0, 0, 0]),
            WindowSequence::EightShort => (8, [2; 8]),
            WindowSequence::LongStop => (2, [4, 5, 0, 0, 0, 0, 0, 0]),
        };
        for bd in 1..usize::from(self.max_band) {
            for wd in 0..num_wd {
                syn_bits!(op, self.adjust_num[bd][wd], 3);
                for ad in 0..usize::from(self.adjust_num[bd][wd]) {
                    syn_bits!(op, self.alevcode[bd][wd][ad], 4);
                    syn_bits!(op, self.aloccode[bd][wd][ad], loc_bits[wd]);
                }
            }
        }
        Ok(())
    }
}

/// Table 4.56 – spectral_data.
///
/// Spectral coefficients are decoded to validate the Huffman stream and
/// then discarded; the data model does not retain them, so only the read
/// mode traverses this production.
pub(crate) fn spectral_data<O: SyntaxOp>(
    op: &mut O,
    ctx: &Context,
    section_data: &SectionData,
) -> Result<()> {
    if O::KIND != OpKind::Read {
        return Ok(());
    }
    for g in 0..usize::from(ctx.info.num_window_groups) {
        for i in 0..usize::from(section_data.num_sec[g]) {
            let cb = section_data.sect_cb[g][i];
            if cb == ZERO_HCB || cb == NOISE_HCB || cb == INTENSITY_HCB || cb == INTENSITY_HCB2 {
                continue;
            }
            let start = ctx.info.sect_sfb_offset[g][usize::from(section_data.sect_start[g][i])];
            let end = ctx.info.sect_sfb_offset[g][usize::from(section_data.sect_end[g][i])];
            let mut k = start;
            while k < end {
                op.spectral_step(cb)?;
                k += if cb < FIRST_PAIR_HCB { 4 } else { 2 };
            }
        }
    }
    Ok(())
}

/// Table 4.50 – individual_channel_stream.
#[derive(Debug, Clone, Default)]
pub struct Ics {
    pub global_gain: u8,
    pub ics_info: IcsInfo,
    pub section_data: SectionData,
    pub scale_factor_data: ScaleFactorData,
    pub pulse_data_present: bool,
    pub pulse_data: PulseData,
    pub tns_data_present: bool,
    pub tns_data: TnsData,
    pub gain_control_data_present: bool,
    pub gain_control_data: GainControlData,
    pub length_of_reordered_spectral_data: u16,
    pub length_of_longest_codeword: u8,
}

impl Ics {
    pub(crate) fn syntax<O: SyntaxOp>(
        &mut self,
        op: &mut O,
        ctx: &mut Context,
        common_window: bool,
        scale_flag: bool,
    ) -> Result<()> {
        syn_bits!(op, self.global_gain, 8);
        if !common_window && !scale_flag {
            self.ics_info.syntax(op, ctx, common_window)?;
            ctx.set_grouping_info(&self.ics_info)?;
        }
        self.section_data.syntax(op, ctx, &self.ics_info)?;
        self.scale_factor_data
            .syntax(op, ctx, &self.ics_info, &self.section_data)?;

        if !scale_flag {
            syn_flag!(op, self.pulse_data_present);
            if self.pulse_data_present {
                self.pulse_data.syntax(op)?;
            }
            syn_flag!(op, self.tns_data_present);
            if self.tns_data_present {
                self.tns_data.syntax(op, ctx, &self.ics_info)?;
            }
            syn_flag!(op, self.gain_control_data_present);
            if self.gain_control_data_present {
                self.gain_control_data.syntax(op, &self.ics_info)?;
            }
        }
        if ctx.spectral_data_resilience() {
            syn_bits!(op, self.length_of_reordered_spectral_data, 14);
            syn_bits!(op, self.length_of_longest_codeword, 6);
            bail!(SyntaxError::Unsupported("reordered_spectral_data"));
        }
        spectral_data(op, ctx, &self.section_data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format;
    use crate::syntax::{ReadOp, WriteOp};
    use crate::utils::bitstream_io::BsIoSliceReader;

    fn adts_ctx() -> Context {
        let mut ctx = Context::new();
        ctx.set_adts(
            crate::structs::adts::Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS)
                .unwrap(),
        );
        ctx
    }

    #[test]
    fn ics_info_long_window() -> Result<()> {
        let ctx = adts_ctx();
        // reserved(0) sequence(00) shape(1) max_sfb(000101) predictor(0)
        let buf = [0b0_00_1_0001, 0b01_0_00000];
        let mut op = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut info = IcsInfo::default();
        info.syntax(&mut op, &ctx, false)?;

        assert_eq!(info.window_sequence, WindowSequence::OnlyLong);
        assert!(info.window_shape);
        assert_eq!(info.max_sfb, 5);
        assert!(!info.predictor_data_present);
        assert_eq!(op.bs.position()?, 11);
        Ok(())
    }

    #[test]
    fn ics_info_ltp_is_unsupported() {
        let ctx = adts_ctx();
        // Long window, predictor_data_present with ltp bit set.
        let buf = [0b0_00_1_0001, 0b01_1_1_0000];
        let mut op = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut info = IcsInfo::default();
        let err = info.syntax(&mut op, &ctx, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::Unsupported("ltp_data"))
        ));
    }

    #[test]
    fn section_data_roundtrip_with_escapes() -> Result<()> {
        let mut ctx = adts_ctx();
        let ics_info = IcsInfo {
            window_sequence: WindowSequence::OnlyLong,
            max_sfb: 40,
            ..Default::default()
        };
        ctx.set_grouping_info(&ics_info)?;

        // Two sections: 31 + 2 bands of zero, then 7 bands of codebook 2.
        let mut sections = SectionData::default();
        sections.num_sec[0] = 2;
        sections.sect_cb[0][0] = ZERO_HCB;
        sections.sect_start[0][0] = 0;
        sections.sect_end[0][0] = 33;
        sections.sect_cb[0][1] = 2;
        sections.sect_start[0][1] = 33;
        sections.sect_end[0][1] = 40;

        let mut wop = WriteOp::default();
        sections.syntax(&mut wop, &ctx, &ics_info)?;
        wop.bw.write_trailing_bits()?;
        let buf = wop.bw.into_vec()?;

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = SectionData::default();
        parsed.syntax(&mut rop, &ctx, &ics_info)?;

        assert_eq!(parsed.num_sec[0], 2);
        assert_eq!(parsed.sect_end[0][0], 33);
        assert_eq!(parsed.sect_cb[0][1], 2);
        assert_eq!(parsed.sect_end[0][1], 40);
        assert!(parsed.sfb_cb[0][..33].iter().all(|&cb| cb == ZERO_HCB));
        assert!(parsed.sfb_cb[0][33..40].iter().all(|&cb| cb == 2));
        Ok(())
    }

    #[test]
    fn section_run_past_max_sfb_is_rejected() {
        let mut ctx = adts_ctx();
        let ics_info = IcsInfo {
            window_sequence: WindowSequence::OnlyLong,
            max_sfb: 2,
            ..Default::default()
        };
        ctx.set_grouping_info(&ics_info).unwrap();

        // Codebook 1, run length 5 > max_sfb.
        let buf = [0b0001_0010, 0b10_000000];
        let mut op = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut sections = SectionData::default();
        let err = sections.syntax(&mut op, &ctx, &ics_info).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::SectionOverflow { .. })
        ));
    }

    #[test]
    fn scale_factor_noise_first_occurrence_is_pcm() -> Result<()> {
        let mut ctx = adts_ctx();
        let ics_info = IcsInfo {
            window_sequence: WindowSequence::OnlyLong,
            max_sfb: 3,
            ..Default::default()
        };
        ctx.set_grouping_info(&ics_info)?;

        let mut sections = SectionData::default();
        sections.num_sec[0] = 1;
        sections.sfb_cb[0] = {
            let mut cbs = [0u8; MAX_SFB];
            cbs[0] = NOISE_HCB;
            cbs[1] = NOISE_HCB;
            cbs[2] = INTENSITY_HCB;
            cbs
        };

        let mut data = ScaleFactorData::default();
        data.dpcm_noise_nrg[0][0] = 0x155;
        data.dpcm_noise_nrg[0][1] = 60;
        data.dpcm_is_position[0][2] = 61;

        let mut wop = WriteOp::default();
        data.syntax(&mut wop, &ctx, &ics_info, &sections)?;
        wop.bw.write_trailing_bits()?;
        let buf = wop.bw.into_vec()?;

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = ScaleFactorData::default();
        parsed.syntax(&mut rop, &ctx, &ics_info, &sections)?;
        assert_eq!(parsed.dpcm_noise_nrg[0][0], 0x155);
        assert_eq!(parsed.dpcm_noise_nrg[0][1], 60);
        assert_eq!(parsed.dpcm_is_position[0][2], 61);
        Ok(())
    }

    #[test]
    fn pulse_data_roundtrip() -> Result<()> {
        let mut pulse = PulseData {
            number_pulse: 1,
            pulse_start_sfb: 17,
            pulse_offset: [3, 9, 0, 0],
            pulse_amp: [5, 12, 0, 0],
        };

        let mut wop = WriteOp::default();
        pulse.syntax(&mut wop)?;
        wop.bw.write_trailing_bits()?;
        let buf = wop.bw.into_vec()?;

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = PulseData::default();
        parsed.syntax(&mut rop)?;
        assert_eq!(parsed.number_pulse, 1);
        assert_eq!(parsed.pulse_start_sfb, 17);
        assert_eq!(parsed.pulse_offset[..2], [3, 9]);
        assert_eq!(parsed.pulse_amp[..2], [5, 12]);
        Ok(())
    }

    #[test]
    fn tns_data_roundtrip() -> Result<()> {
        let mut ctx = adts_ctx();
        let ics_info = IcsInfo {
            window_sequence: WindowSequence::OnlyLong,
            max_sfb: 10,
            ..Default::default()
        };
        ctx.set_grouping_info(&ics_info)?;

        let mut tns = TnsData::default();
        tns.n_filt[0] = 1;
        tns.coef_res[0] = true;
        tns.length[0][0] = 12;
        tns.order[0][0] = 3;
        tns.direction[0][0] = true;
        tns.coef_compress[0][0] = false;
        tns.coef[0][0][..3].copy_from_slice(&[1, 7, 14]);

        let mut wop = WriteOp::default();
        tns.syntax(&mut wop, &ctx, &ics_info)?;
        wop.bw.write_trailing_bits()?;
        let buf = wop.bw.into_vec()?;

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = TnsData::default();
        parsed.syntax(&mut rop, &ctx, &ics_info)?;
        assert_eq!(parsed.n_filt[0], 1);
        assert!(parsed.coef_res[0]);
        assert_eq!(parsed.length[0][0], 12);
        assert_eq!(parsed.order[0][0], 3);
        assert!(parsed.direction[0][0]);
        assert_eq!(parsed.coef[0][0][..3], [1, 7, 14]);
        Ok(())
    }
}
