//! Syntactic elements and the raw_data_block.
//!
//! Covers single_channel_element (Table 4.4), channel_pair_element (4.5),
//! coupling_channel_element (4.8), data_stream_element (4.10),
//! program_config_element (4.2), fill_element (4.11) with
//! extension_payload (4.57), and the raw_data_block (4.3).

use anyhow::{Result, anyhow, bail};
use log::trace;

use crate::ctx::Context;
use crate::structs::ics::{Ics, IcsInfo, ZERO_HCB};
use crate::structs::{MAX_SFB, MAX_SYN_ELE, MAX_WINDOW_GROUPS};
use crate::syntax::{OpKind, SyntaxOp};
use crate::utils::errors::SyntaxError;
use crate::{syn_bits, syn_flag};

/// Table 4.85 – syntactic element ids.
pub const ID_SCE: u8 = 0x0;
pub const ID_CPE: u8 = 0x1;
pub const ID_CCE: u8 = 0x2;
pub const ID_LFE: u8 = 0x3;
pub const ID_DSE: u8 = 0x4;
pub const ID_PCE: u8 = 0x5;
pub const ID_FIL: u8 = 0x6;
pub const ID_END: u8 = 0x7;

/// Table 4.121 – extension payload types.
pub const EXT_TYPE_FILL: u8 = 0x0;
pub const EXT_TYPE_FILL_DATA: u8 = 0x1;
pub const EXT_DATA_ELEMENT: u8 = 0x2;
pub const EXT_DYNAMIC_RANGE: u8 = 0xB;
pub const EXT_SAC_DATA: u8 = 0xC;
pub const EXT_SBR_DATA: u8 = 0xD;
pub const EXT_SBR_DATA_CRC: u8 = 0xE;

/// Table 4.4 – single_channel_element.
#[derive(Debug, Clone, Default)]
pub struct Sce {
    pub element_instance_tag: u8,
    pub ics: Ics,
}

impl Sce {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O, ctx: &mut Context) -> Result<()> {
        syn_bits!(op, self.element_instance_tag, 4);
        op.begin_struct("individual_channel_stream")?;
        self.ics.syntax(op, ctx, false, false)?;
        op.end_struct("individual_channel_stream")?;
        Ok(())
    }
}

/// Table 4.5 – channel_pair_element.
#[derive(Debug, Clone)]
pub struct Cpe {
    pub element_instance_tag: u8,
    pub common_window: bool,
    pub ics_info: IcsInfo,
    pub ms_mask_present: u8,
    pub ms_used: [[bool; MAX_SFB]; MAX_WINDOW_GROUPS],
    pub ics1: Ics,
    pub ics2: Ics,
}

impl Default for Cpe {
    fn default() -> Self {
        Self {
            element_instance_tag: 0,
            common_window: false,
            ics_info: IcsInfo::default(),
            ms_mask_present: 0,
            ms_used: [[false; MAX_SFB]; MAX_WINDOW_GROUPS],
            ics1: Ics::default(),
            ics2: Ics::default(),
        }
    }
}

impl Cpe {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O, ctx: &mut Context) -> Result<()> {
        syn_bits!(op, self.element_instance_tag, 4);
        syn_flag!(op, self.common_window);
        if self.common_window {
            self.ics_info.syntax(op, ctx, true)?;
            ctx.set_grouping_info(&self.ics_info)?;
            self.ics1.ics_info = self.ics_info.clone();
            self.ics2.ics_info = self.ics_info.clone();
            syn_bits!(op, self.ms_mask_present, 2);
            if self.ms_mask_present == 1 {
                for g in 0..usize::from(ctx.info.num_window_groups) {
                    for sfb in 0..usize::from(self.ics_info.max_sfb) {
                        syn_flag!(op, self.ms_used[g][sfb]);
                    }
                }
            }
        }

        op.begin_array("individual_channel_stream")?;
        op.begin_array_item()?;
        let common_window = self.common_window;
        self.ics1.syntax(op, ctx, common_window, false)?;
        op.end_array_item()?;
        op.begin_array_item()?;
        self.ics2.syntax(op, ctx, common_window, false)?;
        op.end_array_item()?;
        op.end_array("individual_channel_stream")?;
        Ok(())
    }
}

/// One gain element list of a coupling channel element.
#[derive(Debug, Clone)]
pub struct CceGain {
    pub common_gain_element_present: bool,
    pub common_gain_element: i16,
    pub dpcm_gain_element: Box<[[i16; MAX_SFB]; MAX_WINDOW_GROUPS]>,
}

impl Default for CceGain {
    fn default() -> Self {
        Self {
            common_gain_element_present: false,
            common_gain_element: 0,
            dpcm_gain_element: Box::new([[0; MAX_SFB]; MAX_WINDOW_GROUPS]),
        }
    }
}

/// Table 4.8 – coupling_channel_element.
#[derive(Debug, Clone, Default)]
pub struct Cce {
    pub element_instance_tag: u8,
    pub ind_sw_cce_flag: bool,
    pub num_coupled_element: u8,
    pub cc_target_is_cpe: [bool; 8],
    pub cc_target_tag_select: [u8; 8],
    pub cc_l: [bool; 8],
    pub cc_r: [bool; 8],
    pub cc_domain: bool,
    pub gain_element_sign: bool,
    pub gain_element_scale: u8,
    pub ics: Ics,
    /// Gain element lists 1.. of the element (list 0 is implicit).
    pub gain_elements: Vec<CceGain>,
}

impl Cce {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O, ctx: &mut Context) -> Result<()> {
        syn_bits!(op, self.element_instance_tag, 4);
        syn_flag!(op, self.ind_sw_cce_flag);
        syn_bits!(op, self.num_coupled_element, 3);

        let mut num_gain_element_lists = 0usize;
        for c in 0..=usize::from(self.num_coupled_element) {
            num_gain_element_lists += 1;
            syn_flag!(op, self.cc_target_is_cpe[c]);
            syn_bits!(op, self.cc_target_tag_select[c], 4);
            if self.cc_target_is_cpe[c] {
                syn_flag!(op, self.cc_l[c]);
                syn_flag!(op, self.cc_r[c]);
                if self.cc_l[c] && self.cc_r[c] {
                    num_gain_element_lists += 1;
                }
            }
        }
        syn_flag!(op, self.cc_domain);
        syn_flag!(op, self.gain_element_sign);
        syn_bits!(op, self.gain_element_scale, 2);

        self.ics.syntax(op, ctx, false, false)?;

        if O::KIND == OpKind::Read {
            self.gain_elements.clear();
            self.gain_elements
                .resize_with(num_gain_element_lists.saturating_sub(1), CceGain::default);
        } else if self.gain_elements.len() + 1 != num_gain_element_lists {
            return Err(anyhow!(
                "coupling gain element count mismatch: {} lists stored, {} derived",
                self.gain_elements.len() + 1,
                num_gain_element_lists
            ));
        }

        let num_window_groups = usize::from(ctx.info.num_window_groups);
        let max_sfb = usize::from(self.ics.ics_info.max_sfb);
        for c in 1..num_gain_element_lists {
            let gain = &mut self.gain_elements[c - 1];
            let common = if self.ind_sw_cce_flag {
                true
            } else {
                syn_flag!(op, gain.common_gain_element_present);
                gain.common_gain_element_present
            };
            if common {
                let v = op.huffman_scale_factor(
                    "common_gain_element",
                    i64::from(gain.common_gain_element),
                )?;
                gain.common_gain_element = v as i16;
                continue;
            }
            for g in 0..num_window_groups {
                for sfb in 0..max_sfb {
                    if self.ics.section_data.sfb_cb[g][sfb] != ZERO_HCB {
                        let v = op.huffman_scale_factor(
                            "dpcm_gain_element",
                            i64::from(gain.dpcm_gain_element[g][sfb]),
                        )?;
                        gain.dpcm_gain_element[g][sfb] = v as i16;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Table 4.10 – data_stream_element.
///
/// Payload bytes are consumed but not retained. Despite
/// `data_byte_align_flag`, the stream is not re-aligned before the payload
/// bytes are consumed.
#[derive(Debug, Clone, Default)]
pub struct Dse {
    pub element_instance_tag: u8,
    pub data_byte_align_flag: bool,
    pub count: u8,
    pub esc_count: u8,
}

impl Dse {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O) -> Result<()> {
        syn_bits!(op, self.element_instance_tag, 4);
        syn_flag!(op, self.data_byte_align_flag);
        syn_bits!(op, self.count, 8);
        let mut cnt = usize::from(self.count);
        if self.count == 255 {
            syn_bits!(op, self.esc_count, 8);
            cnt += usize::from(self.esc_count);
        }
        for _ in 0..cnt {
            op.bits("data_stream_byte", 0, 8)?;
        }
        Ok(())
    }
}

/// Table 4.2 – program_config_element.
#[derive(Debug, Clone)]
pub struct Pce {
    pub element_instance_tag: u8,
    pub object_type: u8,
    pub sampling_frequency_index: u8,
    pub num_front_channel_elements: u8,
    pub num_side_channel_elements: u8,
    pub num_back_channel_elements: u8,
    pub num_lfe_channel_elements: u8,
    pub num_assoc_data_elements: u8,
    pub num_valid_cc_elements: u8,
    pub mono_mixdown_present: bool,
    pub mono_mixdown_element_number: u8,
    pub stereo_mixdown_present: bool,
    pub stereo_mixdown_element_number: u8,
    pub matrix_mixdown_idx_present: bool,
    pub matrix_mixdown_idx: u8,
    pub pseudo_surround_enable: bool,
    pub front_element_is_cpe: [bool; 16],
    pub front_element_tag_select: [u8; 16],
    pub side_element_is_cpe: [bool; 16],
    pub side_element_tag_select: [u8; 16],
    pub back_element_is_cpe: [bool; 16],
    pub back_element_tag_select: [u8; 16],
    pub lfe_element_tag_select: [u8; 4],
    pub assoc_data_element_tag_select: [u8; 8],
    pub cc_element_is_ind_sw: [bool; 16],
    pub valid_cc_element_tag_select: [u8; 16],
    pub comment_field_bytes: u8,
    pub comment_field_data: [u8; 255],
}

impl Default for Pce {
    fn default() -> Self {
        Self {
            element_instance_tag: 0,
            object_type: 0,
            sampling_frequency_index: 0,
            num_front_channel_elements: 0,
            num_side_channel_elements: 0,
            num_back_channel_elements: 0,
            num_lfe_channel_elements: 0,
            num_assoc_data_elements: 0,
            num_valid_cc_elements: 0,
            mono_mixdown_present: false,
            mono_mixdown_element_number: 0,
            stereo_mixdown_present: false,
            stereo_mixdown_element_number: 0,
            matrix_mixdown_idx_present: false,
            matrix_mixdown_idx: 0,
            pseudo_surround_enable: false,
            front_element_is_cpe: [false; 16],
            front_element_tag_select: [0; 16],
            side_element_is_cpe: [false; 16],
            side_element_tag_select: [0; 16],
            back_element_is_cpe: [false; 16],
            back_element_tag_select: [0; 16],
            lfe_element_tag_select: [0; 4],
            assoc_data_element_tag_select: [0; 8],
            cc_element_is_ind_sw: [false; 16],
            valid_cc_element_tag_select: [0; 16],
            comment_field_bytes: 0,
            comment_field_data: [0; 255],
        }
    }
}

impl Pce {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O) -> Result<()> {
        syn_bits!(op, self.element_instance_tag, 4);
        syn_bits!(op, self.object_type, 2);
        syn_bits!(op, self.sampling_frequency_index, 4);
        syn_bits!(op, self.num_front_channel_elements, 4);
        syn_bits!(op, self.num_side_channel_elements, 4);
        syn_bits!(op, self.num_back_channel_elements, 4);
        syn_bits!(op, self.num_lfe_channel_elements, 2);
        syn_bits!(op, self.num_assoc_data_elements, 3);
        syn_bits!(op, self.num_valid_cc_elements, 4);
        syn_flag!(op, self.mono_mixdown_present);
        if self.mono_mixdown_present {
            syn_bits!(op, self.mono_mixdown_element_number, 4);
        }
        syn_flag!(op, self.stereo_mixdown_present);
        if self.stereo_mixdown_present {
            syn_bits!(op, self.stereo_mixdown_element_number, 4);
        }
        syn_flag!(op, self.matrix_mixdown_idx_present);
        if self.matrix_mixdown_idx_present {
            syn_bits!(op, self.matrix_mixdown_idx, 2);
            syn_flag!(op, self.pseudo_surround_enable);
        }

        for i in 0..usize::from(self.num_front_channel_elements) {
            syn_flag!(op, self.front_element_is_cpe[i]);
            syn_bits!(op, self.front_element_tag_select[i], 4);
        }
        for i in 0..usize::from(self.num_side_channel_elements) {
            syn_flag!(op, self.side_element_is_cpe[i]);
            syn_bits!(op, self.side_element_tag_select[i], 4);
        }
        for i in 0..usize::from(self.num_back_channel_elements) {
            syn_flag!(op, self.back_element_is_cpe[i]);
            syn_bits!(op, self.back_element_tag_select[i], 4);
        }
        for i in 0..usize::from(self.num_lfe_channel_elements) {
            syn_bits!(op, self.lfe_element_tag_select[i], 4);
        }
        for i in 0..usize::from(self.num_assoc_data_elements) {
            syn_bits!(op, self.assoc_data_element_tag_select[i], 4);
        }
        for i in 0..usize::from(self.num_valid_cc_elements) {
            syn_flag!(op, self.cc_element_is_ind_sw[i]);
            syn_bits!(op, self.valid_cc_element_tag_select[i], 4);
        }

        // Byte alignment before the comment field exists on the read path
        // only; the writer does not align here.
        if O::KIND == OpKind::Read {
            op.trailing_bits()?;
        }

        syn_bits!(op, self.comment_field_bytes, 8);
        for i in 0..usize::from(self.comment_field_bytes) {
            syn_bits!(op, self.comment_field_data[i], 8);
        }
        Ok(())
    }
}

/// Table 4.57 – extension_payload.
#[derive(Debug, Clone, Default)]
pub struct ExtensionPayload {
    pub extension_type: u8,
}

impl ExtensionPayload {
    /// Transfers one payload of at most `count` bytes, returning the number
    /// of bytes consumed.
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O, count: usize) -> Result<usize> {
        syn_bits!(op, self.extension_type, 4);
        match self.extension_type {
            EXT_TYPE_FILL_DATA => {
                let fill_nibble = op.bits("fill_nibble", 0, 4)? as u8;
                if fill_nibble != 0 {
                    bail!(SyntaxError::BadFillNibble(fill_nibble));
                }
                for _ in 0..count - 1 {
                    let fill_byte = op.bits("fill_byte", 0xA5, 8)? as u8;
                    if fill_byte != 0xA5 {
                        bail!(SyntaxError::BadFillByte(fill_byte));
                    }
                }
                Ok(count)
            }

            EXT_DATA_ELEMENT => bail!(SyntaxError::Unsupported("data_element")),
            EXT_DYNAMIC_RANGE => bail!(SyntaxError::Unsupported("dynamic_range_info")),
            EXT_SAC_DATA => bail!(SyntaxError::Unsupported("sac_extension_data")),
            EXT_SBR_DATA => bail!(SyntaxError::Unsupported("sbr_extension_data")),
            EXT_SBR_DATA_CRC => bail!(SyntaxError::Unsupported("sbr_extension_data with CRC")),

            _ => {
                for _ in 0..8 * (count - 1) + 4 {
                    op.bits("other_bits", 0, 1)?;
                }
                Ok(count)
            }
        }
    }
}

/// Table 4.11 – fill_element.
#[derive(Debug, Clone, Default)]
pub struct Fil {
    pub count: u16,
    pub extension_payload: ExtensionPayload,
}

impl Fil {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O) -> Result<()> {
        match O::KIND {
            OpKind::Read => {
                let mut cnt = op.bits("count", 0, 4)? as usize;
                if cnt == 15 {
                    let esc_count = op.bits("esc_count", 0, 8)? as usize;
                    cnt = cnt + esc_count - 1;
                }
                self.count = cnt as u16;
                while cnt > 0 {
                    cnt -= self.extension_payload.syntax(op, cnt)?;
                }
            }
            OpKind::Write => {
                let (count, esc_count) = if self.count >= 15 {
                    (15, self.count - 14)
                } else {
                    (self.count, 0)
                };
                op.bits("count", u64::from(count), 4)?;
                if esc_count != 0 {
                    op.bits("esc_count", u64::from(esc_count), 8)?;
                }
                // The payload is emitted as zero bytes, which read back as
                // a FILL extension payload of the same length.
                for _ in 0..self.count {
                    op.bits("fill_byte", 0, 8)?;
                }
            }
            OpKind::Dump => {
                op.bits("count", u64::from(self.count), 0)?;
            }
        }
        Ok(())
    }
}

/// One tagged element of a raw_data_block.
#[derive(Debug, Clone)]
pub enum SyntacticElement {
    Sce(Box<Sce>),
    Cpe(Box<Cpe>),
    Cce(Box<Cce>),
    Dse(Dse),
    Pce(Box<Pce>),
    Fil(Fil),
    End,
}

impl SyntacticElement {
    pub fn id(&self) -> u8 {
        match self {
            Self::Sce(_) => ID_SCE,
            Self::Cpe(_) => ID_CPE,
            Self::Cce(_) => ID_CCE,
            Self::Dse(_) => ID_DSE,
            Self::Pce(_) => ID_PCE,
            Self::Fil(_) => ID_FIL,
            Self::End => ID_END,
        }
    }
}

/// Table 4.3 – raw_data_block.
#[derive(Debug, Clone, Default)]
pub struct RawDataBlock {
    pub elements: Vec<SyntacticElement>,
}

impl RawDataBlock {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O, ctx: &mut Context) -> Result<()> {
        match O::KIND {
            OpKind::Read => self.read(op, ctx),
            OpKind::Write | OpKind::Dump => self.emit(op, ctx),
        }
    }

    fn read<O: SyntaxOp>(&mut self, op: &mut O, ctx: &mut Context) -> Result<()> {
        *self = Self::default();
        loop {
            if self.elements.len() == MAX_SYN_ELE {
                bail!(SyntaxError::TooManyElements(MAX_SYN_ELE));
            }
            let id = op.bits("id_syn_ele", 0, 3)? as u8;
            match id {
                ID_SCE => {
                    trace!("syntactic element: SCE");
                    op.begin_struct("single_channel_element")?;
                    let mut sce = Box::<Sce>::default();
                    sce.syntax(op, ctx)?;
                    op.end_struct("single_channel_element")?;
                    self.elements.push(SyntacticElement::Sce(sce));
                }
                ID_CPE => {
                    trace!("syntactic element: CPE");
                    op.begin_struct("channel_pair_element")?;
                    let mut cpe = Box::<Cpe>::default();
                    cpe.syntax(op, ctx)?;
                    op.end_struct("channel_pair_element")?;
                    self.elements.push(SyntacticElement::Cpe(cpe));
                }
                ID_CCE => {
                    trace!("syntactic element: CCE");
                    op.begin_struct("coupling_channel_element")?;
                    let mut cce = Box::<Cce>::default();
                    cce.syntax(op, ctx)?;
                    op.end_struct("coupling_channel_element")?;
                    self.elements.push(SyntacticElement::Cce(cce));
                }
                ID_LFE => {
                    trace!("syntactic element: LFE");
                    bail!(SyntaxError::Unsupported("LFE channel element"));
                }
                ID_DSE => {
                    trace!("syntactic element: DSE");
                    op.begin_struct("data_stream_element")?;
                    let mut dse = Dse::default();
                    dse.syntax(op)?;
                    op.end_struct("data_stream_element")?;
                    self.elements.push(SyntacticElement::Dse(dse));
                }
                ID_PCE => {
                    trace!("syntactic element: PCE");
                    op.begin_struct("program_config_element")?;
                    let mut pce = Box::<Pce>::default();
                    pce.syntax(op)?;
                    op.end_struct("program_config_element")?;
                    self.elements.push(SyntacticElement::Pce(pce));
                }
                ID_FIL => {
                    trace!("syntactic element: FIL");
                    op.begin_struct("fill_element")?;
                    let mut fil = Fil::default();
                    fil.syntax(op)?;
                    op.end_struct("fill_element")?;
                    self.elements.push(SyntacticElement::Fil(fil));
                }
                _ => {
                    trace!("syntactic element: END");
                    self.elements.push(SyntacticElement::End);
                    op.trailing_bits()?;
                    return Ok(());
                }
            }
        }
    }

    fn emit<O: SyntaxOp>(&mut self, op: &mut O, ctx: &mut Context) -> Result<()> {
        for element in &mut self.elements {
            op.bits("id_syn_ele", u64::from(element.id()), 3)?;
            match element {
                SyntacticElement::Sce(sce) => {
                    op.begin_struct("single_channel_element")?;
                    sce.syntax(op, ctx)?;
                    op.end_struct("single_channel_element")?;
                }
                SyntacticElement::Cpe(cpe) => {
                    op.begin_struct("channel_pair_element")?;
                    cpe.syntax(op, ctx)?;
                    op.end_struct("channel_pair_element")?;
                }
                SyntacticElement::Cce(cce) => {
                    op.begin_struct("coupling_channel_element")?;
                    cce.syntax(op, ctx)?;
                    op.end_struct("coupling_channel_element")?;
                }
                SyntacticElement::Dse(dse) => {
                    op.begin_struct("data_stream_element")?;
                    dse.syntax(op)?;
                    op.end_struct("data_stream_element")?;
                }
                SyntacticElement::Pce(pce) => {
                    op.begin_struct("program_config_element")?;
                    pce.syntax(op)?;
                    op.end_struct("program_config_element")?;
                }
                SyntacticElement::Fil(fil) => {
                    op.begin_struct("fill_element")?;
                    fil.syntax(op)?;
                    op.end_struct("fill_element")?;
                }
                SyntacticElement::End => break,
            }
        }
        if O::KIND == OpKind::Write {
            op.trailing_bits()?;
        }
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
    fn dse_consumes_payload_without_realignment() -> Result<()> {
        let mut dse = Dse {
            element_instance_tag: 9,
            data_byte_align_flag: true,
            count: 3,
            ..Default::default()
        };

        let mut wop = WriteOp::default();
        dse.syntax(&mut wop)?;
        wop.bw.write_trailing_bits()?;
        let buf = wop.bw.into_vec()?;
        // tag(4) + align(1) + count(8) + 3 payload bytes.
        assert_eq!(buf.len(), 5);

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = Dse::default();
        parsed.syntax(&mut rop)?;
        assert_eq!(parsed.element_instance_tag, 9);
        assert!(parsed.data_byte_align_flag);
        assert_eq!(parsed.count, 3);
        assert_eq!(rop.bs.position()?, 4 + 1 + 8 + 3 * 8);
        Ok(())
    }

    #[test]
    fn dse_escape_count() -> Result<()> {
        let mut dse = Dse {
            count: 255,
            esc_count: 10,
            ..Default::default()
        };
        let mut wop = WriteOp::default();
        dse.syntax(&mut wop)?;
        wop.bw.write_trailing_bits()?;
        let buf = wop.bw.into_vec()?;

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = Dse::default();
        parsed.syntax(&mut rop)?;
        assert_eq!(parsed.count, 255);
        assert_eq!(parsed.esc_count, 10);
        assert_eq!(rop.bs.position()?, 4 + 1 + 8 + 8 + 265 * 8);
        Ok(())
    }

    #[test]
    fn fil_roundtrip_small() -> Result<()> {
        let mut fil = Fil {
            count: 6,
            ..Default::default()
        };
        let mut wop = WriteOp::default();
        fil.syntax(&mut wop)?;
        wop.bw.write_trailing_bits()?;
        let buf = wop.bw.into_vec()?;

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = Fil::default();
        parsed.syntax(&mut rop)?;
        assert_eq!(parsed.count, 6);
        assert_eq!(parsed.extension_payload.extension_type, EXT_TYPE_FILL);
        Ok(())
    }

    #[test]
    fn fil_roundtrip_escape_count() -> Result<()> {
        let mut fil = Fil {
            count: 200,
            ..Default::default()
        };
        let mut wop = WriteOp::default();
        fil.syntax(&mut wop)?;
        wop.bw.write_trailing_bits()?;
        let buf = wop.bw.into_vec()?;
        // count nibble + escape byte + 200 payload bytes, byte aligned.
        assert_eq!(buf.len(), (4usize + 8 + 200 * 8).div_ceil(8));

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = Fil::default();
        parsed.syntax(&mut rop)?;
        assert_eq!(parsed.count, 200);
        Ok(())
    }

    #[test]
    fn fill_data_payload_validated() {
        // extension_type FILL_DATA with a bad nibble.
        let buf = [0b0001_1000, 0x00];
        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut payload = ExtensionPayload::default();
        let err = payload.syntax(&mut rop, 2).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::BadFillNibble(8))
        ));

        // Good nibble, bad fill byte.
        let buf = [0b0001_0000, 0x5A];
        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut payload = ExtensionPayload::default();
        let err = payload.syntax(&mut rop, 2).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::BadFillByte(0x5A))
        ));

        // Good nibble, correct 0xA5 fill bytes.
        let buf = [0b0001_0000, 0xA5, 0xA5, 0x00];
        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut payload = ExtensionPayload::default();
        assert_eq!(payload.syntax(&mut rop, 3).unwrap(), 3);
    }

    #[test]
    fn sbr_extension_payload_is_unsupported() {
        let buf = [0xD0, 0x00];
        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut payload = ExtensionPayload::default();
        let err = payload.syntax(&mut rop, 2).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::Unsupported("sbr_extension_data"))
        ));
    }

    #[test]
    fn pce_roundtrip_realigns_before_comment() -> Result<()> {
        let mut pce = Box::<Pce>::default();
        pce.element_instance_tag = 1;
        pce.object_type = 1;
        pce.sampling_frequency_index = 3;
        pce.num_front_channel_elements = 2;
        pce.front_element_is_cpe[1] = true;
        pce.front_element_tag_select[0] = 4;
        pce.front_element_tag_select[1] = 7;
        // The writer does not align before the comment field, so build the
        // read vector from an empty-comment write: the element lists end at
        // bit 44, the zero comment count plus trailing padding leave the
        // final byte zero. Replacing that byte places the comment field at
        // the byte boundary the reader aligns to.
        let mut bw = WriteOp::default();
        pce.syntax(&mut bw)?;
        bw.bw.write_trailing_bits()?;
        let mut buf = bw.bw.into_vec()?;
        buf.pop();
        buf.push(2);
        buf.extend_from_slice(b"hi");

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = Box::<Pce>::default();
        parsed.syntax(&mut rop)?;
        assert_eq!(parsed.element_instance_tag, 1);
        assert_eq!(parsed.num_front_channel_elements, 2);
        assert!(parsed.front_element_is_cpe[1]);
        assert_eq!(parsed.comment_field_bytes, 2);
        assert_eq!(&parsed.comment_field_data[..2], b"hi");
        Ok(())
    }

    #[test]
    fn raw_data_block_end_only() -> Result<()> {
        let mut ctx = adts_ctx();
        // END tag followed by zero padding.
        let buf = [0b111_00000];
        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut block = RawDataBlock::default();
        block.syntax(&mut rop, &mut ctx)?;
        assert_eq!(block.elements.len(), 1);
        assert!(matches!(block.elements[0], SyntacticElement::End));
        Ok(())
    }

    #[test]
    fn raw_data_block_lfe_unsupported() {
        let mut ctx = adts_ctx();
        let buf = [0b011_00000];
        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut block = RawDataBlock::default();
        let err = block.syntax(&mut rop, &mut ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::Unsupported("LFE channel element"))
        ));
    }

    #[test]
    fn raw_data_block_element_cap() {
        let mut ctx = adts_ctx();
        // Eleven DSE elements with zero payload, no END: exceeds the cap.
        let mut wop = WriteOp::default();
        let mut block = RawDataBlock::default();
        for _ in 0..11 {
            block.elements.push(SyntacticElement::Dse(Dse::default()));
        }
        block.syntax(&mut wop, &mut ctx).unwrap();
        wop.bw.write_trailing_bits().unwrap();
        let buf = wop.bw.into_vec().unwrap();

        let mut rop = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        let mut parsed = RawDataBlock::default();
        let err = parsed.syntax(&mut rop, &mut ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::TooManyElements(MAX_SYN_ELE))
        ));
    }
}
