//! Mutable per-stream parsing state.

use anyhow::{Result, bail};

use crate::format::DataFormat;
use crate::structs::adts::{Adts, AdtsFrame};
use crate::structs::asc::{Asc, AudioObjectType};
use crate::structs::element::RawDataBlock;
use crate::structs::ics::{IcsInfo, WindowSequence};
use crate::structs::{MAX_SFB, MAX_WINDOW_GROUPS};
use crate::utils::errors::{ConfigError, SyntaxError};
use crate::utils::tables::{SWB_OFFSET_LONG_WINDOW, SWB_OFFSET_SHORT_WINDOW};

/// Scalefactor band offsets and window grouping derived from an `ics_info`.
#[derive(Debug, Clone)]
pub struct ScalefactorBandsAndGrouping {
    pub num_windows: u8,
    pub num_window_groups: u8,
    pub window_group_length: [u8; MAX_WINDOW_GROUPS],
    pub sect_sfb_offset: [[u16; MAX_SFB]; MAX_WINDOW_GROUPS],
    pub swb_offset: [u16; MAX_SFB],
}

impl Default for ScalefactorBandsAndGrouping {
    fn default() -> Self {
        Self {
            num_windows: 0,
            num_window_groups: 0,
            window_group_length: [0; MAX_WINDOW_GROUPS],
            sect_sfb_offset: [[0; MAX_SFB]; MAX_WINDOW_GROUPS],
            swb_offset: [0; MAX_SFB],
        }
    }
}

/// Per-stream state shared by the reader, writer and dump drivers.
///
/// Holds the selected framing, the last seen configuration (an ADTS header
/// or an ASC, according to the framing), the window grouping derived from
/// the most recent `ics_info`, and the raw_data_block(s) most recently
/// parsed or staged for writing.
#[derive(Debug, Clone, Default)]
pub struct Context {
    data_format: DataFormat,
    pub(crate) adts: Adts,
    pub(crate) asc: Asc,
    pub info: ScalefactorBandsAndGrouping,
    /// Current block under Raw framing.
    pub raw_data_block: RawDataBlock,
    /// Current frame under ADTS framing.
    pub adts_frame: AdtsFrame,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn clear_adts(&mut self) {
        self.adts = Adts::default();
    }

    pub fn data_format(&self) -> DataFormat {
        self.data_format
    }

    pub(crate) fn set_data_format(&mut self, data_format: DataFormat) {
        self.data_format = data_format;
    }

    /// The last ADTS header. Fails unless ADTS framing is selected.
    pub fn adts(&self) -> Result<&Adts> {
        if self.data_format != DataFormat::Adts {
            bail!(ConfigError::WrongDataFormat(DataFormat::Adts));
        }
        Ok(&self.adts)
    }

    /// Selects ADTS framing and installs `adts` as the current header.
    pub fn set_adts(&mut self, adts: Adts) {
        self.data_format = DataFormat::Adts;
        self.adts = adts;
    }

    /// The last ASC. Fails unless Raw framing is selected.
    pub fn asc(&self) -> Result<&Asc> {
        if self.data_format != DataFormat::Raw {
            bail!(ConfigError::WrongDataFormat(DataFormat::Raw));
        }
        Ok(&self.asc)
    }

    /// Selects Raw framing and installs `asc` as the current configuration.
    pub fn set_asc(&mut self, asc: Asc) {
        self.data_format = DataFormat::Raw;
        self.asc = asc;
    }

    pub(crate) fn sampling_frequency_index(&self) -> Result<usize> {
        let index = match self.data_format {
            DataFormat::Raw => self.asc.sampling_frequency_index,
            DataFormat::Adts => self.adts.sampling_frequency_index,
            DataFormat::Unknown => bail!(ConfigError::NoDataFormat),
        };
        if usize::from(index) >= SWB_OFFSET_LONG_WINDOW.len() {
            bail!(SyntaxError::BadSamplingFrequencyIndex(index));
        }
        Ok(usize::from(index))
    }

    /// The audio object type governing the current stream.
    ///
    /// Under ADTS framing the 2-bit profile is the object type minus one.
    pub fn audio_object_type(&self) -> Result<AudioObjectType> {
        match self.data_format {
            DataFormat::Raw => Ok(self.asc.audio_object_type),
            DataFormat::Adts => {
                AudioObjectType::from_u32(u32::from(self.adts.profile_object_type) + 1)
            }
            DataFormat::Unknown => bail!(ConfigError::NoDataFormat),
        }
    }

    pub(crate) fn section_data_resilience(&self) -> bool {
        self.data_format == DataFormat::Raw
            && self.asc.ga_specific_config.aac_section_data_resilience_flag
    }

    pub(crate) fn scalefactor_data_resilience(&self) -> bool {
        self.data_format == DataFormat::Raw
            && self.asc.ga_specific_config.aac_scalefactor_data_resilience_flag
    }

    pub(crate) fn spectral_data_resilience(&self) -> bool {
        self.data_format == DataFormat::Raw
            && self.asc.ga_specific_config.aac_spectral_data_resilience_flag
    }

    /// Derives window count, grouping and scalefactor band offsets from an
    /// `ics_info` and the stream's sampling frequency index.
    pub fn set_grouping_info(&mut self, ics_info: &IcsInfo) -> Result<()> {
        let fs_index = self.sampling_frequency_index()?;
        let max_sfb = usize::from(ics_info.max_sfb);

        match ics_info.window_sequence {
            WindowSequence::OnlyLong | WindowSequence::LongStart | WindowSequence::LongStop => {
                let offsets = SWB_OFFSET_LONG_WINDOW[fs_index];
                if max_sfb + 1 > offsets.len() {
                    bail!(SyntaxError::MaxSfbOutOfRange {
                        max_sfb,
                        bands: offsets.len() - 1,
                    });
                }
                self.info.num_windows = 1;
                self.info.num_window_groups = 1;
                self.info.window_group_length[0] = 1;
                for (i, &offset) in offsets.iter().enumerate().take(max_sfb + 1) {
                    self.info.sect_sfb_offset[0][i] = offset;
                    self.info.swb_offset[i] = offset;
                }
            }

            WindowSequence::EightShort => {
                let offsets = SWB_OFFSET_SHORT_WINDOW[fs_index];
                if max_sfb + 1 > offsets.len() {
                    bail!(SyntaxError::MaxSfbOutOfRange {
                        max_sfb,
                        bands: offsets.len() - 1,
                    });
                }
                self.info.num_windows = 8;
                self.info.num_window_groups = 1;
                self.info.window_group_length = [0; MAX_WINDOW_GROUPS];
                self.info.window_group_length[0] = 1;
                // Each zero bit in the 7-bit grouping mask starts a new
                // window group; mask bit 6 - i covers windows i and i + 1.
                for i in 0..usize::from(self.info.num_windows) - 1 {
                    let groups = usize::from(self.info.num_window_groups);
                    if ics_info.scale_factor_grouping >> (6 - i) & 1 == 0 {
                        self.info.num_window_groups += 1;
                        self.info.window_group_length[groups] = 1;
                    } else {
                        self.info.window_group_length[groups - 1] += 1;
                    }
                }
                for g in 0..usize::from(self.info.num_window_groups) {
                    self.info.sect_sfb_offset[g][0] = 0;
                    for (sfb, &offset) in offsets.iter().enumerate().take(max_sfb + 1) {
                        self.info.sect_sfb_offset[g][sfb] =
                            offset * u16::from(self.info.window_group_length[g]);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format;

    #[test]
    fn accessors_enforce_framing() {
        let mut ctx = Context::new();
        assert!(ctx.adts().is_err());
        assert!(ctx.asc().is_err());

        ctx.set_adts(Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS).unwrap());
        assert!(ctx.adts().is_ok());
        assert!(ctx.asc().is_err());
        assert_eq!(ctx.data_format(), DataFormat::Adts);

        ctx.set_asc(Asc::from_format(&format::AAC_LC_16B_48000HZ_STEREO_RAW).unwrap());
        assert!(ctx.asc().is_ok());
        assert!(ctx.adts().is_err());
        assert_eq!(ctx.data_format(), DataFormat::Raw);
    }

    #[test]
    fn long_window_grouping() {
        let mut ctx = Context::new();
        ctx.set_adts(Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS).unwrap());

        let ics_info = IcsInfo {
            window_sequence: WindowSequence::OnlyLong,
            max_sfb: 5,
            ..Default::default()
        };
        ctx.set_grouping_info(&ics_info).unwrap();

        assert_eq!(ctx.info.num_windows, 1);
        assert_eq!(ctx.info.num_window_groups, 1);
        assert_eq!(ctx.info.window_group_length[0], 1);
        assert_eq!(
            &ctx.info.sect_sfb_offset[0][..6],
            &[0, 4, 8, 12, 16, 20][..]
        );
    }

    #[test]
    fn eight_short_grouping_follows_mask() {
        let mut ctx = Context::new();
        ctx.set_adts(Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS).unwrap());

        // 0b1110000: windows {0,1,2,3} grouped, then four single groups.
        let ics_info = IcsInfo {
            window_sequence: WindowSequence::EightShort,
            max_sfb: 2,
            scale_factor_grouping: 0b1110000,
            ..Default::default()
        };
        ctx.set_grouping_info(&ics_info).unwrap();

        assert_eq!(ctx.info.num_windows, 8);
        assert_eq!(ctx.info.num_window_groups, 5);
        assert_eq!(&ctx.info.window_group_length[..5], &[4, 1, 1, 1, 1][..]);
        // Short-window offsets are scaled by the group length.
        assert_eq!(&ctx.info.sect_sfb_offset[0][..3], &[0, 16, 32][..]);
        assert_eq!(&ctx.info.sect_sfb_offset[1][..3], &[0, 4, 8][..]);
    }

    #[test]
    fn max_sfb_outside_band_table_is_rejected() {
        let mut ctx = Context::new();
        ctx.set_adts(Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS).unwrap());

        let ics_info = IcsInfo {
            window_sequence: WindowSequence::EightShort,
            max_sfb: 15,
            ..Default::default()
        };
        assert!(ctx.set_grouping_info(&ics_info).is_err());
    }
}
