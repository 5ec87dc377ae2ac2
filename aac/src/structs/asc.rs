//! AudioSpecificConfig and audio object types.
//!
//! Covers Table 1.15 (AudioSpecificConfig), Table 1.16 (GetAudioObjectType)
//! and Table 4.1 (GASpecificConfig). Only the General Audio configuration
//! payload is implemented; the other object-type payloads are recognized
//! and rejected.

use anyhow::{Result, bail};
use log::warn;

use crate::format::{AudioFormat, DataFormat, Encoding};
use crate::syntax::{OpKind, SyntaxOp};
use crate::utils::errors::{FormatError, SyntaxError};
use crate::utils::tables::{
    CHANNEL_CONFIGURATION_TABLE, SAMPLING_FREQUENCY_COUNT, SAMPLING_FREQUENCY_TABLE,
};
use crate::{syn_bits, syn_flag};

/// Table 1.17 – Audio Object Types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AudioObjectType {
    #[default]
    Null = 0,
    AacMain = 1,
    AacLc = 2,
    AacSsr = 3,
    AacLtp = 4,
    Sbr = 5,
    AacScalable = 6,
    TwinVq = 7,
    Celp = 8,
    Hvxc = 9,
    Ttsi = 12,
    MainSynth = 13,
    WaveSynth = 14,
    Midi = 15,
    Safx = 16,
    ErAacLc = 17,
    ErAacLtp = 19,
    ErAacScalable = 20,
    ErTwinVq = 21,
    ErBsac = 22,
    ErAacLd = 23,
    ErCelp = 24,
    ErHvxc = 25,
    ErHiln = 26,
    ErParam = 27,
    Ssc = 28,
    Ps = 29,
    Surround = 30,
    Escape = 31,
    L1 = 32,
    L2 = 33,
    L3 = 34,
    Dst = 35,
    Als = 36,
    Sls = 37,
    SlsNonCore = 38,
    ErAacEld = 39,
    SmrSimple = 40,
    SmrMain = 41,
}

static AOT_NAMES: [(AudioObjectType, &str); 39] = [
    (AudioObjectType::Null, "NULL"),
    (AudioObjectType::AacMain, "AAC_MAIN"),
    (AudioObjectType::AacLc, "AAC_LC"),
    (AudioObjectType::AacSsr, "AAC_SSR"),
    (AudioObjectType::AacLtp, "AAC_LTP"),
    (AudioObjectType::Sbr, "SBR"),
    (AudioObjectType::AacScalable, "AAC_SCALABLE"),
    (AudioObjectType::TwinVq, "TWINVQ"),
    (AudioObjectType::Celp, "CELP"),
    (AudioObjectType::Hvxc, "HVXC"),
    (AudioObjectType::Ttsi, "TTSI"),
    (AudioObjectType::MainSynth, "MAINSYNTH"),
    (AudioObjectType::WaveSynth, "WAVESYNTH"),
    (AudioObjectType::Midi, "MIDI"),
    (AudioObjectType::Safx, "SAFX"),
    (AudioObjectType::ErAacLc, "ER_AAC_LC"),
    (AudioObjectType::ErAacLtp, "ER_AAC_LTP"),
    (AudioObjectType::ErAacScalable, "ER_AAC_SCALABLE"),
    (AudioObjectType::ErTwinVq, "ER_TWINVQ"),
    (AudioObjectType::ErBsac, "ER_BSAC"),
    (AudioObjectType::ErAacLd, "ER_AAC_LD"),
    (AudioObjectType::ErCelp, "ER_CELP"),
    (AudioObjectType::ErHvxc, "ER_HVXC"),
    (AudioObjectType::ErHiln, "ER_HILN"),
    (AudioObjectType::ErParam, "ER_PARAM"),
    (AudioObjectType::Ssc, "SSC"),
    (AudioObjectType::Ps, "PS"),
    (AudioObjectType::Surround, "SURROUND"),
    (AudioObjectType::Escape, "ESCAPE"),
    (AudioObjectType::L1, "L1"),
    (AudioObjectType::L2, "L2"),
    (AudioObjectType::L3, "L3"),
    (AudioObjectType::Dst, "DST"),
    (AudioObjectType::Als, "ALS"),
    (AudioObjectType::Sls, "SLS"),
    (AudioObjectType::SlsNonCore, "SLS_NON_CORE"),
    (AudioObjectType::ErAacEld, "ER_AAC_ELD"),
    (AudioObjectType::SmrSimple, "SMR_SIMPLE"),
    (AudioObjectType::SmrMain, "SMR_MAIN"),
];

impl AudioObjectType {
    /// Maps a wire code point to an object type.
    ///
    /// The reserved code points (10, 11, 18 and anything past 41) have no
    /// defined payload and are rejected.
    pub fn from_u32(value: u32) -> Result<Self> {
        AOT_NAMES
            .iter()
            .find(|(aot, _)| *aot as u32 == value)
            .map(|(aot, _)| *aot)
            .ok_or_else(|| SyntaxError::InvalidAudioObjectType(value).into())
    }

    /// Name suffix of the object type, e.g. `"AAC_LC"`.
    pub fn name(self) -> &'static str {
        AOT_NAMES
            .iter()
            .find(|(aot, _)| *aot == self)
            .map(|(_, name)| *name)
            .unwrap_or("UNKNOWN")
    }
}

/// Parses an object type name suffix, case-insensitively.
///
/// Unknown names map to [`AudioObjectType::Null`].
pub fn aot_from_str(s: &str) -> AudioObjectType {
    for (aot, name) in &AOT_NAMES {
        if s.eq_ignore_ascii_case(name) {
            return *aot;
        }
    }
    warn!("unknown AOT '{s}'");
    AudioObjectType::Null
}

/// Name of an object type; the inverse of [`aot_from_str`].
pub fn aot_to_str(aot: AudioObjectType) -> &'static str {
    aot.name()
}

/// Table 1.16 – GetAudioObjectType.
pub(crate) fn get_audio_object_type<O: SyntaxOp>(
    op: &mut O,
    aot: &mut AudioObjectType,
) -> Result<()> {
    match O::KIND {
        OpKind::Read => {
            let mut value = op.bits("audio_object_type", 0, 5)? as u32;
            if value == 31 {
                value = 32 + op.bits("audio_object_type_ext", 0, 6)? as u32;
            }
            *aot = AudioObjectType::from_u32(value)?;
        }
        OpKind::Write | OpKind::Dump => {
            let value = *aot as u64;
            if value < 31 {
                op.bits("audio_object_type", value, 5)?;
            } else {
                op.bits("audio_object_type", 31, 5)?;
                op.bits("audio_object_type_ext", value - 32, 6)?;
            }
        }
    }
    Ok(())
}

/// Table 4.1 – GASpecificConfig.
#[derive(Debug, Clone, Default)]
pub struct GaSpecificConfig {
    /// 0: frame length 1024, 1: frame length 960.
    pub frame_length_flag: bool,
    pub depends_on_core_coder: bool,
    pub core_coder_delay: u16,
    pub extension_flag: bool,

    /// Only for AOT 6, 20.
    pub layer_nr: u8,

    /// Only for AOT 22.
    pub num_of_sub_frame: u8,
    pub layer_length: u16,

    /// Only for AOT 17, 19, 20, 23.
    pub aac_section_data_resilience_flag: bool,
    pub aac_scalefactor_data_resilience_flag: bool,
    pub aac_spectral_data_resilience_flag: bool,

    pub extension_flag_3: bool,
}

impl GaSpecificConfig {
    pub(crate) fn syntax<O: SyntaxOp>(
        &mut self,
        op: &mut O,
        channel_configuration: u8,
        aot: AudioObjectType,
    ) -> Result<()> {
        use AudioObjectType::*;

        syn_flag!(op, self.frame_length_flag);
        syn_flag!(op, self.depends_on_core_coder);
        if self.depends_on_core_coder {
            syn_bits!(op, self.core_coder_delay, 14);
        }
        syn_flag!(op, self.extension_flag);
        if channel_configuration == 0 {
            bail!(SyntaxError::Unsupported(
                "program_config_element in GASpecificConfig"
            ));
        }
        if matches!(aot, AacScalable | ErAacScalable) {
            syn_bits!(op, self.layer_nr, 3);
        }
        if self.extension_flag {
            if aot == ErBsac {
                syn_bits!(op, self.num_of_sub_frame, 5);
                syn_bits!(op, self.layer_length, 11);
            }
            if matches!(aot, ErAacLc | ErAacLtp | ErAacScalable | ErAacLd) {
                syn_flag!(op, self.aac_section_data_resilience_flag);
                syn_flag!(op, self.aac_scalefactor_data_resilience_flag);
                syn_flag!(op, self.aac_spectral_data_resilience_flag);
            }
            syn_flag!(op, self.extension_flag_3);
        }
        Ok(())
    }
}

/// Table 1.15 – AudioSpecificConfig.
#[derive(Debug, Clone, Default)]
pub struct Asc {
    pub audio_object_type: AudioObjectType,
    pub sampling_frequency_index: u8,
    /// Explicit rate, present when the index is the 0xF escape.
    pub sampling_frequency: u32,
    pub channel_configuration: u8,
    /// Only for AOT 5, 29.
    pub extension_sampling_frequency_index: u8,
    pub extension_sampling_frequency: u32,
    /// Only for AOT 22.
    pub extension_channel_configuration: u8,
    /// Only for AOT 30.
    pub sac_payload_embedding: bool,
    /// Only for AOT 36.
    pub fill_bits: u8,
    /// Only for the error-resilient object types.
    pub ep_config: u8,
    pub direct_mapping: bool,
    pub sync_extension_type: u16,
    /// Only via the 0x2B7 sync extension.
    pub sbr_present_flag: bool,
    pub ps_present_flag: bool,
    pub ga_specific_config: GaSpecificConfig,
}

impl Asc {
    pub(crate) fn syntax<O: SyntaxOp>(&mut self, op: &mut O) -> Result<()> {
        use AudioObjectType::*;

        get_audio_object_type(op, &mut self.audio_object_type)?;

        syn_bits!(op, self.sampling_frequency_index, 4);
        if self.sampling_frequency_index == 0xF {
            syn_bits!(op, self.sampling_frequency, 24);
        }
        syn_bits!(op, self.channel_configuration, 4);

        let mut extension_audio_object_type = Null;

        if matches!(self.audio_object_type, Sbr | Ps) {
            extension_audio_object_type = Sbr;
            syn_bits!(op, self.extension_sampling_frequency_index, 4);
            if self.extension_sampling_frequency_index == 0xF {
                syn_bits!(op, self.extension_sampling_frequency, 24);
            }
            get_audio_object_type(op, &mut self.audio_object_type)?;
            if self.audio_object_type == ErBsac {
                syn_bits!(op, self.extension_channel_configuration, 4);
            }
        }

        match self.audio_object_type {
            AacMain | AacLc | AacSsr | AacLtp | AacScalable | TwinVq | ErAacLc | ErAacLtp
            | ErAacScalable | ErTwinVq | ErBsac | ErAacLd => {
                self.ga_specific_config.syntax(
                    op,
                    self.channel_configuration,
                    self.audio_object_type,
                )?;
            }
            Surround => {
                syn_flag!(op, self.sac_payload_embedding);
                bail!(SyntaxError::UnsupportedAudioObjectType(
                    self.audio_object_type
                ));
            }
            Als => {
                syn_bits!(op, self.fill_bits, 5);
                bail!(SyntaxError::UnsupportedAudioObjectType(
                    self.audio_object_type
                ));
            }
            Celp | Hvxc | Ttsi | MainSynth | WaveSynth | Midi | Safx | ErCelp | ErHvxc
            | ErHiln | ErParam | Ssc | L1 | L2 | L3 | Dst | Sls | SlsNonCore | ErAacEld
            | SmrSimple | SmrMain => {
                bail!(SyntaxError::UnsupportedAudioObjectType(
                    self.audio_object_type
                ));
            }
            Null | Sbr | Ps | Escape => {}
        }

        if matches!(
            self.audio_object_type,
            ErAacLc
                | ErAacLtp
                | ErAacScalable
                | ErTwinVq
                | ErBsac
                | ErAacLd
                | ErCelp
                | ErHvxc
                | ErHiln
                | ErParam
                | ErAacEld
        ) {
            syn_bits!(op, self.ep_config, 2);
            if self.ep_config == 2 || self.ep_config == 3 {
                bail!(SyntaxError::Unsupported("ErrorProtectionSpecificConfig"));
            }
        }

        if extension_audio_object_type == Sbr || op.rem_bits()? < 16 {
            return Ok(());
        }
        syn_bits!(op, self.sync_extension_type, 11);
        if self.sync_extension_type == 0x2B7 {
            let mut ext_aot = Null;
            get_audio_object_type(op, &mut ext_aot)?;
            if ext_aot == Sbr {
                syn_flag!(op, self.sbr_present_flag);
                if self.sbr_present_flag {
                    syn_bits!(op, self.extension_sampling_frequency_index, 4);
                    if self.extension_sampling_frequency_index == 0xF {
                        syn_bits!(op, self.extension_sampling_frequency, 24);
                    }
                    if op.rem_bits()? >= 12 {
                        syn_bits!(op, self.sync_extension_type, 11);
                        if self.sync_extension_type == 0x548 {
                            syn_flag!(op, self.ps_present_flag);
                        }
                    }
                }
            }
            if ext_aot == ErBsac {
                syn_flag!(op, self.sbr_present_flag);
                if self.sbr_present_flag {
                    syn_bits!(op, self.extension_sampling_frequency_index, 4);
                    if self.extension_sampling_frequency_index == 0xF {
                        syn_bits!(op, self.extension_sampling_frequency, 24);
                    }
                }
                syn_bits!(op, self.extension_channel_configuration, 4);
            }
        }
        Ok(())
    }

    /// Maps this configuration to an audio format tuple.
    ///
    /// Defined for AAC-LC with a defined sampling frequency index and a
    /// non-reserved channel configuration.
    pub fn format(&self) -> Result<AudioFormat> {
        if self.audio_object_type != AudioObjectType::AacLc {
            bail!(FormatError::NotAacLc(self.audio_object_type));
        }
        if usize::from(self.sampling_frequency_index) >= SAMPLING_FREQUENCY_COUNT {
            bail!(FormatError::ReservedSamplingFrequencyIndex(
                self.sampling_frequency_index
            ));
        }
        let channel_count =
            CHANNEL_CONFIGURATION_TABLE[usize::from(self.channel_configuration) & 0xF];
        if channel_count == 0 {
            bail!(FormatError::ReservedChannelConfiguration(
                self.channel_configuration
            ));
        }

        Ok(AudioFormat {
            encoding: Encoding::AacLc,
            channel_count: u32::from(channel_count),
            bit_depth: 16,
            sample_rate: SAMPLING_FREQUENCY_TABLE[usize::from(self.sampling_frequency_index)],
            data_format: DataFormat::Raw,
        })
    }

    /// Builds the configuration describing `format`.
    pub fn from_format(format: &AudioFormat) -> Result<Self> {
        if !format.is_valid() || format.encoding != Encoding::AacLc {
            bail!(FormatError::InvalidFormat);
        }
        if format.data_format != DataFormat::Raw {
            bail!(FormatError::DataFormatMismatch {
                expected: DataFormat::Raw,
                actual: format.data_format,
            });
        }

        let mut asc = Self {
            audio_object_type: AudioObjectType::AacLc,
            ..Default::default()
        };
        asc.sampling_frequency_index = sampling_frequency_index(format.sample_rate)?;
        asc.channel_configuration = channel_configuration(format.channel_count)?;
        Ok(asc)
    }
}

pub(crate) fn sampling_frequency_index(sample_rate: u32) -> Result<u8> {
    SAMPLING_FREQUENCY_TABLE[..SAMPLING_FREQUENCY_COUNT]
        .iter()
        .position(|&rate| rate == sample_rate)
        .map(|index| index as u8)
        .ok_or_else(|| FormatError::UnmappedSampleRate(sample_rate).into())
}

pub(crate) fn channel_configuration(channel_count: u32) -> Result<u8> {
    CHANNEL_CONFIGURATION_TABLE
        .iter()
        .position(|&count| u32::from(count) == channel_count && count != 0)
        .map(|index| index as u8)
        .ok_or_else(|| FormatError::UnmappedChannelCount(channel_count).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format;

    #[test]
    fn aot_string_mapping() {
        assert_eq!(aot_from_str("AAC_LC"), AudioObjectType::AacLc);
        assert_eq!(aot_from_str("aac_lc"), AudioObjectType::AacLc);
        assert_eq!(aot_from_str("ER_BSAC"), AudioObjectType::ErBsac);
        assert_eq!(aot_from_str("?"), AudioObjectType::Null);
        assert_eq!(aot_from_str(""), AudioObjectType::Null);

        assert_eq!(aot_to_str(AudioObjectType::AacLc), "AAC_LC");
        assert_eq!(aot_to_str(AudioObjectType::Null), "NULL");
    }

    #[test]
    fn aot_code_points() {
        assert_eq!(
            AudioObjectType::from_u32(2).unwrap(),
            AudioObjectType::AacLc
        );
        assert_eq!(
            AudioObjectType::from_u32(41).unwrap(),
            AudioObjectType::SmrMain
        );
        for reserved in [10, 11, 18, 42, 95] {
            assert!(AudioObjectType::from_u32(reserved).is_err());
        }
    }

    #[test]
    fn asc_format_roundtrip() {
        let asc = Asc::from_format(&format::AAC_LC_16B_48000HZ_STEREO_RAW).unwrap();
        assert_eq!(asc.audio_object_type, AudioObjectType::AacLc);
        assert_eq!(asc.sampling_frequency_index, 3);
        assert_eq!(asc.channel_configuration, 2);
        assert_eq!(
            asc.format().unwrap(),
            format::AAC_LC_16B_48000HZ_STEREO_RAW
        );

        let asc = Asc::from_format(&format::AAC_LC_16B_44100HZ_MONO_RAW).unwrap();
        assert_eq!(asc.sampling_frequency_index, 4);
        assert_eq!(asc.channel_configuration, 1);
    }

    #[test]
    fn asc_from_format_rejects_mismatches() {
        assert!(Asc::from_format(&format::PCM_16B_48000HZ_MONO).is_err());
        assert!(Asc::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS).is_err());
    }

    #[test]
    fn non_lc_asc_has_no_format() {
        let asc = Asc {
            audio_object_type: AudioObjectType::AacMain,
            sampling_frequency_index: 3,
            channel_configuration: 2,
            ..Default::default()
        };
        assert!(asc.format().is_err());
    }
}
