//! ADTS headers and error-check fields.
//!
//! Covers the fixed and variable headers of 1.A.3.2 and the error-check
//! productions of Tables 1.A.8 to 1.A.10. CRC fields are consumed but not
//! verified.

use anyhow::{Result, bail};

use crate::format::{AudioFormat, DataFormat, Encoding};
use crate::structs::MAX_RAW_DATA_BLOCKS;
use crate::structs::asc::{AudioObjectType, channel_configuration, sampling_frequency_index};
use crate::structs::element::RawDataBlock;
use crate::syntax::SyntaxOp;
use crate::utils::errors::{AdtsError, FormatError};
use crate::utils::tables::{
    CHANNEL_CONFIGURATION_TABLE, SAMPLING_FREQUENCY_COUNT, SAMPLING_FREQUENCY_TABLE,
};
use crate::{syn_bits, syn_flag};

/// An ADTS frame header.
#[derive(Debug, Clone, Default)]
pub struct Adts {
    /* 1.A.3.2.1 Fixed Header of ADTS */
    pub syncword: u16,
    pub id: bool,
    pub layer: u8,
    pub protection_absent: bool,
    /// Audio object type minus one.
    pub profile_object_type: u8,
    pub sampling_frequency_index: u8,
    pub private_bit: bool,
    pub channel_configuration: u8,
    pub original_copy: bool,
    pub home: bool,
    /* 1.A.3.2.2 Variable Header of ADTS */
    pub copyright_identification_bit: bool,
    pub copyright_identification_start: bool,
    /// Total frame length in bytes, header included.
    pub aac_frame_length: u16,
    /// 0x7FF for variable bit rate streams.
    pub adts_buffer_fullness: u16,
    /// Stored minus one: a frame carries this value plus one blocks.
    pub number_of_raw_data_blocks_in_frame: u8,
}

impl Adts {
    pub(crate) fn fixed_header<O: SyntaxOp>(&mut self, op: &mut O) -> Result<()> {
        syn_bits!(op, self.syncword, 12);
        if self.syncword & 0xFFF != 0xFFF {
            bail!(AdtsError::BadSyncword(self.syncword));
        }
        syn_flag!(op, self.id);
        syn_bits!(op, self.layer, 2);
        syn_flag!(op, self.protection_absent);
        syn_bits!(op, self.profile_object_type, 2);
        syn_bits!(op, self.sampling_frequency_index, 4);
        syn_flag!(op, self.private_bit);
        syn_bits!(op, self.channel_configuration, 3);
        syn_flag!(op, self.original_copy);
        syn_flag!(op, self.home);
        Ok(())
    }

    pub(crate) fn variable_header<O: SyntaxOp>(&mut self, op: &mut O) -> Result<()> {
        syn_flag!(op, self.copyright_identification_bit);
        syn_flag!(op, self.copyright_identification_start);
        syn_bits!(op, self.aac_frame_length, 13);
        syn_bits!(op, self.adts_buffer_fullness, 11);
        syn_bits!(op, self.number_of_raw_data_blocks_in_frame, 2);
        Ok(())
    }

    /// Maps this header to an audio format tuple.
    ///
    /// Defined for AAC-LC with a defined sampling frequency index and a
    /// non-reserved channel configuration.
    pub fn format(&self) -> Result<AudioFormat> {
        let aot = AudioObjectType::from_u32(u32::from(self.profile_object_type) + 1)?;
        if aot != AudioObjectType::AacLc {
            bail!(FormatError::NotAacLc(aot));
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
            data_format: DataFormat::Adts,
        })
    }

    /// Builds the header describing `format`.
    ///
    /// `aac_frame_length` is initialized to the bare header size; the
    /// caller sets the final length once the payload size is known.
    pub fn from_format(format: &AudioFormat) -> Result<Self> {
        if !format.is_valid() || format.encoding != Encoding::AacLc {
            bail!(FormatError::InvalidFormat);
        }
        if format.data_format != DataFormat::Adts {
            bail!(FormatError::DataFormatMismatch {
                expected: DataFormat::Adts,
                actual: format.data_format,
            });
        }

        Ok(Self {
            syncword: 0xFFF,
            id: false,
            layer: 0,
            protection_absent: true,
            profile_object_type: AudioObjectType::AacLc as u8 - 1,
            sampling_frequency_index: sampling_frequency_index(format.sample_rate)?,
            private_bit: false,
            channel_configuration: channel_configuration(format.channel_count)?,
            original_copy: false,
            home: false,
            copyright_identification_bit: false,
            copyright_identification_start: false,
            aac_frame_length: 7,
            adts_buffer_fullness: 0x7FF,
            number_of_raw_data_blocks_in_frame: 0,
        })
    }
}

/// Table 1.A.8 – adts_error_check.
pub(crate) fn adts_error_check<O: SyntaxOp>(op: &mut O, adts: &Adts) -> Result<()> {
    if !adts.protection_absent {
        op.bits("crc_check", 0, 16)?;
    }
    Ok(())
}

/// Table 1.A.9 – adts_header_error_check.
///
/// Read-only in practice: the writer emits single-block frames without
/// header CRC data.
pub(crate) fn adts_header_error_check<O: SyntaxOp>(op: &mut O, adts: &Adts) -> Result<()> {
    if !adts.protection_absent {
        for _ in 0..adts.number_of_raw_data_blocks_in_frame {
            op.bits("raw_data_block_position", 0, 16)?;
        }
        op.bits("crc_check", 0, 16)?;
    }
    Ok(())
}

/// Table 1.A.10 – adts_raw_data_block_error_check.
pub(crate) fn adts_raw_data_block_error_check<O: SyntaxOp>(op: &mut O, adts: &Adts) -> Result<()> {
    if !adts.protection_absent {
        op.bits("crc_check", 0, 16)?;
    }
    Ok(())
}

/// Table 1.A.5 – the raw_data_blocks of one ADTS frame.
#[derive(Debug, Clone, Default)]
pub struct AdtsFrame {
    pub raw_data_blocks: [RawDataBlock; MAX_RAW_DATA_BLOCKS],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format;
    use crate::syntax::ReadOp;
    use crate::utils::bitstream_io::BsIoSliceReader;

    #[test]
    fn from_format_populates_header() {
        let adts = Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS).unwrap();
        assert_eq!(adts.syncword, 0xFFF);
        assert!(!adts.id);
        assert_eq!(adts.layer, 0);
        assert!(adts.protection_absent);
        assert_eq!(adts.profile_object_type + 1, AudioObjectType::AacLc as u8);
        assert_eq!(adts.sampling_frequency_index, 3);
        assert_eq!(adts.channel_configuration, 2);
        assert_eq!(adts.aac_frame_length, 7);
        assert_eq!(adts.adts_buffer_fullness, 0x7FF);
        assert_eq!(adts.number_of_raw_data_blocks_in_frame, 0);

        assert_eq!(
            adts.format().unwrap(),
            format::AAC_LC_16B_48000HZ_STEREO_ADTS
        );
    }

    #[test]
    fn from_format_rejects_mismatches() {
        assert!(Adts::from_format(&format::PCM_16B_48000HZ_MONO).is_err());
        assert!(Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_RAW).is_err());
    }

    #[test]
    fn error_check_fields_follow_protection_absent() {
        let adts = Adts {
            protection_absent: false,
            number_of_raw_data_blocks_in_frame: 2,
            ..Default::default()
        };

        let buf = [0u8; 8];
        let mut op = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        adts_error_check(&mut op, &adts).unwrap();
        assert_eq!(op.bs.position().unwrap(), 16);

        let mut op = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        adts_header_error_check(&mut op, &adts).unwrap();
        assert_eq!(op.bs.position().unwrap(), 2 * 16 + 16);

        let mut op = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        adts_raw_data_block_error_check(&mut op, &adts).unwrap();
        assert_eq!(op.bs.position().unwrap(), 16);

        let unprotected = Adts {
            protection_absent: true,
            ..Default::default()
        };
        let mut op = ReadOp::new(BsIoSliceReader::from_slice(&buf), 0);
        adts_error_check(&mut op, &unprotected).unwrap();
        adts_header_error_check(&mut op, &unprotected).unwrap();
        adts_raw_data_block_error_check(&mut op, &unprotected).unwrap();
        assert_eq!(op.bs.position().unwrap(), 0);
    }
}
