//! Audio format descriptors.
//!
//! Canonical `(encoding, sample rate, channel count, framing)` tuples and
//! the [`AudioFormat`] record the configuration conversions map to and from.

/// Audio encoding selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Unknown,
    Pcm,
    AacLc,
}

/// AAC bitstream framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
    /// Framing not yet known.
    #[default]
    Unknown,
    /// Raw AAC frames, configuration carried out of band in an
    /// AudioSpecificConfig.
    Raw,
    /// Audio Data Transport Stream framing with per-frame headers.
    Adts,
}

/// An audio format tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub encoding: Encoding,
    pub channel_count: u32,
    pub bit_depth: u32,
    pub sample_rate: u32,
    pub data_format: DataFormat,
}

impl AudioFormat {
    pub fn is_valid(&self) -> bool {
        if self.encoding == Encoding::Unknown
            || self.channel_count == 0
            || self.bit_depth == 0
            || self.sample_rate == 0
        {
            return false;
        }
        self.encoding != Encoding::AacLc || self.data_format != DataFormat::Unknown
    }
}

const fn aac_lc(sample_rate: u32, channel_count: u32, data_format: DataFormat) -> AudioFormat {
    AudioFormat {
        encoding: Encoding::AacLc,
        channel_count,
        bit_depth: 16,
        sample_rate,
        data_format,
    }
}

pub const AAC_LC_16B_44100HZ_MONO_RAW: AudioFormat = aac_lc(44100, 1, DataFormat::Raw);
pub const AAC_LC_16B_44100HZ_MONO_ADTS: AudioFormat = aac_lc(44100, 1, DataFormat::Adts);
pub const AAC_LC_16B_44100HZ_STEREO_RAW: AudioFormat = aac_lc(44100, 2, DataFormat::Raw);
pub const AAC_LC_16B_44100HZ_STEREO_ADTS: AudioFormat = aac_lc(44100, 2, DataFormat::Adts);
pub const AAC_LC_16B_48000HZ_MONO_RAW: AudioFormat = aac_lc(48000, 1, DataFormat::Raw);
pub const AAC_LC_16B_48000HZ_MONO_ADTS: AudioFormat = aac_lc(48000, 1, DataFormat::Adts);
pub const AAC_LC_16B_48000HZ_STEREO_RAW: AudioFormat = aac_lc(48000, 2, DataFormat::Raw);
pub const AAC_LC_16B_48000HZ_STEREO_ADTS: AudioFormat = aac_lc(48000, 2, DataFormat::Adts);

pub const PCM_16B_48000HZ_MONO: AudioFormat = AudioFormat {
    encoding: Encoding::Pcm,
    channel_count: 1,
    bit_depth: 16,
    sample_rate: 48000,
    data_format: DataFormat::Unknown,
};

#[test]
fn canonical_formats_are_valid() {
    for fmt in [
        AAC_LC_16B_44100HZ_MONO_RAW,
        AAC_LC_16B_48000HZ_STEREO_ADTS,
        PCM_16B_48000HZ_MONO,
    ] {
        assert!(fmt.is_valid());
    }

    let mut fmt = AAC_LC_16B_48000HZ_STEREO_RAW;
    fmt.data_format = DataFormat::Unknown;
    assert!(!fmt.is_valid());
}
