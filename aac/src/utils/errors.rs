#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum BitstreamError {
    #[error("More input required to complete the read")]
    NeedMoreData,

    #[error("Nonzero bit in byte-alignment padding")]
    BadAlignment,

    #[error("Bit cursor is not byte aligned")]
    NotByteAligned,

    #[error("Raw byte read length mismatch: {remaining} bytes remain, {requested} requested")]
    RawLengthMismatch { remaining: usize, requested: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum SyntaxError {
    #[error("Invalid audio object type code point: {0}")]
    InvalidAudioObjectType(u32),

    #[error("No configuration payload implemented for audio object type {0:?}")]
    UnsupportedAudioObjectType(crate::structs::asc::AudioObjectType),

    #[error("Unsupported syntax: {0}")]
    Unsupported(&'static str),

    #[error("Code not found in codebook {0}")]
    CodeNotFound(u8),

    #[error("Scale factor index {0} outside codebook range")]
    ScaleFactorOutOfRange(i64),

    #[error("raw_data_block holds more than {0} syntactic elements")]
    TooManyElements(usize),

    #[error("section_data run exceeds {max} scalefactor bands (band {band})")]
    SectionOverflow { band: usize, max: usize },

    #[error("fill_data nibble must be '0000', read {0:#03X}")]
    BadFillNibble(u8),

    #[error("fill_data byte must be 0xA5, read {0:#04X}")]
    BadFillByte(u8),

    #[error("Sampling frequency index {0} has no scalefactor band table")]
    BadSamplingFrequencyIndex(u8),

    #[error("max_sfb {max_sfb} exceeds the {bands} scalefactor bands of this sampling rate")]
    MaxSfbOutOfRange { max_sfb: usize, bands: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum AdtsError {
    #[error("Invalid ADTS syncword, read {0:#05X}, expected 0xFFF")]
    BadSyncword(u16),

    #[error("Input too short for an ADTS header ({0} bytes)")]
    InputTooShort(usize),

    #[error(
        "aac_frame_length mismatch: header declares {declared} bytes, body consumed {consumed}"
    )]
    FrameLengthMismatch { declared: usize, consumed: usize },

    #[error("aac_frame_length {0} is shorter than the ADTS header")]
    FrameLengthTooShort(u16),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Input too short for an AudioSpecificConfig ({0} bytes)")]
    InputTooShort(usize),

    #[error("Context holds no {0:?} configuration")]
    WrongDataFormat(crate::format::DataFormat),

    #[error("No data format selected")]
    NoDataFormat,
}

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("Audio format is not valid")]
    InvalidFormat,

    #[error("Only AAC-LC formats are supported, got {0:?}")]
    NotAacLc(crate::structs::asc::AudioObjectType),

    #[error("Data format selector mismatch: expected {expected:?}, got {actual:?}")]
    DataFormatMismatch {
        expected: crate::format::DataFormat,
        actual: crate::format::DataFormat,
    },

    #[error("Sampling frequency index {0} is reserved")]
    ReservedSamplingFrequencyIndex(u8),

    #[error("Channel configuration {0} is reserved")]
    ReservedChannelConfiguration(u8),

    #[error("Sample rate {0} Hz has no sampling frequency index")]
    UnmappedSampleRate(u32),

    #[error("Channel count {0} has no channel configuration")]
    UnmappedChannelCount(u32),
}

#[derive(thiserror::Error, Debug)]
pub enum DumpError {
    #[error("Dump stack depth exceeds {0}")]
    StackDepthExceeded(usize),

    #[error("Unbalanced dump events")]
    UnbalancedEvents,
}

#[derive(thiserror::Error, Debug)]
pub enum WriterError {
    #[error("Silent frames support 1 or 2 channels, got {0}")]
    BadSilentChannelCount(u32),

    #[error("Frame length {length} cannot hold a silent frame of {min} bytes")]
    SilentFrameTooShort { length: usize, min: usize },

    #[error("Too many fill elements for a raw_data_block")]
    TooManyFillElements,
}
