//! Process-wide constant tables from ISO/IEC 14496-3.

/// Table 1.18 – Sampling Frequency Index.
///
/// Indices 13 and 14 are reserved; index 15 is the escape value announcing
/// an explicitly coded frequency.
pub const SAMPLING_FREQUENCY_TABLE: [u32; 16] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350, 0, 0,
    0,
];

/// Number of defined entries in [`SAMPLING_FREQUENCY_TABLE`].
pub const SAMPLING_FREQUENCY_COUNT: usize = 13;

/// Table 1.19 – Channel Configuration.
///
/// Maps the 4-bit channel configuration to a speaker count. Index 0 defers
/// to the AOT-specific configuration, indices 8..=15 are reserved; both map
/// to zero here.
pub const CHANNEL_CONFIGURATION_TABLE: [u8; 16] =
    [0, 1, 2, 3, 4, 5, 6, 8, 0, 0, 0, 0, 0, 0, 0, 0];

/// Scalefactor band offsets for long windows, per sampling frequency index.
///
/// Each row ends with the 1024-sample frame boundary.
pub static SWB_OFFSET_LONG_WINDOW: [&[u16]; SAMPLING_FREQUENCY_COUNT] = [
    SWB_LONG_96, SWB_LONG_96, SWB_LONG_64, SWB_LONG_48, SWB_LONG_48, SWB_LONG_32, SWB_LONG_24,
    SWB_LONG_24, SWB_LONG_16, SWB_LONG_16, SWB_LONG_16, SWB_LONG_8, SWB_LONG_8,
];

/// Scalefactor band offsets for short windows, per sampling frequency index.
///
/// Each row ends with the 128-sample window boundary.
pub static SWB_OFFSET_SHORT_WINDOW: [&[u16]; SAMPLING_FREQUENCY_COUNT] = [
    SWB_SHORT_96, SWB_SHORT_96, SWB_SHORT_96, SWB_SHORT_48, SWB_SHORT_48, SWB_SHORT_48,
    SWB_SHORT_24, SWB_SHORT_24, SWB_SHORT_16, SWB_SHORT_16, SWB_SHORT_16, SWB_SHORT_8, SWB_SHORT_8,
];

static SWB_LONG_96: &[u16] = &[
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 52, 56, 64, 72, 80, 88, 96, 108, 120, 132,
    144, 156, 172, 188, 212, 240, 276, 320, 384, 448, 512, 576, 640, 704, 768, 832, 896, 960, 1024,
];

static SWB_LONG_64: &[u16] = &[
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 52, 56, 64, 72, 80, 88, 100, 112, 124, 140,
    156, 172, 192, 216, 240, 268, 304, 344, 384, 424, 464, 504, 544, 584, 624, 664, 704, 744, 784,
    824, 864, 904, 944, 984, 1024,
];

static SWB_LONG_48: &[u16] = &[
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 48, 56, 64, 72, 80, 88, 96, 108, 120, 132, 144, 160,
    176, 196, 216, 240, 264, 292, 320, 352, 384, 416, 448, 480, 512, 544, 576, 608, 640, 672, 704,
    736, 768, 800, 832, 864, 896, 928, 1024,
];

static SWB_LONG_32: &[u16] = &[
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 48, 56, 64, 72, 80, 88, 96, 108, 120, 132, 144, 160,
    176, 196, 216, 240, 264, 292, 320, 352, 384, 416, 448, 480, 512, 544, 576, 608, 640, 672, 704,
    736, 768, 800, 832, 864, 896, 928, 960, 992, 1024,
];

static SWB_LONG_24: &[u16] = &[
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 52, 60, 68, 76, 84, 92, 100, 108, 116, 124, 136,
    148, 160, 172, 188, 204, 220, 240, 260, 284, 308, 336, 364, 396, 432, 468, 508, 552, 600, 652,
    704, 768, 832, 896, 960, 1024,
];

static SWB_LONG_16: &[u16] = &[
    0, 8, 16, 24, 32, 40, 48, 56, 64, 72, 80, 88, 100, 112, 124, 136, 148, 160, 172, 184, 196,
    212, 228, 244, 260, 280, 300, 320, 344, 368, 396, 424, 456, 492, 532, 572, 616, 664, 716, 772,
    832, 896, 960, 1024,
];

static SWB_LONG_8: &[u16] = &[
    0, 12, 24, 36, 48, 60, 72, 84, 96, 108, 120, 132, 144, 156, 172, 188, 204, 220, 236, 252, 268,
    288, 308, 328, 348, 372, 396, 420, 448, 476, 508, 544, 580, 620, 664, 712, 764, 820, 880, 944,
    1024,
];

static SWB_SHORT_96: &[u16] = &[0, 4, 8, 12, 16, 20, 24, 32, 40, 48, 64, 92, 128];

static SWB_SHORT_48: &[u16] = &[0, 4, 8, 12, 16, 20, 28, 36, 44, 56, 68, 80, 96, 112, 128];

static SWB_SHORT_24: &[u16] = &[0, 4, 8, 12, 16, 20, 24, 28, 36, 44, 52, 64, 76, 92, 108, 128];

static SWB_SHORT_16: &[u16] = &[0, 4, 8, 12, 16, 20, 24, 28, 32, 40, 48, 60, 72, 88, 108, 128];

static SWB_SHORT_8: &[u16] = &[0, 4, 8, 12, 16, 20, 24, 28, 36, 44, 52, 60, 72, 88, 108, 128];

#[test]
fn swb_rows_end_at_frame_boundaries() {
    for row in SWB_OFFSET_LONG_WINDOW {
        assert_eq!(*row.first().unwrap(), 0);
        assert_eq!(*row.last().unwrap(), 1024);
        assert!(row.windows(2).all(|w| w[0] < w[1]));
    }
    for row in SWB_OFFSET_SHORT_WINDOW {
        assert_eq!(*row.first().unwrap(), 0);
        assert_eq!(*row.last().unwrap(), 128);
        assert!(row.windows(2).all(|w| w[0] < w[1]));
    }
}
