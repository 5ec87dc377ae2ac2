use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::Level;

use aac::ctx::Context;
use aac::format::AudioFormat;
use aac::process::reader::{FrameSink, Reader};
use aac::structs::adts::Adts;
use aac::structs::asc::{AudioObjectType, aot_to_str};

use super::command::{Cli, InfoArgs};
use crate::input::InputStream;

const CHUNK_SIZE: usize = 64 * 1024;

/// Samples per raw_data_block with the standard frame length.
const SAMPLES_PER_FRAME: usize = 1024;

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing AAC stream: {}", args.input.display());

    let mut reader = Reader::new(StreamStats::default());
    if cli.strict {
        reader.set_fail_level(Level::Warn);
    }

    let pb = multi.map(|multi| {
        let pb = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Analyzing frames...");
        pb
    });

    let mut input = InputStream::open(&args.input)?;
    let mut total_bytes = 0usize;
    loop {
        let more = input.fill(CHUNK_SIZE)?;
        let mut off = 0;
        reader.parse(0, input.data(), &mut off)?;
        total_bytes += off;
        input.consume(off);

        if let Some(ref pb) = pb {
            let frames = reader.sink().frames;
            pb.set_message(format!("Analyzing frames...       {frames}"));
        }
        if !more {
            break;
        }
    }
    total_bytes += input.data().len();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let stats = reader.sink();
    match &stats.first {
        Some(first) => display_stats(first, stats, total_bytes),
        None => {
            println!("No ADTS frames found in the file.");
            println!("This doesn't appear to be a valid AAC stream.");
        }
    }

    Ok(())
}

#[derive(Default)]
struct StreamStats {
    first: Option<FirstFrame>,
    frames: usize,
    payload_bytes: usize,
}

struct FirstFrame {
    adts: Adts,
    format: Option<AudioFormat>,
}

impl FrameSink for StreamStats {
    fn frame_end(&mut self, _ctx: &Context, frame: &[u8], adts: &Adts) {
        if self.first.is_none() {
            self.first = Some(FirstFrame {
                adts: adts.clone(),
                format: adts.format().ok(),
            });
        }
        self.frames += 1;
        self.payload_bytes += frame.len();
    }
}

fn display_stats(first: &FirstFrame, stats: &StreamStats, total_bytes: usize) {
    let adts = &first.adts;
    let aot = AudioObjectType::from_u32(u32::from(adts.profile_object_type) + 1)
        .map(aot_to_str)
        .unwrap_or("UNKNOWN");

    println!();
    println!("AAC Stream Information");
    println!("======================");
    println!();
    println!("Stream Information");
    println!("  Framing                   ADTS");
    println!("  Audio object type         {aot}");
    match &first.format {
        Some(format) => {
            println!("  Sampling rate             {} Hz", format.sample_rate);
            println!("  Channels                  {}", format.channel_count);
        }
        None => {
            println!(
                "  Sampling frequency index  {}",
                adts.sampling_frequency_index
            );
            println!(
                "  Channel configuration     {}",
                adts.channel_configuration
            );
        }
    }
    println!(
        "  CRC protection            {}",
        if adts.protection_absent { "absent" } else { "present" }
    );
    println!();

    println!("Analysis Summary");
    println!("  Frames processed          {}", stats.frames);
    let size_mb = total_bytes as f64 / 1_000_000.0;
    println!("  Size                      {size_mb:.2} MB ({total_bytes} bytes)");

    if let Some(format) = &first.format {
        let total_samples = stats.frames * SAMPLES_PER_FRAME;
        let duration_secs = total_samples as f64 / f64::from(format.sample_rate);
        println!("  Duration                  {duration_secs:.2} s");
        if duration_secs > 0.0 {
            let avg_kbps = (stats.payload_bytes as f64 * 8.0) / (duration_secs * 1000.0);
            println!("  Average data rate         {avg_kbps:.1} kbps");
        }
    }
    println!();
}
