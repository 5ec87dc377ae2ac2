use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Result;
use log::Level;

use aac::ctx::Context;
use aac::process::dump::{Dump, DumpType};
use aac::process::reader::{FrameSink, Reader};
use aac::structs::adts::Adts;
use aac::syntax::{DUMP_FLAGS_FRAME_DATA, READER_FLAGS_FRAME_DATA};

use super::command::{Cli, DumpArgs};
use crate::input::InputStream;

const CHUNK_SIZE: usize = 64 * 1024;

struct JsonPrinter {
    dump: Dump,
    out: Box<dyn Write>,
    flags: u32,
    pretty: bool,
    failure: Option<anyhow::Error>,
    frames: usize,
}

impl FrameSink for JsonPrinter {
    fn frame_end(&mut self, ctx: &Context, _frame: &[u8], _adts: &Adts) {
        if self.failure.is_some() {
            return;
        }
        // The dump traversal needs the context mutably; render a clone.
        let mut ctx = ctx.clone();
        if let Err(e) = self.render(&mut ctx) {
            self.failure = Some(e);
        }
    }
}

impl JsonPrinter {
    fn render(&mut self, ctx: &mut Context) -> Result<()> {
        self.dump.adts_frame(ctx, self.flags)?;
        let json = if self.pretty {
            self.dump.json_string_pretty()?
        } else {
            self.dump.json_string()?
        };
        writeln!(self.out, "{json}")?;
        self.frames += 1;
        Ok(())
    }
}

pub fn cmd_dump(args: &DumpArgs, cli: &Cli) -> Result<()> {
    log::info!("Dumping AAC stream: {}", args.input.display());

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    let (reader_flags, dump_flags) = if args.no_payload {
        (0, 0)
    } else {
        (READER_FLAGS_FRAME_DATA, DUMP_FLAGS_FRAME_DATA)
    };

    let mut reader = Reader::new(JsonPrinter {
        dump: Dump::new(DumpType::Json),
        out,
        flags: dump_flags,
        pretty: args.pretty,
        failure: None,
        frames: 0,
    });
    if cli.strict {
        reader.set_fail_level(Level::Warn);
    }

    let mut input = InputStream::open(&args.input)?;
    loop {
        let more = input.fill(CHUNK_SIZE)?;
        let mut off = 0;
        reader.parse(reader_flags, input.data(), &mut off)?;
        input.consume(off);
        if let Some(e) = reader.sink_mut().failure.take() {
            return Err(e);
        }
        if !more {
            break;
        }
    }

    let frames = reader.sink().frames;
    log::info!("Dumped {frames} frames");
    Ok(())
}
