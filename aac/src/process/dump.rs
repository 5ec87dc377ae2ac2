//! Field-event sink for bitstream introspection.
//!
//! The dump mode of the syntax engine reports every field as an event;
//! a [`DumpSink`] renders the event stream. The JSON sink builds a
//! [`serde_json::Value`] tree that mirrors the syntax structure.

use std::mem;

use anyhow::{Result, bail};
use serde_json::{Map, Value};

use crate::ctx::Context;
use crate::structs::adts::adts_error_check;
use crate::syntax::{DUMP_FLAGS_FRAME_DATA, DumpOp, SyntaxOp};
use crate::utils::errors::DumpError;

const MAX_STACK_DEPTH: usize = 16;

/// Consumer of the dump-mode event stream.
pub trait DumpSink {
    fn begin_struct(&mut self, name: &'static str) -> Result<()>;
    fn end_struct(&mut self, name: &'static str) -> Result<()>;
    fn begin_array(&mut self, name: &'static str) -> Result<()>;
    fn end_array(&mut self, name: &'static str) -> Result<()>;
    fn begin_array_item(&mut self) -> Result<()>;
    fn end_array_item(&mut self) -> Result<()>;
    fn field(&mut self, name: &str, value: i64) -> Result<()>;
}

/// Extracts the leaf name of a dotted or arrow field path, stripping
/// spaces and any index suffix.
fn extract_key(field: &str) -> &str {
    let key = field.rsplit('.').next().unwrap_or(field);
    let key = key.rsplit('>').next().unwrap_or(key);
    let key = key.trim_start();
    let key = match key.find('[') {
        Some(end) => &key[..end],
        None => key,
    };
    key.trim_end()
}

/// JSON rendering of the event stream.
///
/// Containers are kept on a stack; closing a container attaches it to its
/// parent, by name under an object or by position in an array.
#[derive(Debug)]
struct JsonSink {
    stack: Vec<Value>,
}

impl JsonSink {
    fn new() -> Self {
        Self {
            stack: vec![Value::Object(Map::new())],
        }
    }

    fn push(&mut self, value: Value) -> Result<()> {
        if self.stack.len() == MAX_STACK_DEPTH {
            bail!(DumpError::StackDepthExceeded(MAX_STACK_DEPTH));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value> {
        if self.stack.len() < 2 {
            bail!(DumpError::UnbalancedEvents);
        }
        self.stack
            .pop()
            .ok_or_else(|| DumpError::UnbalancedEvents.into())
    }

    fn current(&mut self) -> Result<&mut Value> {
        self.stack
            .last_mut()
            .ok_or_else(|| DumpError::UnbalancedEvents.into())
    }

    fn attach(&mut self, name: &str, value: Value) -> Result<()> {
        match self.current()? {
            Value::Object(map) => {
                map.insert(name.to_owned(), value);
            }
            Value::Array(items) => {
                items.push(value);
            }
            _ => bail!(DumpError::UnbalancedEvents),
        }
        Ok(())
    }
}

impl DumpSink for JsonSink {
    fn begin_struct(&mut self, _name: &'static str) -> Result<()> {
        self.push(Value::Object(Map::new()))
    }

    fn end_struct(&mut self, name: &'static str) -> Result<()> {
        let value = self.pop()?;
        self.attach(name, value)
    }

    fn begin_array(&mut self, _name: &'static str) -> Result<()> {
        self.push(Value::Array(Vec::new()))
    }

    fn end_array(&mut self, name: &'static str) -> Result<()> {
        let value = self.pop()?;
        self.attach(name, value)
    }

    fn begin_array_item(&mut self) -> Result<()> {
        self.push(Value::Object(Map::new()))
    }

    fn end_array_item(&mut self) -> Result<()> {
        let value = self.pop()?;
        self.attach("", value)
    }

    fn field(&mut self, name: &str, value: i64) -> Result<()> {
        let key = extract_key(name);
        match self.current()? {
            Value::Array(items) => {
                items.push(Value::from(value));
            }
            Value::Object(map) => {
                map.insert(key.to_owned(), Value::from(value));
            }
            _ => bail!(DumpError::UnbalancedEvents),
        }
        Ok(())
    }
}

/// Output format of a [`Dump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpType {
    Json,
}

/// Owner of a dump sink and its rendered tree.
///
/// The tree accumulates from [`adts_frame`](Self::adts_frame) calls until
/// [`clear`](Self::clear) resets it; `adts_frame` clears implicitly, so one
/// call renders one frame.
#[derive(Debug)]
pub struct Dump {
    sink: JsonSink,
}

impl Dump {
    pub fn new(dump_type: DumpType) -> Self {
        match dump_type {
            DumpType::Json => Self {
                sink: JsonSink::new(),
            },
        }
    }

    pub fn clear(&mut self) {
        self.sink = JsonSink::new();
    }

    /// The rendered tree of the last dumped frame.
    pub fn json_value(&self) -> &Value {
        &self.sink.stack[0]
    }

    pub fn json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self.json_value())?)
    }

    pub fn json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.json_value())?)
    }

    /// Renders the context's current ADTS frame into the sink.
    ///
    /// The header fields land under `aac_adts`; with
    /// [`DUMP_FLAGS_FRAME_DATA`] the current raw_data_block(s) are expanded
    /// as well.
    pub fn adts_frame(&mut self, ctx: &mut Context, flags: u32) -> Result<()> {
        self.clear();
        let mut adts = ctx.adts()?.clone();
        let mut op = DumpOp::new(&mut self.sink, flags);

        op.begin_struct("aac_adts")?;
        adts.fixed_header(&mut op)?;
        adts.variable_header(&mut op)?;
        op.end_struct("aac_adts")?;

        adts_error_check(&mut op, &adts)?;
        if flags & DUMP_FLAGS_FRAME_DATA != 0 {
            let mut frame = mem::take(&mut ctx.adts_frame);
            if adts.number_of_raw_data_blocks_in_frame == 0 {
                op.begin_struct("raw_data_block")?;
                let res = frame.raw_data_blocks[0].syntax(&mut op, ctx);
                let res = res.and_then(|()| op.end_struct("raw_data_block"));
                ctx.adts_frame = frame;
                res?;
            } else {
                let mut res = Ok(());
                for i in 0..=usize::from(adts.number_of_raw_data_blocks_in_frame) {
                    res = frame.raw_data_blocks[i].syntax(&mut op, ctx);
                    if res.is_err() {
                        break;
                    }
                }
                ctx.adts_frame = frame;
                res?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format;
    use crate::structs::adts::Adts;

    #[test]
    fn key_extraction() {
        assert_eq!(extract_key("window_sequence"), "window_sequence");
        assert_eq!(extract_key("self.ics_info.window_sequence"), "window_sequence");
        assert_eq!(extract_key("ics_info->window_sequence"), "window_sequence");
        assert_eq!(extract_key("self . info . sect_cb [g] [i]"), "sect_cb");
        assert_eq!(extract_key("coef [w] [filt] [i]"), "coef");
    }

    #[test]
    fn sink_nests_structs_and_arrays() -> Result<()> {
        let mut sink = JsonSink::new();
        sink.begin_struct("outer")?;
        sink.field("self.a", 1)?;
        sink.begin_array("items")?;
        sink.begin_array_item()?;
        sink.field("self.b", 2)?;
        sink.end_array_item()?;
        sink.begin_array_item()?;
        sink.field("self.b", 3)?;
        sink.end_array_item()?;
        sink.end_array("items")?;
        sink.end_struct("outer")?;

        let root = &sink.stack[0];
        assert_eq!(root["outer"]["a"], 1);
        assert_eq!(root["outer"]["items"][0]["b"], 2);
        assert_eq!(root["outer"]["items"][1]["b"], 3);
        Ok(())
    }

    #[test]
    fn sink_depth_is_bounded() {
        let mut sink = JsonSink::new();
        for _ in 0..MAX_STACK_DEPTH - 1 {
            sink.begin_struct("nested").unwrap();
        }
        let err = sink.begin_struct("one too deep").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DumpError>(),
            Some(DumpError::StackDepthExceeded(MAX_STACK_DEPTH))
        ));
    }

    #[test]
    fn frame_data_dump_expands_elements() -> Result<()> {
        // Write a silent frame, parse it back with payload data, dump it.
        let mut ctx = Context::new();
        ctx.set_adts(Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS)?);
        let frame = crate::process::writer::write_silent_frame(&mut ctx, 2, 24)?;

        let mut reader = crate::process::reader::Reader::new(());
        let mut off = 0;
        reader.parse(crate::syntax::READER_FLAGS_FRAME_DATA, &frame, &mut off)?;

        let mut dump = Dump::new(DumpType::Json);
        dump.adts_frame(reader.ctx_mut(), DUMP_FLAGS_FRAME_DATA)?;

        let root = dump.json_value();
        assert_eq!(root["aac_adts"]["aac_frame_length"], 24);
        let block = &root["raw_data_block"];
        assert!(block.get("fill_element").is_some());
        let cpe = &block["channel_pair_element"];
        assert_eq!(cpe["common_window"], 1);
        assert_eq!(cpe["individual_channel_stream"][0]["global_gain"], 0x8C);
        assert_eq!(cpe["individual_channel_stream"][1]["global_gain"], 0x8C);
        Ok(())
    }

    #[test]
    fn header_only_dump() -> Result<()> {
        let mut ctx = Context::new();
        let mut adts = Adts::from_format(&format::AAC_LC_16B_48000HZ_STEREO_ADTS)?;
        adts.aac_frame_length = 13;
        ctx.set_adts(adts);

        let mut dump = Dump::new(DumpType::Json);
        dump.adts_frame(&mut ctx, 0)?;

        let root = dump.json_value();
        assert_eq!(root["aac_adts"]["syncword"], 0xFFF);
        assert_eq!(root["aac_adts"]["sampling_frequency_index"], 3);
        assert_eq!(root["aac_adts"]["channel_configuration"], 2);
        assert_eq!(root["aac_adts"]["aac_frame_length"], 13);
        assert!(root.get("raw_data_block").is_none());
        assert!(dump.json_string()?.contains("\"syncword\":4095"));
        Ok(())
    }
}
