use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::Result;

/// Buffered input over a file or stdin pipe, keeping unconsumed bytes
/// available across chunk boundaries.
///
/// The AAC reader leaves its offset cursor at the first byte of an
/// incomplete frame; [`consume`](Self::consume) drops everything before it
/// and the next [`fill`](Self::fill) appends fresh input behind the
/// retained tail.
pub struct InputStream {
    reader: Box<dyn Read>,
    buffer: Vec<u8>,
    is_pipe: bool,
}

impl InputStream {
    /// Opens a path, with "-" selecting stdin.
    pub fn open<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let is_pipe = input_path.as_ref().to_string_lossy() == "-";

        let reader: Box<dyn Read> = if is_pipe {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(input_path)?;
            Box::new(BufReader::new(file))
        };

        Ok(Self {
            reader,
            buffer: Vec::new(),
            is_pipe,
        })
    }

    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    /// Appends up to `chunk_size` fresh bytes behind the retained tail.
    ///
    /// Returns false once the input is exhausted.
    pub fn fill(&mut self, chunk_size: usize) -> Result<bool> {
        let tail = self.buffer.len();
        self.buffer.resize(tail + chunk_size, 0);
        let read = self.reader.read(&mut self.buffer[tail..])?;
        self.buffer.truncate(tail + read);
        Ok(read > 0)
    }

    /// The buffered, not yet consumed bytes.
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Drops `n` consumed bytes from the front of the buffer.
    pub fn consume(&mut self, n: usize) {
        self.buffer.drain(..n);
    }
}
