use std::collections::VecDeque;
use std::io::{Read, Write};

/// Host character I/O exposed to the emulated program through interrupts
pub trait Console {
    /// Read one byte of input, `None` once the input is exhausted
    ///
    /// # Errors
    ///
    /// Forwards errors from the underlying stream.
    fn read_byte(&mut self) -> std::io::Result<Option<u8>>;

    /// Write bytes to the output and flush them
    ///
    /// # Errors
    ///
    /// Forwards errors from the underlying stream.
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}

/// The process standard input and output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {
    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        let mut buf = [0; 1];
        match std::io::stdin().lock().read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    }
}

/// An in-memory console, fed with a fixed input and capturing the output
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl BufferConsole {
    #[must_use]
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            output: Vec::new(),
        }
    }

    /// Everything written so far
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

impl Console for BufferConsole {
    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }
}
