#![allow(dead_code)]

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard},
};

use tracing_subscriber::fmt::MakeWriter;

/// In-memory output destination shared between a logger and the test inspecting it.
#[derive(Clone, Debug, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

pub struct BufferWriter<'a>(MutexGuard<'a, Vec<u8>>);

impl Write for BufferWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Buffer {
    type Writer = BufferWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(self.0.lock().unwrap())
    }
}

/// Writer that accepts one byte per call, so that a record handed over in pieces would
/// interleave with other records.
#[derive(Clone, Debug, Default)]
pub struct TrickleBuffer(Buffer);

impl TrickleBuffer {
    pub fn lines(&self) -> Vec<String> {
        self.0.lines()
    }
}

pub struct TrickleWriter<'a>(BufferWriter<'a>);

impl Write for TrickleWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match buf.first() {
            Some(byte) => self.0.write(std::slice::from_ref(byte)),
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for TrickleBuffer {
    type Writer = TrickleWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        TrickleWriter(self.0.make_writer())
    }
}

/// A writer whose every write fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("destination unavailable"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
