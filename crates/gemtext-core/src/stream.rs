// SPDX-License-Identifier: AGPL-3.0-or-later
//! Chunked gemtext-to-HTML stream
//!
//! [`HtmlStream`] pairs a [`Tokenizer`] with an [`HtmlCompiler`] and writes
//! each HTML fragment to a sink as soon as its chunk is compiled.

use std::io::{self, Read, Write};

use crate::error::{ConversionError, Result};
use crate::formats::html::{CompileOptions, HtmlCompiler};
use crate::tokenizer::Tokenizer;

/// Bytes read per chunk by [`pipe`]
const CHUNK_SIZE: usize = 8 * 1024;

/// Writable gemtext input, HTML output
#[derive(Debug)]
pub struct HtmlStream<W: Write> {
    tokenizer: Tokenizer,
    compiler: HtmlCompiler,
    sink: W,
    ended: bool,
}

impl<W: Write> HtmlStream<W> {
    pub fn new(sink: W, options: CompileOptions) -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            compiler: HtmlCompiler::new(options),
            sink,
            ended: false,
        }
    }

    /// Compile a chunk and write its HTML to the sink
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        self.emit(chunk, false)
    }

    /// Compile the last chunk, write its HTML, and flush the sink
    ///
    /// Any `push` or `finish` afterwards fails with
    /// [`ConversionError::WriteAfterEnd`].
    pub fn finish(&mut self, chunk: &[u8]) -> Result<()> {
        self.emit(chunk, true)?;
        self.sink.flush()?;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.ended
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn emit(&mut self, chunk: &[u8], done: bool) -> Result<()> {
        if self.ended {
            return Err(ConversionError::WriteAfterEnd);
        }

        // The tokenizer is spent once `done` is fed, even if the sink fails.
        self.ended = done;

        let tokens = self.tokenizer.feed(chunk, done);
        let html = self.compiler.compile(&tokens);
        self.sink.write_all(html.as_bytes())?;
        Ok(())
    }
}

impl<W: Write> Write for HtmlStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf).map_err(into_io_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

fn into_io_error(err: ConversionError) -> io::Error {
    match err {
        ConversionError::IoError(err) => err,
        other => io::Error::other(other),
    }
}

/// Read gemtext from `reader` to its end, writing HTML to `writer`
///
/// Returns the writer once the stream is finished and flushed.
#[tracing::instrument(level = "debug", skip_all)]
pub fn pipe<R: Read, W: Write>(mut reader: R, writer: W, options: CompileOptions) -> Result<W> {
    let mut stream = HtmlStream::new(writer, options);
    let mut buffer = vec![0; CHUNK_SIZE];
    let mut total = 0;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        total += read;
        stream.push(&buffer[..read])?;
    }

    stream.finish(&[])?;
    tracing::debug!(bytes = total, "piped gemtext to html");
    Ok(stream.into_inner())
}
