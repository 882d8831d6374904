//! Reader and writer plumbing shared by the sorter: byte counting for
//! progress, transparent gzip input, and optionally compressed output.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use flate2::read::MultiGzDecoder;
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;

use crate::utils::validation::is_gzip_path;

/// Buffer size for input, output and spill streams.
pub const IO_BUFFER_SIZE: usize = 64 * 1024;

/// Reader adapter counting the bytes pulled from the underlying source.
pub struct CountingReader<R> {
    inner: R,
    count: Arc<AtomicU64>,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R, count: Arc<AtomicU64>) -> Self {
        Self { inner, count }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Open a text input, decompressing `.gz` files.
///
/// `consumed` tracks bytes read from the file on disk (compressed bytes for
/// gzip input), so it can be compared against the file size for progress.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened.
pub fn open_input(path: &Path, consumed: Arc<AtomicU64>) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let counted = CountingReader::new(file, consumed);
    if is_gzip_path(path) {
        let decoder = MultiGzDecoder::new(BufReader::with_capacity(IO_BUFFER_SIZE, counted));
        Ok(Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, counted)))
    }
}

/// A writer that may compress what it is given.
pub enum CompressedWriter<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Deflate(DeflateEncoder<W>),
}

impl<W: Write> CompressedWriter<W> {
    /// Gzip for `.gz` destinations, plain otherwise.
    pub fn for_path(path: &Path, inner: W) -> Self {
        if is_gzip_path(path) {
            CompressedWriter::Gzip(GzEncoder::new(inner, Compression::default()))
        } else {
            CompressedWriter::Plain(inner)
        }
    }

    /// Raw deflate at the fastest level, used for spill files.
    pub fn fast_deflate(inner: W) -> Self {
        CompressedWriter::Deflate(DeflateEncoder::new(inner, Compression::fast()))
    }

    /// Write any compression trailer and flush, returning the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if finishing the stream or flushing fails.
    pub fn finish(self) -> io::Result<W> {
        let mut inner = match self {
            CompressedWriter::Plain(w) => w,
            CompressedWriter::Gzip(w) => w.finish()?,
            CompressedWriter::Deflate(w) => w.finish()?,
        };
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            CompressedWriter::Plain(w) => w.write(buf),
            CompressedWriter::Gzip(w) => w.write(buf),
            CompressedWriter::Deflate(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CompressedWriter::Plain(w) => w.flush(),
            CompressedWriter::Gzip(w) => w.flush(),
            CompressedWriter::Deflate(w) => w.flush(),
        }
    }
}
