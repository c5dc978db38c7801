//! Positioned-write byte sinks.
//!
//! Container writers finalize box headers after the payload behind them has
//! been written, so a sink has to accept writes at arbitrary absolute
//! offsets, not only appends. [`SinkWriter`] adapts any [`Sink`] into the
//! `Write + Seek` pair that box writers expect.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A byte sink supporting writes at absolute offsets.
pub trait Sink {
    /// Write `buf` starting at `offset`, returning the number of bytes
    /// transferred. Writing past the current end extends the sink.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize>;

    /// Current size of the sink in bytes.
    fn size(&mut self) -> io::Result<u64>;

    /// Push buffered data to the underlying storage.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for Vec<u8> {
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        let end = start + buf.len();
        if self.len() < end {
            self.resize(end, 0);
        }
        self[start..end].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}

impl Sink for File {
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        self.seek(SeekFrom::Start(offset))?;
        self.write(buf)
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        (**self).write_at(offset, buf)
    }

    fn size(&mut self) -> io::Result<u64> {
        (**self).size()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        (**self).write_at(offset, buf)
    }

    fn size(&mut self) -> io::Result<u64> {
        (**self).size()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Buffered file sink.
///
/// Sequential writes go through a `BufWriter`; a write at any other offset
/// flushes and seeks first.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    position: u64,
    len: u64,
}

impl FileSink {
    /// Create the output file.
    ///
    /// Unless `overwrite` is set, an existing file is left untouched and the
    /// call fails with [`io::ErrorKind::AlreadyExists`].
    pub fn create<P: AsRef<Path>>(path: P, overwrite: bool) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = if overwrite {
            File::create(&path)?
        } else {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .map_err(|e| {
                    if e.kind() == io::ErrorKind::AlreadyExists {
                        io::Error::new(
                            io::ErrorKind::AlreadyExists,
                            format!("output file already exists: {}", path.display()),
                        )
                    } else {
                        e
                    }
                })?
        };

        tracing::debug!("Created output file {}", path.display());

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            position: 0,
            len: 0,
        })
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        if offset != self.position {
            self.writer.seek(SeekFrom::Start(offset))?;
        }
        let written = self.writer.write(buf)?;
        self.position = offset + written as u64;
        self.len = self.len.max(self.position);
        Ok(written)
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.len)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// `Write + Seek` view over a [`Sink`].
///
/// A write that transfers fewer bytes than requested is a failure
/// ([`io::ErrorKind::WriteZero`]), never a partial success.
#[derive(Debug)]
pub struct SinkWriter<S: Sink> {
    sink: S,
    position: u64,
}

impl<S: Sink> SinkWriter<S> {
    /// Wrap a sink, starting at offset 0.
    pub fn new(sink: S) -> Self {
        Self { sink, position: 0 }
    }

    /// Current write offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Borrow the sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the sink.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Unwrap the sink.
    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: Sink> Write for SinkWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let written = self.sink.write_at(self.position, buf)?;
        if written != buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "short write at offset {}: {} of {} bytes",
                    self.position,
                    written,
                    buf.len()
                ),
            ));
        }

        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl<S: Sink> Seek for SinkWriter<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.sink.size()?.checked_add_signed(delta),
        };

        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative offset")
        })?;

        self.position = target;
        Ok(target)
    }
}
