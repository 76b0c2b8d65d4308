use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// A readable artifact body handed to put-style operations.
///
/// Bodies constructed as `seekable` are rewound to their start before each
/// upload, so a source that was already read (e.g. while computing a size or
/// checksum) uploads from the beginning. `streaming` bodies have no rewind
/// capability and the rewind is silently skipped.
pub struct ArtifactBody(Inner);

enum Inner {
    Seekable(Box<dyn ReadSeek>),
    Streaming(Box<dyn Read + Send>),
}

impl ArtifactBody {
    pub fn seekable(reader: impl Read + Seek + Send + 'static) -> Self {
        Self(Inner::Seekable(Box::new(reader)))
    }

    pub fn streaming(reader: impl Read + Send + 'static) -> Self {
        Self(Inner::Streaming(Box::new(reader)))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::seekable(Cursor::new(bytes.into()))
    }

    /// Seek back to the start of a seekable body; no-op for streaming ones.
    pub(crate) fn rewind_to_start(&mut self) -> io::Result<()> {
        match &mut self.0 {
            Inner::Seekable(reader) => reader.seek(SeekFrom::Start(0)).map(|_| ()),
            Inner::Streaming(_) => Ok(()),
        }
    }
}

impl Read for ArtifactBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.0 {
            Inner::Seekable(reader) => reader.read(buf),
            Inner::Streaming(reader) => reader.read(buf),
        }
    }
}

impl fmt::Debug for ArtifactBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Inner::Seekable(_) => f.write_str("ArtifactBody::Seekable"),
            Inner::Streaming(_) => f.write_str("ArtifactBody::Streaming"),
        }
    }
}
