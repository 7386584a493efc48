//! Streaming compression between the local file and the object writer.
//!
//! # Design
//! - `Encoder` is a `Write` adapter so the transfer loop never branches on compression.
//! - `finish` hands the underlying object writer back only after the compressor has
//!   flushed its trailer, which keeps the close order (compressor, then remote).
//! - Memory use is bounded by the compressor window, never by file size.

use std::io::{self, Read, Write};

use dumpsweep_config::Compression;
use flate2::Compression as GzLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::store::ObjectWriter;

/// Compressing writer wrapped around an object writer.
pub enum Encoder {
    /// Bytes pass through unchanged.
    Plain(Box<dyn ObjectWriter>),
    /// Bytes are gzip-compressed on the way through.
    Gzip(GzEncoder<Box<dyn ObjectWriter>>),
}

impl Encoder {
    /// Wrap `writer` according to `compression`.
    #[must_use]
    pub fn new(compression: Compression, writer: Box<dyn ObjectWriter>) -> Self {
        match compression {
            Compression::None => Self::Plain(writer),
            Compression::Gzip => Self::Gzip(GzEncoder::new(writer, GzLevel::default())),
        }
    }

    /// Flush any buffered compressed output and return the object writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the final compressed bytes cannot be written.
    pub fn finish(self) -> io::Result<Box<dyn ObjectWriter>> {
        match self {
            Self::Plain(mut writer) => {
                writer.flush()?;
                Ok(writer)
            }
            Self::Gzip(encoder) => encoder.finish(),
        }
    }
}

impl Write for Encoder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(writer) => writer.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(writer) => writer.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Wrap `reader` with the decompressing transform matching `compression`.
pub fn decoder<'a, R>(compression: Compression, reader: R) -> Box<dyn Read + 'a>
where
    R: Read + 'a,
{
    match compression {
        Compression::None => Box::new(reader),
        Compression::Gzip => Box::new(GzDecoder::new(reader)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn bytes(&self) -> Vec<u8> {
            self.0.lock().map(|bytes| bytes.clone()).unwrap_or_default()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl ObjectWriter for Captured {
        fn commit(self: Box<Self>) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn gzip_encoder_output_decodes_to_the_source() -> io::Result<()> {
        let sink = Captured::default();
        let mut encoder = Encoder::new(Compression::Gzip, Box::new(sink.clone()));
        let payload = b"core dump payload ".repeat(512);
        encoder.write_all(&payload)?;
        encoder.finish()?.commit()?;

        let stored = sink.bytes();
        assert_ne!(stored, payload);
        assert_eq!(&stored[..2], &[0x1f, 0x8b]);

        let mut restored = Vec::new();
        decoder(Compression::Gzip, stored.as_slice()).read_to_end(&mut restored)?;
        assert_eq!(restored, payload);
        Ok(())
    }

    #[test]
    fn plain_encoder_passes_bytes_through() -> io::Result<()> {
        let sink = Captured::default();
        let mut encoder = Encoder::new(Compression::None, Box::new(sink.clone()));
        encoder.write_all(b"raw")?;
        encoder.finish()?.commit()?;
        assert_eq!(sink.bytes(), b"raw");

        let mut restored = Vec::new();
        decoder(Compression::None, sink.bytes().as_slice()).read_to_end(&mut restored)?;
        assert_eq!(restored, b"raw");
        Ok(())
    }
}
