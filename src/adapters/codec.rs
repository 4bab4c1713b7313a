use crate::domain::model::CompressionType;
use crate::domain::ports::FinishingWriter;
use crate::utils::error::{ArchiveError, Result};
use std::io::{self, Read, Write};

/// Default xz preset, matching the `xz` command line tool.
pub const XZ_PRESET: u32 = 6;

/// An encoder for one of the supported compression types.
///
/// `finish` must be called to write the stream trailer.
pub enum CompressingWriter<W: Write> {
    Gzip(flate2::write::GzEncoder<W>),
    Bzip2(bzip2::write::BzEncoder<W>),
    Xz(xz2::write::XzEncoder<W>),
}

impl<W: Write> CompressingWriter<W> {
    pub fn new(compression: CompressionType, writer: W) -> Result<Self> {
        match compression {
            CompressionType::Gzip => Ok(Self::Gzip(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            ))),
            CompressionType::Bzip2 => Ok(Self::Bzip2(bzip2::write::BzEncoder::new(
                writer,
                bzip2::Compression::default(),
            ))),
            CompressionType::Xz => Ok(Self::Xz(xz2::write::XzEncoder::new(writer, XZ_PRESET))),
            CompressionType::Pack200 => Err(unsupported(compression, "compression")),
        }
    }

    /// Writes the trailer and hands back the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Gzip(encoder) => encoder.finish(),
            Self::Bzip2(encoder) => encoder.finish(),
            Self::Xz(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for CompressingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(encoder) => encoder.write(buf),
            Self::Bzip2(encoder) => encoder.write(buf),
            Self::Xz(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(encoder) => encoder.flush(),
            Self::Bzip2(encoder) => encoder.flush(),
            Self::Xz(encoder) => encoder.flush(),
        }
    }
}

impl<W: Write> FinishingWriter<W> for CompressingWriter<W> {
    fn finish(self: Box<Self>) -> io::Result<W> {
        CompressingWriter::finish(*self)
    }
}

/// Wraps `reader` in a decoder. Concatenated streams are decoded in full.
pub fn decompressing_reader<'a, R: Read + 'a>(
    compression: CompressionType,
    reader: R,
) -> Result<Box<dyn Read + 'a>> {
    match compression {
        CompressionType::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
        CompressionType::Bzip2 => Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader))),
        CompressionType::Xz => Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(reader))),
        CompressionType::Pack200 => Err(unsupported(compression, "decompression")),
    }
}

fn unsupported(compression: CompressionType, operation: &str) -> ArchiveError {
    ArchiveError::Unsupported {
        operation: operation.to_string(),
        format: compression.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(compression: CompressionType, data: &[u8]) -> Vec<u8> {
        let mut writer = CompressingWriter::new(compression, Vec::new()).unwrap();
        writer.write_all(data).unwrap();
        writer.finish().unwrap()
    }

    fn decode(compression: CompressionType, data: &[u8]) -> Vec<u8> {
        let mut reader = decompressing_reader(compression, data).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_gzip_magic_bytes() {
        let encoded = encode(CompressionType::Gzip, b"hello");
        assert_eq!(&encoded[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_concatenated_members_are_decoded() {
        for compression in [CompressionType::Gzip, CompressionType::Bzip2, CompressionType::Xz] {
            let mut stream = encode(compression, b"first,");
            stream.extend(encode(compression, b"second"));
            assert_eq!(decode(compression, &stream), b"first,second", "{}", compression);
        }
    }

    #[test]
    fn test_pack200_is_unsupported() {
        assert!(matches!(
            CompressingWriter::new(CompressionType::Pack200, Vec::new()),
            Err(ArchiveError::Unsupported { .. })
        ));
        assert!(decompressing_reader(CompressionType::Pack200, &b""[..]).is_err());
    }
}
