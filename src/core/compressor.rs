use crate::adapters::codec::{self, CompressingWriter};
use crate::domain::model::{CompressionType, FileType};
use crate::domain::ports::{Compressor, FinishingWriter};
use crate::utils::error::{ArchiveError, Result};
use crate::utils::io::{copy, copy_to_file};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// `Compressor` backed by the gzip, bzip2 and xz stream codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamCompressor {
    compression: CompressionType,
}

impl StreamCompressor {
    pub fn new(compression: CompressionType) -> Self {
        Self { compression }
    }

    pub fn compression_type(&self) -> CompressionType {
        self.compression
    }

    pub fn encoder<W: Write>(&self, writer: W) -> Result<CompressingWriter<W>> {
        CompressingWriter::new(self.compression, writer)
    }

    pub fn decoder<'a, R: Read + 'a>(&self, reader: R) -> Result<Box<dyn Read + 'a>> {
        codec::decompressing_reader(self.compression, reader)
    }

    pub(crate) fn ensure_supported(&self) -> Result<()> {
        match self.compression {
            CompressionType::Pack200 => Err(ArchiveError::Unsupported {
                operation: "compression".to_string(),
                format: self.compression.name().to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Name of the decompressed file for `source`.
    ///
    /// `logs.tar.gz` and `logs.tgz` both become `logs.tar`, `notes.txt.gz` becomes `notes.txt`.
    pub fn decompressed_file_name(source: &Path) -> Result<String> {
        let file_type = FileType::of_path(source);
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !file_type.is_compressed() {
            return Err(ArchiveError::UnknownFileType {
                path: source.display().to_string(),
            });
        }

        let stem = name
            .get(..name.len().saturating_sub(file_type.suffix().len()))
            .unwrap_or_default()
            .to_string();
        let decompressed = match file_type.archive_format() {
            Some(format) => format!("{}{}", stem, format.default_file_extension()),
            None => stem,
        };

        if decompressed.is_empty() {
            return Err(ArchiveError::InvalidSource {
                path: source.to_path_buf(),
                reason: "file name consists only of the compression suffix".to_string(),
            });
        }
        Ok(decompressed)
    }
}

fn assert_source(source: &Path) -> Result<()> {
    if !source.exists() {
        return Err(ArchiveError::InvalidSource {
            path: source.to_path_buf(),
            reason: "does not exist".to_string(),
        });
    }
    if source.is_dir() {
        return Err(ArchiveError::InvalidSource {
            path: source.to_path_buf(),
            reason: "is a directory, a file is expected".to_string(),
        });
    }
    Ok(())
}

/// Output file for `destination`: inside it when it is a directory, itself otherwise.
fn target_file(destination: &Path, file_name: impl FnOnce() -> Result<String>) -> Result<PathBuf> {
    if destination.is_dir() {
        return Ok(destination.join(file_name()?));
    }
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(destination.to_path_buf())
}

impl Compressor for StreamCompressor {
    fn compress(&self, source: &Path, destination: &Path) -> Result<PathBuf> {
        self.ensure_supported()?;
        assert_source(source)?;

        let target = target_file(destination, || {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(format!("{}{}", name, self.filename_extension()))
        })?;

        let mut input = BufReader::new(File::open(source)?);
        let mut encoder = self.encoder(BufWriter::new(File::create(&target)?))?;
        let count = copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()?;

        tracing::info!(
            "Compressed {} ({} bytes) into {}",
            source.display(),
            count,
            target.display()
        );
        Ok(target)
    }

    fn decompress(&self, source: &Path, destination: &Path) -> Result<PathBuf> {
        self.ensure_supported()?;
        assert_source(source)?;

        let target = target_file(destination, || Self::decompressed_file_name(source))?;
        let mut input = BufReader::new(File::open(source)?);
        self.decompress_reader(&mut input, &target)
    }

    fn decompress_reader(&self, source: &mut dyn Read, destination: &Path) -> Result<PathBuf> {
        let mut decoder = self.decoder(source)?;
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let count = copy_to_file(&mut decoder, destination)?;
        tracing::info!("Decompressed {} bytes into {}", count, destination.display());
        Ok(destination.to_path_buf())
    }

    fn decompressing_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> Result<Box<dyn Read + 'a>> {
        self.decoder(reader)
    }

    fn compressing_writer<'a>(
        &self,
        writer: Box<dyn Write + 'a>,
    ) -> Result<Box<dyn FinishingWriter<Box<dyn Write + 'a>> + 'a>> {
        Ok(Box::new(self.encoder(writer)?))
    }

    fn filename_extension(&self) -> String {
        self.compression.default_file_extension().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decompressed_file_name() {
        let name = |s: &str| StreamCompressor::decompressed_file_name(Path::new(s)).unwrap();
        assert_eq!(name("notes.txt.gz"), "notes.txt");
        assert_eq!(name("logs.tar.gz"), "logs.tar");
        assert_eq!(name("logs.TGZ"), "logs.tar");
        assert_eq!(name("data.XZ"), "data");
        assert!(StreamCompressor::decompressed_file_name(Path::new("readme.md")).is_err());
        assert!(StreamCompressor::decompressed_file_name(Path::new(".gz")).is_err());
    }

    #[test]
    fn test_compress_into_directory_appends_extension() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("report.csv");
        fs::write(&source, b"a,b\n1,2\n").unwrap();
        let out = temp_dir.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let compressor = StreamCompressor::new(CompressionType::Bzip2);
        let compressed = compressor.compress(&source, &out).unwrap();
        assert_eq!(compressed, out.join("report.csv.bz2"));

        let restored = compressor.decompress(&compressed, &out).unwrap();
        assert_eq!(restored, out.join("report.csv"));
        assert_eq!(fs::read(restored).unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_compress_rejects_directory_source() {
        let temp_dir = TempDir::new().unwrap();
        let compressor = StreamCompressor::new(CompressionType::Gzip);
        assert!(matches!(
            compressor.compress(temp_dir.path(), &temp_dir.path().join("x.gz")),
            Err(ArchiveError::InvalidSource { .. })
        ));
    }

    #[test]
    fn test_pack200_reports_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("lib.jar");
        fs::write(&source, b"PK").unwrap();
        let compressor = StreamCompressor::new(CompressionType::Pack200);
        assert!(matches!(
            compressor.compress(&source, temp_dir.path()),
            Err(ArchiveError::Unsupported { .. })
        ));
        assert!(!temp_dir.path().join("lib.jar.pack").exists());
    }
}
