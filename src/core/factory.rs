use crate::core::archiver::{CompressedArchiver, FormatArchiver};
use crate::core::compressor::StreamCompressor;
use crate::domain::model::{ArchiveFormat, CompressionType, FileType};
use crate::domain::ports::{Archiver, Compressor};
use crate::utils::error::{ArchiveError, Result};
use std::path::Path;

/// Builds archivers from formats, names or file names.
pub struct ArchiverFactory;

impl ArchiverFactory {
    pub fn create_archiver(format: ArchiveFormat) -> Box<dyn Archiver> {
        Box::new(FormatArchiver::new(format))
    }

    pub fn create_compressed_archiver(
        format: ArchiveFormat,
        compression: CompressionType,
    ) -> Box<dyn Archiver> {
        Box::new(CompressedArchiver::new(
            FormatArchiver::new(format),
            StreamCompressor::new(compression),
        ))
    }

    /// Parses `format` and the optional `compression` name, ignoring case.
    pub fn create_archiver_from_names(
        format: &str,
        compression: Option<&str>,
    ) -> Result<Box<dyn Archiver>> {
        let format: ArchiveFormat = format.parse()?;
        match compression {
            Some(name) => Ok(Self::create_compressed_archiver(format, name.parse()?)),
            None => Ok(Self::create_archiver(format)),
        }
    }

    /// Picks the archiver from the file name suffix, e.g. `.tar.gz`.
    pub fn create_archiver_for_path(archive: &Path) -> Result<Box<dyn Archiver>> {
        Self::create_archiver_for_file_type(FileType::of_path(archive)).map_err(|_| {
            ArchiveError::UnknownFileType {
                path: archive.display().to_string(),
            }
        })
    }

    pub fn create_archiver_for_file_type(file_type: FileType) -> Result<Box<dyn Archiver>> {
        match (file_type.archive_format(), file_type.compression_type()) {
            (Some(format), Some(compression)) => {
                Ok(Self::create_compressed_archiver(format, compression))
            }
            (Some(format), None) => Ok(Self::create_archiver(format)),
            (None, _) => Err(ArchiveError::UnknownFileType {
                path: file_type.suffix().to_string(),
            }),
        }
    }
}

/// Builds compressors from compression types, names or file names.
pub struct CompressorFactory;

impl CompressorFactory {
    pub fn create_compressor(compression: CompressionType) -> Box<dyn Compressor> {
        Box::new(StreamCompressor::new(compression))
    }

    pub fn create_compressor_from_name(compression: &str) -> Result<Box<dyn Compressor>> {
        Ok(Self::create_compressor(compression.parse()?))
    }

    pub fn create_compressor_for_path(source: &Path) -> Result<Box<dyn Compressor>> {
        Self::create_compressor_for_file_type(FileType::of_path(source)).map_err(|_| {
            ArchiveError::UnknownFileType {
                path: source.display().to_string(),
            }
        })
    }

    pub fn create_compressor_for_file_type(file_type: FileType) -> Result<Box<dyn Compressor>> {
        file_type
            .compression_type()
            .map(Self::create_compressor)
            .ok_or_else(|| ArchiveError::UnknownFileType {
                path: file_type.suffix().to_string(),
            })
    }
}
