pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use config::manifest::{BatchManifest, BatchSettings, JobAction, JobConfig};
pub use core::batch::{BatchEngine, BatchReport, JobReport, JobStatus};
pub use core::factory::{ArchiverFactory, CompressorFactory};
pub use domain::model::{ArchiveEntry, ArchiveFormat, CompressionType, FileType};
pub use domain::ports::{
    Archiver, Compressor, DirectoryModes, EntryVisitor, FinishingWriter, StreamEntry,
};
pub use utils::error::{ArchiveError, Result};
