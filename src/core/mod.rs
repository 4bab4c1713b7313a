pub mod archiver;
pub mod batch;
pub mod compressor;
pub mod factory;

pub use crate::domain::model::{ArchiveEntry, ArchiveFormat, CompressionType, FileType};
pub use crate::domain::ports::{Archiver, Compressor, StreamEntry};
pub use crate::utils::error::Result;
