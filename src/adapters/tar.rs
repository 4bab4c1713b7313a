use crate::adapters::from_unix_seconds;
use crate::adapters::walk::SourceEntry;
use crate::domain::model::ArchiveEntry;
use crate::domain::ports::{EntryVisitor, StreamEntry};
use crate::utils::error::Result;
use std::io::{Read, Write};

/// Writes `entries` as a ustar/GNU tar stream and returns the inner writer.
pub fn write_tar<W: Write>(writer: W, entries: &[SourceEntry]) -> Result<W> {
    let mut builder = tar::Builder::new(writer);
    builder.mode(tar::HeaderMode::Complete);
    builder.follow_symlinks(true);

    for entry in entries {
        if entry.is_directory {
            builder.append_dir(&entry.name, &entry.path)?;
        } else {
            builder.append_path_with_name(&entry.path, &entry.name)?;
        }
        tracing::debug!("Added {} to tar", entry.name);
    }

    Ok(builder.into_inner()?)
}

/// Visits regular files and directories of a tar stream; other entry kinds are skipped.
pub fn read_tar(reader: &mut dyn Read, visitor: &mut EntryVisitor<'_>) -> Result<()> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;

        let metadata = {
            let header = entry.header();
            let entry_type = header.entry_type();
            if !entry_type.is_file() && !entry_type.is_dir() {
                tracing::debug!("Skipping tar entry of type {:?}", entry_type);
                continue;
            }
            let name = entry.path()?.to_string_lossy().trim_end_matches('/').to_string();
            ArchiveEntry::new(name, entry.size(), entry_type.is_dir())
                .with_mode(header.mode().ok())
                .with_last_modified(header.mtime().ok().and_then(from_unix_seconds))
        };

        let mut stream_entry = StreamEntry::new(metadata, &mut entry);
        if !visitor(&mut stream_entry)? {
            break;
        }
    }
    Ok(())
}
