use crate::adapters::walk::SourceEntry;
use crate::adapters::{from_unix_seconds, unix_seconds};
use crate::domain::model::ArchiveEntry;
use crate::domain::ports::{EntryVisitor, StreamEntry};
use crate::utils::error::{ArchiveError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};

const GLOBAL_HEADER: &[u8] = b"!<arch>\n";

/// Writes the regular files of `entries` into a flat ar archive.
///
/// ar has no directories: nested files are stored under their base name and
/// two files sharing a base name are rejected.
pub fn write_ar<W: Write>(mut writer: W, entries: &[SourceEntry]) -> Result<W> {
    let files: Vec<&SourceEntry> = entries.iter().filter(|e| !e.is_directory).collect();
    if files.is_empty() {
        writer.write_all(GLOBAL_HEADER)?;
        return Ok(writer);
    }

    let mut seen = HashSet::new();
    let mut builder = ar::Builder::new(writer);
    for entry in files {
        let identifier = entry.base_name().to_string();
        if !seen.insert(identifier.clone()) {
            return Err(ArchiveError::InvalidArchive {
                message: format!("duplicate ar member name {}", identifier),
            });
        }

        let mut header = ar::Header::new(identifier.into_bytes(), entry.size);
        header.set_mode(entry.mode.unwrap_or(0o644));
        header.set_mtime(unix_seconds(entry.last_modified));
        builder.append(&header, BufReader::new(File::open(&entry.path)?))?;
        tracing::debug!("Added {} to ar", entry.name);
    }

    Ok(builder.into_inner()?)
}

pub fn read_ar(reader: &mut dyn Read, visitor: &mut EntryVisitor<'_>) -> Result<()> {
    let mut archive = ar::Archive::new(reader);

    while let Some(entry) = archive.next_entry() {
        let mut entry = entry?;
        let metadata = {
            let header = entry.header();
            let name = String::from_utf8_lossy(header.identifier()).into_owned();
            ArchiveEntry::new(name, header.size(), false)
                .with_mode(Some(header.mode()))
                .with_last_modified(from_unix_seconds(header.mtime()))
        };

        let mut stream_entry = StreamEntry::new(metadata, &mut entry);
        if !visitor(&mut stream_entry)? {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::walk::collect_entries;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_ar_flattens_directories() {
        let temp_dir = TempDir::new().unwrap();
        let lib = temp_dir.path().join("lib");
        fs::create_dir_all(lib.join("deep")).unwrap();
        fs::write(lib.join("deep/object_with_a_long_name.o"), b"\x7fELF").unwrap();

        let bytes = write_ar(Vec::new(), &collect_entries(&[lib]).unwrap()).unwrap();
        assert!(bytes.starts_with(GLOBAL_HEADER));

        let mut members = Vec::new();
        read_ar(&mut Cursor::new(bytes), &mut |entry: &mut StreamEntry<'_>| -> Result<bool> {
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            members.push((entry.name().to_string(), content));
            Ok(true)
        })
        .unwrap();

        assert_eq!(
            members,
            vec![("object_with_a_long_name.o".to_string(), b"\x7fELF".to_vec())]
        );
    }

    #[test]
    fn test_ar_rejects_duplicate_names() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("a")).unwrap();
        fs::create_dir_all(temp_dir.path().join("b")).unwrap();
        fs::write(temp_dir.path().join("a/same.o"), b"1").unwrap();
        fs::write(temp_dir.path().join("b/same.o"), b"2").unwrap();

        let entries =
            collect_entries(&[temp_dir.path().join("a"), temp_dir.path().join("b")]).unwrap();
        assert!(matches!(
            write_ar(Vec::new(), &entries),
            Err(ArchiveError::InvalidArchive { .. })
        ));
    }

    #[test]
    fn test_ar_without_files_is_readable() {
        let bytes = write_ar(Vec::new(), &[]).unwrap();
        let mut visited = 0;
        read_ar(&mut Cursor::new(bytes), &mut |_entry: &mut StreamEntry<'_>| -> Result<bool> {
            visited += 1;
            Ok(true)
        })
        .unwrap();
        assert_eq!(visited, 0);
    }
}
