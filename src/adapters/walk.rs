use crate::utils::error::{ArchiveError, Result};
use crate::utils::io::files_contained_in;
use crate::utils::mode::mode_of;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// A file or directory on disk scheduled to become an archive entry.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub path: PathBuf,
    /// Name inside the archive, `/` separated, without trailing slash.
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub mode: Option<u32>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl SourceEntry {
    /// Last path component of the entry name.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Expands `sources` into archive entries.
///
/// Each source keeps its own name as top-level component; directories are
/// followed by their contents in sorted order.
pub fn collect_entries(sources: &[PathBuf]) -> Result<Vec<SourceEntry>> {
    for source in sources {
        if !source.exists() {
            return Err(ArchiveError::InvalidSource {
                path: source.clone(),
                reason: "does not exist".to_string(),
            });
        }
    }

    let mut entries = Vec::new();
    for source in sources {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ArchiveError::InvalidSource {
                path: source.clone(),
                reason: "has no file name".to_string(),
            })?;
        visit(source, name, &mut entries)?;
    }

    tracing::debug!("Collected {} entries from {} sources", entries.len(), sources.len());
    Ok(entries)
}

fn visit(path: &Path, name: String, entries: &mut Vec<SourceEntry>) -> Result<()> {
    let metadata = fs::metadata(path)?;
    let is_directory = metadata.is_dir();

    entries.push(SourceEntry {
        path: path.to_path_buf(),
        name: name.clone(),
        is_directory,
        size: if is_directory { 0 } else { metadata.len() },
        mode: mode_of(&metadata),
        last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
    });

    if is_directory {
        for child in files_contained_in(path)? {
            let child_name = match child.file_name() {
                Some(n) => format!("{}/{}", name, n.to_string_lossy()),
                None => continue,
            };
            visit(&child, child_name, entries)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_entries_keeps_directory_name() {
        let temp_dir = TempDir::new().unwrap();
        let docs = temp_dir.path().join("docs");
        fs::create_dir_all(docs.join("nested")).unwrap();
        fs::write(docs.join("b.txt"), b"bb").unwrap();
        fs::write(docs.join("nested/a.txt"), b"a").unwrap();
        let readme = temp_dir.path().join("README.md");
        fs::write(&readme, b"# readme").unwrap();

        let entries = collect_entries(&[docs, readme]).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(
            names,
            vec!["docs", "docs/b.txt", "docs/nested", "docs/nested/a.txt", "README.md"]
        );
        assert!(entries[0].is_directory);
        assert_eq!(entries[1].size, 2);
        assert_eq!(entries[3].base_name(), "a.txt");
    }

    #[test]
    fn test_collect_entries_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt");
        assert!(matches!(
            collect_entries(&[missing]),
            Err(ArchiveError::InvalidSource { .. })
        ));
    }
}
