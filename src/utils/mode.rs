use std::path::Path;

/// Permission bits that are carried over from archive entries.
pub const MODE_MASK: u32 = 0o7777;

/// Applies the unix permission bits recorded for an entry to an extracted file.
///
/// Failures are logged and swallowed, extraction continues.
pub fn apply_mode(path: &Path, mode: Option<u32>) {
    let Some(mode) = mode else {
        return;
    };
    let mode = mode & MODE_MASK;
    if mode == 0 {
        return;
    }

    if let Err(e) = set_permissions(path, mode) {
        tracing::warn!("Could not apply mode {:o} to {}: {}", mode, path.display(), e);
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// Permission bits of a file on disk, if the platform has them.
#[cfg(unix)]
pub fn mode_of(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & MODE_MASK)
}

#[cfg(not(unix))]
pub fn mode_of(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_apply_mode() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("run.sh");
        std::fs::write(&file, b"#!/bin/sh\n").unwrap();

        apply_mode(&file, Some(0o100755));

        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & MODE_MASK, 0o755);
    }

    #[test]
    fn test_apply_mode_without_mode_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("data.bin");
        std::fs::write(&file, b"x").unwrap();
        let before = std::fs::metadata(&file).unwrap().permissions().mode();

        apply_mode(&file, None);

        assert_eq!(std::fs::metadata(&file).unwrap().permissions().mode(), before);
    }
}
