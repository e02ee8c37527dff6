//! File primitives for the patch run: backup copy and atomic overwrite.
//!
//! The overwrite writes a temp file in the target's directory, fsyncs it,
//! copies the original permissions and ownership onto it, and renames it over
//! the resolved target.
//! A crash leaves either the old complete file or the new complete file.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix appended to the target's file name for its backup copy.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Returns `<path>.bak`.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Copies `path` byte for byte to `<path>.bak`, replacing any older backup.
///
/// # Errors
///
/// Returns the underlying I/O error if the copy fails.
pub fn backup(path: &Path) -> std::io::Result<PathBuf> {
    let dest = backup_path(path);
    fs::copy(path, &dest)?;
    Ok(dest)
}

/// Replaces the contents of `path` with `data` in one step.
///
/// A symlinked `path` is resolved first so the link stays in place and its
/// target receives the new content. The replacement keeps the original
/// file's permission bits and, on unix, its owner and group.
///
/// # Errors
///
/// Returns the underlying I/O error of whichever step fails; the target is
/// left untouched in that case.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let target = if fs::symlink_metadata(path).is_ok() {
        fs::canonicalize(path)?
    } else {
        path.to_path_buf()
    };
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let original = fs::metadata(&target).ok();

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;

    if let Some(original) = &original {
        tmp.as_file().set_permissions(original.permissions())?;
        #[cfg(unix)]
        copy_ownership(tmp.as_file(), original)?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn copy_ownership(file: &fs::File, original: &fs::Metadata) -> std::io::Result<()> {
    use std::os::unix::fs::MetadataExt;

    let current = file.metadata()?;
    if current.uid() == original.uid() && current.gid() == original.gid() {
        return Ok(());
    }
    std::os::unix::fs::fchown(file, Some(original.uid()), Some(original.gid()))
}
