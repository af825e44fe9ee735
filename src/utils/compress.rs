use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use walkdir::WalkDir;
use zip::{write::FileOptions, ZipWriter};

/// Archive every file under `source_dir` into a ZIP at `archive_path`.
///
/// Entry names are relative to `source_dir`; directories get their own
/// entries so empty ones survive. Entries are written in sorted order so the
/// same staging tree always yields the same member order. Returns the number
/// of file entries written.
pub fn zip_directory(source_dir: &Path, archive_path: &Path) -> Result<usize> {
    let file = File::create(archive_path)
        .context(format!("Failed to create archive {}", archive_path.display()))?;
    let mut zip = ZipWriter::new(file);

    let file_options = FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dir_options = FileOptions::default().unix_permissions(0o755);

    let mut files = 0usize;

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.context(format!("Failed to walk {}", source_dir.display()))?;
        let rel_path = entry
            .path()
            .strip_prefix(source_dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", rel_path), dir_options)
                .context(format!("Failed to add directory entry {}", rel_path))?;
            continue;
        }

        zip.start_file(rel_path.as_str(), file_options)
            .context(format!("Failed to start file entry for {}", rel_path))?;

        let mut reader = BufReader::new(
            File::open(entry.path())
                .context(format!("Failed to open {}", entry.path().display()))?,
        );
        let size = io::copy(&mut reader, &mut zip)
            .context(format!("Failed to write {} to archive", rel_path))?;

        debug!("Archived {} ({} bytes)", rel_path, size);
        files += 1;
    }

    zip.finish().context("Failed to finalize zip file")?;
    info!("Archived {} files from {} into {}", files, source_dir.display(), archive_path.display());
    Ok(files)
}

/// Add read and write for user, group and other (`chmod a+rw`).
#[cfg(unix)]
pub fn make_world_read_writable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .context(format!("Failed to stat {}", path.display()))?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o666);
    fs::set_permissions(path, permissions)
        .context(format!("Failed to change permissions of {}", path.display()))
}

#[cfg(not(unix))]
pub fn make_world_read_writable(path: &Path) -> Result<()> {
    let mut permissions = fs::metadata(path)
        .context(format!("Failed to stat {}", path.display()))?
        .permissions();
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
        .context(format!("Failed to change permissions of {}", path.display()))
}
