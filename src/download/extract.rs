//! Xray binary extraction from a release ZIP archive

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use tempfile::NamedTempFile;
use zip::ZipArchive;
use zip::result::ZipError;

use super::error::ExtractionError;
use super::platform::PlatformDescriptor;

/// owner rwx, group rwx, others r-x
#[cfg(unix)]
const BINARY_MODE: u32 = 0o775;

/// Extract the platform's executable from `archive_path` and install it at `final_path`
///
/// Only the single top-level entry named by [`PlatformDescriptor::archive_entry`]
/// is considered. The binary is written next to `final_path`, made executable,
/// then renamed over it, so repeating the call simply replaces the file and a
/// concurrent reader never sees a partial binary.
pub fn install_binary(
    archive_path: &Path,
    platform: &PlatformDescriptor,
    final_path: &Path,
) -> Result<PathBuf, ExtractionError> {
    let corrupt = |reason: String| ExtractionError::CorruptArchive {
        archive: archive_path.to_path_buf(),
        reason,
    };
    let write_err = |e: io::Error| ExtractionError::Io {
        path: final_path.to_path_buf(),
        source: e,
    };

    let zip_file = File::open(archive_path).map_err(|e| ExtractionError::Io {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let mut archive = ZipArchive::new(zip_file).map_err(|e| corrupt(e.to_string()))?;

    let entry_name = platform.archive_entry();
    let mut entry = match archive.by_name(entry_name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(ExtractionError::MissingEntry {
                archive: archive_path.to_path_buf(),
                entry: entry_name.to_string(),
            });
        }
        Err(e) => return Err(corrupt(e.to_string())),
    };

    let install_dir = final_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(install_dir).map_err(write_err)?;

    let mut staged = NamedTempFile::new_in(install_dir).map_err(write_err)?;
    // A truncated or badly compressed entry surfaces here, not when opening the archive.
    io::copy(&mut entry, staged.as_file_mut()).map_err(|e| match e.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => corrupt(e.to_string()),
        _ => write_err(e),
    })?;
    staged.as_file().sync_all().map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(staged.path(), std::fs::Permissions::from_mode(BINARY_MODE))
            .map_err(write_err)?;
    }

    staged.persist(final_path).map_err(|e| write_err(e.error))?;
    info!("Installed xray for {} at {}", platform, final_path.display());
    Ok(final_path.to_path_buf())
}
