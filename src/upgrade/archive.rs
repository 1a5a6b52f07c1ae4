//! Extraction of the executable from a release archive.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io;
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::debug;

use crate::core::HostshipError;
use crate::utils::binary_names;

/// Copy the executable entry of the gzip tarball at `archive` to `dest`.
///
/// The first regular file whose base name is `hostship` or `hostship.exe`
/// wins and scanning stops there. Entry permissions and timestamps are
/// ignored; the caller sets the mode of `dest`.
pub fn extract(archive: &Path, dest: &Path) -> Result<(), HostshipError> {
    let archive_display = archive.display().to_string();
    let read_error = |source: io::Error| HostshipError::ArchiveRead {
        archive: archive_display.clone(),
        source,
    };

    let file = File::open(archive).map_err(read_error)?;
    let mut tarball = Archive::new(GzDecoder::new(file));
    let wanted = binary_names();

    for entry in tarball.entries().map_err(read_error)? {
        let mut entry = entry.map_err(read_error)?;
        if entry.header().entry_type() != EntryType::Regular {
            continue;
        }

        let path = entry.path().map_err(read_error)?;
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !wanted.iter().any(|w| w == name) {
            debug!("Skipping archive entry {}", path.display());
            continue;
        }

        debug!("Extracting {} to {}", path.display(), dest.display());
        let mut out = File::create(dest)?;
        io::copy(&mut entry, &mut out).map_err(read_error)?;
        out.sync_all()?;
        return Ok(());
    }

    Err(HostshipError::BinaryNotFound {
        archive: archive_display,
    })
}
