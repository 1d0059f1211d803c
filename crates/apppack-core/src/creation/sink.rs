//! Archive writer abstraction shared by the tar.gz and zip back ends.

use crate::Result;
use std::fs::Metadata;
use std::path::Path;

/// Serializes accepted entries into an archive container.
///
/// The walker hands every accepted file or symlink to [`compress`] exactly
/// once, already named by its virtual path. Implementations never see
/// directories and never decide inclusion.
///
/// [`compress`]: ArchiveSink::compress
pub trait ArchiveSink {
    /// Writes one entry.
    ///
    /// `metadata` is the entry's own metadata: link metadata for a stored
    /// symlink, target metadata for a followed one. Returns `Ok(false)` if
    /// the entry kind cannot be represented (sockets, FIFOs, devices).
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the container
    /// cannot be written. The caller aborts the run.
    fn compress(&mut self, virtual_path: &str, real_path: &Path, metadata: &Metadata)
    -> Result<bool>;

    /// Flushes and closes the container, innermost writer first.
    ///
    /// # Errors
    ///
    /// Returns an error if trailing data cannot be written.
    fn finish(self) -> Result<()>
    where
        Self: Sized;
}

/// Permission bits of `metadata`, without file type bits.
#[cfg(unix)]
pub(crate) fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub(crate) fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.is_symlink() {
        0o777
    } else if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
