//! Gzip-compressed TAR back end.

use crate::Result;
use crate::creation::sink::ArchiveSink;
use crate::creation::sink::permission_bits;
use flate2::write::GzEncoder;
use std::fs;
use std::fs::File;
use std::fs::Metadata;
use std::io::Write;
use std::path::Path;
use tar::Builder;
use tar::EntryType;
use tar::Header;
use tracing::debug;

/// Writes entries into a tar stream wrapped in a gzip encoder.
///
/// Symlinks are stored as tar symlink headers with no data block; regular
/// files are stored with mode, size and mtime taken from their metadata.
///
/// # Examples
///
/// ```
/// use apppack_core::creation::ArchiveSink;
/// use apppack_core::creation::tar::TarGzSink;
///
/// let sink = TarGzSink::new(Vec::new(), None);
/// let bytes = sink.into_writer()?;
/// assert_eq!(&bytes[0..2], &[0x1f, 0x8b]);
/// # Ok::<(), apppack_core::PackError>(())
/// ```
pub struct TarGzSink<W: Write> {
    builder: Builder<GzEncoder<W>>,
}

impl<W: Write> TarGzSink<W> {
    /// Creates a sink writing a `.tar.gz` stream into `writer`.
    #[must_use]
    pub fn new(writer: W, compression_level: Option<u8>) -> Self {
        let encoder = GzEncoder::new(writer, compression_level_to_flate2(compression_level));
        let mut builder = Builder::new(encoder);
        builder.follow_symlinks(false);
        Self { builder }
    }

    /// Finishes the tar stream, then the gzip stream, and returns the
    /// underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the trailer or gzip footer cannot be written.
    pub fn into_writer(self) -> Result<W> {
        let encoder = self.builder.into_inner()?;
        let mut writer = encoder.finish()?;
        writer.flush()?;
        Ok(writer)
    }

    fn append_symlink(
        &mut self,
        virtual_path: &str,
        real_path: &Path,
        metadata: &Metadata,
    ) -> Result<()> {
        let target = fs::read_link(real_path)?;

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        set_header_metadata(&mut header, metadata);

        self.builder.append_link(&mut header, virtual_path, &target)?;
        Ok(())
    }

    fn append_file(&mut self, virtual_path: &str, real_path: &Path, metadata: &Metadata) -> Result<()> {
        let mut file = File::open(real_path)?;
        let size = file.metadata()?.len();

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(size);
        set_header_metadata(&mut header, metadata);

        self.builder.append_data(&mut header, virtual_path, &mut file)?;
        Ok(())
    }
}

impl<W: Write> ArchiveSink for TarGzSink<W> {
    fn compress(
        &mut self,
        virtual_path: &str,
        real_path: &Path,
        metadata: &Metadata,
    ) -> Result<bool> {
        let file_type = metadata.file_type();

        if file_type.is_symlink() {
            self.append_symlink(virtual_path, real_path, metadata)?;
        } else if file_type.is_file() {
            self.append_file(virtual_path, real_path, metadata)?;
        } else {
            debug!(path = virtual_path, "unsupported file type, not stored");
            return Ok(false);
        }

        Ok(true)
    }

    fn finish(self) -> Result<()> {
        self.into_writer().map(drop)
    }
}

/// Copies mode, owner and mtime from filesystem metadata into a header.
#[cfg(unix)]
fn set_header_metadata(header: &mut Header, metadata: &Metadata) {
    use std::os::unix::fs::MetadataExt;
    header.set_mode(permission_bits(metadata));
    header.set_uid(u64::from(metadata.uid()));
    header.set_gid(u64::from(metadata.gid()));
    // mtime can be negative for dates before epoch, clamp to 0
    #[allow(clippy::cast_sign_loss)]
    let mtime = metadata.mtime().max(0) as u64;
    header.set_mtime(mtime);
}

#[cfg(not(unix))]
fn set_header_metadata(header: &mut Header, metadata: &Metadata) {
    header.set_mode(permission_bits(metadata));
    if let Ok(modified) = metadata.modified()
        && let Ok(duration) = modified.duration_since(std::time::UNIX_EPOCH)
    {
        header.set_mtime(duration.as_secs());
    }
}

/// Converts compression level (1-9) to flate2 compression level.
fn compression_level_to_flate2(level: Option<u8>) -> flate2::Compression {
    match level {
        None => flate2::Compression::default(),
        Some(n) => flate2::Compression::new(u32::from(n.clamp(1, 9))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    /// Reads back `(path, entry type, link target, content)` for every entry.
    fn read_entries(bytes: &[u8]) -> Vec<(String, EntryType, Option<String>, Vec<u8>)> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().to_string_lossy().into_owned();
                let kind = entry.header().entry_type();
                let link = entry
                    .link_name()
                    .unwrap()
                    .map(|l| l.to_string_lossy().into_owned());
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                (path, kind, link, data)
            })
            .collect()
    }

    #[test]
    fn test_compress_regular_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("app.conf");
        fs::write(&file, "appname = blog\n").unwrap();
        let metadata = fs::symlink_metadata(&file).unwrap();

        let mut sink = TarGzSink::new(Vec::new(), None);
        assert!(sink.compress("conf/app.conf", &file, &metadata).unwrap());
        let bytes = sink.into_writer().unwrap();

        let entries = read_entries(&bytes);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "conf/app.conf");
        assert_eq!(entries[0].1, EntryType::Regular);
        assert_eq!(entries[0].3, b"appname = blog\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_compress_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("run.sh");
        fs::write(&file, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o755)).unwrap();
        let metadata = fs::symlink_metadata(&file).unwrap();

        let mut sink = TarGzSink::new(Vec::new(), Some(9));
        sink.compress("run.sh", &file, &metadata).unwrap();
        let bytes = sink.into_writer().unwrap();

        let mut archive = tar::Archive::new(GzDecoder::new(&bytes[..]));
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.header().mode().unwrap(), 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_compress_symlink_stores_target() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("target.txt"), "payload").unwrap();
        let link = temp.path().join("link.txt");
        std::os::unix::fs::symlink("target.txt", &link).unwrap();
        let metadata = fs::symlink_metadata(&link).unwrap();

        let mut sink = TarGzSink::new(Vec::new(), None);
        assert!(sink.compress("link.txt", &link, &metadata).unwrap());
        let bytes = sink.into_writer().unwrap();

        let entries = read_entries(&bytes);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, EntryType::Symlink);
        assert_eq!(entries[0].2.as_deref(), Some("target.txt"));
        assert!(entries[0].3.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_compress_skips_fifo() {
        let temp = TempDir::new().unwrap();
        let fifo = temp.path().join("pipe");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .unwrap();
        if !status.success() {
            return;
        }
        let metadata = fs::symlink_metadata(&fifo).unwrap();

        let mut sink = TarGzSink::new(Vec::new(), None);
        assert!(!sink.compress("pipe", &fifo, &metadata).unwrap());
        let bytes = sink.into_writer().unwrap();
        assert!(read_entries(&bytes).is_empty());
    }

    #[test]
    fn test_compress_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("gone.txt");
        fs::write(&file, "x").unwrap();
        let metadata = fs::symlink_metadata(&file).unwrap();
        fs::remove_file(&file).unwrap();

        let mut sink = TarGzSink::new(Vec::new(), None);
        assert!(sink.compress("gone.txt", &file, &metadata).is_err());
    }

    #[test]
    fn test_long_virtual_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("deep.txt");
        fs::write(&file, "deep").unwrap();
        let metadata = fs::symlink_metadata(&file).unwrap();
        let name = format!("{}/deep.txt", "nested".repeat(30));

        let mut sink = TarGzSink::new(Vec::new(), None);
        sink.compress(&name, &file, &metadata).unwrap();
        let bytes = sink.into_writer().unwrap();

        assert_eq!(read_entries(&bytes)[0].0, name);
    }

    #[test]
    fn test_compression_level_mapping() {
        assert_eq!(compression_level_to_flate2(None), flate2::Compression::default());
        assert_eq!(compression_level_to_flate2(Some(1)), flate2::Compression::new(1));
        assert_eq!(compression_level_to_flate2(Some(9)), flate2::Compression::best());
    }
}
