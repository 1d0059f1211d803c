//! ZIP archive back end.

use crate::Result;
use crate::creation::sink::ArchiveSink;
use crate::creation::sink::permission_bits;
use std::fs;
use std::fs::File;
use std::fs::Metadata;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use zip::CompressionMethod;
use zip::DateTime;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Writes entries into a ZIP container.
///
/// Every entry is deflated. Symlinks are stored with the link target text as
/// their content and the symlink bit set in the external attributes, which
/// is how `unzip` and Go's `archive/zip` represent them. Modification times
/// are pinned so identical trees produce identical archives.
pub struct ZipSink<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> ZipSink<W> {
    /// Creates a sink writing a ZIP archive into `writer`.
    #[must_use]
    pub fn new(writer: W, compression_level: Option<u8>) -> Self {
        let level = compression_level.unwrap_or(6);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level)))
            .last_modified_time(DateTime::default());

        Self {
            zip: ZipWriter::new(writer),
            options,
        }
    }

    /// Writes the central directory and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the central directory cannot be written.
    pub fn into_writer(self) -> Result<W> {
        let mut writer = self
            .zip
            .finish()
            .map_err(|e| std::io::Error::other(format!("failed to finish ZIP archive: {e}")))?;
        writer.flush()?;
        Ok(writer)
    }

    fn add_symlink(&mut self, virtual_path: &str, real_path: &Path, metadata: &Metadata) -> Result<()> {
        let target = fs::read_link(real_path)?;
        let target = target.to_str().ok_or_else(|| {
            std::io::Error::other(format!(
                "symlink target is not valid UTF-8: {}",
                real_path.display()
            ))
        })?;
        let options = self.options.unix_permissions(permission_bits(metadata));

        self.zip
            .add_symlink(virtual_path, target, options)
            .map_err(|e| std::io::Error::other(format!("failed to add symlink to ZIP: {e}")))?;
        Ok(())
    }

    fn add_file(&mut self, virtual_path: &str, real_path: &Path, metadata: &Metadata) -> Result<()> {
        let mut file = File::open(real_path)?;
        let options = self
            .options
            .unix_permissions(permission_bits(metadata))
            .large_file(needs_zip64(metadata.len()));

        self.zip
            .start_file(virtual_path, options)
            .map_err(|e| std::io::Error::other(format!("failed to start file in ZIP: {e}")))?;
        std::io::copy(&mut file, &mut self.zip)?;
        Ok(())
    }
}

impl<W: Write + Seek> ArchiveSink for ZipSink<W> {
    fn compress(
        &mut self,
        virtual_path: &str,
        real_path: &Path,
        metadata: &Metadata,
    ) -> Result<bool> {
        let file_type = metadata.file_type();

        if file_type.is_symlink() {
            self.add_symlink(virtual_path, real_path, metadata)?;
        } else if file_type.is_file() {
            self.add_file(virtual_path, real_path, metadata)?;
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

/// Entries this large overflow the 32-bit size fields and need ZIP64
/// extensions.
const fn needs_zip64(size: u64) -> bool {
    size >= 0xFFFF_FFFF
}
