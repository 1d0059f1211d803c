//! Packaging engine for deployable application archives.
//!
//! `apppack-core` walks one or more include roots, drops everything matched
//! by the exclusion rules (dotfiles, sources, temporary files by default),
//! and streams the surviving files and symlinks into a single tar.gz or zip
//! archive keyed by their root-relative virtual path.
//!
//! # Examples
//!
//! ```no_run
//! use apppack_core::PackConfig;
//! use apppack_core::pack_directories;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PackConfig::new("/srv/out/myapp.tar.gz");
//! let report = pack_directories(&config, &["/tmp/build", "/home/me/myapp"])?;
//! println!("Packed {} entries", report.entries_added());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod build;
pub mod creation;
pub mod error;
pub mod project;

pub use creation::ArchiveFormat;
pub use creation::NoopProgress;
pub use creation::PackConfig;
pub use creation::PackReport;
pub use creation::Packer;
pub use creation::ProgressCallback;
pub use creation::pack_directories;
pub use error::PackError;
pub use error::Result;
