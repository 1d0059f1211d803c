//! Archive packaging.
//!
//! [`Packer`] drives a [`TreeWalker`] over each include root, consulting the
//! [`ExclusionRules`](filters::ExclusionRules) and handing every accepted
//! entry to an [`ArchiveSink`] for the selected [`ArchiveFormat`].

pub mod filters;
pub mod walker;

pub mod config;
pub mod packer;
pub mod progress;
pub mod report;
pub mod sink;
pub mod tar;
pub mod zip;

// Re-exports for public API
pub use config::ArchiveFormat;
pub use config::PackConfig;
pub use config::SymlinkPolicy;
pub use packer::Packer;
pub use packer::pack_directories;
pub use progress::NoopProgress;
pub use progress::ProgressCallback;
pub use report::PackReport;
pub use sink::ArchiveSink;
pub use walker::EntryKind;
pub use walker::TreeWalker;
