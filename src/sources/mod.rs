//! Module sources.
//!
//! Sources fetch external modules and other assets into the filesystem
//! (library directory, remote files, literal assets).

pub mod download;
pub mod grab;
pub mod http;
pub mod library;

pub use download::{download, DownloadOutcome, Location};
pub use http::{HttpClient, OfflineClient, ReqwestClient};
pub use library::{Library, LibraryModule};
