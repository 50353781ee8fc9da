//! Single-file HTTP downloads.
//!
//! A [`Downloader`] streams one URL into one file, reports progress and
//! speed on timers, honours cooperative cancellation and never overwrites
//! an existing file unless asked to.
//!
//! ```no_run
//! use simple_downloader::{Callbacks, DownloadOptions, Downloader, HttpClient};
//!
//! # async fn run() -> Result<(), simple_downloader::DownloadError> {
//! let downloader = Downloader::new(HttpClient::default());
//! let options = DownloadOptions::new()
//!     .dir("/tmp")
//!     .observer(Callbacks::new().on_progress(|progress, file| {
//!         println!("{}: {}/{}", file.file_name, progress.current, progress.total);
//!     }));
//!
//! downloader.start("https://example.com/file.zip", options).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod application;
pub mod domain;
pub mod utils;

pub use api::{ApiError, ClientConfig, HttpClient};
pub use application::{
    Callbacks, ChannelObserver, DownloadEvent, DownloadObserver, DownloadOptions, Downloader,
    NoopObserver, SessionHandle,
};
pub use domain::{
    DownloadError, DownloadOutcome, DownloadPhase, DownloadStatus, FileInfo, Progress,
    TotalLength,
};
