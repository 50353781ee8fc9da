mod destination;
pub mod download_coordinator;
pub mod observer;
pub mod session;

pub use download_coordinator::{DownloadOptions, Downloader, DEFAULT_PROGRESS_DELAY};
pub use observer::{Callbacks, ChannelObserver, DownloadEvent, DownloadObserver, NoopObserver};
pub use session::{SessionHandle, SPEED_SAMPLE_INTERVAL};
