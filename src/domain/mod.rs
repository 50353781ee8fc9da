pub mod error;
pub mod model;

pub use error::DownloadError;
pub use model::{
    DownloadOutcome, DownloadPhase, DownloadStatus, FileInfo, Progress, TotalLength,
};
