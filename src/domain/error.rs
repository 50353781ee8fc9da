use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum DownloadError {
    /// The request could not be made or the server refused it. Nothing has
    /// been written when this is returned.
    #[error("connection failed or invalid URL provided: {0}")]
    Connection(#[source] ApiError),

    #[error("transfer interrupted: {0}")]
    Transfer(#[source] ApiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
