use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use super::models::ClientConfig;
use crate::domain::TotalLength;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(StatusCode),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// An open response: the announced size and the body as a chunk stream.
pub struct RemoteBody {
    pub total: TotalLength,
    pub stream: BoxStream<'static, Result<bytes::Bytes>>,
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Sends the GET and hands back the body stream once the status is known
    /// to be a success. Nothing is read from the body here.
    pub async fn fetch(&self, url: &str) -> Result<RemoteBody> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let total = TotalLength::from_content_length(response.content_length());
        debug!(%url, %status, %total, "response received");

        let stream = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();

        Ok(RemoteBody { total, stream })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            client: Client::new(),
        }
    }
}
