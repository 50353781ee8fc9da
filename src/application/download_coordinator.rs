use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::destination::{discard, open_destination};
use super::observer::{DownloadObserver, NoopObserver};
use super::session::{SessionHandle, SessionState, Timers};
use crate::api::{HttpClient, RemoteBody};
use crate::domain::{DownloadError, DownloadOutcome, DownloadPhase, DownloadStatus};

pub const DEFAULT_PROGRESS_DELAY: Duration = Duration::from_millis(5000);
const MIN_PROGRESS_DELAY: Duration = Duration::from_millis(1);

/// Per-download settings.
#[derive(Clone)]
pub struct DownloadOptions {
    /// Destination directory. The working directory when unset.
    pub dir: Option<PathBuf>,
    /// Replace whatever already sits at the derived path.
    pub overwrite: bool,
    /// Interval between `on_progress` calls.
    pub delay: Duration,
    pub observer: Arc<dyn DownloadObserver>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            dir: None,
            overwrite: false,
            delay: DEFAULT_PROGRESS_DELAY,
            observer: Arc::new(NoopObserver),
        }
    }
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("dir", &self.dir)
            .field("overwrite", &self.overwrite)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn observer(mut self, observer: impl DownloadObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn shared_observer(mut self, observer: Arc<dyn DownloadObserver>) -> Self {
        self.observer = observer;
        self
    }
}

/// One download session. Consumed by [`Downloader::start`]; use
/// [`Downloader::handle`] beforehand to cancel or inspect it while it runs.
pub struct Downloader {
    client: HttpClient,
    state: Arc<SessionState>,
}

impl Downloader {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            state: Arc::new(SessionState::new()),
        }
    }

    pub fn id(&self) -> &str {
        self.state.id()
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.state.clone())
    }

    pub fn cancel(&self) {
        self.handle().cancel();
    }

    pub fn status(&self) -> DownloadStatus {
        self.handle().status()
    }

    /// Downloads `url` into a single file.
    ///
    /// Returns [`DownloadError::Connection`] without touching the
    /// filesystem when the request fails or the status is not a success.
    /// Once the file is open, the session ends in exactly one of
    /// `on_complete`, `on_cancel` or `on_failed`; the file is removed on the
    /// last two.
    #[instrument(skip(self, options), fields(session = %self.state.id()))]
    pub async fn start(
        self,
        url: &str,
        options: DownloadOptions,
    ) -> Result<DownloadOutcome, DownloadError> {
        let state = self.state;

        let RemoteBody { total, stream } = match self.client.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "connection failed");
                state.set_phase(DownloadPhase::Failed);
                return Err(DownloadError::Connection(e));
            }
        };
        state.set_total(total);

        let dir = match options.dir {
            Some(dir) => dir,
            None => std::env::current_dir()
                .inspect_err(|_| state.set_phase(DownloadPhase::Failed))?,
        };
        let (file, info) = open_destination(url, &dir, options.overwrite, state.id())
            .await
            .inspect_err(|_| state.set_phase(DownloadPhase::Failed))?;

        info!(path = %info.path.display(), %total, "transfer started");
        state.set_phase(DownloadPhase::Transferring);

        let observer = options.observer;
        observer.on_start();
        let timers = Timers::start(
            state.clone(),
            observer.clone(),
            info.clone(),
            options.delay.max(MIN_PROGRESS_DELAY),
        );

        let result = write_body(&state, stream, file).await;
        timers.stop().await;

        match result {
            Ok(Transfer::Finished) => {
                state.set_phase(DownloadPhase::Completed);
                info!(bytes = state.bytes_downloaded(), "download complete");
                observer.on_complete(&info);
                Ok(DownloadOutcome::Completed(info))
            }
            Ok(Transfer::Cancelled) => {
                discard(&info.path).await;
                state.set_phase(DownloadPhase::Cancelled);
                info!(bytes = state.bytes_downloaded(), "download cancelled");
                observer.on_cancel();
                Ok(DownloadOutcome::Cancelled)
            }
            Err(e) => {
                discard(&info.path).await;
                state.set_phase(DownloadPhase::Failed);
                warn!(bytes = state.bytes_downloaded(), error = %e, "download failed");
                observer.on_failed(&e.to_string());
                Err(e)
            }
        }
    }
}

enum Transfer {
    Finished,
    Cancelled,
}

/// Drives the body into `file`. The file is closed when this returns,
/// whatever the outcome.
async fn write_body(
    state: &SessionState,
    mut stream: BoxStream<'static, crate::api::Result<bytes::Bytes>>,
    file: File,
) -> Result<Transfer, DownloadError> {
    let mut writer = BufWriter::new(file);
    let outcome = pump(state, &mut stream, &mut writer).await;

    // A write may still be in flight on the blocking pool until flushed.
    let flushed = writer.flush().await;

    match outcome {
        Ok(Transfer::Finished) => {
            flushed?;
            writer.into_inner().sync_all().await?;
            Ok(Transfer::Finished)
        }
        other => other,
    }
}

async fn pump(
    state: &SessionState,
    stream: &mut BoxStream<'static, crate::api::Result<bytes::Bytes>>,
    writer: &mut BufWriter<File>,
) -> Result<Transfer, DownloadError> {
    loop {
        if state.is_cancel_requested() {
            return Ok(Transfer::Cancelled);
        }

        let next = tokio::select! {
            biased;
            _ = state.token().cancelled() => continue,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                writer.write_all(&chunk).await?;
                state.add_bytes(chunk.len() as u64);
            }
            Some(Err(e)) => return Err(DownloadError::Transfer(e)),
            None => {
                debug!(bytes = state.bytes_downloaded(), "end of body");
                return Ok(Transfer::Finished);
            }
        }
    }
}
