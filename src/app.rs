use std::path::PathBuf;
use std::time::Duration;

use futures::StreamExt;
use iced::Task;
use simple_downloader::{
    ChannelObserver, DownloadEvent, DownloadOptions, DownloadOutcome, Downloader, HttpClient,
    SessionHandle, TotalLength,
};
use tracing::{info, warn};

use crate::ui::{DownloadMessage, DownloadView};

const PROGRESS_DELAY: Duration = Duration::from_secs(1);

pub struct DownloadApp {
    view: DownloadView,
    client: HttpClient,
    // Handle of the running session, if any
    session: Option<SessionHandle>,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadApp {
    pub fn new() -> Self {
        Self {
            view: DownloadView::default(),
            client: HttpClient::default(),
            session: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    DirectorySelected(Option<PathBuf>),
    Session(DownloadEvent),
    /// Final result once the session reached a terminal state
    DownloadFinished(Result<DownloadOutcome, String>),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::DownloadPressed => return start_download(app),
                DownloadMessage::CancelPressed => {
                    if let Some(session) = &app.session {
                        session.cancel();
                        app.view.status_message = "Cancelling...".to_string();
                    }
                }
                DownloadMessage::BrowsePressed => {
                    return Task::perform(
                        async {
                            rfd::AsyncFileDialog::new()
                                .pick_folder()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::DirectorySelected,
                    );
                }
                _ => {}
            }
        }
        Message::DirectorySelected(dir) => {
            if let Some(dir) = dir {
                app.view.dir = dir.display().to_string();
            }
        }
        Message::Session(event) => match event {
            DownloadEvent::Started => {
                app.view.status_message = "Download started".to_string();
            }
            DownloadEvent::Progress(progress, file) => {
                app.view.download_progress = progress.ratio();
                let elapsed = app
                    .session
                    .as_ref()
                    .map(|session| session.status().elapsed)
                    .unwrap_or_default();
                let total = match progress.total {
                    TotalLength::Known(n) => format!("{} bytes", n),
                    TotalLength::Unknown => "unknown size".to_string(),
                };
                app.view.status_message = format!(
                    "{}: {} of {}, {} B/s, {}",
                    file.file_name, progress.current, total, progress.speed, elapsed
                );
            }
            // Terminal events are reported through DownloadFinished
            DownloadEvent::Completed(_) | DownloadEvent::Cancelled | DownloadEvent::Failed(_) => {}
        },
        Message::DownloadFinished(result) => {
            app.view.is_downloading = false;
            app.view.download_progress = None;
            app.session = None;
            app.view.status_message = match result {
                Ok(DownloadOutcome::Completed(file)) => format!("Saved: {}", file.path.display()),
                Ok(DownloadOutcome::Cancelled) => "Download cancelled".to_string(),
                Err(e) => format!("Download failed: {}", e),
            };
        }
    }
    Task::none()
}

fn start_download(app: &mut DownloadApp) -> Task<Message> {
    let url = app.view.url.trim().to_string();
    if url.is_empty() || app.view.is_downloading {
        return Task::none();
    }

    let downloader = Downloader::new(app.client.clone());
    let (observer, events) = ChannelObserver::new();

    let mut options = DownloadOptions::new()
        .overwrite(app.view.overwrite)
        .delay(PROGRESS_DELAY)
        .observer(observer);
    let dir = app.view.dir.trim();
    if !dir.is_empty() {
        options = options.dir(dir);
    }

    info!(session = downloader.id(), %url, "download requested");
    app.session = Some(downloader.handle());
    app.view.is_downloading = true;
    app.view.download_progress = None;
    app.view.status_message = format!("Connecting to {}", url);

    Task::batch([
        Task::stream(events.map(Message::Session)),
        Task::perform(
            async move {
                downloader.start(&url, options).await.map_err(|e| {
                    warn!(error = %e, "download did not complete");
                    e.to_string()
                })
            },
            Message::DownloadFinished,
        ),
    ])
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}
