//! Reporting surface of a download session.
//!
//! A session talks to its caller through a [`DownloadObserver`]. Closures can
//! be plugged in with [`Callbacks`]; callers that prefer to drain events as a
//! stream use [`ChannelObserver`].

use futures::channel::mpsc;

use crate::domain::{FileInfo, Progress};

/// Receives the lifecycle notifications of one session.
///
/// `on_start` fires once before any byte is read, `on_progress` fires on the
/// progress timer, and exactly one of `on_complete`, `on_cancel` or
/// `on_failed` ends the session. Calls come from the transfer task and the
/// timer task, so implementations must not block.
pub trait DownloadObserver: Send + Sync {
    fn on_start(&self) {}

    fn on_progress(&self, _progress: &Progress, _file: &FileInfo) {}

    fn on_complete(&self, _file: &FileInfo) {}

    fn on_cancel(&self) {}

    fn on_failed(&self, _error: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DownloadObserver for NoopObserver {}

type ProgressFn = Box<dyn Fn(&Progress, &FileInfo) + Send + Sync>;
type FileFn = Box<dyn Fn(&FileInfo) + Send + Sync>;
type UnitFn = Box<dyn Fn() + Send + Sync>;
type FailedFn = Box<dyn Fn(&str) + Send + Sync>;

/// Closure-backed observer. Unset callbacks are no-ops.
#[derive(Default)]
pub struct Callbacks {
    on_start: Option<UnitFn>,
    on_progress: Option<ProgressFn>,
    on_complete: Option<FileFn>,
    on_cancel: Option<UnitFn>,
    on_failed: Option<FailedFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_progress(mut self, f: impl Fn(&Progress, &FileInfo) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn(&FileInfo) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_cancel(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    pub fn on_failed(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_failed = Some(Box::new(f));
        self
    }
}

impl DownloadObserver for Callbacks {
    fn on_start(&self) {
        if let Some(f) = &self.on_start {
            f();
        }
    }

    fn on_progress(&self, progress: &Progress, file: &FileInfo) {
        if let Some(f) = &self.on_progress {
            f(progress, file);
        }
    }

    fn on_complete(&self, file: &FileInfo) {
        if let Some(f) = &self.on_complete {
            f(file);
        }
    }

    fn on_cancel(&self) {
        if let Some(f) = &self.on_cancel {
            f();
        }
    }

    fn on_failed(&self, error: &str) {
        if let Some(f) = &self.on_failed {
            f(error);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Started,
    Progress(Progress, FileInfo),
    Completed(FileInfo),
    Cancelled,
    Failed(String),
}

/// Forwards every notification as a [`DownloadEvent`] on an unbounded
/// channel. Events sent after the receiver is gone are dropped.
#[derive(Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<DownloadEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DownloadEvent>) {
        let (sender, receiver) = mpsc::unbounded();
        (Self { sender }, receiver)
    }

    fn send(&self, event: DownloadEvent) {
        let _ = self.sender.unbounded_send(event);
    }
}

impl DownloadObserver for ChannelObserver {
    fn on_start(&self) {
        self.send(DownloadEvent::Started);
    }

    fn on_progress(&self, progress: &Progress, file: &FileInfo) {
        self.send(DownloadEvent::Progress(*progress, file.clone()));
    }

    // The receiving end learns the session is over from the closed channel,
    // so terminal events also close it.
    fn on_complete(&self, file: &FileInfo) {
        self.send(DownloadEvent::Completed(file.clone()));
        self.sender.close_channel();
    }

    fn on_cancel(&self) {
        self.send(DownloadEvent::Cancelled);
        self.sender.close_channel();
    }

    fn on_failed(&self, error: &str) {
        self.send(DownloadEvent::Failed(error.to_string()));
        self.sender.close_channel();
    }
}
