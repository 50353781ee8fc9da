//! Shared state of one download session and the handles around it.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::observer::DownloadObserver;
use crate::domain::{DownloadPhase, DownloadStatus, FileInfo, Progress, TotalLength};
use crate::utils::format_elapsed;

/// Period of the speed sampler.
pub const SPEED_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

pub(crate) struct SessionState {
    id: String,
    start_time: DateTime<Utc>,
    token: CancellationToken,
    bytes_downloaded: AtomicU64,
    total: OnceLock<TotalLength>,
    current_speed: AtomicU64,
    phase: AtomicU8,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_time: Utc::now(),
            token: CancellationToken::new(),
            bytes_downloaded: AtomicU64::new(0),
            total: OnceLock::new(),
            current_speed: AtomicU64::new(0),
            phase: AtomicU8::new(DownloadPhase::Pending.as_u8()),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_total(&self, total: TotalLength) {
        let _ = self.total.set(total);
    }

    pub(crate) fn total(&self) -> TotalLength {
        self.total.get().copied().unwrap_or(TotalLength::Unknown)
    }

    pub(crate) fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded.load(Ordering::Acquire)
    }

    pub(crate) fn add_bytes(&self, len: u64) -> u64 {
        self.bytes_downloaded.fetch_add(len, Ordering::AcqRel) + len
    }

    pub(crate) fn phase(&self) -> DownloadPhase {
        DownloadPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn set_phase(&self, phase: DownloadPhase) {
        self.phase.store(phase.as_u8(), Ordering::Release);
    }

    pub(crate) fn is_cancel_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!(session = %self.id, "cancellation requested");
        }
        self.token.cancel();
    }

    pub(crate) fn progress(&self) -> Progress {
        Progress {
            current: self.bytes_downloaded(),
            total: self.total(),
            speed: self.current_speed.load(Ordering::Acquire),
        }
    }

    fn status(&self) -> DownloadStatus {
        let phase = self.phase();
        let elapsed = (Utc::now() - self.start_time).to_std().unwrap_or_default();

        DownloadStatus {
            id: self.id.clone(),
            start_time: self.start_time,
            current: self.bytes_downloaded(),
            total: self.total(),
            elapsed: format_elapsed(elapsed),
            downloading: !self.is_cancel_requested() && !phase.is_terminal(),
            speed: self.current_speed.load(Ordering::Acquire),
            phase,
        }
    }
}

/// Cloneable handle for cancelling or inspecting a session from elsewhere.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<SessionState>,
}

impl SessionHandle {
    pub(crate) fn new(state: Arc<SessionState>) -> Self {
        Self { state }
    }

    pub fn id(&self) -> &str {
        self.state.id()
    }

    /// Requests cooperative cancellation. The transfer loop notices it at
    /// its next chunk boundary. Further calls, or calls after the session
    /// ended, have no effect.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    pub fn status(&self) -> DownloadStatus {
        self.state.status()
    }
}

/// Owns the progress and speed timer tasks. Dropping it stops both.
pub(crate) struct Timers {
    tasks: Vec<JoinHandle<()>>,
}

impl Timers {
    pub(crate) fn start(
        state: Arc<SessionState>,
        observer: Arc<dyn DownloadObserver>,
        file: FileInfo,
        delay: Duration,
    ) -> Self {
        let progress = {
            let state = state.clone();
            tokio::spawn(async move {
                // A delay past the end of the clock never fires.
                let Some(first) = Instant::now().checked_add(delay) else {
                    return std::future::pending::<()>().await;
                };
                let mut ticker = time::interval_at(first, delay);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    observer.on_progress(&state.progress(), &file);
                }
            })
        };

        let speed = tokio::spawn(async move {
            let mut ticker = time::interval_at(
                Instant::now() + SPEED_SAMPLE_INTERVAL,
                SPEED_SAMPLE_INTERVAL,
            );
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut previous_sample_bytes = 0;
            loop {
                ticker.tick().await;
                let current = state.bytes_downloaded();
                let speed = (current - previous_sample_bytes) / SPEED_SAMPLE_INTERVAL.as_secs();
                state.current_speed.store(speed, Ordering::Release);
                previous_sample_bytes = current;
            }
        });

        Self {
            tasks: vec![progress, speed],
        }
    }
}

impl Timers {
    /// Stops both timers and waits until neither can fire again.
    pub(crate) async fn stop(mut self) {
        for task in std::mem::take(&mut self.tasks) {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let handle = SessionHandle::new(Arc::new(SessionState::new()));

        assert!(handle.status().downloading);
        handle.cancel();
        handle.cancel();

        let status = handle.status();
        assert!(!status.downloading);
        assert_eq!(status.phase, DownloadPhase::Pending);
    }

    #[tokio::test]
    async fn test_cancel_before_wait_is_not_lost() {
        let state = Arc::new(SessionState::new());
        SessionHandle::new(state.clone()).cancel();

        time::timeout(Duration::from_secs(1), state.token().cancelled())
            .await
            .expect("cancellation permit was lost");
    }

    #[test]
    fn test_status_before_transfer() {
        let state = SessionState::new();
        let status = state.status();

        assert_eq!(status.id, state.id());
        assert_eq!(status.current, 0);
        assert_eq!(status.total, TotalLength::Unknown);
        assert_eq!(status.elapsed, "less than a minute");
        assert_eq!(status.speed, 0);
    }

    #[test]
    fn test_total_is_fixed_once_set() {
        let state = SessionState::new();
        state.set_total(TotalLength::Known(10));
        state.set_total(TotalLength::Known(99));
        assert_eq!(state.total(), TotalLength::Known(10));
    }

    #[tokio::test]
    async fn test_unreachable_progress_delay_keeps_timer_alive() {
        let state = Arc::new(SessionState::new());
        let timers = Timers::start(
            state,
            Arc::new(crate::application::observer::NoopObserver),
            FileInfo {
                file_name: "x".to_string(),
                path: "x".into(),
            },
            Duration::MAX,
        );

        time::sleep(Duration::from_millis(20)).await;
        assert!(timers.tasks.iter().all(|task| !task.is_finished()));
        timers.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_sampler_uses_five_second_window() {
        let state = Arc::new(SessionState::new());
        let _timers = Timers::start(
            state.clone(),
            Arc::new(crate::application::observer::NoopObserver),
            FileInfo {
                file_name: "x".to_string(),
                path: "x".into(),
            },
            Duration::from_secs(60),
        );

        state.add_bytes(50_000);
        time::sleep(SPEED_SAMPLE_INTERVAL + Duration::from_millis(10)).await;
        assert_eq!(state.progress().speed, 10_000);

        state.add_bytes(5_000);
        time::sleep(SPEED_SAMPLE_INTERVAL).await;
        assert_eq!(state.progress().speed, 1_000);
    }
}
