use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Size of the remote resource as announced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TotalLength {
    Known(u64),
    Unknown,
}

impl TotalLength {
    /// Builds the total from a `Content-Length` value. A missing or zero
    /// length carries no information and is reported as unknown.
    pub fn from_content_length(length: Option<u64>) -> Self {
        match length {
            Some(n) if n > 0 => Self::Known(n),
            _ => Self::Unknown,
        }
    }

    pub fn known(self) -> Option<u64> {
        match self {
            Self::Known(n) => Some(n),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for TotalLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(n) => write!(f, "{}", n),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Snapshot handed to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Bytes written to disk so far
    pub current: u64,
    pub total: TotalLength,
    /// Bytes per second over the last speed sample
    pub speed: u64,
}

impl Progress {
    /// Fraction of the transfer done, when the total is known.
    pub fn ratio(&self) -> Option<f32> {
        self.total
            .known()
            .map(|total| (self.current as f32 / total as f32).min(1.0))
    }
}

/// Where the body is being written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub file_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DownloadPhase {
    Pending,
    Transferring,
    Completed,
    Cancelled,
    Failed,
}

impl DownloadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Transferring => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
            Self::Failed => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Transferring,
            2 => Self::Completed,
            3 => Self::Cancelled,
            4 => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Point-in-time view of a session, see `SessionHandle::status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadStatus {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub current: u64,
    pub total: TotalLength,
    /// Time since the session was created, in words
    pub elapsed: String,
    pub downloading: bool,
    pub speed: u64,
    pub phase: DownloadPhase,
}

/// How a session that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed(FileInfo),
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_from_content_length() {
        assert_eq!(
            TotalLength::from_content_length(Some(1_000_000)),
            TotalLength::Known(1_000_000)
        );
        assert_eq!(TotalLength::from_content_length(None), TotalLength::Unknown);
        assert_eq!(TotalLength::from_content_length(Some(0)), TotalLength::Unknown);
    }

    #[test]
    fn test_total_display() {
        assert_eq!(TotalLength::Known(42).to_string(), "42");
        assert_eq!(TotalLength::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_total_serializes_as_tagged_variant() {
        assert_eq!(
            serde_json::to_value(TotalLength::Known(7)).unwrap(),
            serde_json::json!({ "Known": 7 })
        );
        assert_eq!(
            serde_json::to_value(TotalLength::Unknown).unwrap(),
            serde_json::json!("Unknown")
        );
    }

    #[test]
    fn test_progress_ratio() {
        let progress = Progress {
            current: 250,
            total: TotalLength::Known(1000),
            speed: 0,
        };
        assert_eq!(progress.ratio(), Some(0.25));

        let unknown = Progress {
            current: 250,
            total: TotalLength::Unknown,
            speed: 0,
        };
        assert_eq!(unknown.ratio(), None);
    }

    #[test]
    fn test_phase_roundtrip_through_u8() {
        for phase in [
            DownloadPhase::Pending,
            DownloadPhase::Transferring,
            DownloadPhase::Completed,
            DownloadPhase::Cancelled,
            DownloadPhase::Failed,
        ] {
            assert_eq!(DownloadPhase::from_u8(phase.as_u8()), phase);
        }
        assert!(!DownloadPhase::Transferring.is_terminal());
        assert!(DownloadPhase::Cancelled.is_terminal());
    }
}
