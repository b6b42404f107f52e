use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP-style status codes used as severity markers on [`StatusInfo`].
///
/// These are discriminants for operation state, not transport metadata:
/// the server reports its own codes in structured bodies and we relay
/// whatever it sends, so this is deliberately a plain `u16` namespace
/// rather than a closed enum.
pub mod code {
    /// Request fully transferred, waiting for the server to produce results.
    pub const PROCESSING: u16 = 102;
    /// Operation finished successfully.
    pub const OK: u16 = 200;
    /// Operation started or making progress.
    pub const ACCEPTED: u16 = 202;
    /// Operation cancelled locally by the user.
    pub const NO_CONTENT: u16 = 204;
    /// Operation failed.
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// Uniform progress/result record emitted once per transport lifecycle event.
///
/// Instances are immutable once constructed; a new one is produced per event
/// rather than mutating a shared value. The wire format matches the server's
/// `UserResponse` body: `status` as an integer, `messages` as a string array,
/// `timeStamp` as epoch milliseconds and an optional `progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    /// Percent complete, 0-100. Absent when progress is not meaningfully
    /// measurable (e.g. a plain error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    pub status: u16,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time_stamp: DateTime<Utc>,
}

impl StatusInfo {
    /// The value the status hub holds before any operation has run.
    pub fn baseline() -> Self {
        Self {
            progress: Some(0),
            status: code::OK,
            messages: Vec::new(),
            time_stamp: Utc::now(),
        }
    }

    /// Terminal success for operations whose result detail the caller
    /// gets from the data channel, not the status channel.
    pub fn success() -> Self {
        Self {
            progress: Some(100),
            status: code::OK,
            messages: vec!["Success".to_string()],
            time_stamp: Utc::now(),
        }
    }

    /// A failure with no measurable progress.
    pub fn internal_server_error(message: &str) -> Self {
        Self {
            progress: None,
            status: code::INTERNAL_SERVER_ERROR,
            messages: vec![message.to_string()],
            time_stamp: Utc::now(),
        }
    }

    /// A response whose shape the client does not recognize. Treated as a
    /// contract bug rather than an ordinary failure.
    pub fn unexpected_event() -> Self {
        Self::internal_server_error("Unexpected event received from the server")
    }

    /// The user stopped observing an in-flight operation. The underlying
    /// request still runs to completion server-side.
    pub fn cancelled() -> Self {
        Self {
            progress: Some(0),
            status: code::NO_CONTENT,
            messages: vec!["Progress canceled.".to_string()],
            time_stamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }
}
