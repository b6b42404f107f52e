use crate::core::status::{StatusInfo, code};
use chrono::Utc;
use log::{error, info};

/// A raw transport lifecycle event for one REST call.
///
/// Events arrive in transport order: `Sent`, zero or more progress ticks,
/// then exactly one terminal `Completed` or `Failed`. `loaded` and `total`
/// on progress ticks are always totals-to-date, never deltas, so each tick
/// is classified on its own with no running state.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// The request has been handed to the transport; no bytes moved yet.
    Sent,
    /// Request body bytes transferred so far.
    UploadProgress { loaded: u64, total: u64 },
    /// Response body bytes received so far.
    DownloadProgress { loaded: u64, total: u64 },
    /// Terminal success with the parsed response body.
    Completed { body: serde_json::Value },
    /// Terminal failure. `reported` carries the server's structured error
    /// body when one was received; `None` means the request never got a
    /// response (connection refused, aborted, ...).
    Failed { reported: Option<StatusInfo> },
}

/// How a terminal `Completed` event turns into a [`StatusInfo`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminalReport {
    /// Synthesize the hardcoded success status; the caller gets the result
    /// payload from the data channel (list, get, create).
    Synthesized,
    /// Relay the response body verbatim as the StatusInfo; the server
    /// reports its own multi-step processing outcome (upload).
    ServerReported,
}

/// Maps one raw transport event to exactly one [`StatusInfo`], independent
/// of which operation produced it apart from the label used in progress
/// messages and the terminal-report mode.
#[derive(Debug, Clone)]
pub struct EventClassifier {
    label: String,
    terminal: TerminalReport,
}

impl EventClassifier {
    pub fn new(label: &str, terminal: TerminalReport) -> Self {
        Self {
            label: label.to_string(),
            terminal,
        }
    }

    /// Classify a single event. Every classification is logged: info for
    /// success and progress, error for failures. Callers must not depend on
    /// the log output, only on the returned value.
    pub fn classify(&self, event: &TransferEvent) -> StatusInfo {
        let status = match event {
            TransferEvent::Sent => StatusInfo {
                progress: Some(0),
                status: code::ACCEPTED,
                messages: vec![format!("{} started", self.label)],
                time_stamp: Utc::now(),
            },
            TransferEvent::UploadProgress { loaded, total }
            | TransferEvent::DownloadProgress { loaded, total } => {
                self.classify_progress(*loaded, *total)
            }
            TransferEvent::Completed { body } => match self.terminal {
                TerminalReport::Synthesized => StatusInfo::success(),
                TerminalReport::ServerReported => {
                    match serde_json::from_value::<StatusInfo>(body.clone()) {
                        Ok(reported) => reported,
                        Err(e) => {
                            error!(
                                "{}: terminal response body is not a status document: {e}",
                                self.label
                            );
                            StatusInfo::unexpected_event()
                        }
                    }
                }
            },
            TransferEvent::Failed { reported } => match reported {
                Some(reported) => reported.clone(),
                None => StatusInfo::internal_server_error("Internal Server Error"),
            },
        };

        if status.is_failure() {
            error!(
                "{}: status {} - {}",
                self.label,
                status.status,
                status.messages.join(", ")
            );
        } else {
            info!(
                "{}: status {} progress {:?}",
                self.label, status.status, status.progress
            );
        }
        status
    }

    /// Progress is computed fresh per tick with floor division, never
    /// accumulated. A fully transferred request switches to the 102-class
    /// "waiting for results" status.
    fn classify_progress(&self, loaded: u64, total: u64) -> StatusInfo {
        let progress = (100 * loaded / total.max(1)).min(100) as u8;
        if progress < 100 {
            StatusInfo {
                progress: Some(progress),
                status: code::ACCEPTED,
                messages: vec![format!(
                    "{} in progress: Progress: {progress}%...",
                    self.label
                )],
                time_stamp: Utc::now(),
            }
        } else {
            StatusInfo {
                progress: Some(progress),
                status: code::PROCESSING,
                messages: vec![format!("{} complete: Waiting for results...", self.label)],
                time_stamp: Utc::now(),
            }
        }
    }
}
