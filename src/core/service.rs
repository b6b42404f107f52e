use crate::core::config::ServiceConfig;
use crate::core::events::{EventClassifier, TerminalReport, TransferEvent};
use crate::core::hub::StatusHub;
use crate::core::models::{User, UserPage, UsersDocument};
use crate::core::status::StatusInfo;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use std::io;
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::{broadcast, mpsc, watch};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;
const UPLOAD_STATUS_BUFFER: usize = 32;

/// The StatusInfo a non-2xx response reports. A structured error body is
/// relayed verbatim; anything else is wrapped so the HTTP status and body
/// text survive.
fn error_report(http_status: u16, body: String) -> StatusInfo {
    match serde_json::from_str::<StatusInfo>(&body) {
        Ok(reported) => reported,
        Err(_) => StatusInfo {
            progress: None,
            status: http_status,
            messages: vec![if body.is_empty() {
                format!("HTTP {http_status}")
            } else {
                body
            }],
            time_stamp: chrono::Utc::now(),
        },
    }
}

/// Consumer-facing API for the user service. The trait seam lets consumers
/// and tests swap the REST-backed implementation for a scripted one.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch one page of users. `size` falls back to the configured default.
    async fn fetch_users(&self, page: u32, size: Option<u32>) -> io::Result<UserPage>;

    /// Fetch a single user by identifier.
    async fn fetch_user(&self, id: u64) -> io::Result<User>;

    /// Create a user. Any identifier on the input is cleared before sending;
    /// the returned record carries the server-assigned one.
    async fn create_user(&self, user: User) -> io::Result<User>;

    /// Upload a CSV of users. The returned receiver yields every StatusInfo
    /// for the upload, from "started" through progress ticks to the server's
    /// own terminal processing report. Dropping the receiver stops
    /// observation only; the request runs to completion server-side.
    async fn upload_csv(&self, path: &Path) -> io::Result<mpsc::Receiver<StatusInfo>>;
}

/// REST-backed user directory.
///
/// Owns the shared [`StatusHub`]: every transport lifecycle event of every
/// operation is classified into a [`StatusInfo`] and published there, so any
/// number of independently-lifecycled consumers observe the latest operation
/// status without polling. Failures are absorbed here: classified, published
/// and returned as `io::Error`, never left to escape as panics or unhandled
/// rejections.
pub struct UserService {
    client: Client,
    config: ServiceConfig,
    hub: Arc<StatusHub>,
}

impl UserService {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            hub: Arc::new(StatusHub::new()),
        }
    }

    /// Replay-latest stream of status updates across all operations.
    pub fn status_updates(&self) -> watch::Receiver<StatusInfo> {
        self.hub.subscribe()
    }

    /// The most recently published status.
    pub fn latest_status(&self) -> StatusInfo {
        self.hub.latest()
    }

    /// Fired once per successful upload; the cue for list consumers to
    /// refetch. Kept separate from `status_updates` because its consumers
    /// differ: status subscribers want every tick, completion subscribers
    /// only the refetch trigger.
    pub fn completion_signal(&self) -> broadcast::Receiver<StatusInfo> {
        self.hub.completions()
    }

    fn classify_and_publish(&self, classifier: &EventClassifier, event: &TransferEvent) -> StatusInfo {
        let status = classifier.classify(event);
        self.hub.publish(status.clone());
        status
    }

    /// Absorb a failure at the channel boundary: classify it, publish the
    /// result and hand the caller an `io::Error` carrying the same messages.
    fn fail(&self, classifier: &EventClassifier, reported: Option<StatusInfo>) -> io::Error {
        let status = self.classify_and_publish(classifier, &TransferEvent::Failed { reported });
        io::Error::other(status.messages.join(", "))
    }

    /// Turn a non-2xx response into a `Failed` event carrying the server's
    /// report.
    async fn fail_from_response(
        &self,
        classifier: &EventClassifier,
        response: reqwest::Response,
    ) -> io::Error {
        let http_status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        self.fail(classifier, Some(error_report(http_status, body)))
    }

    /// Read a response body chunk by chunk, publishing a download-progress
    /// classification per chunk when the total length is known.
    async fn read_with_progress(
        &self,
        classifier: &EventClassifier,
        mut response: reqwest::Response,
    ) -> io::Result<Vec<u8>> {
        let total = response.content_length().filter(|t| *t > 0);
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    body.extend_from_slice(&chunk);
                    if let Some(total) = total {
                        self.classify_and_publish(
                            classifier,
                            &TransferEvent::DownloadProgress {
                                loaded: body.len() as u64,
                                total,
                            },
                        );
                    }
                }
                Ok(None) => return Ok(body),
                Err(e) => {
                    warn!("Response body transfer failed: {e}");
                    return Err(self.fail(classifier, None));
                }
            }
        }
    }

    /// Shared terminal path for operations whose success status is
    /// synthesized: parse the payload the data channel delivers, then
    /// publish the matching classification exactly once. An unparseable
    /// payload is a contract violation, published as such; the success
    /// status never reaches the hub for it.
    fn complete<T: serde::de::DeserializeOwned>(
        &self,
        classifier: &EventClassifier,
        body: serde_json::Value,
    ) -> io::Result<T> {
        match serde_json::from_value(body.clone()) {
            Ok(parsed) => {
                self.classify_and_publish(classifier, &TransferEvent::Completed { body });
                Ok(parsed)
            }
            Err(e) => {
                warn!("Response payload has an unexpected shape: {e}");
                let status = StatusInfo::unexpected_event();
                self.hub.publish(status.clone());
                Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    status.messages.join(", "),
                ))
            }
        }
    }
}

#[async_trait]
impl UserDirectory for UserService {
    async fn fetch_users(&self, page: u32, size: Option<u32>) -> io::Result<UserPage> {
        let size = size.unwrap_or(self.config.default_page_size);
        let classifier = EventClassifier::new("Get Users", TerminalReport::Synthesized);
        let url = format!("{}?page={page}&size={size}", self.config.entry_point);
        info!("Fetching users: {url}");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Get Users transport failure: {e}");
                return Err(self.fail(&classifier, None));
            }
        };
        if !response.status().is_success() {
            return Err(self.fail_from_response(&classifier, response).await);
        }

        let body = self.read_with_progress(&classifier, response).await?;
        let body: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            warn!("Get Users response is not JSON: {e}");
            let status = StatusInfo::unexpected_event();
            self.hub.publish(status.clone());
            io::Error::new(io::ErrorKind::InvalidData, status.messages.join(", "))
        })?;
        let doc: UsersDocument = self.complete(&classifier, body)?;
        Ok(UserPage::from(doc))
    }

    async fn fetch_user(&self, id: u64) -> io::Result<User> {
        let classifier = EventClassifier::new("Get User", TerminalReport::Synthesized);
        let url = format!("{}/{id}", self.config.entry_point);
        info!("Fetching user: {url}");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Get User transport failure: {e}");
                return Err(self.fail(&classifier, None));
            }
        };
        if !response.status().is_success() {
            return Err(self.fail_from_response(&classifier, response).await);
        }

        match response.json().await {
            Ok(body) => self.complete(&classifier, body),
            Err(e) => {
                warn!("Get User response body failed: {e}");
                Err(self.fail(&classifier, None))
            }
        }
    }

    async fn create_user(&self, mut user: User) -> io::Result<User> {
        // The server assigns identity; whatever the caller set is dropped.
        user.id = None;
        let classifier = EventClassifier::new("Add User", TerminalReport::Synthesized);
        info!("Creating user at {}", self.config.entry_point);

        let request = self.client.post(&self.config.entry_point).json(&user);
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Add User transport failure: {e}");
                return Err(self.fail(&classifier, None));
            }
        };
        if !response.status().is_success() {
            return Err(self.fail_from_response(&classifier, response).await);
        }

        match response.json().await {
            Ok(body) => self.complete(&classifier, body),
            Err(e) => {
                warn!("Add User response body failed: {e}");
                Err(self.fail(&classifier, None))
            }
        }
    }

    async fn upload_csv(&self, path: &Path) -> io::Result<mpsc::Receiver<StatusInfo>> {
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.csv")
            .to_string();
        info!("Uploading {file_name} ({total} bytes) to {}/upload-csv", self.config.entry_point);

        // The body stream reports cumulative bytes handed to the transport
        // through a side channel; the pipeline task below folds those ticks
        // into progress classifications while the request is in flight.
        let (tick_tx, mut tick_rx) = mpsc::channel::<u64>(UPLOAD_STATUS_BUFFER);
        let body_stream = futures::stream::try_unfold(
            (file, 0u64, tick_tx),
            |(mut file, sent, tick_tx)| async move {
                let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    return Ok::<_, io::Error>(None);
                }
                buf.truncate(n);
                let sent = sent + n as u64;
                let _ = tick_tx.send(sent).await;
                Ok(Some((buf, (file, sent, tick_tx))))
            },
        );

        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(body_stream),
            total,
        )
        .file_name(file_name)
        .mime_str("text/csv")
        .map_err(io::Error::other)?;
        let request = self
            .client
            .post(format!("{}/upload-csv", self.config.entry_point))
            .multipart(reqwest::multipart::Form::new().part("file", part));

        let (status_tx, status_rx) = mpsc::channel(UPLOAD_STATUS_BUFFER);
        let hub = Arc::clone(&self.hub);
        tokio::spawn(async move {
            let classifier = EventClassifier::new("File upload", TerminalReport::ServerReported);
            let emit = |event: &TransferEvent| {
                let status = classifier.classify(event);
                hub.publish(status.clone());
                status
            };

            let status = emit(&TransferEvent::Sent);
            let _ = status_tx.send(status).await;

            let mut send_future = pin!(request.send());
            let result = loop {
                tokio::select! {
                    biased;
                    Some(sent) = tick_rx.recv() => {
                        let status = emit(&TransferEvent::UploadProgress { loaded: sent, total });
                        let _ = status_tx.send(status).await;
                    }
                    result = &mut send_future => break result,
                }
            };
            // Ticks that raced the response still go out in order, before
            // the terminal status.
            while let Ok(sent) = tick_rx.try_recv() {
                let status = emit(&TransferEvent::UploadProgress { loaded: sent, total });
                let _ = status_tx.send(status).await;
            }

            let terminal = match result {
                Err(e) => {
                    warn!("File upload transport failure: {e}");
                    emit(&TransferEvent::Failed { reported: None })
                }
                Ok(response) => {
                    let http_status = response.status();
                    if http_status.is_success() {
                        match response.json::<serde_json::Value>().await {
                            Ok(body) => emit(&TransferEvent::Completed { body }),
                            Err(e) => {
                                warn!("File upload response body failed: {e}");
                                emit(&TransferEvent::Failed { reported: None })
                            }
                        }
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        emit(&TransferEvent::Failed {
                            reported: Some(error_report(http_status.as_u16(), body)),
                        })
                    }
                }
            };
            if terminal.is_success() {
                hub.signal_completion(terminal.clone());
            }
            let _ = status_tx.send(terminal).await;
        });

        Ok(status_rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::code;
    use serde_json::json;

    fn service() -> UserService {
        UserService::new(ServiceConfig {
            entry_point: "http://localhost:8080/api/users".to_string(),
            default_page_size: 10,
        })
    }

    #[test]
    fn test_error_report_relays_structured_body() {
        let body = json!({
            "status": 400,
            "messages": ["dob must be in the past"],
            "timeStamp": 1_700_000_000_000u64
        })
        .to_string();
        let report = error_report(400, body);
        assert_eq!(report.status, 400);
        assert_eq!(report.messages, vec!["dob must be in the past".to_string()]);
    }

    #[test]
    fn test_error_report_wraps_plain_text_body() {
        let report = error_report(503, "Service Unavailable".to_string());
        assert_eq!(report.status, 503);
        assert_eq!(report.progress, None);
        assert_eq!(report.messages, vec!["Service Unavailable".to_string()]);
    }

    #[test]
    fn test_error_report_names_status_when_body_is_empty() {
        let report = error_report(502, String::new());
        assert_eq!(report.status, 502);
        assert_eq!(report.messages, vec!["HTTP 502".to_string()]);
    }

    #[test]
    fn test_complete_publishes_success_only_after_parsing() {
        let service = service();
        let classifier = EventClassifier::new("Get User", TerminalReport::Synthesized);

        let result: io::Result<User> =
            service.complete(&classifier, json!({"surprise": "no user here"}));
        let err = result.expect_err("shape mismatch must fail");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        // The hub never saw a success status for the bad payload.
        let status = service.latest_status();
        assert_eq!(status.status, code::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status.messages,
            vec!["Unexpected event received from the server".to_string()]
        );
    }

    #[test]
    fn test_complete_publishes_success_for_parseable_payload() {
        let service = service();
        let classifier = EventClassifier::new("Get User", TerminalReport::Synthesized);

        let result: io::Result<User> = service.complete(
            &classifier,
            json!({
                "id": 7,
                "firstName": "Jane", "lastName": "Doe",
                "address": "1 Main St", "city": "Springfield",
                "state": "VA", "zipCode": "22150", "phone": "",
                "email": "jane.doe@example.com", "dob": "01/31/1990",
                "ssn": "123-45-6789", "picture": ""
            }),
        );
        assert_eq!(result.expect("parseable payload").id, Some(7));
        assert_eq!(service.latest_status().messages, vec!["Success".to_string()]);
    }
}
