//! Ordered mirror fallback

use crate::client::{classify, NetClient};
use futures::StreamExt;
use modelsync_errors::{Error, NetworkError};
use modelsync_events::{DownloadEvent, EventEmitter, EventSender, FailureContext};
use modelsync_types::{MirrorList, Url};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Mirror that served the body
    pub url: Url,
    /// Bytes written to the destination
    pub bytes: u64,
    /// 1-based position of the serving mirror in the list
    pub attempt: usize,
}

/// What happened with one mirror
enum MirrorOutcome {
    Written(u64),
    Rejected(NetworkError),
}

/// Downloads an artifact from the first mirror that serves it
#[derive(Debug, Clone)]
pub struct MirrorFetcher {
    client: NetClient,
    tx: Option<EventSender>,
}

impl EventEmitter for MirrorFetcher {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl MirrorFetcher {
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        Self { client, tx: None }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn client(&self) -> &NetClient {
        &self.client
    }

    /// Fetch a single URL
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a valid http(s) URL or if the mirror
    /// fails, plus everything [`MirrorFetcher::fetch`] can return.
    pub async fn fetch_one(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, Error> {
        let mirrors = MirrorList::parse([url])?;
        self.fetch(&mirrors, destination, cancel).await
    }

    /// Try each mirror in order, writing the first full body to `destination`
    ///
    /// A mirror answering with a non-success status, failing at the transport
    /// level, or stalling past the chunk timeout is logged and skipped. No
    /// mirror is tried twice. The destination is overwritten by every mirror
    /// that starts sending a body. A body cut short is truncated back to zero
    /// length, so a failed fetch never leaves a partial file that looks like a
    /// usable download; the file itself is not removed.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::FetchFailed` listing every mirror when all of
    /// them fail, `Error::Cancelled` when `cancel` fires, or an I/O error when
    /// the destination cannot be written.
    pub async fn fetch(
        &self,
        mirrors: &MirrorList,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, Error> {
        let total = mirrors.len();

        for (index, url) in mirrors.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let attempt = index + 1;
            debug!(%url, attempt, total, "requesting mirror");
            self.emit_download(DownloadEvent::MirrorAttempt {
                url: url.to_string(),
                attempt,
                total,
            });

            match self.try_mirror(url, destination, cancel).await? {
                MirrorOutcome::Written(bytes) => {
                    info!(%url, bytes, destination = %destination.display(), "download complete");
                    self.emit_download(DownloadEvent::Completed {
                        url: url.to_string(),
                        destination: destination.display().to_string(),
                        bytes,
                    });
                    return Ok(FetchOutcome {
                        url: url.clone(),
                        bytes,
                        attempt,
                    });
                }
                MirrorOutcome::Rejected(reason) => {
                    warn!(%url, attempt, error = %reason, "failed to download from mirror");
                    self.emit_download(DownloadEvent::MirrorFailed {
                        url: url.to_string(),
                        attempt,
                        failure: FailureContext::from_error(&reason),
                    });
                }
            }
        }

        let destination = destination.display().to_string();
        let mirrors = mirrors.to_strings();
        self.emit_download(DownloadEvent::Exhausted {
            destination: destination.clone(),
            mirrors: mirrors.clone(),
        });
        Err(NetworkError::FetchFailed {
            destination,
            mirrors,
        }
        .into())
    }

    async fn try_mirror(
        &self,
        url: &Url,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<MirrorOutcome, Error> {
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            response = self.client.get(url.as_str()) => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(Error::Network(reason)) => return Ok(MirrorOutcome::Rejected(reason)),
            Err(other) => return Err(other),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(MirrorOutcome::Rejected(NetworkError::HttpError {
                status: status.as_u16(),
                message: status.to_string(),
            }));
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| Error::io_with_path(&e, destination))?;
        let mut stream = response.bytes_stream();
        let chunk_timeout = self.client.config().chunk_timeout;
        let mut written = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                next = tokio::time::timeout(chunk_timeout, stream.next()) => next,
            };

            let reason = match next {
                Ok(Some(Ok(chunk))) => {
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| Error::io_with_path(&e, destination))?;
                    written += chunk.len() as u64;
                    continue;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => classify(&e),
                Err(_) => NetworkError::Timeout {
                    url: url.to_string(),
                },
            };

            debug!(%url, written, "discarding partial body");
            file.set_len(0)
                .await
                .map_err(|e| Error::io_with_path(&e, destination))?;
            return Ok(MirrorOutcome::Rejected(reason));
        }

        file.flush()
            .await
            .map_err(|e| Error::io_with_path(&e, destination))?;
        Ok(MirrorOutcome::Written(written))
    }
}
