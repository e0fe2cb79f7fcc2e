//! Ensure-present orchestration

use crate::validate::{check_ready, ReadyManifest};
use modelsync_config::Config;
use modelsync_errors::{Error, MaterializeError, ValidationError};
use modelsync_events::{EventEmitter, EventSender, FailureContext, MaterializeEvent};
use modelsync_gate::{GateGuard, GateRegistry};
use modelsync_net::{MirrorFetcher, NetClient, NetConfig};
use modelsync_types::{ArtifactKey, MirrorList};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a successful `ensure_present` call reached the ready state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Ready before any locking
    AlreadyPresent,
    /// Another caller materialized the artifact while this one waited
    CompletedByPeer,
    /// This call downloaded (or reused) and unpacked the archive
    Materialized {
        /// Temporary archive, removed once the directory validated
        archive: PathBuf,
        /// Whether a leftover archive from an earlier attempt was used
        reused_archive: bool,
        /// Entries written by the unpacker
        entries: usize,
    },
}

impl Readiness {
    /// Whether this call did the download and unpack itself
    #[must_use]
    pub fn did_work(&self) -> bool {
        matches!(self, Self::Materialized { .. })
    }
}

/// Makes model directories ready, at most one attempt per key at a time
#[derive(Debug, Clone)]
pub struct Materializer {
    fetcher: MirrorFetcher,
    gates: GateRegistry,
    manifest: ReadyManifest,
    tx: Option<EventSender>,
}

impl EventEmitter for Materializer {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl Materializer {
    /// Materializer with a default client, a private gate registry and the
    /// default manifest
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, Error> {
        MaterializerBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> MaterializerBuilder {
        MaterializerBuilder::new()
    }

    /// Ensure `target_dir` holds a valid copy of the artifact
    ///
    /// A ready directory returns immediately without locking. Otherwise the
    /// gate for `key` is taken, readiness is checked again, and the archive
    /// is downloaded from `mirrors` (or a leftover download is reused),
    /// unpacked into `target_dir` and validated. The temporary archive is
    /// removed only after validation succeeds.
    ///
    /// The gate is released on every exit path. If the returned future is
    /// dropped while the archive is being unpacked, the unpacker is cancelled
    /// and the gate stays held until it has stopped writing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Every mirror fails (`NetworkError::FetchFailed`)
    /// - The archive cannot be unpacked
    /// - The unpacked directory does not validate (`MaterializeError::NotReady`)
    /// - The target directory cannot be written
    /// - `cancel` fires (`Error::Cancelled`)
    pub async fn ensure_present(
        &self,
        key: &ArtifactKey,
        mirrors: &MirrorList,
        target_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Readiness, Error> {
        if self.check(target_dir).await.is_ok() {
            debug!(%key, dir = %target_dir.display(), "already present");
            self.emit_materialize(MaterializeEvent::AlreadyPresent {
                key: key.to_string(),
                target_dir: target_dir.to_path_buf(),
            });
            return Ok(Readiness::AlreadyPresent);
        }

        // Cancels background work if this future is dropped
        let cancel = cancel.child_token();
        let _cancel_on_drop = cancel.clone().drop_guard();

        if self.gates.contains(key) {
            self.emit_materialize(MaterializeEvent::GateWaiting {
                key: key.to_string(),
            });
        }
        let guard = Arc::new(self.gates.acquire(key, &cancel).await?);

        let result = self
            .materialize(key, mirrors, target_dir, &cancel, Arc::clone(&guard))
            .await;
        drop(guard);

        if let Err(err) = &result {
            if !err.is_cancelled() {
                warn!(%key, error = %err, "materialization failed");
                self.emit_materialize(MaterializeEvent::Failed {
                    key: key.to_string(),
                    failure: FailureContext::from_error(err),
                });
            }
        }
        result
    }

    /// Gate-held part of `ensure_present`
    ///
    /// `gate` is shared with the unpack worker, which may outlive this call.
    async fn materialize(
        &self,
        key: &ArtifactKey,
        mirrors: &MirrorList,
        target_dir: &Path,
        cancel: &CancellationToken,
        gate: Arc<GateGuard>,
    ) -> Result<Readiness, Error> {
        if self.check(target_dir).await.is_ok() {
            debug!(%key, "completed by another caller");
            self.emit_materialize(MaterializeEvent::CompletedByPeer {
                key: key.to_string(),
                target_dir: target_dir.to_path_buf(),
            });
            return Ok(Readiness::CompletedByPeer);
        }

        fs::create_dir_all(target_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, target_dir))?;

        let archive = target_dir.join(mirrors.archive_file_name());
        let reused_archive = matches!(
            fs::metadata(&archive).await,
            Ok(metadata) if metadata.is_file() && metadata.len() > 0
        );

        if reused_archive {
            info!(%key, archive = %archive.display(), "reusing previous download");
            self.emit_materialize(MaterializeEvent::ArchiveReused {
                key: key.to_string(),
                archive: archive.clone(),
            });
        } else {
            self.emit_materialize(MaterializeEvent::Downloading {
                key: key.to_string(),
                archive: archive.clone(),
            });
            self.fetcher.fetch(mirrors, &archive, cancel).await?;
        }

        self.emit_materialize(MaterializeEvent::Extracting {
            key: key.to_string(),
            archive: archive.clone(),
            target_dir: target_dir.to_path_buf(),
        });
        let report =
            modelsync_archive::unpack_holding(&archive, target_dir, cancel, gate).await?;

        self.check(target_dir)
            .await
            .map_err(|source| MaterializeError::NotReady {
                key: key.to_string(),
                source,
            })?;

        // The directory is valid from here on; a leftover archive is harmless
        if let Err(e) = fs::remove_file(&archive).await {
            warn!(%key, archive = %archive.display(), error = %e, "failed to remove downloaded archive");
            self.emit_warning_with_context("failed to remove downloaded archive", e.to_string());
        }

        info!(%key, dir = %target_dir.display(), entries = report.entries, "artifact ready");
        self.emit_materialize(MaterializeEvent::Completed {
            key: key.to_string(),
            target_dir: target_dir.to_path_buf(),
            entries: report.entries,
        });

        Ok(Readiness::Materialized {
            archive,
            reused_archive,
            entries: report.entries,
        })
    }

    /// Validate `target_dir` against this materializer's manifest
    ///
    /// # Errors
    ///
    /// Returns the first missing or empty required file.
    pub async fn check(&self, target_dir: &Path) -> Result<(), ValidationError> {
        check_ready(target_dir, &self.manifest).await
    }

    #[must_use]
    pub fn gates(&self) -> &GateRegistry {
        &self.gates
    }

    #[must_use]
    pub fn manifest(&self) -> &ReadyManifest {
        &self.manifest
    }

    #[must_use]
    pub fn client(&self) -> &NetClient {
        self.fetcher.client()
    }
}

/// Builder for [`Materializer`]; every component is optional
#[derive(Debug, Default)]
pub struct MaterializerBuilder {
    client: Option<NetClient>,
    net_config: Option<NetConfig>,
    gates: Option<GateRegistry>,
    manifest: Option<ReadyManifest>,
    tx: Option<EventSender>,
}

impl MaterializerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a caller-provided HTTP client
    #[must_use]
    pub fn with_client(mut self, client: NetClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Share a gate registry with other materializers
    #[must_use]
    pub fn with_gates(mut self, gates: GateRegistry) -> Self {
        self.gates = Some(gates);
        self
    }

    #[must_use]
    pub fn with_manifest(mut self, manifest: ReadyManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Take network settings and the manifest from configuration
    ///
    /// An explicit client or manifest set on the builder takes precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured required files are not a valid
    /// manifest.
    pub fn with_config(mut self, config: &Config) -> Result<Self, Error> {
        self.net_config = Some(NetConfig::from(&config.network));
        if self.manifest.is_none() {
            self.manifest = Some(ReadyManifest::from_config(&config.validation)?);
        }
        Ok(self)
    }

    /// Build the materializer
    ///
    /// # Errors
    ///
    /// Returns an error if no client was provided and a new one cannot be
    /// created.
    pub fn build(self) -> Result<Materializer, Error> {
        let client = match self.client {
            Some(client) => client,
            None => NetClient::new(self.net_config.unwrap_or_default())?,
        };

        let mut fetcher = MirrorFetcher::new(client);
        if let Some(tx) = &self.tx {
            fetcher = fetcher.with_event_sender(tx.clone());
        }

        Ok(Materializer {
            fetcher,
            gates: self.gates.unwrap_or_default(),
            manifest: self.manifest.unwrap_or_default(),
            tx: self.tx,
        })
    }
}
