//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields. Levels
//! follow [`AppEvent::log_level`].

use modelsync_events::{AppEvent, DownloadEvent, GeneralEvent, MaterializeEvent};
use tracing::{debug, error, info, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    match event {
        AppEvent::General(general) => log_general(general),
        AppEvent::Download(download) => log_download(download),
        AppEvent::Materialize(materialize) => log_materialize(materialize),
    }
}

fn log_general(event: &GeneralEvent) {
    match event {
        GeneralEvent::Warning { message, context } => {
            warn!(target: "modelsync::events::general", context = ?context, "{message}");
        }
    }
}

fn log_download(event: &DownloadEvent) {
    match event {
        DownloadEvent::MirrorAttempt {
            url,
            attempt,
            total,
        } => {
            info!(
                target: "modelsync::events::download",
                url = %url,
                attempt = attempt,
                total = total,
                "Trying mirror"
            );
        }
        DownloadEvent::MirrorFailed {
            url,
            attempt,
            failure,
        } => {
            warn!(
                target: "modelsync::events::download",
                url = %url,
                attempt = attempt,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                "Mirror failed"
            );
        }
        DownloadEvent::Completed {
            url,
            destination,
            bytes,
        } => {
            info!(
                target: "modelsync::events::download",
                url = %url,
                destination = %destination,
                bytes = bytes,
                "Download completed"
            );
        }
        DownloadEvent::Exhausted {
            destination,
            mirrors,
        } => {
            error!(
                target: "modelsync::events::download",
                destination = %destination,
                mirrors = ?mirrors,
                "All mirrors failed"
            );
        }
    }
}

fn log_materialize(event: &MaterializeEvent) {
    match event {
        MaterializeEvent::AlreadyPresent { key, target_dir } => {
            debug!(
                target: "modelsync::events::materialize",
                key = %key,
                target_dir = %target_dir.display(),
                "Model already present"
            );
        }
        MaterializeEvent::GateWaiting { key } => {
            debug!(
                target: "modelsync::events::materialize",
                key = %key,
                "Waiting for another download of the same model"
            );
        }
        MaterializeEvent::CompletedByPeer { key, target_dir } => {
            info!(
                target: "modelsync::events::materialize",
                key = %key,
                target_dir = %target_dir.display(),
                "Model provided by a concurrent caller"
            );
        }
        MaterializeEvent::ArchiveReused { key, archive } => {
            info!(
                target: "modelsync::events::materialize",
                key = %key,
                archive = %archive.display(),
                "Reusing previous download"
            );
        }
        MaterializeEvent::Downloading { key, archive } => {
            info!(
                target: "modelsync::events::materialize",
                key = %key,
                archive = %archive.display(),
                "Downloading model"
            );
        }
        MaterializeEvent::Extracting {
            key,
            archive,
            target_dir,
        } => {
            info!(
                target: "modelsync::events::materialize",
                key = %key,
                archive = %archive.display(),
                target_dir = %target_dir.display(),
                "Extracting model"
            );
        }
        MaterializeEvent::Completed {
            key,
            target_dir,
            entries,
        } => {
            info!(
                target: "modelsync::events::materialize",
                key = %key,
                target_dir = %target_dir.display(),
                entries = entries,
                "Model ready"
            );
        }
        MaterializeEvent::Failed { key, failure } => {
            error!(
                target: "modelsync::events::materialize",
                key = %key,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Model materialization failed"
            );
        }
    }
}
