#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Archive unpacking for downloaded artifacts
//!
//! Distributions arrive either as a plain container (tar, multi-entry zip)
//! or as a single-member wrapper (gzip, bzip2, single-file zip) whose only
//! member is itself a container. Wrappers are decompressed to memory and
//! their member is unpacked instead of being written out.

mod extract;
mod format;

pub use format::{detect_format, ArchiveFormat, ArchiveLayout, MAGIC_LEN};

use modelsync_errors::Error;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Summary of a finished unpack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackReport {
    /// Format of the file on disk
    pub format: ArchiveFormat,
    pub layout: ArchiveLayout,
    /// Format of the wrapped member, for wrappers
    pub inner_format: Option<ArchiveFormat>,
    /// Entries written to the destination
    pub entries: usize,
}

impl UnpackReport {
    fn container(format: ArchiveFormat, entries: usize) -> Self {
        Self {
            format,
            layout: ArchiveLayout::Container,
            inner_format: None,
            entries,
        }
    }
}

/// Unpack `archive` into `dest`
///
/// The work runs on the blocking pool. Cancellation is checked between
/// entries and while a wrapper's member is decompressed.
///
/// # Errors
///
/// Returns an error if:
/// - The file is not a recognised archive
/// - A wrapper's single member is not itself an archive
/// - An entry would be written outside `dest`
/// - Reading the archive or writing the destination fails
/// - The operation is cancelled
pub async fn unpack(
    archive: &Path,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<UnpackReport, Error> {
    unpack_holding(archive, dest, cancel, ()).await
}

/// Like [`unpack`], but `held` is moved into the blocking worker and dropped
/// only when the worker returns
///
/// Dropping the returned future does not stop the worker; it runs until it
/// next observes `cancel`. Passing a lock guard here keeps the lock held for
/// as long as the worker can still write to `dest`.
///
/// # Errors
///
/// Same as [`unpack`].
pub async fn unpack_holding<T>(
    archive: &Path,
    dest: &Path,
    cancel: &CancellationToken,
    held: T,
) -> Result<UnpackReport, Error>
where
    T: Send + 'static,
{
    tokio::fs::create_dir_all(dest)
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;

    let archive = archive.to_path_buf();
    let extractor = extract::Extractor::new(&archive, dest, cancel.clone());

    let report = tokio::task::spawn_blocking(move || {
        let report = extractor.run(&archive);
        drop(held);
        report
    })
    .await
    .map_err(|e| Error::internal(format!("extract task failed: {e}")))??;

    debug!(
        format = %report.format,
        inner = ?report.inner_format,
        entries = report.entries,
        dest = %dest.display(),
        "archive unpacked"
    );
    Ok(report)
}
