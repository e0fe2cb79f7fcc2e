#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for modelsync
//!
//! This crate owns the HTTP client and the mirror fetcher: an ordered walk
//! over a model's mirrors that stops at the first one serving the full body.

mod client;
mod fetcher;

pub use client::{NetClient, NetConfig};
pub use fetcher::{FetchOutcome, MirrorFetcher};

use modelsync_errors::Error;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Download a single URL to `dest`
///
/// # Errors
///
/// Returns an error if the URL is invalid, the mirror fails, the operation is
/// cancelled, or the destination cannot be written.
pub async fn download_file(
    client: &NetClient,
    url: &str,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<FetchOutcome, Error> {
    MirrorFetcher::new(client.clone())
        .fetch_one(url, dest, cancel)
        .await
}
