#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Ensure-present operation for downloadable models
//!
//! A model is ready when its directory holds every file of a
//! [`ReadyManifest`] with non-zero length. [`Materializer::ensure_present`]
//! turns a missing or broken directory into a ready one: it serializes
//! callers per artifact key, fetches the archive from the first working
//! mirror, unpacks it (unwrapping archive-of-archive distributions) and
//! validates the result. Concurrent callers for the same key share a single
//! download.

mod materializer;
mod validate;

pub use materializer::{Materializer, MaterializerBuilder, Readiness};
pub use validate::{check_ready, is_ready, ReadyManifest};
