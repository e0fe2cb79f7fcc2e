#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for modelsync
//!
//! Artifact keys identify a model for locking purposes only; mirror lists
//! carry the ordered download locations for that model.

pub mod artifact;
pub mod mirror;

pub use artifact::ArtifactKey;
pub use mirror::MirrorList;
pub use url::Url;
