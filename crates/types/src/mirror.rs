//! Ordered mirror lists

use modelsync_errors::{Error, MaterializeError, NetworkError};
use serde::{Deserialize, Serialize};
use url::Url;

/// Fallback file name when the first mirror has no usable path segment
const FALLBACK_ARCHIVE_NAME: &str = "artifact.download";

/// Ordered, non-empty list of download locations for one artifact
///
/// Order is the fallback priority: the first mirror is tried first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct MirrorList {
    mirrors: Vec<Url>,
}

impl MirrorList {
    /// Build a mirror list from already parsed URLs
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or a URL is not http(s).
    pub fn new(mirrors: Vec<Url>) -> Result<Self, Error> {
        if mirrors.is_empty() {
            return Err(MaterializeError::NoMirrors.into());
        }
        for url in &mirrors {
            match url.scheme() {
                "http" | "https" => {}
                scheme => {
                    return Err(NetworkError::UnsupportedProtocol {
                        protocol: scheme.to_string(),
                    }
                    .into())
                }
            }
        }
        Ok(Self { mirrors })
    }

    /// Parse a mirror list from URL strings
    ///
    /// # Errors
    ///
    /// Returns an error if any string is not a valid absolute URL, if the
    /// list is empty, or if a scheme other than http(s) is used.
    pub fn parse<I, S>(mirrors: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = mirrors
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                Url::parse(raw)
                    .map_err(|e| Error::from(NetworkError::InvalidUrl(format!("{raw}: {e}"))))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(urls)
    }

    /// The highest-priority mirror
    #[must_use]
    pub fn primary(&self) -> &Url {
        // Construction guarantees at least one entry
        &self.mirrors[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.mirrors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    /// Every mirror rendered as a string, in priority order
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.mirrors.iter().map(ToString::to_string).collect()
    }

    /// File name used for the temporary download of this artifact
    ///
    /// Taken from the last non-empty path segment of the primary mirror.
    #[must_use]
    pub fn archive_file_name(&self) -> String {
        self.primary()
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .filter(|name| *name != "." && *name != "..")
            .map_or_else(|| FALLBACK_ARCHIVE_NAME.to_string(), ToString::to_string)
    }
}

impl<'a> IntoIterator for &'a MirrorList {
    type Item = &'a Url;
    type IntoIter = std::slice::Iter<'a, Url>;

    fn into_iter(self) -> Self::IntoIter {
        self.mirrors.iter()
    }
}

impl TryFrom<Vec<String>> for MirrorList {
    type Error = Error;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<MirrorList> for Vec<String> {
    fn from(list: MirrorList) -> Self {
        list.to_strings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_rejected() {
        let err = MirrorList::parse(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, Error::Materialize(MaterializeError::NoMirrors)));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let err = MirrorList::parse(["ftp://example.com/model.tar"]).unwrap_err();
        assert!(matches!(
            err,
            Error::Network(NetworkError::UnsupportedProtocol { .. })
        ));
        assert!(MirrorList::parse(["not a url"]).is_err());
    }

    #[test]
    fn test_order_is_preserved() {
        let list = MirrorList::parse([
            "https://b.example/m.tar",
            "https://a.example/m.tar",
        ])
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.primary().host_str(), Some("b.example"));
        assert_eq!(
            list.to_strings(),
            vec!["https://b.example/m.tar", "https://a.example/m.tar"]
        );
    }

    #[test]
    fn test_archive_file_name() {
        let list = MirrorList::parse([
            "https://mirror.example/models/ch_PP-OCRv4_det_infer.tar?sig=abc",
        ])
        .unwrap();
        assert_eq!(list.archive_file_name(), "ch_PP-OCRv4_det_infer.tar");

        let trailing = MirrorList::parse(["https://mirror.example/models/det.tar.gz/"]).unwrap();
        assert_eq!(trailing.archive_file_name(), "det.tar.gz");

        let bare = MirrorList::parse(["https://mirror.example"]).unwrap();
        assert_eq!(bare.archive_file_name(), "artifact.download");
    }
}
