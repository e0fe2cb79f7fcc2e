//! Integration tests for types

#[cfg(test)]
mod tests {
    use modelsync_errors::{Error, MaterializeError, NetworkError};
    use modelsync_types::*;

    #[test]
    fn test_mirror_list_from_json() {
        let mirrors: MirrorList = serde_json::from_str(
            r#"["https://paddleocr.bj.bcebos.com/det.tar", "http://mirror.example/det.tar"]"#,
        )
        .unwrap();

        assert_eq!(mirrors.len(), 2);
        assert_eq!(mirrors.primary().host_str(), Some("paddleocr.bj.bcebos.com"));
        assert_eq!(mirrors.archive_file_name(), "det.tar");
    }

    #[test]
    fn test_mirror_list_json_rejects_empty_and_bad_scheme() {
        assert!(serde_json::from_str::<MirrorList>("[]").is_err());
        assert!(serde_json::from_str::<MirrorList>(r#"["ftp://host/det.tar"]"#).is_err());
    }

    #[test]
    fn test_mirror_list_construction_errors() {
        assert!(matches!(
            MirrorList::parse(Vec::<String>::new()),
            Err(Error::Materialize(MaterializeError::NoMirrors))
        ));
        assert!(matches!(
            MirrorList::parse(["file:///tmp/det.tar"]),
            Err(Error::Network(NetworkError::UnsupportedProtocol { .. }))
        ));
        assert!(matches!(
            MirrorList::parse(["relative/det.tar"]),
            Err(Error::Network(NetworkError::InvalidUrl(_)))
        ));
    }

    #[test]
    fn test_artifact_key_json() {
        let key: ArtifactKey = serde_json::from_str(r#""ch_PP-OCRv4_det""#).unwrap();
        assert_eq!(key.as_str(), "ch_PP-OCRv4_det");
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""ch_PP-OCRv4_det""#);
        assert!(serde_json::from_str::<ArtifactKey>(r#""  ""#).is_err());
    }
}
