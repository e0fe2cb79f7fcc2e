//! Integration tests for archive crate

#[cfg(test)]
mod tests {
    use modelsync_archive::*;
    use modelsync_errors::{ArchiveError, Error};
    use std::io::{Cursor, Write};
    use std::path::Path;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn bzip2_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            writer
                .start_file(*name, zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn model_files() -> Vec<(&'static str, &'static [u8])> {
        vec![
            ("model/inference.pdiparams", b"params".as_slice()),
            ("model/inference.pdmodel", b"graph".as_slice()),
        ]
    }

    async fn unpack_bytes(
        name: &str,
        bytes: &[u8],
    ) -> (tempfile::TempDir, Result<UnpackReport, Error>) {
        let temp = tempdir().unwrap();
        let archive = temp.path().join(name);
        std::fs::write(&archive, bytes).unwrap();
        let dest = temp.path().join("out");
        let result = unpack(&archive, &dest, &CancellationToken::new()).await;
        (temp, result)
    }

    fn assert_model_unpacked(root: &Path) {
        let out = root.join("out");
        assert_eq!(
            std::fs::read(out.join("model/inference.pdiparams")).unwrap(),
            b"params"
        );
        assert_eq!(
            std::fs::read(out.join("model/inference.pdmodel")).unwrap(),
            b"graph"
        );
    }

    #[tokio::test]
    async fn test_plain_tar_is_container() {
        let (temp, result) = unpack_bytes("model.tar", &tar_bytes(&model_files())).await;
        let report = result.unwrap();

        assert_eq!(report.format, ArchiveFormat::Tar);
        assert_eq!(report.layout, ArchiveLayout::Container);
        assert_eq!(report.inner_format, None);
        assert_eq!(report.entries, 2);
        assert_model_unpacked(temp.path());
    }

    #[tokio::test]
    async fn test_tar_gz_unpacks_inner_tar() {
        let bytes = gzip_bytes(&tar_bytes(&model_files()));
        let (temp, result) = unpack_bytes("model.tar.gz", &bytes).await;
        let report = result.unwrap();

        assert_eq!(report.format, ArchiveFormat::Gzip);
        assert_eq!(report.layout, ArchiveLayout::Wrapper);
        assert_eq!(report.inner_format, Some(ArchiveFormat::Tar));
        assert_model_unpacked(temp.path());
        // The intermediate tar is never written out
        assert!(!temp.path().join("out/model.tar").exists());
    }

    #[tokio::test]
    async fn test_tar_bz2_unpacks_inner_tar() {
        let bytes = bzip2_bytes(&tar_bytes(&model_files()));
        let (temp, result) = unpack_bytes("model.tar.bz2", &bytes).await;
        let report = result.unwrap();

        assert_eq!(report.format, ArchiveFormat::Bzip2);
        assert_eq!(report.inner_format, Some(ArchiveFormat::Tar));
        assert_model_unpacked(temp.path());
    }

    #[tokio::test]
    async fn test_single_entry_zip_wrapping_tar() {
        let inner = tar_bytes(&model_files());
        let bytes = zip_bytes(&[("model.tar", inner.as_slice())]);
        let (temp, result) = unpack_bytes("model.zip", &bytes).await;
        let report = result.unwrap();

        assert_eq!(report.format, ArchiveFormat::Zip);
        assert_eq!(report.layout, ArchiveLayout::Wrapper);
        assert_eq!(report.inner_format, Some(ArchiveFormat::Tar));
        assert_model_unpacked(temp.path());
        assert!(!temp.path().join("out/model.tar").exists());
    }

    #[tokio::test]
    async fn test_gzip_wrapping_zip() {
        let bytes = gzip_bytes(&zip_bytes(&model_files()));
        let (temp, result) = unpack_bytes("model.zip.gz", &bytes).await;
        let report = result.unwrap();

        assert_eq!(report.inner_format, Some(ArchiveFormat::Zip));
        assert_eq!(report.entries, 2);
        assert_model_unpacked(temp.path());
    }

    #[tokio::test]
    async fn test_multi_entry_zip_is_container() {
        let (temp, result) = unpack_bytes("model.zip", &zip_bytes(&model_files())).await;
        let report = result.unwrap();

        assert_eq!(report.layout, ArchiveLayout::Container);
        assert_eq!(report.inner_format, None);
        assert_model_unpacked(temp.path());
    }

    #[tokio::test]
    async fn test_wrapper_member_must_be_archive() {
        let bytes = gzip_bytes(b"raw weights, not an archive");
        let (_temp, result) = unpack_bytes("inference.pdiparams.gz", &bytes).await;

        match result.unwrap_err() {
            Error::Archive(ArchiveError::NestedEntryNotArchive { entry }) => {
                assert_eq!(entry, "inference.pdiparams");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_format_rejected() {
        let (temp, result) = unpack_bytes("model.bin", b"definitely not an archive").await;

        assert!(matches!(
            result.unwrap_err(),
            Error::Archive(ArchiveError::UnsupportedFormat { .. })
        ));
        assert_eq!(std::fs::read_dir(temp.path().join("out")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_zip_traversal_rejected() {
        let bytes = zip_bytes(&[
            ("model/inference.pdiparams", b"params".as_slice()),
            ("../escape.txt", b"evil".as_slice()),
        ]);
        let (temp, result) = unpack_bytes("model.zip", &bytes).await;

        assert!(matches!(
            result.unwrap_err(),
            Error::Archive(ArchiveError::PathTraversal { .. })
        ));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_tar_traversal_rejected() {
        // tar::Builder refuses `..` paths, so write the name field directly
        let data = b"evil";
        let mut header = tar::Header::new_gnu();
        let name = b"../escape.txt";
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();

        let mut builder = tar::Builder::new(Vec::new());
        builder.append(&header, data.as_slice()).unwrap();
        let bytes = builder.into_inner().unwrap();

        let (temp, result) = unpack_bytes("model.tar", &bytes).await;

        assert!(matches!(
            result.unwrap_err(),
            Error::Archive(ArchiveError::PathTraversal { .. })
        ));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_cancelled_unpack() {
        let temp = tempdir().unwrap();
        let archive = temp.path().join("model.tar");
        std::fs::write(&archive, tar_bytes(&model_files())).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = unpack(&archive, &temp.path().join("out"), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!temp.path().join("out/model/inference.pdiparams").exists());
    }

    #[tokio::test]
    async fn test_held_value_released_when_worker_returns() {
        let temp = tempdir().unwrap();
        let archive = temp.path().join("model.tar");
        std::fs::write(&archive, tar_bytes(&model_files())).unwrap();
        let held = std::sync::Arc::new(());

        let report = unpack_holding(
            &archive,
            &temp.path().join("out"),
            &CancellationToken::new(),
            std::sync::Arc::clone(&held),
        )
        .await
        .unwrap();

        assert_eq!(report.entries, 2);
        assert_eq!(std::sync::Arc::strong_count(&held), 1);
    }

    #[tokio::test]
    async fn test_missing_archive_is_io_error() {
        let temp = tempdir().unwrap();
        let err = unpack(
            &temp.path().join("absent.tar"),
            &temp.path().join("out"),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
    }
}
