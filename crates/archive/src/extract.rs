//! Blocking extraction

use crate::format::{detect_format, ArchiveFormat, ArchiveLayout, MAGIC_LEN};
use crate::UnpackReport;
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use modelsync_errors::{ArchiveError, Error};
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tokio_util::sync::CancellationToken;
use zip::ZipArchive;

/// Unpacks one archive file into a destination directory
pub(crate) struct Extractor {
    source: String,
    dest: PathBuf,
    cancel: CancellationToken,
}

impl Extractor {
    pub(crate) fn new(archive: &Path, dest: &Path, cancel: CancellationToken) -> Self {
        Self {
            source: archive.display().to_string(),
            dest: dest.to_path_buf(),
            cancel,
        }
    }

    /// Detect the format of `archive` and unpack it
    pub(crate) fn run(&self, archive: &Path) -> Result<UnpackReport, Error> {
        let mut file = File::open(archive).map_err(|e| Error::io_with_path(&e, archive))?;

        let mut head = Vec::with_capacity(MAGIC_LEN);
        (&mut file)
            .take(MAGIC_LEN as u64)
            .read_to_end(&mut head)
            .map_err(|e| self.fail(&e))?;
        file.seek(SeekFrom::Start(0)).map_err(|e| self.fail(&e))?;

        let format = detect_format(&head).ok_or_else(|| ArchiveError::UnsupportedFormat {
            path: self.source.clone(),
        })?;

        match format {
            ArchiveFormat::Tar => {
                let entries = self.unpack_tar(file)?;
                Ok(UnpackReport::container(format, entries))
            }
            ArchiveFormat::Gzip => {
                let entry = self.single_member_name();
                let inner = self.read_member(GzDecoder::new(file))?;
                self.unpack_nested(format, &entry, inner)
            }
            ArchiveFormat::Bzip2 => {
                let entry = self.single_member_name();
                let inner = self.read_member(BzDecoder::new(file))?;
                self.unpack_nested(format, &entry, inner)
            }
            ArchiveFormat::Zip => {
                let mut zip = ZipArchive::new(file).map_err(|e| self.fail(&e))?;
                let files: Vec<String> = zip
                    .file_names()
                    .filter(|name| !name.ends_with('/'))
                    .map(ToString::to_string)
                    .collect();

                match format.layout(files.len()) {
                    ArchiveLayout::Wrapper => {
                        let entry = &files[0];
                        let member = zip.by_name(entry).map_err(|e| self.fail(&e))?;
                        let inner = self.read_member(member)?;
                        self.unpack_nested(format, entry, inner)
                    }
                    ArchiveLayout::Container => {
                        let entries = self.unpack_zip(&mut zip)?;
                        Ok(UnpackReport::container(format, entries))
                    }
                }
            }
        }
    }

    /// Unpack an in-memory archive that was the only member of `outer`
    fn unpack_nested(
        &self,
        outer: ArchiveFormat,
        entry: &str,
        inner: Vec<u8>,
    ) -> Result<UnpackReport, Error> {
        let inner_format = detect_format(&inner)
            .filter(|format| format.is_container())
            .ok_or_else(|| ArchiveError::NestedEntryNotArchive {
                entry: entry.to_string(),
            })?;

        let entries = match inner_format {
            ArchiveFormat::Tar => self.unpack_tar(Cursor::new(inner))?,
            _ => {
                let mut zip = ZipArchive::new(Cursor::new(inner)).map_err(|e| self.fail(&e))?;
                self.unpack_zip(&mut zip)?
            }
        };

        Ok(UnpackReport {
            format: outer,
            layout: ArchiveLayout::Wrapper,
            inner_format: Some(inner_format),
            entries,
        })
    }

    fn unpack_tar<R: Read>(&self, reader: R) -> Result<usize, Error> {
        let mut archive = Archive::new(reader);
        archive.set_preserve_permissions(true);
        archive.set_unpack_xattrs(false);

        let mut count = 0;
        for entry in archive.entries().map_err(|e| self.fail(&e))? {
            self.check_cancelled()?;
            let mut entry = entry.map_err(|e| self.fail(&e))?;
            let path = entry.path().map_err(|e| self.fail(&e))?.into_owned();
            check_entry_path(&path)?;

            if entry.unpack_in(&self.dest).map_err(|e| self.fail(&e))? {
                count += 1;
            }
        }
        Ok(count)
    }

    fn unpack_zip<R: Read + Seek>(&self, zip: &mut ZipArchive<R>) -> Result<usize, Error> {
        let mut count = 0;
        for index in 0..zip.len() {
            self.check_cancelled()?;
            let mut entry = zip.by_index(index).map_err(|e| self.fail(&e))?;
            let name = entry.name().to_string();
            check_entry_path(Path::new(&name))?;

            let out = self.dest.join(&name);
            if entry.is_dir() {
                fs::create_dir_all(&out).map_err(|e| self.fail(&e))?;
            } else {
                if let Some(parent) = out.parent() {
                    fs::create_dir_all(parent).map_err(|e| self.fail(&e))?;
                }
                let mut file = File::create(&out).map_err(|e| self.fail(&e))?;
                io::copy(&mut entry, &mut file).map_err(|e| self.fail(&e))?;
            }
            count += 1;
        }
        Ok(count)
    }

    /// Decompress the single member of a wrapper into memory
    fn read_member<R: Read>(&self, reader: R) -> Result<Vec<u8>, Error> {
        self.check_cancelled()?;
        let mut reader = CancelAwareReader {
            inner: reader,
            cancel: &self.cancel,
        };
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(|e| self.fail(&e))?;
        Ok(buf)
    }

    /// Name reported for the member of a gzip or bzip2 stream
    fn single_member_name(&self) -> String {
        Path::new(&self.source)
            .file_stem()
            .map_or_else(|| self.source.clone(), |stem| stem.to_string_lossy().into_owned())
    }

    fn check_cancelled(&self) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Map a lower-level failure, preferring cancellation when it was requested
    fn fail(&self, err: &dyn std::fmt::Display) -> Error {
        if self.cancel.is_cancelled() {
            Error::Cancelled
        } else {
            ArchiveError::extraction(self.source.clone(), err).into()
        }
    }
}

/// Reject entries that would land outside the destination
fn check_entry_path(path: &Path) -> Result<(), ArchiveError> {
    let escapes = path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    if escapes {
        Err(ArchiveError::PathTraversal {
            entry: path.display().to_string(),
        })
    } else {
        Ok(())
    }
}

/// Reader that stops once cancellation is requested
struct CancelAwareReader<'a, R> {
    inner: R,
    cancel: &'a CancellationToken,
}

impl<R: Read> Read for CancelAwareReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancel.is_cancelled() {
            return Err(io::Error::other("extraction cancelled"));
        }
        self.inner.read(buf)
    }
}
