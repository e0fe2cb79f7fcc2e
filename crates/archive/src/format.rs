//! Archive format detection

use std::fmt;

/// Bytes needed to recognise every supported format
pub const MAGIC_LEN: usize = 262;

const TAR_MAGIC_OFFSET: usize = 257;

/// Archive formats understood by the unpacker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    Gzip,
    Bzip2,
    Zip,
    Tar,
}

/// How an archive relates to its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveLayout {
    /// Single-member envelope whose only entry is itself an archive
    Wrapper,
    /// Archive whose entries are unpacked as they are
    Container,
}

impl ArchiveFormat {
    /// Layout of an archive in this format holding `file_entries` files
    ///
    /// Compressed streams always hold exactly one member, so the count only
    /// matters for zip.
    #[must_use]
    pub fn layout(self, file_entries: usize) -> ArchiveLayout {
        match self {
            Self::Gzip | Self::Bzip2 => ArchiveLayout::Wrapper,
            Self::Tar => ArchiveLayout::Container,
            Self::Zip if file_entries == 1 => ArchiveLayout::Wrapper,
            Self::Zip => ArchiveLayout::Container,
        }
    }

    /// Whether entries of this format can be unpacked into a directory
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Tar | Self::Zip)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Zip => "zip",
            Self::Tar => "tar",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identify an archive from its leading bytes
///
/// Pass at least [`MAGIC_LEN`] bytes when available; shorter input can still
/// match the compressed formats and zip.
#[must_use]
pub fn detect_format(bytes: &[u8]) -> Option<ArchiveFormat> {
    if bytes.starts_with(&[0x1f, 0x8b]) {
        return Some(ArchiveFormat::Gzip);
    }
    if bytes.starts_with(b"BZh") {
        return Some(ArchiveFormat::Bzip2);
    }
    if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
        return Some(ArchiveFormat::Zip);
    }
    if bytes
        .get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5)
        .is_some_and(|magic| magic == b"ustar")
    {
        return Some(ArchiveFormat::Tar);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_compressed_streams() {
        assert_eq!(detect_format(&[0x1f, 0x8b, 0x08]), Some(ArchiveFormat::Gzip));
        assert_eq!(detect_format(b"BZh91AY&SY"), Some(ArchiveFormat::Bzip2));
    }

    #[test]
    fn test_detect_zip_including_empty() {
        assert_eq!(detect_format(b"PK\x03\x04rest"), Some(ArchiveFormat::Zip));
        assert_eq!(detect_format(b"PK\x05\x06rest"), Some(ArchiveFormat::Zip));
    }

    #[test]
    fn test_detect_tar_magic_offset() {
        let mut header = vec![0u8; 512];
        header[257..262].copy_from_slice(b"ustar");
        assert_eq!(detect_format(&header), Some(ArchiveFormat::Tar));
        // Truncated header cannot be a tar
        assert_eq!(detect_format(&header[..260]), None);
    }

    #[test]
    fn test_unknown_bytes() {
        assert_eq!(detect_format(b""), None);
        assert_eq!(detect_format(b"just some model weights"), None);
    }

    #[test]
    fn test_layouts() {
        assert_eq!(ArchiveFormat::Gzip.layout(1), ArchiveLayout::Wrapper);
        assert_eq!(ArchiveFormat::Bzip2.layout(1), ArchiveLayout::Wrapper);
        assert_eq!(ArchiveFormat::Tar.layout(1), ArchiveLayout::Container);
        assert_eq!(ArchiveFormat::Zip.layout(1), ArchiveLayout::Wrapper);
        assert_eq!(ArchiveFormat::Zip.layout(3), ArchiveLayout::Container);
        assert_eq!(ArchiveFormat::Zip.layout(0), ArchiveLayout::Container);
    }
}
