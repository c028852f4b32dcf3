//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! The whole archive is inflated into memory when it is opened, so the source
//! file handle is released before any editing begins. Members keep their
//! archive order so a rewritten package lists parts the way the original did.

use crate::ooxml::error::{OoxmlError, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// One file stored in the package archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMember {
    /// Member name inside the archive (no leading slash), e.g. `word/document.xml`
    pub name: String,
    /// Decompressed member content
    pub data: Vec<u8>,
}

/// Physical package reader that holds every part of a ZIP-based OPC package.
#[derive(Debug, Clone, Default)]
pub struct PhysPkgReader {
    members: Vec<PackageMember>,
}

impl PhysPkgReader {
    /// Open an OPC package from a file path.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or isn't a valid ZIP file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(OoxmlError::PartNotFound(format!(
                "package {}",
                path.display()
            )));
        }

        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Create a reader from a reader over ZIP bytes.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Inflate every member of the archive held in `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut members = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;
            members.push(PackageMember { name, data: blob });
        }

        Ok(Self { members })
    }

    /// Build a reader from members that are already in memory.
    pub fn from_members(members: Vec<PackageMember>) -> Self {
        Self { members }
    }

    /// Get the content of a member by name.
    ///
    /// A leading slash on `membername` is ignored.
    pub fn blob_for(&self, membername: &str) -> Option<&[u8]> {
        let membername = membername.trim_start_matches('/');
        self.members
            .iter()
            .find(|m| m.name == membername)
            .map(|m| m.data.as_slice())
    }

    /// Check if a specific member exists in the package.
    #[inline]
    pub fn contains(&self, membername: &str) -> bool {
        self.blob_for(membername).is_some()
    }

    /// List all member names in archive order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }

    /// Get the number of members in the package.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the package is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Consume the reader and return its members.
    #[inline]
    pub fn into_members(self) -> Vec<PackageMember> {
        self.members
    }
}

/// Physical package writer for creating OPC packages in memory.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
}

impl PhysPkgWriter {
    /// Create a new package writer that writes to memory.
    pub fn new() -> Self {
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Write a part to the package with Deflate compression.
    pub fn write(&mut self, membername: &str, blob: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.archive
            .start_file(membername.trim_start_matches('/'), options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Finish writing and return the package bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.archive.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut writer = PhysPkgWriter::new();
        writer.write("/test.txt", b"Hello, World!").unwrap();
        let zip_data = writer.finish().unwrap();

        let reader = PhysPkgReader::from_bytes(&zip_data).unwrap();
        assert_eq!(reader.blob_for("test.txt").unwrap(), b"Hello, World!");
        assert_eq!(reader.blob_for("/test.txt").unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_multiple_parts_keep_order() {
        let mut writer = PhysPkgWriter::new();
        writer.write("[Content_Types].xml", b"<Types/>").unwrap();
        writer.write("_rels/.rels", b"<Relationships/>").unwrap();
        writer.write("word/document.xml", b"<document/>").unwrap();

        let zip_data = writer.finish().unwrap();
        let reader = PhysPkgReader::from_bytes(&zip_data).unwrap();

        let names: Vec<&str> = reader.member_names().collect();
        assert_eq!(
            names,
            vec!["[Content_Types].xml", "_rels/.rels", "word/document.xml"]
        );
        assert!(reader.contains("word/document.xml"));
        assert!(!reader.contains("word/styles.xml"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = PhysPkgReader::open("/definitely/not/here.docx").unwrap_err();
        assert!(matches!(err, OoxmlError::PartNotFound(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(PhysPkgReader::from_bytes(b"not a zip archive").is_err());
    }
}
