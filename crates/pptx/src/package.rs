//! The ZIP package behind a .pptx file.
//!
//! The original archive bytes are kept so that every part nobody edited is
//! copied into the output without being decompressed.

use pptx_name_core::{Error, PresentationFormat, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// An opened OOXML package.
pub struct PptxPackage {
    source: Vec<u8>,
    part_names: Vec<String>,
}

impl PptxPackage {
    /// Open a package from the raw file bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        match PresentationFormat::from_magic(&bytes) {
            Some(PresentationFormat::Pptx) => {}
            Some(PresentationFormat::Ppt) => {
                return Err(Error::UnsupportedFormat(
                    "legacy .ppt files cannot be edited; save as .pptx first".to_string(),
                ))
            }
            None => {
                return Err(Error::UnsupportedFormat(
                    "file is not a ZIP-based presentation".to_string(),
                ))
            }
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
        let mut part_names = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;
            part_names.push(entry.name().to_string());
        }
        drop(archive);

        log::debug!("Opened package with {} parts", part_names.len());

        Ok(Self {
            source: bytes,
            part_names,
        })
    }

    pub fn contains(&self, part: &str) -> bool {
        self.part_names.iter().any(|name| name == part)
    }

    /// The unmodified bytes the package was opened from.
    pub fn source_bytes(&self) -> &[u8] {
        &self.source
    }

    /// Read one part, decompressed.
    pub fn read_part(&self, part: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive()?;
        let mut file = archive
            .by_name(part)
            .map_err(|_| Error::MissingPart(part.to_string()))?;

        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", part, e)))?;

        Ok(content)
    }

    /// Write a new archive where the parts in `replacements` get new content
    /// and every other entry is copied raw, in the original order.
    pub fn write_with(&self, replacements: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>> {
        for part in replacements.keys() {
            if !self.contains(part) {
                return Err(Error::MissingPart(part.clone()));
            }
        }

        let mut archive = self.archive()?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;

            let name = entry.name().to_string();
            match replacements.get(&name) {
                Some(content) => {
                    log::debug!("Rewriting part {}", name);
                    writer
                        .start_file(name.as_str(), options)
                        .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
                    writer.write_all(content)?;
                }
                None => {
                    writer
                        .raw_copy_file(entry)
                        .map_err(|e| Error::ZipError(format!("Failed to copy '{}': {}", name, e)))?;
                }
            }
        }

        let cursor = writer
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))?;
        Ok(cursor.into_inner())
    }

    fn archive(&self) -> Result<ZipArchive<Cursor<&[u8]>>> {
        ZipArchive::new(Cursor::new(self.source.as_slice()))
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))
    }
}

/// Resolve a relationship target against the directory of its source part.
///
/// `resolve_target("ppt", "slides/slide1.xml")` is `ppt/slides/slide1.xml`;
/// absolute targets are taken from the package root.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("{}/{}", base_dir, target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
