//! Writing model archives.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{ArchiveError, ArchiveResult};
use crate::matrix::Matrix;
use crate::names::MatrixFile;

/// Collects named text entries and packs them into a ZIP bundle.
#[derive(Debug, Default, Clone)]
pub struct ArchiveBuilder {
    entries: Vec<(String, String)>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a matrix under its conventional file name.
    pub fn matrix(self, file: MatrixFile, matrix: &Matrix) -> Self {
        self.text(file.file_name(), matrix.to_text())
    }

    /// Add a raw text entry. A later entry with the same name replaces the earlier one.
    pub fn text(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        let name = name.into();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, contents.into()));
        self
    }

    /// Drop an entry (used to build deliberately incomplete archives).
    pub fn without(mut self, file: MatrixFile) -> Self {
        let name = file.file_name();
        self.entries.retain(|(n, _)| *n != name);
        self
    }

    pub fn to_zip_bytes(&self) -> ArchiveResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in &self.entries {
            writer.start_file(name.as_str(), SimpleFileOptions::default())?;
            writer
                .write_all(contents.as_bytes())
                .map_err(|source| ArchiveError::Io {
                    name: name.clone(),
                    source,
                })?;
        }
        Ok(writer.finish()?.into_inner())
    }
}
