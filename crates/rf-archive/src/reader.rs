//! ZIP archive access.

use std::collections::BTreeSet;
use std::io::{Cursor, Read};

use rayon::prelude::*;
use zip::ZipArchive;

use crate::error::{ArchiveError, ArchiveResult};
use crate::matrix::Matrix;
use crate::names::MatrixFile;
use crate::parse::parse_entry;

/// Reader over an in-memory model archive.
///
/// Opening only reads the central directory. Entries are decompressed when a
/// caller asks for them, and every decompressed entry is recorded so callers
/// can tell exactly which files a load touched.
pub struct ArchiveReader {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    index: BTreeSet<String>,
    read_log: Vec<String>,
}

impl ArchiveReader {
    pub fn from_bytes(bytes: Vec<u8>) -> ArchiveResult<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes))?;
        let index = zip.file_names().map(str::to_string).collect();
        Ok(Self {
            zip,
            index,
            read_log: Vec::new(),
        })
    }

    pub fn contains(&self, file: MatrixFile) -> bool {
        self.index.contains(&file.file_name())
    }

    /// Names of every entry in the archive.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.index.iter().map(String::as_str)
    }

    /// Names of the entries decompressed so far, in read order.
    pub fn entries_read(&self) -> &[String] {
        &self.read_log
    }

    fn read_raw(&mut self, file: MatrixFile) -> ArchiveResult<Vec<u8>> {
        let name = file.file_name();
        if !self.index.contains(&name) {
            return Err(ArchiveError::MissingMatrix(name));
        }
        let mut entry = self.zip.by_name(&name)?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|source| ArchiveError::Io {
                name: name.clone(),
                source,
            })?;
        drop(entry);
        self.read_log.push(name);
        Ok(buf)
    }

    /// Decompress and parse a batch of entries.
    ///
    /// Decompression is sequential (the ZIP reader is stateful); text decoding
    /// of the decompressed entries runs in parallel. The whole batch either
    /// succeeds or reports the first failure in request order.
    pub fn read_matrices(&mut self, files: &[MatrixFile]) -> ArchiveResult<Vec<(MatrixFile, Matrix)>> {
        let mut raw = Vec::with_capacity(files.len());
        for &file in files {
            raw.push((file, self.read_raw(file)?));
        }

        raw.par_iter()
            .map(|(file, bytes)| parse_entry(&file.file_name(), bytes).map(|m| (*file, m)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    pub fn read_matrix(&mut self, file: MatrixFile) -> ArchiveResult<Matrix> {
        let bytes = self.read_raw(file)?;
        parse_entry(&file.file_name(), &bytes)
    }
}
