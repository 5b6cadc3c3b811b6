//! Where meshes and model archives come from.

use std::path::PathBuf;

use crate::error::{ModelError, ModelResult};

/// Resolves a location string to bytes. Transport is up to the caller.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, location: &str) -> std::io::Result<Vec<u8>>;
}

/// Reads locations as paths, optionally under a root directory.
#[derive(Clone, Debug, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, location: &str) -> std::io::Result<Vec<u8>> {
        match &self.root {
            Some(root) => std::fs::read(root.join(location)),
            None => std::fs::read(location),
        }
    }
}

/// Grid document input.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshSource {
    Buffer(Vec<u8>),
    Text(String),
    Location(String),
}

/// Model archive input (ZIP bytes).
#[derive(Clone, Debug, PartialEq)]
pub enum ArchiveSource {
    Buffer(Vec<u8>),
    Location(String),
}

pub(crate) fn fetch(fetcher: Option<&dyn Fetcher>, location: &str) -> ModelResult<Vec<u8>> {
    let fetcher = fetcher.ok_or_else(|| ModelError::Input {
        what: format!("cannot resolve location {location:?} without a fetcher"),
    })?;
    fetcher.fetch(location).map_err(|source| ModelError::Fetch {
        location: location.to_string(),
        source,
    })
}

impl MeshSource {
    pub(crate) fn into_bytes(self, fetcher: Option<&dyn Fetcher>) -> ModelResult<Vec<u8>> {
        match self {
            MeshSource::Buffer(bytes) => Ok(bytes),
            MeshSource::Text(text) => Ok(text.into_bytes()),
            MeshSource::Location(location) => fetch(fetcher, &location),
        }
    }
}

impl ArchiveSource {
    pub(crate) fn into_bytes(self, fetcher: Option<&dyn Fetcher>) -> ModelResult<Vec<u8>> {
        match self {
            ArchiveSource::Buffer(bytes) => Ok(bytes),
            ArchiveSource::Location(location) => fetch(fetcher, &location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl Fetcher for Fixed {
        fn fetch(&self, location: &str) -> std::io::Result<Vec<u8>> {
            match location {
                "mesh.json" => Ok(b"{}".to_vec()),
                _ => Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such entry")),
            }
        }
    }

    #[test]
    fn locations_need_a_fetcher() {
        let err = MeshSource::Location("mesh.json".into()).into_bytes(None).unwrap_err();
        assert!(matches!(err, ModelError::Input { .. }));
    }

    #[test]
    fn fetch_failures_name_the_location() {
        let bytes = MeshSource::Location("mesh.json".into()).into_bytes(Some(&Fixed)).unwrap();
        assert_eq!(bytes, b"{}");
        let err = ArchiveSource::Location("model.zip".into()).into_bytes(Some(&Fixed)).unwrap_err();
        assert!(matches!(err, ModelError::Fetch { ref location, .. } if location == "model.zip"));
    }
}
