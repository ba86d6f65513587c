//! Sink de artifacts sobre un árbol de directorios compartido entre callers.
//!
//! Ubicación = `<root>/<nombre del cómputo>/<fingerprint>`: función pura de
//! sus inputs, resistente a colisiones entre writers concurrentes de
//! fingerprints distintos, y reintentable (la creación del directorio es
//! create-if-absent). Dos writers del MISMO fingerprint producen los mismos
//! bytes en la misma ruta; el insert condicional del store decide después
//! cuál registro queda.

use std::fs;
use std::path::{Path, PathBuf};

use memo_core::errors::CoreCacheError;
use memo_core::sink::{ArtifactSink, LocationHandle};
use serde::Serialize;

pub struct FsArtifactSink {
    root: PathBuf,
}

impl FsArtifactSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for FsArtifactSink {
    fn allocate_location(&self, computation_name: &str, fingerprint: &str) -> Result<LocationHandle, CoreCacheError> {
        let dir = self.root.join(computation_name);
        fs::create_dir_all(&dir).map_err(|e| CoreCacheError::ArtifactWriteFailed(format!("create dir {}: {e}", dir.display())))?;
        Ok(dir.join(fingerprint).to_string_lossy().into_owned())
    }
}

/// Saver por defecto para payloads serializables: escribe el valor como JSON
/// en la ubicación asignada. Usable directamente como `save_fn` de
/// `insert_many` o de `Cache::get_or_insert_with`.
pub fn save_json<T: Serialize>(value: &T, location: &str) -> Result<(), CoreCacheError> {
    let bytes = serde_json::to_vec(value).map_err(|e| CoreCacheError::ArtifactWriteFailed(format!("serialize payload: {e}")))?;
    fs::write(location, bytes).map_err(|e| CoreCacheError::ArtifactWriteFailed(format!("write {location}: {e}")))
}
