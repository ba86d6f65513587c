//! Wrapper de conveniencia con alcance explícito: agrupa un store y un sink
//! y expone el flujo lookup → compute → persist. Toda operación actúa sobre
//! los handles que recibió; no hay contexto "default" implícito.

use std::sync::Arc;

use crate::errors::CoreCacheError;
use crate::model::{ComputationRecord, Identity};
use crate::sink::ArtifactSink;
use crate::store::RecordStore;
use crate::unpack;

pub struct Cache<'a, S: RecordStore, K: ArtifactSink> {
    store: &'a S,
    sink: &'a K,
}

impl<'a, S: RecordStore, K: ArtifactSink> Cache<'a, S, K> {
    pub fn new(store: &'a S, sink: &'a K) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> &S {
        self.store
    }

    /// Lookup puro, sin computar nada.
    pub fn find(&self, identity: &Identity) -> Result<Option<ComputationRecord>, CoreCacheError> {
        self.store.find(identity)
    }

    /// Ubicación del artifact cacheado, si existe. Un hit sin payload
    /// (registro de sólo metadata) devuelve `None`.
    pub fn find_artifact(&self, identity: &Identity) -> Result<Option<String>, CoreCacheError> {
        Ok(self.store.find(identity)?.and_then(|record| record.artifact_location))
    }

    /// Camino completo de caching. Hit: devuelve el registro existente sin
    /// escribir nada (ningún archivo nuevo para un fingerprint ya cacheado).
    /// Miss: ejecuta `compute`, asigna ubicación, corre `save` y recién
    /// entonces confirma el registro — un `save` fallido impide que el
    /// registro llegue a existir.
    ///
    /// Devuelve el valor computado junto al registro sólo en el caso miss.
    pub fn get_or_insert_with<T, C, W>(&self,
                                       identity: &Identity,
                                       compute: C,
                                       save: W)
                                       -> Result<(ComputationRecord, Option<T>), CoreCacheError>
        where C: FnOnce() -> T,
              W: FnOnce(&T, &str) -> Result<(), CoreCacheError>
    {
        if let Some(existing) = self.store.find(identity)? {
            return Ok((existing, None));
        }
        let value = compute();
        let location = self.sink.allocate_location(identity.name(), identity.fingerprint())?;
        save(&value, &location)?;
        let record = self.store.insert(identity, Some(location))?;
        Ok((record, Some(value)))
    }

    /// Registro sin payload (caching de sólo metadata).
    pub fn insert_metadata_only(&self, identity: &Identity) -> Result<ComputationRecord, CoreCacheError> {
        self.store.insert(identity, None)
    }

    /// Variante unpack de `find_artifact`: una ubicación opcional por salida.
    pub fn find_unpacked(&self,
                         identity: &Arc<Identity>,
                         output_count: usize)
                         -> Result<Vec<Option<String>>, CoreCacheError> {
        unpack::find_many(self.store, identity, output_count)
    }

    /// Variante unpack del insert; ver `unpack::insert_many`.
    pub fn insert_unpacked<T, W>(&self,
                                 results: &[(Identity, T)],
                                 save: W)
                                 -> Result<Vec<ComputationRecord>, CoreCacheError>
        where W: Fn(&T, &str) -> Result<(), CoreCacheError>
    {
        unpack::insert_many(self.store, self.sink, results, save)
    }
}
