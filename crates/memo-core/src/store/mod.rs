//! Store de registros: lookup por fingerprint, insert condicional y scan
//! por nombre.
//!
//! El core es una biblioteca pasiva: no introduce threads propios y cada
//! operación recibe el store sobre el que actúa como receiver explícito (no
//! existe ningún store "default" global).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::errors::CoreCacheError;
use crate::model::{ComputationRecord, Identity};

/// Contrato del store de registros.
///
/// Implementaciones deben tolerar callers concurrentes: `insert` garantiza a
/// lo sumo un ganador por fingerprint, y los perdedores de una carrera
/// observan el registro del ganador en lugar de crear un duplicado. Entre
/// fingerprints distintos no se garantiza ningún orden global.
pub trait RecordStore {
    /// Lookup de sólo lectura vía el fingerprint de la identidad.
    ///
    /// Chequeo defensivo: un hit cuyo descriptor almacenado no re-deriva el
    /// fingerprint consultado se reporta como
    /// `FingerprintCollisionSuspected`, nunca como cache hit.
    fn find(&self, identity: &Identity) -> Result<Option<ComputationRecord>, CoreCacheError> {
        match self.find_by_fingerprint(identity.fingerprint())? {
            None => Ok(None),
            Some(record) => {
                if record.descriptor.fingerprint() != identity.fingerprint() {
                    return Err(CoreCacheError::FingerprintCollisionSuspected(identity.fingerprint().to_string()));
                }
                Ok(Some(record))
            }
        }
    }

    /// Lookup crudo por string de fingerprint, sin chequeo de descriptor.
    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<ComputationRecord>, CoreCacheError>;

    /// Insert condicional, todo-o-nada desde la perspectiva del store: crea
    /// el registro si el fingerprint no existe; si otro caller ya lo
    /// insertó, devuelve ese registro sin modificarlo.
    fn insert(&self, identity: &Identity, artifact_location: Option<String>) -> Result<ComputationRecord, CoreCacheError>;

    /// Scan por nombre de cómputo (paso inicial del índice de linaje).
    fn scan_by_name(&self, name: &str) -> Result<Vec<ComputationRecord>, CoreCacheError>;

    /// Administrativo: elimina todos los registros. Sólo para reset de
    /// tests, nunca en un hot path.
    fn purge_all(&self) -> Result<(), CoreCacheError>;
}

/// Store en memoria: mapa fingerprint → registro detrás de un `Mutex`. El
/// insert condicional es el chequeo de entrada bajo el lock.
#[derive(Default)]
pub struct InMemoryRecordStore {
    inner: Mutex<HashMap<String, ComputationRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, ComputationRecord>>, CoreCacheError> {
        self.inner
            .lock()
            .map_err(|_| CoreCacheError::StoreUnavailable("record map poisoned".into()))
    }
}

impl RecordStore for InMemoryRecordStore {
    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<ComputationRecord>, CoreCacheError> {
        Ok(self.lock()?.get(fingerprint).cloned())
    }

    fn insert(&self, identity: &Identity, artifact_location: Option<String>) -> Result<ComputationRecord, CoreCacheError> {
        let mut map = self.lock()?;
        if let Some(existing) = map.get(identity.fingerprint()) {
            return Ok(existing.clone());
        }
        let record = ComputationRecord { record_id: Uuid::new_v4(),
                                         fingerprint: identity.fingerprint().to_string(),
                                         descriptor: identity.descriptor(),
                                         artifact_location,
                                         created_at: Utc::now() };
        map.insert(record.fingerprint.clone(), record.clone());
        Ok(record)
    }

    fn scan_by_name(&self, name: &str) -> Result<Vec<ComputationRecord>, CoreCacheError> {
        let mut records: Vec<ComputationRecord> = self.lock()?
                                                      .values()
                                                      .filter(|r| r.descriptor.name == name)
                                                      .cloned()
                                                      .collect();
        // Orden estable de inserción (el mapa no lo garantiza por sí solo).
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.fingerprint.cmp(&b.fingerprint)));
        Ok(records)
    }

    fn purge_all(&self) -> Result<(), CoreCacheError> {
        self.lock()?.clear();
        Ok(())
    }
}
