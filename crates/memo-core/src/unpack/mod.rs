//! Adaptador de unpack: descompone un cómputo multi-salida en N identidades
//! sintéticas direccionables por separado.
//!
//! Cada salida tiene su propio fingerprint y su propio registro; la
//! identidad original no necesita registro propio. Esto permite que un
//! consumidor dependa de (y reutilice) una sola salida sin forzar el
//! recómputo o el almacenamiento de la tupla completa.

use std::sync::Arc;

use serde_json::Value;

use crate::errors::CoreCacheError;
use crate::model::{ArgValue, ComputationRecord, Identity};
use crate::sink::ArtifactSink;
use crate::store::RecordStore;

/// Nombre reservado de las identidades sintéticas de unpack.
pub const UNPACK_NAME: &str = "unpack";

/// Genera las identidades sintéticas `unpack(original, i)` para
/// `i = 0..output_count`.
pub fn expand(identity: &Arc<Identity>, output_count: usize) -> Result<Vec<Identity>, CoreCacheError> {
    (0..output_count).map(|index| {
                         Identity::new(UNPACK_NAME,
                                       vec![ArgValue::identity(identity), ArgValue::Literal(Value::from(index as u64))],
                                       Vec::<(String, ArgValue)>::new())
                     })
                     .collect()
}

/// Busca cada salida de forma independiente y preserva el orden de índices:
/// `None` en la posición i significa "salida i no cacheada", sin importar el
/// estado de las demás. El caching parcial es un estado legal y observable.
pub fn find_many<S: RecordStore>(store: &S,
                                 identity: &Arc<Identity>,
                                 output_count: usize)
                                 -> Result<Vec<Option<String>>, CoreCacheError> {
    expand(identity, output_count)?.iter()
                                   .map(|synthetic| Ok(store.find(synthetic)?.and_then(|rec| rec.artifact_location)))
                                   .collect()
}

/// Persiste cada par `(identidad, valor)` como unidad independiente de
/// durabilidad: allocate → save → insert, por elemento. Un fallo en el
/// elemento i no revierte los elementos ya confirmados; esos registros
/// siguen visibles vía `find`.
///
/// Un fingerprint ya cacheado se devuelve tal cual, sin escribir un artifact
/// nuevo.
pub fn insert_many<S, K, T, F>(store: &S,
                               sink: &K,
                               results: &[(Identity, T)],
                               save: F)
                               -> Result<Vec<ComputationRecord>, CoreCacheError>
    where S: RecordStore,
          K: ArtifactSink,
          F: Fn(&T, &str) -> Result<(), CoreCacheError>
{
    let mut records = Vec::with_capacity(results.len());
    for (identity, value) in results {
        if let Some(existing) = store.find(identity)? {
            records.push(existing);
            continue;
        }
        let location = sink.allocate_location(identity.name(), identity.fingerprint())?;
        save(value, &location)?;
        records.push(store.insert(identity, Some(location))?);
    }
    Ok(records)
}
