//! Índice de linaje: reconstruye la cadena de ancestros de un cómputo
//! recorriendo las aristas de referencia del store.
//!
//! El grafo de referencias es acíclico por construcción (una identidad sólo
//! puede referenciar sub-identidades que existían antes), pero el recorrido
//! no confía ciegamente en esa invariante: una referencia sobre el camino
//! activo se reporta como `LineageCycleDetected`.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::errors::CoreCacheError;
use crate::model::{ComputationRecord, IdentityDescriptor};
use crate::store::RecordStore;

/// Predicado estructural sobre los kwargs almacenados: cada entrada del
/// filtro debe coincidir con el literal guardado bajo la misma clave (una
/// sub-configuración de los kwargs del registro).
#[derive(Debug, Clone, Default)]
pub struct KwargFilter(BTreeMap<String, Value>);

impl KwargFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K, V>(mut self, key: K, value: V) -> Self
        where K: Into<String>,
              V: Into<Value>
    {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, record: &ComputationRecord) -> bool {
        self.0.iter().all(|(key, value)| record.descriptor.kwarg_literal(key) == Some(value))
    }
}

/// Recorre los ancestros de todos los registros cuyo nombre coincida.
///
/// Por cada match (que satisfaga `filter`, si se pasa uno) se sigue en
/// profundidad el grafo de referencias — args en su orden, después kwargs
/// por clave — y se emite el conjunto de ancestros del más lejano al padre
/// inmediato (reverso del orden de descubrimiento). Las cadenas de matches
/// sucesivos se concatenan.
///
/// La secuencia resultante es perezosa por match y finita (acotada por el
/// tamaño del store); cada llamada re-recorre desde cero.
pub fn ancestors_of<'a, S: RecordStore>(store: &'a S,
                                        name: &str,
                                        filter: Option<&KwargFilter>)
                                        -> Result<AncestorsIter<'a, S>, CoreCacheError> {
    let mut matches = store.scan_by_name(name)?;
    if let Some(f) = filter {
        matches.retain(|record| f.matches(record));
    }
    // Se consumen con pop() desde el final, preservando el orden del scan.
    matches.reverse();
    Ok(AncestorsIter { store,
                       pending: matches,
                       buffer: Vec::new() })
}

/// Iterador de nombres de ancestros. Un error de transporte o un ciclo
/// detectado se emite como item `Err` y termina el recorrido.
pub struct AncestorsIter<'a, S: RecordStore> {
    store: &'a S,
    /// Matches aún no recorridos, en orden inverso.
    pending: Vec<ComputationRecord>,
    /// Cadena del match actual en orden de descubrimiento; `pop()` emite del
    /// ancestro más lejano hacia el padre inmediato.
    buffer: Vec<String>,
}

impl<'a, S: RecordStore> AncestorsIter<'a, S> {
    fn traverse(&self, root: &ComputationRecord) -> Result<Vec<String>, CoreCacheError> {
        let mut discovered = Vec::new();
        let mut visited = HashSet::new();
        let mut on_path = HashSet::new();
        visited.insert(root.fingerprint.clone());
        on_path.insert(root.fingerprint.clone());
        self.walk_refs(&root.descriptor, &mut discovered, &mut visited, &mut on_path)?;
        Ok(discovered)
    }

    fn walk_refs(&self,
                 descriptor: &IdentityDescriptor,
                 discovered: &mut Vec<String>,
                 visited: &mut HashSet<String>,
                 on_path: &mut HashSet<String>)
                 -> Result<(), CoreCacheError> {
        for fp in descriptor.reference_fingerprints() {
            if on_path.contains(fp) {
                return Err(CoreCacheError::LineageCycleDetected(fp.to_string()));
            }
            if !visited.insert(fp.to_string()) {
                // Diamante: el ancestro ya está en el conjunto.
                continue;
            }
            // Referencia colgante: la rama termina acá.
            let Some(record) = self.store.find_by_fingerprint(fp)? else { continue };
            discovered.push(record.descriptor.name.clone());
            on_path.insert(fp.to_string());
            self.walk_refs(&record.descriptor, discovered, visited, on_path)?;
            on_path.remove(fp);
        }
        Ok(())
    }
}

impl<'a, S: RecordStore> Iterator for AncestorsIter<'a, S> {
    type Item = Result<String, CoreCacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(name) = self.buffer.pop() {
                return Some(Ok(name));
            }
            let root = self.pending.pop()?;
            match self.traverse(&root) {
                Ok(discovered) => self.buffer = discovered,
                Err(e) => {
                    self.pending.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}
