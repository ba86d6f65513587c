//! Identidad inmutable de una invocación de cómputo.
//!
//! Una `Identity` describe "qué se calculó": nombre del cómputo, argumentos
//! posicionales (el orden es semántico) y argumentos con nombre (el orden no
//! lo es). Cada argumento es un literal JSON o una referencia a otra
//! `Identity` ya construida (`Arc` permite el sharing estructural esperado:
//! muchas identidades aguas abajo referenciando la misma identidad upstream).
//!
//! El fingerprint se fija una sola vez en la construcción, a partir de los
//! fingerprints ya calculados de los hijos: el costo es lineal en el tamaño
//! del grafo y un cambio en una hoja sólo recalcula a lo largo del camino
//! afectado.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::errors::CoreCacheError;
use crate::model::descriptor::IdentityDescriptor;

/// Valor de argumento: literal opaco o referencia a un sub-cómputo.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Literal(Value),
    IdentityRef(Arc<Identity>),
}

impl ArgValue {
    /// Literal a partir de cualquier valor serializable. Un valor que no
    /// serializa a JSON es `MalformedIdentity`.
    pub fn literal<T: Serialize>(value: T) -> Result<Self, CoreCacheError> {
        let v = serde_json::to_value(value)
            .map_err(|e| CoreCacheError::MalformedIdentity(format!("unserializable literal: {e}")))?;
        Ok(ArgValue::Literal(v))
    }

    /// Referencia a una identidad ya construida.
    pub fn identity(id: &Arc<Identity>) -> Self {
        ArgValue::IdentityRef(Arc::clone(id))
    }
}

/// Identidad inmutable (tipo valor, compartible vía `Arc`). Nunca se muta
/// después de construida.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    name: String,
    args: Vec<ArgValue>,
    kwargs: BTreeMap<String, ArgValue>,
    fingerprint: String,
}

impl Identity {
    /// Construye una identidad validando los kwargs y fijando su
    /// fingerprint. Una clave kwarg repetida es `MalformedIdentity`.
    pub fn new<N, K>(name: N, args: Vec<ArgValue>, kwargs: Vec<(K, ArgValue)>) -> Result<Self, CoreCacheError>
        where N: Into<String>,
              K: Into<String>
    {
        let name = name.into();
        let mut map = BTreeMap::new();
        for (key, value) in kwargs {
            let key = key.into();
            if map.insert(key.clone(), value).is_some() {
                return Err(CoreCacheError::MalformedIdentity(format!("duplicate kwarg key '{key}'")));
            }
        }
        let fingerprint = IdentityDescriptor::from_parts(&name, &args, &map).fingerprint();
        Ok(Self { name,
                  args,
                  kwargs: map,
                  fingerprint })
    }

    /// Cómputo sin argumentos: direccionable por nombre solo (el nombre
    /// entra al hash, así que el fingerprint sigue siendo no degenerado).
    pub fn nullary<N: Into<String>>(name: N) -> Result<Self, CoreCacheError> {
        Self::new(name, vec![], Vec::<(String, ArgValue)>::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, ArgValue> {
        &self.kwargs
    }

    /// Fingerprint estable (hex de 64). Calculado en construcción; esta
    /// llamada es total y pura.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Forma declarativa persistible: las sub-identidades aparecen como
    /// referencias por fingerprint, nunca inline.
    pub fn descriptor(&self) -> IdentityDescriptor {
        IdentityDescriptor::from_parts(&self.name, &self.args, &self.kwargs)
    }
}
