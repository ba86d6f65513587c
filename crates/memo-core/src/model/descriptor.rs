//! Forma declarativa y persistible de una `Identity`.
//!
//! El descriptor es el único formato en cable/en disco que el core exige:
//! alcanza para re-derivar el fingerprint y para recorrer el grafo de
//! linaje. Las sub-identidades se guardan como referencias (su fingerprint),
//! no inline; la arista "los args de este registro apuntan a aquel registro"
//! queda explícita y consultable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hashing::hash_value;
use crate::model::identity::ArgValue;

/// Argumento serializado: literal etiquetado o referencia por fingerprint.
/// El tag distingue sin ambigüedad un string literal de un fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorArg {
    Lit(Value),
    Ref(String),
}

impl DescriptorArg {
    pub fn as_ref_fingerprint(&self) -> Option<&str> {
        match self {
            DescriptorArg::Ref(fp) => Some(fp),
            DescriptorArg::Lit(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityDescriptor {
    pub name: String,
    pub args: Vec<DescriptorArg>,
    pub kwargs: BTreeMap<String, DescriptorArg>,
}

impl IdentityDescriptor {
    pub(crate) fn from_parts(name: &str, args: &[ArgValue], kwargs: &BTreeMap<String, ArgValue>) -> Self {
        fn lower(arg: &ArgValue) -> DescriptorArg {
            match arg {
                ArgValue::Literal(v) => DescriptorArg::Lit(v.clone()),
                ArgValue::IdentityRef(id) => DescriptorArg::Ref(id.fingerprint().to_string()),
            }
        }
        Self { name: name.to_string(),
               args: args.iter().map(lower).collect(),
               kwargs: kwargs.iter().map(|(k, v)| (k.clone(), lower(v))).collect() }
    }

    /// Re-deriva el fingerprint desde la forma serializada. `Identity` y el
    /// descriptor pasan por exactamente el mismo camino de canonicalización,
    /// así que el round-trip persistir → leer → re-hashear es sin pérdida.
    pub fn fingerprint(&self) -> String {
        let encoded = serde_json::to_value(self).expect("serialize IdentityDescriptor");
        hash_value(&encoded)
    }

    /// Fingerprints referenciados, en orden de recorrido: args en su orden
    /// original, después kwargs por clave.
    pub fn reference_fingerprints(&self) -> Vec<&str> {
        self.args
            .iter()
            .filter_map(DescriptorArg::as_ref_fingerprint)
            .chain(self.kwargs.values().filter_map(DescriptorArg::as_ref_fingerprint))
            .collect()
    }

    /// Literal almacenado bajo una clave kwarg (`None` si no existe o si es
    /// una referencia).
    pub fn kwarg_literal(&self, key: &str) -> Option<&Value> {
        match self.kwargs.get(key) {
            Some(DescriptorArg::Lit(v)) => Some(v),
            _ => None,
        }
    }
}
