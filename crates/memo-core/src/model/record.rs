//! Registro de cómputo: la unidad que el store guarda por fingerprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::descriptor::IdentityDescriptor;

/// Registro inmutable; a lo sumo uno por fingerprint en el store. Se crea en
/// el primer cómputo exitoso y sólo desaparece con un purge administrativo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationRecord {
    /// Id asignado por el store al confirmar el insert.
    pub record_id: Uuid,
    /// Clave natural (hex de 64).
    pub fingerprint: String,
    /// Forma declarativa de la identidad (referencias por fingerprint).
    pub descriptor: IdentityDescriptor,
    /// Handle opaco del sink; `None` = registro de sólo metadata.
    pub artifact_location: Option<String>,
    pub created_at: DateTime<Utc>,
}
