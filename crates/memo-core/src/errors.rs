//! Errores específicos del core (tipados, nunca fatales al proceso).
//!
//! `MalformedIdentity` falla al construir la identidad, antes de tocar el
//! store. `StoreUnavailable` se reporta al caller tal cual: la política de
//! reintentos, si existe, vive en la capa de orquestación.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreCacheError {
    #[error("malformed identity: {0}")] MalformedIdentity(String),
    #[error("record store unavailable: {0}")] StoreUnavailable(String),
    #[error("fingerprint collision suspected for {0}")] FingerprintCollisionSuspected(String),
    #[error("artifact write failed: {0}")] ArtifactWriteFailed(String),
    #[error("lineage cycle detected at {0}")] LineageCycleDetected(String),
}
