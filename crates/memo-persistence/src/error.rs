//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas; en el borde
//! del trait `RecordStore` todo colapsa a `StoreUnavailable` del core.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use memo_core::errors::CoreCacheError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found")]
    NotFound,
    #[error("serialization conflict (retryable)")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => Self::UniqueViolation(info.message().to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => Self::CheckViolation(info.message().to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => Self::ForeignKeyViolation(info.message().to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => Self::SerializationConflict,
            DieselError::DatabaseError(kind, info) => Self::Unknown(format!("db error kind {:?}: {}", kind, info.message())),
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            other => Self::Unknown(format!("diesel error: {other:?}")),
        }
    }
}

impl From<PersistenceError> for CoreCacheError {
    fn from(err: PersistenceError) -> Self {
        CoreCacheError::StoreUnavailable(err.to_string())
    }
}
