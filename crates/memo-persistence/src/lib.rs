//! memo-persistence
//!
//! Implementación Postgres (Diesel) del `RecordStore` del core, más
//! utilidades de conexión, configuración y migraciones embebidas. El
//! contrato de un solo ganador por fingerprint se apoya en el primitivo
//! nativo de la base: clave única sobre `fingerprint` + `ON CONFLICT DO
//! NOTHING`.
//!
//! Módulos:
//! - `pg`: store de registros sobre Postgres (insert condicional por PK).
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_dev_store_from_env, build_pool, ConnectionProvider, PgPool, PgRecordStore, PoolProvider};
