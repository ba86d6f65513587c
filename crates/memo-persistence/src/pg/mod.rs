//! Implementación Postgres (Diesel) del `RecordStore` del core.
//!
//! Contrato de concurrencia: a lo sumo un ganador por fingerprint. El insert
//! usa el primitivo nativo del store — `ON CONFLICT (fingerprint) DO
//! NOTHING` sobre la clave primaria — y relee la fila confirmada dentro de
//! la misma transacción, así que el perdedor de una carrera recibe el
//! registro del ganador en vez de crear un duplicado. La escritura es
//! todo-o-nada: un caller que abandona por timeout nunca deja una fila
//! parcial.
//!
//! Los errores transitorios de conexión se reintentan con backoff acotado
//! dentro de esta capa (es un detalle del transporte); agotados los
//! reintentos, el error sube como `StoreUnavailable` y la política de
//! reintentos restante queda del lado del caller.

use std::time::Duration;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, warn};
use serde_json::Value;
use uuid::Uuid;

use memo_core::errors::CoreCacheError;
use memo_core::model::{ComputationRecord, Identity, IdentityDescriptor};
use memo_core::store::RecordStore;

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::computation_records;

/// Alias del pool r2d2 de conexiones Postgres. Al construirlo se corre el
/// set de migraciones pendientes (una sola vez).
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real (producción / tests de integración) o
/// simular fallos en tests unitarios sin acoplar a r2d2. Debe devolver una
/// conexión lista o `PersistenceError::TransientIo`.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Implementación de provider respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Fila mapeada de `computation_records` para lecturas.
#[derive(Queryable, Debug)]
struct RecordRow {
    fingerprint: String,
    record_id: Uuid,
    name: String,
    descriptor: Value,
    artifact_location: Option<String>,
    created_at: DateTime<Utc>,
}

/// Fila para insertar en `computation_records`. `created_at` lo asigna la
/// base (DEFAULT now()).
#[derive(Insertable, Debug)]
#[diesel(table_name = computation_records)]
struct NewRecordRow<'a> {
    fingerprint: &'a str,
    record_id: &'a Uuid,
    name: &'a str,
    descriptor: &'a Value,
    artifact_location: Option<&'a str>,
}

fn row_to_record(row: RecordRow) -> Result<ComputationRecord, PersistenceError> {
    let descriptor: IdentityDescriptor =
        serde_json::from_value(row.descriptor).map_err(|e| PersistenceError::Unknown(format!("descriptor corrupto para {}: {e}", row.fingerprint)))?;
    Ok(ComputationRecord { record_id: row.record_id,
                           fingerprint: row.fingerprint,
                           descriptor,
                           artifact_location: row.artifact_location,
                           created_at: row.created_at })
}

/// Determina si un error amerita reintento con backoff (conflictos de
/// serialización y fallos transitorios de pool/conexión).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected") || m.contains("connection closed") || m.contains("connection refused") || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry con backoff pequeño (hasta 3 intentos: 15ms, 30ms, 45ms). No
/// altera semántica; sólo repite la unidad de trabajo provista por `f`.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Store de registros sobre Postgres.
pub struct PgRecordStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgRecordStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl PgRecordStore<PoolProvider> {
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(PoolProvider { pool })
    }
}

impl<P: ConnectionProvider> RecordStore for PgRecordStore<P> {
    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<ComputationRecord>, CoreCacheError> {
        debug!("find:start fingerprint={fingerprint}");
        let row: Option<RecordRow> = with_retry(|| {
                                         let mut conn = self.provider.connection()?;
                                         computation_records::table.filter(computation_records::fingerprint.eq(fingerprint))
                                                                   .first::<RecordRow>(&mut conn)
                                                                   .optional()
                                                                   .map_err(PersistenceError::from)
                                     })?;
        let found = row.map(row_to_record).transpose()?;
        debug!("find:done fingerprint={fingerprint} hit={}", found.is_some());
        Ok(found)
    }

    fn insert(&self, identity: &Identity, artifact_location: Option<String>) -> Result<ComputationRecord, CoreCacheError> {
        let fingerprint = identity.fingerprint();
        let descriptor = serde_json::to_value(identity.descriptor())
            .map_err(|e| CoreCacheError::StoreUnavailable(format!("serialize descriptor: {e}")))?;
        let record_id = Uuid::new_v4();
        debug!("insert:start fingerprint={fingerprint} name={}", identity.name());

        let row: RecordRow = with_retry(|| {
                                 let mut conn = self.provider.connection()?;
                                 conn.build_transaction()
                                     .read_write()
                                     .run(|tx_conn| {
                                         let inserted = diesel::insert_into(computation_records::table)
                                             .values(NewRecordRow { fingerprint,
                                                                    record_id: &record_id,
                                                                    name: identity.name(),
                                                                    descriptor: &descriptor,
                                                                    artifact_location: artifact_location.as_deref() })
                                             .on_conflict_do_nothing()
                                             .execute(tx_conn)?;
                                         if inserted == 0 {
                                             debug!("insert:perdió la carrera fingerprint={fingerprint}, leyendo fila ganadora");
                                         }
                                         computation_records::table.filter(computation_records::fingerprint.eq(fingerprint))
                                                                   .first::<RecordRow>(tx_conn)
                                     })
                                     .map_err(PersistenceError::from)
                             })?;
        let record = row_to_record(row)?;
        debug!("insert:done fingerprint={fingerprint} record_id={}", record.record_id);
        Ok(record)
    }

    fn scan_by_name(&self, name: &str) -> Result<Vec<ComputationRecord>, CoreCacheError> {
        debug!("scan:start name={name}");
        let rows: Vec<RecordRow> = with_retry(|| {
                                       let mut conn = self.provider.connection()?;
                                       computation_records::table.filter(computation_records::name.eq(name))
                                                                 .order((computation_records::created_at.asc(), computation_records::fingerprint.asc()))
                                                                 .load(&mut conn)
                                                                 .map_err(PersistenceError::from)
                                   })?;
        debug!("scan:done name={name} count={}", rows.len());
        rows.into_iter()
            .map(|row| row_to_record(row).map_err(CoreCacheError::from))
            .collect()
    }

    fn purge_all(&self) -> Result<(), CoreCacheError> {
        warn!("purge_all: eliminando todos los registros");
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::delete(computation_records::table).execute(&mut conn)
                                                      .map_err(PersistenceError::from)
        })?;
        Ok(())
    }
}

/// Construye un pool Postgres r2d2 a partir de la configuración.
///
/// - Ajusta tamaños inválidos (mínimo 1; `min <= max`).
/// - Aplica el timeout de checkout de conexión del config.
/// - Ejecuta las migraciones pendientes tras el primer `get()`.
pub fn build_pool(cfg: &DbConfig) -> Result<PgPool, PersistenceError> {
    let min = cfg.min_connections.max(1);
    let max = cfg.max_connections.max(min);
    let manager = ConnectionManager::<PgConnection>::new(&cfg.url);
    let pool = r2d2::Pool::builder().min_idle(Some(min))
                                    .max_size(max)
                                    .connection_timeout(Duration::from_secs(cfg.connect_timeout_secs))
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Helper de desarrollo: carga `.env`, lee la configuración y devuelve un
/// store listo sobre un pool ya migrado.
pub fn build_dev_store_from_env() -> Result<PgRecordStore<PoolProvider>, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = DbConfig::from_env();
    Ok(PgRecordStore::from_pool(build_pool(&cfg)?))
}
