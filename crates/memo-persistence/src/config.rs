//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` y parámetros opcionales de pool.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    /// Tope de espera por una conexión del pool; vencido el plazo la
    /// operación falla como `StoreUnavailable` en vez de bloquear sin fin.
    pub connect_timeout_secs: u64,
}

impl DbConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self { url: env::var("DATABASE_URL").expect("DATABASE_URL no definido"),
               min_connections: env_parsed("DATABASE_MIN_CONNECTIONS", 2),
               max_connections: env_parsed("DATABASE_MAX_CONNECTIONS", 16),
               connect_timeout_secs: env_parsed("DATABASE_CONNECT_TIMEOUT_SECS", 30) }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
