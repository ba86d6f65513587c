//! memo-core: caché direccionada por contenido para resultados de cómputos
//! nombrados y parametrizados.
//!
//! Una `Identity` describe la invocación (nombre + args + kwargs, con
//! sub-identidades anidadas); su fingerprint es la clave natural del
//! `RecordStore`. El adaptador de unpack direcciona cada salida de un
//! cómputo multi-salida por separado, y el índice de linaje reconstruye la
//! cadena de ancestros recorriendo las referencias entre registros.
pub mod cache;
pub mod errors;
pub mod hashing;
pub mod lineage;
pub mod model;
pub mod sink;
pub mod store;
pub mod unpack;

pub use cache::Cache;
pub use errors::CoreCacheError;
pub use lineage::{ancestors_of, AncestorsIter, KwargFilter};
pub use model::{ArgValue, ComputationRecord, DescriptorArg, Identity, IdentityDescriptor};
pub use sink::{ArtifactSink, LocationHandle};
pub use store::{InMemoryRecordStore, RecordStore};
pub use unpack::{expand, find_many, insert_many, UNPACK_NAME};
