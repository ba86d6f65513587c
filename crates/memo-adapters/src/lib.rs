//! memo-adapters: implementaciones concretas de los colaboradores externos
//! del core. Hoy: sink de artifacts sobre filesystem y saver JSON.
pub mod fs_sink;

pub use fs_sink::{save_json, FsArtifactSink};
