//! Fase de carga: persistência das tabelas transformadas

pub mod csv;
pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use csv::CsvLoader;
pub use memory::MemoryLoader;
#[cfg(feature = "database")]
pub use postgres::{PostgresLoader, SchemaCreator};
