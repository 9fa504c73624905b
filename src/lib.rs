//! # ecomdw
//!
//! Pipeline ETL batch que transforma os seis extratos CSV de e-commerce
//! brasileiro (pedidos, itens, clientes, produtos, pagamentos, avaliações)
//! em um data warehouse dimensional em esquema estrela.
//!
//! As três fases rodam em ordem estrita de dependência:
//!
//! - **Extract**: leitura tipada dos CSVs com validação de campos críticos
//! - **Transform**: dimensões (datas, produtos, tipos de pagamento, clientes
//!   com CLV e segmentação) e fatos (pedidos, retenção por coorte)
//! - **Load**: staging em CSV, memória, ou PostgreSQL (feature `database`)
//!
//! ## Exemplo
//!
//! ```rust,no_run
//! use ecomdw::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> ecomdw::Result<()> {
//!     ecomdw::logging::init();
//!
//!     let config = EtlConfig::builder()
//!         .date_range("2016-01-01", "2018-12-31")
//!         .build()?;
//!
//!     let loader = CsvLoader::new(config.data_paths.staging_dir.clone());
//!     let pipeline = WarehousePipeline::new(config, loader);
//!     let result = pipeline.run().await?;
//!
//!     println!("Linhas carregadas: {}", result.rows_successful);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod pipeline;
pub mod traits;
pub mod transform;
pub mod types;

pub use config::EtlConfig;
pub use error::{EtlError, Result};
pub use pipeline::WarehousePipeline;
pub use types::{DataRow, DataValue, PipelineResult, PipelineState, Table};

/// Re-exportações de conveniência
pub mod prelude {
    pub use crate::config::{EtlConfig, EtlConfigBuilder};
    pub use crate::error::{EtlError, Result};
    pub use crate::extract::{extract_all, SourceTables};
    pub use crate::load::{CsvLoader, MemoryLoader};
    pub use crate::pipeline::WarehousePipeline;
    pub use crate::traits::{Extractor, Loader};
    pub use crate::transform::{TransformOrchestrator, Warehouse};
    pub use crate::types::{DataRow, DataValue, PipelineResult, PipelineState, Table};

    #[cfg(feature = "database")]
    pub use crate::load::{PostgresLoader, SchemaCreator};
}
