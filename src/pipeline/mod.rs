//! Orquestração do pipeline completo: Extract → Transform → Load

use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{error, info};

use crate::config::EtlConfig;
use crate::error::{EtlError, Result};
use crate::extract::{extract_all, SourceTables};
use crate::traits::Loader;
use crate::transform::{TransformOrchestrator, Warehouse};
use crate::types::{PipelineResult, PipelineState};

/// Pipeline batch do warehouse
///
/// Cada execução recomputa o warehouse inteiro a partir dos extratos; não
/// há processamento incremental nem retomada parcial. Falhas de extração e
/// transformação abortam a execução.
pub struct WarehousePipeline<L: Loader> {
    config: EtlConfig,
    loader: L,
    state: Arc<Mutex<PipelineState>>,
}

impl<L: Loader> WarehousePipeline<L> {
    pub fn new(config: EtlConfig, loader: L) -> Self {
        Self {
            config,
            loader,
            state: Arc::new(Mutex::new(PipelineState::Idle)),
        }
    }

    /// Estado atual do pipeline
    pub fn state(&self) -> PipelineState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or(PipelineState::Failed("mutex envenenado".to_string()))
    }

    fn set_state(&self, state: PipelineState) {
        if let Ok(mut current) = self.state.lock() {
            info!(state = %state, "Estado do pipeline");
            *current = state;
        }
    }

    /// Executa as três fases em ordem estrita de dependência
    pub async fn run(&self) -> Result<PipelineResult> {
        let start = Instant::now();
        info!("Iniciando pipeline do warehouse");

        match self.execute().await {
            Ok(mut result) => {
                result.execution_time_ms = start.elapsed().as_millis() as u64;
                self.set_state(PipelineState::Completed);
                info!(
                    rows = result.rows_successful,
                    failed = result.rows_failed,
                    elapsed_ms = result.execution_time_ms,
                    "Pipeline concluído"
                );
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, code = e.error_code(), "Pipeline falhou");
                self.set_state(PipelineState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<PipelineResult> {
        self.set_state(PipelineState::Extracting);
        let sources = extract_all(&self.config).await?;

        self.set_state(PipelineState::Transforming);
        let warehouse = TransformOrchestrator::new(self.config.clone()).run(&sources)?;

        self.set_state(PipelineState::Loading);
        let result = self.load_warehouse(&sources, warehouse).await?;

        Ok(result)
    }

    async fn load_warehouse(
        &self,
        sources: &SourceTables,
        warehouse: Warehouse,
    ) -> Result<PipelineResult> {
        if !self.loader.health_check().await? {
            return Err(EtlError::Pipeline(
                "destino de carga indisponível".to_string(),
            ));
        }

        let mut total = PipelineResult::new();
        let mut summary = Vec::new();

        for table in warehouse.into_tables() {
            let name = table.name.clone();
            let result = self.loader.load(&table).await?;
            total.rows_processed += result.rows_processed;
            total.rows_successful += result.rows_successful;
            total.rows_failed += result.rows_failed;
            total.errors.extend(result.errors);
            summary.push((name, result.rows_successful));
        }

        self.loader.finalize().await?;

        info!(source_orders = sources.orders.len(), "Resumo da carga:");
        for (name, rows) in &summary {
            info!(table = %name, rows = *rows, "  tabela carregada");
        }

        Ok(total)
    }
}
