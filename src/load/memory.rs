//! Loader em memória para testes e inspeção do warehouse

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::info;

use crate::error::{LoadError, Result};
use crate::traits::Loader;
use crate::types::{PipelineResult, Table};

/// Guarda as tabelas carregadas em um mapa nome → tabela
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    tables: Arc<Mutex<HashMap<String, Table>>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cópia da tabela carregada, se existir
    pub fn table(&self, name: &str) -> Option<Table> {
        self.tables.lock().ok()?.get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables
            .lock()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tables.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Loader for MemoryLoader {
    async fn load(&self, table: &Table) -> Result<PipelineResult> {
        let start = Instant::now();
        let rows = table.len();

        let mut tables = self
            .tables
            .lock()
            .map_err(|_| LoadError::WriteError("mutex do loader envenenado".to_string()))?;
        tables.insert(table.name.clone(), table.clone());

        info!(table = %table.name, rows, "Tabela carregada em memória");
        Ok(PipelineResult {
            rows_processed: rows,
            rows_successful: rows,
            rows_failed: 0,
            execution_time_ms: start.elapsed().as_millis() as u64,
            errors: Vec::new(),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.tables.try_lock().is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataRow, DataValue};

    #[tokio::test]
    async fn test_memory_loader_roundtrip() {
        let loader = MemoryLoader::new();
        assert!(loader.is_empty());

        let mut row = DataRow::new();
        row.insert("a".to_string(), DataValue::Integer(1));
        let table = Table::new("dim_test", vec!["a"], vec![row]);

        let result = loader.load(&table).await.unwrap();
        assert_eq!(result.rows_successful, 1);
        assert_eq!(loader.len(), 1);

        let stored = loader.table("dim_test").unwrap();
        assert_eq!(stored.value(0, "a"), DataValue::Integer(1));
        assert!(loader.table("inexistente").is_none());
    }

    #[tokio::test]
    async fn test_memory_loader_health_check() {
        let loader = MemoryLoader::new();
        assert!(loader.health_check().await.unwrap());
    }
}
