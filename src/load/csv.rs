//! Loader CSV: escreve cada tabela do warehouse em staging

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::error::{LoadError, Result};
use crate::traits::Loader;
use crate::types::{PipelineResult, Table};

/// Escreve cada tabela em `<output_dir>/<nome>.csv`, na ordem de colunas
/// carregada pela própria tabela
#[derive(Debug, Clone)]
pub struct CsvLoader {
    output_dir: PathBuf,
}

impl CsvLoader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn output_path(&self, table: &Table) -> PathBuf {
        self.output_dir.join(format!("{}.csv", table.name))
    }
}

#[async_trait]
impl Loader for CsvLoader {
    async fn load(&self, table: &Table) -> Result<PipelineResult> {
        let start = Instant::now();
        let path = self.output_path(table);
        info!(table = %table.name, path = %path.display(), "Escrevendo tabela em staging");

        std::fs::create_dir_all(&self.output_dir)?;

        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| LoadError::WriteError(format!("{}: {}", path.display(), e)))?;

        writer
            .write_record(&table.columns)
            .map_err(|e| LoadError::WriteError(e.to_string()))?;

        for row in &table.rows {
            let record: Vec<String> = table
                .columns
                .iter()
                .map(|column| {
                    row.get(column)
                        .and_then(|v| v.as_string())
                        .unwrap_or_default()
                })
                .collect();
            writer
                .write_record(&record)
                .map_err(|e| LoadError::WriteError(e.to_string()))?;
        }

        writer
            .flush()
            .map_err(|e| LoadError::WriteError(e.to_string()))?;

        let result = PipelineResult {
            rows_processed: table.len(),
            rows_successful: table.len(),
            rows_failed: 0,
            execution_time_ms: start.elapsed().as_millis() as u64,
            errors: Vec::new(),
        };
        info!(table = %table.name, rows = result.rows_successful, "Tabela escrita");
        Ok(result)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.output_dir.exists() || self.output_dir.parent().map_or(true, |p| p.exists()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataRow, DataValue};
    use tempfile::TempDir;

    fn sample_table() -> Table {
        let mut row1 = DataRow::new();
        row1.insert("id".to_string(), DataValue::Integer(1));
        row1.insert("name".to_string(), DataValue::String("abc".to_string()));
        row1.insert("score".to_string(), DataValue::Float(4.5));

        let mut row2 = DataRow::new();
        row2.insert("id".to_string(), DataValue::Integer(2));
        row2.insert("name".to_string(), DataValue::Null);
        row2.insert("score".to_string(), DataValue::Null);

        Table::new("dim_test", vec!["id", "name", "score"], vec![row1, row2])
    }

    #[tokio::test]
    async fn test_csv_loader_writes_in_column_order() {
        let dir = TempDir::new().unwrap();
        let loader = CsvLoader::new(dir.path());

        let result = loader.load(&sample_table()).await.unwrap();
        assert_eq!(result.rows_successful, 2);

        let content = std::fs::read_to_string(dir.path().join("dim_test.csv")).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("id,name,score"));
        assert_eq!(lines.next(), Some("1,abc,4.5"));
        // Nulos viram campos vazios
        assert_eq!(lines.next(), Some("2,,"));
    }

    #[tokio::test]
    async fn test_csv_loader_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("staging/novo");
        let loader = CsvLoader::new(&nested);

        loader.load(&sample_table()).await.unwrap();
        assert!(nested.join("dim_test.csv").exists());
    }
}
