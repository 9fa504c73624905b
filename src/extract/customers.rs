//! Extração de clientes com checagens de deduplicação

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::{ExtractError, Result};
use crate::extract::csv::read_csv;
use crate::traits::Extractor;

/// Registro de cliente do extrato de origem
///
/// `customer_id` identifica o cliente em um pedido; `customer_unique_id`
/// identifica a pessoa através de pedidos repetidos.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub customer_unique_id: String,
    #[serde(default)]
    pub customer_zip_code_prefix: Option<String>,
    #[serde(default)]
    pub customer_city: Option<String>,
    #[serde(default)]
    pub customer_state: Option<String>,
}

/// Extrator de clientes
#[derive(Debug, Clone)]
pub struct CustomersExtractor {
    file_path: String,
}

impl CustomersExtractor {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    fn validate(&self, records: &[CustomerRecord]) -> Result<()> {
        let mut seen = HashSet::new();
        let duplicates = records
            .iter()
            .filter(|r| !seen.insert(r.customer_id.as_str()))
            .count();
        if duplicates > 0 {
            // Esperado quando a mesma pessoa compra mais de uma vez
            warn!(duplicates, "customer_ids duplicados no extrato de clientes");
        }

        let unique_people: HashSet<&str> = records
            .iter()
            .map(|r| r.customer_unique_id.as_str())
            .collect();
        let repeat_records = records.len() - unique_people.len();
        if !records.is_empty() {
            info!(
                repeat_records,
                percent = %format!("{:.1}", repeat_records as f64 / records.len() as f64 * 100.0),
                "Registros de clientes recorrentes"
            );
        }

        for (column, missing) in [
            (
                "customer_id",
                records.iter().filter(|r| r.customer_id.is_empty()).count(),
            ),
            (
                "customer_unique_id",
                records
                    .iter()
                    .filter(|r| r.customer_unique_id.is_empty())
                    .count(),
            ),
        ] {
            if missing > 0 {
                return Err(ExtractError::CriticalFieldNull {
                    table: "customers".to_string(),
                    column: column.to_string(),
                    count: missing,
                }
                .into());
            }
        }

        let missing_state = records
            .iter()
            .filter(|r| r.customer_state.as_deref().unwrap_or("").is_empty())
            .count();
        if missing_state > 0 {
            warn!(missing_state, "clientes sem customer_state");
        }

        Ok(())
    }
}

#[async_trait]
impl Extractor for CustomersExtractor {
    type Record = CustomerRecord;

    async fn extract(&self) -> Result<Vec<CustomerRecord>> {
        info!(path = %self.file_path, "Iniciando extração de clientes");

        let records: Vec<CustomerRecord> = read_csv(&self.file_path)?;
        info!(rows = records.len(), "Clientes carregados");

        self.validate(&records)?;

        info!(rows = records.len(), "Extração de clientes concluída");
        Ok(records)
    }

    fn entity(&self) -> &'static str {
        "customers"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "customer_id,customer_unique_id,customer_zip_code_prefix,customer_city,customer_state";

    #[tokio::test]
    async fn test_extract_customers() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", HEADER).unwrap();
        writeln!(temp_file, "c1,u1,01310,sao paulo,SP").unwrap();
        writeln!(temp_file, "c2,u1,01310,sao paulo,SP").unwrap();

        let extractor = CustomersExtractor::new(temp_file.path().to_string_lossy());
        let customers = extractor.extract().await.unwrap();

        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].customer_state.as_deref(), Some("SP"));
        assert_eq!(customers[1].customer_unique_id, "u1");
    }

    #[tokio::test]
    async fn test_null_unique_id_is_fatal() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", HEADER).unwrap();
        writeln!(temp_file, "c1,,01310,sao paulo,SP").unwrap();

        let extractor = CustomersExtractor::new(temp_file.path().to_string_lossy());
        assert!(extractor.extract().await.is_err());
    }
}
