//! Extração de pedidos com validação de qualidade de dados

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::{ExtractError, Result};
use crate::extract::csv::{datetime_format, opt_datetime_format, read_csv};
use crate::traits::Extractor;

/// Registro de pedido do extrato de origem
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    #[serde(with = "datetime_format")]
    pub order_purchase_timestamp: NaiveDateTime,
    #[serde(deserialize_with = "opt_datetime_format::deserialize", default)]
    pub order_approved_at: Option<NaiveDateTime>,
    #[serde(deserialize_with = "opt_datetime_format::deserialize", default)]
    pub order_delivered_carrier_date: Option<NaiveDateTime>,
    #[serde(deserialize_with = "opt_datetime_format::deserialize", default)]
    pub order_delivered_customer_date: Option<NaiveDateTime>,
    #[serde(deserialize_with = "opt_datetime_format::deserialize", default)]
    pub order_estimated_delivery_date: Option<NaiveDateTime>,
}

/// Extrator de pedidos
#[derive(Debug, Clone)]
pub struct OrdersExtractor {
    file_path: String,
}

impl OrdersExtractor {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    fn validate(&self, records: &[OrderRecord]) -> Result<()> {
        let mut seen = HashSet::new();
        let duplicates = records
            .iter()
            .filter(|r| !seen.insert(r.order_id.as_str()))
            .count();
        if duplicates > 0 {
            warn!(duplicates, "order_ids duplicados no extrato de pedidos");
        }

        let missing_order_id = records.iter().filter(|r| r.order_id.is_empty()).count();
        if missing_order_id > 0 {
            return Err(ExtractError::CriticalFieldNull {
                table: "orders".to_string(),
                column: "order_id".to_string(),
                count: missing_order_id,
            }
            .into());
        }

        let missing_customer_id = records.iter().filter(|r| r.customer_id.is_empty()).count();
        if missing_customer_id > 0 {
            return Err(ExtractError::CriticalFieldNull {
                table: "orders".to_string(),
                column: "customer_id".to_string(),
                count: missing_customer_id,
            }
            .into());
        }

        Ok(())
    }
}

#[async_trait]
impl Extractor for OrdersExtractor {
    type Record = OrderRecord;

    async fn extract(&self) -> Result<Vec<OrderRecord>> {
        info!(path = %self.file_path, "Iniciando extração de pedidos");

        let records: Vec<OrderRecord> = read_csv(&self.file_path)?;
        info!(rows = records.len(), "Pedidos carregados");

        self.validate(&records)?;

        info!(rows = records.len(), "Extração de pedidos concluída");
        Ok(records)
    }

    fn entity(&self) -> &'static str {
        "orders"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn header() -> &'static str {
        "order_id,customer_id,order_status,order_purchase_timestamp,order_approved_at,\
         order_delivered_carrier_date,order_delivered_customer_date,order_estimated_delivery_date"
    }

    #[tokio::test]
    async fn test_extract_orders() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", header()).unwrap();
        writeln!(
            temp_file,
            "o1,c1,delivered,2017-10-02 10:56:33,2017-10-02 11:07:15,\
             2017-10-04 19:55:00,2017-10-10 21:25:13,2017-10-18 00:00:00"
        )
        .unwrap();
        writeln!(
            temp_file,
            "o2,c2,canceled,2017-11-05 08:10:00,,,,2017-11-20 00:00:00"
        )
        .unwrap();

        let extractor = OrdersExtractor::new(temp_file.path().to_string_lossy());
        let orders = extractor.extract().await.unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_status, "delivered");
        assert!(orders[0].order_delivered_customer_date.is_some());
        assert!(orders[1].order_delivered_customer_date.is_none());
    }

    #[tokio::test]
    async fn test_null_customer_id_is_fatal() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", header()).unwrap();
        writeln!(
            temp_file,
            "o1,,delivered,2017-10-02 10:56:33,,,,2017-10-18 00:00:00"
        )
        .unwrap();

        let extractor = OrdersExtractor::new(temp_file.path().to_string_lossy());
        assert!(extractor.extract().await.is_err());
    }
}
