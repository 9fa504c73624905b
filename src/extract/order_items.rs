//! Extração de itens de pedido com cálculo de receita por item

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{ExtractError, Result};
use crate::extract::csv::{opt_datetime_format, read_csv};
use crate::traits::Extractor;

/// Registro de item de pedido, com `item_total` derivado na extração
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRecord {
    pub order_id: String,
    pub order_item_id: i64,
    pub product_id: String,
    pub seller_id: String,
    #[serde(deserialize_with = "opt_datetime_format::deserialize", default)]
    pub shipping_limit_date: Option<NaiveDateTime>,
    pub price: f64,
    pub freight_value: f64,
    /// price + freight_value, preenchido após a leitura
    #[serde(skip)]
    pub item_total: f64,
}

/// Extrator de itens de pedido
#[derive(Debug, Clone)]
pub struct OrderItemsExtractor {
    file_path: String,
}

impl OrderItemsExtractor {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    fn validate(&self, records: &[OrderItemRecord]) -> Result<()> {
        let negative_prices = records.iter().filter(|r| r.price < 0.0).count();
        if negative_prices > 0 {
            warn!(negative_prices, "itens com preço negativo");
        }

        let zero_prices = records.iter().filter(|r| r.price == 0.0).count();
        if zero_prices > 0 {
            warn!(zero_prices, "itens com preço zero");
        }

        let missing_order_id = records.iter().filter(|r| r.order_id.is_empty()).count();
        if missing_order_id > 0 {
            return Err(ExtractError::CriticalFieldNull {
                table: "order_items".to_string(),
                column: "order_id".to_string(),
                count: missing_order_id,
            }
            .into());
        }

        let missing_product_id = records.iter().filter(|r| r.product_id.is_empty()).count();
        if missing_product_id > 0 {
            return Err(ExtractError::CriticalFieldNull {
                table: "order_items".to_string(),
                column: "product_id".to_string(),
                count: missing_product_id,
            }
            .into());
        }

        Ok(())
    }
}

#[async_trait]
impl Extractor for OrderItemsExtractor {
    type Record = OrderItemRecord;

    async fn extract(&self) -> Result<Vec<OrderItemRecord>> {
        info!(path = %self.file_path, "Iniciando extração de itens de pedido");

        let mut records: Vec<OrderItemRecord> = read_csv(&self.file_path)?;
        info!(rows = records.len(), "Itens carregados");

        for record in &mut records {
            record.item_total = record.price + record.freight_value;
        }

        self.validate(&records)?;

        info!(rows = records.len(), "Extração de itens concluída");
        Ok(records)
    }

    fn entity(&self) -> &'static str {
        "order_items"
    }
}
