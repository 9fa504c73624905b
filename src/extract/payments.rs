//! Extração de pagamentos com checagens de valores e parcelas

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::{ExtractError, Result};
use crate::extract::csv::read_csv;
use crate::traits::Extractor;

/// Registro de pagamento do extrato de origem
///
/// Um pedido pode ter vários pagamentos (vouchers combinados com cartão,
/// por exemplo); a agregação por pedido acontece na transformação.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRecord {
    pub order_id: String,
    #[serde(default)]
    pub payment_sequential: Option<i64>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub payment_installments: Option<i64>,
    pub payment_value: f64,
}

/// Extrator de pagamentos
#[derive(Debug, Clone)]
pub struct PaymentsExtractor {
    file_path: String,
}

impl PaymentsExtractor {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    fn validate(&self, records: &[PaymentRecord]) -> Result<()> {
        let missing_order_id = records.iter().filter(|r| r.order_id.is_empty()).count();
        if missing_order_id > 0 {
            return Err(ExtractError::CriticalFieldNull {
                table: "payments".to_string(),
                column: "order_id".to_string(),
                count: missing_order_id,
            }
            .into());
        }

        let negative_values = records.iter().filter(|r| r.payment_value < 0.0).count();
        if negative_values > 0 {
            error!(negative_values, "pagamentos com valor negativo");
        }

        let zero_values = records.iter().filter(|r| r.payment_value == 0.0).count();
        if zero_values > 0 {
            warn!(zero_values, "pagamentos com valor zero (vouchers integrais)");
        }

        let invalid_installments = records
            .iter()
            .filter(|r| r.payment_installments.is_some_and(|n| n < 1))
            .count();
        if invalid_installments > 0 {
            warn!(invalid_installments, "pagamentos com parcelas menores que 1");
        }

        let missing_type = records
            .iter()
            .filter(|r| r.payment_type.as_deref().unwrap_or("").is_empty())
            .count();
        if missing_type > 0 {
            warn!(missing_type, "pagamentos sem payment_type");
        }

        Ok(())
    }
}

#[async_trait]
impl Extractor for PaymentsExtractor {
    type Record = PaymentRecord;

    async fn extract(&self) -> Result<Vec<PaymentRecord>> {
        info!(path = %self.file_path, "Iniciando extração de pagamentos");

        let records: Vec<PaymentRecord> = read_csv(&self.file_path)?;
        info!(rows = records.len(), "Pagamentos carregados");

        self.validate(&records)?;

        info!(rows = records.len(), "Extração de pagamentos concluída");
        Ok(records)
    }

    fn entity(&self) -> &'static str {
        "payments"
    }
}
