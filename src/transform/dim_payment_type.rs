//! Dimensão de tipos de pagamento: valores distintos observados nos dados

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::error::Result;
use crate::extract::PaymentRecord;
use crate::types::{DataRow, DataValue, Table};

/// Categorização fixa dos meios de pagamento conhecidos
const PAYMENT_CATEGORIES: &[(&str, &str)] = &[
    ("credit_card", "Credit"),
    ("boleto", "Cash/Banking"),
    ("debit_card", "Debit"),
    ("voucher", "Voucher"),
    ("not_defined", "Unknown"),
];

/// Dimensão de tipos de pagamento, com o mapa payment_type → payment_type_key
#[derive(Debug, Clone)]
pub struct PaymentTypeDimension {
    pub table: Table,
    pub keys: HashMap<String, i64>,
}

/// Construtor da dimensão de tipos de pagamento
///
/// A dimensão é orientada pelos dados: qualquer valor distinto observado no
/// extrato vira uma linha, mesmo fora do lookup fixo (categoria `Other`),
/// garantindo que todo fato consiga resolver sua FK.
#[derive(Debug, Clone)]
pub struct PaymentTypeDimensionBuilder {
    categories: HashMap<&'static str, &'static str>,
}

impl Default for PaymentTypeDimensionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentTypeDimensionBuilder {
    pub fn new() -> Self {
        Self {
            categories: PAYMENT_CATEGORIES.iter().copied().collect(),
        }
    }

    pub fn build(&self, payments: &[PaymentRecord]) -> Result<PaymentTypeDimension> {
        info!("Construindo dimensão de tipos de pagamento");

        // Valores distintos na ordem da primeira ocorrência (determinístico)
        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        for payment in payments {
            if let Some(payment_type) = payment.payment_type.as_deref() {
                if !payment_type.is_empty() && seen.insert(payment_type) {
                    distinct.push(payment_type.to_string());
                }
            }
        }

        let mut unmapped = 0usize;
        let mut rows = Vec::with_capacity(distinct.len());
        let mut keys = HashMap::with_capacity(distinct.len());
        let created_at = Utc::now();

        for (index, payment_type) in distinct.iter().enumerate() {
            let payment_type_key = index as i64 + 1;
            keys.insert(payment_type.clone(), payment_type_key);

            let category = match self.categories.get(payment_type.as_str()) {
                Some(category) => *category,
                None => {
                    unmapped += 1;
                    "Other"
                }
            };

            let mut row = DataRow::new();
            row.insert(
                "payment_type_key".to_string(),
                DataValue::Integer(payment_type_key),
            );
            row.insert(
                "payment_type".to_string(),
                DataValue::String(payment_type.clone()),
            );
            row.insert(
                "payment_category".to_string(),
                DataValue::String(category.to_string()),
            );
            row.insert("created_at".to_string(), DataValue::Timestamp(created_at));
            rows.push(row);
        }

        if unmapped > 0 {
            warn!(unmapped, "tipos de pagamento sem categoria mapeada");
        }
        info!(rows = rows.len(), "Dimensão de tipos de pagamento construída");

        let table = Table::new(
            "dim_payment_type",
            vec![
                "payment_type_key",
                "payment_type",
                "payment_category",
                "created_at",
            ],
            rows,
        );

        Ok(PaymentTypeDimension { table, keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(order_id: &str, payment_type: Option<&str>) -> PaymentRecord {
        PaymentRecord {
            order_id: order_id.to_string(),
            payment_sequential: Some(1),
            payment_type: payment_type.map(String::from),
            payment_installments: Some(1),
            payment_value: 50.0,
        }
    }

    #[test]
    fn test_distinct_types_first_seen_order() {
        let builder = PaymentTypeDimensionBuilder::new();
        let dim = builder
            .build(&[
                payment("o1", Some("credit_card")),
                payment("o2", Some("boleto")),
                payment("o3", Some("credit_card")),
                payment("o4", None),
            ])
            .unwrap();

        assert_eq!(dim.table.len(), 2);
        assert_eq!(dim.keys["credit_card"], 1);
        assert_eq!(dim.keys["boleto"], 2);
        assert_eq!(
            dim.table.value(0, "payment_category"),
            DataValue::String("Credit".to_string())
        );
        assert_eq!(
            dim.table.value(1, "payment_category"),
            DataValue::String("Cash/Banking".to_string())
        );
    }

    #[test]
    fn test_unmapped_type_still_gets_row() {
        let builder = PaymentTypeDimensionBuilder::new();
        let dim = builder.build(&[payment("o1", Some("pix"))]).unwrap();

        assert_eq!(dim.table.len(), 1);
        assert_eq!(dim.keys["pix"], 1);
        assert_eq!(
            dim.table.value(0, "payment_category"),
            DataValue::String("Other".to_string())
        );
    }
}
