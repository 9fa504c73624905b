//! Retenção por coorte de aquisição: clientes ativos por mês de deslocamento

use chrono::{Datelike, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

use crate::error::{Result, TransformError};
use crate::extract::OrderRecord;
use crate::transform::round2;
use crate::types::{DataRow, DataValue, Table};

/// Construtor do fato de retenção por coorte
///
/// Depende da dimensão de clientes já construída: o mês de coorte vem do
/// first_order_date calculado lá.
#[derive(Debug, Clone, Default)]
pub struct CohortRetentionBuilder;

impl CohortRetentionBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        orders: &[OrderRecord],
        first_order_dates: &HashMap<String, chrono::NaiveDateTime>,
    ) -> Result<Table> {
        info!(orders = orders.len(), "Construindo retenção por coorte");

        // Coorte = mês do primeiro pedido do cliente
        let cohort_months: HashMap<&str, NaiveDate> = first_order_dates
            .iter()
            .map(|(customer_id, first)| (customer_id.as_str(), month_floor(first.date())))
            .collect();

        // Inner join pedidos → coortes; clientes fora da dimensão ficam de fora
        let mut skipped = 0usize;
        let mut groups: BTreeMap<(NaiveDate, i64), HashSet<&str>> = BTreeMap::new();
        for order in orders {
            let Some(&cohort_month) = cohort_months.get(order.customer_id.as_str()) else {
                skipped += 1;
                continue;
            };
            let order_month = month_floor(order.order_purchase_timestamp.date());
            let offset = month_offset(cohort_month, order_month);

            groups
                .entry((cohort_month, offset))
                .or_default()
                .insert(order.customer_id.as_str());
        }
        if skipped > 0 {
            warn!(skipped, "pedidos de clientes fora da dimensão ignorados");
        }

        // Tamanho da coorte = clientes distintos no mês 0 de aquisição
        let cohort_sizes: HashMap<NaiveDate, usize> = groups
            .iter()
            .filter(|((_, offset), _)| *offset == 0)
            .map(|((cohort, _), customers)| (*cohort, customers.len()))
            .collect();

        let mut rows = Vec::with_capacity(groups.len());
        let created_at = Utc::now();

        for (index, ((cohort_month, offset), customers)) in groups.iter().enumerate() {
            let retained = customers.len() as i64;
            let size = cohort_sizes.get(cohort_month).copied().ok_or_else(|| {
                TransformError::ProcessingError(format!(
                    "coorte {} sem linha de mês zero",
                    cohort_month
                ))
            })? as i64;
            let retention_rate = round2(retained as f64 / size as f64 * 100.0);

            let mut row = DataRow::new();
            row.insert(
                "cohort_retention_key".to_string(),
                DataValue::Integer(index as i64 + 1),
            );
            row.insert("cohort_month".to_string(), DataValue::Date(*cohort_month));
            row.insert(
                "months_since_first_purchase".to_string(),
                DataValue::Integer(*offset),
            );
            row.insert("cohort_size".to_string(), DataValue::Integer(size));
            row.insert("retained_customers".to_string(), DataValue::Integer(retained));
            row.insert("retention_rate".to_string(), DataValue::Float(retention_rate));
            row.insert("created_at".to_string(), DataValue::Timestamp(created_at));
            rows.push(row);
        }

        info!(
            rows = rows.len(),
            cohorts = cohort_sizes.len(),
            "Retenção por coorte construída"
        );

        Ok(Table::new(
            "fact_cohort_retention",
            vec![
                "cohort_retention_key",
                "cohort_month",
                "months_since_first_purchase",
                "cohort_size",
                "retained_customers",
                "retention_rate",
                "created_at",
            ],
            rows,
        ))
    }
}

fn month_floor(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Diferença inteira de meses; nunca negativa por construção, já que o mês
/// de coorte é o mês do primeiro pedido
fn month_offset(cohort: NaiveDate, order: NaiveDate) -> i64 {
    (order.year() as i64 - cohort.year() as i64) * 12
        + (order.month() as i64 - cohort.month() as i64)
}
