//! Fase de transformação: construção das dimensões e dos fatos do warehouse

pub mod dim_customers;
pub mod dim_date;
pub mod dim_payment_type;
pub mod dim_products;
pub mod fact_cohort_retention;
pub mod fact_orders;

pub use dim_customers::{CustomerDimension, CustomerDimensionBuilder};
pub use dim_date::{DateDimension, DateDimensionBuilder};
pub use dim_payment_type::{PaymentTypeDimension, PaymentTypeDimensionBuilder};
pub use dim_products::{ProductDimension, ProductDimensionBuilder};
pub use fact_cohort_retention::CohortRetentionBuilder;
pub use fact_orders::FactOrdersBuilder;

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

use crate::config::EtlConfig;
use crate::error::Result;
use crate::extract::SourceTables;
use crate::types::Table;

/// Arredonda para duas casas decimais (valores monetários e percentuais)
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mapas imutáveis chave de negócio → chave surrogate, construídos uma vez
/// por dimensão e emprestados ao construtor do fato
#[derive(Debug)]
pub struct DimensionKeys<'a> {
    pub customers: &'a HashMap<String, i64>,
    pub products: &'a HashMap<String, i64>,
    pub payment_types: &'a HashMap<String, i64>,
    pub dates: &'a HashMap<NaiveDate, i64>,
}

/// Warehouse em memória: as seis tabelas transformadas
#[derive(Debug, Clone)]
pub struct Warehouse {
    pub dim_date: Table,
    pub dim_products: Table,
    pub dim_payment_type: Table,
    pub dim_customers: Table,
    pub fact_orders: Table,
    pub fact_cohort_retention: Table,
}

impl Warehouse {
    /// Tabelas na ordem de carga (dimensões antes dos fatos)
    pub fn into_tables(self) -> Vec<Table> {
        vec![
            self.dim_date,
            self.dim_products,
            self.dim_payment_type,
            self.dim_customers,
            self.fact_orders,
            self.fact_cohort_retention,
        ]
    }

    pub fn tables(&self) -> [&Table; 6] {
        [
            &self.dim_date,
            &self.dim_products,
            &self.dim_payment_type,
            &self.dim_customers,
            &self.fact_orders,
            &self.fact_cohort_retention,
        ]
    }
}

/// Orquestrador da transformação
///
/// Apenas sequenciamento: dimensões primeiro (datas, produtos, tipos de
/// pagamento, clientes), depois os fatos que dependem delas. Nenhuma regra
/// de negócio própria.
#[derive(Debug, Clone)]
pub struct TransformOrchestrator {
    config: EtlConfig,
}

impl TransformOrchestrator {
    pub fn new(config: EtlConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, sources: &SourceTables) -> Result<Warehouse> {
        info!("Iniciando fase de transformação");

        let dim_date = DateDimensionBuilder::new(&self.config.date_dimension)?.build()?;
        let dim_products = ProductDimensionBuilder::new().build(&sources.products)?;
        let dim_payment_type = PaymentTypeDimensionBuilder::new().build(&sources.payments)?;
        let dim_customers = CustomerDimensionBuilder::new(self.config.business_rules.clone())
            .build(&sources.customers, &sources.orders, &sources.order_items)?;

        let keys = DimensionKeys {
            customers: &dim_customers.keys,
            products: &dim_products.keys,
            payment_types: &dim_payment_type.keys,
            dates: &dim_date.keys,
        };

        let fact_orders = FactOrdersBuilder::new().build(
            &sources.orders,
            &sources.order_items,
            &sources.payments,
            &sources.reviews,
            &keys,
        )?;
        let fact_cohort_retention = CohortRetentionBuilder::new()
            .build(&sources.orders, &dim_customers.first_order_dates)?;

        let warehouse = Warehouse {
            dim_date: dim_date.table,
            dim_products: dim_products.table,
            dim_payment_type: dim_payment_type.table,
            dim_customers: dim_customers.table,
            fact_orders,
            fact_cohort_retention,
        };

        for table in warehouse.tables() {
            info!(table = %table.name, rows = table.len(), "Tabela transformada");
        }
        info!("Fase de transformação concluída");

        Ok(warehouse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{
        CustomerRecord, OrderItemRecord, OrderRecord, PaymentRecord, ProductRecord, ReviewRecord,
    };
    use crate::types::DataValue;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn sources_fixture() -> SourceTables {
        SourceTables {
            orders: vec![
                OrderRecord {
                    order_id: "o1".to_string(),
                    customer_id: "c1".to_string(),
                    order_status: "delivered".to_string(),
                    order_purchase_timestamp: ts("2017-05-10 10:00:00"),
                    order_approved_at: None,
                    order_delivered_carrier_date: None,
                    order_delivered_customer_date: Some(ts("2017-05-18 16:00:00")),
                    order_estimated_delivery_date: Some(ts("2017-05-20 00:00:00")),
                },
                OrderRecord {
                    order_id: "o2".to_string(),
                    customer_id: "c2".to_string(),
                    order_status: "canceled".to_string(),
                    order_purchase_timestamp: ts("2017-06-01 08:00:00"),
                    order_approved_at: None,
                    order_delivered_carrier_date: None,
                    order_delivered_customer_date: None,
                    order_estimated_delivery_date: None,
                },
            ],
            order_items: vec![OrderItemRecord {
                order_id: "o1".to_string(),
                order_item_id: 1,
                product_id: "p1".to_string(),
                seller_id: "s1".to_string(),
                shipping_limit_date: None,
                price: 45.0,
                freight_value: 5.0,
                item_total: 50.0,
            }],
            customers: vec![
                CustomerRecord {
                    customer_id: "c1".to_string(),
                    customer_unique_id: "u1".to_string(),
                    customer_zip_code_prefix: None,
                    customer_city: Some("sao paulo".to_string()),
                    customer_state: Some("SP".to_string()),
                },
                CustomerRecord {
                    customer_id: "c2".to_string(),
                    customer_unique_id: "u2".to_string(),
                    customer_zip_code_prefix: None,
                    customer_city: None,
                    customer_state: Some("BA".to_string()),
                },
            ],
            products: vec![ProductRecord {
                product_id: "p1".to_string(),
                product_category_name: Some("perfumaria".to_string()),
                product_photos_qty: Some(1),
                product_weight_g: Some(200.0),
                product_length_cm: Some(10.0),
                product_height_cm: Some(5.0),
                product_width_cm: Some(8.0),
                product_volume_cm3: Some(400.0),
                has_photos: true,
            }],
            payments: vec![PaymentRecord {
                order_id: "o1".to_string(),
                payment_sequential: Some(1),
                payment_type: Some("credit_card".to_string()),
                payment_installments: Some(2),
                payment_value: 50.0,
            }],
            reviews: vec![ReviewRecord {
                review_id: "r1".to_string(),
                order_id: "o1".to_string(),
                review_score: Some(5),
                review_comment_title: None,
                review_comment_message: None,
                review_creation_date: None,
                review_answer_timestamp: None,
            }],
        }
    }

    #[test]
    fn test_orchestrator_builds_all_tables() {
        let config = EtlConfig::builder()
            .date_range("2017-01-01", "2017-12-31")
            .build()
            .unwrap();
        let warehouse = TransformOrchestrator::new(config)
            .run(&sources_fixture())
            .unwrap();

        assert_eq!(warehouse.dim_date.len(), 365);
        assert_eq!(warehouse.dim_products.len(), 1);
        assert_eq!(warehouse.dim_payment_type.len(), 1);
        assert_eq!(warehouse.dim_customers.len(), 2);
        // O fato preserva exatamente o grão dos pedidos extraídos
        assert_eq!(warehouse.fact_orders.len(), 2);
        assert_eq!(warehouse.fact_cohort_retention.len(), 2);
    }

    #[test]
    fn test_fact_foreign_keys_resolve_against_dimensions() {
        let config = EtlConfig::builder()
            .date_range("2017-01-01", "2017-12-31")
            .build()
            .unwrap();
        let warehouse = TransformOrchestrator::new(config)
            .run(&sources_fixture())
            .unwrap();

        let fact = &warehouse.fact_orders;
        assert_eq!(fact.value(0, "customer_key"), DataValue::Integer(1));
        assert_eq!(fact.value(0, "product_key"), DataValue::Integer(1));
        assert_eq!(fact.value(0, "payment_type_key"), DataValue::Integer(1));
        assert_eq!(fact.value(0, "order_date_key"), DataValue::Integer(20170510));
        assert_eq!(
            fact.value(0, "delivery_date_key"),
            DataValue::Integer(20170518)
        );
        assert_eq!(fact.value(0, "review_score"), DataValue::Integer(5));
    }

    #[test]
    fn test_transform_is_deterministic_apart_from_timestamps() {
        let config = EtlConfig::builder()
            .date_range("2017-01-01", "2017-06-30")
            .build()
            .unwrap();
        let sources = sources_fixture();
        let orchestrator = TransformOrchestrator::new(config);

        let first = orchestrator.run(&sources).unwrap();
        let second = orchestrator.run(&sources).unwrap();

        for (a, b) in first.tables().iter().zip(second.tables().iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.columns, b.columns);
            assert_eq!(a.len(), b.len());
            for (row_a, row_b) in a.rows.iter().zip(b.rows.iter()) {
                for column in &a.columns {
                    if column == "created_at" || column == "updated_at" {
                        continue;
                    }
                    assert_eq!(row_a.get(column), row_b.get(column), "coluna {}", column);
                }
            }
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1033.0188679), 1033.02);
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(0.0), 0.0);
    }
}
