//! Dimensão de clientes: métricas de pedidos, CLV e segmentação

use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::BusinessRulesConfig;
use crate::error::Result;
use crate::extract::{CustomerRecord, OrderItemRecord, OrderRecord};
use crate::transform::round2;
use crate::types::{DataRow, DataValue, Table};

/// Métricas agregadas por cliente, derivadas de pedidos e itens
#[derive(Debug, Clone)]
struct CustomerMetrics {
    total_orders: i64,
    total_spent: f64,
    avg_order_value: f64,
    first_order_date: NaiveDateTime,
    last_order_date: NaiveDateTime,
    delivered_orders: i64,
    days_as_customer: i64,
    purchase_frequency_annual: f64,
    lifetime_value: f64,
}

/// Dimensão de clientes construída
#[derive(Debug, Clone)]
pub struct CustomerDimension {
    pub table: Table,
    /// customer_id → customer_key, para resolução de FKs do fato
    pub keys: HashMap<String, i64>,
    /// customer_id → first_order_date, consumido pela análise de coortes
    pub first_order_dates: HashMap<String, NaiveDateTime>,
}

/// Construtor da dimensão de clientes
#[derive(Debug, Clone)]
pub struct CustomerDimensionBuilder {
    rules: BusinessRulesConfig,
}

impl CustomerDimensionBuilder {
    pub fn new(rules: BusinessRulesConfig) -> Self {
        Self { rules }
    }

    pub fn build(
        &self,
        customers: &[CustomerRecord],
        orders: &[OrderRecord],
        order_items: &[OrderItemRecord],
    ) -> Result<CustomerDimension> {
        info!(
            customers = customers.len(),
            orders = orders.len(),
            items = order_items.len(),
            "Construindo dimensão de clientes"
        );

        // Receita por pedido: soma de item_total
        let mut order_revenue: HashMap<&str, f64> = HashMap::new();
        for item in order_items {
            *order_revenue.entry(item.order_id.as_str()).or_insert(0.0) += item.item_total;
        }

        // Métricas por cliente; pedidos sem itens (cancelados) contam como 0
        let mut metrics = self.aggregate_customer_metrics(orders, &order_revenue);

        info!(customers_with_orders = metrics.len(), "Métricas calculadas");

        let mut without_orders = 0usize;
        let mut rows = Vec::with_capacity(customers.len());
        let mut keys = HashMap::with_capacity(customers.len());
        let mut first_order_dates = HashMap::new();
        let created_at = Utc::now();

        for (index, customer) in customers.iter().enumerate() {
            let customer_key = index as i64 + 1;
            keys.insert(customer.customer_id.clone(), customer_key);

            let customer_metrics = metrics.remove(customer.customer_id.as_str());
            if customer_metrics.is_none() {
                without_orders += 1;
            }

            let region = self.region_for(customer.customer_state.as_deref());
            let segment = self.segment_for(
                customer_metrics.as_ref().map_or(0, |m| m.total_orders),
                customer_metrics.as_ref().map_or(0.0, |m| m.lifetime_value),
            );

            if let Some(m) = &customer_metrics {
                first_order_dates.insert(customer.customer_id.clone(), m.first_order_date);
            }

            let mut row = DataRow::new();
            row.insert("customer_key".to_string(), DataValue::Integer(customer_key));
            row.insert(
                "customer_id".to_string(),
                DataValue::String(customer.customer_id.clone()),
            );
            row.insert(
                "customer_unique_id".to_string(),
                DataValue::String(customer.customer_unique_id.clone()),
            );
            row.insert(
                "customer_city".to_string(),
                customer.customer_city.clone().into(),
            );
            row.insert(
                "customer_state".to_string(),
                customer.customer_state.clone().into(),
            );
            row.insert("customer_region".to_string(), DataValue::String(region));
            row.insert(
                "customer_segment".to_string(),
                DataValue::String(segment.to_string()),
            );
            row.insert(
                "first_order_date".to_string(),
                customer_metrics.as_ref().map(|m| m.first_order_date).into(),
            );
            row.insert(
                "last_order_date".to_string(),
                customer_metrics.as_ref().map(|m| m.last_order_date).into(),
            );
            // Clientes sem pedidos são anomalia registrada: métricas zeradas
            row.insert(
                "total_orders".to_string(),
                DataValue::Integer(customer_metrics.as_ref().map_or(0, |m| m.total_orders)),
            );
            row.insert(
                "delivered_orders".to_string(),
                customer_metrics.as_ref().map(|m| m.delivered_orders).into(),
            );
            row.insert(
                "total_spent".to_string(),
                DataValue::Float(customer_metrics.as_ref().map_or(0.0, |m| m.total_spent)),
            );
            row.insert(
                "avg_order_value".to_string(),
                customer_metrics.as_ref().map(|m| m.avg_order_value).into(),
            );
            row.insert(
                "lifetime_value".to_string(),
                DataValue::Float(customer_metrics.as_ref().map_or(0.0, |m| m.lifetime_value)),
            );
            row.insert(
                "days_as_customer".to_string(),
                customer_metrics.as_ref().map(|m| m.days_as_customer).into(),
            );
            row.insert(
                "purchase_frequency_annual".to_string(),
                customer_metrics
                    .as_ref()
                    .map(|m| m.purchase_frequency_annual)
                    .into(),
            );
            row.insert("created_at".to_string(), DataValue::Timestamp(created_at));
            row.insert("updated_at".to_string(), DataValue::Timestamp(created_at));

            rows.push(row);
        }

        if without_orders > 0 {
            warn!(without_orders, "clientes sem pedidos, métricas zeradas");
        }
        info!(rows = rows.len(), "Dimensão de clientes construída");

        let table = Table::new(
            "dim_customers",
            vec![
                "customer_key",
                "customer_id",
                "customer_unique_id",
                "customer_city",
                "customer_state",
                "customer_region",
                "customer_segment",
                "first_order_date",
                "last_order_date",
                "total_orders",
                "delivered_orders",
                "total_spent",
                "avg_order_value",
                "lifetime_value",
                "days_as_customer",
                "purchase_frequency_annual",
                "created_at",
                "updated_at",
            ],
            rows,
        );

        Ok(CustomerDimension {
            table,
            keys,
            first_order_dates,
        })
    }

    fn aggregate_customer_metrics(
        &self,
        orders: &[OrderRecord],
        order_revenue: &HashMap<&str, f64>,
    ) -> HashMap<String, CustomerMetrics> {
        struct Accumulator {
            total_orders: i64,
            total_spent: f64,
            first: NaiveDateTime,
            last: NaiveDateTime,
            delivered: i64,
        }

        let mut accumulators: HashMap<String, Accumulator> = HashMap::new();
        for order in orders {
            let order_total = order_revenue.get(order.order_id.as_str()).copied().unwrap_or(0.0);
            let delivered = i64::from(order.order_status == "delivered");
            let ts = order.order_purchase_timestamp;

            accumulators
                .entry(order.customer_id.clone())
                .and_modify(|acc| {
                    acc.total_orders += 1;
                    acc.total_spent += order_total;
                    acc.delivered += delivered;
                    if ts < acc.first {
                        acc.first = ts;
                    }
                    if ts > acc.last {
                        acc.last = ts;
                    }
                })
                .or_insert(Accumulator {
                    total_orders: 1,
                    total_spent: order_total,
                    first: ts,
                    last: ts,
                    delivered,
                });
        }

        let lifespan_days = self.rules.estimated_lifespan_days as f64;
        accumulators
            .into_iter()
            .map(|(customer_id, acc)| {
                let avg_order_value = acc.total_spent / acc.total_orders as f64;
                // Piso de 1 dia evita divisão por zero para compras no mesmo dia
                let days_as_customer = (acc.last - acc.first).num_days().max(1);
                let purchase_frequency_annual =
                    acc.total_orders as f64 / days_as_customer as f64 * 365.0;
                let lifetime_value =
                    round2(avg_order_value * purchase_frequency_annual * (lifespan_days / 365.0));

                (
                    customer_id,
                    CustomerMetrics {
                        total_orders: acc.total_orders,
                        total_spent: acc.total_spent,
                        avg_order_value,
                        first_order_date: acc.first,
                        last_order_date: acc.last,
                        delivered_orders: acc.delivered,
                        days_as_customer,
                        purchase_frequency_annual,
                        lifetime_value,
                    },
                )
            })
            .collect()
    }

    /// Estado → região macro; estado ausente → Unknown, não mapeado → Other
    fn region_for(&self, state: Option<&str>) -> String {
        let Some(state) = state.filter(|s| !s.is_empty()) else {
            return "Unknown".to_string();
        };
        for (region, states) in &self.rules.regions {
            if states.iter().any(|s| s == state) {
                return region.clone();
            }
        }
        "Other".to_string()
    }

    /// Segmentação com precedência fixa: Inactive, VIP, New, Returning, Loyal
    fn segment_for(&self, total_orders: i64, lifetime_value: f64) -> &'static str {
        if total_orders == 0 {
            "Inactive"
        } else if total_orders >= self.rules.vip_customer_min_orders
            || lifetime_value >= self.rules.vip_customer_min_value
        {
            "VIP"
        } else if total_orders <= 1 {
            "New"
        } else if total_orders <= self.rules.returning_customer_max_orders {
            "Returning"
        } else {
            "Loyal"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EtlConfig;
    use chrono::NaiveDate;

    fn builder() -> CustomerDimensionBuilder {
        CustomerDimensionBuilder::new(EtlConfig::default().business_rules)
    }

    fn customer(id: &str, state: Option<&str>) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            customer_unique_id: format!("u_{}", id),
            customer_zip_code_prefix: None,
            customer_city: None,
            customer_state: state.map(String::from),
        }
    }

    fn order(id: &str, customer_id: &str, date: &str) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            customer_id: customer_id.to_string(),
            order_status: "delivered".to_string(),
            order_purchase_timestamp: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            order_approved_at: None,
            order_delivered_carrier_date: None,
            order_delivered_customer_date: None,
            order_estimated_delivery_date: None,
        }
    }

    fn item(order_id: &str, price: f64, freight: f64) -> OrderItemRecord {
        OrderItemRecord {
            order_id: order_id.to_string(),
            order_item_id: 1,
            product_id: "p1".to_string(),
            seller_id: "s1".to_string(),
            shipping_limit_date: None,
            price,
            freight_value: freight,
            item_total: price + freight,
        }
    }

    #[test]
    fn test_clv_scenario_three_orders() {
        let customers = vec![customer("c1", Some("SP"))];
        let orders = vec![
            order("o1", "c1", "2016-01-05"),
            order("o2", "c1", "2016-02-10"),
            order("o3", "c1", "2016-04-20"),
        ];
        let items = vec![
            item("o1", 40.0, 10.0),
            item("o2", 40.0, 10.0),
            item("o3", 40.0, 10.0),
        ];

        let dim = builder().build(&customers, &orders, &items).unwrap();
        assert_eq!(dim.table.len(), 1);
        assert_eq!(dim.table.value(0, "total_orders"), DataValue::Integer(3));
        assert_eq!(dim.table.value(0, "total_spent"), DataValue::Float(150.0));
        assert_eq!(dim.table.value(0, "avg_order_value"), DataValue::Float(50.0));
        assert_eq!(dim.table.value(0, "days_as_customer"), DataValue::Integer(106));

        let freq = dim
            .table
            .value(0, "purchase_frequency_annual")
            .as_float()
            .unwrap();
        assert!((freq - 3.0 / 106.0 * 365.0).abs() < 1e-9);

        // 50 × (3/106×365) × (730/365) arredondado a 2 casas
        assert_eq!(
            dim.table.value(0, "lifetime_value"),
            DataValue::Float(1033.02)
        );
        assert_eq!(
            dim.table.value(0, "customer_region"),
            DataValue::String("Sudeste".to_string())
        );
    }

    #[test]
    fn test_clv_formula_round_numbers() {
        // 12 pedidos de 100 em exatamente 365 dias: frequência anual 12,
        // CLV = 100 × 12 × (730/365) = 2400.00
        let customers = vec![customer("c1", Some("SP"))];
        let mut orders = Vec::new();
        let mut items = Vec::new();
        for (i, date) in [
            "2016-01-01", "2016-02-01", "2016-03-01", "2016-04-01", "2016-05-01", "2016-06-01",
            "2016-07-01", "2016-08-01", "2016-09-01", "2016-10-01", "2016-11-01", "2016-12-31",
        ]
        .into_iter()
        .enumerate()
        {
            let order_id = format!("o{}", i);
            orders.push(order(&order_id, "c1", date));
            items.push(item(&order_id, 100.0, 0.0));
        }

        let dim = builder().build(&customers, &orders, &items).unwrap();
        assert_eq!(dim.table.value(0, "days_as_customer"), DataValue::Integer(365));
        let freq = dim
            .table
            .value(0, "purchase_frequency_annual")
            .as_float()
            .unwrap();
        assert!((freq - 12.0).abs() < 1e-9);
        assert_eq!(
            dim.table.value(0, "lifetime_value"),
            DataValue::Float(2400.0)
        );
    }

    #[test]
    fn test_same_day_customer_has_one_day_floor() {
        let customers = vec![customer("c1", Some("RS"))];
        let orders = vec![order("o1", "c1", "2017-03-10")];
        let items = vec![item("o1", 100.0, 0.0)];

        let dim = builder().build(&customers, &orders, &items).unwrap();
        assert_eq!(dim.table.value(0, "days_as_customer"), DataValue::Integer(1));
    }

    #[test]
    fn test_segmentation_precedence() {
        let b = builder();
        assert_eq!(b.segment_for(0, 5000.0), "Inactive");
        assert_eq!(b.segment_for(6, 0.0), "VIP");
        assert_eq!(b.segment_for(1, 2000.0), "VIP");
        assert_eq!(b.segment_for(1, 100.0), "New");
        assert_eq!(b.segment_for(3, 100.0), "Returning");
        assert_eq!(b.segment_for(5, 100.0), "Returning");
    }

    #[test]
    fn test_customer_without_orders_is_zeroed_inactive() {
        let customers = vec![customer("c1", Some("SP")), customer("c2", Some("BA"))];
        let orders = vec![order("o1", "c1", "2017-01-01")];
        let items = vec![item("o1", 30.0, 5.0)];

        let dim = builder().build(&customers, &orders, &items).unwrap();
        assert_eq!(dim.table.value(1, "total_orders"), DataValue::Integer(0));
        assert_eq!(dim.table.value(1, "total_spent"), DataValue::Float(0.0));
        assert_eq!(dim.table.value(1, "lifetime_value"), DataValue::Float(0.0));
        assert_eq!(
            dim.table.value(1, "customer_segment"),
            DataValue::String("Inactive".to_string())
        );
        assert!(dim.table.value(1, "first_order_date").is_null());
    }

    #[test]
    fn test_region_unknown_and_other() {
        let b = builder();
        assert_eq!(b.region_for(None), "Unknown");
        assert_eq!(b.region_for(Some("")), "Unknown");
        assert_eq!(b.region_for(Some("XX")), "Other");
        assert_eq!(b.region_for(Some("BA")), "Nordeste");
    }

    #[test]
    fn test_order_without_items_counts_as_zero_revenue() {
        let customers = vec![customer("c1", Some("SP"))];
        let orders = vec![order("o1", "c1", "2017-01-01")];

        let dim = builder().build(&customers, &orders, &[]).unwrap();
        assert_eq!(dim.table.value(0, "total_orders"), DataValue::Integer(1));
        assert_eq!(dim.table.value(0, "total_spent"), DataValue::Float(0.0));
        assert_eq!(
            dim.table.value(0, "customer_segment"),
            DataValue::String("New".to_string())
        );
    }

    #[test]
    fn test_surrogate_keys_follow_extraction_order() {
        let customers = vec![
            customer("c9", Some("SP")),
            customer("c1", Some("SP")),
            customer("c5", Some("SP")),
        ];
        let dim = builder().build(&customers, &[], &[]).unwrap();
        assert_eq!(dim.keys["c9"], 1);
        assert_eq!(dim.keys["c1"], 2);
        assert_eq!(dim.keys["c5"], 3);
    }
}
