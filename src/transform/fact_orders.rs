//! Tabela fato central: uma linha por pedido, com FKs resolvidas e métricas
//! de entrega e avaliação

use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::Result;
use crate::extract::{OrderItemRecord, OrderRecord, PaymentRecord, ReviewRecord};
use crate::transform::DimensionKeys;
use crate::types::{DataRow, DataValue, Table};

/// Sentinela para pedidos sem registro de pagamento
const PAYMENT_TYPE_SENTINEL: &str = "not_defined";

/// Agregado de itens no grão do pedido
///
/// O fato é no grão do pedido, não do item: pedidos com vários produtos são
/// representados pelo primeiro item. Simplificação deliberada do modelo.
#[derive(Debug, Clone)]
struct ItemsAggregate {
    order_item_count: i64,
    order_subtotal: f64,
    order_freight_total: f64,
    order_total_value: f64,
    primary_product_id: String,
    seller_id: String,
}

/// Agregado de pagamentos no grão do pedido
#[derive(Debug, Clone, Default)]
struct PaymentsAggregate {
    payment_value: f64,
    payment_type: Option<String>,
    payment_installments: Option<i64>,
}

/// Construtor da tabela fato de pedidos
#[derive(Debug, Clone, Default)]
pub struct FactOrdersBuilder;

impl FactOrdersBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Monta o fato juntando pedidos, itens, pagamentos e avaliações
    ///
    /// Todos os joins são left join a partir dos pedidos: a contagem de
    /// linhas do fato é exatamente a contagem de pedidos extraídos, mesmo
    /// para pedidos cancelados sem itens nem pagamentos.
    pub fn build(
        &self,
        orders: &[OrderRecord],
        order_items: &[OrderItemRecord],
        payments: &[PaymentRecord],
        reviews: &[ReviewRecord],
        keys: &DimensionKeys<'_>,
    ) -> Result<Table> {
        info!(orders = orders.len(), "Construindo fato de pedidos");

        let items_agg = aggregate_items(order_items);
        info!(orders_with_items = items_agg.len(), "Itens agregados");

        let payments_agg = aggregate_payments(payments);
        info!(
            orders_with_payments = payments_agg.len(),
            "Pagamentos agregados"
        );

        // Primeira avaliação por pedido, para manter o grão de uma linha
        // por pedido mesmo com avaliações duplicadas
        let mut review_scores: HashMap<&str, Option<i64>> = HashMap::new();
        for review in reviews {
            review_scores
                .entry(review.order_id.as_str())
                .or_insert(review.review_score);
        }

        let mut orphan_customers = 0usize;
        let mut orphan_products = 0usize;
        let mut orphan_payment_types = 0usize;
        let mut orphan_dates = 0usize;

        let mut rows = Vec::with_capacity(orders.len());
        let created_at = Utc::now();

        for (index, order) in orders.iter().enumerate() {
            let order_key = index as i64 + 1;
            let items = items_agg.get(order.order_id.as_str());
            let payment = payments_agg.get(order.order_id.as_str());

            let payment_type = payment
                .and_then(|p| p.payment_type.clone())
                .unwrap_or_else(|| PAYMENT_TYPE_SENTINEL.to_string());

            // Resolução de FKs por lookup exato; órfãos são contados e
            // registrados, nunca bloqueiam a emissão da linha
            let customer_key = keys.customers.get(order.customer_id.as_str()).copied();
            if customer_key.is_none() {
                orphan_customers += 1;
            }

            let product_key = items
                .and_then(|i| keys.products.get(i.primary_product_id.as_str()))
                .copied();
            if product_key.is_none() {
                orphan_products += 1;
            }

            let payment_type_key = keys.payment_types.get(payment_type.as_str()).copied();
            if payment_type_key.is_none() {
                orphan_payment_types += 1;
            }

            let order_date_key = keys
                .dates
                .get(&order.order_purchase_timestamp.date())
                .copied();
            if order_date_key.is_none() {
                orphan_dates += 1;
            }
            let delivery_date_key = order
                .order_delivered_customer_date
                .and_then(|d| keys.dates.get(&d.date()).copied());

            let delivery = delivery_metrics(order);

            let mut row = DataRow::new();
            row.insert("order_key".to_string(), DataValue::Integer(order_key));
            row.insert("customer_key".to_string(), customer_key.into());
            row.insert("product_key".to_string(), product_key.into());
            row.insert("order_date_key".to_string(), order_date_key.into());
            row.insert("delivery_date_key".to_string(), delivery_date_key.into());
            row.insert("payment_type_key".to_string(), payment_type_key.into());
            row.insert(
                "order_id".to_string(),
                DataValue::String(order.order_id.clone()),
            );
            row.insert(
                "order_status".to_string(),
                DataValue::String(order.order_status.clone()),
            );
            row.insert(
                "seller_id".to_string(),
                items.map(|i| i.seller_id.clone()).into(),
            );
            row.insert(
                "order_item_count".to_string(),
                DataValue::Integer(items.map_or(0, |i| i.order_item_count)),
            );
            row.insert(
                "order_subtotal".to_string(),
                DataValue::Float(items.map_or(0.0, |i| i.order_subtotal)),
            );
            row.insert(
                "order_freight_total".to_string(),
                DataValue::Float(items.map_or(0.0, |i| i.order_freight_total)),
            );
            row.insert(
                "order_total_value".to_string(),
                DataValue::Float(items.map_or(0.0, |i| i.order_total_value)),
            );
            row.insert(
                "payment_value".to_string(),
                DataValue::Float(payment.map_or(0.0, |p| p.payment_value)),
            );
            row.insert(
                "payment_installments".to_string(),
                DataValue::Integer(payment.and_then(|p| p.payment_installments).unwrap_or(1)),
            );
            row.insert(
                "delivery_days".to_string(),
                DataValue::Integer(delivery.delivery_days),
            );
            row.insert(
                "estimated_delivery_days".to_string(),
                delivery.estimated_delivery_days.into(),
            );
            row.insert(
                "delivery_delay_days".to_string(),
                DataValue::Integer(delivery.delivery_delay_days),
            );
            row.insert(
                "is_late_delivery".to_string(),
                DataValue::Boolean(delivery.is_late_delivery),
            );
            row.insert(
                "is_completed_order".to_string(),
                DataValue::Boolean(order.order_status == "delivered"),
            );
            let review_score = review_scores
                .get(order.order_id.as_str())
                .copied()
                .flatten();
            row.insert("review_score".to_string(), review_score.into());
            row.insert(
                "has_review".to_string(),
                DataValue::Boolean(review_score.is_some()),
            );
            row.insert(
                "order_purchase_timestamp".to_string(),
                DataValue::DateTime(order.order_purchase_timestamp),
            );
            row.insert(
                "order_delivered_customer_date".to_string(),
                order.order_delivered_customer_date.into(),
            );
            row.insert("created_at".to_string(), DataValue::Timestamp(created_at));

            rows.push(row);
        }

        if orphan_customers > 0 {
            warn!(orphan_customers, "pedidos com cliente não mapeado");
        }
        if orphan_products > 0 {
            warn!(orphan_products, "pedidos sem produto mapeado");
        }
        if orphan_payment_types > 0 {
            warn!(orphan_payment_types, "pedidos com tipo de pagamento não mapeado");
        }
        if orphan_dates > 0 {
            warn!(orphan_dates, "pedidos com data fora da dimensão de datas");
        }

        info!(rows = rows.len(), "Fato de pedidos construído");

        Ok(Table::new(
            "fact_orders",
            vec![
                "order_key",
                "customer_key",
                "product_key",
                "order_date_key",
                "delivery_date_key",
                "payment_type_key",
                "order_id",
                "order_status",
                "seller_id",
                "order_item_count",
                "order_subtotal",
                "order_freight_total",
                "order_total_value",
                "payment_value",
                "payment_installments",
                "delivery_days",
                "estimated_delivery_days",
                "delivery_delay_days",
                "is_late_delivery",
                "is_completed_order",
                "review_score",
                "has_review",
                "order_purchase_timestamp",
                "order_delivered_customer_date",
                "created_at",
            ],
            rows,
        ))
    }
}

fn aggregate_items(order_items: &[OrderItemRecord]) -> HashMap<&str, ItemsAggregate> {
    let mut aggregates: HashMap<&str, ItemsAggregate> = HashMap::new();
    for item in order_items {
        aggregates
            .entry(item.order_id.as_str())
            .and_modify(|agg| {
                agg.order_item_count += 1;
                agg.order_subtotal += item.price;
                agg.order_freight_total += item.freight_value;
                agg.order_total_value += item.item_total;
            })
            .or_insert_with(|| ItemsAggregate {
                order_item_count: 1,
                order_subtotal: item.price,
                order_freight_total: item.freight_value,
                order_total_value: item.item_total,
                primary_product_id: item.product_id.clone(),
                seller_id: item.seller_id.clone(),
            });
    }
    aggregates
}

fn aggregate_payments(payments: &[PaymentRecord]) -> HashMap<&str, PaymentsAggregate> {
    let mut aggregates: HashMap<&str, PaymentsAggregate> = HashMap::new();
    for payment in payments {
        let agg = aggregates.entry(payment.order_id.as_str()).or_default();
        agg.payment_value += payment.payment_value;
        if agg.payment_type.is_none() {
            agg.payment_type = payment.payment_type.clone();
        }
        agg.payment_installments = match (agg.payment_installments, payment.payment_installments) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
    aggregates
}

struct DeliveryMetrics {
    delivery_days: i64,
    estimated_delivery_days: Option<i64>,
    delivery_delay_days: i64,
    is_late_delivery: bool,
}

/// Métricas de entrega em dias corridos inteiros
///
/// Pedidos nunca entregues ficam com zero/false: convenção de segurança
/// contra nulos, não afirmação de pontualidade.
fn delivery_metrics(order: &OrderRecord) -> DeliveryMetrics {
    let delivered = order.order_delivered_customer_date;
    let estimated = order.order_estimated_delivery_date;
    let purchase = order.order_purchase_timestamp;

    let delivery_days = delivered.map_or(0, |d| whole_days(purchase, d));
    let estimated_delivery_days = estimated.map(|e| whole_days(purchase, e));
    let delivery_delay_days = match (delivered, estimated) {
        (Some(d), Some(e)) => whole_days(e, d),
        _ => 0,
    };

    DeliveryMetrics {
        delivery_days,
        estimated_delivery_days,
        delivery_delay_days,
        is_late_delivery: delivery_delay_days > 0,
    }
}

fn whole_days(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_days()
}
