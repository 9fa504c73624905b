//! Fase de extração: lê os seis extratos CSV de origem para registros tipados

pub mod csv;
pub mod customers;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;

pub use customers::{CustomerRecord, CustomersExtractor};
pub use order_items::{OrderItemRecord, OrderItemsExtractor};
pub use orders::{OrderRecord, OrdersExtractor};
pub use payments::{PaymentRecord, PaymentsExtractor};
pub use products::{ProductRecord, ProductsExtractor};
pub use reviews::{ReviewRecord, ReviewsExtractor};

use tracing::info;

use crate::config::EtlConfig;
use crate::error::Result;
use crate::traits::Extractor;

/// Extratos de origem já validados, prontos para a transformação
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub orders: Vec<OrderRecord>,
    pub order_items: Vec<OrderItemRecord>,
    pub customers: Vec<CustomerRecord>,
    pub products: Vec<ProductRecord>,
    pub payments: Vec<PaymentRecord>,
    pub reviews: Vec<ReviewRecord>,
}

/// Executa os seis extratores na ordem dos extratos
///
/// Qualquer falha de extração (arquivo ausente, campo crítico nulo) aborta
/// a fase inteira; problemas de qualidade não críticos ficam só no log.
pub async fn extract_all(config: &EtlConfig) -> Result<SourceTables> {
    info!("Iniciando fase de extração");

    let orders = OrdersExtractor::new(&config.data_paths.orders)
        .extract()
        .await?;
    let order_items = OrderItemsExtractor::new(&config.data_paths.order_items)
        .extract()
        .await?;
    let customers = CustomersExtractor::new(&config.data_paths.customers)
        .extract()
        .await?;
    let products = ProductsExtractor::new(&config.data_paths.products)
        .extract()
        .await?;
    let payments = PaymentsExtractor::new(&config.data_paths.payments)
        .extract()
        .await?;
    let reviews = ReviewsExtractor::new(&config.data_paths.reviews)
        .extract()
        .await?;

    info!(
        orders = orders.len(),
        order_items = order_items.len(),
        customers = customers.len(),
        products = products.len(),
        payments = payments.len(),
        reviews = reviews.len(),
        "Fase de extração concluída"
    );

    Ok(SourceTables {
        orders,
        order_items,
        customers,
        products,
        payments,
        reviews,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_all_fails_on_missing_file() {
        let config = EtlConfig::builder()
            .orders_path("/caminho/inexistente/orders.csv")
            .build()
            .unwrap();

        let result = extract_all(&config).await;
        assert!(result.is_err());
    }
}
