//! Carga relacional em PostgreSQL (feature `database`)
//!
//! O schema é criado sem constraints de FK: a consistência referencial é
//! verificada fora do pipeline, por um checador de qualidade à parte.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, Postgres};
use sqlx::QueryBuilder;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{ConfigError, LoadError, Result};
use crate::traits::Loader;
use crate::types::{DataRow, DataValue, PipelineResult, Table};

/// DDL das seis tabelas do warehouse, em ordem de criação
const CREATE_TABLES: &[(&str, &str)] = &[
    (
        "dim_date",
        "CREATE TABLE dim_date (
            date_key INTEGER PRIMARY KEY,
            full_date DATE NOT NULL UNIQUE,
            year INTEGER NOT NULL,
            quarter INTEGER NOT NULL,
            month INTEGER NOT NULL,
            month_name VARCHAR(20) NOT NULL,
            week INTEGER NOT NULL,
            day_of_month INTEGER NOT NULL,
            day_of_week INTEGER NOT NULL,
            day_name VARCHAR(20) NOT NULL,
            is_weekend BOOLEAN NOT NULL,
            is_holiday BOOLEAN NOT NULL,
            fiscal_year INTEGER NOT NULL,
            fiscal_quarter INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL
        )",
    ),
    (
        "dim_products",
        "CREATE TABLE dim_products (
            product_key INTEGER PRIMARY KEY,
            product_id VARCHAR(50) NOT NULL UNIQUE,
            product_category_name VARCHAR(100),
            product_category_english VARCHAR(100),
            product_category_segment VARCHAR(50),
            product_weight_g NUMERIC(12, 2),
            product_length_cm NUMERIC(12, 2),
            product_height_cm NUMERIC(12, 2),
            product_width_cm NUMERIC(12, 2),
            product_volume_cm3 NUMERIC(12, 2),
            product_photos_qty INTEGER,
            has_photos BOOLEAN,
            created_at TIMESTAMP NOT NULL
        )",
    ),
    (
        "dim_payment_type",
        "CREATE TABLE dim_payment_type (
            payment_type_key INTEGER PRIMARY KEY,
            payment_type VARCHAR(50) NOT NULL UNIQUE,
            payment_category VARCHAR(50) NOT NULL,
            created_at TIMESTAMP NOT NULL
        )",
    ),
    (
        "dim_customers",
        "CREATE TABLE dim_customers (
            customer_key INTEGER PRIMARY KEY,
            customer_id VARCHAR(50) NOT NULL UNIQUE,
            customer_unique_id VARCHAR(50),
            customer_city VARCHAR(100),
            customer_state VARCHAR(2),
            customer_region VARCHAR(50),
            customer_segment VARCHAR(20),
            first_order_date TIMESTAMP,
            last_order_date TIMESTAMP,
            total_orders INTEGER,
            delivered_orders INTEGER,
            total_spent NUMERIC(12, 2),
            avg_order_value NUMERIC(12, 2),
            lifetime_value NUMERIC(12, 2),
            days_as_customer INTEGER,
            purchase_frequency_annual NUMERIC(12, 2),
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )",
    ),
    (
        "fact_orders",
        "CREATE TABLE fact_orders (
            order_key BIGINT PRIMARY KEY,
            customer_key INTEGER,
            product_key INTEGER,
            order_date_key INTEGER,
            delivery_date_key INTEGER,
            payment_type_key INTEGER,
            order_id VARCHAR(50) NOT NULL UNIQUE,
            order_status VARCHAR(50),
            seller_id VARCHAR(50),
            order_item_count INTEGER,
            order_subtotal NUMERIC(12, 2),
            order_freight_total NUMERIC(12, 2),
            order_total_value NUMERIC(12, 2),
            payment_value NUMERIC(12, 2),
            payment_installments INTEGER,
            delivery_days INTEGER,
            estimated_delivery_days INTEGER,
            delivery_delay_days INTEGER,
            is_late_delivery BOOLEAN,
            is_completed_order BOOLEAN,
            review_score INTEGER,
            has_review BOOLEAN,
            order_purchase_timestamp TIMESTAMP,
            order_delivered_customer_date TIMESTAMP,
            created_at TIMESTAMP NOT NULL
        )",
    ),
    (
        "fact_cohort_retention",
        "CREATE TABLE fact_cohort_retention (
            cohort_retention_key INTEGER PRIMARY KEY,
            cohort_month DATE NOT NULL,
            months_since_first_purchase INTEGER NOT NULL,
            cohort_size INTEGER NOT NULL,
            retained_customers INTEGER NOT NULL,
            retention_rate NUMERIC(5, 2) NOT NULL,
            created_at TIMESTAMP NOT NULL,
            UNIQUE(cohort_month, months_since_first_purchase)
        )",
    ),
];

/// Índices de consulta; falha de criação é aviso, não erro
const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX idx_dim_date_full_date ON dim_date(full_date)",
    "CREATE INDEX idx_dim_date_year_month ON dim_date(year, month)",
    "CREATE INDEX idx_dim_products_category_segment ON dim_products(product_category_segment)",
    "CREATE INDEX idx_dim_customers_segment ON dim_customers(customer_segment)",
    "CREATE INDEX idx_dim_customers_region ON dim_customers(customer_region)",
    "CREATE INDEX idx_dim_customers_unique_id ON dim_customers(customer_unique_id)",
    "CREATE INDEX idx_fact_orders_customer_key ON fact_orders(customer_key)",
    "CREATE INDEX idx_fact_orders_product_key ON fact_orders(product_key)",
    "CREATE INDEX idx_fact_orders_order_date_key ON fact_orders(order_date_key)",
    "CREATE INDEX idx_fact_orders_payment_type_key ON fact_orders(payment_type_key)",
    "CREATE INDEX idx_fact_orders_status ON fact_orders(order_status)",
    "CREATE INDEX idx_fact_orders_customer_date ON fact_orders(customer_key, order_date_key)",
    "CREATE INDEX idx_fact_cohort_month ON fact_cohort_retention(cohort_month)",
];

/// Abre o pool de conexões a partir da configuração
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let url = config.url.as_deref().ok_or_else(|| {
        ConfigError::MissingRequiredParameter("database.url".to_string())
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.pool_size)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Cria o schema do warehouse, derrubando as tabelas existentes antes
#[derive(Debug, Clone)]
pub struct SchemaCreator {
    pool: PgPool,
}

impl SchemaCreator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_all(&self) -> Result<()> {
        info!("Criando schema do warehouse");

        // Derruba em ordem reversa de dependência
        for (name, _) in CREATE_TABLES.iter().rev() {
            sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", name))
                .execute(&self.pool)
                .await?;
        }

        for (name, ddl) in CREATE_TABLES {
            sqlx::query(ddl).execute(&self.pool).await?;
            info!(table = name, "Tabela criada");
        }

        for index in CREATE_INDEXES {
            if let Err(e) = sqlx::query(index).execute(&self.pool).await {
                warn!(error = %e, "Falha ao criar índice");
            }
        }

        info!(tables = CREATE_TABLES.len(), "Schema criado");
        Ok(())
    }
}

/// Loader PostgreSQL com insert em lotes e retentativa linha a linha
#[derive(Debug, Clone)]
pub struct PostgresLoader {
    pool: PgPool,
    chunk_size: usize,
}

impl PostgresLoader {
    pub fn new(pool: PgPool, chunk_size: usize) -> Self {
        Self {
            pool,
            chunk_size: chunk_size.max(1),
        }
    }

    async fn insert_rows(&self, table: &Table, rows: &[DataRow]) -> Result<()> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) VALUES ",
            table.name,
            table.columns.join(", ")
        ));

        builder.push_values(rows, |mut b, row| {
            for column in &table.columns {
                match row.get(column).unwrap_or(&DataValue::Null) {
                    DataValue::String(s) => b.push_bind(s.clone()),
                    DataValue::Integer(i) => b.push_bind(*i),
                    DataValue::Float(f) => b.push_bind(*f),
                    DataValue::Boolean(v) => b.push_bind(*v),
                    DataValue::Date(d) => b.push_bind(*d),
                    DataValue::DateTime(dt) => b.push_bind(*dt),
                    DataValue::Timestamp(ts) => b.push_bind(ts.naive_utc()),
                    // NULL literal sem tipo, compatível com qualquer coluna
                    DataValue::Null => b.push("NULL"),
                };
            }
        });

        builder.build().execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Loader for PostgresLoader {
    async fn load(&self, table: &Table) -> Result<PipelineResult> {
        let start = Instant::now();
        info!(table = %table.name, rows = table.len(), "Carregando tabela no PostgreSQL");

        let mut result = PipelineResult {
            rows_processed: table.len(),
            ..PipelineResult::new()
        };

        for chunk in table.rows.chunks(self.chunk_size) {
            match self.insert_rows(table, chunk).await {
                Ok(()) => result.rows_successful += chunk.len(),
                Err(chunk_err) => {
                    // Lote falhou: retenta linha a linha para isolar as ruins
                    warn!(
                        table = %table.name,
                        chunk_rows = chunk.len(),
                        error = %chunk_err,
                        "Lote falhou, retentando linha a linha"
                    );
                    for row in chunk {
                        match self.insert_rows(table, std::slice::from_ref(row)).await {
                            Ok(()) => result.rows_successful += 1,
                            Err(row_err) => {
                                result.rows_failed += 1;
                                result.errors.push(row_err.to_string());
                                error!(table = %table.name, error = %row_err, "Linha descartada");
                            }
                        }
                    }
                }
            }
        }

        result.execution_time_ms = start.elapsed().as_millis() as u64;
        info!(
            table = %table.name,
            successful = result.rows_successful,
            failed = result.rows_failed,
            "Carga concluída"
        );

        if result.rows_failed > 0 && result.rows_successful == 0 {
            return Err(LoadError::WriteError(format!(
                "nenhuma linha de {} foi carregada",
                table.name
            ))
            .into());
        }

        Ok(result)
    }

    async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_covers_all_warehouse_tables() {
        let names: Vec<&str> = CREATE_TABLES.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "dim_date",
                "dim_products",
                "dim_payment_type",
                "dim_customers",
                "fact_orders",
                "fact_cohort_retention",
            ]
        );
        // Sem constraints de FK por decisão de modelo
        for (_, ddl) in CREATE_TABLES {
            assert!(!ddl.contains("REFERENCES"));
        }
    }
}
