use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, EtlError};

/// Configuração principal do pipeline
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EtlConfig {
    pub data_paths: DataPathsConfig,
    pub business_rules: BusinessRulesConfig,
    pub date_dimension: DateDimensionConfig,
    pub database: DatabaseConfig,
}

/// Caminhos dos seis extratos CSV de origem e do diretório de staging
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataPathsConfig {
    pub orders: String,
    pub order_items: String,
    pub customers: String,
    pub products: String,
    pub payments: String,
    pub reviews: String,
    pub staging_dir: String,
}

/// Regras de negócio usadas pela fase de transformação
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusinessRulesConfig {
    /// Pedidos mínimos para classificar um cliente como VIP
    pub vip_customer_min_orders: i64,
    /// CLV mínimo para classificar um cliente como VIP
    pub vip_customer_min_value: f64,
    /// Máximo de pedidos para o segmento Returning
    pub returning_customer_max_orders: i64,
    /// Tempo de vida estimado do relacionamento, em dias (fórmula de CLV)
    pub estimated_lifespan_days: i64,
    /// Mapeamento região → siglas de estado
    pub regions: BTreeMap<String, Vec<String>>,
}

/// Intervalo inclusivo coberto pela dimensão de datas
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DateDimensionConfig {
    pub start_date: String,
    pub end_date: String,
}

/// Configuração do destino relacional (feature `database`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
    pub insert_chunk_size: usize,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            data_paths: DataPathsConfig::default(),
            business_rules: BusinessRulesConfig::default(),
            date_dimension: DateDimensionConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for DataPathsConfig {
    fn default() -> Self {
        Self {
            orders: "data/raw/olist_orders_dataset.csv".to_string(),
            order_items: "data/raw/olist_order_items_dataset.csv".to_string(),
            customers: "data/raw/olist_customers_dataset.csv".to_string(),
            products: "data/raw/olist_products_dataset.csv".to_string(),
            payments: "data/raw/olist_order_payments_dataset.csv".to_string(),
            reviews: "data/raw/olist_order_reviews_dataset.csv".to_string(),
            staging_dir: "data/staging".to_string(),
        }
    }
}

impl Default for BusinessRulesConfig {
    fn default() -> Self {
        // Segmentação: New = 1 pedido, Returning = 2-5, VIP = 6+ ou CLV alto
        let mut regions = BTreeMap::new();
        regions.insert(
            "Norte".to_string(),
            vec!["AC", "AP", "AM", "PA", "RO", "RR", "TO"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        regions.insert(
            "Nordeste".to_string(),
            vec!["AL", "BA", "CE", "MA", "PB", "PE", "PI", "RN", "SE"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        regions.insert(
            "Centro-Oeste".to_string(),
            vec!["DF", "GO", "MT", "MS"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        regions.insert(
            "Sudeste".to_string(),
            vec!["ES", "MG", "RJ", "SP"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        regions.insert(
            "Sul".to_string(),
            vec!["PR", "RS", "SC"].into_iter().map(String::from).collect(),
        );

        Self {
            vip_customer_min_orders: 6,
            vip_customer_min_value: 1000.0,
            returning_customer_max_orders: 5,
            estimated_lifespan_days: 730,
            regions,
        }
    }
}

impl Default for DateDimensionConfig {
    fn default() -> Self {
        // O dataset cobre 2016-2018
        Self {
            start_date: "2016-01-01".to_string(),
            end_date: "2018-12-31".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 5,
            insert_chunk_size: 1000,
        }
    }
}

impl DateDimensionConfig {
    /// Converte o intervalo configurado em datas, falhando rápido se malformado
    pub fn parse_range(&self) -> Result<(NaiveDate, NaiveDate), EtlError> {
        let start = NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d").map_err(|_| {
            EtlError::Config(ConfigError::InvalidValue {
                param: "date_dimension.start_date".to_string(),
                value: self.start_date.clone(),
            })
        })?;
        let end = NaiveDate::parse_from_str(&self.end_date, "%Y-%m-%d").map_err(|_| {
            EtlError::Config(ConfigError::InvalidValue {
                param: "date_dimension.end_date".to_string(),
                value: self.end_date.clone(),
            })
        })?;
        if start > end {
            return Err(EtlError::Config(ConfigError::InvalidConfig(format!(
                "start_date {} posterior a end_date {}",
                self.start_date, self.end_date
            ))));
        }
        Ok((start, end))
    }
}

impl EtlConfig {
    /// Cria um novo builder para configuração
    pub fn builder() -> EtlConfigBuilder {
        EtlConfigBuilder::default()
    }

    /// Carrega configuração de arquivo (TOML)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EtlError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Carrega configuração de string TOML
    pub fn from_toml(toml_str: &str) -> Result<Self, EtlError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml_str, config::FileFormat::Toml))
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Carrega configuração do ambiente sobre os defaults
    pub fn from_env() -> Result<Self, EtlError> {
        let mut builder = Self::builder();

        if let Ok(lifespan) = std::env::var("ECOMDW_LIFESPAN_DAYS") {
            if let Ok(days) = lifespan.parse::<i64>() {
                builder = builder.estimated_lifespan_days(days);
            }
        }

        if let Ok(url) = std::env::var("ECOMDW_DATABASE_URL") {
            builder = builder.database_url(url);
        }

        if let Ok(dir) = std::env::var("ECOMDW_STAGING_DIR") {
            builder = builder.staging_dir(dir);
        }

        builder.build()
    }

    /// Valida a configuração
    pub fn validate(&self) -> Result<(), EtlError> {
        if self.business_rules.estimated_lifespan_days <= 0 {
            return Err(EtlError::Config(ConfigError::InvalidValue {
                param: "business_rules.estimated_lifespan_days".to_string(),
                value: self.business_rules.estimated_lifespan_days.to_string(),
            }));
        }

        if self.business_rules.vip_customer_min_orders <= 0 {
            return Err(EtlError::Config(ConfigError::InvalidValue {
                param: "business_rules.vip_customer_min_orders".to_string(),
                value: self.business_rules.vip_customer_min_orders.to_string(),
            }));
        }

        if self.database.insert_chunk_size == 0 {
            return Err(EtlError::Config(ConfigError::InvalidValue {
                param: "database.insert_chunk_size".to_string(),
                value: "0".to_string(),
            }));
        }

        self.date_dimension.parse_range()?;

        Ok(())
    }
}

/// Builder para configuração do pipeline
#[derive(Default)]
pub struct EtlConfigBuilder {
    config: EtlConfig,
}

impl EtlConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders_path(mut self, path: impl Into<String>) -> Self {
        self.config.data_paths.orders = path.into();
        self
    }

    pub fn order_items_path(mut self, path: impl Into<String>) -> Self {
        self.config.data_paths.order_items = path.into();
        self
    }

    pub fn customers_path(mut self, path: impl Into<String>) -> Self {
        self.config.data_paths.customers = path.into();
        self
    }

    pub fn products_path(mut self, path: impl Into<String>) -> Self {
        self.config.data_paths.products = path.into();
        self
    }

    pub fn payments_path(mut self, path: impl Into<String>) -> Self {
        self.config.data_paths.payments = path.into();
        self
    }

    pub fn reviews_path(mut self, path: impl Into<String>) -> Self {
        self.config.data_paths.reviews = path.into();
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.data_paths.staging_dir = dir.into();
        self
    }

    pub fn vip_customer_min_orders(mut self, orders: i64) -> Self {
        self.config.business_rules.vip_customer_min_orders = orders;
        self
    }

    pub fn vip_customer_min_value(mut self, value: f64) -> Self {
        self.config.business_rules.vip_customer_min_value = value;
        self
    }

    pub fn returning_customer_max_orders(mut self, orders: i64) -> Self {
        self.config.business_rules.returning_customer_max_orders = orders;
        self
    }

    pub fn estimated_lifespan_days(mut self, days: i64) -> Self {
        self.config.business_rules.estimated_lifespan_days = days;
        self
    }

    pub fn date_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.config.date_dimension.start_date = start.into();
        self.config.date_dimension.end_date = end.into();
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database.url = Some(url.into());
        self
    }

    pub fn insert_chunk_size(mut self, size: usize) -> Self {
        self.config.database.insert_chunk_size = size;
        self
    }

    pub fn build(self) -> Result<EtlConfig, EtlError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
