//! Extração de produtos com colunas derivadas de dimensão física

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::error::{ExtractError, Result};
use crate::extract::csv::read_csv;
use crate::traits::Extractor;

/// Registro de produto, com volume e flag de fotos derivados na extração
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    #[serde(default)]
    pub product_category_name: Option<String>,
    #[serde(default)]
    pub product_photos_qty: Option<i64>,
    #[serde(default)]
    pub product_weight_g: Option<f64>,
    #[serde(default)]
    pub product_length_cm: Option<f64>,
    #[serde(default)]
    pub product_height_cm: Option<f64>,
    #[serde(default)]
    pub product_width_cm: Option<f64>,
    /// comprimento × altura × largura, arredondado a 2 casas
    #[serde(skip)]
    pub product_volume_cm3: Option<f64>,
    #[serde(skip)]
    pub has_photos: bool,
}

/// Extrator de produtos
#[derive(Debug, Clone)]
pub struct ProductsExtractor {
    file_path: String,
}

impl ProductsExtractor {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    fn validate(&self, records: &[ProductRecord]) -> Result<()> {
        let mut seen = HashSet::new();
        let duplicates = records
            .iter()
            .filter(|r| !seen.insert(r.product_id.as_str()))
            .count();
        if duplicates > 0 {
            // Não aborta, mas produto deveria ser único; fica para investigação
            error!(duplicates, "product_ids duplicados no extrato de produtos");
        }

        let missing_product_id = records.iter().filter(|r| r.product_id.is_empty()).count();
        if missing_product_id > 0 {
            return Err(ExtractError::CriticalFieldNull {
                table: "products".to_string(),
                column: "product_id".to_string(),
                count: missing_product_id,
            }
            .into());
        }

        let missing_categories = records
            .iter()
            .filter(|r| r.product_category_name.as_deref().unwrap_or("").is_empty())
            .count();
        if missing_categories > 0 {
            warn!(
                missing_categories,
                "produtos sem categoria; serão rotulados na transformação"
            );
        }

        for (column, invalid) in [
            (
                "product_weight_g",
                records
                    .iter()
                    .filter(|r| r.product_weight_g.is_some_and(|v| v <= 0.0))
                    .count(),
            ),
            (
                "product_length_cm",
                records
                    .iter()
                    .filter(|r| r.product_length_cm.is_some_and(|v| v <= 0.0))
                    .count(),
            ),
        ] {
            if invalid > 0 {
                warn!(column, invalid, "dimensões físicas inválidas");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Extractor for ProductsExtractor {
    type Record = ProductRecord;

    async fn extract(&self) -> Result<Vec<ProductRecord>> {
        info!(path = %self.file_path, "Iniciando extração de produtos");

        let mut records: Vec<ProductRecord> = read_csv(&self.file_path)?;
        info!(rows = records.len(), "Produtos carregados");

        for record in &mut records {
            record.product_volume_cm3 = match (
                record.product_length_cm,
                record.product_height_cm,
                record.product_width_cm,
            ) {
                (Some(l), Some(h), Some(w)) => Some((l * h * w * 100.0).round() / 100.0),
                _ => None,
            };
            record.has_photos = record.product_photos_qty.unwrap_or(0) > 0;
        }

        self.validate(&records)?;

        info!(rows = records.len(), "Extração de produtos concluída");
        Ok(records)
    }

    fn entity(&self) -> &'static str {
        "products"
    }
}
