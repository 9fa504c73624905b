//! Extração de avaliações de pedidos

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::{ExtractError, Result};
use crate::extract::csv::{opt_datetime_format, read_csv};
use crate::traits::Extractor;

/// Registro de avaliação do extrato de origem
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRecord {
    pub review_id: String,
    pub order_id: String,
    #[serde(default)]
    pub review_score: Option<i64>,
    #[serde(default)]
    pub review_comment_title: Option<String>,
    #[serde(default)]
    pub review_comment_message: Option<String>,
    #[serde(deserialize_with = "opt_datetime_format::deserialize", default)]
    pub review_creation_date: Option<NaiveDateTime>,
    #[serde(deserialize_with = "opt_datetime_format::deserialize", default)]
    pub review_answer_timestamp: Option<NaiveDateTime>,
}

/// Extrator de avaliações
#[derive(Debug, Clone)]
pub struct ReviewsExtractor {
    file_path: String,
}

impl ReviewsExtractor {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    fn validate(&self, records: &[ReviewRecord]) -> Result<()> {
        for (column, missing) in [
            (
                "review_id",
                records.iter().filter(|r| r.review_id.is_empty()).count(),
            ),
            (
                "order_id",
                records.iter().filter(|r| r.order_id.is_empty()).count(),
            ),
        ] {
            if missing > 0 {
                return Err(ExtractError::CriticalFieldNull {
                    table: "reviews".to_string(),
                    column: column.to_string(),
                    count: missing,
                }
                .into());
            }
        }

        let mut seen = HashSet::new();
        let duplicates = records
            .iter()
            .filter(|r| !seen.insert(r.review_id.as_str()))
            .count();
        if duplicates > 0 {
            warn!(duplicates, "review_ids duplicados no extrato de avaliações");
        }

        let out_of_range = records
            .iter()
            .filter(|r| r.review_score.is_some_and(|s| !(1..=5).contains(&s)))
            .count();
        if out_of_range > 0 {
            warn!(out_of_range, "avaliações com nota fora do intervalo 1..5");
        }

        Ok(())
    }
}

#[async_trait]
impl Extractor for ReviewsExtractor {
    type Record = ReviewRecord;

    async fn extract(&self) -> Result<Vec<ReviewRecord>> {
        info!(path = %self.file_path, "Iniciando extração de avaliações");

        let records: Vec<ReviewRecord> = read_csv(&self.file_path)?;
        info!(rows = records.len(), "Avaliações carregadas");

        self.validate(&records)?;

        info!(rows = records.len(), "Extração de avaliações concluída");
        Ok(records)
    }

    fn entity(&self) -> &'static str {
        "reviews"
    }
}
