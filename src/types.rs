use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Representa uma linha de dados genérica (fronteira com os loaders)
pub type DataRow = HashMap<String, DataValue>;

/// Valores de dados suportados pelas tabelas do warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    /// Data sem horário (YYYY-MM-DD)
    Date(NaiveDate),
    /// Data e horário sem timezone (YYYY-MM-DD HH:MM:SS)
    DateTime(NaiveDateTime),
    /// Timestamp com timezone UTC
    Timestamp(DateTime<Utc>),
}

impl Eq for DataValue {}

impl Hash for DataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            DataValue::String(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            DataValue::Integer(i) => {
                1u8.hash(state);
                i.hash(state);
            }
            DataValue::Float(f) => {
                2u8.hash(state);
                // Para f64, convertemos para bits para hash
                f.to_bits().hash(state);
            }
            DataValue::Boolean(b) => {
                3u8.hash(state);
                b.hash(state);
            }
            DataValue::Null => {
                4u8.hash(state);
            }
            DataValue::Date(date) => {
                5u8.hash(state);
                date.hash(state);
            }
            DataValue::DateTime(dt) => {
                6u8.hash(state);
                dt.hash(state);
            }
            DataValue::Timestamp(ts) => {
                7u8.hash(state);
                ts.hash(state);
            }
        }
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

impl From<NaiveDate> for DataValue {
    fn from(value: NaiveDate) -> Self {
        DataValue::Date(value)
    }
}

impl From<NaiveDateTime> for DataValue {
    fn from(value: NaiveDateTime) -> Self {
        DataValue::DateTime(value)
    }
}

impl From<DateTime<Utc>> for DataValue {
    fn from(value: DateTime<Utc>) -> Self {
        DataValue::Timestamp(value)
    }
}

impl<T> From<Option<T>> for DataValue
where
    T: Into<DataValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DataValue::Null,
        }
    }
}

impl DataValue {
    /// Converte para string se possível
    pub fn as_string(&self) -> Option<String> {
        match self {
            DataValue::String(s) => Some(s.clone()),
            DataValue::Integer(i) => Some(i.to_string()),
            DataValue::Float(f) => Some(f.to_string()),
            DataValue::Boolean(b) => Some(b.to_string()),
            DataValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            DataValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            DataValue::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            DataValue::Null => None,
        }
    }

    /// Converte para inteiro se possível
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DataValue::Integer(i) => Some(*i),
            DataValue::String(s) => s.parse().ok(),
            DataValue::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Converte para float se possível
    pub fn as_float(&self) -> Option<f64> {
        match self {
            DataValue::Float(f) => Some(*f),
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Converte para boolean se possível
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            DataValue::Boolean(b) => Some(*b),
            DataValue::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Converte para data (NaiveDate) se possível
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DataValue::Date(d) => Some(*d),
            DataValue::DateTime(dt) => Some(dt.date()),
            DataValue::Timestamp(ts) => Some(ts.naive_utc().date()),
            DataValue::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    /// Converte para datetime (NaiveDateTime) se possível
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            DataValue::DateTime(dt) => Some(*dt),
            DataValue::Timestamp(ts) => Some(ts.naive_utc()),
            DataValue::Date(d) => d.and_hms_opt(0, 0, 0),
            DataValue::String(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok(),
            _ => None,
        }
    }

    /// Verifica se é nulo
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }
}

/// Tabela nomeada do warehouse com ordem de colunas estável
///
/// As linhas são `DataRow` (HashMap), que não preserva ordem; a lista
/// `columns` carrega a ordem canônica exigida pelos loaders CSV/SQL.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<DataRow>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<&str>, rows: Vec<DataRow>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// Número de linhas da tabela
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Valor de uma célula, tratando coluna ausente como nulo
    pub fn value(&self, row: usize, column: &str) -> DataValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column).cloned())
            .unwrap_or(DataValue::Null)
    }
}

/// Resultado de uma operação de pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineResult {
    pub rows_processed: usize,
    pub rows_successful: usize,
    pub rows_failed: usize,
    pub execution_time_ms: u64,
    pub errors: Vec<String>,
}

impl PipelineResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_rate(&self) -> f64 {
        if self.rows_processed == 0 {
            0.0
        } else {
            self.rows_successful as f64 / self.rows_processed as f64
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Estados do pipeline para rastreamento de execução
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Idle,
    Extracting,
    Transforming,
    Loading,
    Completed,
    Failed(String),
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Ocioso"),
            PipelineState::Extracting => write!(f, "Extraindo"),
            PipelineState::Transforming => write!(f, "Transformando"),
            PipelineState::Loading => write!(f, "Carregando"),
            PipelineState::Completed => write!(f, "Concluído"),
            PipelineState::Failed(error) => write!(f, "Falhou: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_value_conversions() {
        assert_eq!(DataValue::Integer(7).as_float(), Some(7.0));
        assert_eq!(DataValue::String("3.5".to_string()).as_float(), Some(3.5));
        assert_eq!(DataValue::Float(2.9).as_integer(), Some(2));
        assert!(DataValue::Null.is_null());
        assert_eq!(DataValue::Null.as_string(), None);
    }

    #[test]
    fn test_data_value_from_option() {
        let some: DataValue = Some(10i64).into();
        let none: DataValue = Option::<i64>::None.into();
        assert_eq!(some, DataValue::Integer(10));
        assert_eq!(none, DataValue::Null);
    }

    #[test]
    fn test_data_value_dates() {
        let d = NaiveDate::from_ymd_opt(2017, 5, 20).unwrap();
        let v = DataValue::Date(d);
        assert_eq!(v.as_string(), Some("2017-05-20".to_string()));
        assert_eq!(v.as_date(), Some(d));

        let dt = DataValue::String("2017-05-20 10:56:33".to_string());
        assert_eq!(dt.as_datetime().map(|x| x.date()), Some(d));
    }

    #[test]
    fn test_table_value_missing_column() {
        let mut row = DataRow::new();
        row.insert("a".to_string(), DataValue::Integer(1));
        let table = Table::new("t", vec!["a", "b"], vec![row]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, "a"), DataValue::Integer(1));
        assert_eq!(table.value(0, "b"), DataValue::Null);
    }

    #[test]
    fn test_pipeline_result_success_rate() {
        let mut result = PipelineResult::new();
        assert_eq!(result.success_rate(), 0.0);

        result.rows_processed = 10;
        result.rows_successful = 8;
        result.rows_failed = 2;
        assert!((result.success_rate() - 0.8).abs() < f64::EPSILON);
    }
}
