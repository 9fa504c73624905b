//! Helpers compartilhados de leitura CSV
//!
//! Os extratos usam timestamps `%Y-%m-%d %H:%M:%S` (sem `T`), que o serde
//! do chrono não aceita por padrão; os módulos `datetime_format` e
//! `opt_datetime_format` fazem essa ponte.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{ExtractError, Result};

/// Lê um CSV com cabeçalho para registros tipados
pub(crate) fn read_csv<T, P>(path: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|_| ExtractError::FileNotFound(path.to_string_lossy().to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::new(file));

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let record: T = result?;
        rows.push(record);
    }

    Ok(rows)
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Deserializa `NaiveDateTime` no formato dos extratos
pub mod datetime_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, super::DATETIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Deserializa `Option<NaiveDateTime>`, tratando campo vazio como nulo
pub mod opt_datetime_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        match s.as_deref() {
            None | Some("") => Ok(None),
            Some(value) => NaiveDateTime::parse_from_str(value, super::DATETIME_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize)]
    struct Row {
        id: String,
        #[serde(with = "datetime_format")]
        ts: NaiveDateTime,
        #[serde(deserialize_with = "opt_datetime_format::deserialize")]
        maybe_ts: Option<NaiveDateTime>,
        value: Option<f64>,
    }

    #[test]
    fn test_read_csv_typed() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "id,ts,maybe_ts,value").unwrap();
        writeln!(temp_file, "a,2017-10-02 10:56:33,2017-10-04 19:55:00,29.9").unwrap();
        writeln!(temp_file, "b,2018-01-15 08:00:00,,").unwrap();

        let rows: Vec<Row> = read_csv(temp_file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a");
        assert_eq!(rows[0].ts.format("%Y-%m-%d").to_string(), "2017-10-02");
        assert!(rows[0].maybe_ts.is_some());
        assert_eq!(rows[0].value, Some(29.9));
        assert!(rows[1].maybe_ts.is_none());
        assert!(rows[1].value.is_none());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result: Result<Vec<Row>> = read_csv("/caminho/inexistente.csv");
        assert!(result.is_err());
    }
}
