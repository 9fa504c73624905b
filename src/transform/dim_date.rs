//! Dimensão de datas: uma linha por dia calendário do intervalo configurado

use chrono::{Datelike, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::config::DateDimensionConfig;
use crate::error::Result;
use crate::types::{DataRow, DataValue, Table};

/// Feriados nacionais brasileiros cobertos pelo dataset (2016-2018)
const HOLIDAYS: &[&str] = &[
    // 2016: Confraternização, Carnaval, Sexta-feira Santa, Tiradentes,
    // Trabalho, Independência, Nossa Senhora, Finados, República, Natal
    "2016-01-01",
    "2016-02-08",
    "2016-02-09",
    "2016-03-25",
    "2016-04-21",
    "2016-05-01",
    "2016-09-07",
    "2016-10-12",
    "2016-11-02",
    "2016-11-15",
    "2016-12-25",
    // 2017
    "2017-01-01",
    "2017-02-27",
    "2017-02-28",
    "2017-04-14",
    "2017-04-21",
    "2017-05-01",
    "2017-09-07",
    "2017-10-12",
    "2017-11-02",
    "2017-11-15",
    "2017-12-25",
    // 2018
    "2018-01-01",
    "2018-02-12",
    "2018-02-13",
    "2018-03-30",
    "2018-04-21",
    "2018-05-01",
    "2018-09-07",
    "2018-10-12",
    "2018-11-02",
    "2018-11-15",
    "2018-12-25",
];

/// Dimensão de datas construída, com o mapa data → date_key
#[derive(Debug, Clone)]
pub struct DateDimension {
    pub table: Table,
    /// full_date → date_key (YYYYMMDD), usado na resolução de FKs do fato
    pub keys: HashMap<NaiveDate, i64>,
}

/// Construtor da dimensão de datas
#[derive(Debug, Clone)]
pub struct DateDimensionBuilder {
    start_date: NaiveDate,
    end_date: NaiveDate,
    holidays: HashSet<NaiveDate>,
}

impl DateDimensionBuilder {
    /// Cria o construtor a partir do intervalo configurado; falha rápido
    /// se as datas estiverem malformadas ou invertidas
    pub fn new(config: &DateDimensionConfig) -> Result<Self> {
        let (start_date, end_date) = config.parse_range()?;
        let holidays = HOLIDAYS
            .iter()
            .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .collect();

        Ok(Self {
            start_date,
            end_date,
            holidays,
        })
    }

    /// Gera a sequência contígua de dias com atributos calendário derivados
    ///
    /// Determinístico: a mesma configuração produz sempre a mesma tabela.
    pub fn build(&self) -> Result<DateDimension> {
        info!(
            start = %self.start_date,
            end = %self.end_date,
            "Construindo dimensão de datas"
        );

        let mut rows = Vec::new();
        let mut keys = HashMap::new();
        let created_at = Utc::now();

        let mut day = self.start_date;
        while day <= self.end_date {
            let date_key = date_key_for(day);
            keys.insert(day, date_key);

            let day_of_week = day.weekday().number_from_monday() as i64;
            let quarter = ((day.month() - 1) / 3 + 1) as i64;

            let mut row = DataRow::new();
            row.insert("date_key".to_string(), DataValue::Integer(date_key));
            row.insert("full_date".to_string(), DataValue::Date(day));
            row.insert("year".to_string(), DataValue::Integer(day.year() as i64));
            row.insert("quarter".to_string(), DataValue::Integer(quarter));
            row.insert("month".to_string(), DataValue::Integer(day.month() as i64));
            row.insert(
                "month_name".to_string(),
                DataValue::String(day.format("%B").to_string()),
            );
            row.insert(
                "week".to_string(),
                DataValue::Integer(day.iso_week().week() as i64),
            );
            row.insert(
                "day_of_month".to_string(),
                DataValue::Integer(day.day() as i64),
            );
            row.insert("day_of_week".to_string(), DataValue::Integer(day_of_week));
            row.insert(
                "day_name".to_string(),
                DataValue::String(day.format("%A").to_string()),
            );
            row.insert(
                "is_weekend".to_string(),
                DataValue::Boolean(day_of_week >= 6),
            );
            row.insert(
                "is_holiday".to_string(),
                DataValue::Boolean(self.holidays.contains(&day)),
            );
            // Ano fiscal brasileiro = ano calendário
            row.insert(
                "fiscal_year".to_string(),
                DataValue::Integer(day.year() as i64),
            );
            row.insert("fiscal_quarter".to_string(), DataValue::Integer(quarter));
            row.insert("created_at".to_string(), DataValue::Timestamp(created_at));

            rows.push(row);
            day = day.succ_opt().ok_or_else(|| {
                crate::error::TransformError::InvalidDateRange(format!(
                    "não foi possível avançar além de {}",
                    day
                ))
            })?;
        }

        let holidays_marked = rows
            .iter()
            .filter(|r| r.get("is_holiday") == Some(&DataValue::Boolean(true)))
            .count();
        info!(
            rows = rows.len(),
            holidays = holidays_marked,
            "Dimensão de datas construída"
        );

        let table = Table::new(
            "dim_date",
            vec![
                "date_key",
                "full_date",
                "year",
                "quarter",
                "month",
                "month_name",
                "week",
                "day_of_month",
                "day_of_week",
                "day_name",
                "is_weekend",
                "is_holiday",
                "fiscal_year",
                "fiscal_quarter",
                "created_at",
            ],
            rows,
        );

        Ok(DateDimension { table, keys })
    }
}

/// Chave da dimensão de datas no formato YYYYMMDD
pub(crate) fn date_key_for(date: NaiveDate) -> i64 {
    date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EtlConfig;

    fn build_range(start: &str, end: &str) -> DateDimension {
        let config = EtlConfig::builder().date_range(start, end).build().unwrap();
        DateDimensionBuilder::new(&config.date_dimension)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_contiguous_range_and_keys() {
        let dim = build_range("2017-01-01", "2017-12-31");
        assert_eq!(dim.table.len(), 365);

        // date_key == full_date formatada como inteiro YYYYMMDD, sem lacunas
        let mut expected = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        for row in &dim.table.rows {
            assert_eq!(row["full_date"].as_date(), Some(expected));
            assert_eq!(row["date_key"].as_integer(), Some(date_key_for(expected)));
            expected = expected.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_weekend_and_weekday_numbers() {
        let dim = build_range("2017-05-01", "2017-05-07");
        // 2017-05-01 é segunda-feira
        assert_eq!(dim.table.value(0, "day_of_week"), DataValue::Integer(1));
        assert_eq!(dim.table.value(0, "is_weekend"), DataValue::Boolean(false));
        // domingo 2017-05-07
        assert_eq!(dim.table.value(6, "day_of_week"), DataValue::Integer(7));
        assert_eq!(dim.table.value(6, "is_weekend"), DataValue::Boolean(true));
    }

    #[test]
    fn test_holiday_flag() {
        let dim = build_range("2017-09-06", "2017-09-08");
        // 7 de setembro: Independência
        assert_eq!(dim.table.value(0, "is_holiday"), DataValue::Boolean(false));
        assert_eq!(dim.table.value(1, "is_holiday"), DataValue::Boolean(true));
        assert_eq!(dim.table.value(2, "is_holiday"), DataValue::Boolean(false));
    }

    #[test]
    fn test_fiscal_equals_calendar() {
        let dim = build_range("2018-11-15", "2018-11-15");
        assert_eq!(dim.table.value(0, "fiscal_year"), DataValue::Integer(2018));
        assert_eq!(dim.table.value(0, "quarter"), DataValue::Integer(4));
        assert_eq!(dim.table.value(0, "fiscal_quarter"), DataValue::Integer(4));
    }

    #[test]
    fn test_key_map_matches_rows() {
        let dim = build_range("2016-02-28", "2016-03-01");
        // 2016 é bissexto
        assert_eq!(dim.table.len(), 3);
        let leap = NaiveDate::from_ymd_opt(2016, 2, 29).unwrap();
        assert_eq!(dim.keys.get(&leap), Some(&20160229));
    }
}
