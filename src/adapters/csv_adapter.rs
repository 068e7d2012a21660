//! CSV candle directory adapter.
//!
//! One `{ASSET}.csv` file per asset with a header row:
//! `time,open,high,low,close,volume`. Timestamps accept either
//! `YYYY-MM-DD HH:MM:SS` or a bare `YYYY-MM-DD` (taken as midnight).

use crate::domain::candle::{AssetSeries, Candle};
use crate::domain::error::StratsimError;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, asset: &str) -> PathBuf {
        self.base_path.join(format!("{asset}.csv"))
    }
}

fn parse_time(raw: &str) -> Result<NaiveDateTime, StratsimError> {
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(t);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        .map_err(|e| StratsimError::Data {
            reason: format!("invalid time '{raw}': {e}"),
        })
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, StratsimError> {
    record
        .get(index)
        .ok_or_else(|| StratsimError::Data {
            reason: format!("missing {name} column"),
        })?
        .trim()
        .parse()
        .map_err(|e| StratsimError::Data {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, asset: &str) -> Result<AssetSeries, StratsimError> {
        let path = self.csv_path(asset);
        let content = fs::read_to_string(&path).map_err(|e| StratsimError::Data {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| StratsimError::Data {
                reason: format!("CSV parse error in {}: {e}", path.display()),
            })?;

            let time_str = record.get(0).ok_or_else(|| StratsimError::Data {
                reason: "missing time column".into(),
            })?;

            candles.push(Candle {
                time: parse_time(time_str.trim())?,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        // The engine requires ascending time; files are not trusted to be sorted.
        candles.sort_by_key(|c| c.time);

        Ok(AssetSeries::new(asset, candles))
    }

    fn list_assets(&self) -> Result<Vec<String>, StratsimError> {
        let mut assets = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                assets.push(stem.to_string());
            }
        }
        assets.sort();
        Ok(assets)
    }

    fn data_range(
        &self,
        asset: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, StratsimError> {
        if !self.csv_path(asset).exists() {
            return Ok(None);
        }
        let series = self.fetch_series(asset)?;
        match (series.candles.first(), series.candles.last()) {
            (Some(first), Some(last)) => Ok(Some((first.time, last.time, series.len()))),
            _ => Ok(None),
        }
    }
}
