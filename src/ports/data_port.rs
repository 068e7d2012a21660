//! Candle data access port trait.

use crate::domain::candle::AssetSeries;
use crate::domain::error::StratsimError;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Full candle history for one asset, ordered ascending by time.
    fn fetch_series(&self, asset: &str) -> Result<AssetSeries, StratsimError>;

    fn list_assets(&self) -> Result<Vec<String>, StratsimError>;

    /// (first time, last time, bar count), or `None` when no data exists.
    fn data_range(
        &self,
        asset: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, StratsimError>;
}
