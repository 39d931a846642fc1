//! Loading and filtering of house-price index records

use crate::config::SourceColumns;
use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Canonical name of the date column after filtering
pub const DATE_COLUMN: &str = "date";
/// Canonical name of the region column after filtering
pub const REGION_COLUMN: &str = "region";
/// Canonical name of the target column after filtering
pub const SALES_VOLUME_COLUMN: &str = "sales_volume";

const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Data loader for house-price index CSV files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load the source table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, columns: &SourceColumns) -> Result<RawTable> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AnalysisError::LoadError(format!("cannot open {}: {}", path.display(), e))
        })?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()
            .map_err(|e| {
                AnalysisError::LoadError(format!("cannot parse {}: {}", path.display(), e))
            })?;

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded source table"
        );
        Self::from_dataframe(df, columns)
    }

    /// Wrap an in-memory DataFrame, checking the source columns are present
    pub fn from_dataframe(df: DataFrame, columns: &SourceColumns) -> Result<RawTable> {
        let present = df.get_column_names();
        for name in columns.names() {
            if !present.contains(&name) {
                return Err(AnalysisError::MissingColumn(name.to_string()));
            }
        }

        Ok(RawTable {
            df,
            columns: columns.clone(),
        })
    }
}

/// The unfiltered source table, all regions and columns
#[derive(Debug, Clone)]
pub struct RawTable {
    df: DataFrame,
    columns: SourceColumns,
}

impl RawTable {
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Keep one region's rows, select date, region and sales volume under
    /// their canonical names, and parse them into an [`ObservationTable`]
    pub fn filter_region(&self, region: &str) -> Result<ObservationTable> {
        let cols = &self.columns;
        let filtered = self
            .df
            .clone()
            .lazy()
            .filter(col(&cols.region).eq(lit(region)))
            .select([
                col(&cols.date).cast(DataType::Utf8).alias(DATE_COLUMN),
                col(&cols.region).alias(REGION_COLUMN),
                col(&cols.sales_volume)
                    .cast(DataType::Float64)
                    .alias(SALES_VOLUME_COLUMN),
            ])
            .collect()?;

        if filtered.height() == 0 {
            return Err(AnalysisError::EmptyResult(format!(
                "no rows match region '{}'",
                region
            )));
        }

        debug!(region, rows = filtered.height(), "filtered source table");
        ObservationTable::from_dataframe(&filtered)
    }
}

/// One month of one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub date: NaiveDate,
    pub region: String,
    pub sales_volume: Option<u64>,
}

impl Observation {
    pub fn new(date: NaiveDate, region: impl Into<String>, sales_volume: Option<u64>) -> Self {
        Self {
            date,
            region: region.into(),
            sales_volume,
        }
    }
}

/// Observations of a single region with at most one row per date
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObservationTable {
    observations: Vec<Observation>,
}

impl ObservationTable {
    /// Build a table, rejecting duplicate dates and mixed regions
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(observations.len());
        for obs in &observations {
            if !seen.insert(obs.date) {
                return Err(AnalysisError::DataError(format!(
                    "duplicate date {} for region '{}'",
                    obs.date, obs.region
                )));
            }
        }
        if let Some(first) = observations.first() {
            if let Some(other) = observations.iter().find(|o| o.region != first.region) {
                return Err(AnalysisError::DataError(format!(
                    "table mixes regions '{}' and '{}'",
                    first.region, other.region
                )));
            }
        }

        Ok(Self { observations })
    }

    /// Parse a DataFrame with the canonical `date`, `region` and
    /// `sales_volume` columns
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let dates = df.column(DATE_COLUMN)?.utf8()?;
        let regions = df.column(REGION_COLUMN)?.utf8()?;
        let volumes = df.column(SALES_VOLUME_COLUMN)?.f64()?;

        let mut observations = Vec::with_capacity(df.height());
        for ((date, region), volume) in dates.into_iter().zip(regions).zip(volumes) {
            let date = date
                .ok_or_else(|| AnalysisError::DataError("missing date".to_string()))
                .and_then(parse_date)?;
            let region = region.ok_or_else(|| {
                AnalysisError::DataError(format!("missing region on {}", date))
            })?;
            let sales_volume = volume.map(|v| to_count(v, date)).transpose()?;
            observations.push(Observation::new(date, region, sales_volume));
        }

        Self::new(observations)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Region shared by every row, if the table is non-empty
    pub fn region(&self) -> Option<&str> {
        self.observations.first().map(|o| o.region.as_str())
    }

    /// Earliest and latest dates in the table
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.observations.iter().map(|o| o.date).min()?;
        let max = self.observations.iter().map(|o| o.date).max()?;
        Some((min, max))
    }

    /// A copy of the table ordered by ascending date
    pub fn sorted_by_date(&self) -> Self {
        let mut observations = self.observations.clone();
        observations.sort_by_key(|o| o.date);
        Self { observations }
    }

    /// Rows matching a predicate, in their current order
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Observation) -> bool,
    {
        Self {
            observations: self
                .observations
                .iter()
                .filter(|o| predicate(o))
                .cloned()
                .collect(),
        }
    }

    /// Export to a DataFrame with the canonical column names
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self
            .observations
            .iter()
            .map(|o| o.date.to_string())
            .collect();
        let regions: Vec<&str> = self
            .observations
            .iter()
            .map(|o| o.region.as_str())
            .collect();
        let volumes: Vec<Option<u64>> = self.observations.iter().map(|o| o.sales_volume).collect();

        Ok(DataFrame::new(vec![
            Series::new(DATE_COLUMN, dates),
            Series::new(REGION_COLUMN, regions),
            Series::new(SALES_VOLUME_COLUMN, volumes),
        ])?)
    }
}

/// Parse a day/month/year date, falling back to ISO format
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .ok_or_else(|| AnalysisError::DataError(format!("unparseable date '{}'", text)))
}

fn to_count(value: f64, date: NaiveDate) -> Result<u64> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(AnalysisError::DataError(format!(
            "sales volume {} on {} is not a non-negative count",
            value, date
        )));
    }
    Ok(value as u64)
}
