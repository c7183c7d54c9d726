//! Conversion of fetched tables into `date`/`close` value frames.

use super::provider::{DataError, RawPoint, Table};
use crate::symbol::ValueWindow;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;

pub const DATE_COLUMN: &str = "date";
pub const CLOSE_COLUMN: &str = "close";

/// Days from 0001-01-01 (CE) to 1970-01-01; polars dates count from the latter.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM` (first of month).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok())
}

/// Read the `date` column and `value_column` of a table into points.
///
/// Empty value cells become missing values; rows without a date are rejected.
pub fn table_points(table: &Table, value_column: &str) -> Result<Vec<RawPoint>, DataError> {
    let date_col = table.require_column(DATE_COLUMN, "value series")?;
    let value_col = table.require_column(value_column, "value series")?;

    let mut points = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let raw_date = table
            .cell(row, date_col)
            .ok_or_else(|| DataError::Parse(format!("missing date at row {}", row + 1)))?;
        let date = parse_date(raw_date)
            .ok_or_else(|| DataError::Parse(format!("bad date '{raw_date}' at row {}", row + 1)))?;
        let value = match table.cell(row, value_col) {
            None => None,
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                DataError::Parse(format!("bad value '{raw}' at row {}", row + 1))
            })?),
        };
        points.push(RawPoint { date, value });
    }
    Ok(points)
}

/// Keep the points whose month lies inside `window`; all points when `None`.
pub fn apply_window(points: Vec<RawPoint>, window: Option<ValueWindow>) -> Vec<RawPoint> {
    match window {
        None => points,
        Some(w) => points.into_iter().filter(|p| w.contains(p.date)).collect(),
    }
}

/// Build the `date`/`close` frame.
pub fn points_to_frame(points: &[RawPoint]) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = points
        .iter()
        .map(|p| p.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let closes: Vec<Option<f64>> = points.iter().map(|p| p.value).collect();

    DataFrame::new(vec![
        Column::new(DATE_COLUMN.into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Parse(format!("date cast: {e}")))?,
        Column::new(CLOSE_COLUMN.into(), closes),
    ])
    .map_err(|e| DataError::Parse(format!("dataframe creation: {e}")))
}

/// Table → points → window filter → frame.
pub fn table_to_frame(
    table: &Table,
    value_column: &str,
    window: Option<ValueWindow>,
) -> Result<DataFrame, DataError> {
    let points = apply_window(table_points(table, value_column)?, window);
    points_to_frame(&points)
}

/// Read a frame produced by [`points_to_frame`] back into points.
pub fn frame_points(df: &DataFrame) -> Result<Vec<RawPoint>, DataError> {
    let map_err = |e: PolarsError| DataError::Parse(format!("column read: {e}"));
    let dates = df.column(DATE_COLUMN).map_err(map_err)?;
    let closes = df.column(CLOSE_COLUMN).map_err(map_err)?;
    let date_ca = dates.date().map_err(map_err)?;
    let close_ca = closes.f64().map_err(map_err)?;

    let mut points = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::Parse(format!("null date at row {i}")))?;
        let date = NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
            .ok_or_else(|| DataError::Parse(format!("date out of range at row {i}")))?;
        points.push(RawPoint {
            date,
            value: close_ca.get(i),
        });
    }
    Ok(points)
}
