use crate::types::record::WeatherRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series is empty")]
    Empty,

    #[error("duplicate record for {0}")]
    DuplicateDate(NaiveDate),

    #[error("missing record for {0}: a series must cover every date in its span")]
    MissingDate(NaiveDate),
}

/// A contiguous run of daily weather records.
///
/// Construction enforces that the records are sorted and cover every date
/// between the first and last day with no duplicates, so lookups by date are
/// a constant-time offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSeries {
    records: Vec<WeatherRecord>,
}

impl WeatherSeries {
    pub fn from_records(mut records: Vec<WeatherRecord>) -> Result<Self, SeriesError> {
        if records.is_empty() {
            return Err(SeriesError::Empty);
        }
        records.sort_by_key(|r| r.day);
        let mut expected = records[0].day;
        for record in &records {
            if record.day < expected {
                return Err(SeriesError::DuplicateDate(record.day));
            }
            if record.day > expected {
                return Err(SeriesError::MissingDate(expected));
            }
            expected = match expected.succ_opt() {
                Some(next) => next,
                None => return Err(SeriesError::MissingDate(expected)),
            };
        }
        Ok(WeatherSeries { records })
    }

    pub fn records(&self) -> &[WeatherRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.records[0].day
    }

    pub fn end_date(&self) -> NaiveDate {
        self.records[self.records.len() - 1].day
    }

    /// Record for a date, `None` outside the span.
    pub fn get(&self, day: NaiveDate) -> Option<&WeatherRecord> {
        let offset = (day - self.start_date()).num_days();
        if offset < 0 {
            return None;
        }
        self.records.get(offset as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: NaiveDate) -> WeatherRecord {
        WeatherRecord {
            day,
            temp_min: 4.0,
            temp_max: 12.0,
            rain: 0.1,
            irradiation: 8.0e6,
            wind: 3.0,
            vapour_pressure: 9.5,
            snow_depth: None,
            e0: 0.2,
            es0: 0.18,
            et0: 0.15,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn accepts_contiguous_records_in_any_order() {
        let days = [d(2021, 3, 2), d(2021, 3, 1), d(2021, 3, 3)];
        let series = WeatherSeries::from_records(days.map(record).to_vec()).unwrap();
        assert_eq!(series.start_date(), d(2021, 3, 1));
        assert_eq!(series.end_date(), d(2021, 3, 3));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn rejects_gaps_and_duplicates() {
        let gap = [d(2021, 3, 1), d(2021, 3, 3)].map(record).to_vec();
        assert_eq!(
            WeatherSeries::from_records(gap).unwrap_err(),
            SeriesError::MissingDate(d(2021, 3, 2))
        );
        let dup = [d(2021, 3, 1), d(2021, 3, 1)].map(record).to_vec();
        assert_eq!(
            WeatherSeries::from_records(dup).unwrap_err(),
            SeriesError::DuplicateDate(d(2021, 3, 1))
        );
        assert_eq!(
            WeatherSeries::from_records(Vec::new()).unwrap_err(),
            SeriesError::Empty
        );
    }

    #[test]
    fn lookup_by_date_is_an_offset() {
        let days = [d(2021, 3, 1), d(2021, 3, 2), d(2021, 3, 3)];
        let series = WeatherSeries::from_records(days.map(record).to_vec()).unwrap();
        assert_eq!(series.get(d(2021, 3, 2)).map(|r| r.day), Some(d(2021, 3, 2)));
        assert!(series.get(d(2021, 2, 28)).is_none());
        assert!(series.get(d(2021, 3, 4)).is_none());
    }
}
