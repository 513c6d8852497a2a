//! Repair of the CHESS-SCAPE 360-day model calendar.
//!
//! The climate archives use twelve 30-day months. Each model day is mapped to
//! a real Gregorian date by reusing its day-of-year against the source year,
//! then the handful of dates that receives no model day (late December, and
//! Feb 29 in leap years) is filled from the nearest mapped date.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalendarError {
    #[error("day {day} is outside the 360-day model year {year} (expected 1..=360)")]
    InvalidDayOfYear { year: i32, day: u32 },
}

/// A day in the archives' 360-day model calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Day360 {
    pub year: i32,
    /// 1..=360.
    pub day: u32,
}

impl Day360 {
    pub fn new(year: i32, day: u32) -> Result<Self, CalendarError> {
        if !(1..=360).contains(&day) {
            return Err(CalendarError::InvalidDayOfYear { year, day });
        }
        Ok(Day360 { year, day })
    }

    /// Gregorian date with the same ordinal day-of-year.
    pub fn to_gregorian(self) -> Result<NaiveDate, CalendarError> {
        NaiveDate::from_yo_opt(self.year, self.day).ok_or(CalendarError::InvalidDayOfYear {
            year: self.year,
            day: self.day,
        })
    }
}

/// Maps 360-day-calendar rows onto Gregorian dates and fills the dates the
/// model calendar never produces. Later duplicates of a date win, matching
/// iteration order of the input.
pub fn normalize_to_gregorian<T: Clone>(
    rows: impl IntoIterator<Item = (Day360, T)>,
) -> Result<BTreeMap<NaiveDate, T>, CalendarError> {
    let mut mapped = BTreeMap::new();
    for (day, value) in rows {
        mapped.insert(day.to_gregorian()?, value);
    }
    fill_date_gaps(&mut mapped);
    Ok(mapped)
}

/// Inserts every missing date between the first and last key, copying the
/// value of the nearest present date. Equidistant neighbours resolve to the
/// earlier date.
pub fn fill_date_gaps<T: Clone>(map: &mut BTreeMap<NaiveDate, T>) {
    let (Some(first), Some(last)) = (
        map.keys().next().copied(),
        map.keys().next_back().copied(),
    ) else {
        return;
    };
    let mut fills = Vec::new();
    let mut date = first;
    while date <= last {
        if !map.contains_key(&date) {
            let before = map.range(..date).next_back();
            let after = map.range(date..).next();
            let nearest = match (before, after) {
                (Some((b, bv)), Some((a, av))) => {
                    let to_b = (date - *b).num_days();
                    let to_a = (*a - date).num_days();
                    if to_b <= to_a {
                        Some(bv.clone())
                    } else {
                        Some(av.clone())
                    }
                }
                (Some((_, v)), None) | (None, Some((_, v))) => Some(v.clone()),
                (None, None) => None,
            };
            if let Some(value) = nearest {
                fills.push((date, value));
            }
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    map.extend(fills);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn rejects_days_outside_the_model_year() {
        assert!(Day360::new(2021, 0).is_err());
        assert!(Day360::new(2021, 361).is_err());
        assert!(Day360::new(2021, 360).is_ok());
    }

    #[test]
    fn day_of_year_is_reused_against_the_source_year() {
        // Non-leap year: day 360 is Dec 26.
        assert_eq!(
            Day360::new(2021, 360).unwrap().to_gregorian().unwrap(),
            d(2021, 12, 26)
        );
        // Leap year: the ordinal shifts past Feb 29, day 360 is Dec 25.
        assert_eq!(
            Day360::new(2020, 360).unwrap().to_gregorian().unwrap(),
            d(2020, 12, 25)
        );
        assert_eq!(
            Day360::new(2020, 60).unwrap().to_gregorian().unwrap(),
            d(2020, 2, 29)
        );
    }

    #[test]
    fn single_year_normalization_spans_day_one_to_day_360() {
        let rows = (1..=360).map(|day| (Day360::new(2021, day).unwrap(), day));
        let map = normalize_to_gregorian(rows).unwrap();
        assert_eq!(map.keys().next(), Some(&d(2021, 1, 1)));
        assert_eq!(map.keys().next_back(), Some(&d(2021, 12, 26)));
        assert_eq!(map.len(), 360);
        // No interior gaps: every date in the span is present.
        let mut date = d(2021, 1, 1);
        while date <= d(2021, 12, 26) {
            assert!(map.contains_key(&date), "{date}");
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn year_boundary_gap_is_filled_from_the_nearest_year() {
        let rows = (1..=360)
            .map(|day| (Day360::new(2020, day).unwrap(), (2020, day)))
            .chain((1..=360).map(|day| (Day360::new(2021, day).unwrap(), (2021, day))));
        let map = normalize_to_gregorian(rows).unwrap();
        // 2020 is a leap year, so days map up to Dec 25 and Dec 26-31 are
        // backfilled across the year boundary.
        assert_eq!(map[&d(2020, 12, 25)], (2020, 360));
        for day in 26..=28 {
            assert_eq!(map[&d(2020, 12, day)], (2020, 360), "Dec {day}");
        }
        // Dec 28 is 3 days from both neighbours; the earlier one wins.
        for day in 29..=31 {
            assert_eq!(map[&d(2020, 12, day)], (2021, 1), "Dec {day}");
        }
        let expected = 360 + 6 + 360;
        assert_eq!(map.len(), expected);
    }

    #[test]
    fn equidistant_fill_takes_the_earlier_value() {
        let mut map = BTreeMap::new();
        map.insert(d(2021, 1, 1), "a");
        map.insert(d(2021, 1, 5), "b");
        fill_date_gaps(&mut map);
        assert_eq!(map[&d(2021, 1, 2)], "a");
        assert_eq!(map[&d(2021, 1, 3)], "a");
        assert_eq!(map[&d(2021, 1, 4)], "b");
    }

    #[test]
    fn filling_an_empty_or_singleton_map_is_a_no_op() {
        let mut empty: BTreeMap<NaiveDate, u8> = BTreeMap::new();
        fill_date_gaps(&mut empty);
        assert!(empty.is_empty());

        let mut one = BTreeMap::new();
        one.insert(d(2021, 6, 1), 7u8);
        fill_date_gaps(&mut one);
        assert_eq!(one.len(), 1);
    }

}
