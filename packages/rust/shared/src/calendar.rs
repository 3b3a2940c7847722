//! Day-of-year arithmetic for matching articles across years.
//!
//! All positions are computed against a fixed non-leap reference year, so a
//! given day/month has the same position whatever year it was published in.

use chrono::{Datelike, NaiveDate};

use crate::error::{Result, TijdmachineError};
use crate::types::ArticleRecord;

/// Non-leap year used for every day-of-year computation.
pub const REFERENCE_YEAR: i32 = 2001;

/// Length of the reference year.
pub const DAYS_IN_YEAR: u32 = 365;

/// Reject a day outside 1..=31 or a month outside 1..=12.
///
/// Impossible combinations such as Feb 30 pass; see [`day_of_year`].
pub fn validate_day_month(day: u32, month: u32) -> Result<()> {
    if !(1..=31).contains(&day) {
        return Err(TijdmachineError::validation(format!(
            "day {day} out of range 1..=31"
        )));
    }
    if !(1..=12).contains(&month) {
        return Err(TijdmachineError::validation(format!(
            "month {month} out of range 1..=12"
        )));
    }
    Ok(())
}

/// Day of year (1..=365) for a day/month in the reference year.
///
/// Days past the end of the month (Feb 30, Apr 31) are clamped to the
/// month's last day. Returns `None` for month 0/13+ or day 0.
pub fn day_of_year(day: u32, month: u32) -> Option<u32> {
    if day == 0 || !(1..=12).contains(&month) {
        return None;
    }
    (1..=day.min(31))
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, d))
        .map(|date| date.ordinal())
}

/// Day of year of a stored date; Feb 29 counts as Feb 28.
pub fn date_day_of_year(date: NaiveDate) -> u32 {
    // Only Feb 29 can fail to map, and it clamps to Feb 28.
    day_of_year(date.day(), date.month()).unwrap_or(59)
}

/// Distance between two days of year: `|a - b| mod 365`.
///
/// Positions never wrap over the year end, so Dec 31 is 364 days from Jan 1.
pub fn day_distance(a: u32, b: u32) -> u32 {
    a.abs_diff(b) % DAYS_IN_YEAR
}

/// The record closest to `day`/`month` and its distance in days.
///
/// Ties go to the lowest identifier; records without an identifier rank
/// after identified ones and keep iteration order among themselves.
pub fn closest_by_day_month<'a, I>(
    records: I,
    day: u32,
    month: u32,
) -> Option<(&'a ArticleRecord, u32)>
where
    I: IntoIterator<Item = &'a ArticleRecord>,
{
    let target = day_of_year(day, month)?;
    records
        .into_iter()
        .map(|r| (r, day_distance(date_day_of_year(r.publication_date), target)))
        .min_by_key(|(r, distance)| (*distance, r.id.unwrap_or(i64::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;

    fn record(id: i64, y: i32, m: u32, d: u32) -> ArticleRecord {
        ArticleRecord::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            "Rotterdamse courant",
            format!("artikel {id}"),
            Language::Dutch,
        )
        .unwrap()
        .with_id(id)
    }

    #[test]
    fn day_month_validation() {
        assert!(validate_day_month(30, 2).is_ok());
        assert!(validate_day_month(0, 2).is_err());
        assert!(validate_day_month(32, 1).is_err());
        assert!(validate_day_month(1, 13).is_err());
    }

    #[test]
    fn day_of_year_basics() {
        assert_eq!(day_of_year(1, 1), Some(1));
        assert_eq!(day_of_year(1, 3), Some(60));
        assert_eq!(day_of_year(31, 12), Some(365));
        assert_eq!(day_of_year(0, 5), None);
        assert_eq!(day_of_year(5, 13), None);
    }

    #[test]
    fn impossible_days_clamp_to_month_end() {
        assert_eq!(day_of_year(30, 2), day_of_year(28, 2));
        assert_eq!(day_of_year(31, 4), day_of_year(30, 4));
    }

    #[test]
    fn leap_day_counts_as_feb_28() {
        let leap = NaiveDate::from_ymd_opt(1748, 2, 29).unwrap();
        assert_eq!(date_day_of_year(leap), 59);
        // Year of publication never shifts the position.
        let march = NaiveDate::from_ymd_opt(1748, 3, 1).unwrap();
        assert_eq!(date_day_of_year(march), 60);
    }

    #[test]
    fn distance_is_absolute_difference_mod_365() {
        assert_eq!(day_distance(365, 1), 364);
        assert_eq!(day_distance(1, 365), 364);
        assert_eq!(day_distance(1, 182), 181);
        assert_eq!(day_distance(152, 154), 2);
        assert_eq!(day_distance(10, 10), 0);
    }

    #[test]
    fn closest_picks_minimum_distance() {
        let records = vec![record(1, 1750, 6, 1), record(2, 1761, 6, 10)];
        let (found, distance) = closest_by_day_month(&records, 3, 6).unwrap();
        assert_eq!(found.id, Some(1));
        assert_eq!(distance, 2);
    }

    #[test]
    fn closest_tie_goes_to_lowest_id() {
        let records = vec![record(9, 1750, 6, 1), record(4, 1770, 6, 5)];
        let (found, distance) = closest_by_day_month(&records, 3, 6).unwrap();
        assert_eq!(distance, 2);
        assert_eq!(found.id, Some(4));
    }

    #[test]
    fn no_wrap_across_new_year() {
        // Dec 30 is 363 days from Jan 1, Jan 10 only 9.
        let records = vec![record(1, 1750, 12, 30), record(2, 1750, 1, 10)];
        let (found, distance) = closest_by_day_month(&records, 1, 1).unwrap();
        assert_eq!(found.id, Some(2));
        assert_eq!(distance, 9);
    }

    #[test]
    fn closest_on_empty_input() {
        let records: Vec<ArticleRecord> = Vec::new();
        assert!(closest_by_day_month(&records, 1, 1).is_none());
    }
}
