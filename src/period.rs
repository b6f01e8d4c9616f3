use time::{Date, Month, OffsetDateTime};

use crate::error::{Error, ErrorKind};

/// The calendar-month window used to bound the time entry query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    /// From the first instant of the current month up to now.
    This,
    /// The whole previous calendar month.
    #[default]
    Last,
}

impl Period {
    /// Parses the period selector. Anything other than `this` or `last` falls back
    /// to the previous month, which is the behavior invoices are usually run with.
    pub fn from_name(name: &str) -> Period {
        match name {
            "this" => Period::This,
            "last" => Period::Last,
            other => {
                log::warn!("Unknown period {:?}, falling back to the last month", other);
                Period::Last
            }
        }
    }

    /// The inclusive `[start, end]` bounds of this period as epoch milliseconds,
    /// evaluated against the current wall clock.
    pub fn bounds(&self) -> Result<(i64, i64), Error> {
        self.bounds_at(OffsetDateTime::now_utc())
    }

    /// The bounds of this period relative to the given instant. The reference
    /// instant is injected so the calendar arithmetic can be tested against fixed
    /// dates, including the January wrap into the previous year.
    pub fn bounds_at(&self, now: OffsetDateTime) -> Result<(i64, i64), Error> {
        let first_of_this_month = first_instant_of_month(now.year(), now.month())?;

        match self {
            Period::This => Ok((
                epoch_milliseconds(first_of_this_month),
                epoch_milliseconds(now),
            )),
            Period::Last => {
                let (year, month) = match now.month() {
                    Month::January => (now.year() - 1, Month::December),
                    month => (now.year(), month.previous()),
                };
                let first_of_last_month = first_instant_of_month(year, month)?;

                // The previous month ends one millisecond before this month starts
                Ok((
                    epoch_milliseconds(first_of_last_month),
                    epoch_milliseconds(first_of_this_month) - 1,
                ))
            }
        }
    }
}

/// Midnight UTC on the first day of the given month.
fn first_instant_of_month(year: i32, month: Month) -> Result<OffsetDateTime, Error> {
    let date = Date::from_calendar_date(year, month, 1).map_err(|error| {
        Error::with_error(
            ErrorKind::Configuration,
            format!("Failed to compute the first day of {month:?} {year}"),
            &error,
        )
    })?;

    Ok(date.midnight().assume_utc())
}

fn epoch_milliseconds(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(year: i32, month: Month, day: u8, hour: u8) -> OffsetDateTime {
        Date::from_calendar_date(year, month, day)
            .unwrap()
            .with_hms(hour, 0, 0)
            .unwrap()
            .assume_utc()
    }

    #[test]
    fn last_month_spans_the_whole_previous_calendar_month() {
        let now = instant(2024, Month::March, 15, 12);
        let (start, end) = Period::Last.bounds_at(now).unwrap();

        // February 2024 was a leap month of 29 days
        assert_eq!(start, 1_706_745_600_000); // 2024-02-01T00:00:00Z
        assert_eq!(end, 1_709_251_199_999); // 2024-02-29T23:59:59.999Z
    }

    #[test]
    fn this_month_runs_from_its_first_instant_to_now() {
        let now = instant(2024, Month::March, 15, 12);
        let (start, end) = Period::This.bounds_at(now).unwrap();

        assert_eq!(start, 1_709_251_200_000); // 2024-03-01T00:00:00Z
        assert_eq!(end, 1_710_504_000_000); // 2024-03-15T12:00:00Z
    }

    #[test]
    fn january_wraps_into_the_previous_year() {
        let now = instant(2024, Month::January, 10, 0);
        let (start, end) = Period::Last.bounds_at(now).unwrap();

        assert_eq!(start, 1_701_388_800_000); // 2023-12-01T00:00:00Z
        assert_eq!(end, 1_704_067_199_999); // 2023-12-31T23:59:59.999Z
    }

    #[test]
    fn unknown_selector_falls_back_to_last() {
        assert_eq!(Period::from_name("this"), Period::This);
        assert_eq!(Period::from_name("last"), Period::Last);
        assert_eq!(Period::from_name("next"), Period::Last);
        assert_eq!(Period::from_name(""), Period::Last);
    }
}
