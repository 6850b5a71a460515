use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Number of business days in a customer's onboarding window.
pub const WINDOW_DAYS: usize = 3;

/// Weekend rule plus an immutable set of holidays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new<I>(holidays: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn holidays(&self) -> &BTreeSet<NaiveDate> {
        &self.holidays
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// Returns `date` if it is a business day, otherwise the next one.
    pub fn advance_to_business_day(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while !self.is_business_day(current) {
            current += Duration::days(1);
        }
        current
    }

    /// The three scheduled dates of a block inserted on `today`.
    pub fn schedule_window(&self, today: NaiveDate) -> [NaiveDate; WINDOW_DAYS] {
        let first = self.advance_to_business_day(today);
        let second = self.advance_to_business_day(first + Duration::days(1));
        let third = self.advance_to_business_day(second + Duration::days(1));
        [first, second, third]
    }

    /// Date on which a block whose earliest row is `first_day` ages out.
    pub fn expiry_date(&self, first_day: NaiveDate) -> NaiveDate {
        (0..WINDOW_DAYS).fold(first_day, |day, _| {
            self.advance_to_business_day(day + Duration::days(1))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn weekdays_are_returned_unchanged() {
        let calendar = HolidayCalendar::default();
        let wednesday = date(2025, 10, 1);
        assert_eq!(calendar.advance_to_business_day(wednesday), wednesday);
    }

    #[test]
    fn weekend_rolls_to_monday() {
        let calendar = HolidayCalendar::default();
        assert_eq!(
            calendar.advance_to_business_day(date(2025, 10, 4)),
            date(2025, 10, 6)
        );
        assert_eq!(
            calendar.advance_to_business_day(date(2025, 10, 5)),
            date(2025, 10, 6)
        );
    }

    #[test]
    fn holiday_after_weekend_is_skipped_too() {
        let calendar = HolidayCalendar::new([date(2025, 5, 17), date(2025, 5, 19)]);
        // Saturday holiday, Sunday, Monday holiday.
        assert_eq!(
            calendar.advance_to_business_day(date(2025, 5, 17)),
            date(2025, 5, 20)
        );
    }

    #[test]
    fn window_skips_weekend_and_holidays() {
        let calendar = HolidayCalendar::new([date(2025, 5, 19)]);
        // Thursday insertion: Thu, Fri, then Mon is a holiday so Tue.
        assert_eq!(
            calendar.schedule_window(date(2025, 5, 15)),
            [date(2025, 5, 15), date(2025, 5, 16), date(2025, 5, 20)]
        );
    }

    #[test]
    fn monday_block_expires_on_thursday() {
        let calendar = HolidayCalendar::default();
        assert_eq!(calendar.expiry_date(date(2025, 10, 6)), date(2025, 10, 9));
    }

    #[test]
    fn friday_block_expiry_crosses_weekend() {
        let calendar = HolidayCalendar::default();
        // Fri -> Mon, Tue, Wed.
        assert_eq!(calendar.expiry_date(date(2025, 10, 10)), date(2025, 10, 15));
    }

    proptest! {
        #[test]
        fn advance_is_idempotent_and_lands_on_business_day(
            offset in 0i64..3650,
            holiday_offsets in proptest::collection::vec(0i64..3660, 0..40),
        ) {
            let base = date(2024, 1, 1);
            let calendar = HolidayCalendar::new(
                holiday_offsets.into_iter().map(|days| base + Duration::days(days)),
            );
            let start = base + Duration::days(offset);
            let advanced = calendar.advance_to_business_day(start);

            prop_assert!(advanced >= start);
            prop_assert!(calendar.is_business_day(advanced));
            prop_assert_eq!(calendar.advance_to_business_day(advanced), advanced);
        }

        #[test]
        fn window_dates_strictly_increase(offset in 0i64..3650) {
            let calendar = HolidayCalendar::new([date(2025, 5, 17), date(2025, 5, 19)]);
            let window = calendar.schedule_window(date(2024, 1, 1) + Duration::days(offset));
            prop_assert!(window[0] < window[1] && window[1] < window[2]);
            prop_assert!(window.iter().all(|day| calendar.is_business_day(*day)));
        }
    }
}
