use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;

use crate::models::{ActivityLog, AggregateTotals, Application};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    ThisWeek,
    ThisMonth,
    LastMonth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl Period {
    // Weeks run Sunday through Saturday.
    pub fn window(self, as_of: NaiveDate) -> DateWindow {
        match self {
            Period::Today => DateWindow {
                start: as_of,
                end: as_of,
            },
            Period::ThisWeek => {
                let start =
                    as_of - Duration::days(as_of.weekday().num_days_from_sunday() as i64);
                DateWindow {
                    start,
                    end: start + Duration::days(6),
                }
            }
            Period::ThisMonth => month_window(as_of),
            Period::LastMonth => {
                let previous = as_of.checked_sub_months(Months::new(1)).unwrap_or(as_of);
                month_window(previous)
            }
        }
    }
}

fn month_window(date: NaiveDate) -> DateWindow {
    let start = date.with_day(1).unwrap_or(date);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(start);
    DateWindow { start, end }
}

pub trait DatedRecord {
    fn date(&self) -> NaiveDate;
}

impl DatedRecord for ActivityLog {
    fn date(&self) -> NaiveDate {
        self.log_date
    }
}

impl DatedRecord for Application {
    fn date(&self) -> NaiveDate {
        self.app_date
    }
}

pub fn filter_by_period<'a, T: DatedRecord>(
    records: &'a [T],
    window: &DateWindow,
) -> Vec<&'a T> {
    records
        .iter()
        .filter(|record| window.contains(record.date()))
        .collect()
}

pub fn aggregate<'a, I>(logs: I) -> AggregateTotals
where
    I: IntoIterator<Item = &'a ActivityLog>,
{
    let mut totals = AggregateTotals::default();
    for log in logs {
        totals.dials += i64::from(log.dials);
        totals.pickups += i64::from(log.pickups);
        totals.quotes += i64::from(log.quotes);
        totals.applications += i64::from(log.applications);
        totals.total_premium += log.total_premium;
    }
    totals.pickup_rate = rate(totals.pickups, totals.dials);
    totals.quote_rate = rate(totals.quotes, totals.pickups);
    totals.close_rate = rate(totals.applications, totals.quotes);
    totals
}

// Zero denominators yield 0.0, never NaN.
fn rate(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn log(day: NaiveDate, dials: i32, pickups: i32, quotes: i32, applications: i32) -> ActivityLog {
        ActivityLog {
            agent_id: Uuid::new_v4(),
            log_date: day,
            dials,
            pickups,
            quotes,
            applications,
            talk_time_minutes: 0,
            total_premium: Decimal::ZERO,
        }
    }

    #[test]
    fn today_window_is_a_single_day() {
        let as_of = date(2026, 2, 4);
        let window = Period::Today.window(as_of);
        assert_eq!(window.start, as_of);
        assert_eq!(window.end, as_of);
    }

    #[test]
    fn week_window_starts_on_sunday() {
        // 2026-02-04 is a Wednesday.
        let window = Period::ThisWeek.window(date(2026, 2, 4));
        assert_eq!(window.start, date(2026, 2, 1));
        assert_eq!(window.end, date(2026, 2, 7));
    }

    #[test]
    fn week_window_can_span_a_month_boundary() {
        // 2026-04-01 is a Wednesday; its week begins the previous Sunday.
        let window = Period::ThisWeek.window(date(2026, 4, 1));
        assert_eq!(window.start, date(2026, 3, 29));
        assert_eq!(window.end, date(2026, 4, 4));
    }

    #[test]
    fn month_window_covers_the_full_month() {
        let window = Period::ThisMonth.window(date(2026, 2, 14));
        assert_eq!(window.start, date(2026, 2, 1));
        assert_eq!(window.end, date(2026, 2, 28));

        let leap = Period::ThisMonth.window(date(2024, 2, 10));
        assert_eq!(leap.end, date(2024, 2, 29));
    }

    #[test]
    fn last_month_window_crosses_a_year_boundary() {
        let window = Period::LastMonth.window(date(2026, 1, 15));
        assert_eq!(window.start, date(2025, 12, 1));
        assert_eq!(window.end, date(2025, 12, 31));
    }

    #[test]
    fn last_month_window_from_a_longer_month() {
        // March 31 minus one month clamps to February's end.
        let window = Period::LastMonth.window(date(2026, 3, 31));
        assert_eq!(window.start, date(2026, 2, 1));
        assert_eq!(window.end, date(2026, 2, 28));
    }

    #[test]
    fn filter_keeps_inclusive_bounds() {
        let window = Period::ThisMonth.window(date(2026, 2, 14));
        let logs = vec![
            log(date(2026, 1, 31), 1, 0, 0, 0),
            log(date(2026, 2, 1), 2, 0, 0, 0),
            log(date(2026, 2, 28), 3, 0, 0, 0),
            log(date(2026, 3, 1), 4, 0, 0, 0),
        ];
        let kept = filter_by_period(&logs, &window);
        let dials: Vec<i32> = kept.iter().map(|l| l.dials).collect();
        assert_eq!(dials, vec![2, 3]);
    }

    #[test]
    fn filter_is_idempotent() {
        let window = Period::ThisWeek.window(date(2026, 2, 4));
        let logs = vec![
            log(date(2026, 1, 29), 5, 0, 0, 0),
            log(date(2026, 2, 2), 6, 0, 0, 0),
            log(date(2026, 2, 6), 7, 0, 0, 0),
        ];
        let once: Vec<ActivityLog> = filter_by_period(&logs, &window)
            .into_iter()
            .cloned()
            .collect();
        let twice: Vec<ActivityLog> = filter_by_period(&once, &window)
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn applications_filter_by_their_own_date() {
        let window = Period::ThisMonth.window(date(2026, 2, 14));
        let apps = vec![
            Application {
                id: Uuid::new_v4(),
                agent_id: Uuid::new_v4(),
                app_date: date(2026, 2, 10),
                client_name: None,
                carrier: Some("Ethos".to_string()),
                annualized_premium: dec!(1200.00),
                status: crate::models::ApplicationStatus::Pending,
            },
            Application {
                id: Uuid::new_v4(),
                agent_id: Uuid::new_v4(),
                app_date: date(2026, 1, 10),
                client_name: None,
                carrier: Some("Ethos".to_string()),
                annualized_premium: dec!(900.00),
                status: crate::models::ApplicationStatus::Issued,
            },
        ];
        assert_eq!(filter_by_period(&apps, &window).len(), 1);
    }

    #[test]
    fn aggregate_of_nothing_is_all_zeros() {
        let totals = aggregate(&[]);
        assert_eq!(totals, AggregateTotals::default());
        assert_eq!(totals.pickup_rate, 0.0);
        assert_eq!(totals.quote_rate, 0.0);
        assert_eq!(totals.close_rate, 0.0);
    }

    #[test]
    fn aggregate_sums_counters_and_premium_exactly() {
        let mut first = log(date(2026, 2, 2), 40, 12, 5, 1);
        first.total_premium = dec!(100.50);
        let mut second = log(date(2026, 2, 3), 60, 18, 7, 1);
        second.total_premium = dec!(250.25);

        let totals = aggregate(&[first, second]);
        assert_eq!(totals.dials, 100);
        assert_eq!(totals.pickups, 30);
        assert_eq!(totals.quotes, 12);
        assert_eq!(totals.applications, 2);
        assert_eq!(totals.total_premium, dec!(350.75));
    }

    #[test]
    fn rates_follow_the_funnel_ratios() {
        let totals = aggregate(&[log(date(2026, 2, 2), 200, 123, 41, 10)]);
        assert_eq!(totals.pickup_rate, 61.5);
        assert_eq!(totals.quote_rate, 33.3);
        assert_eq!(totals.close_rate, 24.4);
    }

    #[test]
    fn rates_guard_against_zero_denominators() {
        let totals = aggregate(&[log(date(2026, 2, 2), 0, 0, 0, 3)]);
        assert_eq!(totals.pickup_rate, 0.0);
        assert_eq!(totals.quote_rate, 0.0);
        assert_eq!(totals.close_rate, 0.0);
    }

    #[test]
    fn rates_round_to_one_decimal_place() {
        let totals = aggregate(&[log(date(2026, 2, 2), 3, 1, 0, 0)]);
        assert_eq!(totals.pickup_rate, 33.3);

        let totals = aggregate(&[log(date(2026, 2, 2), 3, 2, 0, 0)]);
        assert_eq!(totals.pickup_rate, 66.7);
    }
}
