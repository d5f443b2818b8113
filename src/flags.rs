use std::cmp::Reverse;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::AggregateTotals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagThresholds {
    pub low_dials: i64,
    pub inactive_days: i64,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            low_dials: 50,
            inactive_days: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedFlag {
    NoActivity,
    Inactive,
    NoPolicies,
    LowDials,
}

impl RedFlag {
    pub fn label(self, thresholds: &FlagThresholds, dials: i64) -> String {
        match self {
            RedFlag::NoActivity => "No activity".to_string(),
            RedFlag::Inactive => format!("Inactive {}+ days", thresholds.inactive_days),
            RedFlag::NoPolicies => "No policies".to_string(),
            RedFlag::LowDials => format!("Low dials ({dials})"),
        }
    }
}

pub fn evaluate_red_flags(
    month: &AggregateTotals,
    last_activity: Option<NaiveDate>,
    as_of: NaiveDate,
    thresholds: &FlagThresholds,
) -> Vec<RedFlag> {
    let mut flags = Vec::new();
    match last_activity {
        None => flags.push(RedFlag::NoActivity),
        // Strictly earlier than the cutoff: a log exactly inactive_days old is fine.
        Some(last) if last < as_of - Duration::days(thresholds.inactive_days) => {
            flags.push(RedFlag::Inactive);
        }
        Some(_) => {}
    }
    if month.applications == 0 {
        flags.push(RedFlag::NoPolicies);
    }
    if month.dials < thresholds.low_dials {
        flags.push(RedFlag::LowDials);
    }
    flags
}

// Ranks descending by current-month applications; the stable sort keeps
// insertion order for ties.
pub fn rank_leaderboard<T>(mut rows: Vec<T>, applications: impl Fn(&T) -> i64) -> Vec<T> {
    rows.sort_by_key(|row| Reverse(applications(row)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn totals(dials: i64, applications: i64) -> AggregateTotals {
        AggregateTotals {
            dials,
            applications,
            ..AggregateTotals::default()
        }
    }

    #[test]
    fn low_dials_fires_below_the_threshold_only() {
        let as_of = date(2026, 2, 10);
        let defaults = FlagThresholds::default();
        let recent = Some(date(2026, 2, 10));

        let at_threshold = evaluate_red_flags(&totals(50, 5), recent, as_of, &defaults);
        assert!(!at_threshold.contains(&RedFlag::LowDials));

        let below = evaluate_red_flags(&totals(49, 5), recent, as_of, &defaults);
        assert!(below.contains(&RedFlag::LowDials));
    }

    #[test]
    fn no_policies_depends_only_on_applications() {
        let as_of = date(2026, 2, 10);
        let defaults = FlagThresholds::default();
        let recent = Some(date(2026, 2, 10));

        let busy_but_empty = evaluate_red_flags(&totals(400, 0), recent, as_of, &defaults);
        assert!(busy_but_empty.contains(&RedFlag::NoPolicies));

        let idle_but_closing = evaluate_red_flags(&totals(0, 2), recent, as_of, &defaults);
        assert!(!idle_but_closing.contains(&RedFlag::NoPolicies));
    }

    #[test]
    fn never_logged_agents_flag_no_activity_only() {
        let flags = evaluate_red_flags(
            &totals(100, 3),
            None,
            date(2026, 2, 10),
            &FlagThresholds::default(),
        );
        assert!(flags.contains(&RedFlag::NoActivity));
        assert!(!flags.contains(&RedFlag::Inactive));
    }

    #[test]
    fn inactivity_boundary_is_strictly_older_than_three_days() {
        let as_of = date(2026, 2, 10);
        let defaults = FlagThresholds::default();

        let exactly_three = evaluate_red_flags(
            &totals(100, 3),
            Some(date(2026, 2, 7)),
            as_of,
            &defaults,
        );
        assert!(!exactly_three.contains(&RedFlag::Inactive));

        let four_days = evaluate_red_flags(
            &totals(100, 3),
            Some(date(2026, 2, 6)),
            as_of,
            &defaults,
        );
        assert!(four_days.contains(&RedFlag::Inactive));
    }

    #[test]
    fn healthy_agents_raise_no_flags() {
        let flags = evaluate_red_flags(
            &totals(120, 4),
            Some(date(2026, 2, 9)),
            date(2026, 2, 10),
            &FlagThresholds::default(),
        );
        assert!(flags.is_empty());
    }

    #[test]
    fn thresholds_are_configurable() {
        let as_of = date(2026, 2, 10);
        let relaxed = FlagThresholds {
            low_dials: 10,
            inactive_days: 7,
        };

        let flags = evaluate_red_flags(&totals(30, 1), Some(date(2026, 2, 4)), as_of, &relaxed);
        assert!(flags.is_empty());

        let strict = FlagThresholds {
            low_dials: 200,
            inactive_days: 1,
        };
        let flags = evaluate_red_flags(&totals(30, 1), Some(date(2026, 2, 4)), as_of, &strict);
        assert!(flags.contains(&RedFlag::LowDials));
        assert!(flags.contains(&RedFlag::Inactive));
    }

    #[test]
    fn flag_labels_match_the_dashboard_badges() {
        let thresholds = FlagThresholds::default();
        assert_eq!(RedFlag::NoActivity.label(&thresholds, 12), "No activity");
        assert_eq!(RedFlag::Inactive.label(&thresholds, 12), "Inactive 3+ days");
        assert_eq!(RedFlag::NoPolicies.label(&thresholds, 12), "No policies");
        assert_eq!(RedFlag::LowDials.label(&thresholds, 12), "Low dials (12)");
    }

    #[test]
    fn leaderboard_is_stable_for_ties() {
        let rows = vec![("ana", 3), ("ben", 7), ("cyd", 7), ("dee", 1)];
        let ranked = rank_leaderboard(rows, |row| row.1);
        let names: Vec<&str> = ranked.iter().map(|row| row.0).collect();
        assert_eq!(names, vec!["ben", "cyd", "ana", "dee"]);
    }
}
