//! Aggregate statistics over the recorded days.
//!
//! All bucketing uses local calendar dates. The record keys are local
//! dates already, so mixing in UTC here would shift entries across
//! weekday boundaries for users away from the prime meridian.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{date_key, parse_date_key, DayMap};

/// Short weekday labels, Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Short month labels, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Five-number summary of one weekday's recorded counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiveNumber {
    /// Smallest value.
    pub min: f64,
    /// First quartile.
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Largest value.
    pub max: f64,
    /// How many samples the summary covers.
    pub count: usize,
}

impl FiveNumber {
    const EMPTY: FiveNumber = FiveNumber {
        min: 0.0,
        q1: 0.0,
        median: 0.0,
        q3: 0.0,
        max: 0.0,
        count: 0,
    };
}

/// One weekday's distribution plus the current week's entry for overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekdayStats {
    /// Weekday label, Sunday first.
    pub label: &'static str,
    /// Distribution of the selected year's counts on this weekday.
    pub summary: FiveNumber,
    /// This week's recorded count on this weekday, any year.
    pub current: Option<u8>,
}

/// Five-number summary with linear-interpolation percentiles.
pub fn five_number_summary(values: &[u8]) -> FiveNumber {
    if values.is_empty() {
        return FiveNumber::EMPTY;
    }
    let mut sorted: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    match sorted.as_slice() {
        [single] => FiveNumber {
            min: *single,
            q1: *single,
            median: *single,
            q3: *single,
            max: *single,
            count: 1,
        },
        [low, high] => FiveNumber {
            min: *low,
            q1: *low,
            median: (low + high) / 2.0,
            q3: *high,
            max: *high,
            count: 2,
        },
        _ => FiveNumber {
            min: sorted[0],
            q1: percentile(&sorted, 0.25),
            median: percentile(&sorted, 0.5),
            q3: percentile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            count: sorted.len(),
        },
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * p;
    let base = position.floor() as usize;
    let rest = position - base as f64;
    match sorted.get(base + 1) {
        Some(next) => sorted[base] + rest * (next - sorted[base]),
        None => sorted[base],
    }
}

/// The Sunday starting the week that contains `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Date keys for the week containing `today`, Sunday through Saturday.
pub fn current_week_keys(today: NaiveDate) -> [String; 7] {
    let start = week_start(today);
    std::array::from_fn(|offset| date_key(start + Duration::days(offset as i64)))
}

/// Total recorded count over the week containing `today`.
pub fn week_total(days: &DayMap, today: NaiveDate) -> u32 {
    current_week_keys(today)
        .iter()
        .filter_map(|key| days.get(key))
        .map(|&count| u32::from(count))
        .sum()
}

/// Per-weekday distributions for a year, with the current week overlaid.
pub fn weekday_distribution(days: &DayMap, year: i32, today: NaiveDate) -> Vec<WeekdayStats> {
    let week_keys = current_week_keys(today);
    let mut totals: [Vec<u8>; 7] = std::array::from_fn(|_| Vec::new());
    let mut current: [Option<u8>; 7] = [None; 7];

    for (key, &count) in days {
        let Ok(date) = parse_date_key(key) else {
            continue;
        };
        let weekday = date.weekday().num_days_from_sunday() as usize;
        if date.year() == year {
            totals[weekday].push(count);
        }
        if week_keys.iter().any(|week_key| week_key == key) {
            current[weekday] = Some(count);
        }
    }

    WEEKDAY_LABELS
        .iter()
        .enumerate()
        .map(|(weekday, &label)| WeekdayStats {
            label,
            summary: five_number_summary(&totals[weekday]),
            current: current[weekday],
        })
        .collect()
}

/// Average count per week for each month of a year.
///
/// Computed from recorded days only (total divided by days with data,
/// scaled to a week) and rounded to one decimal; months with no records
/// are `None`.
pub fn monthly_weekly_averages(days: &DayMap, year: i32) -> Vec<Option<f64>> {
    let mut totals = [0u32; 12];
    let mut recorded = [0u32; 12];

    for (key, &count) in days {
        let Ok(date) = parse_date_key(key) else {
            continue;
        };
        if date.year() != year {
            continue;
        }
        let month = date.month0() as usize;
        totals[month] += u32::from(count);
        recorded[month] += 1;
    }

    (0..12)
        .map(|month| {
            if recorded[month] == 0 {
                return None;
            }
            let per_week = f64::from(totals[month]) / f64::from(recorded[month]) * 7.0;
            Some((per_week * 10.0).round() / 10.0)
        })
        .collect()
}
