//! Month-grid arithmetic, count color buckets, and cell hit-testing.
//!
//! Grids are Sunday-first, matching the recorded keys' local calendar.

use chrono::{Datelike, NaiveDate};

use crate::models::date_key;

/// Columns in every calendar grid.
pub const GRID_COLUMNS: u16 = 7;

/// Single-letter column headers, Sunday first.
pub const WEEKDAY_LETTERS: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

/// Full month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next =
        NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("month out of range");
    first_of_next.pred_opt().expect("date before year zero").day()
}

/// Empty cells before day 1 in a Sunday-first grid.
pub fn leading_blanks(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("month out of range");
    first.weekday().num_days_from_sunday()
}

/// Grid rows needed to show the whole month.
pub fn grid_rows(year: i32, month: u32) -> u16 {
    let cells = leading_blanks(year, month) + days_in_month(year, month);
    cells.div_ceil(u32::from(GRID_COLUMNS)) as u16
}

/// The `YYYY-MM-DD` key for a day of the given month.
pub fn key_for_day(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day).map(date_key)
}

/// Severity bucket for a day's count, used for cell coloring and legends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// No record for the day.
    Unrecorded,
    /// Exactly zero; a deliberate entry, not an absence.
    Zero,
    /// 1–2.
    Low,
    /// 3–5.
    Moderate,
    /// 6–9.
    High,
    /// 10 and up.
    VeryHigh,
}

/// Bucket thresholds as a pure function of the count.
pub fn bucket(count: Option<u8>) -> Bucket {
    match count {
        None => Bucket::Unrecorded,
        Some(n) if n >= 10 => Bucket::VeryHigh,
        Some(n) if n >= 6 => Bucket::High,
        Some(n) if n >= 3 => Bucket::Moderate,
        Some(n) if n >= 1 => Bucket::Low,
        Some(_) => Bucket::Zero,
    }
}

/// Legend rows for the recorded buckets, lightest first.
pub fn legend() -> [(Bucket, &'static str); 5] {
    [
        (Bucket::Zero, "0"),
        (Bucket::Low, "1-2"),
        (Bucket::Moderate, "3-5"),
        (Bucket::High, "6-9"),
        (Bucket::VeryHigh, "10+"),
    ]
}

/// Screen placement of a rendered month grid, captured at draw time so
/// pointer coordinates can be mapped back to days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    /// Left edge of the first cell column.
    pub x: u16,
    /// Top edge of the first cell row.
    pub y: u16,
    /// Width of one cell.
    pub cell_width: u16,
    /// Height of one cell.
    pub cell_height: u16,
}

impl GridGeometry {
    /// Top-left corner of the cell at a grid index (row-major, including
    /// the leading blanks).
    pub fn cell_origin(&self, index: u32) -> (u16, u16) {
        let col = (index % u32::from(GRID_COLUMNS)) as u16;
        let row = (index / u32::from(GRID_COLUMNS)) as u16;
        (
            self.x + col * self.cell_width,
            self.y + row * self.cell_height,
        )
    }

    /// Map a pointer position to the day it lands on, if any.
    pub fn day_at(&self, year: i32, month: u32, x: u16, y: u16) -> Option<u32> {
        if self.cell_width == 0 || self.cell_height == 0 || x < self.x || y < self.y {
            return None;
        }
        let col = u32::from((x - self.x) / self.cell_width);
        if col >= u32::from(GRID_COLUMNS) {
            return None;
        }
        let row = u32::from((y - self.y) / self.cell_height);
        let index = row * u32::from(GRID_COLUMNS) + col;
        let blanks = leading_blanks(year, month);
        if index < blanks {
            return None;
        }
        let day = index - blanks + 1;
        (day <= days_in_month(year, month)).then_some(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths_handle_leap_years() {
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 4), 30);
    }

    #[test]
    fn leading_blanks_are_sunday_first() {
        // March 2025 starts on a Saturday.
        assert_eq!(leading_blanks(2025, 3), 6);
        // June 2025 starts on a Sunday.
        assert_eq!(leading_blanks(2025, 6), 0);
        // January 2025 starts on a Wednesday.
        assert_eq!(leading_blanks(2025, 1), 3);
    }

    #[test]
    fn grid_rows_cover_the_month() {
        // 6 blanks + 31 days = 37 cells -> 6 rows.
        assert_eq!(grid_rows(2025, 3), 6);
        // 0 blanks + 30 days -> 5 rows.
        assert_eq!(grid_rows(2025, 6), 5);
        // February 2026 starts on a Sunday with 28 days -> exactly 4 rows.
        assert_eq!(grid_rows(2026, 2), 4);
    }

    #[test]
    fn buckets_match_the_legend_thresholds() {
        assert_eq!(bucket(None), Bucket::Unrecorded);
        assert_eq!(bucket(Some(0)), Bucket::Zero);
        assert_eq!(bucket(Some(1)), Bucket::Low);
        assert_eq!(bucket(Some(2)), Bucket::Low);
        assert_eq!(bucket(Some(3)), Bucket::Moderate);
        assert_eq!(bucket(Some(5)), Bucket::Moderate);
        assert_eq!(bucket(Some(6)), Bucket::High);
        assert_eq!(bucket(Some(9)), Bucket::High);
        assert_eq!(bucket(Some(10)), Bucket::VeryHigh);
        assert_eq!(bucket(Some(99)), Bucket::VeryHigh);
    }

    #[test]
    fn hit_testing_maps_cells_to_days() {
        let geometry = GridGeometry {
            x: 2,
            y: 3,
            cell_width: 6,
            cell_height: 3,
        };
        // March 2025: 6 leading blanks, so the first row only holds day 1
        // in the last column.
        assert_eq!(geometry.day_at(2025, 3, 2, 3), None);
        assert_eq!(geometry.day_at(2025, 3, 2 + 6 * 6, 3), Some(1));
        // Second row starts at day 2.
        assert_eq!(geometry.day_at(2025, 3, 2, 6), Some(2));
        // Clicks inside a cell resolve to the same day.
        assert_eq!(geometry.day_at(2025, 3, 2 + 3, 6 + 2), Some(2));
        // Past the last day is a miss.
        assert_eq!(geometry.day_at(2025, 3, 2 + 6 * 6, 3 + 5 * 3), None);
        // Left of the grid is a miss.
        assert_eq!(geometry.day_at(2025, 3, 0, 6), None);
    }

    #[test]
    fn key_for_day_rejects_invalid_days() {
        assert_eq!(key_for_day(2025, 2, 29), None);
        assert_eq!(key_for_day(2025, 2, 28).as_deref(), Some("2025-02-28"));
    }
}
