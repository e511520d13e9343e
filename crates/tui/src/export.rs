//! Plain-text snapshot export of the calendar views.
//!
//! The snapshot writers are the exportable boundaries of the app: anything
//! that can render a month or a year produces its lines here, and the file
//! on disk is the shareable artifact.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tally_core::calendar::{
    self, Bucket, GRID_COLUMNS, MONTH_NAMES, WEEKDAY_LETTERS,
};
use tally_core::models::DayMap;

const CELL_WIDTH: usize = 4;

fn bucket_glyph(bucket: Bucket) -> char {
    match bucket {
        Bucket::Unrecorded => '.',
        Bucket::Zero => 'o',
        Bucket::Low => '+',
        Bucket::Moderate => '*',
        Bucket::High => 'x',
        Bucket::VeryHigh => '#',
    }
}

fn legend_lines() -> Vec<String> {
    let entries: Vec<String> = calendar::legend()
        .iter()
        .map(|(bucket, label)| format!("{} {}", bucket_glyph(*bucket), label))
        .collect();
    vec![format!(". none  {}", entries.join("  "))]
}

/// Render one month as fixed-width text lines.
pub fn month_lines(year: i32, month: u32, days: &DayMap) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("{} {}", MONTH_NAMES[(month - 1) as usize], year));
    lines.push(
        WEEKDAY_LETTERS
            .iter()
            .map(|letter| format!("{letter:>width$}", width = CELL_WIDTH))
            .collect::<String>(),
    );

    let blanks = calendar::leading_blanks(year, month);
    let total = calendar::days_in_month(year, month);
    let mut row = String::new();
    for index in 0..(blanks + total) {
        if index < blanks {
            row.push_str(&" ".repeat(CELL_WIDTH));
        } else {
            let day = index - blanks + 1;
            let count = calendar::key_for_day(year, month, day)
                .and_then(|key| days.get(&key).copied());
            let glyph = bucket_glyph(calendar::bucket(count));
            row.push_str(&format!("{day:>3}{glyph}"));
        }
        if (index + 1) % u32::from(GRID_COLUMNS) == 0 {
            lines.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        lines.push(row);
    }
    lines
}

/// Render the twelve-month overview as text lines.
pub fn year_lines(year: i32, days: &DayMap) -> Vec<String> {
    let mut lines = vec![format!("{year} Overview"), String::new()];
    for month in 1..=12 {
        lines.extend(month_lines(year, month, days));
        lines.push(String::new());
    }
    lines.extend(legend_lines());
    lines
}

/// Write a month snapshot and return its path.
pub fn export_month(dir: &Path, year: i32, month: u32, days: &DayMap) -> Result<PathBuf> {
    let mut lines = month_lines(year, month, days);
    lines.push(String::new());
    lines.extend(legend_lines());
    let filename = format!("{}-{}.txt", MONTH_NAMES[(month - 1) as usize], year);
    write_snapshot(dir, &filename, &lines)
}

/// Write a full-year snapshot and return its path.
pub fn export_year(dir: &Path, year: i32, days: &DayMap) -> Result<PathBuf> {
    let filename = format!("summary_{year}.txt");
    write_snapshot(dir, &filename, &year_lines(year, days))
}

fn write_snapshot(dir: &Path, filename: &str, lines: &[String]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let path = dir.join(filename);
    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(&path, contents)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    Ok(path)
}
