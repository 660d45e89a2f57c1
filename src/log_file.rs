//! Plain-text log parsing.
//!
//! Each line is either `YYYY-MM-DD <weight> <calories>` or `gw <goal weight>`.
//! Malformed lines are logged and skipped rather than failing the whole file.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use log::warn;

use crate::domain::{LogEntry, Series};
use crate::error::{EstimateError, ParseError};

/// Keyword introducing a goal weight line.
const GOAL_KEYWORD: &str = "gw";

/// Date format of log entries.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parsed contents of a log file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogData {
    /// One entry per date, sorted by date.
    pub entries: Vec<LogEntry>,
    pub goal_weight: Option<f64>,
}

impl LogData {
    /// Converts the entries to a series of day offsets since the first entry.
    pub fn series(&self) -> Result<Series, EstimateError> {
        Series::from_entries(&self.entries)
    }

    /// Returns the first and last logged dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.entries.first().zip(self.entries.last()).map(|(a, b)| (a.date, b.date))
    }
}

/// A successfully parsed line.
#[derive(Debug, Clone, PartialEq)]
enum Line {
    Entry(LogEntry),
    Goal(f64),
    Blank,
}

/// Loads and parses a log file.
///
/// # Errors
/// Returns ParseError if the file is missing or cannot be read. Bad lines are
/// skipped with a warning.
pub fn load_log<P: AsRef<Path>>(path: P) -> Result<LogData, ParseError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ParseError::FileNotFound(path.display().to_string()));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ParseError::CannotRead(format!("{}: {}", path.display(), e)))?;

    let data = parse_log(&contents);
    log::debug!(
        "loaded {} entries from {} (goal weight: {:?})",
        data.entries.len(),
        path.display(),
        data.goal_weight
    );
    Ok(data)
}

/// Parses log text.
///
/// Lines are sorted lexicographically before parsing, so ISO dates come out
/// in order and the result does not depend on where a line sits in the file.
/// When a date repeats, the entry sorting last wins; the same goes for
/// goal weight lines. Warnings still report the line number in the file.
pub fn parse_log(contents: &str) -> LogData {
    let mut by_date: BTreeMap<NaiveDate, LogEntry> = BTreeMap::new();
    let mut goal_weight = None;

    let mut lines: Vec<(usize, &str)> = contents
        .lines()
        .enumerate()
        .map(|(idx, text)| (idx + 1, text))
        .collect();
    lines.sort_by(|a, b| a.1.cmp(b.1));

    for (row, text) in lines {
        match parse_line(text, row) {
            Ok(Line::Entry(entry)) => {
                if by_date.insert(entry.date, entry).is_some() {
                    log::debug!("row {}: replaces an earlier entry for the same date", row);
                }
            }
            Ok(Line::Goal(gw)) => goal_weight = Some(gw),
            Ok(Line::Blank) => {}
            Err(e) => warn!("{}", e),
        }
    }

    LogData {
        entries: by_date.into_values().collect(),
        goal_weight,
    }
}

fn parse_line(text: &str, row: usize) -> Result<Line, ParseError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    match fields.as_slice() {
        [] => Ok(Line::Blank),
        [GOAL_KEYWORD, value] => parse_goal_weight(value, row).map(Line::Goal),
        [date, weight, calories] => Ok(Line::Entry(LogEntry {
            date: parse_date(date, row)?,
            weight: parse_weight(weight, row)?,
            calories: parse_calories(calories, row)?,
        })),
        _ => Err(ParseError::MalformedRow {
            row,
            value: text.to_string(),
        }),
    }
}

fn parse_date(s: &str, row: usize) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| ParseError::InvalidDate {
        row,
        value: s.to_string(),
    })
}

fn parse_weight(s: &str, row: usize) -> Result<f64, ParseError> {
    match s.parse::<f64>() {
        Ok(w) if w.is_finite() && w > 0.0 => Ok(w),
        _ => Err(ParseError::InvalidWeight {
            row,
            value: s.to_string(),
        }),
    }
}

fn parse_calories(s: &str, row: usize) -> Result<f64, ParseError> {
    match s.parse::<f64>() {
        Ok(c) if c.is_finite() && c >= 0.0 => Ok(c),
        _ => Err(ParseError::InvalidCalories {
            row,
            value: s.to_string(),
        }),
    }
}

fn parse_goal_weight(s: &str, row: usize) -> Result<f64, ParseError> {
    match s.parse::<f64>() {
        Ok(gw) if gw.is_finite() && gw >= 0.0 => Ok(gw),
        _ => Err(ParseError::InvalidGoalWeight {
            row,
            value: s.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_parse_line_entry() {
        let line = parse_line("2024-03-01 80.4 2450", 1).unwrap();
        assert_eq!(
            line,
            Line::Entry(LogEntry {
                date: date(2024, 3, 1),
                weight: 80.4,
                calories: 2450.0,
            })
        );
    }

    #[test]
    fn test_parse_line_goal() {
        assert_eq!(parse_line("gw 72.5", 1).unwrap(), Line::Goal(72.5));
        assert_eq!(parse_line("  gw   0 ", 1).unwrap(), Line::Goal(0.0));
    }

    #[test]
    fn test_parse_line_blank() {
        assert_eq!(parse_line("", 1).unwrap(), Line::Blank);
        assert_eq!(parse_line("   \t ", 1).unwrap(), Line::Blank);
    }

    #[test]
    fn test_parse_line_invalid() {
        assert!(matches!(
            parse_line("2024-13-01 80 2000", 3),
            Err(ParseError::InvalidDate { row: 3, .. })
        ));
        assert!(matches!(
            parse_line("2024-01-01 heavy 2000", 1),
            Err(ParseError::InvalidWeight { .. })
        ));
        assert!(matches!(
            parse_line("2024-01-01 80 -5", 1),
            Err(ParseError::InvalidCalories { .. })
        ));
        assert!(matches!(
            parse_line("2024-01-01 80 NaN", 1),
            Err(ParseError::InvalidCalories { .. })
        ));
        assert!(matches!(
            parse_line("gw -3", 1),
            Err(ParseError::InvalidGoalWeight { .. })
        ));
        assert!(matches!(
            parse_line("gw abc", 1),
            Err(ParseError::InvalidGoalWeight { .. })
        ));
        assert!(matches!(
            parse_line("2024-01-01 80", 7),
            Err(ParseError::MalformedRow { row: 7, .. })
        ));
    }

    #[test]
    fn test_parse_log_sorts_by_date() {
        let data = parse_log("2024-01-03 79.9 2480\n2024-01-01 80.0 2500\n2024-01-02 79.8 2450\n");
        let dates: Vec<NaiveDate> = data.entries.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
        );
        assert!(data.goal_weight.is_none());
    }

    #[test]
    fn test_parse_log_skips_bad_rows() {
        let data = parse_log(
            "2024-01-01 80.0 2500\nnot a row\n2024-01-02 x 2450\n\n2024-01-04 79.5 2300\n",
        );
        assert_eq!(data.entries.len(), 2);
        assert_eq!(data.date_range(), Some((date(2024, 1, 1), date(2024, 1, 4))));
    }

    #[test]
    fn test_parse_log_duplicate_date_last_sorted_wins() {
        let data = parse_log("2024-01-01 80.0 2500\n2024-01-01 79.6 2100\n");
        assert_eq!(data.entries.len(), 1);
        assert_eq!(data.entries[0].weight, 80.0);
        assert_eq!(data.entries[0].calories, 2500.0);

        // Same rows in the other order give the same answer.
        let swapped = parse_log("2024-01-01 79.6 2100\n2024-01-01 80.0 2500\n");
        assert_eq!(swapped, data);
    }

    #[test]
    fn test_parse_log_goal_weight() {
        let data = parse_log("gw 75\n2024-01-01 80.0 2500\ngw -1\n");
        // The negative goal is rejected and does not clear the valid one.
        assert_eq!(data.goal_weight, Some(75.0));

        let data = parse_log("gw -1\n2024-01-01 80.0 2500\n");
        assert!(data.goal_weight.is_none());
    }

    #[test]
    fn test_parse_log_several_goal_lines() {
        // "gw 70" sorts before "gw 75", so 75 wins wherever the lines sit.
        let data = parse_log("gw 75\ngw 70\n2024-01-01 80 2500\n");
        assert_eq!(data.goal_weight, Some(75.0));

        let data = parse_log("2024-01-01 80 2500\ngw 70\ngw 75\n");
        assert_eq!(data.goal_weight, Some(75.0));
    }

    #[test]
    fn test_series_day_offsets() {
        let data = parse_log("2024-02-27 80.0 2500\n2024-03-02 79.8 2450\n2024-02-28 79.9 2480\n");
        let series = data.series().unwrap();
        assert_eq!(series.times(), vec![0.0, 1.0, 4.0]);
    }

    #[test]
    fn test_series_insufficient_data() {
        let data = parse_log("2024-01-01 80.0 2500\n2024-01-02 79.8 2450\n");
        assert!(matches!(
            data.series(),
            Err(EstimateError::InsufficientData { available: 2, .. })
        ));
    }

    #[test]
    fn test_load_log_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gw 78").unwrap();
        writeln!(file, "2024-01-01 80.0 2500").unwrap();
        writeln!(file, "2024-01-02 79.8 2450").unwrap();
        writeln!(file, "2024-01-03 79.9 2480").unwrap();
        file.flush().unwrap();

        let data = load_log(file.path()).unwrap();
        assert_eq!(data.entries.len(), 3);
        assert_eq!(data.goal_weight, Some(78.0));
    }

    #[test]
    fn test_load_log_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            load_log(&missing),
            Err(ParseError::FileNotFound(_))
        ));
    }
}
