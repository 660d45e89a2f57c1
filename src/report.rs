//! Rendering of estimation results for the console.

use std::fmt::Write as _;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::domain::{Algorithm, LogEntry, MIN_OBSERVATIONS, WEIGHT_UNIT};
use crate::goal::Recommendation;
use crate::tdee::{TdeeEstimate, TdeeResult};
use crate::trend::TunedRate;

/// Placeholder printed for values the estimators could not produce.
const UNAVAILABLE: &str = "n/a";

/// Output format selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines, one per day.
    #[default]
    #[value(alias = "txt")]
    Text,
    /// Pretty-printed JSON document.
    Json,
}

/// One day of the JSON report.
#[derive(Debug, Serialize)]
struct DayJson {
    date: NaiveDate,
    weight: f64,
    calories: f64,
    tdee: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tdee_sd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trend_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weekly_change: Option<f64>,
}

/// Top-level JSON report.
#[derive(Debug, Serialize)]
struct ReportJson<'a> {
    algorithm: Algorithm,
    unit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    regression_lr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight_rate: Option<TunedRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    calorie_rate: Option<TunedRate>,
    days: Vec<DayJson>,
    recommendation: Option<&'a Recommendation>,
}

/// JSON report for a log too short to estimate from.
#[derive(Debug, Serialize)]
struct InsufficientJson {
    error: &'static str,
    available: usize,
    required: usize,
}

/// Renders the notice for a log with fewer than [`MIN_OBSERVATIONS`] usable days.
pub fn render_insufficient(available: usize, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "Not enough data to estimate TDEE, fill in at least {} days.\n",
            MIN_OBSERVATIONS
        )),
        OutputFormat::Json => {
            let notice = InsufficientJson {
                error: "insufficient_data",
                available,
                required: MIN_OBSERVATIONS,
            };
            let mut out = serde_json::to_string_pretty(&notice)?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Renders a result in the requested format.
///
/// `entries` must be the log entries the series was built from.
pub fn render(
    entries: &[LogEntry],
    result: &TdeeResult,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(entries, result)),
        OutputFormat::Json => render_json(entries, result),
    }
}

/// Formats `value` with `decimals` places, or a placeholder for NaN.
fn fmt_value(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        UNAVAILABLE.to_string()
    }
}

fn render_text(entries: &[LogEntry], result: &TdeeResult) -> String {
    let mut out = String::new();

    match &result.estimate {
        TdeeEstimate::Regression(est) => {
            for (i, entry) in entries.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{} {} {} - TDEE = {} +/- {}",
                    entry.date,
                    fmt_value(entry.weight, 1),
                    fmt_value(entry.calories, 0),
                    fmt_value(est.tdee[i], 0),
                    fmt_value(est.tdee_sd[i], 0),
                );
            }
        }
        TdeeEstimate::Trend(est) => {
            for (i, entry) in entries.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{} {} {} - TDEE = {} - Trend weight: {} - change per week: {}",
                    entry.date,
                    fmt_value(entry.weight, 1),
                    fmt_value(entry.calories, 0),
                    fmt_value(est.tdee[i], 0),
                    fmt_value(est.trend_weight[i], 2),
                    fmt_value(est.rate[i] * 7.0, 2),
                );
            }
        }
    }

    if let Some(rec) = &result.recommendation {
        let _ = writeln!(
            out,
            "To reach goal weight of {} {}, suggested calories: {} cal",
            rec.goal_weight,
            WEIGHT_UNIT,
            fmt_value(rec.calories, 0),
        );
        let _ = writeln!(
            out,
            "At this rate, you should expect a weekly change of {} {}",
            fmt_value(rec.weekly_change, 2),
            WEIGHT_UNIT,
        );
    }

    out
}

fn render_json(entries: &[LogEntry], result: &TdeeResult) -> serde_json::Result<String> {
    let days = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut day = DayJson {
                date: entry.date,
                weight: entry.weight,
                calories: entry.calories,
                tdee: result.estimate.tdee()[i],
                tdee_sd: None,
                trend_weight: None,
                weekly_change: None,
            };
            match &result.estimate {
                TdeeEstimate::Regression(est) => day.tdee_sd = Some(est.tdee_sd[i]),
                TdeeEstimate::Trend(est) => {
                    day.trend_weight = Some(est.trend_weight[i]);
                    day.weekly_change = Some(est.rate[i] * 7.0);
                }
            }
            day
        })
        .collect();

    let (regression_lr, weight_rate, calorie_rate) = match &result.estimate {
        TdeeEstimate::Regression(est) => (Some(est.lr), None, None),
        TdeeEstimate::Trend(est) => (None, Some(est.weight_rate), Some(est.calorie_rate)),
    };

    let report = ReportJson {
        algorithm: result.estimate.algorithm(),
        unit: WEIGHT_UNIT,
        regression_lr,
        weight_rate,
        calorie_rate,
        days,
        recommendation: result.recommendation.as_ref(),
    };

    let mut out = serde_json::to_string_pretty(&report)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::RegressionEstimate;
    use crate::trend::TrendEstimate;

    fn entries() -> Vec<LogEntry> {
        vec![
            LogEntry {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                weight: 80.04,
                calories: 2500.0,
            },
            LogEntry {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                weight: 79.8,
                calories: 2450.4,
            },
        ]
    }

    fn v1_result() -> TdeeResult {
        TdeeResult {
            estimate: TdeeEstimate::Regression(RegressionEstimate {
                tdee: vec![2500.0, f64::NAN],
                tdee_sd: vec![0.0, f64::NAN],
                lr: 0.1,
            }),
            recommendation: None,
        }
    }

    fn v2_result() -> TdeeResult {
        let rate = TunedRate {
            lr: 0.2,
            sse: 1.0,
            evaluations: 23,
        };
        TdeeResult {
            estimate: TdeeEstimate::Trend(TrendEstimate {
                trend_weight: vec![80.0, 79.9],
                rate: vec![0.0, -0.02],
                calorie_trend: vec![2500.0, 2480.0],
                tdee: vec![2500.0, 2634.0],
                weight_rate: rate,
                calorie_rate: rate,
            }),
            recommendation: Some(Recommendation {
                goal_weight: 75.0,
                calories: 2326.4,
                weekly_change: -0.28,
            }),
        }
    }

    #[test]
    fn test_output_format_value_names() {
        assert_eq!(OutputFormat::from_str("JSON", true).unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("txt", true).unwrap(), OutputFormat::Text);
        assert!(OutputFormat::from_str("xml", true).is_err());
    }

    #[test]
    fn test_fmt_value() {
        assert_eq!(fmt_value(2499.6, 0), "2500");
        assert_eq!(fmt_value(79.84, 1), "79.8");
        assert_eq!(fmt_value(f64::NAN, 1), "n/a");
    }

    #[test]
    fn test_render_text_v1() {
        let text = render(&entries(), &v1_result(), OutputFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2024-01-01 80.0 2500 - TDEE = 2500 +/- 0");
        assert_eq!(lines[1], "2024-01-02 79.8 2450 - TDEE = n/a +/- n/a");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_render_text_v2_with_goal() {
        let text = render(&entries(), &v2_result(), OutputFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[1],
            "2024-01-02 79.8 2450 - TDEE = 2634 - Trend weight: 79.90 - change per week: -0.14"
        );
        assert_eq!(
            lines[2],
            "To reach goal weight of 75 kg, suggested calories: 2326 cal"
        );
        assert_eq!(
            lines[3],
            "At this rate, you should expect a weekly change of -0.28 kg"
        );
    }

    #[test]
    fn test_render_json_v1_nan_is_null() {
        let json = render(&entries(), &v1_result(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["algorithm"], "V1");
        assert_eq!(value["unit"], "kg");
        assert_eq!(value["regression_lr"], 0.1);
        assert!(value["days"][1]["tdee"].is_null());
        assert!(value["days"][0].get("trend_weight").is_none());
    }

    #[test]
    fn test_render_insufficient() {
        assert_eq!(
            render_insufficient(2, OutputFormat::Text).unwrap(),
            "Not enough data to estimate TDEE, fill in at least 3 days.\n"
        );

        let json = render_insufficient(2, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["error"], "insufficient_data");
        assert_eq!(value["available"], 2);
        assert_eq!(value["required"], 3);
    }

    #[test]
    fn test_render_json_v2() {
        let json = render(&entries(), &v2_result(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["algorithm"], "V2");
        assert_eq!(value["days"][1]["trend_weight"], 79.9);
        assert_eq!(value["weight_rate"]["evaluations"], 23);
        assert_eq!(value["recommendation"]["goal_weight"], 75.0);
    }
}
