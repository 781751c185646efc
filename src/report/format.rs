//! Terminal output.
//!
//! Formatting lives here so the pipeline and reducer stay free of printing.

use chrono::NaiveDate;

use crate::domain::{Extremum, Observation, SeriesStats, Summary};

const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

fn format_extremum(label: &str, ext: &Extremum) -> String {
    format!(
        "{label} rate: {} at {:.2} RUB on {}",
        ext.code,
        ext.value,
        display_date(ext.date)
    )
}

/// The three summary lines: maximum, minimum, mean.
pub fn format_summary(summary: &Summary) -> String {
    [
        format_extremum("Maximum", &summary.max),
        format_extremum("Minimum", &summary.min),
        format!("Mean rate across all currencies: {:.2} RUB", summary.mean),
    ]
    .join("\n")
}

/// A currency's observations by date followed by its own stats.
pub fn format_series(stats: &SeriesStats, observations: &[Observation]) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ({} observations) ===\n", stats.code, stats.observations));
    for obs in observations {
        out.push_str(&format!("{}  {:>12.4}\n", display_date(obs.date), obs.value));
    }
    out.push_str(&format_extremum("Maximum", &stats.max));
    out.push('\n');
    out.push_str(&format_extremum("Minimum", &stats.min));
    out.push('\n');
    out.push_str(&format!("Mean rate: {:.2} RUB", stats.mean));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn summary_has_three_lines_with_two_decimals() {
        let summary = Summary {
            max: Extremum { code: "XDR".into(), value: 121.4567, date: day(4) },
            min: Extremum { code: "JPY".into(), value: 0.6049, date: day(1) },
            mean: 37.1234,
            observations: 10,
            currencies: 3,
        };
        let text = format_summary(&summary);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Maximum rate: XDR at 121.46 RUB on 04.03.2024",
                "Minimum rate: JPY at 0.60 RUB on 01.03.2024",
                "Mean rate across all currencies: 37.12 RUB",
            ]
        );
    }

    #[test]
    fn series_lists_observations_then_stats() {
        let obs = vec![Observation::new("USD", 90.5, day(1)), Observation::new("USD", 91.0, day(2))];
        let stats = crate::report::reduce_series("USD", &obs).unwrap();
        let text = format_series(&stats, &obs);

        assert!(text.starts_with("=== USD (2 observations) ===\n01.03.2024"));
        assert!(text.contains("Maximum rate: USD at 91.00 RUB on 02.03.2024"));
        assert!(text.ends_with("Mean rate: 90.75 RUB"));
    }
}
