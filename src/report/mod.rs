//! Reduction of a completed store, plus formatted terminal output.

use crate::domain::{Extremum, Observation, SeriesStats, Summary};
use crate::error::RatesError;
use crate::store::AggregateStore;

pub mod format;

pub use format::*;

#[derive(Debug)]
struct Accumulator {
    max: Extremum,
    min: Extremum,
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn start(first: &Observation) -> Self {
        Self {
            max: first.into(),
            min: first.into(),
            sum: 0.0,
            count: 0,
        }
    }

    // `>=`/`<=`: among equal values the last one seen wins.
    fn push(&mut self, obs: &Observation) {
        self.sum += obs.value;
        self.count += 1;
        if obs.value >= self.max.value {
            self.max = obs.into();
        }
        if obs.value <= self.min.value {
            self.min = obs.into();
        }
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

fn accumulate<'a>(observations: impl IntoIterator<Item = &'a Observation>) -> Option<Accumulator> {
    let mut iter = observations.into_iter().peekable();
    let mut acc = Accumulator::start(iter.peek()?);
    for obs in iter {
        acc.push(obs);
    }
    Some(acc)
}

/// Global max, min and mean over every observation of every currency.
///
/// Codes are visited in ascending order and each series by date, so ties
/// resolve the same way on every run. The mean mixes all currencies together.
pub fn reduce(store: &AggregateStore) -> Result<Summary, RatesError> {
    let series = store.sorted_series();
    let acc = accumulate(series.values().flatten()).ok_or(RatesError::EmptyStore)?;

    Ok(Summary {
        mean: acc.mean(),
        observations: acc.count,
        currencies: series.values().filter(|obs| !obs.is_empty()).count(),
        max: acc.max,
        min: acc.min,
    })
}

/// Stats of a single currency; `None` for an empty series.
pub fn reduce_series(code: &str, observations: &[Observation]) -> Option<SeriesStats> {
    let acc = accumulate(observations)?;
    Some(SeriesStats {
        code: code.to_string(),
        mean: acc.mean(),
        observations: acc.count,
        max: acc.max,
        min: acc.min,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rayon::prelude::*;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn fixture() -> Vec<Observation> {
        vec![
            Observation::new("USD", 90.5, day(1)),
            Observation::new("USD", 91.0, day(2)),
            Observation::new("EUR", 98.2, day(1)),
            Observation::new("EUR", 99.1, day(2)),
            Observation::new("JPY", 0.61, day(1)),
            Observation::new("JPY", 0.60, day(2)),
            Observation::new("CNY", 12.6, day(2)),
        ]
    }

    #[test]
    fn bounds_and_mean_hold() {
        let obs = fixture();
        let store = AggregateStore::new();
        store.extend(obs.clone());

        let summary = reduce(&store).unwrap();
        for o in &obs {
            assert!(summary.max.value >= o.value);
            assert!(summary.min.value <= o.value);
        }
        let expected = obs.iter().map(|o| o.value).sum::<f64>() / obs.len() as f64;
        assert_relative_eq!(summary.mean, expected, epsilon = 1e-12);

        assert_eq!(summary.max, Extremum { code: "EUR".into(), value: 99.1, date: day(2) });
        assert_eq!(summary.min, Extremum { code: "JPY".into(), value: 0.60, date: day(2) });
        assert_eq!(summary.observations, 7);
        assert_eq!(summary.currencies, 4);
    }

    #[test]
    fn empty_store_is_an_error() {
        let store = AggregateStore::new();
        assert!(matches!(reduce(&store), Err(RatesError::EmptyStore)));
    }

    #[test]
    fn keys_without_observations_are_still_empty() {
        let store = AggregateStore::new();
        store.ensure_key("USD");
        store.ensure_key("EUR");
        assert!(matches!(reduce(&store), Err(RatesError::EmptyStore)));
    }

    #[test]
    fn ties_resolve_to_last_seen_in_code_then_date_order() {
        let store = AggregateStore::new();
        store.extend([
            Observation::new("USD", 5.0, day(2)),
            Observation::new("AUD", 5.0, day(1)),
            Observation::new("USD", 5.0, day(1)),
        ]);
        let summary = reduce(&store).unwrap();
        // Visit order: AUD/1, USD/1, USD/2.
        assert_eq!(summary.max, Extremum { code: "USD".into(), value: 5.0, date: day(2) });
        assert_eq!(summary.min, summary.max);
    }

    #[test]
    fn result_does_not_depend_on_append_interleaving() {
        let obs = fixture();

        let sequential = AggregateStore::new();
        for o in obs.iter().rev() {
            sequential.append(o.clone());
        }

        let concurrent = AggregateStore::new();
        obs.par_iter().for_each(|o| {
            concurrent.ensure_key(&o.code);
            concurrent.append(o.clone());
        });

        let a = reduce(&sequential).unwrap();
        let b = reduce(&concurrent).unwrap();
        assert_eq!(a.max, b.max);
        assert_eq!(a.min, b.min);
        assert_relative_eq!(a.mean, b.mean, epsilon = 1e-12);
    }

    #[test]
    fn series_stats_cover_one_currency() {
        let obs = vec![
            Observation::new("USD", 90.5, day(1)),
            Observation::new("USD", 91.0, day(2)),
            Observation::new("USD", 89.75, day(3)),
        ];
        let stats = reduce_series("USD", &obs).unwrap();
        assert_eq!(stats.max.date, day(2));
        assert_eq!(stats.min.date, day(3));
        assert_relative_eq!(stats.mean, 90.416_666_666, epsilon = 1e-6);
        assert_eq!(stats.observations, 3);

        assert!(reduce_series("USD", &[]).is_none());
    }
}
