use crate::domain::model::{AnnualRatePoint, DecadeAverage, RatePoint, Series, SummaryStats};
use crate::utils::error::{EtlError, Result};
use chrono::Datelike;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Effective tax rate: `(tax_receipts / profits_before_tax) × 100`.
///
/// `period` labels the observation for error reporting. A zero denominator is
/// an error, never ±inf or 0; non-finite inputs are rejected the same way.
pub fn effective_rate(period: &str, tax_receipts: f64, profits_before_tax: f64) -> Result<f64> {
    if !tax_receipts.is_finite() || !profits_before_tax.is_finite() {
        return Err(EtlError::NonFiniteValue {
            context: format!("rate inputs at {}", period),
        });
    }

    if profits_before_tax == 0.0 {
        return Err(EtlError::DivisionByZero {
            period: period.to_string(),
        });
    }

    Ok((tax_receipts / profits_before_tax) * 100.0)
}

/// Inner-join two series by observation date.
pub fn align(left: &Series, right: &Series) -> Vec<(NaiveDate, f64, f64)> {
    left.observations
        .iter()
        .filter_map(|(date, lv)| right.get(*date).map(|rv| (*date, *lv, rv)))
        .collect()
}

/// Quarterly rate table from aligned receipts and profits, with a trailing
/// moving average once `ma_window` periods have accumulated (window < 2
/// disables the column).
pub fn compute_rate_series(
    tax_receipts: &Series,
    profits_before_tax: &Series,
    ma_window: usize,
) -> Result<Vec<RatePoint>> {
    let aligned = align(tax_receipts, profits_before_tax);

    let mut points = Vec::with_capacity(aligned.len());
    for (date, receipts, profits) in aligned {
        let rate = effective_rate(&date.to_string(), receipts, profits)?;
        points.push(RatePoint {
            period: date,
            tax_receipts: receipts,
            profits_before_tax: profits,
            effective_rate: rate,
            moving_average: None,
        });
    }

    if ma_window >= 2 {
        for i in (ma_window - 1)..points.len() {
            let window = &points[i + 1 - ma_window..=i];
            let mean = window.iter().map(|p| p.effective_rate).sum::<f64>() / ma_window as f64;
            points[i].moving_average = Some(mean);
        }
    }

    Ok(points)
}

/// Sum observations per calendar year. Partial years are summed as-is.
pub fn resample_annual_sum(series: &Series) -> BTreeMap<i32, f64> {
    let mut sums: BTreeMap<i32, f64> = BTreeMap::new();
    for (date, value) in &series.observations {
        *sums.entry(date.year()).or_insert(0.0) += value;
    }
    sums
}

/// Annual rate table: quarterly receipts and profits are summed per calendar
/// year, then the rate is taken over the yearly aggregates.
pub fn compute_annual_rates(
    tax_receipts: &Series,
    profits_before_tax: &Series,
) -> Result<Vec<AnnualRatePoint>> {
    let receipts_by_year = resample_annual_sum(tax_receipts);
    let profits_by_year = resample_annual_sum(profits_before_tax);

    let mut points = Vec::new();
    for (year, receipts) in &receipts_by_year {
        if let Some(profits) = profits_by_year.get(year) {
            let rate = effective_rate(&year.to_string(), *receipts, *profits)?;
            points.push(AnnualRatePoint {
                year: *year,
                tax_receipts: *receipts,
                profits_before_tax: *profits,
                effective_rate: rate,
            });
        }
    }

    Ok(points)
}

pub fn summarize_quarterly(points: &[RatePoint]) -> Option<SummaryStats> {
    summarize(
        points
            .iter()
            .map(|p| (p.period.year(), p.period.to_string(), p.effective_rate)),
    )
}

pub fn summarize_annual(points: &[AnnualRatePoint]) -> Option<SummaryStats> {
    summarize(
        points
            .iter()
            .map(|p| (p.year, p.year.to_string(), p.effective_rate)),
    )
}

fn summarize(items: impl Iterator<Item = (i32, String, f64)>) -> Option<SummaryStats> {
    let items: Vec<(i32, String, f64)> = items.collect();
    if items.is_empty() {
        return None;
    }

    let count = items.len();
    let mean = items.iter().map(|(_, _, r)| r).sum::<f64>() / count as f64;

    let mut sorted: Vec<f64> = items.iter().map(|(_, _, r)| *r).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = if count % 2 == 1 {
        sorted[count / 2]
    } else {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    };

    // Sample standard deviation, matching pandas' default ddof=1
    let std_dev = if count > 1 {
        let sum_sq = items
            .iter()
            .map(|(_, _, r)| (r - mean).powi(2))
            .sum::<f64>();
        (sum_sq / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    let (_, min_period, min) = items.iter().min_by(|a, b| a.2.total_cmp(&b.2)).cloned()?;
    let (_, max_period, max) = items.iter().max_by(|a, b| a.2.total_cmp(&b.2)).cloned()?;

    let mut decade_sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (year, _, rate) in &items {
        let decade = (year / 10) * 10;
        let entry = decade_sums.entry(decade).or_insert((0.0, 0));
        entry.0 += rate;
        entry.1 += 1;
    }
    let decade_averages = decade_sums
        .into_iter()
        .map(|(decade, (sum, n))| DecadeAverage {
            decade,
            mean: sum / n as f64,
        })
        .collect();

    Some(SummaryStats {
        count,
        mean,
        median,
        std_dev,
        min,
        min_period,
        max,
        max_period,
        decade_averages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn quarterly(id: &str, points: &[(i32, u32, f64)]) -> Series {
        Series::from_observations(id, points.iter().map(|(y, m, v)| (date(*y, *m), *v)))
    }

    #[test]
    fn test_effective_rate_basic() {
        assert_eq!(effective_rate("t", 200.0, 1000.0).unwrap(), 20.0);
        assert_eq!(effective_rate("t", 0.0, 500.0).unwrap(), 0.0);
    }

    #[test]
    fn test_effective_rate_scaling_invariance() {
        let base = effective_rate("t", 37.5, 142.0).unwrap();
        let scaled = effective_rate("t", 37.5 * 1000.0, 142.0 * 1000.0).unwrap();
        assert!((base - scaled).abs() < 1e-9);
    }

    #[test]
    fn test_effective_rate_zero_denominator() {
        let err = effective_rate("1980-01-01", 10.0, 0.0).unwrap_err();
        match err {
            EtlError::DivisionByZero { period } => assert_eq!(period, "1980-01-01"),
            other => panic!("expected DivisionByZero, got {:?}", other),
        }
    }

    #[test]
    fn test_effective_rate_rejects_non_finite() {
        assert!(effective_rate("t", f64::NAN, 100.0).is_err());
        assert!(effective_rate("t", 10.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_align_inner_join() {
        let a = quarterly("A", &[(2020, 1, 1.0), (2020, 4, 2.0), (2020, 7, 3.0)]);
        let b = quarterly("B", &[(2020, 4, 20.0), (2020, 7, 30.0), (2020, 10, 40.0)]);

        let aligned = align(&a, &b);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0], (date(2020, 4), 2.0, 20.0));
        assert_eq!(aligned[1], (date(2020, 7), 3.0, 30.0));
    }

    #[test]
    fn test_compute_rate_series() {
        let receipts = quarterly("T", &[(2020, 1, 100.0), (2020, 4, 150.0)]);
        let profits = quarterly("P", &[(2020, 1, 500.0), (2020, 4, 500.0)]);

        let points = compute_rate_series(&receipts, &profits, 0).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].effective_rate, 20.0);
        assert_eq!(points[1].effective_rate, 30.0);
        assert!(points.iter().all(|p| p.moving_average.is_none()));
    }

    #[test]
    fn test_compute_rate_series_moving_average() {
        let receipts = quarterly(
            "T",
            &[(2020, 1, 10.0), (2020, 4, 20.0), (2020, 7, 30.0), (2020, 10, 40.0)],
        );
        let profits = quarterly(
            "P",
            &[(2020, 1, 100.0), (2020, 4, 100.0), (2020, 7, 100.0), (2020, 10, 100.0)],
        );

        let points = compute_rate_series(&receipts, &profits, 2).unwrap();
        assert_eq!(points[0].moving_average, None);
        assert_eq!(points[1].moving_average, Some(15.0)); // (10 + 20) / 2
        assert_eq!(points[2].moving_average, Some(25.0));
        assert_eq!(points[3].moving_average, Some(35.0));
    }

    #[test]
    fn test_compute_rate_series_propagates_zero_denominator() {
        let receipts = quarterly("T", &[(2020, 1, 100.0), (2020, 4, 150.0)]);
        let profits = quarterly("P", &[(2020, 1, 500.0), (2020, 4, 0.0)]);

        let err = compute_rate_series(&receipts, &profits, 0).unwrap_err();
        assert!(matches!(err, EtlError::DivisionByZero { .. }));
    }

    #[test]
    fn test_resample_annual_sum() {
        let series = quarterly(
            "T",
            &[
                (2019, 10, 5.0),
                (2020, 1, 10.0),
                (2020, 4, 20.0),
                (2020, 7, 30.0),
                (2020, 10, 40.0),
            ],
        );

        let by_year = resample_annual_sum(&series);
        assert_eq!(by_year.get(&2019), Some(&5.0)); // partial year kept
        assert_eq!(by_year.get(&2020), Some(&100.0));
    }

    #[test]
    fn test_compute_annual_rates() {
        let receipts = quarterly(
            "T",
            &[(2020, 1, 25.0), (2020, 4, 25.0), (2020, 7, 25.0), (2020, 10, 25.0)],
        );
        let profits = quarterly(
            "P",
            &[(2020, 1, 100.0), (2020, 4, 100.0), (2020, 7, 150.0), (2020, 10, 150.0)],
        );

        let annual = compute_annual_rates(&receipts, &profits).unwrap();
        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].year, 2020);
        assert_eq!(annual[0].tax_receipts, 100.0);
        assert_eq!(annual[0].profits_before_tax, 500.0);
        assert_eq!(annual[0].effective_rate, 20.0);
    }

    #[test]
    fn test_compute_annual_rates_skips_unmatched_years() {
        let receipts = quarterly("T", &[(2019, 1, 10.0), (2020, 1, 10.0)]);
        let profits = quarterly("P", &[(2020, 1, 100.0)]);

        let annual = compute_annual_rates(&receipts, &profits).unwrap();
        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].year, 2020);
    }

    #[test]
    fn test_summarize_annual() {
        let points = vec![
            AnnualRatePoint {
                year: 1951,
                tax_receipts: 40.0,
                profits_before_tax: 100.0,
                effective_rate: 40.0,
            },
            AnnualRatePoint {
                year: 1955,
                tax_receipts: 30.0,
                profits_before_tax: 100.0,
                effective_rate: 30.0,
            },
            AnnualRatePoint {
                year: 1962,
                tax_receipts: 20.0,
                profits_before_tax: 100.0,
                effective_rate: 20.0,
            },
        ];

        let stats = summarize_annual(&points).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 30.0);
        assert_eq!(stats.median, 30.0);
        assert_eq!(stats.min, 20.0);
        assert_eq!(stats.min_period, "1962");
        assert_eq!(stats.max, 40.0);
        assert_eq!(stats.max_period, "1951");

        assert_eq!(stats.decade_averages.len(), 2);
        assert_eq!(stats.decade_averages[0].decade, 1950);
        assert_eq!(stats.decade_averages[0].mean, 35.0);
        assert_eq!(stats.decade_averages[1].decade, 1960);
        assert_eq!(stats.decade_averages[1].mean, 20.0);
    }

    #[test]
    fn test_summarize_empty_is_none() {
        assert!(summarize_quarterly(&[]).is_none());
        assert!(summarize_annual(&[]).is_none());
    }

    #[test]
    fn test_summarize_median_even_count() {
        let points = vec![
            AnnualRatePoint {
                year: 2000,
                tax_receipts: 0.0,
                profits_before_tax: 1.0,
                effective_rate: 10.0,
            },
            AnnualRatePoint {
                year: 2001,
                tax_receipts: 0.0,
                profits_before_tax: 1.0,
                effective_rate: 20.0,
            },
        ];

        let stats = summarize_annual(&points).unwrap();
        assert_eq!(stats.median, 15.0);
        // ddof=1: sqrt(((10-15)^2 + (20-15)^2) / 1)
        assert!((stats.std_dev - 50.0_f64.sqrt()).abs() < 1e-9);
    }
}
