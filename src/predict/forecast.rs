//! Additive seasonal forecaster
//!
//! Decomposes a daily series into a linear trend plus a periodic component
//! (mean detrended residual per day of the cycle) and extrapolates one day
//! past the last observation. The periodic term only applies once the series
//! spans at least two full periods.

use chrono::NaiveDate;
use tracing::debug;

use super::SeasonalForecaster;
use crate::config::DEFAULT_SEASONAL_PERIOD_DAYS;
use crate::error::CoachError;

/// Trend + seasonal decomposition forecaster
#[derive(Debug, Clone, Copy)]
pub struct AdditiveSeasonalForecaster {
    period: usize,
}

impl Default for AdditiveSeasonalForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_SEASONAL_PERIOD_DAYS)
    }
}

impl AdditiveSeasonalForecaster {
    /// Create a forecaster with the given period in days (at least 2)
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(2),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl SeasonalForecaster for AdditiveSeasonalForecaster {
    fn forecast_next(&self, series: &[(NaiveDate, f64)]) -> Result<f64, CoachError> {
        let Some(&(first_date, _)) = series.first() else {
            return Err(CoachError::insufficient(1, 0, "forecast points"));
        };

        let days: Vec<i64> = series
            .iter()
            .map(|(date, _)| (*date - first_date).num_days())
            .collect();
        let values: Vec<f64> = series.iter().map(|(_, value)| *value).collect();

        let (intercept, slope) = linear_trend(&days, &values);
        let last_day = days.iter().copied().max().unwrap_or(0);
        let next_day = last_day + 1;
        let trend = slope.mul_add(next_day as f64, intercept);

        let span = (last_day - days.iter().copied().min().unwrap_or(0) + 1) as usize;
        let seasonal = if span >= 2 * self.period {
            let residuals: Vec<f64> = days
                .iter()
                .zip(&values)
                .map(|(d, v)| v - slope.mul_add(*d as f64, intercept))
                .collect();
            seasonal_offset(&days, &residuals, self.period, next_day)
        } else {
            0.0
        };

        debug!(
            points = series.len(),
            slope,
            seasonal,
            period = self.period,
            "Forecast next value"
        );
        Ok(trend + seasonal)
    }
}

/// Least-squares line through (day, value); flat when all days coincide
fn linear_trend(days: &[i64], values: &[f64]) -> (f64, f64) {
    let n = days.len() as f64;
    let mean_x = days.iter().map(|d| *d as f64).sum::<f64>() / n;
    let mean_y = values.iter().sum::<f64>() / n;

    let (sxx, sxy) = days
        .iter()
        .zip(values)
        .fold((0.0, 0.0), |(sxx, sxy), (d, y)| {
            let dx = *d as f64 - mean_x;
            (dx.mul_add(dx, sxx), dx.mul_add(y - mean_y, sxy))
        });

    if sxx.abs() < f64::EPSILON {
        return (mean_y, 0.0);
    }
    let slope = sxy / sxx;
    (slope.mul_add(-mean_x, mean_y), slope)
}

/// Centered mean residual for the cycle slot of `target_day`
fn seasonal_offset(days: &[i64], residuals: &[f64], period: usize, target_day: i64) -> f64 {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (d, r) in days.iter().zip(residuals) {
        let slot = d.rem_euclid(period as i64) as usize;
        sums[slot] += r;
        counts[slot] += 1;
    }

    let slot_means: Vec<Option<f64>> = sums
        .iter()
        .zip(&counts)
        .map(|(s, c)| (*c > 0).then(|| s / *c as f64))
        .collect();
    let observed: Vec<f64> = slot_means.iter().flatten().copied().collect();
    let center = observed.iter().sum::<f64>() / observed.len().max(1) as f64;

    let target_slot = target_day.rem_euclid(period as i64) as usize;
    slot_means[target_slot].map_or(0.0, |m| m - center)
}
