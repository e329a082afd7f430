//! Forward predictions
//!
//! Two independent point estimates over an ingested series:
//! - next-day calories from (day of week, active minutes, steps)
//! - next-day sleep duration from the daily duration history
//!
//! The fitting algorithms sit behind [`RegressionFitter`] and
//! [`SeasonalForecaster`] so callers can substitute their own. Results are
//! advisory point estimates with no uncertainty bound.

mod forecast;
mod regression;

pub use forecast::AdditiveSeasonalForecaster;
pub use regression::{LinearModel, OrdinaryLeastSquares};

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::error::CoachError;
use crate::schema::{FitnessActivity, PredictionInput, SleepMetric};
use crate::types::BucketedSeries;

/// Minimum history for either estimator
pub const MIN_PREDICTION_POINTS: usize = 2;

/// Fits a regression on feature rows and evaluates it at `query`
pub trait RegressionFitter: Send + Sync {
    fn fit_predict(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        query: &[f64],
    ) -> Result<f64, CoachError>;
}

/// Fits an ordered (date, value) series and forecasts the following day
pub trait SeasonalForecaster: Send + Sync {
    fn forecast_next(&self, series: &[(NaiveDate, f64)]) -> Result<f64, CoachError>;
}

/// Predict next-day calories, truncated toward zero.
///
/// The model is fitted in-sample on the whole series. Two points are enough:
/// an under-determined fit falls back to the minimum-norm solution.
pub fn predict_calories(
    series: &BucketedSeries<FitnessActivity>,
    input: &PredictionInput,
    fitter: &dyn RegressionFitter,
) -> Result<i64, CoachError> {
    if series.len() < MIN_PREDICTION_POINTS {
        return Err(CoachError::insufficient(
            MIN_PREDICTION_POINTS,
            series.len(),
            "historical points",
        ));
    }

    let features: Vec<Vec<f64>> = series
        .iter()
        .map(|e| {
            vec![
                e.date().weekday().num_days_from_monday() as f64,
                e.record.active_minutes as f64,
                e.record.steps as f64,
            ]
        })
        .collect();
    let targets: Vec<f64> = series.iter().map(|e| e.record.calories as f64).collect();
    let query = [
        input.day_of_week as f64,
        input.active_minutes as f64,
        input.steps as f64,
    ];

    let estimate = fitter.fit_predict(&features, &targets, &query)?;
    if !estimate.is_finite() {
        return Err(CoachError::PredictionFailed(format!(
            "Calorie estimate is not finite: {}",
            estimate
        )));
    }

    debug!(points = series.len(), estimate, "Predicted calories");
    Ok(estimate.trunc() as i64)
}

/// Forecast next-day sleep duration, rounded to whole hours (halves to even)
pub fn predict_sleep_duration(
    series: &BucketedSeries<SleepMetric>,
    forecaster: &dyn SeasonalForecaster,
) -> Result<f64, CoachError> {
    if series.len() < MIN_PREDICTION_POINTS {
        return Err(CoachError::insufficient(
            MIN_PREDICTION_POINTS,
            series.len(),
            "historical points",
        ));
    }

    let history: Vec<(NaiveDate, f64)> = series
        .iter()
        .map(|e| (e.date(), e.record.duration))
        .collect();

    let estimate = forecaster.forecast_next(&history)?;
    if !estimate.is_finite() {
        return Err(CoachError::PredictionFailed(format!(
            "Sleep forecast is not finite: {}",
            estimate
        )));
    }

    debug!(points = series.len(), estimate, "Forecast sleep duration");
    Ok(estimate.round_ties_even())
}
