//! Recovery score and trend calculation.
//!
//! The score is a weighted sum around a baseline of 50:
//!
//! ```text
//! 50 + (adherence - 50) * 0.30
//!    + (exercise  - 50) * 0.25
//!    + (10 - pain)      * 2.5
//!    + mood points + swelling points
//! ```
//!
//! rounded half up and clamped to `[0, 100]`. The older flat weighting
//! (0.3 / 0.2 / -2 per pain point) is superseded by this formula.

use crate::types::{DailyRecoveryInput, Trend};

/// Fewer history points than this always yields `Trend::Stable`
pub const MIN_TREND_HISTORY: usize = 3;

/// Score the day's input
///
/// Evaluated in twentieths of a point so that `.5` results round the same
/// way on every platform.
pub fn compute_score(input: &DailyRecoveryInput) -> u8 {
    let adherence = i32::from(input.medicine_adherence_percent);
    let exercise = i32::from(input.exercise_completion_percent);
    let pain = i32::from(input.pain_score);

    let twentieths = 50 * 20
        + (adherence - 50) * 6
        + (exercise - 50) * 5
        + (10 - pain) * 50
        + input.mood.points() * 20
        + input.swelling.points() * 20;

    let rounded = (twentieths + 10).div_euclid(20);
    rounded.clamp(0, 100) as u8
}

/// Compare today's score with the mean of the trailing window
pub fn compute_trend(current: u8, history: &[u8]) -> Trend {
    if history.len() < MIN_TREND_HISTORY {
        return Trend::Stable;
    }

    let sum: u32 = history.iter().map(|&s| u32::from(s)).sum();
    let avg = f64::from(sum) / history.len() as f64;
    let current = f64::from(current);

    if current >= avg + 5.0 {
        Trend::Improving
    } else if current <= avg - 20.0 {
        Trend::Critical
    } else if current <= avg - 10.0 {
        Trend::Warning
    } else {
        Trend::Stable
    }
}
