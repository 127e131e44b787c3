//! SM-2 Spaced Repetition Algorithm
//!
//! Implementation of the SuperMemo 2 algorithm for calculating
//! review intervals from a recall quality on the 0-5 scale.
//! A quality of 3 or more counts as a successful recall.
//!
//! Everything here is pure: the current time is passed in by the caller.

use chrono::{DateTime, Duration, Utc};

use super::models::{EstimatedIntervals, Quality, Rating, SchedulingParams, SchedulingResult};

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Longest interval the scheduler hands out, about a hundred years
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Calculate the next review state using SM-2
///
/// `quality` is clamped to `[0, 5]` and rounded, so this never fails.
/// The next review is `now + interval` days, with the interval capped at
/// [`MAX_INTERVAL_DAYS`].
pub fn calculate_next(
    quality: impl Into<Quality>,
    prior: &SchedulingParams,
    now: DateTime<Utc>,
) -> SchedulingResult {
    let quality = quality.into();
    let params = next_params(quality, prior);

    log::debug!(
        "SM-2 q={} ef {:.2}->{:.2} interval {}->{} reps {}->{}",
        quality.value(),
        prior.ease_factor,
        params.ease_factor,
        prior.interval,
        params.interval,
        prior.repetitions,
        params.repetitions
    );

    SchedulingResult {
        ease_factor: params.ease_factor,
        interval: params.interval,
        repetitions: params.repetitions,
        next_review: add_days(now, params.interval),
    }
}

/// `now + days`, saturating at the latest representable instant
fn add_days(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn next_params(quality: Quality, prior: &SchedulingParams) -> SchedulingParams {
    let (interval, repetitions) = if quality.is_passing() {
        let interval = match prior.repetitions {
            0 => 1,
            1 => 6,
            _ => {
                debug_assert!(
                    prior.interval >= 1,
                    "interval must be at least 1 after two successful reviews"
                );
                let next = (f64::from(prior.interval) * prior.ease_factor).round();
                next.min(f64::from(MAX_INTERVAL_DAYS)) as u32
            }
        };
        (interval, prior.repetitions + 1)
    } else {
        // Failed recall: start over, review again tomorrow
        (1, 0)
    };

    SchedulingParams {
        ease_factor: next_ease_factor(prior.ease_factor, quality),
        interval,
        repetitions,
    }
}

/// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), floored at 1.3 and
/// rounded to two decimals
fn next_ease_factor(ease_factor: f64, quality: Quality) -> f64 {
    let miss = f64::from(Quality::MAX - quality.value());
    let updated = ease_factor + (0.1 - miss * (0.08 + miss * 0.02));
    round_to_hundredths(updated.max(MIN_EASE_FACTOR))
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Interval each rating would give, without persisting anything
pub fn estimated_intervals(prior: &SchedulingParams) -> EstimatedIntervals {
    let interval = |rating: Rating| next_params(rating.quality(), prior).interval;

    EstimatedIntervals {
        again: interval(Rating::Again),
        hard: interval(Rating::Hard),
        good: interval(Rating::Good),
        easy: interval(Rating::Easy),
    }
}

/// Format an interval in days to a short human-readable string
pub fn format_interval(days: u32) -> String {
    match days {
        0 | 1 => "1d".to_string(),
        2..=6 => format!("{}d", days),
        7..=29 => format!("{}w", (f64::from(days) / 7.0).round()),
        30..=364 => format!("{}mo", (f64::from(days) / 30.0).round()),
        _ => {
            let years = round_to_tenths(f64::from(days) / 365.0);
            format!("{}y", years)
        }
    }
}

fn round_to_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
