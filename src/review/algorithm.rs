//! Weight-based spaced repetition scheduling
//!
//! Feedback moves an item's weight and review interval:
//!
//! | feedback | interval           | weight              |
//! |----------|--------------------|---------------------|
//! | familiar | `min(30, i * 2)`   | `w * e^-0.1`        |
//! | blur     | `max(1, i * 1.2)`  | `w * 0.95`          |
//! | strange  | `max(0.1, i * 0.5)`| `min(10, w * 1.5)`  |
//! | other    | unchanged          | `w * 0.9`           |
//!
//! Selection turns each item's state into a priority, normalizes the
//! priorities into a probability distribution and draws items from it
//! without replacement.

use chrono::{DateTime, Utc};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use super::models::{
    clamp_interval, clamp_weight, Feedback, ItemState, MAX_INTERVAL, MAX_WEIGHT, MIN_INTERVAL,
};

/// Priority given to items that have never been reviewed
pub const NEVER_REVIEWED_PRIORITY: f64 = 1_000_000.0;

/// Replacement for a priority that came out NaN or infinite
const FALLBACK_PRIORITY: f64 = 1.0;

/// Forgetting rate applied on "familiar"
const FAMILIAR_FORGETTING_RATE: f64 = 0.1;

const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Smallest "hours until due" used as a divisor
const MIN_HOURS_UNTIL_DUE: f64 = 0.1;

/// Apply one piece of feedback to a state reviewed at `now`
pub fn apply_feedback(state: &ItemState, feedback: Feedback, now: DateTime<Utc>) -> ItemState {
    let mut weight = state.weight;
    let mut interval = state.interval;

    match feedback {
        Feedback::Familiar => {
            interval = (interval * 2.0).min(MAX_INTERVAL);
            weight *= (-FAMILIAR_FORGETTING_RATE).exp();
        }
        Feedback::Blur => {
            interval = (interval * 1.2).max(1.0);
            weight *= 0.95;
        }
        Feedback::Strange => {
            interval = (interval * 0.5).max(MIN_INTERVAL);
            weight = (weight * 1.5).min(MAX_WEIGHT);
        }
        Feedback::Other => {
            weight *= 0.9;
        }
    }

    ItemState {
        weight: clamp_weight(weight),
        last_reviewed: Some(now),
        interval: clamp_interval(interval),
    }
}

/// Raw review priority of an item at `now`; may be non-finite
pub fn priority(state: &ItemState, now: DateTime<Utc>) -> f64 {
    let Some(last_reviewed) = state.last_reviewed else {
        return NEVER_REVIEWED_PRIORITY;
    };

    let elapsed = (now - last_reviewed).num_milliseconds() as f64 / 1000.0;
    let seconds_until_due = state.interval * SECONDS_PER_DAY - elapsed;

    if seconds_until_due <= 0.0 {
        // Grows without bound the longer the item is overdue
        seconds_until_due.abs() + state.weight * 1000.0
    } else {
        let hours_until_due = (seconds_until_due / SECONDS_PER_HOUR).max(MIN_HOURS_UNTIL_DUE);
        state.weight * 1000.0 / hours_until_due
    }
}

/// Replace a non-finite priority with the fallback value
pub fn sanitize_priority(priority: f64) -> f64 {
    if priority.is_finite() {
        priority
    } else {
        FALLBACK_PRIORITY
    }
}

/// Turn priorities into probabilities summing to 1
///
/// Falls back to a uniform distribution whenever the total is zero or
/// not finite, both before and after discarding non-finite entries.
pub fn normalize(priorities: &[f64]) -> Vec<f64> {
    if priorities.is_empty() {
        return Vec::new();
    }

    let uniform = || vec![1.0 / priorities.len() as f64; priorities.len()];

    let total: f64 = priorities.iter().sum();
    let probabilities = if total > 0.0 && total.is_finite() {
        priorities.iter().map(|p| p / total).collect::<Vec<_>>()
    } else {
        uniform()
    };

    let probabilities: Vec<f64> = probabilities
        .into_iter()
        .map(|p| if p.is_finite() { p } else { 0.0 })
        .collect();
    let sum: f64 = probabilities.iter().sum();

    if sum == 0.0 || !sum.is_finite() {
        uniform()
    } else {
        probabilities.into_iter().map(|p| p / sum).collect()
    }
}

/// Draw `amount` distinct indices, each draw proportional to the remaining weights
///
/// Once every remaining weight is zero (or the weights are otherwise unusable)
/// the rest are drawn uniformly from the indices not yet taken.
pub fn sample_without_replacement<R: Rng + ?Sized>(
    weights: &[f64],
    amount: usize,
    rng: &mut R,
) -> Vec<usize> {
    let amount = amount.min(weights.len());
    let mut remaining: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let mut taken = vec![false; weights.len()];
    let mut picked = Vec::with_capacity(amount);

    while picked.len() < amount {
        let index = match WeightedIndex::new(&remaining) {
            Ok(dist) => dist.sample(rng),
            Err(_) => {
                let open: Vec<usize> = (0..weights.len()).filter(|i| !taken[*i]).collect();
                match open.choose(rng) {
                    Some(i) => *i,
                    None => break,
                }
            }
        };

        taken[index] = true;
        remaining[index] = 0.0;
        picked.push(index);
    }

    picked
}

/// Pick up to `count` distinct states to review, returning their indices in draw order
pub fn select_indices<R: Rng + ?Sized>(
    states: &[ItemState],
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<usize> {
    if states.is_empty() {
        return Vec::new();
    }

    let priorities: Vec<f64> = states
        .iter()
        .map(|state| sanitize_priority(priority(state, now)))
        .collect();
    let probabilities = normalize(&priorities);

    sample_without_replacement(&probabilities, count, rng)
}

/// Format an interval in days to a short human-readable string
pub fn format_interval(days: f64) -> String {
    if days < 1.0 {
        format!("{}h", (days * 24.0).round() as i64)
    } else if days < 7.0 {
        format!("{:.1}d", days)
    } else {
        let weeks = days / 7.0;
        format!("{:.1}w", weeks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    use crate::review::models::MIN_WEIGHT;

    fn state(weight: f64, interval: f64, last_reviewed: Option<DateTime<Utc>>) -> ItemState {
        ItemState {
            weight,
            last_reviewed,
            interval,
        }
    }

    #[test]
    fn test_familiar_doubles_interval() {
        let now = Utc::now();
        let result = apply_feedback(&ItemState::default(), Feedback::Familiar, now);

        assert_eq!(result.interval, 2.0);
        assert!((result.weight - (-0.1f64).exp()).abs() < 1e-12);
        assert!((result.weight - 0.9048).abs() < 1e-4);
        assert_eq!(result.last_reviewed, Some(now));
    }

    #[test]
    fn test_familiar_interval_caps_at_thirty() {
        let result = apply_feedback(&state(1.0, 20.0, None), Feedback::Familiar, Utc::now());
        assert_eq!(result.interval, 30.0);
    }

    #[test]
    fn test_strange_caps_weight() {
        let result = apply_feedback(&state(8.0, 2.0, None), Feedback::Strange, Utc::now());

        assert_eq!(result.weight, 10.0);
        assert_eq!(result.interval, 1.0);
    }

    #[test]
    fn test_strange_interval_floor() {
        let result = apply_feedback(&state(1.0, 0.15, None), Feedback::Strange, Utc::now());
        assert_eq!(result.interval, 0.1);
        assert_eq!(result.weight, 1.5);
    }

    #[test]
    fn test_blur_interval_at_least_one_day() {
        let result = apply_feedback(&state(1.0, 0.5, None), Feedback::Blur, Utc::now());
        assert_eq!(result.interval, 1.0);
        assert!((result.weight - 0.95).abs() < 1e-12);

        let result = apply_feedback(&state(1.0, 5.0, None), Feedback::Blur, Utc::now());
        assert!((result.interval - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_other_feedback_decays_weight_only() {
        let result = apply_feedback(&state(2.0, 3.0, None), Feedback::Other, Utc::now());
        assert!((result.weight - 1.8).abs() < 1e-12);
        assert_eq!(result.interval, 3.0);
    }

    #[test]
    fn test_weight_floor() {
        let result = apply_feedback(&state(0.1, 1.0, None), Feedback::Other, Utc::now());
        assert_eq!(result.weight, MIN_WEIGHT);
    }

    #[test]
    fn test_feedback_sequences_stay_in_range() {
        let all = [
            Feedback::Familiar,
            Feedback::Blur,
            Feedback::Strange,
            Feedback::Other,
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();

        for start in [state(0.1, 0.1, None), state(10.0, 30.0, None), ItemState::default()] {
            let mut current = start;
            for _ in 0..500 {
                let feedback = *all.choose(&mut rng).unwrap();
                let before = current.weight;
                current = apply_feedback(&current, feedback, now);

                assert!((0.1..=10.0).contains(&current.weight));
                assert!((0.1..=30.0).contains(&current.interval));
                match feedback {
                    Feedback::Familiar => assert!(current.weight <= before),
                    Feedback::Strange => assert!(current.weight >= before),
                    Feedback::Blur => {
                        assert!(current.weight <= before);
                        assert!(current.weight >= (0.95 * before).max(MIN_WEIGHT) - 1e-12);
                    }
                    Feedback::Other => assert!(current.weight <= before),
                }
            }
        }
    }

    #[test]
    fn test_never_reviewed_priority() {
        let now = Utc::now();
        for (w, i) in [(0.1, 0.1), (10.0, 30.0), (1.0, 1.0)] {
            assert_eq!(priority(&state(w, i, None), now), NEVER_REVIEWED_PRIORITY);
        }
    }

    #[test]
    fn test_overdue_priority() {
        let now = Utc::now();
        let item = state(1.0, 1.0, Some(now - Duration::days(2)));
        assert!((priority(&item, now) - 87_400.0).abs() < 1e-6);
    }

    #[test]
    fn test_not_yet_due_priority() {
        let now = Utc::now();
        // Due in 12 hours
        let item = state(2.0, 1.0, Some(now - Duration::hours(12)));
        assert!((priority(&item, now) - 2000.0 / 12.0).abs() < 1e-6);

        // Due in a few seconds: hours clamp to 0.1
        let item = state(1.0, 1.0, Some(now - Duration::seconds(86_390)));
        assert!((priority(&item, now) - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_sanitize_priority() {
        assert_eq!(sanitize_priority(5.0), 5.0);
        assert_eq!(sanitize_priority(f64::NAN), 1.0);
        assert_eq!(sanitize_priority(f64::INFINITY), 1.0);
        assert_eq!(sanitize_priority(f64::NEG_INFINITY), 1.0);
    }

    #[test]
    fn test_normalize() {
        let p = normalize(&[1.0, 3.0]);
        assert_eq!(p, vec![0.25, 0.75]);

        assert_eq!(normalize(&[0.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(normalize(&[f64::MAX, f64::MAX]), vec![0.5, 0.5]);
        assert!(normalize(&[]).is_empty());

        let p = normalize(&[f64::NAN, 1.0]);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(p.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_sample_without_replacement_distinct() {
        let mut rng = StdRng::seed_from_u64(42);
        let weights = [0.1, 0.2, 0.3, 0.4, 0.0];

        let picked = sample_without_replacement(&weights, 5, &mut rng);
        assert_eq!(picked.len(), 5);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 5);
        // The zero-weight index can only ever come last
        assert_eq!(picked[4], 4);

        assert_eq!(sample_without_replacement(&weights, 10, &mut rng).len(), 5);
        assert!(sample_without_replacement(&[], 3, &mut rng).is_empty());
        assert!(sample_without_replacement(&weights, 0, &mut rng).is_empty());
    }

    #[test]
    fn test_sample_respects_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        let weights = [0.9, 0.1];
        let mut first_wins = 0;
        for _ in 0..2000 {
            if sample_without_replacement(&weights, 1, &mut rng)[0] == 0 {
                first_wins += 1;
            }
        }
        // Expect ~1800
        assert!(first_wins > 1650 && first_wins < 1950, "got {}", first_wins);
    }

    #[test]
    fn test_select_indices_favours_never_reviewed() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(3);
        let states = vec![
            state(0.1, 30.0, Some(now)),
            state(1.0, 1.0, None),
            state(0.1, 30.0, Some(now)),
        ];

        let mut fresh_first = 0;
        for _ in 0..200 {
            let picked = select_indices(&states, 1, now, &mut rng);
            if picked == vec![1] {
                fresh_first += 1;
            }
        }
        assert!(fresh_first > 190);
    }

    #[test]
    fn test_select_indices_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select_indices(&[], 10, Utc::now(), &mut rng).is_empty());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0.5), "12h");
        assert_eq!(format_interval(1.0), "1.0d");
        assert_eq!(format_interval(2.4), "2.4d");
        assert_eq!(format_interval(14.0), "2.0w");
    }
}
