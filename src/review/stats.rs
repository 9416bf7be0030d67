//! Review statistics over a set of items

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::models::{ItemKey, ItemState};

/// Weight below which an item counts as mastered
pub const MASTERED_THRESHOLD: f64 = 0.5;
/// Weight below which a non-mastered item only needs consolidation
pub const NEEDS_REVIEW_THRESHOLD: f64 = 2.0;

/// Familiarity band derived from an item's weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Familiarity {
    Mastered,
    NeedsReview,
    Strange,
}

impl Familiarity {
    pub fn from_weight(weight: f64) -> Self {
        if weight < MASTERED_THRESHOLD {
            Self::Mastered
        } else if weight < NEEDS_REVIEW_THRESHOLD {
            Self::NeedsReview
        } else {
            Self::Strange
        }
    }
}

/// Statistics for a single collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub item_count: usize,
    pub total_weight: f64,
    pub average_weight: f64,
    pub mastered_count: usize,
    pub needs_review_count: usize,
    pub strange_count: usize,
    pub never_reviewed_count: usize,
}

impl CollectionStats {
    fn add(&mut self, state: &ItemState) {
        self.item_count += 1;
        self.total_weight += state.weight;
        match Familiarity::from_weight(state.weight) {
            Familiarity::Mastered => self.mastered_count += 1,
            Familiarity::NeedsReview => self.needs_review_count += 1,
            Familiarity::Strange => self.strange_count += 1,
        }
        if state.last_reviewed.is_none() {
            self.never_reviewed_count += 1;
        }
    }

    fn finish(&mut self) {
        self.average_weight = if self.item_count > 0 {
            self.total_weight / self.item_count as f64
        } else {
            0.0
        };
    }
}

/// Statistics across every collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_collections: usize,
    pub totals: CollectionStats,
    pub average_interval: f64,
    pub min_interval: f64,
    pub max_interval: f64,
    pub collections: BTreeMap<String, CollectionStats>,
}

/// Summarize the given items, grouped by collection
pub fn compute<'a, I>(items: I) -> ReviewStats
where
    I: IntoIterator<Item = (&'a ItemKey, ItemState)>,
{
    let mut stats = ReviewStats::default();
    let mut interval_sum = 0.0;
    let mut min_interval = f64::INFINITY;
    let mut max_interval = f64::NEG_INFINITY;

    for (key, state) in items {
        stats
            .collections
            .entry(key.collection().to_string())
            .or_default()
            .add(&state);
        stats.totals.add(&state);

        interval_sum += state.interval;
        min_interval = min_interval.min(state.interval);
        max_interval = max_interval.max(state.interval);
    }

    for collection in stats.collections.values_mut() {
        collection.finish();
    }
    stats.totals.finish();
    stats.total_collections = stats.collections.len();

    if stats.totals.item_count > 0 {
        stats.average_interval = interval_sum / stats.totals.item_count as f64;
        stats.min_interval = min_interval;
        stats.max_interval = max_interval;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(raw: &str, weight: f64, interval: f64) -> (ItemKey, ItemState) {
        (
            ItemKey::parse(raw).unwrap(),
            ItemState {
                weight,
                last_reviewed: None,
                interval,
            },
        )
    }

    #[test]
    fn test_familiarity_bands() {
        assert_eq!(Familiarity::from_weight(0.1), Familiarity::Mastered);
        assert_eq!(Familiarity::from_weight(0.5), Familiarity::NeedsReview);
        assert_eq!(Familiarity::from_weight(1.99), Familiarity::NeedsReview);
        assert_eq!(Familiarity::from_weight(2.0), Familiarity::Strange);
        assert_eq!(Familiarity::from_weight(10.0), Familiarity::Strange);
    }

    #[test]
    fn test_empty_stats() {
        let stats = compute(std::iter::empty::<(&ItemKey, ItemState)>());
        assert_eq!(stats, ReviewStats::default());
    }

    #[test]
    fn test_grouped_stats() {
        let items = vec![
            item("math/a", 0.2, 4.0),
            item("math/b", 1.0, 1.0),
            item("math/c", 3.0, 0.5),
            item("bio/d", 1.5, 2.5),
        ];

        let stats = compute(items.iter().map(|(k, s)| (k, *s)));

        assert_eq!(stats.total_collections, 2);
        assert_eq!(stats.totals.item_count, 4);
        assert!((stats.totals.total_weight - 5.7).abs() < 1e-9);
        assert_eq!(stats.totals.mastered_count, 1);
        assert_eq!(stats.totals.needs_review_count, 2);
        assert_eq!(stats.totals.strange_count, 1);
        assert_eq!(stats.totals.never_reviewed_count, 4);
        assert!((stats.average_interval - 2.0).abs() < 1e-9);
        assert_eq!(stats.min_interval, 0.5);
        assert_eq!(stats.max_interval, 4.0);

        let math = &stats.collections["math"];
        assert_eq!(math.item_count, 3);
        assert!((math.average_weight - 1.4).abs() < 1e-9);
        assert_eq!(stats.collections["bio"].needs_review_count, 1);
    }
}
