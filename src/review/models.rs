//! Data models for the review system

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReviewError;

pub const MIN_WEIGHT: f64 = 0.1;
pub const MAX_WEIGHT: f64 = 10.0;
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Review interval bounds, in days
pub const MIN_INTERVAL: f64 = 0.1;
pub const MAX_INTERVAL: f64 = 30.0;
pub const DEFAULT_INTERVAL: f64 = 1.0;

/// Key of a trackable item, always of the form `collection/item`
///
/// The split happens at the first `/`, so item names may themselves
/// contain slashes. Neither part may be blank.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey(String);

impl ItemKey {
    /// Build a key from a collection id and an item name
    pub fn new(collection: &str, item: &str) -> Result<Self, ReviewError> {
        if collection.contains('/') {
            return Err(ReviewError::InvalidKey(format!("{}/{}", collection, item)));
        }
        Self::parse(&format!("{}/{}", collection, item))
    }

    /// Parse a `collection/item` string
    pub fn parse(raw: &str) -> Result<Self, ReviewError> {
        match raw.split_once('/') {
            Some((collection, item))
                if !collection.trim().is_empty() && !item.trim().is_empty() =>
            {
                Ok(Self(raw.to_string()))
            }
            _ => Err(ReviewError::InvalidKey(raw.to_string())),
        }
    }

    pub fn collection(&self) -> &str {
        self.parts().0
    }

    pub fn item(&self) -> &str {
        self.parts().1
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> (&str, &str) {
        // Validated on construction
        self.0.split_once('/').unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemKey {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ItemKey {
    type Error = ReviewError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

/// Spaced repetition state of a single item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemState {
    /// Higher means less familiar, and reviewed sooner
    pub weight: f64,
    /// `None` until the first review
    pub last_reviewed: Option<DateTime<Utc>>,
    /// Days until the item is due again
    pub interval: f64,
}

impl Default for ItemState {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            last_reviewed: None,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl ItemState {
    /// Copy of this state with weight and interval forced into range
    pub fn clamped(self) -> Self {
        Self {
            weight: clamp_weight(self.weight),
            interval: clamp_interval(self.interval),
            ..self
        }
    }

    /// When the item becomes due, if it has ever been reviewed
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        let last = self.last_reviewed?;
        let millis = (self.interval * 86_400_000.0).round() as i64;
        Some(last + chrono::Duration::milliseconds(millis))
    }
}

/// NaN collapses to the minimum
pub fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        return MIN_WEIGHT;
    }
    weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

pub fn clamp_interval(interval: f64) -> f64 {
    if interval.is_nan() {
        return MIN_INTERVAL;
    }
    interval.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

/// User-reported familiarity after seeing an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feedback {
    /// Recalled without trouble
    Familiar,
    /// Partially recalled
    Blur,
    /// Not recalled at all
    Strange,
    /// Any unrecognized or missing label
    Other,
}

impl Feedback {
    /// Map a feedback label onto a variant; never fails
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "familiar" => Self::Familiar,
            "blur" => Self::Blur,
            "strange" => Self::Strange,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Familiar => "familiar",
            Self::Blur => "blur",
            Self::Strange => "strange",
            Self::Other => "other",
        }
    }
}

impl From<&str> for Feedback {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl From<Option<&str>> for Feedback {
    fn from(label: Option<&str>) -> Self {
        label.map_or(Self::Other, Self::from_label)
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
