//! Persistent item state
//!
//! All state lives in a single JSON file with three parallel maps keyed by
//! item key, plus the collection name-encoding table:
//! ```json
//! {
//!   "subject_mapping": { "S000": "math" },
//!   "weights": { "S000/a.png": 1.0 },
//!   "last_reviewed": { "S000/a.png": "2024-03-01T10:00:00Z" },
//!   "review_intervals": { "S000/a.png": 1.0 }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::models::{ItemKey, ItemState};
use crate::error::Result;

const SUBJECT_MAPPING: &str = "subject_mapping";
const WEIGHTS: &str = "weights";
const LAST_REVIEWED: &str = "last_reviewed";
const REVIEW_INTERVALS: &str = "review_intervals";

/// On-disk layout written by [`ItemStateStore::save`]
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    subject_mapping: BTreeMap<String, String>,
    weights: BTreeMap<String, f64>,
    last_reviewed: BTreeMap<String, Option<String>>,
    review_intervals: BTreeMap<String, f64>,
}

/// In-memory item states backed by a JSON file
pub struct ItemStateStore {
    path: PathBuf,
    states: BTreeMap<ItemKey, ItemState>,
    subject_mapping: BTreeMap<String, String>,
}

impl ItemStateStore {
    /// Empty store that will save to `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            states: BTreeMap::new(),
            subject_mapping: BTreeMap::new(),
        }
    }

    /// Open the store at `path`, falling back to an empty store on any read problem
    pub fn open(path: PathBuf) -> Self {
        let mut store = Self::new(path);
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored state, or the default for an item never seen
    pub fn get(&self, key: &ItemKey) -> ItemState {
        self.states.get(key).copied().unwrap_or_default()
    }

    pub fn put(&mut self, key: ItemKey, state: ItemState) {
        self.states.insert(key, state.clamped());
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.states.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Record default state for every key not yet tracked; returns how many were new
    pub fn observe<'a, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a ItemKey>,
    {
        let mut added = 0;
        for key in keys {
            if !self.states.contains_key(key) {
                self.states.insert(key.clone(), ItemState::default());
                added += 1;
            }
        }
        added
    }

    /// Tracked keys belonging to one collection
    pub fn keys_in_collection(&self, collection: &str) -> Vec<ItemKey> {
        self.states
            .keys()
            .filter(|key| key.collection() == collection)
            .cloned()
            .collect()
    }

    /// Display name recorded for an encoded collection id
    pub fn collection_name(&self, code: &str) -> Option<&str> {
        self.subject_mapping.get(code).map(String::as_str)
    }

    /// Encoded id already recorded for a collection name, lowest code first
    pub fn collection_code(&self, name: &str) -> Option<&str> {
        self.subject_mapping
            .iter()
            .find(|(_, mapped)| mapped.as_str() == name)
            .map(|(code, _)| code.as_str())
    }

    /// Replace the in-memory state with the file contents
    ///
    /// A missing, empty or malformed file leaves the store empty. Problems
    /// are logged, never returned.
    pub fn load(&mut self) {
        self.states.clear();
        self.subject_mapping.clear();

        if !self.path.exists() {
            log::info!(
                "State file {:?} does not exist, starting with an empty store",
                self.path
            );
            return;
        }

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to read state file {:?}: {}", self.path, e);
                return;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        let content = content.trim();
        if content.is_empty() {
            log::info!("State file {:?} is empty", self.path);
            return;
        }

        let root = match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(root)) => root,
            Ok(_) => {
                log::warn!("State file {:?} is not a JSON object, ignoring it", self.path);
                return;
            }
            Err(e) => {
                log::warn!("State file {:?} is malformed: {}", self.path, e);
                return;
            }
        };

        self.absorb(&root);
        log::debug!("Loaded {} item states from {:?}", self.states.len(), self.path);
    }

    fn absorb(&mut self, root: &Map<String, Value>) {
        for (code, name) in sub_map(root, SUBJECT_MAPPING) {
            if let Some(name) = name.as_str() {
                self.subject_mapping.insert(code.clone(), name.to_string());
            }
        }

        for (raw, value) in sub_map(root, WEIGHTS) {
            if let Some(key) = valid_key(raw) {
                let state = self.states.entry(key).or_default();
                if let Some(weight) = value.as_f64() {
                    state.weight = weight;
                }
            }
        }

        for (raw, value) in sub_map(root, REVIEW_INTERVALS) {
            if let Some(key) = valid_key(raw) {
                let state = self.states.entry(key).or_default();
                if let Some(interval) = value.as_f64() {
                    state.interval = interval;
                }
            }
        }

        for (raw, value) in sub_map(root, LAST_REVIEWED) {
            let Some(key) = valid_key(raw) else {
                continue;
            };
            let last_reviewed = match value {
                Value::String(s) => {
                    let parsed = parse_timestamp(s);
                    if parsed.is_none() {
                        log::warn!("Unreadable review time for {}: {:?}", raw, s);
                    }
                    parsed
                }
                _ => None,
            };
            self.states.entry(key).or_default().last_reviewed = last_reviewed;
        }

        for state in self.states.values_mut() {
            *state = state.clamped();
        }
    }

    /// Write every state to disk atomically
    pub fn save(&self) -> Result<()> {
        let mut file = StateFile {
            subject_mapping: self.subject_mapping.clone(),
            ..StateFile::default()
        };

        for (key, state) in &self.states {
            let key = key.to_string();
            file.weights.insert(key.clone(), state.weight);
            file.review_intervals.insert(key.clone(), state.interval);
            file.last_reviewed.insert(key, state.last_reviewed.map(format_timestamp));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write to .tmp then rename
        let tmp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&tmp_path, json)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        log::debug!("Saved {} item states to {:?}", self.states.len(), self.path);
        Ok(())
    }
}

/// A named sub-object of the root, empty when absent or of the wrong type
fn sub_map<'a>(root: &'a Map<String, Value>, name: &str) -> impl Iterator<Item = (&'a String, &'a Value)> {
    root.get(name)
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|map| map.iter())
}

fn valid_key(raw: &str) -> Option<ItemKey> {
    match ItemKey::parse(raw) {
        Ok(key) => Some(key),
        Err(e) => {
            log::warn!("Skipping stored state: {}", e);
            None
        }
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// RFC 3339, or a naive ISO timestamp taken as local time
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}
