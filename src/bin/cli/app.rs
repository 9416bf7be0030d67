use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use revu_lib::{ItemKey, ReviewConfig, Scheduler};

/// Shared application state for CLI commands
pub struct App {
    pub config: ReviewConfig,
    pub data_dir: PathBuf,
    pub scheduler: Scheduler,
}

impl App {
    /// Initialize from the config file, with `data_dir` taking precedence
    pub fn new(data_dir: Option<PathBuf>, config_path: Option<&Path>) -> Result<Self> {
        let mut config = ReviewConfig::load(config_path).context("Failed to load config")?;
        if data_dir.is_some() {
            config.data_dir = data_dir;
        }

        let data_dir = config.data_dir().context("Failed to get data directory")?;
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let scheduler = Scheduler::open(config.state_path()?);

        Ok(Self {
            config,
            data_dir,
            scheduler,
        })
    }

    /// Collection directory names, sorted
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let mut collections = Vec::new();
        let entries = fs::read_dir(&self.data_dir)
            .with_context(|| format!("Failed to read {}", self.data_dir.display()))?;

        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                collections.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        collections.sort();
        Ok(collections)
    }

    /// Find a collection by name (case-insensitive prefix match)
    pub fn find_collection(&self, name: &str) -> Result<String> {
        let collections = self.list_collections()?;
        let name_lower = name.to_lowercase();

        // Exact match first
        if let Some(c) = collections.iter().find(|c| c.to_lowercase() == name_lower) {
            return Ok(c.clone());
        }

        let matches: Vec<&String> = collections
            .iter()
            .filter(|c| c.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!(
                "No collection matching '{}'. Available collections:\n{}",
                name,
                collections
                    .iter()
                    .map(|c| format!("  - {}", c))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous collection name '{}'. Matches:\n{}",
                name,
                matches
                    .iter()
                    .map(|c| format!("  - {}", c))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    /// Image items currently in a collection directory, registered with the scheduler
    ///
    /// Items are keyed under the collection's recorded code when the state
    /// file has one, so state written under encoded ids is picked up again.
    pub fn scan_collection(&self, collection: &str) -> Result<Vec<ItemKey>> {
        let dir = self.data_dir.join(collection);
        let code = self.collection_code(collection);
        let mut keys = Vec::new();

        for entry in fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !self.config.is_image(&file_name) {
                continue;
            }
            match ItemKey::new(&code, &file_name) {
                Ok(key) => keys.push(key),
                Err(e) => log::warn!("Skipping {:?} in {:?}: {}", file_name, collection, e),
            }
        }

        keys.sort();
        self.scheduler
            .register_items(&keys)
            .context("Failed to save item state")?;
        Ok(keys)
    }

    /// Id items of a collection directory are keyed under
    pub fn collection_code(&self, collection: &str) -> String {
        self.scheduler
            .collection_code(collection)
            .unwrap_or_else(|| collection.to_string())
    }

    /// Parse an item key given on the command line, by directory name or code
    pub fn parse_key(&self, raw: &str) -> Result<ItemKey> {
        let key = ItemKey::parse(raw).context("Item keys look like \"collection/item.png\"")?;
        match self.scheduler.collection_code(key.collection()) {
            Some(code) => Ok(ItemKey::new(&code, key.item())?),
            None => Ok(key),
        }
    }

    /// Directory name for a collection id, decoding recorded codes
    pub fn display_name(&self, collection: &str) -> String {
        self.scheduler
            .collection_name(collection)
            .unwrap_or_else(|| collection.to_string())
    }

    /// File backing an item
    pub fn item_path(&self, key: &ItemKey) -> PathBuf {
        self.data_dir
            .join(self.display_name(key.collection()))
            .join(key.item())
    }
}
