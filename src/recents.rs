//! Recently opened files, persisted as JSON in the config directory.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConfigManager;

const RECENTS_FILE: &str = "recents.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentEntry {
    pub path: PathBuf,
    pub opened_at: DateTime<Utc>,
}

/// Recent opened files history
pub struct Recents {
    config: ConfigManager,
    limit: usize,
    entries: Vec<RecentEntry>,
}

impl Recents {
    /// Load the recents list; a missing or unreadable file yields an empty list.
    pub fn load(config: ConfigManager, limit: usize) -> Self {
        let path = config.config_path(RECENTS_FILE);

        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Could not parse {}: {}", path.display(), e);
                Vec::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                eprintln!("Warning: Could not read {}: {}", path.display(), e);
                Vec::new()
            }
        };

        Self {
            config,
            limit,
            entries,
        }
    }

    pub fn entries(&self) -> &[RecentEntry] {
        &self.entries
    }

    /// Record an opened file: moved/inserted at the front, deduplicated by
    /// path, truncated to the limit, saved immediately.
    pub fn add(&mut self, path: &Path) -> Result<()> {
        self.entries.retain(|e| e.path != path);
        self.entries.insert(
            0,
            RecentEntry {
                path: path.to_path_buf(),
                opened_at: Utc::now(),
            },
        );
        self.entries.truncate(self.limit);
        self.save()
    }

    /// Remove one entry by path
    pub fn remove(&mut self, path: &Path) -> Result<()> {
        self.entries.retain(|e| e.path != path);
        self.save()
    }

    /// Drop entries whose file no longer exists. Returns how many were removed.
    pub fn prune_missing(&mut self) -> Result<usize> {
        let before = self.entries.len();
        self.entries.retain(|e| e.path.exists());
        let removed = before - self.entries.len();
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    /// Empty the list and delete nothing else
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    fn save(&self) -> Result<()> {
        self.config.ensure_config_dir()?;
        let path = self.config.config_path(RECENTS_FILE);
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&path, json)?;
        Ok(())
    }
}
