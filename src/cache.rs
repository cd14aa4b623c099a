use color_eyre::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Registry of known cache files
const CACHE_FILES: &[&str] = &["query_history.txt"];

/// Manages cache directory and cache file operations
#[derive(Clone)]
pub struct CacheManager {
    pub(crate) cache_dir: PathBuf,
}

impl CacheManager {
    /// Create a new CacheManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine cache directory"))?
            .join(app_name);

        Ok(Self { cache_dir })
    }

    /// Create a CacheManager with a custom cache directory (primarily for testing)
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get path to a specific cache file
    pub fn cache_file(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    /// Ensure the cache directory exists
    pub fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Clear a specific cache file
    pub fn clear_file(&self, filename: &str) -> Result<()> {
        let file_path = self.cache_file(filename);
        if file_path.exists() {
            fs::remove_file(&file_path)?;
        }
        Ok(())
    }

    /// Clear all registered cache files
    pub fn clear_all(&self) -> Result<()> {
        for filename in CACHE_FILES {
            let file_path = self.cache_file(filename);
            if file_path.exists() {
                if let Err(e) = fs::remove_file(&file_path) {
                    eprintln!("Warning: Could not remove cache file {}: {}", filename, e);
                }
            }
        }

        Ok(())
    }
}

/// History of successful queries, one per line in the cache directory
pub struct QueryHistory {
    cache: CacheManager,
    limit: usize,
    queries: Vec<String>,
}

impl QueryHistory {
    pub fn load(cache: CacheManager, limit: usize) -> Self {
        let history_file = cache.cache_file("query_history.txt");

        let queries = match fs::read_to_string(&history_file) {
            Ok(content) => {
                let lines: Vec<String> = content
                    .lines()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                // Newest entries are at the end of the file; drop the
                // oldest when the file holds more than the limit.
                let excess = lines.len().saturating_sub(limit);
                lines.into_iter().skip(excess).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                eprintln!("Warning: Could not read query history: {}", e);
                Vec::new()
            }
        };

        Self {
            cache,
            limit,
            queries,
        }
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Record a successful query: deduplicated against the last entry,
    /// truncated to the limit, saved immediately.
    ///
    /// History keeps the query as the user typed it, even when the revisor
    /// executes a rewritten form in its place.
    pub fn add(&mut self, query: &str) {
        let query = query.trim().to_string();

        if query.is_empty() {
            return;
        }

        if let Some(last) = self.queries.last() {
            if last == &query {
                return;
            }
        }

        self.queries.push(query);

        if self.queries.len() > self.limit {
            self.queries.remove(0);
        }

        self.save();
    }

    fn save(&self) {
        if let Err(e) = self.cache.ensure_cache_dir() {
            eprintln!("Warning: Could not create cache directory: {}", e);
            return;
        }

        let history_file = self.cache.cache_file("query_history.txt");

        match fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&history_file)
        {
            Ok(mut file) => {
                if let Err(e) = fs2::FileExt::try_lock_exclusive(&file) {
                    eprintln!("Warning: Could not lock history file: {}", e);
                }

                for query in &self.queries {
                    if let Err(e) = writeln!(file, "{}", query) {
                        eprintln!("Warning: Could not write query to history: {}", e);
                        break;
                    }
                }

                if let Err(e) = file.flush() {
                    eprintln!("Warning: Could not flush history file: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Warning: Could not create history file: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn history_in_temp(limit: usize) -> (TempDir, QueryHistory) {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        let history = QueryHistory::load(cache, limit);
        (dir, history)
    }

    #[test]
    fn test_history_starts_empty() {
        let (_dir, history) = history_in_temp(10);
        assert!(history.queries().is_empty());
    }

    #[test]
    fn test_add_and_reload() {
        let (dir, mut history) = history_in_temp(10);
        history.add("SELECT * FROM data");
        history.add("SELECT a FROM data");

        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        let reloaded = QueryHistory::load(cache, 10);
        assert_eq!(
            reloaded.queries(),
            &["SELECT * FROM data", "SELECT a FROM data"]
        );
    }

    #[test]
    fn test_consecutive_duplicates_skipped() {
        let (_dir, mut history) = history_in_temp(10);
        history.add("SELECT * FROM data");
        history.add("SELECT * FROM data");
        assert_eq!(history.queries().len(), 1);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let (_dir, mut history) = history_in_temp(2);
        history.add("q1");
        history.add("q2");
        history.add("q3");
        assert_eq!(history.queries(), &["q2", "q3"]);
    }

    #[test]
    fn test_load_over_limit_keeps_newest() {
        let (dir, mut history) = history_in_temp(10);
        for q in ["q1", "q2", "q3", "q4", "q5"] {
            history.add(q);
        }

        // Reloading with a smaller limit keeps the tail of the file
        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        let reloaded = QueryHistory::load(cache, 2);
        assert_eq!(reloaded.queries(), &["q4", "q5"]);
    }

    #[test]
    fn test_blank_queries_ignored() {
        let (_dir, mut history) = history_in_temp(10);
        history.add("   ");
        assert!(history.queries().is_empty());
    }

    #[test]
    fn test_clear_all_removes_history_file() {
        let (dir, mut history) = history_in_temp(10);
        history.add("SELECT 1");

        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        assert!(cache.cache_file("query_history.txt").exists());
        cache.clear_all().unwrap();
        assert!(!cache.cache_file("query_history.txt").exists());
    }
}
