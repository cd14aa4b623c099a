use std::path::Path;

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod recents;
pub mod revisor;
pub mod worker;

pub use cache::{CacheManager, QueryHistory};
pub use cli::Args;
pub use config::{AppConfig, ConfigManager};
pub use engine::{QueryEngine, TableInfo};
pub use recents::Recents;
pub use revisor::{Revisor, Verdict};
pub use worker::{QueryWorker, WorkerEvent};

/// Application name used for config/cache directories and other app-specific paths
pub const APP_NAME: &str = "parvu";

/// Re-export compression format from CLI module
pub use cli::CompressionFormat;

impl CompressionFormat {
    /// Detect compression format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        // Check final extension (e.g., .csv.gz -> gz)
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            match ext.to_lowercase().as_str() {
                "gz" => Some(Self::Gzip),
                "zst" | "zstd" => Some(Self::Zstd),
                "bz2" | "bz" => Some(Self::Bzip2),
                "xz" => Some(Self::Xz),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Get file extension for this compression format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zstd => "zst",
            Self::Bzip2 => "bz2",
            Self::Xz => "xz",
        }
    }
}

/// File loading options resolved from CLI args and config
#[derive(Default, Clone)]
pub struct OpenOptions {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_rows: Option<usize>,
    pub compression: Option<CompressionFormat>,
    pub page_size: Option<usize>,
    pub table_name: Option<String>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    pub fn with_compression(mut self, compression: CompressionFormat) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Create OpenOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &cli::Args, config: &AppConfig) -> Self {
        let mut opts = OpenOptions::new();

        // File loading options: CLI args override config
        opts.delimiter = args.delimiter.or(config.file_loading.delimiter);
        opts.skip_rows = args.skip_rows.or(config.file_loading.skip_rows);

        // Handle has_header: CLI no_header flag overrides config
        opts.has_header = if args.no_header {
            Some(false)
        } else {
            config.file_loading.has_header
        };

        // Handle compression: CLI arg overrides config
        opts.compression = args.compression.or_else(|| {
            config
                .file_loading
                .compression
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "gzip" => Some(CompressionFormat::Gzip),
                    "zstd" => Some(CompressionFormat::Zstd),
                    "bzip2" => Some(CompressionFormat::Bzip2),
                    "xz" => Some(CompressionFormat::Xz),
                    _ => None,
                })
        });

        opts.page_size = args.page_size.or(Some(config.query.page_size));
        opts.table_name = args
            .table_name
            .clone()
            .or_else(|| Some(config.query.virtual_table_name.clone()));

        opts
    }
}

impl From<&cli::Args> for OpenOptions {
    fn from(args: &cli::Args) -> Self {
        // Use default config if creating from args alone
        let config = AppConfig::default();
        Self::from_args_and_config(args, &config)
    }
}
