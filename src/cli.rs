use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Compression format for data files
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Gzip compression (.gz) - Most common, good balance of speed and compression
    Gzip,
    /// Zstandard compression (.zst) - Modern, fast compression with good ratios
    Zstd,
    /// Bzip2 compression (.bz2) - Good compression ratio, slower than gzip
    Bzip2,
    /// XZ compression (.xz) - Excellent compression ratio, slower than bzip2
    Xz,
}

/// Command-line arguments for parvu
#[derive(Parser, Debug)]
#[command(version, about = "parvu")]
pub struct Args {
    /// Parquet, CSV or JSON file to open
    pub path: Option<PathBuf>,

    /// SQL query to run against the file. The virtual table name
    /// (default "data") refers to the loaded file.
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    /// Page of the result to display (1-indexed)
    #[arg(long = "page", default_value_t = 1)]
    pub page: usize,

    /// Number of rows per page
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,

    /// Virtual table name to use in SQL queries
    #[arg(long = "table-name")]
    pub table_name: Option<String>,

    /// Sort the result by this column before paging
    #[arg(long = "sort")]
    pub sort: Option<String>,

    /// Sort in descending order (requires --sort)
    #[arg(long = "descending", action)]
    pub descending: bool,

    /// Export the full query result to this file (.csv, .parquet or .json)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Skip this many rows when reading a file
    #[arg(long = "skip-rows")]
    pub skip_rows: Option<usize>,

    /// Specify that the file has no header
    #[arg(long = "no-header", action)]
    pub no_header: bool,

    /// Specify the delimiter to use when reading a file
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Specify the compression format explicitly (gzip, zstd, bzip2, xz)
    /// If not specified, compression is auto-detected from file extension.
    #[arg(long = "compression", value_enum)]
    pub compression: Option<CompressionFormat>,

    /// Skip the query revisor checks (joins, LIMIT clamping)
    #[arg(long = "no-revise", action)]
    pub no_revise: bool,

    /// Clear the recent files list and exit
    #[arg(long = "clear-recents", action)]
    pub clear_recents: bool,

    /// Clear all cache data (query history) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Write the default config file and exit
    #[arg(long = "init-config", action)]
    pub init_config: bool,

    /// Overwrite an existing config file (with --init-config)
    #[arg(long = "force", action)]
    pub force: bool,
}
