//! Paginated SQL query engine over a single tabular file.
//!
//! The file is never materialized as a whole: it is opened as a lazy Polars
//! scan, user SQL is executed against that scan through polars-sql, and only
//! the requested page of the result is collected. Row counting goes through a
//! `len()` aggregation so memory stays flat regardless of file size.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use polars_sql::SQLContext;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::{CompressionFormat, OpenOptions};

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Cap on values returned by [`QueryEngine::unique_values`]
pub const UNIQUE_VALUES_LIMIT: u32 = 10_000;

/// Row count above which unique-value calculation logs a slowness warning
const LARGE_DATASET_ROWS: usize = 1_000_000;

/// Metadata about the current query result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub total_rows: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub columns: Vec<String>,
    pub path: PathBuf,
}

/// Manages lazy queries against one open file with row-count based pagination.
///
/// `base` is the lazy file scan; `current` is the plan of the last executed
/// query (initially the scan itself). Executing a query replaces `current`
/// and refreshes the row/page counts; fetching a page slices `current`.
pub struct QueryEngine {
    path: PathBuf,
    table_name: String,
    table_pattern: Regex,
    page_size: usize,
    base: LazyFrame,
    current: LazyFrame,
    schema: Arc<Schema>,
    total_rows: usize,
    total_pages: usize,
    // Keeps a decompressed CSV alive for the lifetime of the lazy scan
    _decompress_temp: Option<NamedTempFile>,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("path", &self.path)
            .field("table_name", &self.table_name)
            .field("page_size", &self.page_size)
            .field("total_rows", &self.total_rows)
            .field("total_pages", &self.total_pages)
            .finish_non_exhaustive()
    }
}

impl QueryEngine {
    /// Open a Parquet/CSV/JSON file as a lazy scan and count its rows.
    pub fn open(path: &Path, options: &OpenOptions) -> Result<Self> {
        if !path.is_file() {
            return Err(eyre!("{} is not a readable file", path.display()));
        }

        let table_name = options
            .table_name
            .clone()
            .unwrap_or_else(|| "data".to_string());
        let table_pattern = table_name_pattern(&table_name)?;
        let page_size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(eyre!("page size must be greater than 0"));
        }

        let (base, temp) = build_file_scan(path, options)?;
        let schema = base.clone().collect_schema()?;
        let total_rows = count_rows(&base)?;
        let total_pages = page_count(total_rows, page_size);

        log::info!(
            "engine opened {}: {} rows, {} pages",
            path.display(),
            total_rows,
            total_pages
        );

        Ok(Self {
            path: path.to_path_buf(),
            table_name,
            table_pattern,
            page_size,
            current: base.clone(),
            base,
            schema,
            total_rows,
            total_pages,
            _decompress_temp: temp,
        })
    }

    /// Replace the virtual table name with the canonical registered name.
    ///
    /// Matching is case-insensitive and whole-word, so users can write
    /// `SELECT * FROM DATA` or `from data`, while a column called `database`
    /// is left alone.
    fn substitute_table_name(&self, sql: &str) -> String {
        self.table_pattern
            .replace_all(sql, self.canonical_table())
            .into_owned()
    }

    /// The exact name registered with the SQL context
    fn canonical_table(&self) -> &str {
        &self.table_name
    }

    /// Execute a SQL query against the file and update pagination state.
    ///
    /// The plan is validated by resolving its schema before any state is
    /// touched, so a failed query leaves the engine on its previous result.
    pub fn execute_query(&mut self, sql: &str) -> Result<()> {
        let substituted = self.substitute_table_name(sql);
        log::debug!("executing: {}", substituted);

        let mut ctx = SQLContext::new();
        ctx.register(self.canonical_table(), self.base.clone());
        let lf = ctx.execute(&substituted)?;
        let schema = lf.clone().collect_schema()?;

        let total_rows = count_rows(&lf)?;
        self.current = lf;
        self.schema = schema;
        self.total_rows = total_rows;
        self.total_pages = page_count(total_rows, self.page_size);

        log::info!(
            "query executed: {} rows, {} pages",
            self.total_rows,
            self.total_pages
        );
        Ok(())
    }

    /// Fetch one page of the current result (1-indexed).
    ///
    /// Pages past the end come back empty with the result schema intact. The
    /// LIMIT/OFFSET window is applied by slicing the lazy plan, so a query
    /// that carries its own LIMIT is paged within that limited result rather
    /// than broken by an appended clause.
    pub fn page(&self, page_num: usize) -> Result<DataFrame> {
        if page_num < 1 {
            return Err(eyre!("page numbers start at 1"));
        }

        let offset = (page_num - 1) * self.page_size;
        let df = self
            .current
            .clone()
            .slice(offset as i64, self.page_size as u32)
            .collect()?;
        Ok(df)
    }

    /// Search for a string within one column, case-insensitively by default.
    ///
    /// Runs `SELECT * FROM <table> WHERE CAST(col AS VARCHAR) LIKE '%term%'`
    /// through the normal query path, so the match becomes the current result
    /// and is paged like any other query.
    pub fn search(&mut self, term: &str, column: &str, case_sensitive: bool) -> Result<()> {
        let like = if case_sensitive { "LIKE" } else { "ILIKE" };
        let escaped = term.replace('\'', "''");
        let sql = format!(
            "SELECT * FROM {} WHERE CAST(\"{}\" AS VARCHAR) {} '%{}%'",
            self.table_name, column, like, escaped
        );
        self.execute_query(&sql)
    }

    /// Sort the current result by a column. Counts are unchanged.
    pub fn sort_by_column(&mut self, column: &str, ascending: bool) -> Result<()> {
        if self.schema.get(column).is_none() {
            return Err(eyre!("no such column: {}", column));
        }

        let options = SortMultipleOptions {
            descending: vec![!ascending],
            ..Default::default()
        };
        self.current = self.current.clone().sort_by_exprs(vec![col(column)], options);
        Ok(())
    }

    /// Distinct values of a column of the current result, capped at
    /// [`UNIQUE_VALUES_LIMIT`]. Returns a single-column DataFrame.
    pub fn unique_values(&self, column: &str) -> Result<DataFrame> {
        if self.schema.get(column).is_none() {
            return Err(eyre!("no such column: {}", column));
        }
        if self.total_rows > LARGE_DATASET_ROWS {
            log::warn!(
                "large dataset ({} rows): unique value calculation may be slow",
                self.total_rows
            );
        }

        let df = self
            .current
            .clone()
            .select([col(column).unique()])
            .limit(UNIQUE_VALUES_LIMIT)
            .collect()?;
        Ok(df)
    }

    /// Export the full current result to a file, format chosen by extension.
    pub fn export(&self, output: &Path) -> Result<()> {
        let ext = output
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let mut df = self.current.clone().collect()?;
        match ext.as_str() {
            "csv" => {
                let mut file = File::create(output)?;
                CsvWriter::new(&mut file).finish(&mut df)?;
            }
            "parquet" => {
                let file = File::create(output)?;
                ParquetWriter::new(file).finish(&mut df)?;
            }
            "json" => {
                let mut file = File::create(output)?;
                JsonWriter::new(&mut file)
                    .with_json_format(JsonFormat::Json)
                    .finish(&mut df)?;
            }
            other => return Err(eyre!("unsupported export format: .{}", other)),
        }

        log::info!("exported {} rows to {}", df.height(), output.display());
        Ok(())
    }

    /// Drop the active query, restoring the plain file scan and its counts.
    pub fn reset(&mut self) -> Result<()> {
        self.current = self.base.clone();
        self.schema = self.base.clone().collect_schema()?;
        self.total_rows = count_rows(&self.base)?;
        self.total_pages = page_count(self.total_rows, self.page_size);
        log::info!("query reset to original file");
        Ok(())
    }

    pub fn table_info(&self) -> TableInfo {
        TableInfo {
            total_rows: self.total_rows,
            total_pages: self.total_pages,
            page_size: self.page_size,
            columns: self.columns(),
            path: self.path.clone(),
        }
    }

    pub fn columns(&self) -> Vec<String> {
        self.schema.iter_names().map(|n| n.to_string()).collect()
    }

    pub fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// Whole-word, case-insensitive matcher for the virtual table name
fn table_name_pattern(table_name: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(table_name)))
        .map_err(|e| eyre!("invalid virtual table name {:?}: {}", table_name, e))
}

/// ceil(rows / page_size), but never less than one page
fn page_count(total_rows: usize, page_size: usize) -> usize {
    ((total_rows + page_size - 1) / page_size).max(1)
}

/// Count rows of a lazy plan without collecting it
fn count_rows(lf: &LazyFrame) -> Result<usize> {
    let df = lf.clone().select([len()]).collect()?;
    let n = match df.get(0).as_ref().and_then(|row| row.first()) {
        Some(AnyValue::UInt32(n)) => *n as usize,
        Some(AnyValue::UInt64(n)) => *n as usize,
        _ => 0,
    };
    Ok(n)
}

/// Build the lazy scan for a file based on its extension.
///
/// Compressed CSVs are decompressed to a temp file first; the temp handle is
/// returned so the caller can keep it alive for the lifetime of the scan.
fn build_file_scan(
    path: &Path,
    options: &OpenOptions,
) -> Result<(LazyFrame, Option<NamedTempFile>)> {
    let compression = options
        .compression
        .or_else(|| CompressionFormat::from_extension(path));

    // file.csv.gz and friends: the data extension sits under the compression one
    let data_ext = if compression.is_some() {
        path.file_stem()
            .map(Path::new)
            .and_then(|stem| stem.extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    } else {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    };

    if compression.is_some()
        && !matches!(data_ext.as_deref(), Some("csv") | Some("tsv") | Some("psv"))
    {
        return Err(eyre!(
            "only CSV input may be compressed: {}",
            path.display()
        ));
    }

    match data_ext.as_deref() {
        Some("parquet") => {
            let pl_path = PlPath::Local(Arc::from(path));
            let lf = LazyFrame::scan_parquet(pl_path, Default::default())?;
            Ok((lf, None))
        }
        Some("csv") | Some("tsv") | Some("psv") => {
            let default_sep = match data_ext.as_deref() {
                Some("tsv") => b'\t',
                Some("psv") => b'|',
                _ => b',',
            };
            let separator = options.delimiter.unwrap_or(default_sep);

            if let Some(compression) = compression {
                let temp = decompress_to_temp(path, compression)?;
                let lf = scan_csv(temp.path(), separator, options)?;
                Ok((lf, Some(temp)))
            } else {
                let lf = scan_csv(path, separator, options)?;
                Ok((lf, None))
            }
        }
        Some("json") => {
            let file = File::open(path)?;
            let df = JsonReader::new(file)
                .with_json_format(JsonFormat::Json)
                .finish()?;
            Ok((df.lazy(), None))
        }
        Some("ndjson") | Some("jsonl") => {
            let pl_path = PlPath::Local(Arc::from(path));
            let lf = LazyJsonLineReader::new(pl_path).finish()?;
            Ok((lf, None))
        }
        Some(other) => Err(eyre!("unsupported file format: .{}", other)),
        None => Err(eyre!(
            "cannot determine file format of {} (no extension)",
            path.display()
        )),
    }
}

fn scan_csv(path: &Path, separator: u8, options: &OpenOptions) -> Result<LazyFrame> {
    let pl_path = PlPath::Local(Arc::from(path));
    let mut reader = LazyCsvReader::new(pl_path).with_separator(separator);
    if let Some(skip_rows) = options.skip_rows {
        reader = reader.with_skip_rows(skip_rows);
    }
    if let Some(has_header) = options.has_header {
        reader = reader.with_has_header(has_header);
    }
    Ok(reader.finish()?)
}

/// Decompress a compressed file to a temp file for lazy CSV scan.
fn decompress_to_temp(path: &Path, compression: CompressionFormat) -> Result<NamedTempFile> {
    let mut temp = NamedTempFile::new()?;
    let out = temp.as_file_mut();
    let mut reader: Box<dyn Read> = match compression {
        CompressionFormat::Gzip => {
            let f = File::open(path)?;
            Box::new(flate2::read::GzDecoder::new(BufReader::new(f)))
        }
        CompressionFormat::Zstd => {
            let f = File::open(path)?;
            Box::new(zstd::Decoder::new(BufReader::new(f))?)
        }
        CompressionFormat::Bzip2 => {
            let f = File::open(path)?;
            Box::new(bzip2::read::BzDecoder::new(BufReader::new(f)))
        }
        CompressionFormat::Xz => {
            let f = File::open(path)?;
            Box::new(xz2::read::XzDecoder::new(BufReader::new(f)))
        }
    };
    std::io::copy(&mut reader, out)?;
    out.sync_all()?;
    Ok(temp)
}
