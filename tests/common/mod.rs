use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// 100-row frame used across the engine tests: id 0..100, name_N strings,
/// category = id % 3, value = id * 1.5
pub fn sample_df() -> DataFrame {
    df!(
        "id" => (0..100).collect::<Vec<i32>>(),
        "name" => (0..100).map(|i| format!("name_{}", i)).collect::<Vec<String>>(),
        "category" => (0..100).map(|i| i % 3).collect::<Vec<i32>>(),
        "value" => (0..100).map(|i| i as f64 * 1.5).collect::<Vec<f64>>()
    )
    .unwrap()
}

pub fn write_sample_csv(dir: &Path) -> PathBuf {
    let path = dir.join("sample.csv");
    let mut df = sample_df();
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
    path
}

pub fn write_sample_parquet(dir: &Path) -> PathBuf {
    let path = dir.join("sample.parquet");
    let mut df = sample_df();
    let file = File::create(&path).unwrap();
    ParquetWriter::new(file).finish(&mut df).unwrap();
    path
}

pub fn write_sample_json(dir: &Path) -> PathBuf {
    let path = dir.join("sample.json");
    let mut df = sample_df();
    let mut file = File::create(&path).unwrap();
    JsonWriter::new(&mut file)
        .with_json_format(JsonFormat::Json)
        .finish(&mut df)
        .unwrap();
    path
}

pub fn write_sample_ndjson(dir: &Path) -> PathBuf {
    let path = dir.join("sample.ndjson");
    let mut df = sample_df();
    let mut file = File::create(&path).unwrap();
    JsonWriter::new(&mut file)
        .with_json_format(JsonFormat::JsonLines)
        .finish(&mut df)
        .unwrap();
    path
}

pub fn write_sample_csv_gz(dir: &Path) -> PathBuf {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let csv_path = write_sample_csv(dir);
    let bytes = std::fs::read(&csv_path).unwrap();

    let path = dir.join("sample.csv.gz");
    let file = File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(&bytes).unwrap();
    encoder.finish().unwrap();
    path
}

pub fn write_sample_csv_zst(dir: &Path) -> PathBuf {
    use std::io::Write;

    let csv_path = write_sample_csv(dir);
    let bytes = std::fs::read(&csv_path).unwrap();

    let path = dir.join("sample.csv.zst");
    let file = File::create(&path).unwrap();
    let mut encoder = zstd::Encoder::new(file, 0).unwrap();
    encoder.write_all(&bytes).unwrap();
    encoder.finish().unwrap();
    path
}
