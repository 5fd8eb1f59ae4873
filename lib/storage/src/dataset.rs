//! Dataset loader for gzip-compressed JSON Lines product dumps.
//!
//! Every line is parsed on its own. Lines that are not valid UTF-8, not
//! valid JSON or not a JSON object are skipped and counted; only a failure
//! of the underlying stream (I/O, corrupt gzip) aborts the load.

use flate2::read::GzDecoder;
use fusionrec_core::{Error, Matrix, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Default number of records kept by a load
pub const DEFAULT_SAMPLE_CAP: usize = 50;

/// Nutrient columns of the tabular block, in column order
pub const NUTRIENT_FIELDS: [&str; 4] = [
    "energy_100g",
    "fat_100g",
    "proteins_100g",
    "carbohydrates_100g",
];

const REQUIRED_TEXT_FIELDS: [&str; 3] = ["product_name", "ingredients_text", "categories"];

/// Display metadata for one loaded item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMeta {
    pub product_name: String,
    pub ingredients: String,
    /// First comma-separated segment of the record's categories
    pub category: String,
}

/// Counters collected while scanning a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Lines read before the sample cap was reached
    pub lines_scanned: usize,
    /// Lines that were not a UTF-8 JSON object
    pub malformed: usize,
    /// Well-formed records missing a required field
    pub filtered: usize,
    pub kept: usize,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    /// One row per item, columns as in [`NUTRIENT_FIELDS`]
    pub tabular: Matrix,
    /// `"<product_name>. <ingredients_text>"` per item
    pub texts: Vec<String>,
    /// Dense category codes, by first appearance
    pub labels: Vec<u32>,
    /// Category name per code
    pub categories: Vec<String>,
    pub items: Vec<ItemMeta>,
    pub stats: LoadStats,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Load from a gzip-compressed byte stream, keeping at most `sample_cap`
/// records.
pub fn load_dataset<R: Read>(reader: R, sample_cap: usize) -> Result<Dataset> {
    load_jsonl(BufReader::new(GzDecoder::new(reader)), sample_cap)
}

/// Load a `.jsonl.gz` file.
pub fn load_dataset_path<P: AsRef<Path>>(path: P, sample_cap: usize) -> Result<Dataset> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), sample_cap, "loading dataset");
    load_dataset(File::open(path)?, sample_cap)
}

/// Load from an uncompressed JSON Lines stream.
pub fn load_jsonl<R: BufRead>(mut reader: R, sample_cap: usize) -> Result<Dataset> {
    let mut stats = LoadStats::default();
    let mut builder = DatasetBuilder::default();
    let mut line = Vec::new();

    while builder.len() < sample_cap {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        stats.lines_scanned += 1;

        let Some(record) = parse_line(&line) else {
            stats.malformed += 1;
            tracing::debug!(line = stats.lines_scanned, "skipping malformed line");
            continue;
        };
        if !builder.push(&record) {
            stats.filtered += 1;
        }
    }

    stats.kept = builder.len();
    if builder.len() == 0 {
        return Err(Error::DatasetEmpty {
            scanned: stats.lines_scanned,
        });
    }
    if stats.malformed > 0 {
        tracing::warn!(malformed = stats.malformed, "skipped malformed dataset lines");
    }
    tracing::info!(
        kept = stats.kept,
        scanned = stats.lines_scanned,
        filtered = stats.filtered,
        categories = builder.categories.len(),
        "dataset loaded"
    );

    builder.finish(stats)
}

fn parse_line(line: &[u8]) -> Option<Map<String, Value>> {
    let text = std::str::from_utf8(line).ok()?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(text).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[derive(Default)]
struct DatasetBuilder {
    rows: Vec<f32>,
    texts: Vec<String>,
    labels: Vec<u32>,
    items: Vec<ItemMeta>,
    categories: Vec<String>,
    codes: HashMap<String, u32>,
}

impl DatasetBuilder {
    fn len(&self) -> usize {
        self.items.len()
    }

    /// Add a record if it carries every required field.
    fn push(&mut self, record: &Map<String, Value>) -> bool {
        let Some(nutriments) = record.get("nutriments").and_then(Value::as_object) else {
            return false;
        };
        if nutriments.is_empty() {
            return false;
        }
        let mut fields = REQUIRED_TEXT_FIELDS
            .iter()
            .map(|&name| record.get(name).and_then(Value::as_str).filter(|s| !s.is_empty()));
        let (Some(Some(name)), Some(Some(ingredients)), Some(Some(categories))) =
            (fields.next(), fields.next(), fields.next())
        else {
            return false;
        };

        let category = categories.split(',').next().unwrap_or_default().trim().to_string();
        let next_code = self.categories.len() as u32;
        let label = *self.codes.entry(category.clone()).or_insert_with(|| {
            self.categories.push(category.clone());
            next_code
        });

        self.rows
            .extend(NUTRIENT_FIELDS.iter().map(|&f| nutrient_value(nutriments.get(f))));
        self.texts.push(format!("{name}. {ingredients}"));
        self.labels.push(label);
        self.items.push(ItemMeta {
            product_name: name.to_string(),
            ingredients: ingredients.to_string(),
            category,
        });
        true
    }

    fn finish(self, stats: LoadStats) -> Result<Dataset> {
        let tabular = Matrix::from_vec(self.items.len(), NUTRIENT_FIELDS.len(), self.rows)?;
        Ok(Dataset {
            tabular,
            texts: self.texts,
            labels: self.labels,
            categories: self.categories,
            items: self.items,
            stats,
        })
    }
}

/// Numeric nutrient value; missing, non-numeric or non-finite values read as 0.
fn nutrient_value(value: Option<&Value>) -> f32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn record(name: &str, category: &str, energy: Value) -> String {
        serde_json::json!({
            "product_name": name,
            "ingredients_text": "water, sugar",
            "categories": category,
            "nutriments": { "energy_100g": energy, "fat_100g": 1.5 }
        })
        .to_string()
    }

    fn gzip(lines: &[String]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for line in lines {
            writeln!(encoder, "{line}").unwrap();
        }
        encoder.finish().unwrap()
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mut lines: Vec<String> = (0..7)
            .map(|i| record(&format!("item {i}"), "Beverages,Drinks", Value::from(i)))
            .collect();
        lines.insert(2, "{not json".to_string());
        lines.insert(5, "[1, 2, 3]".to_string());
        lines.push("\"just a string\"".to_string());

        let dataset = load_dataset(gzip(&lines).as_slice(), 100).unwrap();
        assert_eq!(dataset.len(), 7);
        assert_eq!(dataset.stats.malformed, 3);
        assert_eq!(dataset.stats.lines_scanned, 10);
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut raw = record("ok", "Snacks", Value::from(10)).into_bytes();
        raw.extend_from_slice(b"\n\xff\xfe{}\n");
        let dataset = load_jsonl(raw.as_slice(), 10).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.stats.malformed, 1);
    }

    #[test]
    fn test_field_filter() {
        let lines = vec![
            record("", "Snacks", Value::from(1)),
            serde_json::json!({
                "product_name": "no nutrients",
                "ingredients_text": "x",
                "categories": "Snacks",
                "nutriments": {}
            })
            .to_string(),
            record("kept", "Snacks", Value::from(1)),
        ];
        let dataset = load_dataset(gzip(&lines).as_slice(), 10).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.stats.filtered, 2);
        assert_eq!(dataset.texts[0], "kept. water, sugar");
    }

    #[test]
    fn test_nutrient_parsing() {
        let lines = vec![
            record("a", "Snacks", Value::from("12.5")),
            record("b", "Snacks", Value::from("n/a")),
            record("c", "Snacks", Value::Null),
        ];
        let dataset = load_dataset(gzip(&lines).as_slice(), 10).unwrap();
        assert_eq!(dataset.tabular.row(0), &[12.5, 1.5, 0.0, 0.0]);
        assert_eq!(dataset.tabular.get(1, 0), 0.0);
        assert_eq!(dataset.tabular.get(2, 0), 0.0);
    }

    #[test]
    fn test_labels_by_first_appearance() {
        let lines = vec![
            record("a", "Snacks, Sweet", Value::from(1)),
            record("b", "Beverages", Value::from(1)),
            record("c", "Snacks", Value::from(1)),
        ];
        let dataset = load_dataset(gzip(&lines).as_slice(), 10).unwrap();
        assert_eq!(dataset.labels, vec![0, 1, 0]);
        assert_eq!(dataset.categories, vec!["Snacks", "Beverages"]);
        assert_eq!(dataset.items[0].category, "Snacks");
    }

    #[test]
    fn test_sample_cap_stops_reading() {
        let lines: Vec<String> = (0..20)
            .map(|i| record(&format!("item {i}"), "Snacks", Value::from(i)))
            .collect();
        let dataset = load_dataset(gzip(&lines).as_slice(), 5).unwrap();
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.stats.lines_scanned, 5);
    }

    #[test]
    fn test_empty_dataset() {
        let lines = vec!["{}".to_string(), "oops".to_string()];
        assert!(matches!(
            load_dataset(gzip(&lines).as_slice(), 10),
            Err(Error::DatasetEmpty { scanned: 2 })
        ));
    }

    #[test]
    fn test_corrupt_gzip_is_io_error() {
        let bytes = b"definitely not gzip".to_vec();
        assert!(matches!(load_dataset(bytes.as_slice(), 10), Err(Error::Io(_))));
    }
}
