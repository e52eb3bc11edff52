//! Shard and inventory file formats (spec §3, §6).
//!
//! A shard groups all triples that share a key (property or subject). Shard
//! files are CSV, UTF-8, `\n`-terminated, with a header written exactly
//! once before the first data row. Inventories are one-column CSV files
//! with no header.
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::triple::ValueKind;

/// which column a shard is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardKind {
    Property,
    Subject,
}

impl ShardKind {
    /// header row written at the top of a shard file for this kind.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            ShardKind::Property => &["subject", "value", "format"],
            ShardKind::Subject => &["property", "value", "format"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRow {
    /// the subject column for a property shard, the property column for a
    /// subject shard
    pub key_col: String,
    pub value: String,
    pub format: String,
}

impl ShardRow {
    pub fn new(key_col: impl Into<String>, value: impl Into<String>, kind: &ValueKind) -> Self {
        ShardRow {
            key_col: key_col.into(),
            value: value.into(),
            format: kind.tag(),
        }
    }
}

/// base directory for a language's shards, e.g. `<out>/en[_suffix]/`.
pub fn shard_dir(out_dir: &Path, lang: &str, suffix: Option<&str>) -> PathBuf {
    let name = match suffix {
        Some(s) => format!("{}_{}", lang, s),
        None => lang.to_string(),
    };
    out_dir.join(name)
}

pub fn shard_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.csv", key))
}

/// an in-memory, per-worker accumulation of shard rows keyed by shard key.
/// Produced independently by each ingest worker and merged without
/// inter-worker locking (spec §4.1 option 2).
#[derive(Debug, Default)]
pub struct PartialShardSet {
    pub rows: HashMap<String, Vec<ShardRow>>,
}

impl PartialShardSet {
    pub fn push(&mut self, key: String, row: ShardRow) {
        self.rows.entry(key).or_default().push(row);
    }
}

/// merges a set of per-worker partial shards into final shard files, one
/// sweep per key. Writes the header exactly once, before the first row.
pub fn merge_partials(
    dir: &Path,
    kind: ShardKind,
    partials: Vec<PartialShardSet>,
) -> Result<(), Error> {
    fs::create_dir_all(dir)?;

    let mut merged: HashMap<String, Vec<ShardRow>> = HashMap::new();
    for partial in partials {
        for (key, mut rows) in partial.rows {
            merged.entry(key).or_default().append(&mut rows);
        }
    }

    for (key, rows) in merged {
        write_shard(dir, &key, kind, &rows)?;
    }

    Ok(())
}

/// writes (or appends to) a single shard file, creating the header if the
/// file does not already exist.
pub fn write_shard(
    dir: &Path,
    key: &str,
    kind: ShardKind,
    rows: &[ShardRow],
) -> Result<(), Error> {
    let path = shard_path(dir, key);
    let is_new = !path.exists();

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if is_new {
        writer.write_record(kind.header())?;
    }

    for row in rows {
        writer.write_record([&row.key_col, &row.value, &row.format])?;
    }
    writer.flush()?;

    Ok(())
}

/// appends a single row to a shard file under an exclusive lock, checking
/// for the header under the same lock hold (spec §4.1 option 1, "locked
/// append"). Provided as an alternative discipline; the ingester defaults
/// to the partial+merge path above.
pub fn append_row_locked(dir: &Path, key: &str, kind: ShardKind, row: &ShardRow) -> Result<(), Error> {
    use fs2::FileExt;

    fs::create_dir_all(dir)?;
    let path = shard_path(dir, key);
    let is_new = !path.exists();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    file.lock_exclusive()?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(&file);
    if is_new {
        writer.write_record(kind.header())?;
    }
    writer.write_record([&row.key_col, &row.value, &row.format])?;
    writer.flush()?;

    fs2::FileExt::unlock(&file)?;
    Ok(())
}

/// reads a shard file's data rows (skipping the header).
pub fn read_shard(path: &Path) -> Result<Vec<ShardRow>, Error> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < 3 {
            continue;
        }
        rows.push(ShardRow {
            key_col: record[0].to_string(),
            value: record[1].to_string(),
            format: record[2].to_string(),
        });
    }
    Ok(rows)
}

/// path for the per-dump value-kind tag inventory (spec §6 output list),
/// e.g. `<out>/en[_suffix]_types.csv`. Same one-row-per-entry, no-header
/// shape as [`Inventory`], just not keyed by [`ShardKind`] since it holds
/// `ValueKind` tags rather than property/subject names.
pub fn type_inventory_path(out_dir: &Path, lang: &str, suffix: Option<&str>) -> PathBuf {
    let suffix_part = suffix.map(|s| format!("_{}", s)).unwrap_or_default();
    out_dir.join(format!("{}{}_types.csv", lang, suffix_part))
}

/// Persisted inventory: a deduplicated set of property or subject names.
/// One name per row, no header. Presence of the file is the cache key for
/// "already ingested" (spec §4.1 "Idempotence").
pub struct Inventory;

impl Inventory {
    pub fn path(out_dir: &Path, lang: &str, suffix: Option<&str>, kind: ShardKind) -> PathBuf {
        let suffix_part = suffix.map(|s| format!("_{}", s)).unwrap_or_default();
        let label = match kind {
            ShardKind::Property => "properties",
            ShardKind::Subject => "subjects",
        };
        out_dir.join(format!("{}{}_{}.csv", lang, suffix_part, label))
    }

    pub fn exists(out_dir: &Path, lang: &str, suffix: Option<&str>, kind: ShardKind) -> bool {
        Self::path(out_dir, lang, suffix, kind).exists()
    }

    pub fn load(path: &Path) -> Result<BTreeSet<String>, Error> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut set = BTreeSet::new();
        for line in reader.lines() {
            let line = line?;
            if !line.is_empty() {
                set.insert(line);
            }
        }
        Ok(set)
    }

    /// writes the inventory, idempotent across reruns on identical input
    /// since it is set semantics and rows are emitted in sorted order.
    pub fn save(path: &Path, names: &BTreeSet<String>) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        for name in names {
            writeln!(file, "{}", name)?;
        }
        Ok(())
    }
}

/// appends a parse failure line to `<shard-dir>/_err.log`.
pub fn log_parse_error(dir: &Path, raw_line: &str, reason: &str) -> Result<(), Error> {
    fs::create_dir_all(dir)?;
    let path = dir.join("_err.log");
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{} || Error: {}", raw_line, reason)?;
    Ok(())
}
