//! Chunked ingester (spec §4.1).
//!
//! Partitions a dump into `K` line-aligned byte ranges, parses each range
//! in its own rayon worker into a private [`PartialShardSet`], and merges
//! all workers' partials into final shard files with no inter-worker
//! locking (spec §4.1 option 2, the recommended discipline). Produces a
//! deduplicated inventory of the shard key (property or subject) and an
//! `_err.log` of recoverable parse failures.
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use log::{debug, info};
use rayon::prelude::*;

use crate::chunk::{plan_chunks, ChunkRange};
use crate::error::Error;
use crate::parse::parse_line;
use crate::progress::WorkerProgress;
use crate::shard::{self, Inventory, PartialShardSet, ShardKind, ShardRow};

pub struct IngestReport {
    pub inventory: BTreeSet<String>,
    pub parse_errors: usize,
}

/// ingests `dump_path` for `lang`, writing shards under
/// `shard::shard_dir(out_dir, lang, suffix)` and the inventory at
/// `Inventory::path(..)`. If the inventory already exists and
/// `force_new` is false, returns the cached inventory without reparsing
/// (spec §4.1 "Idempotence").
#[allow(clippy::too_many_arguments)]
pub fn ingest(
    dump_path: &Path,
    lang: &str,
    out_dir: &Path,
    suffix: Option<&str>,
    kind: ShardKind,
    subject_filter: Option<&HashSet<String>>,
    workers: usize,
    force_new: bool,
) -> Result<IngestReport, Error> {
    let inventory_path = Inventory::path(out_dir, lang, suffix, kind);

    if !force_new && Inventory::exists(out_dir, lang, suffix, kind) {
        info!("[{}] inventory already present, skipping ingestion", lang);
        let inventory = Inventory::load(&inventory_path)?;
        return Ok(IngestReport {
            inventory,
            parse_errors: 0,
        });
    }

    let dir = shard::shard_dir(out_dir, lang, suffix);
    std::fs::create_dir_all(&dir)?;

    let ranges = plan_chunks(dump_path, workers)?;
    info!("[{}] ingesting {} chunks", lang, ranges.len());

    let progress = WorkerProgress::new();
    let bars: Vec<_> = ranges
        .iter()
        .enumerate()
        .map(|(id, range)| progress.add_worker(id, range.end - range.start))
        .collect();

    let worker_results: Vec<WorkerResult> = ranges
        .into_par_iter()
        .zip(bars.into_par_iter())
        .map(|(range, bar)| ingest_range(dump_path, &range, kind, subject_filter, &bar))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut inventory = BTreeSet::new();
    let mut partials = Vec::with_capacity(worker_results.len());
    let mut error_lines = Vec::new();

    for mut result in worker_results {
        inventory.append(&mut result.keys_seen);
        error_lines.extend(result.errors);
        partials.push(result.partial);
    }

    shard::merge_partials(&dir, kind, partials)?;

    for (raw_line, reason) in &error_lines {
        shard::log_parse_error(&dir, raw_line, reason)?;
    }

    Inventory::save(&inventory_path, &inventory)?;

    info!(
        "[{}] ingestion done: {} keys, {} parse errors",
        lang,
        inventory.len(),
        error_lines.len()
    );

    Ok(IngestReport {
        inventory,
        parse_errors: error_lines.len(),
    })
}

/// extracts the set of distinct `ValueKind` tags (`instance`, `string`,
/// a literal's XSD type name, `other`) seen in `dump_path`, writing it to
/// `shard::type_inventory_path(out_dir, lang, suffix)` (spec §6 output
/// list). Grounded on `type_extractor.py`'s `_extract_types`: when a
/// subject filter is present the file is still swept line by line end to
/// end, only the matching subjects' value kinds are recorded.
pub fn extract_types(
    dump_path: &Path,
    lang: &str,
    out_dir: &Path,
    suffix: Option<&str>,
    subject_filter: Option<&HashSet<String>>,
    workers: usize,
    force_new: bool,
) -> Result<BTreeSet<String>, Error> {
    let path = shard::type_inventory_path(out_dir, lang, suffix);

    if !force_new && path.exists() {
        info!("[{}] type inventory already present, skipping extraction", lang);
        return Inventory::load(&path);
    }

    let ranges = plan_chunks(dump_path, workers)?;
    let partials: Vec<BTreeSet<String>> = ranges
        .into_par_iter()
        .map(|range| extract_types_range(dump_path, &range, subject_filter))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut types = BTreeSet::new();
    for partial in partials {
        types.extend(partial);
    }

    Inventory::save(&path, &types)?;
    info!("[{}] {} distinct value-kind tags found", lang, types.len());
    Ok(types)
}

fn extract_types_range(
    dump_path: &Path,
    range: &ChunkRange,
    subject_filter: Option<&HashSet<String>>,
) -> Result<BTreeSet<String>, Error> {
    let file = File::open(dump_path)?;
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(range.start))?;

    let mut types = BTreeSet::new();
    let mut pos = range.start;
    let mut line = String::new();
    while pos < range.end {
        line.clear();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            break;
        }
        pos += n as u64;

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            continue;
        }

        if let Ok(triple) = parse_line(trimmed) {
            let include = subject_filter.map(|f| f.contains(&triple.subject)).unwrap_or(true);
            if include {
                types.insert(triple.value.kind.tag());
            }
        }
    }

    Ok(types)
}

struct WorkerResult {
    partial: PartialShardSet,
    keys_seen: BTreeSet<String>,
    errors: Vec<(String, String)>,
}

fn ingest_range(
    dump_path: &Path,
    range: &ChunkRange,
    kind: ShardKind,
    subject_filter: Option<&HashSet<String>>,
    bar: &indicatif::ProgressBar,
) -> Result<WorkerResult, Error> {
    let file = File::open(dump_path)?;
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(range.start))?;

    let mut partial = PartialShardSet::default();
    let mut keys_seen = BTreeSet::new();
    let mut errors = Vec::new();

    let mut pos = range.start;
    let mut line = String::new();
    while pos < range.end {
        line.clear();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            break;
        }
        pos += n as u64;
        bar.set_position(pos - range.start);

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            continue;
        }

        match parse_line(trimmed) {
            Ok(triple) => {
                let (key, row_key_col, include) = match kind {
                    ShardKind::Property => {
                        let include = subject_filter
                            .map(|f| f.contains(&triple.subject))
                            .unwrap_or(true);
                        (triple.property.clone(), triple.subject.clone(), include)
                    }
                    ShardKind::Subject => {
                        let include = subject_filter
                            .map(|f| f.contains(&triple.subject))
                            .unwrap_or(true);
                        (triple.subject.clone(), triple.property.clone(), include)
                    }
                };

                if kind == ShardKind::Property {
                    // the property inventory reflects every property seen,
                    // regardless of the subject filter (spec §4.1 "Filtering")
                    keys_seen.insert(key.clone());
                    if include {
                        partial.push(key, ShardRow::new(row_key_col, triple.value.literal, &triple.value.kind));
                    }
                } else if include {
                    keys_seen.insert(key.clone());
                    partial.push(key, ShardRow::new(row_key_col, triple.value.literal, &triple.value.kind));
                }
            }
            Err(e) => {
                debug!("parse error: {}", e.reason);
                errors.push((e.line, e.reason));
            }
        }
    }

    bar.finish_and_clear();
    Ok(WorkerResult {
        partial,
        keys_seen,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_dump(dir: &Path, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.join("dump.ttl");
        let mut f = File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        path
    }

    const L1: &str = r#"<http://en.dbpedia.org/resource/Book1> <http://en.dbpedia.org/property/year> "1999"^^<http://www.w3.org/2001/XMLSchema#integer> ."#;
    const L2: &str = r#"<http://en.dbpedia.org/resource/Book2> <http://en.dbpedia.org/property/year> "2003"^^<http://www.w3.org/2001/XMLSchema#integer> ."#;
    const L3: &str = r#"<http://en.dbpedia.org/resource/Book1> <http://en.dbpedia.org/property/author> "Jane Doe"@en ."#;

    #[test]
    fn ingest_produces_property_inventory_and_shards() {
        let dir = tempdir().unwrap();
        let dump = write_dump(dir.path(), &[L1, L2, L3]);
        let out = dir.path().join("out");

        let report = ingest(&dump, "en", &out, None, ShardKind::Property, None, 2, false).unwrap();
        assert_eq!(
            report.inventory,
            ["year", "author"].iter().map(|s| s.to_string()).collect()
        );

        let shard_dir = shard::shard_dir(&out, "en", None);
        let year_rows = shard::read_shard(&shard::shard_path(&shard_dir, "year")).unwrap();
        assert_eq!(year_rows.len(), 2);
    }

    #[test]
    fn rerun_without_force_new_is_idempotent() {
        let dir = tempdir().unwrap();
        let dump = write_dump(dir.path(), &[L1, L2]);
        let out = dir.path().join("out");

        let first = ingest(&dump, "en", &out, None, ShardKind::Property, None, 2, false).unwrap();
        let second = ingest(&dump, "en", &out, None, ShardKind::Property, None, 2, false).unwrap();
        assert_eq!(first.inventory, second.inventory);
    }

    #[test]
    fn subject_filter_drops_rows_but_keeps_property_in_inventory() {
        let dir = tempdir().unwrap();
        let dump = write_dump(dir.path(), &[L1, L2]);
        let out = dir.path().join("out");

        let filter: HashSet<String> = ["Book1".to_string()].into_iter().collect();
        let report = ingest(
            &dump,
            "en",
            &out,
            None,
            ShardKind::Property,
            Some(&filter),
            2,
            false,
        )
        .unwrap();

        // both books share property `year`, so the inventory has it either way
        assert!(report.inventory.contains("year"));

        let shard_dir = shard::shard_dir(&out, "en", None);
        let year_rows = shard::read_shard(&shard::shard_path(&shard_dir, "year")).unwrap();
        assert_eq!(year_rows.len(), 1);
        assert_eq!(year_rows[0].key_col, "Book1");
    }

    #[test]
    fn malformed_line_is_logged_not_fatal() {
        let dir = tempdir().unwrap();
        let dump = write_dump(dir.path(), &[L1, "this is not a triple"]);
        let out = dir.path().join("out");

        let report = ingest(&dump, "en", &out, None, ShardKind::Property, None, 1, false).unwrap();
        assert_eq!(report.parse_errors, 1);

        let shard_dir = shard::shard_dir(&out, "en", None);
        let err_log = std::fs::read_to_string(shard_dir.join("_err.log")).unwrap();
        assert!(err_log.contains("this is not a triple"));
    }

    #[test]
    fn subject_shard_mode_keys_by_subject() {
        let dir = tempdir().unwrap();
        let dump = write_dump(dir.path(), &[L1, L3]);
        let out = dir.path().join("out");

        let report = ingest(&dump, "en", &out, None, ShardKind::Subject, None, 1, false).unwrap();
        assert_eq!(report.inventory, ["Book1".to_string()].into_iter().collect());

        let shard_dir = shard::shard_dir(&out, "en", None);
        let rows = shard::read_shard(&shard::shard_path(&shard_dir, "Book1")).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn extract_types_collects_distinct_value_kinds() {
        let dir = tempdir().unwrap();
        let dump = write_dump(dir.path(), &[L1, L2, L3]);
        let out = dir.path().join("out");

        let types = extract_types(&dump, "en", &out, None, None, 2, false).unwrap();
        assert_eq!(types, ["integer".to_string(), "string".to_string()].into_iter().collect());

        let path = shard::type_inventory_path(&out, "en", None);
        assert!(path.exists());
    }

    #[test]
    fn extract_types_respects_subject_filter() {
        let dir = tempdir().unwrap();
        let dump = write_dump(dir.path(), &[L1, L3]);
        let out = dir.path().join("out");

        let filter: HashSet<String> = ["Book1".to_string()].into_iter().collect();
        let types = extract_types(&dump, "en", &out, None, Some(&filter), 1, false).unwrap();
        // L1 (Book1, integer) and L3 (Book1, string) both pass the filter
        assert_eq!(types, ["integer".to_string(), "string".to_string()].into_iter().collect());
    }

    #[test]
    fn extract_types_rerun_without_force_new_is_cached() {
        let dir = tempdir().unwrap();
        let dump = write_dump(dir.path(), &[L1]);
        let out = dir.path().join("out");

        let first = extract_types(&dump, "en", &out, None, None, 1, false).unwrap();
        std::fs::remove_file(&dump).unwrap();
        let second = extract_types(&dump, "en", &out, None, None, 1, false).unwrap();
        assert_eq!(first, second);
    }
}
