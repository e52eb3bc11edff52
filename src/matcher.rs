//! Property matcher (spec §4.3).
//!
//! Given two per-language property inventories and their shard files,
//! proposes `(source, target)` property pairs by exact name match and, for
//! the residual, by statistical agreement of their `(subject, value)`
//! populations after translating the target side into source-language
//! names. The target inventory is processed in bounded-memory groups
//! (spec "Work partitioning"); within a group the source-side sweep is
//! parallelized with rayon, mirroring the teacher's `processing/*.rs`
//! `rayon::prelude::*` sweeps over per-language shards.
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use log::info;
use rayon::prelude::*;

use crate::error::Error;
use crate::lang::LangCode;
use crate::shard::{read_shard, shard_path};
use crate::translate::Translator;

/// agreement threshold from spec §4.3 stage 3.4. The spec notes `0.8`
/// appears in an earlier source variant; this fixes the later, count-based
/// `0.6` (spec §9 "Open questions").
pub const MATCH_THRESHOLD: f64 = 0.6;

/// properties whose values carry no discriminative signal for alignment
/// (spec §4.3 stage 1).
const SPECIAL_PROPERTIES: &[&str] = &["url", "x", "y", "image"];

/// bounds memory: at most this many target properties are loaded and
/// translated into memory at once (spec §4.3 "Work partitioning").
const DEFAULT_GROUP_SIZE: usize = 256;

pub struct MatchConfig {
    pub src_lang: LangCode,
    pub trg_lang: LangCode,
    pub src_dir: std::path::PathBuf,
    pub trg_dir: std::path::PathBuf,
    pub group_size: usize,
}

impl MatchConfig {
    pub fn new(
        src_lang: LangCode,
        trg_lang: LangCode,
        src_dir: std::path::PathBuf,
        trg_dir: std::path::PathBuf,
    ) -> Self {
        MatchConfig {
            src_lang,
            trg_lang,
            src_dir,
            trg_dir,
            group_size: DEFAULT_GROUP_SIZE,
        }
    }
}

#[derive(Debug, Default)]
pub struct MatchReport {
    /// matched pairs, direct matches first then statistical matches
    pub matches: Vec<(String, String)>,
    pub unmatched_src: BTreeSet<String>,
    pub unmatched_trg: BTreeSet<String>,
}

impl MatchReport {
    /// writes the report as `source,target` CSV (spec §3, §6): matched
    /// rows have both columns, residual rows have exactly one empty side.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(["source", "target"])?;
        for (s, t) in &self.matches {
            writer.write_record([s, t])?;
        }
        for s in &self.unmatched_src {
            writer.write_record([s.as_str(), ""])?;
        }
        for t in &self.unmatched_trg {
            writer.write_record(["", t.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// removes properties that are very likely parsing errors or carry no
/// discriminative signal (spec §4.3 stage 1).
pub fn clean_prop_list(props: &BTreeSet<String>) -> BTreeSet<String> {
    props
        .iter()
        .filter(|p| {
            !p.starts_with('"')
                && !p.contains('%')
                && p.chars().any(|c| c.is_alphanumeric())
                && !SPECIAL_PROPERTIES.contains(&p.as_str())
        })
        .cloned()
        .collect()
}

/// finds matched pairs between `src_inventory` and `trg_inventory`,
/// consulting the shard files under `cfg.src_dir`/`cfg.trg_dir` and
/// translating target entities via `translator`.
pub async fn find_matches(
    cfg: &MatchConfig,
    src_inventory: &BTreeSet<String>,
    trg_inventory: &BTreeSet<String>,
    translator: &Translator,
) -> Result<MatchReport, Error> {
    let src_props = clean_prop_list(src_inventory);
    let trg_props = clean_prop_list(trg_inventory);

    info!(
        "matching {} source props against {} target props",
        src_props.len(),
        trg_props.len()
    );

    let direct: BTreeSet<String> = src_props.intersection(&trg_props).cloned().collect();
    info!("{} direct matches found", direct.len());

    let mut matches: Vec<(String, String)> =
        direct.iter().map(|m| (m.clone(), m.clone())).collect();

    let mut src_remaining: Vec<String> = src_props.difference(&direct).cloned().collect();
    let mut trg_remaining: Vec<String> = trg_props.difference(&direct).cloned().collect();
    src_remaining.sort();
    trg_remaining.sort();

    let mut statistical_count = 0usize;
    // snapshot groups up front: trg_remaining is fixed from here on, each
    // target appears in exactly one group, so no group overlap bookkeeping
    // is needed once the chunks are cut.
    let groups: Vec<Vec<String>> = trg_remaining
        .chunks(cfg.group_size)
        .map(<[String]>::to_vec)
        .collect();

    for group in &groups {
        if src_remaining.is_empty() {
            break;
        }

        let translated = load_group(group, &cfg.src_lang, &cfg.trg_lang, &cfg.trg_dir, translator).await?;

        let candidates = sweep_group(&src_remaining, group, &translated, &cfg.src_dir);

        let mut consumed_trg: HashSet<String> = HashSet::new();
        let mut matched_src: HashSet<String> = HashSet::new();

        for (src_prop, candidate) in src_remaining.iter().zip(candidates.into_iter()) {
            if let Some(trg_prop) = candidate {
                if !consumed_trg.contains(&trg_prop) {
                    matches.push((src_prop.clone(), trg_prop.clone()));
                    consumed_trg.insert(trg_prop);
                    matched_src.insert(src_prop.clone());
                    statistical_count += 1;
                }
            }
        }

        src_remaining.retain(|p| !matched_src.contains(p));
    }

    info!("{} statistical matches found", statistical_count);

    let matched_trg: HashSet<&String> = matches.iter().map(|(_, t)| t).collect();
    let unmatched_trg: BTreeSet<String> = trg_props
        .iter()
        .filter(|p| !matched_trg.contains(p))
        .cloned()
        .collect();
    let matched_src: HashSet<&String> = matches.iter().map(|(s, _)| s).collect();
    let unmatched_src: BTreeSet<String> = src_props
        .iter()
        .filter(|p| !matched_src.contains(p))
        .cloned()
        .collect();

    Ok(MatchReport {
        matches,
        unmatched_src,
        unmatched_trg,
    })
}

/// loads and translates every property's shard in `group` into
/// `Ls`-space: `(subject, value)` pairs with subjects and instance-kind
/// values translated into the source language. Missing/unreadable shards
/// yield no evidence rather than failing the whole match (spec §4.3
/// "Failure semantics").
async fn load_group(
    group: &[String],
    src_lang: &LangCode,
    trg_lang: &LangCode,
    trg_dir: &Path,
    translator: &Translator,
) -> Result<HashMap<String, Vec<(String, String)>>, Error> {
    let mut out = HashMap::with_capacity(group.len());

    for prop in group {
        let rows = match read_shard(&shard_path(trg_dir, prop)) {
            Ok(rows) => rows,
            Err(_) => {
                out.insert(prop.clone(), Vec::new());
                continue;
            }
        };

        let subjects: Vec<String> = rows.iter().map(|r| r.key_col.clone()).collect();
        let subj_translations = translator
            .translate_many(trg_lang, &subjects, std::slice::from_ref(src_lang))
            .await?;

        let instance_idx: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.format == "instance")
            .map(|(i, _)| i)
            .collect();
        let instance_values: Vec<String> = instance_idx.iter().map(|&i| rows[i].value.clone()).collect();
        let value_translations = if instance_values.is_empty() {
            Vec::new()
        } else {
            translator
                .translate_many(trg_lang, &instance_values, std::slice::from_ref(src_lang))
                .await?
        };

        let mut value_by_row: HashMap<usize, String> = HashMap::new();
        for (pos, &row_idx) in instance_idx.iter().enumerate() {
            if let Some(t) = value_translations[pos].get(src_lang.as_str()) {
                value_by_row.insert(row_idx, t.clone());
            }
        }

        let mut translated_rows = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let subject = subj_translations[i]
                .get(src_lang.as_str())
                .cloned()
                .unwrap_or(row.key_col);
            let value = value_by_row.get(&i).cloned().unwrap_or(row.value);
            translated_rows.push((subject, value));
        }

        out.insert(prop.clone(), translated_rows);
    }

    Ok(out)
}

/// for each source property still unmatched, sweeps the group's target
/// properties in order and returns the first one crossing the agreement
/// threshold (spec §4.3 stage 3.3-3.4, "Tie-breaking").
fn sweep_group(
    src_props: &[String],
    group_order: &[String],
    translated: &HashMap<String, Vec<(String, String)>>,
    src_dir: &Path,
) -> Vec<Option<String>> {
    src_props
        .par_iter()
        .map(|src_prop| {
            let src_pairs: Vec<(String, String)> = match read_shard(&shard_path(src_dir, src_prop)) {
                Ok(rows) => rows.into_iter().map(|r| (r.key_col, r.value)).collect(),
                Err(_) => return None,
            };
            if src_pairs.is_empty() {
                return None;
            }

            for trg_prop in group_order {
                let trg_pairs = match translated.get(trg_prop) {
                    Some(p) if !p.is_empty() => p,
                    _ => continue,
                };

                let threshold = MATCH_THRESHOLD * src_pairs.len().min(trg_pairs.len()) as f64;
                let mut agreement = 0usize;
                let mut hit = false;
                'outer: for t in trg_pairs {
                    for s in &src_pairs {
                        if s.0 == t.0 && s.1 == t.1 {
                            agreement += 1;
                            if agreement as f64 >= threshold {
                                hit = true;
                                break 'outer;
                            }
                        }
                    }
                }

                if hit {
                    return Some(trg_prop.clone());
                }
            }
            None
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::{write_shard, ShardKind, ShardRow};
    use crate::triple::ValueKind;
    use tempfile::tempdir;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn s4_direct_match_and_residuals() {
        let src = set(&["name", "year", "author"]);
        let trg = set(&["name", "author", "titel"]);
        let src = clean_prop_list(&src);
        let trg = clean_prop_list(&trg);

        let direct: BTreeSet<String> = src.intersection(&trg).cloned().collect();
        assert_eq!(direct, set(&["name", "author"]));

        let src_residual: BTreeSet<String> = src.difference(&direct).cloned().collect();
        let trg_residual: BTreeSet<String> = trg.difference(&direct).cloned().collect();
        assert_eq!(src_residual, set(&["year"]));
        assert_eq!(trg_residual, set(&["titel"]));
    }

    #[test]
    fn clean_prop_list_removes_noise() {
        let props = set(&["\"quoted", "a%b", "!!!", "url", "image", "real_prop"]);
        assert_eq!(clean_prop_list(&props), set(&["real_prop"]));
    }

    #[test]
    fn s5_statistical_match_threshold() {
        let dir = tempdir().unwrap();
        let src_dir = dir.path().join("en");
        let trg_dir = dir.path().join("de");

        write_shard(
            &src_dir,
            "year",
            ShardKind::Property,
            &[
                ShardRow::new("Book1", "1999", &ValueKind::Typed("integer".into())),
                ShardRow::new("Book2", "2003", &ValueKind::Typed("integer".into())),
                ShardRow::new("Book3", "2010", &ValueKind::Typed("integer".into())),
            ],
        )
        .unwrap();

        write_shard(
            &trg_dir,
            "jahr",
            ShardKind::Property,
            &[
                ShardRow::new("Book1", "1999", &ValueKind::Typed("integer".into())),
                ShardRow::new("Book2", "2003", &ValueKind::Typed("integer".into())),
                ShardRow::new("Book4", "2020", &ValueKind::Typed("integer".into())),
            ],
        )
        .unwrap();

        // no translation needed: subjects/values already identical strings,
        // so an empty translator target list still round-trips via fallback
        let translated: HashMap<String, Vec<(String, String)>> = HashMap::from([(
            "jahr".to_string(),
            vec![
                ("Book1".to_string(), "1999".to_string()),
                ("Book2".to_string(), "2003".to_string()),
                ("Book4".to_string(), "2020".to_string()),
            ],
        )]);

        let candidates = sweep_group(
            &["year".to_string()],
            &["jahr".to_string()],
            &translated,
            &src_dir,
        );
        assert_eq!(candidates, vec![Some("jahr".to_string())]);
    }

    #[test]
    fn below_threshold_does_not_match() {
        let dir = tempdir().unwrap();
        let src_dir = dir.path().join("en");

        write_shard(
            &src_dir,
            "year",
            ShardKind::Property,
            &[
                ShardRow::new("Book1", "1999", &ValueKind::Typed("integer".into())),
                ShardRow::new("Book2", "2003", &ValueKind::Typed("integer".into())),
                ShardRow::new("Book3", "2010", &ValueKind::Typed("integer".into())),
            ],
        )
        .unwrap();

        let translated: HashMap<String, Vec<(String, String)>> = HashMap::from([(
            "jahr".to_string(),
            vec![("BookX".to_string(), "1900".to_string())],
        )]);

        let candidates = sweep_group(
            &["year".to_string()],
            &["jahr".to_string()],
            &translated,
            &src_dir,
        );
        assert_eq!(candidates, vec![None]);
    }

    #[test]
    fn match_report_save_shapes_residuals() {
        let dir = tempdir().unwrap();
        let report = MatchReport {
            matches: vec![("name".to_string(), "name".to_string())],
            unmatched_src: set(&["year"]),
            unmatched_trg: set(&["titel"]),
        };
        let path = dir.path().join("matches.csv");
        report.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "source,target\nname,name\nyear,\n,titel\n"
        );
    }
}
