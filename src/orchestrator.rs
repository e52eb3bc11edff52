//! Control-flow wiring for the `dbpedia-xlingo` binary's subcommands (spec
//! §2 "Pipeline overview", §4.5).
//!
//! Each function here corresponds to one [`crate::cli::Cli`] variant: it
//! resolves CLI-level strings into domain types, drives the component
//! modules (`ingest`, `category`, `translation_table`, `matcher`) in the
//! order spec §2 lays out, and persists whatever artifacts that stage
//! produces. `main.rs` does nothing but parse args and call into here.
use std::collections::HashSet;
use std::path::PathBuf;

use log::info;

use crate::category::{CategoryFetcher, WikiCategoryFetcher};
use crate::cli;
use crate::error::Error;
use crate::ingest::{self, IngestReport};
use crate::lang::LangCode;
use crate::matcher::{self, MatchConfig, MatchReport};
use crate::shard::ShardKind;
use crate::translate::Translator;
use crate::translation_table::TranslationTable;

const CATALOG_HOST: &str = "wikipedia.org";

/// resolves `workers == 0` to "use every available core", matching the
/// rayon global pool the ingester and matcher already run on.
fn resolve_workers(workers: usize) -> usize {
    if workers == 0 {
        rayon::current_num_threads()
    } else {
        workers
    }
}

/// `dbpedia-xlingo ingest`: a single dump into property or subject shards,
/// optionally restricted to one category's members.
pub async fn run_ingest(args: cli::Ingest) -> Result<IngestReport, Error> {
    let lang = match &args.lang {
        Some(l) => LangCode::new(l)?,
        None => LangCode::from_dump_filename(&args.dump.to_string_lossy())?,
    };
    let kind = if args.subject_shard {
        ShardKind::Subject
    } else {
        ShardKind::Property
    };

    let filter = match &args.category {
        Some(cat) => Some(fetch_category(cat, &lang).await?),
        None => None,
    };

    let workers = resolve_workers(args.workers);
    let report = ingest::ingest(
        &args.dump,
        lang.as_str(),
        &args.out_dir,
        args.out_suffix.as_deref(),
        kind,
        filter.as_ref(),
        workers,
        args.force_new,
    )?;

    let types = ingest::extract_types(
        &args.dump,
        lang.as_str(),
        &args.out_dir,
        args.out_suffix.as_deref(),
        filter.as_ref(),
        workers,
        args.force_new,
    )?;

    info!(
        "[{}] {} keys ingested, {} value-kind tags, {} parse errors",
        lang, report.inventory.len(), types.len(), report.parse_errors
    );
    Ok(report)
}

/// `dbpedia-xlingo translate`: materializes a translation table over the
/// union of subjects found across every dump given, keyed by each dump's
/// own `lang=` segment (spec §4.2 "Persistence").
pub async fn run_translate(args: cli::Translate) -> Result<TranslationTable, Error> {
    if args.dumps.len() < 2 {
        return Err(Error::Config(
            "translate needs at least two dumps to build a cross-lingual table".to_string(),
        ));
    }

    let mut langs = Vec::with_capacity(args.dumps.len());
    for dump in &args.dumps {
        langs.push(LangCode::from_dump_filename(&dump.to_string_lossy())?);
    }

    let path = TranslationTable::path(&args.out_dir, &langs, args.out_suffix.as_deref());
    if path.exists() {
        info!("translation table already present at {:?}", path);
        return TranslationTable::load(&path);
    }

    // subject-shard every dump first: the union of all subjects across all
    // configured languages is what gets a row in the table.
    let mut reports = Vec::with_capacity(args.dumps.len());
    for (dump, lang) in args.dumps.iter().zip(&langs) {
        let report = ingest::ingest(
            dump,
            lang.as_str(),
            &args.out_dir,
            args.out_suffix.as_deref(),
            ShardKind::Subject,
            None,
            resolve_workers(0),
            false,
        )?;
        reports.push(report);
    }

    let origin_lang = langs[0].clone();
    let origin_subjects: Vec<String> = reports[0].inventory.iter().cloned().collect();
    let targets: Vec<LangCode> = langs[1..].to_vec();

    let translator = Translator::new(CATALOG_HOST)?.with_concurrency(resolve_workers(0));
    let translations = translator
        .translate_many(&origin_lang, &origin_subjects, &targets)
        .await?;

    let mut table = TranslationTable::new(langs.clone());
    for (subject, translation) in origin_subjects.iter().zip(translations) {
        let mut row = Vec::with_capacity(langs.len());
        row.push(
            translation
                .get(origin_lang.as_str())
                .cloned()
                .unwrap_or_else(|| subject.clone()),
        );
        for lang in &langs[1..] {
            row.push(translation.get(lang.as_str()).cloned().unwrap_or_default());
        }
        table.insert(row);
    }

    table.save(&path)?;
    info!("translation table written to {:?}", path);
    Ok(table)
}

/// `dbpedia-xlingo match`: matches two already-ingested languages' property
/// inventories, given a directory holding both sides' shard trees.
pub async fn run_match(args: cli::Match) -> Result<MatchReport, Error> {
    let src_lang = LangCode::new(&args.src_lang)?;
    let trg_lang = LangCode::new(&args.trg_lang)?;

    let src_inventory_path = crate::shard::Inventory::path(
        &args.data_dir,
        src_lang.as_str(),
        args.out_suffix.as_deref(),
        ShardKind::Property,
    );
    let trg_inventory_path = crate::shard::Inventory::path(
        &args.data_dir,
        trg_lang.as_str(),
        args.out_suffix.as_deref(),
        ShardKind::Property,
    );
    let src_inventory = crate::shard::Inventory::load(&src_inventory_path)?;
    let trg_inventory = crate::shard::Inventory::load(&trg_inventory_path)?;

    let src_dir = crate::shard::shard_dir(&args.data_dir, src_lang.as_str(), args.out_suffix.as_deref());
    let trg_dir = crate::shard::shard_dir(&args.data_dir, trg_lang.as_str(), args.out_suffix.as_deref());

    let cfg = MatchConfig::new(src_lang, trg_lang, src_dir, trg_dir);
    let translator = Translator::new(CATALOG_HOST)?.with_concurrency(resolve_workers(0));

    let report = matcher::find_matches(&cfg, &src_inventory, &trg_inventory, &translator).await?;

    let out_path = match_report_path(&args.data_dir, &cfg.src_lang, &cfg.trg_lang, args.out_suffix.as_deref());
    report.save(&out_path)?;
    info!(
        "{} matches, {} unmatched source, {} unmatched target -> {:?}",
        report.matches.len(),
        report.unmatched_src.len(),
        report.unmatched_trg.len(),
        out_path
    );
    Ok(report)
}

/// `dbpedia-xlingo run`: the full pipeline, ingest both sides then match
/// (spec §2). Category filters restrict each side's subject set before
/// shards are built; no translation-table pre-pass is required since the
/// matcher translates on demand, group by group.
pub async fn run_pipeline(args: cli::Run) -> Result<MatchReport, Error> {
    let src_lang = LangCode::new(&args.src_lang)?;
    let trg_lang = LangCode::new(&args.trg_lang)?;
    let workers = resolve_workers(args.workers);

    let src_filter = match &args.src_cat {
        Some(cat) => Some(fetch_category(cat, &src_lang).await?),
        None => None,
    };
    let trg_filter = match &args.trg_cat {
        Some(cat) => Some(fetch_category(cat, &trg_lang).await?),
        None => None,
    };

    let src_report = ingest::ingest(
        &args.src_dump,
        src_lang.as_str(),
        &args.out_dir,
        args.out_suffix.as_deref(),
        ShardKind::Property,
        src_filter.as_ref(),
        workers,
        args.force_new,
    )?;
    let trg_report = ingest::ingest(
        &args.trg_dump,
        trg_lang.as_str(),
        &args.out_dir,
        args.out_suffix.as_deref(),
        ShardKind::Property,
        trg_filter.as_ref(),
        workers,
        args.force_new,
    )?;

    ingest::extract_types(
        &args.src_dump,
        src_lang.as_str(),
        &args.out_dir,
        args.out_suffix.as_deref(),
        src_filter.as_ref(),
        workers,
        args.force_new,
    )?;
    ingest::extract_types(
        &args.trg_dump,
        trg_lang.as_str(),
        &args.out_dir,
        args.out_suffix.as_deref(),
        trg_filter.as_ref(),
        workers,
        args.force_new,
    )?;

    let src_dir = crate::shard::shard_dir(&args.out_dir, src_lang.as_str(), args.out_suffix.as_deref());
    let trg_dir = crate::shard::shard_dir(&args.out_dir, trg_lang.as_str(), args.out_suffix.as_deref());

    let cfg = MatchConfig::new(src_lang, trg_lang, src_dir, trg_dir);
    let translator = Translator::new(CATALOG_HOST)?.with_concurrency(workers);

    let report = matcher::find_matches(&cfg, &src_report.inventory, &trg_report.inventory, &translator).await?;

    let out_path = match_report_path(&args.out_dir, &cfg.src_lang, &cfg.trg_lang, args.out_suffix.as_deref());
    report.save(&out_path)?;
    info!(
        "{} matches, {} unmatched source, {} unmatched target -> {:?}",
        report.matches.len(),
        report.unmatched_src.len(),
        report.unmatched_trg.len(),
        out_path
    );
    Ok(report)
}

fn match_report_path(out_dir: &std::path::Path, src: &LangCode, trg: &LangCode, suffix: Option<&str>) -> PathBuf {
    let suffix_part = suffix.map(|s| format!("_{}", s)).unwrap_or_default();
    out_dir.join(format!("{}_{}{}_matches.csv", src, trg, suffix_part))
}

async fn fetch_category(category: &str, lang: &LangCode) -> Result<HashSet<String>, Error> {
    let fetcher = WikiCategoryFetcher::new(CATALOG_HOST)?;
    fetcher.members(category, lang).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_workers_zero_uses_rayon_pool() {
        assert_eq!(resolve_workers(0), rayon::current_num_threads());
        assert_eq!(resolve_workers(3), 3);
    }

    #[test]
    fn match_report_path_includes_suffix() {
        let p = match_report_path(std::path::Path::new("/tmp/out"), &LangCode::new("en").unwrap(), &LangCode::new("de").unwrap(), Some("cats"));
        assert_eq!(p, std::path::Path::new("/tmp/out/en_de_cats_matches.csv"));
    }
}
