//! Translation table persistence (spec §3, §4.2, §6).
//!
//! For a fixed ordered list of language codes `[L1,…,Ln]`, the table holds
//! `n`-tuples where position `i` is the entity name in `Li` (empty string
//! if unknown). The header row records the language order. Presence of the
//! file is the cache key for "already translated" (spec §4.2
//! "Persistence").
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::lang::LangCode;

pub type Row = Vec<String>;

pub struct TranslationTable {
    pub langs: Vec<LangCode>,
    pub rows: BTreeSet<Row>,
}

impl TranslationTable {
    pub fn new(langs: Vec<LangCode>) -> Self {
        TranslationTable {
            langs,
            rows: BTreeSet::new(),
        }
    }

    /// output path `subj_<L1>_<L2>…[_<suffix>]_translations.csv`.
    pub fn path(out_dir: &Path, langs: &[LangCode], suffix: Option<&str>) -> PathBuf {
        let mut name = "subj".to_string();
        for l in langs {
            name.push('_');
            name.push_str(l.as_str());
        }
        if let Some(s) = suffix {
            name.push('_');
            name.push_str(s);
        }
        name.push_str("_translations.csv");
        out_dir.join(name)
    }

    pub fn insert(&mut self, row: Row) {
        assert_eq!(row.len(), self.langs.len(), "row arity must match language order");
        self.rows.insert(row);
    }

    /// looks up the translation for `lang` on the row whose entry for
    /// `origin_lang` equals `origin_name`, if present.
    pub fn lookup(&self, origin_lang: &LangCode, origin_name: &str, target: &LangCode) -> Option<String> {
        let origin_idx = self.langs.iter().position(|l| l == origin_lang)?;
        let target_idx = self.langs.iter().position(|l| l == target)?;
        self.rows
            .iter()
            .find(|row| row[origin_idx] == origin_name)
            .map(|row| row[target_idx].clone())
            .filter(|s| !s.is_empty())
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        let header: Vec<&str> = self.langs.iter().map(|l| l.as_str()).collect();
        writer.write_record(&header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers = reader.headers()?.clone();
        let langs: Vec<LangCode> = headers
            .iter()
            .map(LangCode::new)
            .collect::<Result<_, _>>()?;

        let mut rows = BTreeSet::new();
        for record in reader.records() {
            let record = record?;
            rows.insert(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(TranslationTable { langs, rows })
    }

    /// idempotent load-or-build: if the target file already exists, load
    /// it and short-circuit recomputation (spec §4.2 "Persistence").
    pub fn load_or_build<F>(path: &Path, build: F) -> Result<Self, Error>
    where
        F: FnOnce() -> Result<Self, Error>,
    {
        if path.exists() {
            Self::load(path)
        } else {
            let table = build()?;
            table.save(path)?;
            Ok(table)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn lc(s: &str) -> LangCode {
        LangCode::new(s).unwrap()
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let mut table = TranslationTable::new(vec![lc("en"), lc("de")]);
        table.insert(vec!["Berlin".to_string(), "Berlin".to_string()]);
        table.insert(vec!["Munich".to_string(), "München".to_string()]);

        let path = dir.path().join("t.csv");
        table.save(&path).unwrap();

        let loaded = TranslationTable::load(&path).unwrap();
        assert_eq!(loaded.langs, table.langs);
        assert_eq!(loaded.rows, table.rows);
    }

    #[test]
    fn lookup_finds_translation() {
        let mut table = TranslationTable::new(vec![lc("en"), lc("de")]);
        table.insert(vec!["Munich".to_string(), "München".to_string()]);

        assert_eq!(
            table.lookup(&lc("en"), "Munich", &lc("de")),
            Some("München".to_string())
        );
        assert_eq!(table.lookup(&lc("en"), "Unknown", &lc("de")), None);
    }

    #[test]
    fn path_includes_all_langs_and_suffix() {
        let out = Path::new("/tmp/out");
        let p = TranslationTable::path(out, &[lc("en"), lc("de")], Some("cats"));
        assert_eq!(p, out.join("subj_en_de_cats_translations.csv"));
    }

    #[test]
    fn load_or_build_short_circuits_when_file_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut table = TranslationTable::new(vec![lc("en")]);
        table.insert(vec!["X".to_string()]);
        table.save(&path).unwrap();

        let loaded = TranslationTable::load_or_build(&path, || {
            panic!("build should not run when file exists")
        })
        .unwrap();
        assert_eq!(loaded.rows, table.rows);
    }
}
