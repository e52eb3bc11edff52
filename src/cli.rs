//! Command line arguments and parameters management/parsing (spec §6
//! "CLI surface").
use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "dbpedia-xlingo",
    about = "Cross-lingual property matching for DBpedia infobox dumps"
)]
/// Holds every command callable by the `dbpedia-xlingo` binary.
pub enum Cli {
    #[structopt(about = "Ingest a single-language dump into property/subject shards")]
    Ingest(Ingest),
    #[structopt(about = "Materialize a cross-lingual translation table")]
    Translate(Translate),
    #[structopt(about = "Match two languages' property inventories")]
    Match(Match),
    #[structopt(about = "Run the full ingest -> translate -> match pipeline")]
    Run(Run),
}

#[derive(Debug, StructOpt)]
pub struct Ingest {
    #[structopt(
        parse(from_os_str),
        help = "path to the language dump (line-oriented RDF-Turtle)"
    )]
    pub dump: PathBuf,
    #[structopt(
        long,
        help = "two-letter language code, defaults to the dump's lang= segment"
    )]
    pub lang: Option<String>,
    #[structopt(parse(from_os_str), help = "output directory for shards and inventory")]
    pub out_dir: PathBuf,
    #[structopt(long, help = "shard by subject instead of property")]
    pub subject_shard: bool,
    #[structopt(long = "out_suffix", help = "suffix appended to all produced filenames")]
    pub out_suffix: Option<String>,
    #[structopt(long = "force_new", help = "ignore cached inventory and re-ingest")]
    pub force_new: bool,
    #[structopt(long, help = "category title restricting the subject set")]
    pub category: Option<String>,
    #[structopt(long, default_value = "0", help = "worker count, 0 = all available cores")]
    pub workers: usize,
}

#[derive(Debug, StructOpt)]
pub struct Translate {
    #[structopt(parse(from_os_str), help = "dump files, one per configured language")]
    pub dumps: Vec<PathBuf>,
    #[structopt(parse(from_os_str), help = "output directory")]
    pub out_dir: PathBuf,
    #[structopt(long = "out_suffix")]
    pub out_suffix: Option<String>,
}

#[derive(Debug, StructOpt)]
pub struct Match {
    #[structopt(long = "src_lang", default_value = "en")]
    pub src_lang: String,
    #[structopt(long = "trg_lang")]
    pub trg_lang: String,
    #[structopt(parse(from_os_str), help = "directory holding both languages' shards")]
    pub data_dir: PathBuf,
    #[structopt(long = "out_suffix")]
    pub out_suffix: Option<String>,
}

#[derive(Debug, StructOpt)]
/// Runs the full pipeline: ingest both sides, optionally filter by
/// category, translate, then match.
pub struct Run {
    #[structopt(parse(from_os_str))]
    pub src_dump: PathBuf,
    #[structopt(parse(from_os_str))]
    pub trg_dump: PathBuf,
    #[structopt(long = "src_lang", default_value = "en")]
    pub src_lang: String,
    #[structopt(long = "trg_lang")]
    pub trg_lang: String,
    #[structopt(long, help = "dump version string used to form the download URL upstream")]
    pub version: Option<String>,
    #[structopt(parse(from_os_str))]
    pub out_dir: PathBuf,
    #[structopt(long = "force_new")]
    pub force_new: bool,
    #[structopt(long = "src_cat")]
    pub src_cat: Option<String>,
    #[structopt(long = "trg_cat")]
    pub trg_cat: Option<String>,
    #[structopt(long = "out_suffix")]
    pub out_suffix: Option<String>,
    #[structopt(long, default_value = "0", help = "worker count, 0 = all available cores")]
    pub workers: usize,
}
