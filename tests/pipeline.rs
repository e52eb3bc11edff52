//! End-to-end exercise of ingest -> match over two small synthetic dumps,
//! all pairs resolvable by direct property-name match so no network access
//! is required.
use std::fs::File;
use std::io::Write;

use dbpedia_xlingo::ingest::ingest;
use dbpedia_xlingo::matcher::{find_matches, MatchConfig};
use dbpedia_xlingo::shard::{shard_dir, ShardKind};
use dbpedia_xlingo::translate::Translator;

fn write_dump(dir: &std::path::Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    for line in lines {
        writeln!(f, "{}", line).unwrap();
    }
    path
}

#[tokio::test]
async fn ingest_then_match_direct_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    let en_dump = write_dump(
        dir.path(),
        "en.ttl",
        &[
            r#"<http://en.dbpedia.org/resource/Paris> <http://en.dbpedia.org/property/population> "2140526"^^<http://www.w3.org/2001/XMLSchema#integer> ."#,
            r#"<http://en.dbpedia.org/resource/Paris> <http://en.dbpedia.org/property/name> "Paris"@en ."#,
            r#"<http://en.dbpedia.org/resource/Lyon> <http://en.dbpedia.org/property/population> "513275"^^<http://www.w3.org/2001/XMLSchema#integer> ."#,
        ],
    );
    let de_dump = write_dump(
        dir.path(),
        "de.ttl",
        &[
            r#"<http://de.dbpedia.org/resource/Paris> <http://de.dbpedia.org/property/population> "2140526"^^<http://www.w3.org/2001/XMLSchema#integer> ."#,
            r#"<http://de.dbpedia.org/resource/Paris> <http://de.dbpedia.org/property/name> "Paris"@de ."#,
        ],
    );

    let en_report = ingest(&en_dump, "en", &out, None, ShardKind::Property, None, 2, false).unwrap();
    let de_report = ingest(&de_dump, "de", &out, None, ShardKind::Property, None, 2, false).unwrap();

    assert_eq!(en_report.inventory.len(), 2);
    assert_eq!(de_report.inventory.len(), 2);

    let cfg = MatchConfig::new(
        "en".parse().unwrap(),
        "de".parse().unwrap(),
        shard_dir(&out, "en", None),
        shard_dir(&out, "de", None),
    );
    let translator = Translator::new("wikipedia.org").unwrap();

    let report = find_matches(&cfg, &en_report.inventory, &de_report.inventory, &translator)
        .await
        .unwrap();

    assert_eq!(
        report.matches,
        vec![
            ("name".to_string(), "name".to_string()),
            ("population".to_string(), "population".to_string()),
        ]
    );
    assert!(report.unmatched_src.is_empty());
    assert!(report.unmatched_trg.is_empty());

    let report_path = out.join("matches.csv");
    report.save(&report_path).unwrap();
    let content = std::fs::read_to_string(&report_path).unwrap();
    assert!(content.starts_with("source,target\n"));
}

#[test]
fn rerun_with_force_new_false_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let dump = write_dump(
        dir.path(),
        "en.ttl",
        &[r#"<http://en.dbpedia.org/resource/A> <http://en.dbpedia.org/property/p> "1"^^<http://www.w3.org/2001/XMLSchema#integer> ."#],
    );

    let first = ingest(&dump, "en", &out, None, ShardKind::Property, None, 1, false).unwrap();
    std::fs::remove_file(&dump).unwrap();
    let second = ingest(&dump, "en", &out, None, ShardKind::Property, None, 1, false).unwrap();
    assert_eq!(first.inventory, second.inventory);
}
