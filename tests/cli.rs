use assert_cmd::Command;
use predicates::prelude::*;
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

fn orthokit() -> Command {
    Command::cargo_bin("orthokit").unwrap()
}

const CLSTR: &str = ">Cluster 0
0\t350aa, >protA_1... *
1\t340aa, >protB_7... at 91.43%
>Cluster 1
0\t120aa, >protC_2... *
";

#[test]
fn parse_requires_a_format_flag() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("run.clstr"), CLSTR).unwrap();

    orthokit()
        .current_dir(temp.path())
        .args(["parse", "-i", "run.clstr"])
        .assert()
        .failure();
    assert!(!temp.path().join("run_parsed.txt").exists());
}

#[test]
fn parse_rejects_two_format_flags() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("run.clstr"), CLSTR).unwrap();

    orthokit()
        .current_dir(temp.path())
        .args(["parse", "-i", "run.clstr", "-c", "-u"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn parse_cd_hit_writes_three_files_named_after_input() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("run.clstr"), CLSTR).unwrap();

    orthokit()
        .current_dir(temp.path())
        .args(["parse", "-i", "run.clstr", "--cd-hit"])
        .assert()
        .success();

    let wide = fs::read_to_string(temp.path().join("run_parsed.txt")).unwrap();
    assert_eq!(wide, "CD-HIT_ID\tCD-HIT_Members\nCDH_Cluster_0\tprotA_1,protB_7\nCDH_Cluster_1\tprotC_2\n");
    let pivot = fs::read_to_string(temp.path().join("run_parsed_pivot.txt")).unwrap();
    assert_eq!(pivot.lines().count(), 4);
    let json = fs::read_to_string(temp.path().join("run_parsed.json")).unwrap();
    assert_eq!(json, r#"{"CDH_Cluster_0":["protA_1","protB_7"],"CDH_Cluster_1":["protC_2"]}"#);
}

#[test]
fn parse_malformed_usearch_fails_with_message() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("bad.uc"), "H\t0\t9\t99.0\t+\t0\t0\t9M\thit1\tseed1\n").unwrap();

    orthokit()
        .current_dir(temp.path())
        .args(["parse", "-i", "bad.uc", "-u", "-o", "bad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("H record before any S record"));
    assert!(!temp.path().join("bad_parsed.json").exists());
}

#[test]
fn parse_missing_input_fails() {
    let temp = TempDir::new().unwrap();
    orthokit()
        .current_dir(temp.path())
        .args(["parse", "-i", "absent.tsv", "-m"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn pipeline_parse_stats_and_db() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("cdhit.clstr"), CLSTR).unwrap();
    fs::write(
        temp.path().join("mmseqs.tsv"),
        "rep\tmember\nprotA_1\tprotA_1\nprotD_4\tprotD_4\nprotA_1\tprotC_2\n",
    )
    .unwrap();

    orthokit().current_dir(temp.path()).args(["parse", "-i", "cdhit.clstr", "-c"]).assert().success();
    orthokit().current_dir(temp.path()).args(["parse", "-i", "mmseqs.tsv", "-m"]).assert().success();

    orthokit()
        .current_dir(temp.path())
        .args(["og-stats", "cdhit_parsed.json", "mmseqs_parsed.json", "--name", "bench"])
        .assert()
        .success();
    let stats = fs::read_to_string(temp.path().join("bench__og_stats.txt")).unwrap();
    let rows: Vec<&str> = stats.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("cdhit\t2\t1\t2\t1.5\t1.5\t2\t0.5\t0.25\tY\t1"));
    assert!(rows[2].starts_with("mmseqs\t2\t1\t2\t"));

    orthokit()
        .current_dir(temp.path())
        .args(["ortho-db", "cdhit_parsed_pivot.txt", "mmseqs_parsed_pivot.txt", "-o", "db.txt"])
        .assert()
        .success();
    let db = fs::read_to_string(temp.path().join("db.txt")).unwrap();
    assert_eq!(
        db,
        "Query\tcdhit_parsed_pivot\tmmseqs_parsed_pivot\n\
         protA_1\tCDH_Cluster_0\tMMS_Cluster_0\n\
         protB_7\tCDH_Cluster_0\t-\n\
         protC_2\tCDH_Cluster_1\tMMS_Cluster_0\n\
         protD_4\t-\tMMS_Cluster_1\n"
    );
}

#[test]
fn assign_headers_twice_never_repeats_a_code() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.faa"), ">p1 alpha\nMKT\n>p2 beta\nMKA\n>p3\nMKL\n").unwrap();
    fs::write(temp.path().join("b.faa"), ">p1 alpha\nMKT\n>q9\nMMM\n").unwrap();

    for fa in ["a.faa", "b.faa"] {
        orthokit()
            .current_dir(temp.path())
            .args(["assign-headers", fa, "ledger.txt", "--seed", "3"])
            .assert()
            .success();
    }

    let ledger = fs::read_to_string(temp.path().join("ledger.txt")).unwrap();
    let rows: Vec<Vec<&str>> = ledger.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), 5);
    let codes: HashSet<&str> = rows.iter().map(|r| r[0]).collect();
    assert_eq!(codes.len(), 5);
    assert!(codes.iter().all(|c| c.len() == 16 && c.chars().all(|ch| ch.is_ascii_alphanumeric())));
    assert_eq!(&rows[3][1..], ["p1 alpha", "b"]);

    let edited = fs::read_to_string(temp.path().join("b_edit.fasta")).unwrap();
    assert_eq!(edited, format!(">{}\nMKT\n>{}\nMMM\n", rows[3][0], rows[4][0]));
}

#[test]
fn label_dupes_numbers_copies() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("x.fa"), ">A\nAC\n>B\nGT\n>A\nCC\n>A\nTT\n").unwrap();

    orthokit().current_dir(temp.path()).args(["label-dupes", "x.fa"]).assert().success();

    let out = fs::read_to_string(temp.path().join("x_CopyN.fasta")).unwrap();
    assert_eq!(out, ">A\nAC\n>B\nGT\n>A - Copy 2\nCC\n>A - Copy 3\nTT\n");
}
