use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn harvest(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("harvest").unwrap();
    cmd.current_dir(dir).env("RUST_LOG", "off");
    cmd
}

#[test]
fn download_fails_without_urls_file() {
    let dir = tempfile::tempdir().unwrap();

    harvest(dir.path())
        .args(["download", "--urls-file", "missing.txt", "--output-dir", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("URLs file not found"));

    assert!(!dir.path().join("out").exists());
}

#[test]
fn download_with_empty_list_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("urls.txt"), "\n  \n").unwrap();

    harvest(dir.path())
        .args(["download", "--urls-file", "urls.txt", "--output-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No URLs found"));

    assert!(!dir.path().join("out").exists());
}

#[cfg(unix)]
#[test]
fn download_records_every_url_with_fake_extractor() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fake-yt-dlp");
    std::fs::write(
        &script,
        r#"#!/bin/sh
for last; do :; done
case "$last" in
  --version) echo 2024.01.01; exit 0 ;;
  *b) echo "ERROR: Unsupported URL: $last" >&2; exit 1 ;;
esac
echo '{"title": "clip", "uploader": "someone", "id": "1", "duration": 3, "webpage_url": "'"$last"'"}'
"#,
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        format!("acquisition:\n  yt_dlp_path: {}\n", script.display()),
    )
    .unwrap();
    std::fs::write(dir.path().join("urls.txt"), "https://a\nhttps://b\n").unwrap();

    harvest(dir.path())
        .args(["--quiet", "download", "--urls-file", "urls.txt", "--output-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/2] https://a"))
        .stdout(predicate::str::contains("[2/2] https://b"))
        .stdout(predicate::str::contains("error: ERROR: Unsupported URL: https://b"));

    let csv = std::fs::read_to_string(dir.path().join("out").join("audio_metadata.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "input_url,status,filepath,title,uploader,id,duration,webpage_url,error");
    assert_eq!(lines[1], "https://a,ok,out/someone_1.mp3,clip,someone,1,3,https://a,");
    assert_eq!(lines[2], "https://b,error,,,,,,,ERROR: Unsupported URL: https://b");
}

#[test]
fn merge_then_segment_reverses_sections() {
    let dir = tempfile::tempdir().unwrap();
    let texts = dir.path().join("texts");
    std::fs::create_dir(&texts).unwrap();
    std::fs::write(texts.join("x.txt"), "hello").unwrap();
    std::fs::write(texts.join("y.txt"), "world").unwrap();
    std::fs::write(texts.join("clip.mp3"), "ID3").unwrap();

    harvest(dir.path())
        .args(["merge", "--input-dir", "texts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 2 files (1 skipped)"));

    let merged = std::fs::read_to_string(dir.path().join("merged_output.txt")).unwrap();
    assert!(merged.find("START x.txt").unwrap() < merged.find("START y.txt").unwrap());

    harvest(dir.path()).arg("segment").assert().success();

    let table = std::fs::read_to_string(dir.path().join("merged_for_sheets.csv")).unwrap();
    assert_eq!(table, "\"world\"\r\n\"hello\"\r\n");
}

#[test]
fn strict_segment_rejects_unterminated_section() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("doc.txt"), "----- START a.txt -----\nno end\n").unwrap();

    harvest(dir.path())
        .args(["segment", "--input", "doc.txt", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed merged document"));

    harvest(dir.path())
        .args(["segment", "--input", "doc.txt"])
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(dir.path().join("merged_for_sheets.csv")).unwrap(), "");
}

#[test]
fn tabulate_writes_one_row_per_text_file() {
    let dir = tempfile::tempdir().unwrap();
    let texts = dir.path().join("texts");
    std::fs::create_dir(&texts).unwrap();
    std::fs::write(texts.join("a.txt"), "first,\nline").unwrap();
    std::fs::write(texts.join("b.TXT"), "second").unwrap();

    harvest(dir.path())
        .args(["tabulate", "--input-dir", "texts", "--output", "rows.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rows"));

    let table = std::fs::read_to_string(dir.path().join("rows.csv")).unwrap();
    assert_eq!(table, "\"second\"\r\n\"first,\nline\"\r\n");
}
