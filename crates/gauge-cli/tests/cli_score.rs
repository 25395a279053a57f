use assert_cmd::Command;
use predicates::prelude::*;

fn write_batch(dir: &tempfile::TempDir, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

const HEALTHY_ITEM: &str = r#"{"run_id":"r1","query_id":"q1","query_text":"지원자 목록으로 이동","agent_type":"navigation","expected":{"datakeys":["A"]},"responses":[{"raw_payload":{"dataKeys":["A"]},"assistant_text":"이동했습니다","response_time_sec":3.0},{"raw_payload":{"dataKeys":["A"]},"assistant_text":"이동했습니다","response_time_sec":3.0},{"raw_payload":{"dataKeys":["A"]},"assistant_text":"이동했습니다","response_time_sec":3.0}]}"#;

#[test]
fn precheck_passes_on_healthy_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_batch(&dir, "batch.jsonl", &[HEALTHY_ITEM]);

    Command::cargo_bin("gauge")
        .unwrap()
        .args(["precheck", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("ready"));
}

#[test]
fn precheck_fails_on_empty_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_batch(&dir, "empty.jsonl", &[]);

    Command::cargo_bin("gauge")
        .unwrap()
        .args(["precheck", "--input"])
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hard fail"));
}

#[test]
fn score_writes_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_batch(&dir, "batch.jsonl", &[HEALTHY_ITEM]);
    let config = dir.path().join("scoring.yaml");
    let out = dir.path().join("scored.json");

    Command::cargo_bin("gauge")
        .unwrap()
        .args(["init", "--config"])
        .arg(&config)
        .assert()
        .success();

    Command::cargo_bin("gauge")
        .unwrap()
        .args(["score", "--input"])
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["items"].as_array().unwrap().len(), 1);
    assert_eq!(doc["items"][0]["query_id"], "q1");
    assert_eq!(doc["rounds"].as_array().unwrap().len(), 1);
    assert_eq!(doc["agents"].as_array().unwrap().len(), 1);
}

#[test]
fn score_refuses_blocking_batch_without_force() {
    let dir = tempfile::tempdir().unwrap();
    // Items with no query text anywhere: blocking precheck failure.
    let input = write_batch(
        &dir,
        "bad.jsonl",
        &[r#"{"query_id":"q1","responses":[{"assistant_text":"ok","raw_payload":{}}]}"#],
    );
    let config = dir.path().join("scoring.yaml");
    Command::cargo_bin("gauge")
        .unwrap()
        .args(["init", "--config"])
        .arg(&config)
        .assert()
        .success();

    Command::cargo_bin("gauge")
        .unwrap()
        .args(["score", "--input"])
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));

    Command::cargo_bin("gauge")
        .unwrap()
        .args(["score", "--input"])
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--force")
        .assert()
        .success();
}
