use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `docflow` isolated from the user's config directory.
fn docflow(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docflow").unwrap();
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

/// Config file routing results into `dir`.
fn write_config(dir: &Path) -> String {
    let path = dir.join("docflow.json");
    let config = serde_json::json!({
        "storage": {
            "processed_dir": dir.join("processed"),
            "failed_dir": dir.join("failed"),
        }
    });
    fs::write(&path, config.to_string()).unwrap();
    path.display().to_string()
}

#[test]
fn process_text_invoice_as_json() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("march.txt");
    fs::write(
        &input,
        "Invoice # INV-0042\nInvoice Date: 2024-03-01\nAmount Due: $1,234.56\n",
    )
    .unwrap();
    let config = write_config(dir.path());

    let output = docflow(dir.path())
        .args(["-c", &config, "process"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["doc_type"], "invoice");
    assert_eq!(record["status"], "processed");
    assert_eq!(record["extracted_data"]["invoice_number"], "INV-0042");
    assert_eq!(record["extracted_data"]["total"], 1234.56);
    assert_eq!(record["pipeline_steps"].as_array().unwrap().len(), 5);
    assert!(dir.path().join("processed/march_result.json").exists());
}

#[test]
fn process_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    docflow(dir.path())
        .args(["-c", &config, "process"])
        .arg(dir.path().join("nope.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));

    assert!(dir.path().join("failed/nope_error.json").exists());
}

#[test]
fn process_text_format_with_steps() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("note.txt");
    fs::write(&input, "Dear team,\nplease find the report attached.\nRegards").unwrap();
    let config = write_config(dir.path());

    docflow(dir.path())
        .args(["-c", &config, "process", "--format", "text", "--show-steps"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Type: letter"))
        .stderr(predicate::str::contains("classify"));
}

#[test]
fn classify_text() {
    let dir = TempDir::new().unwrap();

    docflow(dir.path())
        .args(["classify", "--text", "invoice amount due invoice number", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"label\": \"invoice\""))
        .stdout(predicate::str::contains("\"tier\": \"content\""));
}

#[test]
fn classify_falls_back_to_extension() {
    let dir = TempDir::new().unwrap();

    docflow(dir.path())
        .args(["classify", "--text", "", "--file-type", ".xlsx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spreadsheet"));
}

#[test]
fn batch_with_summary_and_metrics() {
    let dir = TempDir::new().unwrap();
    let inbox = dir.path().join("inbox");
    fs::create_dir_all(&inbox).unwrap();
    fs::write(inbox.join("a.txt"), "Invoice # A-100\nTotal: $10.00\nbill").unwrap();
    fs::write(inbox.join("b.txt"), "Patient: John\nDiagnosis: flu\nTreatment: rest").unwrap();
    fs::write(inbox.join("c.bin"), [0u8, 1, 2]).unwrap();
    let out = dir.path().join("out");

    docflow(dir.path())
        .args(["batch", "-j", "2", "--types", ".txt", "--summary", "--metrics", "-o"])
        .arg(&out)
        .arg(format!("{}/*", inbox.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 files"))
        .stdout(predicate::str::contains("Pipeline metrics"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("file,status,doc_type,steps,error"));
    assert!(summary.contains("invoice"));
    assert!(summary.contains("medical_record"));

    let metrics: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("metrics.json")).unwrap()).unwrap();
    assert_eq!(metrics[0]["name"], "inspect");
    assert_eq!(metrics[0]["success_count"], 2);
    assert!(out.join("processed/a_result.json").exists());
    assert!(out.join("processed/b_result.json").exists());
}

#[test]
fn batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();

    docflow(dir.path())
        .arg("batch")
        .arg(format!("{}/*.pdf", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn config_init_get_set() {
    let dir = TempDir::new().unwrap();

    docflow(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    docflow(dir.path())
        .args(["config", "set", "pipeline.workers", "8"])
        .assert()
        .success();

    docflow(dir.path())
        .args(["config", "get", "pipeline.workers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8"));

    docflow(dir.path())
        .args(["config", "set", "pipeline.workers", "0"])
        .assert()
        .failure();

    docflow(dir.path())
        .args(["config", "get", "pipeline.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn config_commands_honour_config_flag() {
    let dir = TempDir::new().unwrap();
    let custom = dir.path().join("team.json");
    let custom = custom.to_str().unwrap();

    docflow(dir.path())
        .args(["-c", custom, "config", "init"])
        .assert()
        .success();
    assert!(dir.path().join("team.json").exists());

    docflow(dir.path())
        .args(["-c", custom, "config", "set", "pipeline.workers", "3"])
        .assert()
        .success();

    docflow(dir.path())
        .args(["-c", custom, "config", "get", "pipeline.workers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));

    docflow(dir.path())
        .args(["-c", custom, "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("team.json"));

    // The user config file was never touched.
    docflow(dir.path())
        .args(["config", "get", "pipeline.workers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4"));
}
