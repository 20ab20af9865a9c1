use anyhow::Result;
use chat_pairs::QaPair;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// End-to-end tests driving the compiled `chat-pairs` binary.
///
/// Each test writes a small export into a temporary directory, runs a
/// subcommand against it and checks what lands on disk or stdout.
const EXPORT: &str = r#"{
    "name": "Peer",
    "type": "personal_chat",
    "id": 42,
    "messages": [
        {"id": 1, "type": "message", "date": "", "date_unixtime": "1000",
         "from_id": "user42", "text_entities": [{"type": "plain", "text": "hi"}]},
        {"id": 2, "type": "message", "date": "", "date_unixtime": "1002",
         "from_id": "peer", "text_entities": [{"type": "plain", "text": "hello"}]},
        {"id": 3, "type": "message", "date": "", "date_unixtime": "1003",
         "from_id": "peer", "text_entities": [{"type": "plain", "text": "how are you"}]},
        {"id": 4, "type": "message", "date": "", "date_unixtime": "1005",
         "from_id": "user42", "text_entities": [{"type": "plain", "text": "good"}]}
    ]
}"#;

fn chat_pairs(args: &[&str], cwd: &Path) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_chat-pairs"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()?)
}

fn read_csv(path: &Path) -> Result<Vec<QaPair>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    assert_eq!(headers, vec!["question", "answer"]);
    Ok(rdr
        .deserialize::<QaPair>()
        .collect::<std::result::Result<_, _>>()?)
}

#[test]
fn convert_writes_csv_with_defaults() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("result.json"), EXPORT)?;

    let out = chat_pairs(&["convert", "--decay-seconds", "3600"], dir.path())?;
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Text Messages: 4"), "stdout: {stdout}");
    assert!(stdout.contains("Model Messages: 2"), "stdout: {stdout}");

    let pairs = read_csv(&dir.path().join("result.csv"))?;
    assert_eq!(
        pairs,
        vec![
            QaPair::new("", "hi"),
            QaPair::new("how are youhello", "good"),
        ]
    );
    Ok(())
}

#[test]
fn convert_chronological_jsonl_with_config_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("export.json"), EXPORT)?;
    fs::write(
        dir.path().join("pairs.toml"),
        "[pipeline]\nmax_window = 10\nconcat_order = \"chronological\"\n\n[output]\nformat = \"jsonl\"\npath = \"pairs.jsonl\"\n",
    )?;

    let out = chat_pairs(
        &["convert", "-i", "export.json", "--config", "pairs.toml"],
        dir.path(),
    )?;
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let text = fs::read_to_string(dir.path().join("pairs.jsonl"))?;
    let pairs: Vec<QaPair> = text
        .lines()
        .map(serde_json::from_str)
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(pairs[1], QaPair::new("hellohow are you", "good"));
    Ok(())
}

#[test]
fn failed_convert_keeps_previous_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join("result.json"),
        EXPORT.replace("\"date_unixtime\": \"1005\"", "\"date_unixtime\": \"soon\""),
    )?;
    fs::write(dir.path().join("result.csv"), "question,answer\nold,row\n")?;

    let out = chat_pairs(&["convert"], dir.path())?;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Validation error"));
    assert_eq!(
        fs::read_to_string(dir.path().join("result.csv"))?,
        "question,answer\nold,row\n"
    );
    Ok(())
}

#[test]
fn inspect_reports_json() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("result.json"), EXPORT)?;

    let out = chat_pairs(&["inspect", "--json", "--max-window", "2"], dir.path())?;
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(report["chat_id"], 42);
    assert_eq!(report["max_window"], 2);
    assert_eq!(report["stats"]["anchors"], 2);
    assert_eq!(report["stats"]["windows"], 2);
    assert_eq!(report["first_message_at"], "1970-01-01T00:16:40+00:00");
    assert!(!dir.path().join("result.csv").exists());
    Ok(())
}

#[test]
fn convert_preserves_commas_quotes_and_newlines() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let export = EXPORT.replace(
        r#""text": "how are you""#,
        r#""text": "well, \"really\"?"}, {"type": "plain", "text": "tell me""#,
    );
    fs::write(dir.path().join("result.json"), export)?;

    let out = chat_pairs(&["convert", "--decay-seconds", "3600"], dir.path())?;
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let pairs = read_csv(&dir.path().join("result.csv"))?;
    assert_eq!(pairs[1].question, "well, \"really\"?\ntell mehello");
    Ok(())
}
