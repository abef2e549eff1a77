use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_prism"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "prism init failed: {}", String::from_utf8_lossy(&output.stderr));

    let config_path = dir.path().join(".prism.toml");
    assert!(config_path.exists(), ".prism.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[vertex]"));
    assert!(content.contains("[review]"));

    // Every option is commented out, so the template parses to the defaults
    let config: prism_core::PrismConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.vertex.model, "gemini-2.5-flash");
    assert_eq!(config.review.max_file_chars, 25_000);
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".prism.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_prism"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
}
