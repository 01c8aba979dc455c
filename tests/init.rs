use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_codemetry"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "codemetry init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".codemetry.toml");
    assert!(config_path.exists(), ".codemetry.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[analysis]"));
    assert!(content.contains("[keywords]"));
    assert!(content.contains("[ai]"));

    // Verify it's valid TOML that codemetry-core can parse
    let _config: codemetry_core::CodemetryConfig = toml::from_str(&content).unwrap();
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".codemetry.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_codemetry"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
}
