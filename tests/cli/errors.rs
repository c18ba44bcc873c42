//! Error paths, hints and on-disk hygiene.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_no_identity_hint() {
    let t = Test::with_values(&[(&[], "A", "1")]);

    t.cmd_with_key(None)
        .args(["get", "-k", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no identity can decrypt"))
        .stderr(predicate::str::contains("PUFF_AGE_KEY_FILE"));
}

#[test]
fn test_identity_from_key_file() {
    let t = Test::with_values(&[(&[], "A", "1")]);
    let key_file = t.home.path().join("keys.txt");
    std::fs::write(&key_file, format!("# test\n{}\n", t.secret)).unwrap();

    t.cmd_with_key(None)
        .env("PUFF_AGE_KEY_FILE", &key_file)
        .args(["get", "-k", "A"])
        .assert()
        .success()
        .stdout("1\n");
}

#[cfg(target_os = "linux")]
#[test]
fn test_identity_from_default_location() {
    let t = Test::with_values(&[(&[], "A", "1")]);
    let dir = t.home.path().join(".config/sops/age");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("keys.txt"), format!("{}\n", t.secret)).unwrap();

    t.cmd_with_key(None)
        .args(["get", "-k", "A"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_invalid_identity_rejected() {
    let t = Test::init();
    t.cmd_with_key(Some("AGE-SECRET-KEY-NOPE"))
        .args(["get", "-k", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid identity"));
}

#[test]
fn test_malformed_yaml_names_file() {
    let t = Test::init();
    std::fs::create_dir_all(t.path("dev")).unwrap();
    std::fs::write(t.path("dev/shared.yml"), "A: [unclosed\n").unwrap();

    let output = t.get_in(&["-e", "dev"], "A");
    assert_failure(&output);
    assert_stderr_contains(&output, "error parsing YAML");
    assert_stderr_contains(&output, "dev/shared.yml");
}

#[test]
fn test_non_mapping_document_rejected() {
    let t = Test::init();
    std::fs::write(t.path("base/api.yml"), "- a\n- b\n").unwrap();

    let output = t.get_in(&["-a", "api"], "A");
    assert_failure(&output);
    assert_stderr_contains(&output, "base/api.yml");
}

#[test]
fn test_empty_document_is_empty_layer() {
    let t = Test::with_values(&[(&[], "A", "1")]);
    std::fs::create_dir_all(t.path("dev")).unwrap();
    std::fs::write(t.path("dev/shared.yml"), "# nothing yet\n").unwrap();

    assert_eq!(stdout(&t.get_in(&["-e", "dev"], "A")).trim(), "1");
}

#[test]
fn test_tampered_value_rejected() {
    let t = Test::with_values(&[(&[], "A", "1")]);
    let text = t.read("base/shared.yml");
    let tampered = text.replacen("ENC[AES256_GCM,data:", "ENC[AES256_GCM,data:AAAA", 1);
    std::fs::write(t.path("base/shared.yml"), tampered).unwrap();

    assert_failure(&t.get("A"));
}

#[test]
fn test_plaintext_injected_into_encrypted_document() {
    let t = Test::with_values(&[(&[], "A", "1")]);
    let text = t.read("base/shared.yml");
    std::fs::write(t.path("base/shared.yml"), format!("INJECTED: evil\n{}", text)).unwrap();

    let output = t.get("A");
    assert_failure(&output);
    assert_stderr_contains(&output, "not encrypted");
}

#[test]
fn test_invalid_settings_file() {
    let t = Test::init();
    std::fs::write(t.path(".puff.toml"), "[generate\n").unwrap();

    let output = t.get("_PUFF_INITIALIZED");
    assert_failure(&output);
    assert_stderr_contains(&output, ".puff.toml");
}

#[test]
fn test_generated_output_has_no_metadata() {
    let t = Test::with_values(&[(&[], "A", "1")]);

    for format in ["env", "json", "yaml"] {
        let output = t.generate(&["-f", format]);
        assert_success(&output);
        assert_stdout_excludes(&output, "sops");
        assert_stdout_excludes(&output, "ENC[");
    }
}

#[cfg(unix)]
#[test]
fn test_written_files_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::with_values(&[(DEV_API, "A", "1")]);
    for path in [".sops.yaml", "base/shared.yml", "dev/api.yml"] {
        let mode = std::fs::metadata(t.path(path)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "{} has mode {:o}", path, mode);
    }
}

#[test]
fn test_unknown_command() {
    let t = Test::new();
    t.cmd().arg("frobnicate").assert().failure();
}
