//! Tests for `puff generate` encodings and templates.

use crate::support::*;
use predicates::prelude::*;

fn sample() -> Test {
    Test::with_values(&[
        (&[], "LOG_LEVEL", "info"),
        (&[], "_DB_PASSWORD", "hunter2"),
        (&[], "GREETING", "hello world"),
        (DEV_API, "DATABASE_URL", "postgres://app:${_DB_PASSWORD}@db/app"),
        (DEV_API, "LOG_LEVEL", "debug"),
    ])
}

#[test]
fn test_env_is_default_and_sorted() {
    let t = sample();

    let output = t.generate(DEV_API);
    assert_success(&output);
    assert_eq!(
        stdout(&output),
        "DATABASE_URL=postgres://app:hunter2@db/app\nGREETING=\"hello world\"\nLOG_LEVEL=debug\n"
    );
}

#[test]
fn test_internal_keys_never_rendered() {
    let t = sample();

    for format in ["env", "json", "yaml"] {
        let mut args = DEV_API.to_vec();
        args.extend(["-f", format]);
        let output = t.generate(&args);
        assert_success(&output);
        assert_stdout_excludes(&output, "_DB_PASSWORD");
        assert_stdout_excludes(&output, "_PUFF_INITIALIZED");
    }
}

#[test]
fn test_json_output() {
    let t = sample();

    let output = t.generate(&["-a", "api", "-e", "dev", "-f", "json"]);
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["LOG_LEVEL"], "debug");
    assert_eq!(parsed["DATABASE_URL"], "postgres://app:hunter2@db/app");
    assert!(parsed.get("_DB_PASSWORD").is_none());
}

#[test]
fn test_yaml_output() {
    let t = sample();

    let output = t.generate(&["-f", "yaml"]);
    assert_success(&output);
    let parsed: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["LOG_LEVEL"].as_str(), Some("info"));
    assert_eq!(parsed["GREETING"].as_str(), Some("hello world"));
}

#[test]
fn test_typed_values_keep_their_type() {
    let t = Test::init();
    std::fs::create_dir_all(t.path("dev")).unwrap();
    std::fs::write(
        t.path("dev/shared.yml"),
        "PORT: 8080\nDEBUG: false\nRATIO: 0.5\nHOSTS:\n  - a\n  - b\n",
    )
    .unwrap();

    let output = t.generate(&["-e", "dev", "-f", "json"]);
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["PORT"], 8080);
    assert_eq!(parsed["DEBUG"], false);
    assert_eq!(parsed["RATIO"], 0.5);
    assert_eq!(parsed["HOSTS"], serde_json::json!(["a", "b"]));

    let output = t.generate(&["-e", "dev"]);
    assert_success(&output);
    assert_stdout_contains(&output, "PORT=8080\n");
    assert_stdout_contains(&output, "DEBUG=false\n");
    assert_stdout_contains(&output, "HOSTS=\"[\\\"a\\\",\\\"b\\\"]\"\n");
}

#[test]
fn test_nested_maps_merge_across_tiers() {
    let t = Test::init();
    std::fs::create_dir_all(t.path("dev")).unwrap();
    std::fs::write(
        t.path("base/app.yml"),
        "DB:\n  host: base-host\n  port: 5432\n",
    )
    .unwrap();
    std::fs::write(t.path("dev/app.yml"), "DB:\n  host: dev-host\n").unwrap();

    let output = t.generate(&["-a", "app", "-e", "dev", "-f", "json"]);
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["DB"]["host"], "dev-host");
    assert_eq!(parsed["DB"]["port"], 5432);
}

#[test]
fn test_k8s_requires_secret_name() {
    let t = sample();

    t.cmd()
        .args(["generate", "-f", "k8s"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("secret-name is required"))
        .stderr(predicate::str::contains("--secret-name"));
}

#[test]
fn test_k8s_string_data() {
    let t = sample();

    let output = t.generate(&["-f", "k8s", "--secret-name", "api-config"]);
    assert_success(&output);
    let parsed: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["apiVersion"].as_str(), Some("v1"));
    assert_eq!(parsed["kind"].as_str(), Some("Secret"));
    assert_eq!(parsed["type"].as_str(), Some("Opaque"));
    assert_eq!(parsed["metadata"]["name"].as_str(), Some("api-config"));
    assert_eq!(parsed["stringData"]["LOG_LEVEL"].as_str(), Some("info"));
    assert!(parsed.get("data").is_none());
}

#[test]
fn test_k8s_base64_data() {
    let t = sample();

    let output = t.generate(&["-f", "k8s", "--secret-name", "api", "--base64"]);
    assert_success(&output);
    let parsed: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["data"]["LOG_LEVEL"].as_str(), Some("aW5mbw=="));
    assert!(parsed.get("stringData").is_none());
}

#[test]
fn test_unknown_format() {
    let t = sample();
    let output = t.generate(&["-f", "toml"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown format: toml");
}

#[test]
fn test_output_file() {
    let t = sample();

    let output = t.generate(&["-e", "dev", "-a", "api", "-o", "out.env"]);
    assert_success(&output);
    assert_stdout_contains(&output, "out.env");
    assert_eq!(
        t.read("out.env"),
        "DATABASE_URL=postgres://app:hunter2@db/app\nGREETING=\"hello world\"\nLOG_LEVEL=debug"
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(t.path("out.env")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_settings_file_defaults() {
    let t = sample();
    std::fs::write(
        t.path(".puff.toml"),
        "[generate]\nformat = \"k8s\"\nsecret_name = \"from-settings\"\n",
    )
    .unwrap();

    let output = t.generate(&[]);
    assert_success(&output);
    assert_stdout_contains(&output, "name: from-settings");

    let output = t.generate(&["-f", "env"]);
    assert_success(&output);
    assert_stdout_contains(&output, "LOG_LEVEL=info");

    let output = t.generate(&["--secret-name", "from-flag"]);
    assert_success(&output);
    assert_stdout_contains(&output, "name: from-flag");
}

#[test]
fn test_circular_reference_fails() {
    let t = Test::with_values(&[(&[], "A", "${B}"), (&[], "B", "${A}")]);

    let output = t.generate(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "circular dependency detected");
}

#[test]
fn test_undefined_reference_fails() {
    let t = Test::with_values(&[(&[], "URL", "http://${HOST}/")]);

    let output = t.generate(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "undefined variable referenced: HOST");
}

#[test]
fn test_reference_chain_across_tiers() {
    let t = Test::with_values(&[
        (&[], "_HOST", "db.internal"),
        (&[], "URL", "postgres://${_HOST}:${_PORT}"),
        (&["-e", "prod"], "_PORT", "6432"),
    ]);

    let output = t.generate(&["-e", "prod"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "URL=postgres://db.internal:6432\n");
}
