//! Tests for `puff decrypt` and `puff encrypt` working copies.

use crate::support::*;

#[test]
fn test_decrypt_writes_plaintext_working_copy() {
    let t = Test::with_values(&[(&["-e", "dev"], "TOKEN", "abc123")]);

    let output = t
        .cmd()
        .args(["decrypt", "-f", "dev/shared.yml"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "puff encrypt -f dev/shared.dec.yml");
    assert_stderr_contains(&output, "plaintext");

    let text = t.read("dev/shared.dec.yml");
    assert!(text.contains("TOKEN: abc123"));
    assert!(!text.contains("sops"));
    assert!(!text.contains("ENC["));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(t.path("dev/shared.dec.yml"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_edit_cycle() {
    let t = Test::with_values(&[(&["-e", "dev"], "TOKEN", "abc123")]);
    t.cmd()
        .args(["decrypt", "-f", "dev/shared.yml"])
        .assert()
        .success();

    std::fs::write(
        t.path("dev/shared.dec.yml"),
        "TOKEN: rotated\nNEW_KEY: added\n",
    )
    .unwrap();

    let output = t
        .cmd()
        .args(["encrypt", "-f", "dev/shared.dec.yml"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "removed working copy");

    assert!(!t.path("dev/shared.dec.yml").exists());
    assert_file_excludes(&t.path("dev/shared.yml"), "rotated");
    assert_eq!(stdout(&t.get_in(&["-e", "dev"], "TOKEN")).trim(), "rotated");
    assert_eq!(stdout(&t.get_in(&["-e", "dev"], "NEW_KEY")).trim(), "added");
}

#[test]
fn test_encrypt_new_document_uses_tree_recipients() {
    let t = Test::init();
    std::fs::create_dir_all(t.path("qa")).unwrap();
    std::fs::write(t.path("qa/api.dec.yml"), "A: b\n").unwrap();

    t.cmd()
        .args(["encrypt", "-f", "qa/api.dec.yml"])
        .assert()
        .success();

    assert!(t.read("qa/api.yml").contains(&t.public));
    assert_eq!(stdout(&t.get_in(&["-e", "qa", "-a", "api"], "A")).trim(), "b");
}

#[test]
fn test_decrypt_plaintext_document() {
    let t = Test::init();
    std::fs::write(t.path("base/plain.yml"), "A: b\n").unwrap();

    let output = t
        .cmd()
        .args(["decrypt", "-f", "base/plain.yml"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "not encrypted");
}

#[test]
fn test_decrypt_missing_file() {
    let t = Test::init();
    let output = t
        .cmd()
        .args(["decrypt", "-f", "nope/missing.yml"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "file does not exist");
}

#[test]
fn test_encrypt_requires_working_copy_name() {
    let t = Test::init();
    let output = t
        .cmd()
        .args(["encrypt", "-f", "base/shared.yml"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, ".dec extension");
}

#[test]
fn test_encrypt_invalid_yaml_keeps_working_copy() {
    let t = Test::init();
    std::fs::write(t.path("base/shared.dec.yml"), "A: [\n").unwrap();

    let output = t
        .cmd()
        .args(["encrypt", "-f", "base/shared.dec.yml"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert!(t.path("base/shared.dec.yml").exists());
}

#[test]
fn test_working_copies_ignored_by_resolution() {
    let t = Test::with_values(&[(&[], "A", "encrypted")]);
    std::fs::write(t.path("base/shared.dec.yml"), "A: plaintext\n").unwrap();

    assert_eq!(stdout(&t.get("A")).trim(), "encrypted");
    let output = t.keys(&["add", "-k", BOB_PUBLIC_KEY]);
    assert_success(&output);
    assert_eq!(t.read("base/shared.dec.yml"), "A: plaintext\n");
}
