//! Tests for `puff keys list/add/rm`.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_list_shows_key_comment_and_scope() {
    let t = Test::with_values(&[(&["-e", "dev"], "A", "1")]);

    let output = t.keys(&["list"]);
    assert_success(&output);
    assert_stdout_contains(&output, "1 key");
    assert_stdout_contains(&output, &t.public);
    assert_stdout_contains(&output, "test key");
    assert_stdout_contains(&output, "base, dev");
}

#[test]
fn test_list_empty_tree() {
    let t = Test::new();
    let output = t.keys(&["list"]);
    assert_success(&output);
    assert_stdout_contains(&output, "no keys");
}

#[test]
fn test_add_key_to_every_document() {
    let t = Test::with_values(&[(DEV_API, "A", "1"), (&["-e", "prod"], "B", "2")]);

    let output = t.keys(&["add", "-k", BOB_PUBLIC_KEY, "-c", "bob laptop"]);
    assert_success(&output);
    assert_stdout_contains(&output, "added");
    assert_stdout_contains(&output, "3 files");

    for path in ["base/shared.yml", "dev/api.yml", "prod/shared.yml"] {
        assert!(t.read(path).contains(BOB_PUBLIC_KEY), "{} not updated", path);
    }
    let ledger = t.read(".sops.yaml");
    assert!(ledger.contains(&format!("# {} (bob laptop)", BOB_PUBLIC_KEY)));

    // values are still readable by the original identity
    assert_eq!(stdout(&t.get_in(DEV_API, "A")).trim(), "1");
}

#[test]
fn test_added_identity_can_decrypt() {
    let t = Test::with_values(&[(&["-e", "dev"], "TOKEN", "shared-secret")]);
    let (secret, public) = keypair();

    assert_success(&t.keys(&["add", "-k", &public]));

    t.cmd_with_key(Some(&secret))
        .args(["get", "-k", "TOKEN", "-e", "dev"])
        .assert()
        .success()
        .stdout("shared-secret\n");
}

#[test]
fn test_add_is_idempotent() {
    let t = Test::init();
    assert_success(&t.keys(&["add", "-k", BOB_PUBLIC_KEY]));

    let output = t.keys(&["add", "-k", BOB_PUBLIC_KEY]);
    assert_success(&output);
    assert_stdout_contains(&output, "already had this key");
    assert_eq!(t.read("base/shared.yml").matches(BOB_PUBLIC_KEY).count(), 1);
}

#[test]
fn test_add_scoped_to_env() {
    let t = Test::with_values(&[(&["-e", "dev"], "A", "1"), (&["-e", "prod"], "B", "2")]);

    assert_success(&t.keys(&["add", "-k", BOB_PUBLIC_KEY, "-e", "dev"]));

    assert!(t.read("dev/shared.yml").contains(BOB_PUBLIC_KEY));
    assert!(!t.read("prod/shared.yml").contains(BOB_PUBLIC_KEY));
    assert!(!t.read("base/shared.yml").contains(BOB_PUBLIC_KEY));
}

#[test]
fn test_add_scoped_to_base() {
    let t = Test::with_values(&[(&["-e", "dev"], "A", "1")]);

    assert_success(&t.keys(&["add", "-k", BOB_PUBLIC_KEY, "-e", "base"]));

    assert!(t.read("base/shared.yml").contains(BOB_PUBLIC_KEY));
    assert!(!t.read("dev/shared.yml").contains(BOB_PUBLIC_KEY));
}

#[test]
fn test_add_invalid_key() {
    let t = Test::init();
    let before = t.read("base/shared.yml");

    let output = t.keys(&["add", "-k", INVALID_PUBLIC_KEY]);
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid age key");
    assert_eq!(t.read("base/shared.yml"), before);
}

#[test]
fn test_add_without_documents() {
    let t = Test::new();
    let output = t.keys(&["add", "-k", BOB_PUBLIC_KEY]);
    assert_failure(&output);
    assert_stderr_contains(&output, "no encrypted files found");
}

#[test]
fn test_new_documents_include_added_key() {
    let t = Test::init();
    assert_success(&t.keys(&["add", "-k", BOB_PUBLIC_KEY]));
    assert_success(&t.set_in(&["-e", "staging"], "A", "1"));

    let text = t.read("staging/shared.yml");
    assert!(text.contains(BOB_PUBLIC_KEY));
    assert!(text.contains(&t.public));
}

#[test]
fn test_rm_key_rotates_documents() {
    let t = Test::with_values(&[(&["-e", "dev"], "A", "1")]);
    assert_success(&t.keys(&["add", "-k", BOB_PUBLIC_KEY, "-c", "bob"]));
    let before = t.read("dev/shared.yml");

    let output = t.keys(&["rm", "-k", BOB_PUBLIC_KEY]);
    assert_success(&output);
    assert_stdout_contains(&output, "removed");

    let after = t.read("dev/shared.yml");
    assert!(!after.contains(BOB_PUBLIC_KEY));
    assert_ne!(before, after);
    assert!(!t.read(".sops.yaml").contains(BOB_PUBLIC_KEY));
    assert_eq!(stdout(&t.get_in(&["-e", "dev"], "A")).trim(), "1");
}

#[test]
fn test_removed_identity_cannot_decrypt() {
    let t = Test::with_values(&[(&[], "TOKEN", "x")]);
    let (secret, public) = keypair();
    assert_success(&t.keys(&["add", "-k", &public]));
    assert_success(&t.keys(&["rm", "-k", &public]));

    t.cmd_with_key(Some(&secret))
        .args(["get", "-k", "TOKEN"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no identity can decrypt"));
}

#[test]
fn test_rm_last_key_refused() {
    let t = Test::init();
    let before = t.read("base/shared.yml");

    let output = t.keys(&["rm", "-k", &t.public]);
    assert_failure(&output);
    assert_stderr_contains(&output, "cannot remove the last key");
    assert_stderr_contains(&output, "base/shared.yml");
    assert_eq!(t.read("base/shared.yml"), before);
    assert!(t.read(".sops.yaml").contains(&t.public));
}

#[test]
fn test_rm_scoped_keeps_ledger_entry_in_use() {
    let t = Test::with_values(&[(&["-e", "dev"], "A", "1")]);
    assert_success(&t.keys(&["add", "-k", BOB_PUBLIC_KEY]));

    assert_success(&t.keys(&["rm", "-k", BOB_PUBLIC_KEY, "-e", "dev"]));

    assert!(!t.read("dev/shared.yml").contains(BOB_PUBLIC_KEY));
    assert!(t.read("base/shared.yml").contains(BOB_PUBLIC_KEY));
    assert!(t.read(".sops.yaml").contains(BOB_PUBLIC_KEY));
}

#[test]
fn test_rm_unknown_key() {
    let t = Test::init();
    let output = t.keys(&["rm", "-k", BOB_PUBLIC_KEY]);
    assert_failure(&output);
    assert_stderr_contains(&output, "key not found");
}
