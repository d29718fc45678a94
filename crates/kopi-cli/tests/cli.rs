use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const ORDER: &str = r#"package shop;

public class Order {
    private Customer customer;

    public int total() {
        return customer.discount() + customer.visits;
    }
}
"#;

const CUSTOMER: &str = r#"package shop;

public class Customer {
    public int visits;

    public int discount() {
        return visits > 10 ? 5 : 0;
    }
}
"#;

fn kopi(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kopi"));
    cmd.current_dir(dir.path()).env_remove("KOPI_CONFIG_PATH");
    cmd
}

fn shop() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("src/shop/Order.java").write_str(ORDER).unwrap();
    temp.child("src/shop/Customer.java").write_str(CUSTOMER).unwrap();
    temp
}

#[test]
fn help_mentions_core_commands() {
    let temp = TempDir::new().unwrap();
    kopi(&temp).arg("--help").assert().success().stdout(
        predicate::str::contains("parse")
            .and(predicate::str::contains("diagnostics"))
            .and(predicate::str::contains("tokens")),
    );
}

#[test]
fn diagnostics_json_on_a_clean_project() {
    let temp = shop();
    let output = kopi(&temp)
        .arg("diagnostics")
        .arg("src")
        .arg("--json")
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["summary"]["files"].as_u64(), Some(2));
    assert_eq!(v["summary"]["errors"].as_u64(), Some(0));
    assert!(v["diagnostics"].as_array().unwrap().is_empty());
}

#[test]
fn diagnostics_fail_when_errors_exist() {
    let temp = TempDir::new().unwrap();
    temp.child("Broken.java")
        .write_str("class Broken {\n    int m() { return nope; }\n}\n")
        .unwrap();

    kopi(&temp)
        .arg("diagnostics")
        .arg(".")
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("Broken.java:2:")
                .and(predicate::str::contains(
                    "error[unresolved-identifier] Unresolved identifier: nope",
                ))
                .and(predicate::str::contains("summary: 1 files, 1 errors")),
        );
}

#[test]
fn parse_prints_an_outline() {
    let temp = shop();
    kopi(&temp)
        .arg("parse")
        .arg("src/shop/Order.java")
        .arg("src/shop/Customer.java")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("  package shop")
                .and(predicate::str::contains("  class shop.Order"))
                .and(predicate::str::contains("    field Customer customer"))
                .and(predicate::str::contains("    method int discount()")),
        );
}

#[test]
fn parse_json_lists_types_per_file() {
    let temp = shop();
    let output = kopi(&temp)
        .arg("parse")
        .arg("src/shop/Customer.java")
        .arg("src/shop/Order.java")
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = v["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["types"][0]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["shop.Customer", "shop.Order"]);
}

#[test]
fn tokens_show_resolved_symbols() {
    let temp = TempDir::new().unwrap();
    temp.child("T.java")
        .write_str("class T { int x; int y = x; }")
        .unwrap();

    kopi(&temp)
        .arg("tokens")
        .arg("T.java")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"x\" -> Field T#x")
                .and(predicate::str::contains("Whitespace").not()),
        );
}

#[test]
fn explicit_config_can_skip_bodies() {
    let temp = TempDir::new().unwrap();
    temp.child("Broken.java")
        .write_str("class Broken { int m() { return nope; } }")
        .unwrap();
    temp.child("ci.toml")
        .write_str("[parse]\nparse_bodies = false\n")
        .unwrap();

    kopi(&temp)
        .arg("--config")
        .arg("ci.toml")
        .arg("diagnostics")
        .arg("Broken.java")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 errors"));
}

#[test]
fn workspace_config_is_discovered() {
    let temp = TempDir::new().unwrap();
    temp.child("Broken.java")
        .write_str("class Broken { int m() { return nope; } }")
        .unwrap();
    temp.child("kopi.toml")
        .write_str("[parse]\nparse_bodies = false\n")
        .unwrap();

    kopi(&temp).arg("diagnostics").arg(".").assert().success();
}

#[test]
fn invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    temp.child("kopi.toml").write_str("[parse]\nbodies = 1\n").unwrap();
    temp.child("A.java").write_str("class A {}").unwrap();

    kopi(&temp)
        .arg("diagnostics")
        .arg(".")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse toml config"));
}

#[test]
fn missing_files_are_reported() {
    let temp = TempDir::new().unwrap();
    kopi(&temp)
        .arg("parse")
        .arg("Nope.java")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read Nope.java"));
}
