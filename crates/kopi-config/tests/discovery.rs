use std::ffi::OsString;
use std::sync::Mutex;

use kopi_config::{discover_config_path, load_for_workspace, KopiConfig, KOPI_CONFIG_ENV_VAR};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &std::path::Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn missing_config_falls_back_to_defaults() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(KOPI_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    let (config, path) = load_for_workspace(dir.path()).unwrap();
    assert_eq!(config, KopiConfig::default());
    assert_eq!(path, None);
}

#[test]
fn kopi_toml_wins_over_hidden_file() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(KOPI_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(".kopi.toml"), "[logging]\nlevel = \"warn\"\n").unwrap();
    assert_eq!(
        discover_config_path(dir.path()),
        Some(dir.path().join(".kopi.toml"))
    );

    std::fs::write(dir.path().join("kopi.toml"), "[logging]\nlevel = \"debug\"\n").unwrap();
    let (config, path) = load_for_workspace(dir.path()).unwrap();
    assert_eq!(path, Some(dir.path().join("kopi.toml")));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn env_override_is_relative_to_the_workspace() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("kopi.toml"), "[parse]\nparse_bodies = true\n").unwrap();
    std::fs::write(dir.path().join("ci.toml"), "[parse]\nparse_bodies = false\n").unwrap();
    let _env = EnvVarGuard::set(KOPI_CONFIG_ENV_VAR, std::path::Path::new("ci.toml"));

    let (config, path) = load_for_workspace(dir.path()).unwrap();
    assert_eq!(path, Some(dir.path().join("ci.toml")));
    assert!(!config.parse.parse_bodies);
}

#[test]
fn broken_config_is_an_error() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(KOPI_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("kopi.toml"), "[parse\n").unwrap();
    let err = load_for_workspace(dir.path()).unwrap_err();
    assert!(err.to_string().starts_with("failed to parse toml config"), "{err}");
}
