use std::fs;
use std::path::PathBuf;

use dl_app::config::{load, DlConfig};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn partial_file_keeps_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dl.ron");
    fs::write(
        &path,
        r#"(
            downloader: (base_dir: "/srv/mirror", max_concurrent_jobs: 6),
            aria2: (binary: "/opt/aria2/bin/aria2c", extra_args: ["--check-certificate=false"]),
        )"#,
    )
    .unwrap();

    let config = load(Some(path.as_path())).unwrap();

    let defaults = DlConfig::default();
    assert_eq!(config.downloader.base_dir, PathBuf::from("/srv/mirror"));
    assert_eq!(config.downloader.max_concurrent_jobs, 6);
    assert_eq!(config.downloader.requests_per_job, defaults.downloader.requests_per_job);
    assert_eq!(config.downloader.poll_interval_ms, 300);
    assert_eq!(config.aria2.binary, PathBuf::from("/opt/aria2/bin/aria2c"));
    assert_eq!(config.aria2.extra_args, vec!["--check-certificate=false"]);
    assert_eq!(config.aria2.host, "127.0.0.1");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    assert!(load(Some(temp.path().join("absent.ron").as_path())).is_err());
}

#[test]
fn invalid_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dl.ron");
    fs::write(&path, "(downloader: 12)").unwrap();

    let err = load(Some(path.as_path())).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config"));
}

#[test]
fn saved_config_loads_back() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dl.ron");
    let mut config = DlConfig::default();
    config.downloader.log_prefix = "nightly".into();
    config.aria2.startup_timeout_ms = 9_000;
    let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new()).unwrap();
    fs::write(&path, text).unwrap();

    assert_eq!(load(Some(path.as_path())).unwrap(), config);
}
