// tests/config_loading.rs

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use liveglob::config::{ConfigFile, RawConfigFile, load_and_validate, load_from_path};
use liveglob::errors::LiveGlobError;
use liveglob::{Delimiter, ProviderKind};

fn write_config(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn full_config_round_trips_into_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "LiveGlob.toml",
        r#"
patterns = ["src/**/*.rs", "!src/generated/**"]
absolute = true
delimiter = "posix"
initial_state_considered_dirty = true

[provider]
kind = "poll"
interval_ms = 250
"#,
    );

    let config = load_and_validate(&path).unwrap();
    assert_eq!(config.patterns(), ["src/**/*.rs", "!src/generated/**"]);

    let options = config.options();
    assert!(options.absolute);
    assert_eq!(options.delimiter, Delimiter::Posix);
    assert!(options.initial_state_considered_dirty);
    assert_eq!(options.provider, ProviderKind::Poll { interval_ms: 250 });
    assert_eq!(options.cwd, None);
}

#[test]
fn omitted_fields_use_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "LiveGlob.toml", r#"patterns = ["*.txt"]"#);

    let config = load_and_validate(&path).unwrap();
    let options = config.options();
    assert!(!options.absolute);
    assert_eq!(options.delimiter, Delimiter::Native);
    assert!(!options.initial_state_considered_dirty);
    assert_eq!(options.provider, ProviderKind::Native);
}

#[test]
fn poll_interval_defaults_when_omitted() {
    let raw: RawConfigFile = toml::from_str(
        r#"
patterns = ["*"]
[provider]
kind = "poll"
"#,
    )
    .unwrap();
    assert_eq!(raw.provider, ProviderKind::Poll { interval_ms: 500 });
}

#[test]
fn relative_cwd_is_resolved_against_the_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "configs/LiveGlob.toml",
        r#"
patterns = ["*.txt"]
cwd = "../project"
"#,
    );

    let config = load_and_validate(&path).unwrap();
    let cwd = config.options().cwd.clone().unwrap();
    assert!(cwd.is_absolute());
    assert!(cwd.ends_with(Path::new("project")));
    assert!(cwd.starts_with(dir.path()));
    assert!(!cwd.components().any(|c| c.as_os_str() == ".."));
}

#[test]
fn missing_patterns_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "LiveGlob.toml", "absolute = true\n");

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, LiveGlobError::Config(_)));
}

#[test]
fn negation_only_patterns_are_rejected() {
    let raw = RawConfigFile {
        patterns: vec!["!target/**".to_string()],
        ..RawConfigFile::default()
    };
    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, LiveGlobError::Config(_)));
}

#[test]
fn invalid_patterns_are_rejected() {
    let raw = RawConfigFile {
        patterns: vec!["src/[a".to_string()],
        ..RawConfigFile::default()
    };
    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, LiveGlobError::InvalidPattern { .. }));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let raw = RawConfigFile {
        patterns: vec!["*".to_string()],
        provider: ProviderKind::Poll { interval_ms: 0 },
        ..RawConfigFile::default()
    };
    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("interval_ms"));
}

#[test]
fn malformed_toml_surfaces_a_toml_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "LiveGlob.toml", "patterns = [\"*\"\n");

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, LiveGlobError::Toml(_)));
}

#[test]
fn unknown_delimiter_is_a_toml_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "LiveGlob.toml",
        "patterns = [\"*\"]\ndelimiter = \"backslash\"\n",
    );

    assert!(matches!(
        load_from_path(&path).unwrap_err(),
        LiveGlobError::Toml(_)
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, LiveGlobError::Io(_)));
}

#[test]
fn delimiter_parses_from_cli_text() {
    assert_eq!("posix".parse::<Delimiter>(), Ok(Delimiter::Posix));
    assert_eq!(" Native ".parse::<Delimiter>(), Ok(Delimiter::Native));
    assert!("dos".parse::<Delimiter>().is_err());
}
