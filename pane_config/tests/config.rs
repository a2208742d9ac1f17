use pane_config::{
    errors::PaneConfigError, get_config_from_file, get_config_from_str,
    get_configuration, EmbedOptions, PaneConfig,
};
use std::{fs::File, io::Write, path::Path, path::PathBuf};
use tempfile::NamedTempFile;

const PANE_TOML_CONTENT_OK: &str = r#"
[package]
name = "dashboard"

[pane]
strict = true
loading-spinner = "pn-bar"

[pane.embed]
max-states = 12
max-opts = 4
json = true
load-path = "https://cdn.example.com/states"
"#;

const PANE_TOML_CONTENT_ERR: &str = r#"
[pane]
- invalid toml -
"#;

const PANE_TOML_CONTENT_MISSING: &str = r#"
[package]
name = "dashboard"
"#;

const ENV_VARS: [&str; 5] = [
    "PANE_STRICT",
    "PANE_LOADING_SPINNER",
    "PANE_DOC_BUILD",
    "PANE_MAX_STATES",
    "PANE_MAX_OPTS",
];

fn write_tmp(content: &str) -> NamedTempFile {
    let tmp = NamedTempFile::new().unwrap();
    {
        let mut output = File::create(&tmp).unwrap();
        write!(output, "{content}").unwrap();
    }
    tmp
}

#[test]
fn get_configuration_from_file_ok() {
    let tmp = write_tmp(PANE_TOML_CONTENT_OK);
    let path: &Path = tmp.as_ref();
    let path_s = path.to_string_lossy().to_string();

    let config = temp_env::with_vars_unset(ENV_VARS, || {
        get_configuration(Some(&path_s)).unwrap()
    });

    assert!(config.strict);
    assert_eq!(config.loading_spinner, "pn-bar");
    assert!(!config.doc_build);
    assert_eq!(config.embed.max_states, 12);
    assert_eq!(config.embed.max_opts, 4);
    assert!(config.embed.json);
    assert_eq!(
        config.embed.load_path.as_deref(),
        Some("https://cdn.example.com/states")
    );
    assert_eq!(config.embed.save_path, PathBuf::from("./"));
}

#[test]
fn get_configuration_from_invalid_file() {
    let tmp = write_tmp(PANE_TOML_CONTENT_ERR);
    assert!(get_config_from_file(&tmp).is_err());
}

#[test]
fn get_configuration_without_section() {
    let tmp = write_tmp(PANE_TOML_CONTENT_MISSING);
    assert!(matches!(
        get_config_from_file(&tmp),
        Err(PaneConfigError::ConfigSectionNotFound)
    ));
}

#[test]
fn get_configuration_from_empty_file() {
    let tmp = write_tmp("");
    assert!(get_config_from_file(&tmp).is_err());
}

#[test]
fn get_configuration_from_missing_file() {
    assert!(matches!(
        get_config_from_file("/definitely/not/here/pane.toml"),
        Err(PaneConfigError::ConfigNotFound)
    ));
}

#[test]
fn env_overrides_file() {
    let config = temp_env::with_vars(
        [("PANE_LOADING_SPINNER", Some("pn-petal"))],
        || get_config_from_str(PANE_TOML_CONTENT_OK).unwrap(),
    );
    assert_eq!(config.loading_spinner, "pn-petal");
    assert!(config.strict);
}

#[test]
fn get_configuration_from_env() {
    let config = temp_env::with_vars(
        [("PANE_DOC_BUILD", Some("true")), ("PANE_MAX_STATES", Some("9"))],
        || get_configuration(None).unwrap(),
    );
    assert!(config.doc_build);
    assert_eq!(config.embed.max_states, 9);

    let config =
        temp_env::with_vars_unset(ENV_VARS, || get_configuration(None).unwrap());
    assert_eq!(config, PaneConfig::default());
}

#[test]
fn builder_matches_defaults() {
    let options = EmbedOptions::builder()
        .max_states(10)
        .json(true)
        .json_prefix("app")
        .load_path("/static/states")
        .build();
    assert_eq!(options.max_states, 10);
    assert_eq!(options.max_opts, 3);
    assert_eq!(options.json_prefix, "app");
    assert_eq!(options.load_path.as_deref(), Some("/static/states"));
    assert!(options.progress);
}
