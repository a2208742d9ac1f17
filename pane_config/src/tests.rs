use crate::{
    env_flag, env_parse, env_w_default, env_wo_default, flag_from_str,
    PaneConfig, DEFAULT_LOADING_SPINNER,
};

#[test]
fn flag_from_str_test() {
    assert!(flag_from_str("true").unwrap());
    assert!(flag_from_str("TRUE").unwrap());
    assert!(flag_from_str("1").unwrap());
    assert!(flag_from_str(" yes ").unwrap());
    assert!(!flag_from_str("false").unwrap());
    assert!(!flag_from_str("Off").unwrap());
    assert!(flag_from_str("maybe").is_err());
    assert!(flag_from_str("").is_err());
}

#[test]
fn env_w_default_test() {
    temp_env::with_var("PANE_CONFIG_ENV_TEST", Some("custom"), || {
        assert_eq!(
            env_w_default("PANE_CONFIG_ENV_TEST", "default").unwrap(),
            String::from("custom")
        );
    });

    temp_env::with_var_unset("PANE_CONFIG_ENV_TEST", || {
        assert_eq!(
            env_w_default("PANE_CONFIG_ENV_TEST", "default").unwrap(),
            String::from("default")
        );
    });
}

#[test]
fn env_wo_default_test() {
    temp_env::with_var("PANE_CONFIG_ENV_TEST", Some("custom"), || {
        assert_eq!(
            env_wo_default("PANE_CONFIG_ENV_TEST").unwrap(),
            Some(String::from("custom"))
        );
    });

    temp_env::with_var_unset("PANE_CONFIG_ENV_TEST", || {
        assert_eq!(env_wo_default("PANE_CONFIG_ENV_TEST").unwrap(), None);
    });
}

#[test]
fn env_parse_test() {
    temp_env::with_var("PANE_CONFIG_PARSE_TEST", Some(" 42 "), || {
        assert_eq!(env_parse("PANE_CONFIG_PARSE_TEST", 7usize).unwrap(), 42);
    });
    temp_env::with_var("PANE_CONFIG_PARSE_TEST", Some("many"), || {
        assert!(env_parse("PANE_CONFIG_PARSE_TEST", 7usize).is_err());
    });
    temp_env::with_var_unset("PANE_CONFIG_PARSE_TEST", || {
        assert_eq!(env_parse("PANE_CONFIG_PARSE_TEST", 7usize).unwrap(), 7);
    });
}

#[test]
fn env_flag_rejects_garbage() {
    temp_env::with_var("PANE_CONFIG_FLAG_TEST", Some("sometimes"), || {
        assert!(env_flag("PANE_CONFIG_FLAG_TEST", false).is_err());
    });
}

#[test]
fn try_from_env_test() {
    let config = temp_env::with_vars(
        [
            ("PANE_STRICT", Some("true")),
            ("PANE_LOADING_SPINNER", Some("pn-dots")),
            ("PANE_DOC_BUILD", Some("1")),
            ("PANE_MAX_STATES", Some("50")),
            ("PANE_MAX_OPTS", Some("5")),
        ],
        || PaneConfig::try_from_env().unwrap(),
    );

    assert!(config.strict);
    assert_eq!(config.loading_spinner, "pn-dots");
    assert!(config.doc_build);
    assert_eq!(config.embed.max_states, 50);
    assert_eq!(config.embed.max_opts, 5);
    assert!(config.embed.progress);
}

#[test]
fn defaults() {
    let config = PaneConfig::default();
    assert!(!config.strict);
    assert!(!config.doc_build);
    assert_eq!(config.loading_spinner, DEFAULT_LOADING_SPINNER);
    assert_eq!(config.embed.max_states, 1000);
    assert_eq!(config.embed.max_opts, 3);
    assert!(!config.embed.json);
    assert_eq!(config.embed.load_path, None);
}
