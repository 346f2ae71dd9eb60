use std::time::Duration;
use std::{env, fs};

use tagsync_config::{ConfigError, load_config};
use tagsync_core::ChangeMode;

#[test]
fn config_file_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("tagsync.toml");

    let toml_content = r#"
[retry]
window_secs = 90
initial_delay_ms = 250
max_delay_ms = 4000

[services.ec2]
not_found_codes = [".NotFound"]
retry_window_secs = 600

[services.dynamodb-global]
not_found_codes = ["ResourceNotFoundException"]
change_mode = "delete_before_recreate"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(Some(&path)).expect("should parse config");
    assert_eq!(cfg.retry.window(), Duration::from_secs(90));
    assert_eq!(cfg.retry.initial_delay(), Duration::from_millis(250));

    let ec2 = cfg.service("ec2").expect("ec2 profile");
    assert_eq!(cfg.retry_window(&ec2), Duration::from_secs(600));

    let global = cfg.service("dynamodb-global").expect("custom profile");
    assert_eq!(global.change_mode, ChangeMode::DeleteBeforeRecreate);
    assert_eq!(global.reserved_patterns, vec!["^aws:".to_string()]);

    // built-ins are still reachable next to configured services
    assert!(cfg.service("elasticbeanstalk").is_some());

    // 2) Env override should win over file
    unsafe {
        env::set_var("TAGSYNC__RETRY__WINDOW_SECS", "45");
    }
    let cfg_env = load_config(Some(&path)).expect("should parse config with env overrides");
    assert_eq!(cfg_env.retry.window_secs, 45);
    unsafe {
        env::remove_var("TAGSYNC__RETRY__WINDOW_SECS");
    }

    // 3) Invalid config (initial delay above max) should error
    let invalid_path = dir.path().join("invalid.toml");
    fs::write(
        &invalid_path,
        "[retry]\ninitial_delay_ms = 20000\nmax_delay_ms = 1000\n",
    )
    .expect("write invalid toml");
    let err = load_config(Some(&invalid_path)).expect_err("expected validation error");
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("initial_delay_ms must be <="));

    // 4) An explicit path that does not exist is reported
    let missing = dir.path().join("missing.toml");
    let err = load_config(Some(&missing)).expect_err("expected missing file error");
    assert!(matches!(err, ConfigError::Io(_)));
}
