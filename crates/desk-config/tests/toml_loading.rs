//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed files, working directory, and env vars.

use desk_config::DeskConfig;
use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};

#[test]
fn loads_all_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[general]
debug = true
env = "staging"
app_name = "taskdesk-staging"

[tracker]
dsn = "https://key@errors.example.com/12"
timeout_secs = 2

[server]
bind = "0.0.0.0:9090"
"#,
        )?;

        let config: DeskConfig = Figment::from(Serialized::defaults(DeskConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert!(config.general.debug);
        assert_eq!(config.general.env, "staging");
        assert_eq!(config.general.app_name, "taskdesk-staging");
        assert_eq!(config.tracker.dsn, "https://key@errors.example.com/12");
        assert_eq!(config.tracker.timeout_secs, 2);
        assert!(config.tracker.is_configured());
        assert_eq!(config.server.socket_addr().unwrap().port(), 9090);
        Ok(())
    });
}

#[test]
fn partial_toml_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[tracker]
app_name = "api"
"#,
        )?;

        let config: DeskConfig = Figment::from(Serialized::defaults(DeskConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert!(!config.general.debug);
        assert_eq!(config.general.env, "local");
        assert!(!config.tracker.is_configured());
        assert_eq!(config.tracker.timeout_secs, 5);
        assert_eq!(config.tracker_app_name(), "api");
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up_by_load() {
    Jail::expect_with(|jail| {
        std::fs::create_dir(jail.directory().join(".taskdesk")).expect("create .taskdesk");
        jail.create_file(
            ".taskdesk/config.toml",
            r#"
[general]
env = "project"
"#,
        )?;

        let config = DeskConfig::load().expect("config loads");
        assert_eq!(config.general.env, "project");
        Ok(())
    });
}

#[test]
fn malformed_toml_is_an_error() {
    Jail::expect_with(|jail| {
        std::fs::create_dir(jail.directory().join(".taskdesk")).expect("create .taskdesk");
        jail.create_file(".taskdesk/config.toml", "[general\ndebug = ")?;

        assert!(DeskConfig::load().is_err());
        Ok(())
    });
}
