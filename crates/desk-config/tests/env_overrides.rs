use desk_config::DeskConfig;
use figment::Jail;

#[test]
fn env_vars_fill_nested_sections() {
    Jail::expect_with(|jail| {
        jail.set_env("TASKDESK_GENERAL__DEBUG", "true");
        jail.set_env("TASKDESK_TRACKER__DSN", "https://k@errors.example.com/1");

        let config = DeskConfig::load().expect("config loads");
        assert!(config.general.debug);
        assert!(config.tracker.is_configured());
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        std::fs::create_dir(jail.directory().join(".taskdesk")).expect("create .taskdesk");
        jail.create_file(
            ".taskdesk/config.toml",
            r#"
[general]
env = "from-file"
"#,
        )?;
        jail.set_env("TASKDESK_GENERAL__ENV", "from-env");

        let config = DeskConfig::load().expect("config loads");
        assert_eq!(config.general.env, "from-env");
        Ok(())
    });
}
