use desk_config::{DeskConfig, ENV_PREFIX};

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &DeskConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &DeskConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();
    let mut warnings = Vec::new();

    if !config.tracker.is_configured() && has_env_prefix(&env_keys, &format!("{ENV_PREFIX}TRACKER")) {
        warnings.push(
            "Tracker DSN is empty while TASKDESK_TRACKER* env vars exist. Use double underscores (example: TASKDESK_TRACKER__DSN). Error reporting stays disabled."
                .to_string(),
        );
    }

    if config.server.bind == desk_config::ServerConfig::default().bind
        && env_keys.iter().any(|key| key == "TASKDESK_SERVER_BIND")
    {
        warnings.push(
            "TASKDESK_SERVER_BIND is ignored. Use double underscores (example: TASKDESK_SERVER__BIND)."
                .to_string(),
        );
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| key.starts_with(prefix))
}
