// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wicket config check` and `wicket config show`.

use wicket_config::WicketConfig;
use wicket_core::WicketError;

const REDACTED: &str = "[redacted]";

/// Prints a one-screen summary of a configuration that already passed
/// validation.
pub fn run_check(config: &WicketConfig) {
    println!("config ok");
    for line in summary(config) {
        println!("  {line}");
    }
}

/// Prints the effective configuration as TOML.
pub fn run_show(config: &WicketConfig) -> Result<(), WicketError> {
    print!("{}", render(config)?);
    Ok(())
}

fn summary(config: &WicketConfig) -> Vec<String> {
    let gateway = if config.gateway.enabled {
        format!("{}:{}", config.gateway.host, config.gateway.port)
    } else {
        "disabled".to_string()
    };
    let admin = if config.gateway.admin_token.is_some() {
        "token set"
    } else {
        "no token, admin routes closed"
    };
    let telegram = if config.telegram.bot_token.is_some() {
        "enabled"
    } else {
        "disabled, notices stay pending"
    };

    vec![
        format!("database: {}", config.storage.database_path),
        format!("gateway: {gateway} ({admin})"),
        format!("telegram: {telegram}"),
        format!(
            "ticks: queue every {}s, delivery every {}s",
            config.scheduler.queue_tick_secs, config.scheduler.delivery_tick_secs
        ),
        format!(
            "delivery: {} attempts, {}s backoff",
            config.notification.max_attempts, config.notification.retry_backoff_secs
        ),
        format!("advisors seeded: {}", config.advisors.len()),
    ]
}

fn render(config: &WicketConfig) -> Result<String, WicketError> {
    let mut shown = config.clone();
    if shown.gateway.admin_token.is_some() {
        shown.gateway.admin_token = Some(REDACTED.into());
    }
    if shown.telegram.bot_token.is_some() {
        shown.telegram.bot_token = Some(REDACTED.into());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| WicketError::Internal(format!("failed to render config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_redacts_secrets() {
        let mut config = WicketConfig::default();
        config.gateway.admin_token = Some("hunter2".into());
        config.telegram.bot_token = Some("123:abc".into());

        let rendered = render(&config).expect("should render");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("123:abc"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("[scheduler]"));
    }

    #[test]
    fn rendered_config_loads_back() {
        let rendered = render(&WicketConfig::default()).expect("should render");
        let loaded = wicket_config::load_and_validate_str(&rendered).expect("should reload");
        assert_eq!(
            loaded.scheduler.queue_tick_secs,
            WicketConfig::default().scheduler.queue_tick_secs
        );
    }

    #[test]
    fn summary_mentions_disabled_transport() {
        let lines = summary(&WicketConfig::default());
        assert!(lines.iter().any(|l| l.contains("telegram: disabled")));
    }
}
