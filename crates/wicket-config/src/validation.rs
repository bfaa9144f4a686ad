// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-zero intervals, bounded retry counts, and unique module numbers.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::WicketConfig;

/// Highest accepted `notification.max_attempts`.
const MAX_ATTEMPTS_CEILING: u32 = 10;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &WicketConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if config.scheduler.queue_tick_secs == 0 {
        invalid("scheduler.queue_tick_secs must be at least 1".to_string());
    }
    if config.scheduler.delivery_tick_secs == 0 {
        invalid("scheduler.delivery_tick_secs must be at least 1".to_string());
    }

    let attempts = config.notification.max_attempts;
    if attempts == 0 || attempts > MAX_ATTEMPTS_CEILING {
        invalid(format!(
            "notification.max_attempts must be between 1 and {MAX_ATTEMPTS_CEILING}, got {attempts}"
        ));
    }
    if config.notification.transport_timeout_secs == 0 {
        invalid("notification.transport_timeout_secs must be at least 1".to_string());
    }

    if config.queue.promotion_threshold == 0 {
        invalid("queue.promotion_threshold must be at least 1".to_string());
    }
    if config.queue.default_advisor_capacity == 0 {
        invalid("queue.default_advisor_capacity must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    if config.gateway.enabled && config.gateway.host.trim().is_empty() {
        invalid("gateway.host must not be empty".to_string());
    }
    if let Some(token) = &config.gateway.admin_token
        && token.trim().is_empty()
    {
        invalid("gateway.admin_token must not be empty when set".to_string());
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        invalid("telegram.bot_token must not be empty when set".to_string());
    }

    let mut seen_modules = HashSet::new();
    for (i, advisor) in config.advisors.iter().enumerate() {
        if advisor.name.trim().is_empty() {
            invalid(format!("advisors[{i}].name must not be empty"));
        }
        if advisor.capacity == Some(0) {
            invalid(format!("advisors[{i}].capacity must be at least 1"));
        }
        if !seen_modules.insert(advisor.module_number) {
            invalid(format!(
                "duplicate module_number `{}` in [[advisors]] array",
                advisor.module_number
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
