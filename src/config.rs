//! Agent configuration, loaded from the environment once at startup.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default seconds between processing cycles.
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Pause between leads within one cycle (bounds gateway request rate).
const INTER_LEAD_DELAY_SECS: u64 = 3;

/// Backoff after a cycle-level failure, instead of the normal interval.
const ERROR_BACKOFF_SECS: u64 = 10;

/// Timeout for each outbound HTTP call (inference provider and gateway).
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default inference model.
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default messaging gateway base URL (the site that owns the WhatsApp send API).
const DEFAULT_GATEWAY_URL: &str = "https://modelo-site-imob.vercel.app";

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Inference provider credential.
    pub anthropic_api_key: SecretString,
    /// Inference model id.
    pub model: String,
    /// Lead store path (libsql local database).
    pub database_url: String,
    /// Messaging gateway base URL.
    pub gateway_url: String,
    /// Bearer credential for the messaging gateway.
    pub gateway_token: SecretString,
    /// Interval between processing cycles.
    pub check_interval: Duration,
    /// Pause between leads within a cycle.
    pub inter_lead_delay: Duration,
    /// Pause after a failed cycle.
    pub error_backoff: Duration,
    /// Timeout applied to each outbound HTTP request.
    pub http_timeout: Duration,
}

impl AgentConfig {
    /// Load configuration from the environment.
    ///
    /// `ANTHROPIC_API_KEY` and `DATABASE_URL` are required; their absence is
    /// a fatal startup error. Everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let anthropic_api_key = require_env("ANTHROPIC_API_KEY")?;
        let database_url = require_env("DATABASE_URL")?;

        let check_interval_secs = match std::env::var("LEAD_CHECK_INTERVAL_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "LEAD_CHECK_INTERVAL_SECS".into(),
                message: format!("expected seconds as an integer, got '{raw}'"),
            })?,
            Err(_) => DEFAULT_CHECK_INTERVAL_SECS,
        };

        Ok(Self {
            anthropic_api_key: SecretString::from(anthropic_api_key),
            model: std::env::var("LEAD_AGENT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            database_url,
            gateway_url: std::env::var("GATEWAY_URL")
                .unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string()),
            gateway_token: SecretString::from(
                std::env::var("GATEWAY_TOKEN").unwrap_or_default(),
            ),
            check_interval: Duration::from_secs(check_interval_secs),
            inter_lead_delay: Duration::from_secs(INTER_LEAD_DELAY_SECS),
            error_backoff: Duration::from_secs(ERROR_BACKOFF_SECS),
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; they run under a lock so parallel
    // test threads don't race on the same variables.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn clear_agent_env() {
        for key in [
            "ANTHROPIC_API_KEY",
            "DATABASE_URL",
            "LEAD_CHECK_INTERVAL_SECS",
            "GATEWAY_URL",
            "GATEWAY_TOKEN",
            "LEAD_AGENT_MODEL",
        ] {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_agent_env();
        unsafe { std::env::set_var("DATABASE_URL", "./data/leads.db") };

        let err = AgentConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn missing_database_url_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_agent_env();
        unsafe { std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-test") };

        let err = AgentConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn defaults_applied() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_agent_env();
        unsafe {
            std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-test");
            std::env::set_var("DATABASE_URL", "./data/leads.db");
        }

        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.check_interval, Duration::from_secs(60));
        assert_eq!(config.inter_lead_delay, Duration::from_secs(3));
        assert_eq!(config.error_backoff, Duration::from_secs(10));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
    }

    #[test]
    fn interval_override_parsed() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_agent_env();
        unsafe {
            std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-test");
            std::env::set_var("DATABASE_URL", "./data/leads.db");
            std::env::set_var("LEAD_CHECK_INTERVAL_SECS", "120");
        }

        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.check_interval, Duration::from_secs(120));
    }

    #[test]
    fn invalid_interval_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_agent_env();
        unsafe {
            std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-test");
            std::env::set_var("DATABASE_URL", "./data/leads.db");
            std::env::set_var("LEAD_CHECK_INTERVAL_SECS", "soon");
        }

        assert!(AgentConfig::from_env().is_err());
    }

    #[test]
    fn blank_required_value_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_agent_env();
        unsafe {
            std::env::set_var("ANTHROPIC_API_KEY", "   ");
            std::env::set_var("DATABASE_URL", "./data/leads.db");
        }

        assert!(AgentConfig::from_env().is_err());
    }
}
