//! Service configuration
//!
//! Listener settings come from `CAMPUS_*` environment variables through the
//! `config` crate. Chat provider settings keep the provider's own variable
//! names so existing deployments can reuse their secrets.

use anyhow::Result;
use serde::Deserialize;
use std::env;

const DEFAULT_CHAT_MODEL: &str = "qwen/qwen-2.5-7b-instruct";
const DEFAULT_CHAT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (`CAMPUS_HOST`, default: 0.0.0.0)
    pub host: String,
    /// Bind port (`CAMPUS_PORT`, default: 3001)
    pub port: u16,
    /// Apply bundled migrations at startup (`CAMPUS_RUN_MIGRATIONS`, default: true)
    pub run_migrations: bool,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        let settings = ::config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3001_i64)?
            .set_default("run_migrations", true)?
            .add_source(::config::Environment::with_prefix("CAMPUS").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chat completion provider configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// `OPENROUTER_API_KEY`; chat requests fail with 500 when unset
    pub api_key: Option<String>,
    /// `OPENROUTER_MODEL`
    pub model: String,
    /// `OPENROUTER_BASE_URL`
    pub base_url: String,
    /// Sent as `HTTP-Referer` (`OPENROUTER_REFERER`)
    pub referer: Option<String>,
    /// Sent as `X-Title` (`OPENROUTER_TITLE`)
    pub title: String,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let model = env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());

        let base_url = env::var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_CHAT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let referer = env::var("OPENROUTER_REFERER").ok();
        let title = env::var("OPENROUTER_TITLE").unwrap_or_else(|_| "Campus Hub".to_string());

        Self {
            api_key,
            model,
            base_url,
            referer,
            title,
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            env::remove_var("CAMPUS_HOST");
            env::remove_var("CAMPUS_PORT");
            env::remove_var("CAMPUS_RUN_MIGRATIONS");
            env::remove_var("OPENROUTER_API_KEY");
            env::remove_var("OPENROUTER_MODEL");
            env::remove_var("OPENROUTER_BASE_URL");
            env::remove_var("OPENROUTER_REFERER");
            env::remove_var("OPENROUTER_TITLE");
        }
    }

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        clear_env();

        let config = ServerConfig::load().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert!(config.run_migrations);
        assert_eq!(config.bind_address(), "0.0.0.0:3001");
    }

    #[test]
    #[serial]
    fn test_server_config_from_env() {
        clear_env();
        unsafe {
            env::set_var("CAMPUS_PORT", "8088");
            env::set_var("CAMPUS_RUN_MIGRATIONS", "false");
        }

        let config = ServerConfig::load().unwrap();
        assert_eq!(config.port, 8088);
        assert!(!config.run_migrations);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_chat_config_defaults_and_blank_key() {
        clear_env();
        unsafe {
            env::set_var("OPENROUTER_API_KEY", "   ");
            env::set_var("OPENROUTER_BASE_URL", "http://localhost:9999/v1/");
        }

        let config = ChatConfig::from_env();
        assert_eq!(config.api_key, None);
        assert_eq!(config.model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.completions_url(), "http://localhost:9999/v1/chat/completions");

        clear_env();
    }
}
