use std::{path::Path, sync::OnceLock};

use anyhow::Context;
use serde::Deserialize;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Upper bound on session length: one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default = "default_mail_from")]
    pub from: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "emailPassword")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres connection string; without one the service runs on the in-memory store.
    #[serde(default, alias = "connectionString")]
    pub database_url: Option<String>,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub mail: MailConfig,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_mail_from() -> String {
    "shopping.list@mealplan.local".into()
}
fn default_token_ttl_hours() -> i64 {
    24
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            from: default_mail_from(),
            username: None,
            password: String::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            token_ttl_hours: default_token_ttl_hours(),
            host: default_host(),
            port: default_port(),
            mail: MailConfig::default(),
        }
    }
}

impl MailConfig {
    /// SMTP login; defaults to the sender address.
    pub fn login(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.from)
    }
}

impl AppConfig {
    pub fn token_ttl(&self) -> time::Duration {
        time::Duration::hours(self.token_ttl_hours)
    }

    fn validate(self) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours),
            "token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {}",
            self.token_ttl_hours
        );
        Ok(self)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let mail = MailConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| default_smtp_host()),
            port: parse_var("SMTP_PORT")?.unwrap_or_else(default_smtp_port),
            from: std::env::var("SMTP_FROM").unwrap_or_else(|_| default_mail_from()),
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
        };
        Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            token_ttl_hours: parse_var("TOKEN_TTL_HOURS")?.unwrap_or_else(default_token_ttl_hours),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| default_host()),
            port: parse_var("APP_PORT")?.unwrap_or_else(default_port),
            mail,
        }
        .validate()
        .context("TOKEN_TTL_HOURS")
    }

    /// Reads a JSON config file. The flat `connectionString`/`emailPassword`
    /// layout of older deployments is accepted as well.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse config file {}", path.display()))
    }

    fn from_json(raw: &str) -> anyhow::Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(raw)?;
        if let Some(obj) = value.as_object_mut() {
            if !obj.contains_key("mail") {
                let password = obj.remove("emailPassword").unwrap_or_default();
                obj.insert("mail".into(), serde_json::json!({ "password": password }));
            }
        }
        let cfg: Self = serde_json::from_value(value)?;
        cfg.validate()
    }

    /// `CONFIG_FILE` wins over the environment when set.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(path),
            Err(_) => Self::from_env(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) => Ok(Some(
            v.parse::<T>().with_context(|| format!("invalid value for {name}"))?,
        )),
        Err(_) => Ok(None),
    }
}

/// Loads the process configuration once. Later calls return the same value.
pub fn init() -> anyhow::Result<&'static AppConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let loaded = AppConfig::load()?;
    Ok(CONFIG.get_or_init(|| loaded))
}

/// The configuration loaded by [`init`].
pub fn get() -> Option<&'static AppConfig> {
    CONFIG.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_flat_file_layout_is_accepted() {
        let cfg = AppConfig::from_json(
            r#"{"connectionString": "postgres://localhost/meals", "emailPassword": "hunter22"}"#,
        )
        .unwrap();
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/meals"));
        assert_eq!(cfg.mail.password, "hunter22");
        assert_eq!(cfg.mail.port, 587);
        assert_eq!(cfg.token_ttl_hours, 24);
    }

    #[test]
    fn nested_layout_overrides_defaults() {
        let cfg = AppConfig::from_json(
            r#"{
                "token_ttl_hours": 2,
                "port": 9000,
                "mail": {"host": "mail.local", "port": 2525, "from": "a@b.c", "username": "bot"}
            }"#,
        )
        .unwrap();
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.token_ttl_hours, 2);
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.mail.host, "mail.local");
        assert_eq!(cfg.mail.login(), "bot");
    }

    #[test]
    fn token_ttl_out_of_range_is_rejected() {
        for hours in ["0", "-3", "9223372036854775807"] {
            let raw = format!(r#"{{"token_ttl_hours": {hours}}}"#);
            let err = AppConfig::from_json(&raw).unwrap_err();
            assert!(format!("{err:#}").contains("token_ttl_hours"), "{err:#}");
        }
        let cfg = AppConfig::from_json(&format!(r#"{{"token_ttl_hours": {MAX_TOKEN_TTL_HOURS}}}"#))
            .unwrap();
        assert_eq!(cfg.token_ttl(), time::Duration::days(366));
    }

    #[test]
    fn init_is_idempotent() {
        let first = init().unwrap();
        let second = init().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(get().is_some_and(|cfg| std::ptr::eq(cfg, first)));
    }

    #[test]
    fn mail_login_falls_back_to_sender() {
        let cfg = AppConfig::from_json(r#"{"mail": {"from": "list@example.com"}}"#).unwrap();
        assert_eq!(cfg.mail.login(), "list@example.com");
    }
}
