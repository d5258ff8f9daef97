use crate::error::ConfigError;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::time::Duration;

pub const ENV_VAR_PREFIX: &str = "FUEL_ALERTS__";
pub const SETTINGS_FILE: &str = "Settings.toml";

/// Flat variable names used by earlier deployments of the bot.
const LEGACY_ENV_VARS: [&str; 5] = [
    "DISCORD_BOT_TOKEN",
    "DISCORD_CHANNEL_ID",
    "CLIENT_ID",
    "CLIENT_SECRET",
    "EVE_REFRESH_TOKEN",
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub sso: SsoConfig,
    pub esi: EsiConfig,
    pub discord: DiscordConfig,
    pub alerts: AlertsConfig,
    pub status: StatusConfig,
    pub interactions: InteractionsConfig,
}

/// A credential that never shows up in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("Secret(<unset>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SsoConfig {
    pub client_id: String,
    pub client_secret: Secret,
    pub refresh_token: Secret,
    pub token_url: String,
    pub verify_url: String,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: Secret::default(),
            refresh_token: Secret::default(),
            token_url: "https://login.eveonline.com/v2/oauth/token".to_string(),
            verify_url: "https://login.eveonline.com/oauth/verify".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EsiConfig {
    pub base_url: String,
    pub datasource: String,
    pub user_agent: String,
}

impl Default for EsiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://esi.evetech.net/latest".to_string(),
            datasource: "tranquility".to_string(),
            user_agent: concat!("fuel_alerts/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordConfig {
    pub bot_token: Secret,
    pub channel_id: u64,
    /// Discord rejects message content above 2000 characters.
    pub max_message_len: usize,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: Secret::default(),
            channel_id: 0,
            max_message_len: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertsConfig {
    pub thresholds_hours: Vec<u32>,
    /// How often the check runs. Also the width of each threshold's alert window.
    #[serde(with = "duration_str")]
    pub check_interval: Duration,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            thresholds_hours: vec![24, 48, 72],
            check_interval: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusConfig {
    pub max_entries: usize,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { max_entries: 5 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InteractionsConfig {
    pub listen_addr: String,
    pub command_name: String,
    #[serde(with = "duration_str")]
    pub response_deadline: Duration,
    #[serde(with = "duration_str")]
    pub initial_fetch_estimate: Duration,
}

impl Default for InteractionsConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            command_name: "fuel".to_string(),
            response_deadline: Duration::from_secs(3),
            initial_fetch_estimate: Duration::from_secs(2),
        }
    }
}

impl Config {
    /// Fails on the first unset identity provider credential.
    pub fn require_sso(&self) -> Result<(), ConfigError> {
        if self.sso.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("sso.client_id"));
        }
        if self.sso.client_secret.is_empty() {
            return Err(ConfigError::Missing("sso.client_secret"));
        }
        if self.sso.refresh_token.is_empty() {
            return Err(ConfigError::Missing("sso.refresh_token"));
        }
        Ok(())
    }

    /// Fails when the bot token is unset or the channel id is zero.
    pub fn require_discord(&self) -> Result<(), ConfigError> {
        if self.discord.bot_token.is_empty() {
            return Err(ConfigError::Missing("discord.bot_token"));
        }
        if self.discord.channel_id == 0 {
            return Err(ConfigError::Missing("discord.channel_id"));
        }
        Ok(())
    }
}

pub fn load_config() -> Result<Config, ConfigError> {
    Ok(Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(SETTINGS_FILE))
        .merge(legacy_env())
        .merge(Env::prefixed(ENV_VAR_PREFIX).split("__"))
        .extract::<Config>()?)
}

fn legacy_env() -> Env {
    Env::raw()
        .only(&LEGACY_ENV_VARS)
        .map(|key| match key.as_str().to_ascii_uppercase().as_str() {
            "DISCORD_BOT_TOKEN" => "discord.bot_token".into(),
            "DISCORD_CHANNEL_ID" => "discord.channel_id".into(),
            "CLIENT_ID" => "sso.client_id".into(),
            "CLIENT_SECRET" => "sso.client_secret".into(),
            "EVE_REFRESH_TOKEN" => "sso.refresh_token".into(),
            _ => key.as_str().into(),
        })
}

/// Durations written in humantime syntax, e.g. `"1h"` or `"90s"`.
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
