use std::env;
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_aux::field_attributes::deserialize_option_number_from_string;

use crate::domain::Credentials;
use crate::list_client::ListClient;
use crate::request::ApiVariant;
use crate::retry::RetryPolicy;
use crate::retry::DEFAULT_MAX_ATTEMPTS;

/// Everything a host application needs to build a `ListClient`. Loading it is
/// optional; a `ListClient` can just as well be built by hand.
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub list_client: ListClientSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ListClientSettings {
    pub api: ApiVariant,
    pub api_key: Secret<String>,

    /// Derived from the api key when absent
    #[serde(default)]
    pub datacenter: Option<String>,

    /// Overrides `https://{datacenter}.api.mailchimp.com`; tests point this at
    /// a mock server
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per attempt
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,

    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RetrySettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_attempts: u32,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub base_backoff_milliseconds: u64,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub call_timeout_milliseconds: Option<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff_milliseconds: 1000,
            call_timeout_milliseconds: None,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_backoff: Duration::from_millis(self.base_backoff_milliseconds),
            call_timeout: self.call_timeout_milliseconds.map(Duration::from_millis),
        }
    }
}

impl ListClientSettings {
    pub fn credentials(&self) -> Credentials {
        let creds = Credentials::new(self.api_key.clone());
        match &self.datacenter {
            Some(dc) => creds.with_datacenter(dc),
            None => creds,
        }
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<ListClient, anyhow::Error> {
        let client = ListClient::new(
            self.api,
            self.credentials(),
            self.base_url.as_deref(),
            self.timeout(),
        )?;
        Ok(client.with_retry_policy(self.retry.policy()))
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid: {e}")),
        }
    }
}

/// Load `base.yaml` and `{APP_ENVIRONMENT}.yaml` (default `local`) from
/// `cfg_dir`, then apply `APP_`-prefixed env vars on top.
///
/// e.g. `APP_LIST_CLIENT__RETRY__MAX_ATTEMPTS=3` ->
/// `Settings.list_client.retry.max_attempts`
pub fn get_configuration(cfg_dir: &Path) -> Result<Settings, ConfigError> {
    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    tracing::debug!("loading config for {env} env");

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))).required(false))
        .add_source(
            // env vars are -always- strings, hence `serde-aux` on the numeric fields
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
