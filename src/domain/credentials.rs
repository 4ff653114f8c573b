use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;

/// Used when neither an explicit tag nor a key suffix is available; this is
/// the host the v1.3 API was historically served from.
const DEFAULT_DATACENTER: &str = "us2";

/// API key plus the datacenter it belongs to. The key is never printed by
/// `Debug`.
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    api_key: Secret<String>,
    #[serde(default)]
    datacenter: Option<String>,
}

impl Credentials {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            datacenter: None,
        }
    }

    pub fn with_datacenter(
        mut self,
        datacenter: impl Into<String>,
    ) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    pub fn api_key(&self) -> &Secret<String> { &self.api_key }

    /// Resolution order: explicit tag, then the suffix of the key
    /// (`<hex>-us6` -> `us6`), then `us2`.
    pub fn datacenter(&self) -> &str {
        if let Some(dc) = self.datacenter.as_deref().filter(|dc| !dc.is_empty()) {
            return dc;
        }
        self.api_key
            .expose_secret()
            .rsplit_once('-')
            .map(|(_, dc)| dc)
            .filter(|dc| !dc.is_empty())
            .unwrap_or(DEFAULT_DATACENTER)
    }
}
