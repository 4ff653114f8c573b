use serde::Deserialize;

use super::EmailType;

/// Per-call options, as supplied by the caller.
///
/// `email_type` is left as raw input (much like a deserialized form) and is
/// only parsed into an `EmailType` when a request is built, so an unsupported
/// value fails the call before anything is sent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubscriptionOptions {
    pub email_type: String,
    /// Ask the service to send a confirmation email before activating
    pub double_optin: bool,
    pub update_existing: bool,
    pub replace_interests: bool,
    pub send_welcome: bool,
}

impl SubscriptionOptions {
    pub fn new(email_type: EmailType) -> Self {
        Self {
            email_type: email_type.to_string(),
            ..Self::default()
        }
    }

    pub fn email_type(&self) -> Result<EmailType, String> { EmailType::parse(&self.email_type) }
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            email_type: EmailType::Text.to_string(),
            double_optin: false,
            update_existing: false,
            replace_interests: false,
            send_welcome: false,
        }
    }
}
