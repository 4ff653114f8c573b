use std::fmt::Display;

use serde::Serialize;

/// Content format the subscriber will receive. Must be instantiated with
/// `EmailType::parse`, which rejects anything other than `text` and `html`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Text,
    Html,
}

impl EmailType {
    pub fn parse(value: &str) -> Result<Self, String> {
        // matching is exact; the remote service does not accept `HTML` either
        match value {
            "text" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            e => Err(format!("Invalid email_type: {e:?}")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
        }
    }
}

impl AsRef<str> for EmailType {
    fn as_ref(&self) -> &str { self.as_str() }
}

impl Display for EmailType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
