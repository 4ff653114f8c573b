use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Deserialize;

/// Opaque identifier of a mailing list, as issued by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }
}

impl AsRef<str> for ListId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl Display for ListId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the service needs to know about a single subscriber.
///
/// The email address is sent as-is; validating it is left to the remote
/// service. Merge fields are kept in a `BTreeMap` so that requests are encoded
/// in a deterministic order.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscriber {
    pub email_address: String,
    #[serde(default)]
    pub merge_fields: BTreeMap<String, String>,
    pub list_id: ListId,
}

impl Subscriber {
    pub fn new(
        email_address: impl Into<String>,
        list_id: ListId,
    ) -> Self {
        Self {
            email_address: email_address.into(),
            merge_fields: BTreeMap::new(),
            list_id,
        }
    }

    /// Builder-style helper, e.g. `.with_merge_field("FNAME", "John")`
    pub fn with_merge_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.merge_fields.insert(name.into(), value.into());
        self
    }
}
