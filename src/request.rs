use std::collections::BTreeMap;
use std::fmt::Debug;

use anyhow::Context;
use base64::engine::general_purpose;
use base64::Engine;
use reqwest::header;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::Client;
use reqwest::Method;
use reqwest::Url;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::Credentials;
use crate::domain::EmailType;
use crate::domain::Subscriber;
use crate::domain::SubscriptionOptions;
use crate::error::SubscribeError;

/// `{datacenter}` is substituted with `Credentials::datacenter`
const API_ROOT_TEMPLATE: &str = "https://{datacenter}.api.mailchimp.com";

/// The service ignores the username; any fixed string will do.
const BASIC_AUTH_USERNAME: &str = "anystring";

/// Which of the two APIs to speak. Both express the same intent ("subscribe
/// this address to this list"), they just encode it differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiVariant {
    /// API v3.0: `POST` with a JSON body, key in an `Authorization` header
    StructuredBody {
        #[serde(default = "default_basic_auth")]
        basic_auth: bool,
    },
    /// API v1.3: `GET` with every field (key included) in the query string,
    /// answered with a bare JSON boolean
    QueryString,
}

fn default_basic_auth() -> bool { true }

/// A fully formed request. Building one performs no I/O; sending it is the
/// caller's business (see `into_reqwest`).
pub struct SubscribeRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl SubscribeRequest {
    pub fn into_reqwest(
        self,
        client: &Client,
    ) -> reqwest::RequestBuilder {
        let req = client.request(self.method, self.url).headers(self.headers);
        match self.body {
            Some(body) => req.body(body),
            None => req,
        }
    }
}

// the query string may contain the api key, so only the path is printed
impl Debug for SubscribeRequest {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{} {}://{}{}",
            self.method,
            self.url.scheme(),
            self.url.host_str().unwrap_or_default(),
            self.url.path()
        )
    }
}

/// JSON body of `POST /3.0/lists/{list_id}/members`
#[derive(Serialize)]
struct MemberBody<'a> {
    email_address: &'a str,
    email_type: EmailType,
    status: &'static str,
    // always present, even when empty
    merge_fields: &'a BTreeMap<String, String>,
}

/// Turns subscriber data into a `SubscribeRequest` for one particular API.
/// Holds everything that stays fixed across calls.
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    api: ApiVariant,
    api_root: Url,
    credentials: Credentials,
}

impl RequestBuilder {
    /// `base_url` overrides the datacenter-derived host (e.g. to point at a
    /// mock server). It must be an absolute URL.
    pub fn new(
        api: ApiVariant,
        credentials: Credentials,
        base_url: Option<&str>,
    ) -> Result<Self, anyhow::Error> {
        let root = match base_url {
            Some(url) => url.to_string(),
            None => API_ROOT_TEMPLATE.replace("{datacenter}", credentials.datacenter()),
        };
        let api_root = Url::parse(&root).with_context(|| format!("Invalid API root: {root:?}"))?;
        if api_root.cannot_be_a_base() {
            anyhow::bail!("API root cannot be used as a base: {root:?}");
        }
        Ok(Self {
            api,
            api_root,
            credentials,
        })
    }

    pub fn api(&self) -> ApiVariant { self.api }

    pub fn api_root(&self) -> &Url { &self.api_root }

    #[tracing::instrument(name = "Building subscribe request", skip_all, fields(api = ?self.api))]
    pub fn build(
        &self,
        subscriber: &Subscriber,
        options: &SubscriptionOptions,
    ) -> Result<SubscribeRequest, SubscribeError> {
        // checked before anything else, so a bad option never reaches the network
        let email_type = options.email_type().map_err(SubscribeError::InvalidOption)?;

        let req = match self.api {
            ApiVariant::StructuredBody { basic_auth } => {
                self.structured_body(subscriber, email_type, basic_auth)
            }
            ApiVariant::QueryString => self.query_string(subscriber, options, email_type),
        };
        req.map_err(SubscribeError::RequestConstructionError)
    }

    fn structured_body(
        &self,
        subscriber: &Subscriber,
        email_type: EmailType,
        basic_auth: bool,
    ) -> Result<SubscribeRequest, anyhow::Error> {
        let url = self.endpoint(&["3.0", "lists", subscriber.list_id.as_ref(), "members"])?;

        let body = MemberBody {
            email_address: &subscriber.email_address,
            email_type,
            status: "subscribed",
            merge_fields: &subscriber.merge_fields,
        };
        let body = serde_json::to_vec(&body).context("Failed to serialize member body")?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if basic_auth {
            headers.insert(header::AUTHORIZATION, self.basic_auth_header()?);
        }

        Ok(SubscribeRequest {
            method: Method::POST,
            url,
            headers,
            body: Some(body),
        })
    }

    fn query_string(
        &self,
        subscriber: &Subscriber,
        options: &SubscriptionOptions,
        email_type: EmailType,
    ) -> Result<SubscribeRequest, anyhow::Error> {
        // the trailing empty segment yields `/1.3/`
        let mut url = self.endpoint(&["1.3", ""])?;

        let query = serde_urlencoded::to_string(query_params(
            subscriber,
            options,
            email_type,
            self.credentials.api_key().expose_secret(),
        ))
        .context("Failed to encode query string")?;
        url.set_query(Some(&query));

        Ok(SubscribeRequest {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    /// Append path segments to the API root; each segment is percent-encoded.
    fn endpoint(
        &self,
        segments: &[&str],
    ) -> Result<Url, anyhow::Error> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API root cannot be used as a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn basic_auth_header(&self) -> Result<HeaderValue, anyhow::Error> {
        let encoded = general_purpose::STANDARD.encode(format!(
            "{BASIC_AUTH_USERNAME}:{}",
            self.credentials.api_key().expose_secret()
        ));
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .context("API key is not a valid header value")?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Every parameter of the v1.3 `listSubscribe` call, in a fixed order,
/// followed by one `merge_vars[NAME]` per merge field.
fn query_params(
    subscriber: &Subscriber,
    options: &SubscriptionOptions,
    email_type: EmailType,
    api_key: &str,
) -> Vec<(String, String)> {
    let flag = |b: bool| b.to_string();
    let mut params = vec![
        ("output".to_string(), "json".to_string()),
        ("method".to_string(), "listSubscribe".to_string()),
        ("id".to_string(), subscriber.list_id.to_string()),
        ("apikey".to_string(), api_key.to_string()),
        ("email_type".to_string(), email_type.to_string()),
        ("email_address".to_string(), subscriber.email_address.clone()),
        ("double_optin".to_string(), flag(options.double_optin)),
        ("update_existing".to_string(), flag(options.update_existing)),
        ("replace_interests".to_string(), flag(options.replace_interests)),
        ("send_welcome".to_string(), flag(options.send_welcome)),
    ];
    params.extend(
        subscriber
            .merge_fields
            .iter()
            .map(|(k, v)| (format!("merge_vars[{k}]"), v.clone())),
    );
    params
}
