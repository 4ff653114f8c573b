//! Subscribe email addresses to a MailChimp list over HTTP.
//!
//! ```rust,no_run
//! use list_subscribe::domain::Credentials;
//! use list_subscribe::domain::ListId;
//! use list_subscribe::domain::Subscriber;
//! use list_subscribe::domain::SubscriptionOptions;
//! use list_subscribe::ApiVariant;
//! use list_subscribe::ListClient;
//! use secrecy::Secret;
//!
//! # async fn run() -> Result<(), anyhow::Error> {
//! let creds = Credentials::new(Secret::new("0123456789abcdef-us6".to_string()));
//! let client = ListClient::new(
//!     ApiVariant::StructuredBody { basic_auth: true },
//!     creds,
//!     None,
//!     std::time::Duration::from_secs(10),
//! )?;
//!
//! let john = Subscriber::new("john@foo.com", ListId::new("abc123"))
//!     .with_merge_field("FNAME", "John");
//! client.subscribe(&john, &SubscriptionOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod configuration;
pub mod domain;
pub mod error;
pub mod list_client;
pub mod request;
pub mod response;
pub mod retry;
pub mod telemetry;
pub mod utils;

pub use error::SubscribeError;
pub use list_client::ListClient;
pub use request::ApiVariant;
pub use retry::RetryPolicy;
